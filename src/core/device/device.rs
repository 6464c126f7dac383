use super::device_task::*;
use crate::core::buffers::*;
use crate::core::error::*;

use serde::{Deserialize, Serialize};
use std::thread::available_parallelism;

#[derive(Debug, PartialEq, Eq, Default, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    #[default]
    Cpu,
    Cuda,
    OpenCl,
    Network,
    Multi,
}

#[derive(Debug, PartialEq, Default, Clone)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub description: String,
    pub id: String,
    pub num: usize,
    pub multi_devices: Vec<DeviceInfo>,
}

impl DeviceInfo {
    pub fn cpu(num: usize) -> Self {
        DeviceInfo {
            device_type: DeviceType::Cpu,
            description: String::from("CPU"),
            id: format!("CPU_{}", num),
            num,
            multi_devices: Vec::new(),
        }
    }

    /// Devices that share the tile display with the host's graphics context.
    pub fn is_gpu(&self) -> bool {
        return matches!(self.device_type, DeviceType::Cuda | DeviceType::OpenCl);
    }
}

/// Kernel features a scene needs; drives kernel specialization.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct DeviceRequestedFeatures {
    pub experimental: bool,
    pub max_closure: i32,
    pub use_hair: bool,
    pub use_object_motion: bool,
    pub use_camera_motion: bool,
    pub use_baking: bool,
    pub use_denoising: bool,
}

/// Asynchronous executor of device tasks.
///
/// `task_add` returns immediately; `task_wait` blocks until every submitted
/// task completed and clears a pending `task_cancel`.
pub trait Device: Send + Sync {
    fn info(&self) -> &DeviceInfo;
    fn load_kernels(&self, features: &DeviceRequestedFeatures) -> SessionResult<()>;
    fn task_add(&self, task: DeviceTask);
    fn task_wait(&self);
    fn task_cancel(&self);
    fn error_message(&self) -> Option<String>;
    fn const_copy_to(&self, name: &str, data: &[u8]);

    fn map_tile(&self, sub_device: &DeviceInfo, rtile: &mut RenderTile) {
        rtile.device = self.device_number(sub_device);
    }

    fn device_number(&self, _sub_device: &DeviceInfo) -> usize {
        return 0;
    }
}

pub fn available_devices() -> Vec<DeviceInfo> {
    let threads = available_parallelism().map(|n| n.get()).unwrap_or(1);
    let mut info = DeviceInfo::cpu(0);
    info.description = format!("CPU ({} threads)", threads);
    return vec![info];
}
