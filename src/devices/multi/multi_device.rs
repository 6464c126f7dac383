use crate::core::device::*;
use crate::core::error::*;

use log::*;
use std::sync::Arc;

/// Fans tasks out to several devices sharing one session.
///
/// Render and denoise tasks go to every sub-device, which then compete for
/// tiles through the session callbacks. Film convert and shader tasks run on
/// the first sub-device.
pub struct MultiDevice {
    info: DeviceInfo,
    devices: Vec<Arc<dyn Device>>,
}

impl MultiDevice {
    pub fn new(devices: Vec<Arc<dyn Device>>) -> SessionResult<Self> {
        if devices.is_empty() {
            return Err(SessionError::device("multi device without sub-devices"));
        }
        let multi_devices: Vec<DeviceInfo> = devices.iter().map(|d| d.info().clone()).collect();
        let description = multi_devices
            .iter()
            .map(|info| info.description.as_str())
            .collect::<Vec<&str>>()
            .join(" + ");
        let info = DeviceInfo {
            device_type: DeviceType::Multi,
            description,
            id: String::from("MULTI"),
            num: 0,
            multi_devices,
        };
        info!("Multi device: {}", info.description);
        Ok(MultiDevice { info, devices })
    }

    pub fn devices(&self) -> &[Arc<dyn Device>] {
        return &self.devices;
    }
}

impl Device for MultiDevice {
    fn info(&self) -> &DeviceInfo {
        return &self.info;
    }

    fn load_kernels(&self, features: &DeviceRequestedFeatures) -> SessionResult<()> {
        for device in self.devices.iter() {
            device.load_kernels(features)?;
        }
        return Ok(());
    }

    fn task_add(&self, task: DeviceTask) {
        match task {
            DeviceTask::Render(_) | DeviceTask::Denoise(_) => {
                for device in self.devices.iter() {
                    device.task_add(task.clone());
                }
            }
            DeviceTask::FilmConvert(_) | DeviceTask::Shader(_) => {
                self.devices[0].task_add(task);
            }
        }
    }

    fn task_wait(&self) {
        for device in self.devices.iter() {
            device.task_wait();
        }
    }

    fn task_cancel(&self) {
        for device in self.devices.iter() {
            device.task_cancel();
        }
    }

    fn error_message(&self) -> Option<String> {
        return self.devices.iter().find_map(|d| d.error_message());
    }

    fn const_copy_to(&self, name: &str, data: &[u8]) {
        for device in self.devices.iter() {
            device.const_copy_to(name, data);
        }
    }

    fn device_number(&self, sub_device: &DeviceInfo) -> usize {
        return self
            .info
            .multi_devices
            .iter()
            .position(|info| info.id == sub_device.id)
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffers::*;
    use crate::core::kernel::*;
    use crate::devices::cpu::*;

    struct BlackKernel;

    impl Kernel for BlackKernel {
        fn path_trace(&self, _x: i32, _y: i32, _sample: i32, _rng_hash: u32) -> SessionResult<[f32; 4]> {
            Ok([0.0; 4])
        }
    }

    #[test]
    fn test_001() {
        let devices: Vec<Arc<dyn Device>> = (0..3)
            .map(|i| {
                let device = CpuDevice::new(DeviceInfo::cpu(i), Arc::new(BlackKernel), 1).unwrap();
                Arc::new(device) as Arc<dyn Device>
            })
            .collect();
        let multi = MultiDevice::new(devices).unwrap();
        assert_eq!(multi.info().device_type, DeviceType::Multi);
        assert_eq!(multi.info().multi_devices.len(), 3);
        assert_eq!(multi.device_number(&DeviceInfo::cpu(2)), 2);

        let mut rtile = RenderTile::default();
        multi.map_tile(&DeviceInfo::cpu(1), &mut rtile);
        assert_eq!(rtile.device, 1);
        assert!(multi.error_message().is_none());
    }

    #[test]
    fn test_002() {
        assert!(MultiDevice::new(Vec::new()).is_err());
    }
}
