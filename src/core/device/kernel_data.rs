use serde::{Deserialize, Serialize};

/// Name under which `KernelData` is uploaded with `Device::const_copy_to`.
pub const KERNEL_DATA_NAME: &str = "__data";

/// Constants the denoise kernels read; uploaded as JSON.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct KernelData {
    pub half_window: i32,
    pub pass_stride: usize,
    pub pass_denoising: usize,
    pub pass_no_denoising: usize,
    pub exposure: f32,
    pub num_frames: i32,
    pub prev_frames: i32,
}

impl Default for KernelData {
    fn default() -> Self {
        KernelData {
            half_window: 8,
            pass_stride: 4,
            pass_denoising: 4,
            pass_no_denoising: 0,
            exposure: 1.0,
            num_frames: 1,
            prev_frames: 0,
        }
    }
}
