use crate::core::buffers::*;
use crate::core::device::*;
use crate::core::error::*;

/// Per-pixel programs run by a device.
pub trait Kernel: Send + Sync {
    /// Radiance and alpha of one sample of pixel `(x, y)`; `rng_hash` is the
    /// pixel's random seed from the render buffer.
    fn path_trace(&self, x: i32, y: i32, sample: i32, rng_hash: u32) -> SessionResult<[f32; 4]>;

    /// Filters the center of a 3x3 tile neighborhood in place.
    fn denoise(&self, _data: &KernelData, _tiles: &[RenderTile; 9]) -> SessionResult<()> {
        Ok(())
    }

    fn shader(&self, input: &[f32; 4]) -> [f32; 4] {
        *input
    }
}
