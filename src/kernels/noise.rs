use crate::core::buffers::*;
use crate::core::device::*;
use crate::core::error::*;
use crate::core::kernel::*;
use crate::core::rng::*;

/// White noise driven only by the pixel seed and the sample index, so the
/// accumulated result does not depend on how the frame was tiled.
#[derive(Debug, Default, Clone)]
pub struct NoiseKernel {
    pub seed: u64,
}

impl NoiseKernel {
    pub fn new(seed: u64) -> Self {
        NoiseKernel { seed }
    }
}

impl Kernel for NoiseKernel {
    fn path_trace(&self, _x: i32, _y: i32, sample: i32, rng_hash: u32) -> SessionResult<[f32; 4]> {
        let sequence = ((rng_hash as u64) << 32) | (sample as u32 as u64);
        let mut rng = RNG::new_sequence(sequence ^ self.seed);
        let r = rng.uniform_float32();
        let g = rng.uniform_float32();
        let b = rng.uniform_float32();
        Ok([r, g, b, 1.0])
    }

    /// Box filter over the combined pass of the center tile.
    fn denoise(&self, data: &KernelData, tiles: &[RenderTile; 9]) -> SessionResult<()> {
        let center = &tiles[4];
        let Some(buffers) = center.buffers.as_ref() else {
            return Err(SessionError::kernel("denoised tile has no buffer"));
        };
        if center.is_empty() || data.half_window <= 0 {
            return Ok(());
        }

        let radius = data.half_window.min(center.w).min(center.h);
        let mut buffers = buffers.write().unwrap();
        let pass_stride = buffers.params.passes_size();
        let mut filtered = Vec::with_capacity((center.w * center.h) as usize);
        for y in center.y..(center.y + center.h) {
            for x in center.x..(center.x + center.w) {
                let mut sum = [0.0f32; 4];
                let mut count = 0.0;
                for sy in (y - radius).max(center.y)..(y + radius + 1).min(center.y + center.h) {
                    for sx in (x - radius).max(center.x)..(x + radius + 1).min(center.x + center.w) {
                        let index = center.pixel_index(sx, sy) * pass_stride;
                        for c in 0..4 {
                            sum[c] += buffers.buffer[index + c];
                        }
                        count += 1.0;
                    }
                }
                filtered.push(sum.map(|v| v / count));
            }
        }

        let mut i = 0;
        for y in center.y..(center.y + center.h) {
            for x in center.x..(center.x + center.w) {
                let index = center.pixel_index(x, y) * pass_stride;
                buffers.buffer[index..(index + 4)].copy_from_slice(&filtered[i]);
                i += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let kernel = NoiseKernel::new(0);
        let a = kernel.path_trace(0, 0, 3, 1234).unwrap();
        let b = kernel.path_trace(5, 9, 3, 1234).unwrap();
        let c = kernel.path_trace(0, 0, 4, 1234).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a[..3].iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_002() {
        let params = BufferParams::new(3, 1);
        let buffers = RenderBuffers::new_shared(0, &params);
        {
            let mut buffers = buffers.write().unwrap();
            buffers.buffer[0..4].copy_from_slice(&[3.0, 3.0, 3.0, 1.0]);
        }
        let (offset, stride) = params.offset_stride();
        let mut tiles: [RenderTile; 9] = Default::default();
        tiles[4] = RenderTile {
            w: 3,
            h: 1,
            offset,
            stride,
            buffers: Some(buffers.clone()),
            ..Default::default()
        };
        let data = KernelData {
            half_window: 1,
            ..Default::default()
        };
        NoiseKernel::new(0).denoise(&data, &tiles).unwrap();
        let buffers = buffers.read().unwrap();
        assert_eq!(&buffers.buffer[0..4], &[1.5, 1.5, 1.5, 0.5]);
        assert_eq!(&buffers.buffer[4..8], &[1.0, 1.0, 1.0, 1.0 / 3.0]);
    }
}
