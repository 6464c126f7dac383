use super::buffer_params::*;
use crate::core::geometry::*;
use crate::core::misc::*;
use crate::core::rng::*;

use log::*;
use std::sync::Arc;
use std::sync::RwLock;

pub type SharedRenderBuffers = Arc<RwLock<RenderBuffers>>;

/// Depth read back for pixels that were never hit.
pub const DEPTH_NO_HIT: f32 = 1e10;

/// Accumulation buffer of a tile or of the whole frame.
#[derive(Debug, Default, Clone)]
pub struct RenderBuffers {
    pub params: BufferParams,
    pub buffer: Vec<f32>,
    pub rng_state: Vec<u32>,
    /// Device number the buffer is resident on.
    pub device: usize,
}

impl RenderBuffers {
    pub fn new(device: usize) -> Self {
        RenderBuffers {
            device,
            ..Default::default()
        }
    }

    pub fn new_shared(device: usize, params: &BufferParams) -> SharedRenderBuffers {
        let mut buffers = RenderBuffers::new(device);
        buffers.reset(params);
        return Arc::new(RwLock::new(buffers));
    }

    /// Reallocates when the shape changed, then clears the accumulated
    /// samples and reseeds the per-pixel random state.
    pub fn reset(&mut self, params: &BufferParams) {
        let size = params.num_pixels() * params.passes_size();
        if self.params.modified(params) || self.buffer.len() != size {
            trace!(
                "RenderBuffers::reset: {}x{} at ({}, {})",
                params.width,
                params.height,
                params.full_x,
                params.full_y
            );
            self.buffer = vec![0.0; size];
            self.rng_state = vec![0; params.num_pixels()];
        } else {
            self.buffer.fill(0.0);
        }
        self.params = params.clone();

        let width = params.width.max(0);
        let height = params.height.max(0);
        for y in 0..height {
            for x in 0..width {
                self.rng_state[(y * width + x) as usize] =
                    hash_int_2d(params.full_x + x, params.full_y + y);
            }
        }
    }

    /// Host resident storage is always current; reports whether anything is
    /// allocated.
    pub fn copy_from_device(&self) -> bool {
        return !self.buffer.is_empty();
    }

    fn rect_to_local(&self, rect: &Bounds2i) -> Option<Bounds2i> {
        let origin = Vector2i::new(self.params.full_x, self.params.full_y);
        let local = Bounds2i::new(&(rect.min - origin), &(rect.max - origin));
        if local.min.x < 0
            || local.min.y < 0
            || local.max.x > self.params.width
            || local.max.y > self.params.height
        {
            warn!("RenderBuffers::get_pass_rect: {:?} outside of buffer", rect);
            return None;
        }
        return Some(local);
    }

    /// Reads one pass over `rect` (absolute image coordinates) as floats,
    /// `components` per pixel, normalized by `sample` for filtered passes.
    pub fn get_pass_rect(
        &self,
        pass_type: PassType,
        exposure: f32,
        sample: i32,
        components: usize,
        rect: &Bounds2i,
    ) -> Option<Vec<f32>> {
        let rect = self.rect_to_local(rect)?;
        let pass_stride = self.params.passes_size();

        let mut pass_offset = 0;
        for pass in self.params.passes.iter() {
            if pass.pass_type != pass_type {
                pass_offset += pass.components;
                continue;
            }

            let scale = if pass.filter {
                1.0 / (sample.max(1) as f32)
            } else {
                1.0
            };
            let scale_exposure = if pass.exposure {
                scale * exposure
            } else {
                scale
            };

            let mut pixels = Vec::with_capacity(rect.area() as usize * components);
            for y in rect.min.y..rect.max.y {
                for x in rect.min.x..rect.max.x {
                    let index = (y * self.params.width + x) as usize * pass_stride + pass_offset;
                    let input = &self.buffer[index..(index + pass.components)];
                    match components {
                        1 => {
                            assert_eq!(pass.components, 1);
                            if pass_type == PassType::Depth {
                                pixels.push(if input[0] == 0.0 {
                                    DEPTH_NO_HIT
                                } else {
                                    input[0] * scale_exposure
                                });
                            } else {
                                pixels.push(input[0] * scale_exposure);
                            }
                        }
                        3 => {
                            assert_eq!(pass.components, 4);
                            pixels.push(input[0] * scale_exposure);
                            pixels.push(input[1] * scale_exposure);
                            pixels.push(input[2] * scale_exposure);
                        }
                        4 => {
                            assert_eq!(pass.components, 4);
                            pixels.push(input[0] * scale_exposure);
                            pixels.push(input[1] * scale_exposure);
                            pixels.push(input[2] * scale_exposure);
                            // alpha may exceed one from russian roulette
                            pixels.push(saturate(input[3] * scale));
                        }
                        _ => {
                            return None;
                        }
                    }
                }
            }
            return Some(pixels);
        }
        return None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let mut params = BufferParams::new(4, 2);
        params.full_x = 8;
        params.full_y = 2;
        let mut buffers = RenderBuffers::new(0);
        assert!(!buffers.copy_from_device());
        buffers.reset(&params);
        assert!(buffers.copy_from_device());
        assert_eq!(buffers.buffer.len(), 4 * 2 * 4);
        assert_eq!(buffers.rng_state[0], hash_int_2d(8, 2));
        assert_eq!(buffers.rng_state[5], hash_int_2d(9, 3));
    }

    #[test]
    fn test_002() {
        let params = BufferParams::new(2, 2);
        let mut buffers = RenderBuffers::new(0);
        buffers.reset(&params);
        for v in buffers.buffer.iter_mut() {
            *v = 4.0;
        }
        let rect = Bounds2i::from(((0, 0), (2, 1)));
        let rgba = buffers
            .get_pass_rect(PassType::Combined, 1.0, 2, 4, &rect)
            .unwrap();
        assert_eq!(rgba, vec![2.0, 2.0, 2.0, 1.0, 2.0, 2.0, 2.0, 1.0]);
        assert!(buffers
            .get_pass_rect(PassType::Depth, 1.0, 2, 1, &rect)
            .is_none());
    }
}
