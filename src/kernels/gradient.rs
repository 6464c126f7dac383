use crate::core::error::*;
use crate::core::kernel::*;

/// Horizontal red and vertical green ramp over the frame; identical for
/// every sample.
#[derive(Debug, Clone)]
pub struct GradientKernel {
    pub width: i32,
    pub height: i32,
}

impl GradientKernel {
    pub fn new(width: i32, height: i32) -> Self {
        GradientKernel {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

impl Kernel for GradientKernel {
    fn path_trace(&self, x: i32, y: i32, _sample: i32, _rng_hash: u32) -> SessionResult<[f32; 4]> {
        let u = (x as f32 + 0.5) / self.width as f32;
        let v = (y as f32 + 0.5) / self.height as f32;
        Ok([u, v, 0.5, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let kernel = GradientKernel::new(4, 2);
        let a = kernel.path_trace(0, 0, 0, 0).unwrap();
        let b = kernel.path_trace(3, 1, 7, 99).unwrap();
        assert_eq!(a, [0.125, 0.25, 0.5, 1.0]);
        assert_eq!(b, [0.875, 0.75, 0.5, 1.0]);
    }
}
