use crate::core::misc::*;

use serde::{Deserialize, Serialize};

/// Feature channels plus variances, and the noisy color with its variance.
pub const DENOISING_PASS_SIZE: usize = 20;
/// As above, plus the unfiltered color skipped by selective denoising.
pub const SELECTIVE_DENOISING_PASS_SIZE: usize = 23;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassType {
    Combined,
    Depth,
    Normal,
    Emission,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct Pass {
    pub pass_type: PassType,
    pub components: usize,
    /// Divided by the sample count when read back.
    pub filter: bool,
    /// Scaled by the film exposure when read back.
    pub exposure: bool,
}

impl Pass {
    pub fn new(pass_type: PassType) -> Self {
        match pass_type {
            PassType::Combined => Pass {
                pass_type,
                components: 4,
                filter: true,
                exposure: true,
            },
            PassType::Depth => Pass {
                pass_type,
                components: 1,
                filter: true,
                exposure: false,
            },
            PassType::Normal => Pass {
                pass_type,
                components: 4,
                filter: true,
                exposure: false,
            },
            PassType::Emission => Pass {
                pass_type,
                components: 4,
                filter: true,
                exposure: true,
            },
        }
    }
}

/// Shape and pass layout of one accumulation buffer.
///
/// `full_x`/`full_y` locate the buffer inside the full frame, `width`/`height`
/// is the allocated size and `final_width`/`final_height` the size without
/// the overscan border.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferParams {
    pub width: i32,
    pub height: i32,
    pub full_x: i32,
    pub full_y: i32,
    pub full_width: i32,
    pub full_height: i32,
    pub final_width: i32,
    pub final_height: i32,
    pub frames: i32,
    pub passes: Vec<Pass>,
    pub denoising_passes: bool,
    pub selective_denoising: bool,
    pub overscan: i32,
}

impl Default for BufferParams {
    fn default() -> Self {
        BufferParams {
            width: 0,
            height: 0,
            full_x: 0,
            full_y: 0,
            full_width: 0,
            full_height: 0,
            final_width: 0,
            final_height: 0,
            frames: 1,
            passes: vec![Pass::new(PassType::Combined)],
            denoising_passes: false,
            selective_denoising: false,
            overscan: 0,
        }
    }
}

impl BufferParams {
    /// Full frame of the given size with only the combined pass.
    pub fn new(width: i32, height: i32) -> Self {
        BufferParams {
            width,
            height,
            full_width: width,
            full_height: height,
            final_width: width,
            final_height: height,
            ..Default::default()
        }
    }

    /// Offset and row stride that turn absolute pixel coordinates into a
    /// pixel index of this buffer: `offset + x + y * stride`.
    pub fn offset_stride(&self) -> (i32, i32) {
        let offset = -(self.full_x + self.full_y * self.width);
        let stride = self.width;
        return (offset, stride);
    }

    /// True if `other` describes a different shape or pass layout.
    pub fn modified(&self, other: &BufferParams) -> bool {
        return !(self.full_x == other.full_x
            && self.full_y == other.full_y
            && self.width == other.width
            && self.height == other.height
            && self.full_width == other.full_width
            && self.full_height == other.full_height
            && self.final_width == other.final_width
            && self.final_height == other.final_height
            && self.overscan == other.overscan
            && self.passes == other.passes);
    }

    /// Adds a pass once; the combined pass always stays first.
    pub fn add_pass(&mut self, pass_type: PassType) {
        if self.passes.iter().any(|p| p.pass_type == pass_type) {
            return;
        }
        self.passes.push(Pass::new(pass_type));
    }

    /// Floats per pixel, aligned up to 4.
    pub fn passes_size(&self) -> usize {
        let mut size: usize = self.passes.iter().map(|p| p.components).sum();
        if self.denoising_passes {
            size += if self.selective_denoising {
                SELECTIVE_DENOISING_PASS_SIZE
            } else {
                DENOISING_PASS_SIZE
            };
        }
        return align_up(size, 4);
    }

    /// Float offset of the first denoising channel inside a pixel.
    pub fn denoise_offset(&self) -> usize {
        return self.passes.iter().map(|p| p.components).sum();
    }

    pub fn num_pixels(&self) -> usize {
        if self.width <= 0 || self.height <= 0 {
            return 0;
        }
        return (self.width as usize) * (self.height as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let mut params = BufferParams::new(64, 32);
        assert_eq!(params.passes_size(), 4);
        params.add_pass(PassType::Depth);
        assert_eq!(params.passes_size(), 8);
        assert_eq!(params.denoise_offset(), 5);
        params.denoising_passes = true;
        assert_eq!(params.passes_size(), 28);
        params.selective_denoising = true;
        assert_eq!(params.passes_size(), 28);
        params.add_pass(PassType::Normal);
        assert_eq!(params.passes_size(), 32);
    }

    #[test]
    fn test_002() {
        let mut params = BufferParams::new(16, 16);
        params.full_x = 32;
        params.full_y = 48;
        let (offset, stride) = params.offset_stride();
        assert_eq!(stride, 16);
        assert_eq!(offset + 32 + 48 * stride, 0);
        assert_eq!(offset + 33 + 49 * stride, 17);
    }

    #[test]
    fn test_003() {
        let a = BufferParams::new(16, 16);
        let mut b = a.clone();
        assert!(!a.modified(&b));
        b.frames = 3;
        assert!(!a.modified(&b));
        b.overscan = 2;
        assert!(a.modified(&b));
        let mut c = a.clone();
        c.add_pass(PassType::Emission);
        assert!(a.modified(&c));
    }
}
