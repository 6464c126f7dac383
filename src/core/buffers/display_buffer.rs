use super::buffer_params::*;
use crate::core::display::*;
use crate::core::error::*;
use crate::core::imageio::*;

use std::path::Path;
use std::sync::Arc;
use std::sync::RwLock;

/// RGBA pixels written by the film convert task.
#[derive(Debug, Default, Clone)]
pub struct DisplayPixels {
    pub linear: bool,
    pub rgba_byte: Vec<u8>,
    pub rgba_float: Vec<f32>,
}

pub type SharedDisplayPixels = Arc<RwLock<DisplayPixels>>;

impl DisplayPixels {
    pub fn resize(&mut self, num_pixels: usize) {
        if self.linear {
            self.rgba_byte.clear();
            self.rgba_float = vec![0.0; num_pixels * 4];
        } else {
            self.rgba_float.clear();
            self.rgba_byte = vec![0; num_pixels * 4];
        }
    }

    pub fn num_pixels(&self) -> usize {
        if self.linear {
            return self.rgba_float.len() / 4;
        } else {
            return self.rgba_byte.len() / 4;
        }
    }
}

/// Displayable target filled by tonemapping the render buffers.
#[derive(Debug)]
pub struct DisplayBuffer {
    pub params: BufferParams,
    pub draw_width: i32,
    pub draw_height: i32,
    pub transparent: bool,
    pub rgba: SharedDisplayPixels,
}

impl DisplayBuffer {
    pub fn new(linear: bool) -> Self {
        DisplayBuffer {
            params: BufferParams::default(),
            draw_width: 0,
            draw_height: 0,
            transparent: true,
            rgba: Arc::new(RwLock::new(DisplayPixels {
                linear,
                ..Default::default()
            })),
        }
    }

    pub fn linear(&self) -> bool {
        return self.rgba.read().unwrap().linear;
    }

    pub fn reset(&mut self, params: &BufferParams) {
        self.draw_width = 0;
        self.draw_height = 0;
        self.params = params.clone();
        let mut rgba = self.rgba.write().unwrap();
        rgba.resize(params.num_pixels());
    }

    pub fn draw_set(&mut self, width: i32, height: i32) {
        assert!(width <= self.params.width && height <= self.params.height);
        self.draw_width = width;
        self.draw_height = height;
    }

    pub fn draw_ready(&self) -> bool {
        return self.draw_width != 0 && self.draw_height != 0;
    }

    /// Current drawable region as normalized RGBA floats.
    pub fn tile(&self) -> DisplayTile {
        let n = (self.draw_width * self.draw_height).max(0) as usize;
        let rgba = self.rgba.read().unwrap();
        let buffer = if rgba.linear {
            rgba.rgba_float[..(n * 4)].to_vec()
        } else {
            rgba.rgba_byte[..(n * 4)]
                .iter()
                .map(|v| *v as f32 / 255.0)
                .collect()
        };
        DisplayTile {
            x: self.params.full_x.max(0) as usize,
            y: self.params.full_y.max(0) as usize,
            width: self.draw_width.max(0) as usize,
            height: self.draw_height.max(0) as usize,
            buffer,
        }
    }

    pub fn draw(&self, display: &mut dyn Display) -> SessionResult<()> {
        if self.draw_ready() {
            display.update(&self.tile())?;
        }
        return Ok(());
    }

    /// Writes the drawable region as an 8 bit RGBA image; does nothing until
    /// something was tonemapped.
    pub fn write(&self, path: &Path) -> SessionResult<()> {
        let w = self.draw_width;
        let h = self.draw_height;
        if w == 0 || h == 0 {
            return Ok(());
        }
        let n = (w * h) as usize;
        let rgba = self.rgba.read().unwrap();
        if rgba.linear {
            let bytes = linear_to_bytes(&rgba.rgba_float[..(n * 4)]);
            return write_image_rgba8(path, w as u32, h as u32, bytes);
        } else {
            return write_image_rgba8(path, w as u32, h as u32, rgba.rgba_byte[..(n * 4)].to_vec());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let mut display = DisplayBuffer::new(false);
        assert!(!display.draw_ready());
        display.reset(&BufferParams::new(8, 4));
        assert_eq!(display.rgba.read().unwrap().num_pixels(), 32);
        display.draw_set(8, 4);
        assert!(display.draw_ready());
        display.reset(&BufferParams::new(8, 4));
        assert!(!display.draw_ready());
    }

    #[test]
    #[should_panic]
    fn test_002() {
        let mut display = DisplayBuffer::new(true);
        display.reset(&BufferParams::new(8, 4));
        display.draw_set(16, 4);
    }
}
