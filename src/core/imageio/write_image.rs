use crate::core::error::*;
use crate::core::misc::*;

use image::*;
use std::path::Path;

fn to_byte(v: f32) -> u8 {
    float_to_byte(gamma_correct(v))
}

/// Gamma corrects linear RGBA floats to bytes; alpha stays linear.
pub fn linear_to_bytes(rgba: &[f32]) -> Vec<u8> {
    let mut bytes = vec![0; rgba.len()];
    for (i, px) in rgba.chunks_exact(4).enumerate() {
        bytes[4 * i + 0] = to_byte(px[0]);
        bytes[4 * i + 1] = to_byte(px[1]);
        bytes[4 * i + 2] = to_byte(px[2]);
        bytes[4 * i + 3] = float_to_byte(px[3]);
    }
    return bytes;
}

pub fn write_image_rgba8(path: &Path, width: u32, height: u32, rgba: Vec<u8>) -> SessionResult<()> {
    let img = RgbaImage::from_vec(width, height, rgba).ok_or_else(|| {
        SessionError::config(format!(
            "write_image: pixel data does not match {}x{}",
            width, height
        ))
    })?;
    img.save(path)?;
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let bytes = linear_to_bytes(&[0.0, 1.0, 0.5, 1.0]);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 255);
        assert_eq!(bytes[3], 255);
        assert!(bytes[2] > 128);
    }

    #[test]
    fn test_002() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.png");
        assert!(write_image_rgba8(&path, 2, 2, vec![0; 4]).is_err());
    }
}
