use crate::core::error::*;
use crate::core::geometry::*;
use crate::core::tile::*;

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    /// Headless render: no pausing, stops once every tile is done.
    pub background: bool,
    /// Accumulate one sample per pass instead of the whole target at once.
    pub progressive: bool,
    /// Keep per-tile buffers across passes and report them as a whole.
    pub progressive_refine: bool,
    /// Image written when the session is dropped.
    pub output_path: Option<PathBuf>,
    pub samples: i32,
    pub tile_size: Vector2i,
    pub tile_order: TileOrder,
    pub start_resolution: i32,
    /// Worker threads of the CPU device, 0 for one per core.
    pub threads: usize,
    pub display_buffer_linear: bool,
    pub cancel_timeout: f64,
    pub reset_timeout: f64,
    pub text_timeout: f64,
    pub progressive_update_timeout: f64,
    pub denoise_result: bool,
    pub half_window: i32,
    pub prev_frames: i32,
    pub only_denoise: bool,
    /// Overscan tiles on the CPU as well.
    pub cpu_overscan: bool,
    pub experimental: bool,
    /// Seed of the shuffled tile order.
    pub seed: u64,
}

impl Default for SessionParams {
    fn default() -> Self {
        SessionParams {
            background: false,
            progressive: false,
            progressive_refine: false,
            output_path: None,
            samples: INFINITE_SAMPLES,
            tile_size: Vector2i::new(64, 64),
            tile_order: TileOrder::Center,
            start_resolution: i32::MAX,
            threads: 0,
            display_buffer_linear: false,
            cancel_timeout: 0.1,
            reset_timeout: 0.1,
            text_timeout: 1.0,
            progressive_update_timeout: 1.0,
            denoise_result: false,
            half_window: 8,
            prev_frames: 0,
            only_denoise: false,
            cpu_overscan: false,
            experimental: false,
            seed: 0,
        }
    }
}

impl SessionParams {
    pub fn from_json_str(s: &str) -> SessionResult<Self> {
        let params: SessionParams = serde_json::from_str(s)?;
        params.validate()?;
        return Ok(params);
    }

    pub fn from_json_file(path: &Path) -> SessionResult<Self> {
        let file = File::open(path)?;
        let params: SessionParams = serde_json::from_reader(BufReader::new(file))?;
        params.validate()?;
        return Ok(params);
    }

    pub fn validate(&self) -> SessionResult<()> {
        if self.samples < 1 {
            return Err(SessionError::config(format!(
                "samples must be positive, got {}",
                self.samples
            )));
        }
        if self.tile_size.x < 1 || self.tile_size.y < 1 {
            return Err(SessionError::config(format!(
                "tile_size must be positive, got {}x{}",
                self.tile_size.x, self.tile_size.y
            )));
        }
        if self.half_window < 0 {
            return Err(SessionError::config("half_window must not be negative"));
        }
        return Ok(());
    }

    /// Preview passes only make sense when the whole frame is refined at
    /// once on screen.
    pub fn effective_start_resolution(&self) -> i32 {
        if self.progressive_refine || self.background {
            return i32::MAX;
        }
        return self.start_resolution;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let params =
            SessionParams::from_json_str(r#"{"samples": 16, "tile_order": "bottom_to_top"}"#)
                .unwrap();
        assert_eq!(params.samples, 16);
        assert_eq!(params.tile_order, TileOrder::BottomToTop);
        assert_eq!(params.tile_size, Vector2i::new(64, 64));
        assert!(!params.background);
    }

    #[test]
    fn test_002() {
        assert!(SessionParams::from_json_str(r#"{"samples": 0}"#).is_err());
        assert!(SessionParams::from_json_str(r#"{"tile_size": {"x": 0, "y": 8}}"#).is_err());
        assert!(SessionParams::from_json_str("{").is_err());
    }

    #[test]
    fn test_003() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut params = SessionParams::default();
        params.background = true;
        params.samples = 4;
        std::fs::write(&path, serde_json::to_string(&params).unwrap()).unwrap();
        assert_eq!(SessionParams::from_json_file(&path).unwrap(), params);
    }
}
