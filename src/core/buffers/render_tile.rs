use super::render_buffers::*;

#[derive(Debug, PartialEq, Eq, Default, Copy, Clone)]
pub enum RenderTileTask {
    #[default]
    PathTrace,
    Denoise,
}

/// Resolved work unit handed to a device for one claim.
///
/// Coordinates are absolute image coordinates; `offset` and `stride` map them
/// into `buffers`.
#[derive(Debug, Default, Clone)]
pub struct RenderTile {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub start_sample: i32,
    pub num_samples: i32,
    pub sample: i32,
    pub resolution: i32,
    pub offset: i32,
    pub stride: i32,
    pub tile_index: usize,
    pub task: RenderTileTask,
    pub buffers: Option<SharedRenderBuffers>,
    /// Sub-device number the tile is mapped to.
    pub device: usize,
}

impl RenderTile {
    #[inline]
    pub fn pixel_index(&self, x: i32, y: i32) -> usize {
        return (self.offset + x + y * self.stride) as usize;
    }

    pub fn end_sample(&self) -> i32 {
        return self.start_sample + self.num_samples;
    }

    pub fn is_empty(&self) -> bool {
        return self.w <= 0 || self.h <= 0;
    }
}
