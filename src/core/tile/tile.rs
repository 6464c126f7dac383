use crate::core::buffers::*;
use crate::core::geometry::*;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum TileState {
    Pending,
    Active,
    Done,
    Denoise,
}

/// One rectangular work unit, positioned relative to the tile manager's
/// buffer origin.
#[derive(Debug, Clone)]
pub struct Tile {
    pub index: usize,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Device the tile is pinned to once claimed.
    pub device: Option<usize>,
    pub state: TileState,
    /// Claims of this tile run the denoiser rather than the path tracer.
    pub denoise: bool,
    pub buffers: Option<SharedRenderBuffers>,
}

impl Tile {
    pub fn new(index: usize, x: i32, y: i32, w: i32, h: i32) -> Self {
        Tile {
            index,
            x,
            y,
            w,
            h,
            device: None,
            state: TileState::Pending,
            denoise: false,
            buffers: None,
        }
    }

    pub fn bounds(&self) -> Bounds2i {
        return Bounds2i::from_xywh(self.x, self.y, self.w, self.h);
    }

    /// Twice the tile center, kept integral.
    pub fn center2(&self) -> Vector2i {
        return Vector2i::new(2 * self.x + self.w, 2 * self.y + self.h);
    }

    pub fn is_claimable(&self) -> bool {
        return self.state == TileState::Pending || self.state == TileState::Denoise;
    }
}
