use crate::core::error::SessionResult;

/// Region of tonemapped RGBA pixels, row-major, four floats per pixel.
pub struct DisplayTile {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub buffer: Vec<f32>,
}

/// Host side presentation target for `Session::draw`.
pub trait Display {
    fn update(&mut self, tile: &DisplayTile) -> SessionResult<()>;
}
