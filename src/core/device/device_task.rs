use super::device::*;
use crate::core::buffers::*;
use crate::core::geometry::*;

use std::sync::Arc;
use std::sync::Mutex;

/// Calls a device makes back into the session while running a render task.
///
/// All methods may be called concurrently from device worker threads.
pub trait TileCallbacks: Send + Sync {
    fn acquire_tile(&self, tile_device: &DeviceInfo, rtile: &mut RenderTile) -> bool;
    fn release_tile(&self, rtile: &mut RenderTile);
    fn get_neighbor_tiles(&self, tiles: &mut [RenderTile; 9]);
    fn update_tile_sample(&self, rtile: &mut RenderTile);
    fn update_progress_sample(&self);
    fn get_cancel(&self) -> bool;
}

#[derive(Clone)]
pub struct RenderTask {
    pub callbacks: Arc<dyn TileCallbacks>,
    /// Finish every claimed tile's samples even after a cancel.
    pub need_finish_queue: bool,
    pub requested_tile_size: Vector2i,
}

/// Converts accumulated samples of `buffers` into display pixels.
#[derive(Clone)]
pub struct FilmConvertTask {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub offset: i32,
    pub stride: i32,
    pub sample: i32,
    pub buffers: SharedRenderBuffers,
    pub rgba: SharedDisplayPixels,
}

/// Evaluates the shader kernel over `input[x..x + w]`.
#[derive(Clone)]
pub struct ShaderTask {
    pub x: usize,
    pub w: usize,
    pub input: Arc<Vec<[f32; 4]>>,
    pub output: Arc<Mutex<Vec<[f32; 4]>>>,
}

#[derive(Clone)]
pub enum DeviceTask {
    Render(RenderTask),
    Denoise(RenderTask),
    FilmConvert(FilmConvertTask),
    Shader(ShaderTask),
}

impl DeviceTask {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceTask::Render(_) => "render",
            DeviceTask::Denoise(_) => "denoise",
            DeviceTask::FilmConvert(_) => "film_convert",
            DeviceTask::Shader(_) => "shader",
        }
    }
}
