use super::tile::*;
use super::tile_order::*;
use crate::core::buffers::*;
use crate::core::geometry::*;
use crate::core::misc::*;

use log::*;
use std::collections::VecDeque;
use std::sync::Arc;

/// Target sample count of an unbounded progressive render.
pub const INFINITE_SAMPLES: i32 = i32::MAX;

#[derive(Debug, Clone)]
pub struct TileManagerParams {
    pub progressive: bool,
    pub samples: i32,
    pub tile_size: Vector2i,
    /// Preview resolution in pixels per side; `i32::MAX` disables previews.
    pub start_resolution: i32,
    pub preserve_tile_device: bool,
    pub background: bool,
    pub tile_order: TileOrder,
    pub num_devices: usize,
    pub only_denoise: bool,
    /// Finished tiles keep their buffers.
    pub keep_buffers: bool,
    pub seed: u64,
}

impl Default for TileManagerParams {
    fn default() -> Self {
        TileManagerParams {
            progressive: false,
            samples: 1,
            tile_size: Vector2i::new(64, 64),
            start_resolution: i32::MAX,
            preserve_tile_device: false,
            background: true,
            tile_order: TileOrder::Center,
            num_devices: 1,
            only_denoise: false,
            keep_buffers: false,
            seed: 0,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TileManagerState {
    /// Buffer of the current pass, scaled down by `resolution_divider`.
    pub buffer: BufferParams,
    pub sample: i32,
    pub num_samples: i32,
    pub resolution_divider: i32,
    pub tile_stride: i32,
    pub num_tiles: i32,
    pub num_rendered_tiles: i32,
    pub tiles: Vec<Tile>,
    pub global_buffers: Option<SharedRenderBuffers>,
}

/// Outcome of returning a claimed tile.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct TileReturn {
    /// The tile reached its target sample count.
    pub finished: bool,
    /// The tile's own buffer should be released now.
    pub delete_buffer: bool,
}

/// Partitions the frame into tiles and hands them out pass by pass.
///
/// `next` is driven by the session thread only; `next_tile` and `return_tile`
/// are called from device threads and must be serialized by the caller.
#[derive(Debug)]
pub struct TileManager {
    pub progressive: bool,
    pub num_samples: i32,
    pub tile_size: Vector2i,
    pub start_resolution: i32,
    pub preserve_tile_device: bool,
    pub background: bool,
    pub tile_order: TileOrder,
    pub num_devices: usize,
    pub only_denoise: bool,
    pub keep_buffers: bool,
    pub seed: u64,
    /// Full resolution parameters passed to `reset`.
    pub params: BufferParams,
    pub state: TileManagerState,
    order: Vec<usize>,
    device_queues: Vec<VecDeque<usize>>,
    shared_queue: VecDeque<usize>,
}

impl TileManager {
    pub fn new(params: &TileManagerParams) -> Self {
        let num_devices = params.num_devices.max(1);
        let mut manager = TileManager {
            progressive: params.progressive,
            num_samples: params.samples,
            tile_size: Vector2i::new(params.tile_size.x.max(1), params.tile_size.y.max(1)),
            start_resolution: params.start_resolution,
            preserve_tile_device: params.preserve_tile_device,
            background: params.background,
            tile_order: params.tile_order,
            num_devices,
            only_denoise: params.only_denoise,
            keep_buffers: params.keep_buffers,
            seed: params.seed,
            params: BufferParams::default(),
            state: TileManagerState::default(),
            order: Vec::new(),
            device_queues: vec![VecDeque::new(); num_devices],
            shared_queue: VecDeque::new(),
        };
        manager.reset(&BufferParams::default(), params.samples);
        return manager;
    }

    /// Starts over on a new frame: computes the preview divider, discards the
    /// tiles and zeroes the rendered tile counter.
    pub fn reset(&mut self, params: &BufferParams, num_samples: i32) {
        let divider = if self.progressive {
            Self::get_divider(params.width, params.height, self.start_resolution)
        } else {
            1
        };

        self.params = params.clone();
        self.set_samples(num_samples);

        self.state.buffer = BufferParams::default();
        self.state.sample = -1;
        self.state.num_samples = 0;
        // the first call to next() halves this to the preview divider
        self.state.resolution_divider = if divider > 1 { divider * 2 } else { 1 };
        self.state.num_tiles = 0;
        self.state.num_rendered_tiles = 0;
        self.state.tile_stride = 0;
        self.state.tiles.clear();
        self.order.clear();
        self.clear_queues();

        debug!(
            "TileManager::reset: {}x{}, {} samples, divider {}",
            params.width, params.height, num_samples, divider
        );
    }

    pub fn set_samples(&mut self, num_samples: i32) {
        self.num_samples = num_samples;
    }

    pub fn num_effective_samples(&self) -> i32 {
        return self.num_samples;
    }

    /// Index of the last sample accumulated once the current pass completes.
    pub fn last_sample(&self) -> i32 {
        return (self.state.sample.saturating_add(self.state.num_samples) - 1).max(0);
    }

    /// Smallest power of two divider bringing the frame down to at most
    /// `start_resolution` squared pixels.
    pub fn get_divider(width: i32, height: i32, start_resolution: i32) -> i32 {
        if start_resolution <= 0 || start_resolution == i32::MAX {
            return 1;
        }
        let mut image_area = width as i64 * height as i64;
        let pixel_count = start_resolution as i64 * start_resolution as i64;
        let mut divider = 1;
        while image_area > pixel_count {
            divider <<= 1;
            image_area >>= 2;
        }
        return divider;
    }

    pub fn done(&self) -> bool {
        return self.state.sample >= 0
            && self.state.sample.saturating_add(self.state.num_samples) >= self.num_samples
            && self.state.resolution_divider == 1;
    }

    /// Advances to the next pass; false once every tile reached the target.
    pub fn next(&mut self) -> bool {
        // nothing to do before the first reset with a real frame
        if self.done() || self.params.width <= 0 || self.params.height <= 0 {
            return false;
        }

        if self.progressive && self.state.resolution_divider > 1 {
            self.state.sample = 0;
            self.state.resolution_divider /= 2;
            self.state.num_samples = 1;
            self.set_tiles();
        } else {
            let regenerate = self.state.resolution_divider != 1 || self.state.tiles.is_empty();
            self.state.sample = if self.state.sample < 0 {
                0
            } else {
                self.state.sample.saturating_add(self.state.num_samples)
            };
            self.state.num_samples = if self.progressive {
                1
            } else {
                self.num_samples - self.state.sample
            };
            self.state.resolution_divider = 1;
            if regenerate {
                self.set_tiles();
            } else {
                self.requeue_tiles();
            }
        }
        return true;
    }

    fn set_tiles(&mut self) {
        let resolution = self.state.resolution_divider;
        let (image_w, image_h) = if self.params.width <= 0 || self.params.height <= 0 {
            (0, 0)
        } else {
            (
                i32::max(1, self.params.width / resolution),
                i32::max(1, self.params.height / resolution),
            )
        };

        let mut buffer = self.params.clone();
        buffer.full_x = self.params.full_x / resolution;
        buffer.full_y = self.params.full_y / resolution;
        buffer.width = image_w;
        buffer.height = image_h;
        buffer.full_width = i32::max(1, self.params.full_width / resolution);
        buffer.full_height = i32::max(1, self.params.full_height / resolution);
        self.state.buffer = buffer;

        self.gen_tiles(image_w, image_h);
        self.requeue_tiles();
    }

    fn gen_tiles(&mut self, image_w: i32, image_h: i32) {
        let tile_w = self.tile_size.x;
        let tile_h = self.tile_size.y;
        let tiles_x = divide_up(image_w, tile_w);
        let tiles_y = divide_up(image_h, tile_h);

        self.state.tiles.clear();
        self.state.tiles.reserve((tiles_x * tiles_y) as usize);
        for y in 0..tiles_y {
            for x in 0..tiles_x {
                let x0 = x * tile_w;
                let y0 = y * tile_h;
                let w = i32::min(tile_w, image_w - x0);
                let h = i32::min(tile_h, image_h - y0);
                let index = (y * tiles_x + x) as usize;
                let mut tile = Tile::new(index, x0, y0, w, h);
                tile.denoise = self.only_denoise;
                if self.preserve_tile_device && self.num_devices > 1 {
                    tile.device = Some(Self::device_for_tile(&tile, image_h, self.num_devices));
                }
                self.state.tiles.push(tile);
            }
        }
        self.state.tile_stride = tiles_x;
        self.state.num_tiles = tiles_x * tiles_y;
        self.order = self
            .tile_order
            .sort(&self.state.tiles, image_w, image_h, self.seed);

        debug!(
            "TileManager::gen_tiles: {} tiles ({}x{}) over {}x{}",
            self.state.num_tiles, tiles_x, tiles_y, image_w, image_h
        );
    }

    /// Horizontal band of the frame a tile belongs to, one band per device.
    pub fn device_for_tile(tile: &Tile, image_h: i32, num_devices: usize) -> usize {
        let center_y = (tile.y + tile.h / 2) as i64;
        let band = center_y * num_devices as i64 / i64::max(1, image_h as i64);
        return (band.max(0) as usize).min(num_devices - 1);
    }

    fn clear_queues(&mut self) {
        for queue in self.device_queues.iter_mut() {
            queue.clear();
        }
        self.shared_queue.clear();
    }

    fn requeue_tiles(&mut self) {
        self.clear_queues();
        for i in self.order.iter() {
            let tile = &mut self.state.tiles[*i];
            tile.state = if tile.denoise {
                TileState::Denoise
            } else {
                TileState::Pending
            };
            match tile.device {
                Some(device) => self.device_queues[device].push_back(*i),
                None => self.shared_queue.push_back(*i),
            }
        }
    }

    /// Claims the next tile for `device`. Pinned tiles only go to their
    /// device; an unpinned tile gets pinned to its first claimer.
    pub fn next_tile(&mut self, device: usize) -> Option<&Tile> {
        let device = device.min(self.num_devices - 1);
        let index = match self.device_queues[device].pop_front() {
            Some(index) => index,
            None => self.shared_queue.pop_front()?,
        };

        let tile = &mut self.state.tiles[index];
        debug_assert!(tile.is_claimable());
        debug_assert!(tile.device.is_none() || tile.device == Some(device));
        tile.device = Some(device);
        tile.state = TileState::Active;
        self.state.num_rendered_tiles += 1;
        return Some(&self.state.tiles[index]);
    }

    /// Marks the current pass of a claimed tile as complete.
    pub fn return_tile(&mut self, index: usize) -> TileReturn {
        let finished = self.tile_finished();
        let global = self.state.global_buffers.clone();
        let tile = &mut self.state.tiles[index];
        debug_assert_eq!(tile.state, TileState::Active);

        if !finished {
            tile.state = TileState::Pending;
            return TileReturn {
                finished: false,
                delete_buffer: false,
            };
        }

        tile.state = TileState::Done;
        let owns_buffer = match (&tile.buffers, &global) {
            (Some(own), Some(global)) => !Arc::ptr_eq(own, global),
            (Some(_), None) => true,
            (None, _) => false,
        };
        return TileReturn {
            finished: true,
            delete_buffer: owns_buffer && !self.keep_buffers,
        };
    }

    fn tile_finished(&self) -> bool {
        if self.state.resolution_divider != 1 {
            return false;
        }
        if self.only_denoise {
            return true;
        }
        return self.state.sample.saturating_add(self.state.num_samples) >= self.num_samples;
    }
}
