use super::session_core::*;
use crate::core::buffers::*;
use crate::core::device::*;
use crate::core::geometry::*;
use crate::core::tile::*;

use log::*;

impl TileCallbacks for SessionCore {
    fn acquire_tile(&self, tile_device: &DeviceInfo, rtile: &mut RenderTile) -> bool {
        // progressive refine finishes the current sample of every tile
        if self.progress.get_cancel() && !self.params.progressive_refine {
            return false;
        }

        let device_num = self.device.device_number(tile_device);
        let mut guard = self.tile.lock().unwrap();
        let tile = {
            let manager = &mut guard.manager;
            let Some(tile) = manager.next_tile(device_num) else {
                return false;
            };
            let tile = tile.clone();
            let state = &manager.state;

            rtile.x = state.buffer.full_x + tile.x;
            rtile.y = state.buffer.full_y + tile.y;
            rtile.w = tile.w;
            rtile.h = tile.h;
            rtile.start_sample = state.sample;
            rtile.num_samples = state.num_samples;
            rtile.sample = state.sample;
            rtile.resolution = state.resolution_divider;
            rtile.tile_index = tile.index;
            rtile.task = if tile.denoise {
                RenderTileTask::Denoise
            } else {
                RenderTileTask::PathTrace
            };
            tile
        };

        let global = guard.manager.state.global_buffers.clone();
        if let Some(buffers) = global {
            let (offset, stride) = guard.manager.state.buffer.offset_stride();
            rtile.offset = offset;
            rtile.stride = stride;
            rtile.buffers = Some(buffers.clone());
            guard.manager.state.tiles[tile.index].buffers = Some(buffers);
            drop(guard);

            self.device.map_tile(tile_device, rtile);
            return true;
        }

        let is_gpu = tile_device.is_gpu() || self.params.cpu_overscan;
        let overscan = if self.params.denoise_result && is_gpu {
            self.params.half_window
        } else {
            0
        };
        rtile.x -= overscan;
        rtile.y -= overscan;
        rtile.w += 2 * overscan;
        rtile.h += 2 * overscan;

        let buffers = match tile.buffers {
            Some(buffers) => buffers,
            None => {
                let mut buffer_params = guard.manager.params.clone();
                buffer_params.full_x = rtile.x;
                buffer_params.full_y = rtile.y;
                buffer_params.width = rtile.w;
                buffer_params.height = rtile.h;
                buffer_params.overscan = overscan;
                buffer_params.final_width = rtile.w - 2 * overscan;
                buffer_params.final_height = rtile.h - 2 * overscan;
                let device = self.device.device_number(tile_device);

                let buffers = if self.params.progressive_refine {
                    let num_tiles = guard.manager.state.num_tiles as usize;
                    if guard.tile_buffers.is_empty() {
                        guard.tile_buffers.resize(num_tiles, None);
                    }
                    // the partition must not change while buffers are kept
                    assert_eq!(guard.tile_buffers.len(), num_tiles);
                    match guard.tile_buffers[tile.index].clone() {
                        Some(buffers) => buffers,
                        None => {
                            let buffers = RenderBuffers::new_shared(device, &buffer_params);
                            guard.tile_buffers[tile.index] = Some(buffers.clone());
                            buffers
                        }
                    }
                } else {
                    RenderBuffers::new_shared(device, &buffer_params)
                };
                guard.manager.state.tiles[tile.index].buffers = Some(buffers.clone());
                buffers
            }
        };
        drop(guard);

        let (offset, stride) = buffers.read().unwrap().params.offset_stride();
        rtile.offset = offset;
        rtile.stride = stride;
        rtile.buffers = Some(buffers);
        self.device.map_tile(tile_device, rtile);

        // marks the tile as in progress before its first sample lands
        self.update_tile_sample(rtile);
        return true;
    }

    fn release_tile(&self, rtile: &mut RenderTile) {
        let mut guard = self.tile.lock().unwrap();
        let ret = guard.manager.return_tile(rtile.tile_index);

        if ret.finished {
            if !self.params.progressive_refine {
                if let Some(cb) = self.write_callback() {
                    cb(rtile);
                }
            }
            if ret.delete_buffer {
                guard.manager.state.tiles[rtile.tile_index].buffers = None;
                rtile.buffers = None;
            }
        } else if !self.params.progressive_refine {
            if let Some(cb) = self.update_callback() {
                cb(rtile, false);
            }
        }

        self.update_status_time_locked(&guard, false, false);
    }

    fn get_neighbor_tiles(&self, tiles: &mut [RenderTile; 9]) {
        let guard = self.tile.lock().unwrap();
        let manager = &guard.manager;
        let state = &manager.state;

        let center_index = tiles[4].tile_index;
        let center = &state.tiles[center_index];
        debug_assert_eq!(center.state, TileState::Active);
        let center_x = state.buffer.full_x + center.x;
        let center_y = state.buffer.full_y + center.y;

        let params = &manager.params;
        let region = Bounds2i::from_xywh(params.full_x, params.full_y, params.width, params.height);

        let mut i = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let p = Vector2i::new(
                    center_x + dx * manager.tile_size.x,
                    center_y + dy * manager.tile_size.y,
                );
                let neighbor = &mut tiles[i];
                if region.inside_exclusive(&p) {
                    let index = center_index as i64 + (dy * state.tile_stride + dx) as i64;
                    let tile = &state.tiles[index as usize];
                    let buffers = tile
                        .buffers
                        .clone()
                        .or_else(|| state.global_buffers.clone());
                    assert!(buffers.is_some(), "neighbor tile {} has no buffer", index);

                    neighbor.x = state.buffer.full_x + tile.x;
                    neighbor.y = state.buffer.full_y + tile.y;
                    neighbor.w = tile.w;
                    neighbor.h = tile.h;
                    neighbor.tile_index = tile.index;
                    if let Some(buffers) = buffers.as_ref() {
                        let (offset, stride) = buffers.read().unwrap().params.offset_stride();
                        neighbor.offset = offset;
                        neighbor.stride = stride;
                    }
                    neighbor.buffers = buffers;
                } else {
                    let clamped = region.clamp_point(&p);
                    neighbor.x = clamped.x;
                    neighbor.y = clamped.y;
                    neighbor.w = 0;
                    neighbor.h = 0;
                    neighbor.buffers = None;
                }
                i += 1;
            }
        }

        assert!(tiles[4].buffers.is_some(), "denoised tile has no buffer");
        trace!("Neighbors of tile {} resolved", center_index);
    }

    fn update_tile_sample(&self, rtile: &mut RenderTile) {
        let guard = self.tile.lock().unwrap();
        if !self.params.progressive_refine {
            if let Some(cb) = self.update_callback() {
                cb(rtile, true);
            }
        }
        self.update_status_time_locked(&guard, false, false);
    }

    fn update_progress_sample(&self) {
        self.progress.increment_sample();
    }

    fn get_cancel(&self) -> bool {
        return self.progress.get_cancel();
    }
}
