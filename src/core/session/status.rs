use super::session_core::*;
use crate::core::misc::*;
use crate::core::tile::*;

impl SessionCore {
    pub fn update_status_time(&self, show_pause: bool, show_done: bool) {
        let tile = self.tile.lock().unwrap();
        self.update_status_time_locked(&tile, show_pause, show_done);
    }

    /// Refreshes the status line and the per-tile timing; the caller holds
    /// the tile lock.
    pub(crate) fn update_status_time_locked(
        &self,
        tile: &TileContext,
        show_pause: bool,
        show_done: bool,
    ) {
        let manager = &tile.manager;
        let progressive_sample = manager.state.sample as i64;
        let num_samples = manager.num_effective_samples() as i64;
        let rendered = manager.state.num_rendered_tiles;
        let num_tiles = manager.state.num_tiles;
        let progress_sample = self.progress.get_sample() as i64;

        let mut substatus = if !manager.progressive {
            let info = self.device.info();
            let is_gpu = info.is_gpu() || info.multi_devices.iter().any(|d| d.is_gpu());
            let is_last_tile = rendered == num_tiles;
            let mut s = format!("Path Tracing Tile {}/{}", rendered, num_tiles);
            if is_gpu && !is_last_tile {
                // whole-tile devices only report samples of the tiles in flight
                let total = num_samples * num_tiles as i64;
                s += &format!(", Sample {}/{}", progress_sample, total);
            }
            s
        } else if manager.num_samples == INFINITE_SAMPLES {
            format!("Path Tracing Sample {}", progressive_sample + 1)
        } else {
            format!(
                "Path Tracing Sample {}/{}",
                progressive_sample + 1,
                num_samples
            )
        };

        let status = if show_pause {
            String::from("Paused")
        } else if show_done {
            String::from("Done")
        } else {
            std::mem::take(&mut substatus)
        };
        self.progress.set_status(&status, &substatus);

        let tile_time = {
            let mut timing = self.timing.lock().unwrap();
            if timing.preview_time == 0.0 && manager.state.resolution_divider == 1 {
                timing.preview_time = time_dt();
            }
            if rendered == 0 || progress_sample == 0 {
                0.0
            } else {
                let elapsed = time_dt() - timing.preview_time - timing.paused_time;
                elapsed.max(0.0) / progress_sample as f64
            }
        };
        self.progress.set_tile(rendered, tile_time);
    }
}
