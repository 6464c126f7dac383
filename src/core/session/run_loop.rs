use super::session_core::*;
use super::session_state::*;
use crate::core::buffers::*;
use crate::core::device::*;
use crate::core::misc::*;

use log::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Poll interval of the tonemap handshake while waiting for the host.
const TONEMAP_WAIT: Duration = Duration::from_millis(100);

impl SessionCore {
    /// Body of the session thread started by `Session::start`.
    pub fn run(self: &Arc<Self>) {
        info!("Session thread started on {}", self.device.info().description);
        let features = self.requested_device_features();
        if !self.load_kernels(&features) {
            return;
        }

        self.progress.set_status("Waiting for render to start", "");

        if !self.progress.get_cancel() {
            self.progress.reset_sample();
            self.set_state(SessionState::Running);
            if self.device_use_gl {
                self.run_gpu();
            } else {
                self.run_cpu();
            }
        }

        self.finish();
    }

    /// Body of the session thread started by `Session::start_denoise`.
    pub fn run_denoise(self: &Arc<Self>) {
        if !self.progress.get_cancel() {
            let features = DeviceRequestedFeatures {
                use_denoising: true,
                ..Default::default()
            };
            if !self.load_kernels(&features) {
                return;
            }

            let Some(buffers) = self.buffers.clone() else {
                self.report_error("Denoising needs the persistent render buffers");
                self.finish();
                return;
            };
            self.set_state(SessionState::Running);
            self.progress.reset_sample();

            let buffer_params = buffers.read().unwrap().params.clone();
            {
                let mut tile = self.tile.lock().unwrap();
                tile.manager.only_denoise = true;
                tile.manager
                    .reset(&buffer_params, self.samples.load(Ordering::SeqCst));
                tile.manager.state.global_buffers = Some(buffers.clone());
            }
            let start_time = time_dt();
            self.timing.lock().unwrap().start_time = start_time;
            self.progress.set_render_start_time(start_time);

            let kernel_data = KernelData {
                half_window: self.params.half_window,
                pass_stride: buffer_params.passes_size(),
                pass_denoising: buffer_params.denoise_offset(),
                pass_no_denoising: if buffer_params.selective_denoising {
                    buffer_params.denoise_offset() + DENOISING_PASS_SIZE
                } else {
                    0
                },
                exposure: 1.0,
                num_frames: buffer_params.frames,
                prev_frames: self.params.prev_frames,
            };
            match serde_json::to_vec(&kernel_data) {
                Ok(data) => self.device.const_copy_to(KERNEL_DATA_NAME, &data),
                Err(e) => self.report_error(&e.to_string()),
            }

            self.tile.lock().unwrap().manager.next();
            {
                let _pass = self.buffers_lock.lock().unwrap();
                self.check_device_error();
                self.update_status_time(false, false);
                if !self.progress.get_cancel() {
                    self.render_denoise();
                }
                self.update_status_time(false, false);
                self.check_device_error();
            }

            self.device.task_wait();
            self.check_device_error();
            self.progress.set_update();
        }

        self.finish();
    }

    fn render_denoise(self: &Arc<Self>) {
        let callbacks: Arc<dyn TileCallbacks> = self.clone();
        self.device.task_add(DeviceTask::Denoise(RenderTask {
            callbacks,
            need_finish_queue: false,
            requested_tile_size: self.params.tile_size,
        }));
    }

    fn finish(&self) {
        if self.progress.get_cancel() {
            self.progress
                .set_status("Cancel", &self.progress.get_cancel_message());
        } else {
            self.progress.set_update();
        }

        if self.progress.get_error() {
            self.set_state(SessionState::Error);
        } else if self.progress.get_cancel() {
            self.set_state(SessionState::Cancelled);
        } else {
            self.set_state(SessionState::Finished);
        }
        info!("Session thread finished: {:?}", self.state());
    }

    /// Blocks on the pause gate until unpaused, reset, given more samples or
    /// cancelled. Status and paused time are refreshed on every wake-up.
    fn wait_paused(&self, seen: u64, no_tiles: bool) {
        let paused = self.pause.is_paused();
        self.update_status_time(paused, no_tiles);
        if paused {
            self.set_state(SessionState::Paused);
        }

        let mut seen = seen;
        loop {
            let pause_start = time_dt();
            let (paused, generation) = self.pause.wait(seen);
            seen = generation;

            let (start_time, paused_time) = {
                let mut timing = self.timing.lock().unwrap();
                timing.paused_time += time_dt() - pause_start;
                (timing.start_time, timing.paused_time)
            };
            if !self.params.background {
                self.progress.set_start_time(start_time + paused_time);
            }
            self.progress.set_render_start_time(start_time + paused_time);

            self.update_status_time(paused, no_tiles);
            self.progress.set_update();

            if !paused || self.progress.get_cancel() {
                break;
            }
            self.set_state(SessionState::Paused);
        }

        if !self.progress.get_cancel() {
            self.set_state(SessionState::Running);
        }
    }

    fn apply_delayed_reset(&self) -> bool {
        let mut delayed_reset = self.delayed_reset.lock().unwrap();
        let mut display = self.display.lock().unwrap();
        let _pass = self.buffers_lock.lock().unwrap();
        if let Some((params, samples)) = delayed_reset.take() {
            self.reset_locked(&mut display, &params, samples);
            return true;
        }
        return false;
    }

    /// Writes out on exit unless the last pass already did. A cancel is
    /// always followed by exactly one final write.
    fn flush_progressive_refine(&self, tiles_written: bool, cancel_flushed: bool) {
        if self.progress.get_cancel() {
            if !cancel_flushed {
                self.update_progressive_refine(true);
            }
        } else if !tiles_written {
            self.update_progressive_refine(true);
        }
    }

    pub fn run_cpu(self: &Arc<Self>) {
        let mut tiles_written = false;
        let mut cancel_flushed = false;

        self.timing.lock().unwrap().last_update_time = time_dt();
        self.apply_delayed_reset();

        while !self.progress.get_cancel() {
            let seen = self.pause.generation();
            let no_tiles = !self.tile.lock().unwrap().manager.next();
            let mut need_tonemap = false;

            if self.params.background {
                if no_tiles {
                    self.progress.set_status("Finished", "");
                    break;
                }
            } else {
                let reset_pending = self.delayed_reset.lock().unwrap().do_reset;
                let paused = self.pause.is_paused();
                if !paused && reset_pending {
                    self.apply_delayed_reset();
                    continue;
                } else if paused || no_tiles {
                    self.wait_paused(seen, no_tiles);
                }

                if self.progress.get_cancel() {
                    break;
                }
            }

            if !no_tiles {
                let _pass = self.buffers_lock.lock().unwrap();

                self.update_scene();
                self.check_device_error();
                if self.progress.get_cancel() {
                    break;
                }

                self.update_status_time(false, false);
                self.render();
                self.update_status_time(false, false);

                if !self.params.background {
                    need_tonemap = true;
                }
                self.check_device_error();
            }

            self.device.task_wait();

            {
                let mut delayed_reset = self.delayed_reset.lock().unwrap();
                let mut display = self.display.lock().unwrap();
                let _pass = self.buffers_lock.lock().unwrap();

                if let Some((params, samples)) = delayed_reset.take() {
                    self.reset_locked(&mut display, &params, samples);
                } else if need_tonemap {
                    // an interrupted pass is not shown
                    if let Some(display) = display.as_mut() {
                        let sample = self.tile.lock().unwrap().manager.last_sample();
                        self.tonemap(display, sample);
                    }
                }

                self.check_device_error();
                let cancel = self.progress.get_cancel();
                tiles_written = self.update_progressive_refine(cancel);
                cancel_flushed = cancel;
            }

            self.progress.set_update();
        }

        self.flush_progressive_refine(tiles_written, cancel_flushed);
    }

    pub fn run_gpu(self: &Arc<Self>) {
        let mut tiles_written = false;
        let mut cancel_flushed = false;

        let now = time_dt();
        {
            let mut timing = self.timing.lock().unwrap();
            timing.start_time = now;
            timing.reset_time = now;
            timing.paused_time = 0.0;
            timing.last_update_time = now;
        }
        self.progress.set_render_start_time(now);

        while !self.progress.get_cancel() {
            let seen = self.pause.generation();
            let no_tiles = !self.tile.lock().unwrap().manager.next();

            if self.params.background {
                if no_tiles {
                    self.progress.set_status("Finished", "");
                    break;
                }
            } else {
                if self.pause.is_paused() || no_tiles {
                    self.wait_paused(seen, no_tiles);
                }
                if self.progress.get_cancel() {
                    break;
                }
            }

            if !no_tiles {
                self.update_scene();
                self.check_device_error();
                if self.progress.get_cancel() {
                    break;
                }

                // held for the whole pass; reset and draw get in between passes
                let mut pass = self.buffers_lock.lock().unwrap();

                self.update_status_time(false, false);
                self.render();
                self.device.task_wait();
                self.check_device_error();
                self.update_status_time(false, false);

                self.gpu_need_tonemap.store(true, Ordering::SeqCst);
                self.gpu_draw_ready.store(true, Ordering::SeqCst);
                self.progress.set_update();

                if !self.params.background {
                    while self.gpu_need_tonemap.load(Ordering::SeqCst) {
                        if self.progress.get_cancel() {
                            break;
                        }
                        pass = self
                            .tonemap_cond
                            .wait_timeout(pass, TONEMAP_WAIT)
                            .unwrap()
                            .0;
                    }
                }

                self.check_device_error();
                let cancel = self.progress.get_cancel();
                tiles_written = self.update_progressive_refine(cancel);
                cancel_flushed = cancel;

                if cancel {
                    break;
                }
            }
        }

        self.flush_progressive_refine(tiles_written, cancel_flushed);
    }
}
