use super::delayed_reset::*;
use super::pause_gate::*;
use super::session_params::*;
use super::session_state::*;
use crate::core::buffers::*;
use crate::core::device::*;
use crate::core::display::*;
use crate::core::error::*;
use crate::core::misc::*;
use crate::core::progress::*;
use crate::core::scene::*;
use crate::core::tile::*;

use log::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::RwLock;

pub type WriteRenderTileCallback = Arc<dyn Fn(&RenderTile) + Send + Sync>;
pub type UpdateRenderTileCallback = Arc<dyn Fn(&RenderTile, bool) + Send + Sync>;

const KERNEL_LOAD_ERROR: &str = "Failed loading render kernel, see console for errors";

/// Tile manager and the buffers progressive refine keeps per tile index.
pub(crate) struct TileContext {
    pub manager: TileManager,
    pub tile_buffers: Vec<Option<SharedRenderBuffers>>,
}

#[derive(Debug, Default)]
pub(crate) struct SessionTiming {
    pub start_time: f64,
    pub reset_time: f64,
    pub preview_time: f64,
    pub paused_time: f64,
    pub last_update_time: f64,
    pub display_outdated: bool,
}

/// State shared by the session handle, its worker thread and the device.
///
/// Lock order: delayed reset, pause gate, display, buffers, tile. The timing
/// lock is a leaf.
pub(crate) struct SessionCore {
    pub params: SessionParams,
    pub samples: AtomicI32,
    pub device: Arc<dyn Device>,
    pub device_use_gl: bool,
    pub progress: Arc<Progress>,
    pub state: Mutex<SessionState>,
    pub delayed_reset: Mutex<DelayedReset>,
    pub pause: PauseGate,
    pub display: Mutex<Option<DisplayBuffer>>,
    /// Held while a pass is submitted; on the GPU path until it is tonemapped.
    pub buffers_lock: Mutex<()>,
    pub tonemap_cond: Condvar,
    pub gpu_need_tonemap: AtomicBool,
    pub gpu_draw_ready: AtomicBool,
    pub tile: Mutex<TileContext>,
    /// Persistent frame buffer; absent for headless tiled renders.
    pub buffers: Option<SharedRenderBuffers>,
    pub timing: Mutex<SessionTiming>,
    pub kernels_loaded: AtomicBool,
    pub scene: RwLock<Option<Arc<dyn Scene>>>,
    pub write_render_tile_cb: RwLock<Option<WriteRenderTileCallback>>,
    pub update_render_tile_cb: RwLock<Option<UpdateRenderTileCallback>>,
}

impl SessionCore {
    pub fn new(params: SessionParams, device: Arc<dyn Device>) -> Self {
        let info = device.info().clone();
        let device_use_gl = info.device_type != DeviceType::Cpu && !params.background;

        let manager = TileManager::new(&TileManagerParams {
            progressive: params.progressive || params.progressive_refine,
            samples: params.samples,
            tile_size: params.tile_size,
            start_resolution: params.effective_start_resolution(),
            preserve_tile_device: !params.background || params.progressive_refine,
            background: params.background,
            tile_order: params.tile_order,
            num_devices: usize::max(info.multi_devices.len(), 1),
            only_denoise: params.only_denoise,
            keep_buffers: params.progressive_refine,
            seed: params.seed,
        });

        let (buffers, display) = if params.background && params.output_path.is_none() {
            (None, None)
        } else {
            (
                Some(Arc::new(RwLock::new(RenderBuffers::new(0)))),
                Some(DisplayBuffer::new(params.display_buffer_linear)),
            )
        };

        let now = time_dt();
        SessionCore {
            samples: AtomicI32::new(params.samples),
            device,
            device_use_gl,
            progress: Arc::new(Progress::new()),
            state: Mutex::new(SessionState::Idle),
            delayed_reset: Mutex::new(DelayedReset::default()),
            pause: PauseGate::new(),
            display: Mutex::new(display),
            buffers_lock: Mutex::new(()),
            tonemap_cond: Condvar::new(),
            gpu_need_tonemap: AtomicBool::new(false),
            gpu_draw_ready: AtomicBool::new(false),
            tile: Mutex::new(TileContext {
                manager,
                tile_buffers: Vec::new(),
            }),
            buffers,
            timing: Mutex::new(SessionTiming {
                start_time: now,
                reset_time: now,
                last_update_time: now,
                ..Default::default()
            }),
            kernels_loaded: AtomicBool::new(false),
            scene: RwLock::new(None),
            write_render_tile_cb: RwLock::new(None),
            update_render_tile_cb: RwLock::new(None),
            params,
        }
    }

    pub fn state(&self) -> SessionState {
        return *self.state.lock().unwrap();
    }

    pub fn set_state(&self, state: SessionState) {
        let mut current = self.state.lock().unwrap();
        if *current != state {
            debug!("Session state: {:?} -> {:?}", *current, state);
            *current = state;
        }
    }

    /// Reports an error once; later reports are dropped.
    pub fn report_error(&self, message: &str) {
        if !self.progress.get_error() {
            self.progress.set_error(message);
        }
    }

    pub fn check_device_error(&self) {
        if let Some(message) = self.device.error_message() {
            self.report_error(&message);
        }
    }

    pub fn write_callback(&self) -> Option<WriteRenderTileCallback> {
        return self.write_render_tile_cb.read().unwrap().clone();
    }

    pub fn update_callback(&self) -> Option<UpdateRenderTileCallback> {
        return self.update_render_tile_cb.read().unwrap().clone();
    }

    /// Wakes the worker out of the tonemap handshake and the pause gate.
    pub fn release_waits(&self) {
        self.gpu_need_tonemap.store(false, Ordering::SeqCst);
        self.tonemap_cond.notify_all();
        self.pause.release();
    }

    pub fn ready_to_reset(&self) -> bool {
        let timing = self.timing.lock().unwrap();
        let dt = time_dt() - timing.reset_time;
        if !timing.display_outdated {
            return dt > self.params.reset_timeout;
        } else {
            return dt > self.params.cancel_timeout;
        }
    }

    /// Applies a reset; the caller holds the display and buffers locks.
    pub fn reset_locked(
        &self,
        display: &mut Option<DisplayBuffer>,
        buffer_params: &BufferParams,
        samples: i32,
    ) {
        if let Some(buffers) = self.buffers.as_ref() {
            let modified = buffer_params.modified(&buffers.read().unwrap().params);
            if modified {
                self.gpu_draw_ready.store(false, Ordering::SeqCst);
                buffers.write().unwrap().reset(buffer_params);
                if let Some(display) = display.as_mut() {
                    display.reset(buffer_params);
                }
            }
        }

        {
            let mut tile = self.tile.lock().unwrap();
            tile.manager.reset(buffer_params, samples);
            tile.manager.state.global_buffers = self.buffers.clone();
        }

        let start_time = time_dt();
        {
            let mut timing = self.timing.lock().unwrap();
            timing.start_time = start_time;
            timing.preview_time = 0.0;
            timing.paused_time = 0.0;
        }
        if !self.params.background {
            self.progress.set_start_time(start_time);
        }
        self.progress.set_render_start_time(start_time);

        info!(
            "Session reset: {}x{}, {} samples",
            buffer_params.width, buffer_params.height, samples
        );
    }

    pub fn reset_gpu(&self, buffer_params: &BufferParams, samples: i32) {
        {
            let mut display = self.display.lock().unwrap();
            let _pass = self.buffers_lock.lock().unwrap();
            {
                let mut timing = self.timing.lock().unwrap();
                timing.display_outdated = true;
                timing.reset_time = time_dt();
            }
            self.reset_locked(&mut display, buffer_params, samples);
            self.gpu_need_tonemap.store(false, Ordering::SeqCst);
            self.tonemap_cond.notify_all();
        }
        self.pause.notify();
    }

    pub fn reset_cpu(&self, buffer_params: &BufferParams, samples: i32) {
        {
            let mut delayed_reset = self.delayed_reset.lock().unwrap();
            {
                let mut timing = self.timing.lock().unwrap();
                timing.display_outdated = true;
                timing.reset_time = time_dt();
            }
            delayed_reset.request(buffer_params, samples);
            self.device.task_cancel();
        }
        self.pause.notify();
    }

    pub fn reset(&self, buffer_params: &BufferParams, samples: i32) {
        if self.device_use_gl {
            self.reset_gpu(buffer_params, samples);
        } else {
            self.reset_cpu(buffer_params, samples);
        }

        if self.params.progressive_refine {
            let _pass = self.buffers_lock.lock().unwrap();
            self.tile.lock().unwrap().tile_buffers.clear();
        }
    }

    pub fn set_samples(&self, samples: i32) {
        if self.samples.swap(samples, Ordering::SeqCst) != samples {
            self.tile.lock().unwrap().manager.set_samples(samples);
            self.pause.notify();
        }
    }

    /// Runs the film convert task into `display`; the caller holds the
    /// display and buffers locks.
    pub fn tonemap(&self, display: &mut DisplayBuffer, sample: i32) {
        if let Some(buffers) = self.buffers.as_ref() {
            let (x, y, w, h, offset, stride) = {
                let tile = self.tile.lock().unwrap();
                let buffer = &tile.manager.state.buffer;
                let (offset, stride) = buffer.offset_stride();
                (
                    buffer.full_x,
                    buffer.full_y,
                    buffer.width,
                    buffer.height,
                    offset,
                    stride,
                )
            };

            if w > 0 && h > 0 {
                self.device.task_add(DeviceTask::FilmConvert(FilmConvertTask {
                    x,
                    y,
                    w,
                    h,
                    offset,
                    stride,
                    sample,
                    buffers: buffers.clone(),
                    rgba: display.rgba.clone(),
                }));
                self.device.task_wait();
                display.draw_set(w, h);
            }
        }
        self.timing.lock().unwrap().display_outdated = false;
    }

    fn draw_result(&self, display: &DisplayBuffer, target: &mut dyn Display) -> bool {
        if let Err(e) = display.draw(target) {
            warn!("Session::draw: {}", e);
            return false;
        }
        let timing = self.timing.lock().unwrap();
        if timing.display_outdated && (time_dt() - timing.reset_time) > self.params.text_timeout {
            return false;
        }
        return true;
    }

    pub fn draw_gpu(&self, buffer_params: &BufferParams, target: &mut dyn Display) -> bool {
        let mut guard = self.display.lock().unwrap();
        let Some(display) = guard.as_mut() else {
            return false;
        };

        if self.gpu_draw_ready.load(Ordering::SeqCst) && !buffer_params.modified(&display.params) {
            // film convert has to run on the thread owning the display
            if self.gpu_need_tonemap.load(Ordering::SeqCst) {
                let _pass = self.buffers_lock.lock().unwrap();
                let sample = self.tile.lock().unwrap().manager.last_sample();
                self.tonemap(display, sample);
                self.gpu_need_tonemap.store(false, Ordering::SeqCst);
                self.tonemap_cond.notify_all();
            }
            return self.draw_result(display, target);
        }
        return false;
    }

    pub fn draw_cpu(&self, buffer_params: &BufferParams, target: &mut dyn Display) -> bool {
        let guard = self.display.lock().unwrap();
        let Some(display) = guard.as_ref() else {
            return false;
        };

        if display.draw_ready() && !buffer_params.modified(&display.params) {
            return self.draw_result(display, target);
        }
        return false;
    }

    pub fn draw(&self, buffer_params: &BufferParams, target: &mut dyn Display) -> bool {
        if self.device_use_gl {
            return self.draw_gpu(buffer_params, target);
        } else {
            return self.draw_cpu(buffer_params, target);
        }
    }

    pub fn requested_device_features(&self) -> DeviceRequestedFeatures {
        let mut features = DeviceRequestedFeatures {
            experimental: self.params.experimental,
            max_closure: 1,
            use_denoising: self.params.denoise_result || self.params.only_denoise,
            ..Default::default()
        };
        if let Some(scene) = self.scene.read().unwrap().as_ref() {
            scene.requested_features(&mut features);
        }
        if !self.params.background {
            // avoid recompiling kernels while editing interactively
            features.max_closure = 64;
        }
        return features;
    }

    /// Loads the device kernels once; on failure flags the error and moves
    /// the session to `Error`.
    pub fn load_kernels(&self, features: &DeviceRequestedFeatures) -> bool {
        if self.kernels_loaded.load(Ordering::SeqCst) {
            return true;
        }

        self.progress.set_status(
            "Loading render kernels (may take a few minutes the first time)",
            "",
        );
        debug!("Requested features: {:?}", features);
        if let Err(e) = self.device.load_kernels(features) {
            error!("{}", e);
            let message = self
                .device
                .error_message()
                .unwrap_or_else(|| KERNEL_LOAD_ERROR.to_string());
            self.report_error(&message);
            self.progress.set_status("Error", &message);
            self.progress.set_update();
            self.set_state(SessionState::Error);
            return false;
        }

        self.kernels_loaded.store(true, Ordering::SeqCst);
        return true;
    }

    pub fn update_scene(&self) {
        let scene = self.scene.read().unwrap().clone();
        let Some(scene) = scene else {
            return;
        };

        let (width, height, resolution) = {
            let tile = self.tile.lock().unwrap();
            let state = &tile.manager.state;
            (
                state.buffer.full_width,
                state.buffer.full_height,
                state.resolution_divider,
            )
        };
        scene.update_camera(width, height, resolution);

        if scene.need_update() {
            self.progress.set_status("Updating Scene", "");
            if let Err(e) = scene.device_update(self.device.as_ref(), &self.progress) {
                self.report_error(&e.to_string());
            }
        }
    }

    pub fn render(self: &Arc<Self>) {
        let callbacks: Arc<dyn TileCallbacks> = self.clone();
        let task = RenderTask {
            callbacks,
            need_finish_queue: self.params.progressive_refine,
            requested_tile_size: self.params.tile_size,
        };
        if self.params.only_denoise {
            self.device.task_add(DeviceTask::Denoise(task));
        } else {
            self.device.task_add(DeviceTask::Render(task));
        }
    }

    fn refine_tile(buffers: &SharedRenderBuffers, sample: i32) -> RenderTile {
        let params = buffers.read().unwrap().params.clone();
        let (offset, stride) = params.offset_stride();
        RenderTile {
            x: params.full_x,
            y: params.full_y,
            w: params.width,
            h: params.height,
            sample,
            offset,
            stride,
            buffers: Some(buffers.clone()),
            ..Default::default()
        }
    }

    /// Reports the kept tile buffers after a pass. Returns true when the
    /// final write happened.
    pub fn update_progressive_refine(&self, cancel: bool) -> bool {
        let (sample, num_samples, tile_buffers) = {
            let tile = self.tile.lock().unwrap();
            (
                tile.manager.state.sample + 1,
                tile.manager.num_samples,
                tile.tile_buffers.clone(),
            )
        };
        let write = sample == num_samples || cancel;

        let current_time = time_dt();
        {
            let timing = self.timing.lock().unwrap();
            if current_time - timing.last_update_time < self.params.progressive_update_timeout {
                // the first and the last sample are always reported
                if !write && sample != 1 {
                    return false;
                }
            }
        }

        if self.params.progressive_refine {
            let write_cb = self.write_callback();
            let update_cb = self.update_callback();
            for buffers in tile_buffers.iter().flatten() {
                let rtile = Self::refine_tile(buffers, sample);
                if write {
                    if let Some(cb) = write_cb.as_ref() {
                        cb(&rtile);
                    }
                } else if let Some(cb) = update_cb.as_ref() {
                    cb(&rtile, true);
                }
            }
        }

        self.timing.lock().unwrap().last_update_time = current_time;
        return write;
    }

    /// Tonemaps the persistent buffer and writes it to `path`.
    pub fn write_output(&self, path: &Path) -> SessionResult<()> {
        let Some(buffers) = self.buffers.as_ref() else {
            return Ok(());
        };

        let mut display = DisplayBuffer::new(false);
        display.reset(&buffers.read().unwrap().params);
        let sample = self.tile.lock().unwrap().manager.last_sample();
        {
            let _pass = self.buffers_lock.lock().unwrap();
            self.tonemap(&mut display, sample);
        }

        self.progress
            .set_status("Writing Image", &path.display().to_string());
        display.write(path)?;
        info!("Wrote {}", path.display());
        return Ok(());
    }
}
