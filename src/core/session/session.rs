use super::session_core::*;
use super::session_params::*;
use super::session_state::*;
use crate::core::buffers::*;
use crate::core::device::*;
use crate::core::display::*;
use crate::core::error::*;
use crate::core::progress::*;
use crate::core::scene::*;

use log::*;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

/// Progressive tile renderer driving one device from a worker thread.
///
/// Every method is meant to be called from the host thread; `draw` must be
/// called from the thread owning the display when the device is a GPU.
pub struct Session {
    core: Arc<SessionCore>,
    session_thread: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(params: SessionParams, device: Arc<dyn Device>) -> Self {
        info!(
            "Session created: device {}, {} samples, background {}",
            device.info().description,
            params.samples,
            params.background
        );
        Session {
            core: Arc::new(SessionCore::new(params, device)),
            session_thread: None,
        }
    }

    pub fn params(&self) -> &SessionParams {
        return &self.core.params;
    }

    fn spawn<F>(&mut self, body: F) -> SessionResult<()>
    where
        F: FnOnce(Arc<SessionCore>) + Send + 'static,
    {
        if self.session_thread.is_some() {
            return Err(SessionError::config("session already started"));
        }
        let core = self.core.clone();
        let handle = thread::Builder::new()
            .name(String::from("session"))
            .spawn(move || body(core))?;
        self.session_thread = Some(handle);
        return Ok(());
    }

    /// Starts rendering on the worker thread.
    pub fn start(&mut self) -> SessionResult<()> {
        return self.spawn(|core| core.run());
    }

    /// Starts denoising the persistent buffer on the worker thread.
    pub fn start_denoise(&mut self) -> SessionResult<()> {
        return self.spawn(|core| core.run_denoise());
    }

    pub fn reset(&self, buffer_params: &BufferParams, samples: i32) {
        self.core.reset(buffer_params, samples);
    }

    pub fn set_pause(&self, pause: bool) {
        if self.core.pause.set_pause(pause) {
            debug!("Session::set_pause: {}", pause);
        }
    }

    pub fn set_samples(&self, samples: i32) {
        self.core.set_samples(samples);
    }

    /// Draws the latest result of the requested size; false if there is
    /// none yet.
    pub fn draw(&self, buffer_params: &BufferParams, display: &mut dyn Display) -> bool {
        return self.core.draw(buffer_params, display);
    }

    pub fn ready_to_reset(&self) -> bool {
        return self.core.ready_to_reset();
    }

    /// Joins the worker thread.
    pub fn wait(&mut self) {
        if let Some(handle) = self.session_thread.take() {
            if handle.join().is_err() {
                error!("Session thread panicked");
            }
        }
    }

    pub fn cancel(&self, message: &str) {
        self.core.progress.set_cancel(message);
        self.core.device.task_cancel();
        self.core.release_waits();
    }

    pub fn state(&self) -> SessionState {
        return self.core.state();
    }

    pub fn progress(&self) -> Arc<Progress> {
        return self.core.progress.clone();
    }

    /// Persistent frame buffer, absent for headless tiled renders.
    pub fn buffers(&self) -> Option<SharedRenderBuffers> {
        return self.core.buffers.clone();
    }

    pub fn set_scene(&self, scene: Arc<dyn Scene>) {
        *self.core.scene.write().unwrap() = Some(scene);
    }

    pub fn set_write_render_tile_cb(&self, cb: WriteRenderTileCallback) {
        *self.core.write_render_tile_cb.write().unwrap() = Some(cb);
    }

    pub fn set_update_render_tile_cb(&self, cb: UpdateRenderTileCallback) {
        *self.core.update_render_tile_cb.write().unwrap() = Some(cb);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.session_thread.is_some() {
            self.core.progress.set_cancel("Exiting");
            self.core.release_waits();
            self.wait();
        }

        if let Some(path) = self.core.params.output_path.clone() {
            if let Err(e) = self.core.write_output(&path) {
                error!("Failed to write {}: {}", path.display(), e);
            }
        }
    }
}
