use crate::core::misc::*;

use log::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;

pub type ProgressUpdateCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default, Clone)]
struct ProgressState {
    cancel_message: String,
    error: bool,
    error_message: String,
    error_count: usize,
    status: String,
    substatus: String,
    tile: i32,
    tile_time: f64,
    start_time: f64,
    render_start_time: f64,
}

/// Status, cancellation and error state shared between the session, the
/// devices and the host.
pub struct Progress {
    cancel: AtomicBool,
    sample: AtomicU64,
    state: Mutex<ProgressState>,
    update_cb: RwLock<Option<ProgressUpdateCallback>>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    pub fn new() -> Self {
        let now = time_dt();
        Progress {
            cancel: AtomicBool::new(false),
            sample: AtomicU64::new(0),
            state: Mutex::new(ProgressState {
                start_time: now,
                render_start_time: now,
                ..Default::default()
            }),
            update_cb: RwLock::new(None),
        }
    }

    pub fn set_cancel(&self, message: &str) {
        {
            let mut state = self.state.lock().unwrap();
            state.cancel_message = message.to_string();
        }
        self.cancel.store(true, Ordering::SeqCst);
        debug!("Progress::set_cancel: {}", message);
    }

    pub fn get_cancel(&self) -> bool {
        return self.cancel.load(Ordering::SeqCst);
    }

    pub fn get_cancel_message(&self) -> String {
        return self.state.lock().unwrap().cancel_message.clone();
    }

    /// Flags an error and cancels. The first message is kept; every call is
    /// counted.
    pub fn set_error(&self, message: &str) {
        {
            let mut state = self.state.lock().unwrap();
            state.error_count += 1;
            if !state.error {
                state.error = true;
                state.error_message = message.to_string();
                state.cancel_message = message.to_string();
            }
        }
        self.cancel.store(true, Ordering::SeqCst);
        error!("{}", message);
        self.set_update();
    }

    pub fn get_error(&self) -> bool {
        return self.state.lock().unwrap().error;
    }

    pub fn get_error_message(&self) -> String {
        return self.state.lock().unwrap().error_message.clone();
    }

    pub fn error_count(&self) -> usize {
        return self.state.lock().unwrap().error_count;
    }

    pub fn set_status(&self, status: &str, substatus: &str) {
        {
            let mut state = self.state.lock().unwrap();
            state.status = status.to_string();
            state.substatus = substatus.to_string();
        }
        self.set_update();
    }

    pub fn get_status(&self) -> (String, String) {
        let state = self.state.lock().unwrap();
        return (state.status.clone(), state.substatus.clone());
    }

    pub fn reset_sample(&self) {
        self.sample.store(0, Ordering::SeqCst);
    }

    pub fn increment_sample(&self) {
        self.sample.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get_sample(&self) -> u64 {
        return self.sample.load(Ordering::SeqCst);
    }

    pub fn set_start_time(&self, start_time: f64) {
        self.state.lock().unwrap().start_time = start_time;
    }

    pub fn set_render_start_time(&self, render_start_time: f64) {
        self.state.lock().unwrap().render_start_time = render_start_time;
    }

    /// Total and render time in seconds.
    pub fn get_time(&self) -> (f64, f64) {
        let state = self.state.lock().unwrap();
        let now = time_dt();
        return (now - state.start_time, now - state.render_start_time);
    }

    pub fn set_tile(&self, tile: i32, tile_time: f64) {
        {
            let mut state = self.state.lock().unwrap();
            state.tile = tile;
            state.tile_time = tile_time;
        }
        self.set_update();
    }

    pub fn get_tile(&self) -> (i32, f64) {
        let state = self.state.lock().unwrap();
        return (state.tile, state.tile_time);
    }

    pub fn set_update_callback(&self, cb: ProgressUpdateCallback) {
        *self.update_cb.write().unwrap() = Some(cb);
    }

    /// Notifies the host; the callback runs on the calling thread.
    pub fn set_update(&self) {
        let cb = self.update_cb.read().unwrap().clone();
        if let Some(cb) = cb {
            cb();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_001() {
        let progress = Progress::new();
        assert!(!progress.get_cancel());
        progress.set_error("first");
        progress.set_error("second");
        assert!(progress.get_cancel());
        assert!(progress.get_error());
        assert_eq!(progress.get_error_message(), "first");
        assert_eq!(progress.error_count(), 2);
    }

    #[test]
    fn test_002() {
        let progress = Progress::new();
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = count.clone();
            progress.set_update_callback(Arc::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }
        progress.set_status("Rendering", "Tile 1/4");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(
            progress.get_status(),
            ("Rendering".to_string(), "Tile 1/4".to_string())
        );
        progress.increment_sample();
        progress.increment_sample();
        assert_eq!(progress.get_sample(), 2);
        progress.reset_sample();
        assert_eq!(progress.get_sample(), 0);
    }
}
