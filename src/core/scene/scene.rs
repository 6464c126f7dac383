use crate::core::device::*;
use crate::core::error::*;
use crate::core::progress::*;

use std::sync::Mutex;

/// Host scene synchronized to the device before each pass.
pub trait Scene: Send + Sync {
    /// Called with the pass resolution; `resolution` is the preview divider.
    fn update_camera(&self, width: i32, height: i32, resolution: i32);
    fn need_update(&self) -> bool;
    fn device_update(&self, device: &dyn Device, progress: &Progress) -> SessionResult<()>;
    fn requested_features(&self, _features: &mut DeviceRequestedFeatures) {}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CameraState {
    pub width: i32,
    pub height: i32,
    pub resolution: i32,
}

/// Scene with nothing but a camera; needs a device update whenever the
/// camera resolution changes.
#[derive(Debug, Default)]
pub struct StaticScene {
    camera: Mutex<CameraState>,
    dirty: Mutex<bool>,
    updates: Mutex<usize>,
}

impl StaticScene {
    pub fn new() -> Self {
        StaticScene {
            camera: Mutex::new(CameraState::default()),
            dirty: Mutex::new(true),
            updates: Mutex::new(0),
        }
    }

    pub fn camera(&self) -> CameraState {
        return *self.camera.lock().unwrap();
    }

    pub fn num_device_updates(&self) -> usize {
        return *self.updates.lock().unwrap();
    }
}

impl Scene for StaticScene {
    fn update_camera(&self, width: i32, height: i32, resolution: i32) {
        let mut camera = self.camera.lock().unwrap();
        if camera.width != width || camera.height != height || camera.resolution != resolution {
            *camera = CameraState {
                width,
                height,
                resolution,
            };
            *self.dirty.lock().unwrap() = true;
        }
    }

    fn need_update(&self) -> bool {
        return *self.dirty.lock().unwrap();
    }

    fn device_update(&self, _device: &dyn Device, _progress: &Progress) -> SessionResult<()> {
        *self.dirty.lock().unwrap() = false;
        *self.updates.lock().unwrap() += 1;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let scene = StaticScene::new();
        assert!(scene.need_update());
        scene.update_camera(64, 32, 1);
        assert_eq!(scene.camera().width, 64);
        *scene.dirty.lock().unwrap() = false;
        scene.update_camera(64, 32, 1);
        assert!(!scene.need_update());
        scene.update_camera(32, 16, 2);
        assert!(scene.need_update());
    }
}
