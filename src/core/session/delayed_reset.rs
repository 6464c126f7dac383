use crate::core::buffers::*;

/// Reset requested by the host, applied by the session thread at the next
/// safe point.
#[derive(Debug, Default, Clone)]
pub struct DelayedReset {
    pub params: BufferParams,
    pub samples: i32,
    pub do_reset: bool,
}

impl DelayedReset {
    pub fn request(&mut self, params: &BufferParams, samples: i32) {
        self.params = params.clone();
        self.samples = samples;
        self.do_reset = true;
    }

    /// Takes the pending request, if any.
    pub fn take(&mut self) -> Option<(BufferParams, i32)> {
        if !self.do_reset {
            return None;
        }
        self.do_reset = false;
        return Some((self.params.clone(), self.samples));
    }
}
