use std::sync::Condvar;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct PauseState {
    paused: bool,
    generation: u64,
}

/// Pause flag plus a wake-up counter.
///
/// Every `notify` bumps the counter, so a waiter that read the counter before
/// deciding to wait never misses a wake-up issued in between.
#[derive(Debug, Default)]
pub struct PauseGate {
    state: Mutex<PauseState>,
    cond: Condvar,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the flag changed; waiters are woken only then.
    pub fn set_pause(&self, pause: bool) -> bool {
        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.paused != pause {
                state.paused = pause;
                state.generation += 1;
                true
            } else {
                false
            }
        };
        if changed {
            self.cond.notify_all();
        }
        return changed;
    }

    pub fn is_paused(&self) -> bool {
        return self.state.lock().unwrap().paused;
    }

    pub fn generation(&self) -> u64 {
        return self.state.lock().unwrap().generation;
    }

    pub fn notify(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.generation += 1;
        }
        self.cond.notify_all();
    }

    /// Clears the pause flag and wakes every waiter.
    pub fn release(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.paused = false;
            state.generation += 1;
        }
        self.cond.notify_all();
    }

    /// Blocks until a wake-up newer than `seen` arrives; returns the pause
    /// flag and the generation observed.
    pub fn wait(&self, seen: u64) -> (bool, u64) {
        let state = self.state.lock().unwrap();
        let state = self
            .cond
            .wait_while(state, |state| state.generation == seen)
            .unwrap();
        return (state.paused, state.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_001() {
        let gate = PauseGate::new();
        assert!(gate.set_pause(true));
        assert!(!gate.set_pause(true));
        assert!(gate.is_paused());
        assert!(gate.set_pause(false));
        assert!(!gate.is_paused());
    }

    #[test]
    fn test_002() {
        // a notify issued before the wait starts is not lost
        let gate = PauseGate::new();
        let seen = gate.generation();
        gate.notify();
        let (paused, generation) = gate.wait(seen);
        assert!(!paused);
        assert!(generation > seen);
    }

    #[test]
    fn test_003() {
        let gate = Arc::new(PauseGate::new());
        gate.set_pause(true);
        let seen = gate.generation();
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || {
                let mut seen = seen;
                loop {
                    let (paused, generation) = gate.wait(seen);
                    seen = generation;
                    if !paused {
                        break;
                    }
                }
            })
        };
        gate.notify();
        gate.set_pause(false);
        waiter.join().unwrap();
    }
}
