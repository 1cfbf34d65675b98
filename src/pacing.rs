use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Blocking pause used by the monitor loop and the capture sequencer.
pub trait Pacer {
    /// Waits for `duration`. Returns `false` when the wait was cut short by a
    /// stop request.
    fn pause(&mut self, duration: Duration) -> bool;

    /// Whether a stop was requested, for loops that do not pause between
    /// steps.
    fn stopped(&self) -> bool;
}

/// Sleeps in short slices so a cancelled token is noticed during long waits
/// (e.g. the 60 second gap between two captures).
pub struct SleepPacer {
    stop: CancellationToken,
    slice: Duration,
}

impl SleepPacer {
    pub fn new(stop: CancellationToken) -> Self {
        Self {
            stop,
            slice: Duration::from_millis(50),
        }
    }
}

impl Pacer for SleepPacer {
    fn pause(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.stop.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(self.slice.min(deadline - now));
        }
    }

    fn stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// Pacer that never sleeps and remembers every requested pause.
#[derive(Debug, Default, Clone)]
pub struct RecordingPacer {
    pub pauses: Rc<RefCell<Vec<Duration>>>,
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, duration: Duration) -> bool {
        self.pauses.borrow_mut().push(duration);
        true
    }

    fn stopped(&self) -> bool {
        false
    }
}
