//! Mock camera, uploader and pacer for testing without hardware.
//!
//! All three write into one shared journal so tests can check the exact
//! interleaving of captures, uploads and pauses.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use super::traits::{Camera, CameraError, CameraOpener, Result};
use crate::config::CameraConfig;
use crate::notify::{Outcome, Uploader};
use crate::pacing::Pacer;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened,
    Captured(PathBuf),
    Uploaded(PathBuf),
    Paused(Duration),
    Released,
}

pub type Journal = Rc<RefCell<Vec<Event>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// Counts how many events match `pred`.
pub fn count(journal: &Journal, pred: impl Fn(&Event) -> bool) -> usize {
    journal.borrow().iter().filter(|e| pred(*e)).count()
}

/// Mock opener; can be told to fail opening or to fail on the n-th shot.
pub struct MockOpener {
    journal: Journal,
    fail_open: bool,
    fail_on_shot: Option<usize>,
}

impl MockOpener {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_open: false,
            fail_on_shot: None,
        }
    }

    #[must_use]
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    #[must_use]
    pub fn failing_on_shot(mut self, shot: usize) -> Self {
        self.fail_on_shot = Some(shot);
        self
    }
}

impl CameraOpener for MockOpener {
    fn open(&self, _settings: &CameraConfig) -> Result<Box<dyn Camera>> {
        if self.fail_open {
            return Err(CameraError::DeviceOpenFailed {
                index: 0,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        self.journal.borrow_mut().push(Event::Opened);
        Ok(Box::new(MockCamera {
            journal: Rc::clone(&self.journal),
            shots: 0,
            fail_on_shot: self.fail_on_shot,
        }))
    }
}

struct MockCamera {
    journal: Journal,
    shots: usize,
    fail_on_shot: Option<usize>,
}

impl Camera for MockCamera {
    fn capture_to(&mut self, path: &Path) -> Result<()> {
        self.shots += 1;
        if self.fail_on_shot == Some(self.shots) {
            return Err(CameraError::EmptyFrame);
        }
        self.journal
            .borrow_mut()
            .push(Event::Captured(path.to_path_buf()));
        Ok(())
    }
}

impl Drop for MockCamera {
    fn drop(&mut self) {
        self.journal.borrow_mut().push(Event::Released);
    }
}

pub struct MockUploader {
    journal: Journal,
    enabled: bool,
    cancel_on_upload: Option<CancellationToken>,
}

impl MockUploader {
    pub fn new(journal: Journal, enabled: bool) -> Self {
        Self {
            journal,
            enabled,
            cancel_on_upload: None,
        }
    }

    /// Cancels `token` while the first upload is in flight, as a signal
    /// arriving during a slow transfer would.
    #[must_use]
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_upload = Some(token);
        self
    }
}

impl Uploader for MockUploader {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn upload(&self, image: &Path) -> Outcome {
        self.journal
            .borrow_mut()
            .push(Event::Uploaded(image.to_path_buf()));
        if let Some(token) = &self.cancel_on_upload {
            token.cancel();
        }
        Outcome::Sent("ok".to_string())
    }
}

pub struct MockPacer {
    journal: Journal,
    cancel_after: Option<usize>,
    pauses: usize,
}

impl MockPacer {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            cancel_after: None,
            pauses: 0,
        }
    }

    /// Behave as if the operator interrupted during the n-th pause.
    #[must_use]
    pub fn cancelled_at(mut self, pause: usize) -> Self {
        self.cancel_after = Some(pause);
        self
    }
}

impl Pacer for MockPacer {
    fn pause(&mut self, duration: Duration) -> bool {
        self.pauses += 1;
        self.journal.borrow_mut().push(Event::Paused(duration));
        self.cancel_after != Some(self.pauses)
    }

    fn stopped(&self) -> bool {
        self.cancel_after.is_some_and(|n| self.pauses >= n)
    }
}
