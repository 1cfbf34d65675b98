use chrono::{DateTime, Local};
use log::info;

use crate::camera::{BurstReport, CaptureSequencer};
use crate::notify::{Notifier, Outcome};
use crate::sensor::motion::MotionHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeReport {
    pub detected_at: DateTime<Local>,
    pub notifications: Vec<(&'static str, Outcome)>,
    pub burst: BurstReport,
}

/// Everything that happens after one motion: alerts first, then the capture
/// burst. A failing channel never keeps the rest from running.
pub struct AlarmEpisode {
    notifiers: Vec<Box<dyn Notifier>>,
    sequencer: CaptureSequencer,
}

impl AlarmEpisode {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>, sequencer: CaptureSequencer) -> Self {
        Self {
            notifiers,
            sequencer,
        }
    }

    pub fn run(&mut self, detected_at: DateTime<Local>) -> EpisodeReport {
        let notifications = self
            .notifiers
            .iter()
            .map(|notifier| (notifier.name(), notifier.notify(detected_at)))
            .collect();

        let burst = self.sequencer.run();

        EpisodeReport {
            detected_at,
            notifications,
            burst,
        }
    }
}

impl MotionHandler for AlarmEpisode {
    fn on_motion(&mut self) {
        let report = self.run(Local::now());
        info!(
            "motion episode done: {}",
            report
                .notifications
                .iter()
                .map(|(name, outcome)| format!("{name}={outcome:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}
