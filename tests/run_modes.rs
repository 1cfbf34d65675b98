use pir_cam_guard::pacing::RecordingPacer;
use pir_cam_guard::sensor::config::SensorConfig;
use pir_cam_guard::sensor::motion::{
    MonitorExit, MotionHandler, MotionSensor, ScriptedPin, SensorError,
};
use rppal::gpio::Level;
use std::cell::Cell;
use std::rc::Rc;
use tokio_util::sync::CancellationToken;

/// Remembers how many samples had been read when each motion fired.
struct ReadTrackingHandler {
    reads: Rc<Cell<usize>>,
    reads_at_motion: Vec<usize>,
}

impl MotionHandler for ReadTrackingHandler {
    fn on_motion(&mut self) {
        self.reads_at_motion.push(self.reads.get());
    }
}

fn sensor(pin: ScriptedPin, run_once: bool) -> MotionSensor {
    MotionSensor::new(
        SensorConfig::default(),
        run_once,
        Box::new(pin),
        Box::new(RecordingPacer::default()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_once_stops_after_first_episode() {
        let token = CancellationToken::new();
        let pin = ScriptedPin::from_pattern("0 0 1 1 0 1 0 1", token.clone());
        let reads = pin.reads();
        let mut handler = ReadTrackingHandler {
            reads: reads.clone(),
            reads_at_motion: Vec::new(),
        };

        let exit = sensor(pin, true)
            .start_detector(&mut handler, &token)
            .unwrap();

        assert_eq!(exit, MonitorExit::RunOnceComplete);
        assert_eq!(handler.reads_at_motion, vec![3]);
        // no reading after the episode
        assert_eq!(reads.get(), 3);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn without_run_once_every_pulse_fires() {
        let token = CancellationToken::new();
        let pin = ScriptedPin::from_pattern("0 0 1 1 0 1 0 1", token.clone());
        let reads = pin.reads();
        let mut handler = ReadTrackingHandler {
            reads,
            reads_at_motion: Vec::new(),
        };

        let exit = sensor(pin, false)
            .start_detector(&mut handler, &token)
            .unwrap();

        assert_eq!(exit, MonitorExit::Interrupted);
        assert_eq!(handler.reads_at_motion, vec![3, 6, 8]);
    }

    #[test]
    fn stop_request_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let pin = ScriptedPin::from_pattern("0 1 0 1", token.clone());
        let reads = pin.reads();
        let mut handler = ReadTrackingHandler {
            reads: reads.clone(),
            reads_at_motion: Vec::new(),
        };

        let exit = sensor(pin, false)
            .start_detector(&mut handler, &token)
            .unwrap();

        assert_eq!(exit, MonitorExit::Interrupted);
        assert!(handler.reads_at_motion.is_empty());
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn read_error_ends_the_loop() {
        let token = CancellationToken::new();
        let pin = ScriptedPin::new(Vec::<Level>::new(), token.clone());
        let mut handler = ReadTrackingHandler {
            reads: pin.reads(),
            reads_at_motion: Vec::new(),
        };

        let result = sensor(pin, false).start_detector(&mut handler, &token);

        assert!(matches!(result, Err(SensorError::ScriptExhausted)));
        assert!(handler.reads_at_motion.is_empty());
    }
}
