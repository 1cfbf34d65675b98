use pir_cam_guard::pacing::RecordingPacer;
use pir_cam_guard::sensor::config::SensorConfig;
use pir_cam_guard::sensor::motion::{MotionHandler, MotionSensor, ScriptedPin};
use tokio_util::sync::CancellationToken;

///////////////////////////////////////////////////////////////////////////////
// For more information check valid_detections.rs test file
///////////////////////////////////////////////////////////////////////////////
struct TestCase {
    name: &'static str,
    samples: &'static str,
}

#[derive(Default)]
struct CountingHandler {
    detections: u64,
}

impl MotionHandler for CountingHandler {
    fn on_motion(&mut self) {
        self.detections += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn invalid_detections() {
        let test_cases_list: Vec<TestCase> = vec![
            TestCase {
                name: "Sensor idle the whole time",
                samples: "0 0 0 0 0 0 0 0",
            },
            TestCase {
                //
                // Test Case: sensor never settles, monitor is never armed
                //
                name: "Sensor stuck high at power-on",
                samples: "1 1 1 1 1 1 1 1",
            },
            TestCase {
                //
                // Test Case: power-on noise that ends exactly at the last reading
                //
                name: "Settle completes on last reading",
                samples: "1 1 1 0",
            },
        ];

        for test_case in test_cases_list.into_iter() {
            println!("testing {}", test_case.name);

            let token = CancellationToken::new();
            let pacer = RecordingPacer::default();
            let mut sensor = MotionSensor::new(
                SensorConfig::default(),
                false,
                Box::new(ScriptedPin::from_pattern(test_case.samples, token.clone())),
                Box::new(pacer.clone()),
            );
            let mut handler = CountingHandler::default();

            sensor
                .start_detector(&mut handler, &token)
                .expect("scripted sensor never fails");

            assert_eq!(handler.detections, 0, "{}", test_case.name);
            assert!(pacer
                .pauses
                .borrow()
                .iter()
                .all(|d| *d == Duration::from_millis(10)));
        }
        println!("finished tests");
    }
}
