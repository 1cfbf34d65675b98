use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SensorConfig {
    #[serde(rename = "channel")]
    pub pin_number: u8, // BCM numbering
    pub refresh_rate_milisecs: u64,  // idle poll interval
    pub trigger_pause_milisecs: u64, // pause after a motion episode
    pub reset_pause_milisecs: u64,   // pause after the sensor falls back to idle
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            pin_number: 18,
            refresh_rate_milisecs: 10,
            trigger_pause_milisecs: 100,
            reset_pause_milisecs: 10,
        }
    }
}

impl SensorConfig {
    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_milisecs)
    }

    pub fn trigger_pause(&self) -> Duration {
        Duration::from_millis(self.trigger_pause_milisecs)
    }

    pub fn reset_pause(&self) -> Duration {
        Duration::from_millis(self.reset_pause_milisecs)
    }
}
