use log::{info, warn};
use rppal::gpio::{Gpio, InputPin, Level};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::config::SensorConfig;
use crate::pacing::Pacer;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    /// Only raised by [`ScriptedPin`] once its samples run out.
    #[error("sensor sample script exhausted")]
    ScriptExhausted,
}

/// Source of sensor samples.
pub trait PinReader {
    fn read(&mut self) -> Result<Level, SensorError>;
}

/// PIR sensor wired to a GPIO input. The pin is handed back to the kernel
/// (and its mode restored) when this value is dropped.
pub struct GpioPin {
    pin: InputPin,
}

impl GpioPin {
    pub fn open(pin_number: u8) -> Result<Self, SensorError> {
        let pin = Gpio::new()?.get(pin_number)?.into_input();
        Ok(Self { pin })
    }
}

impl PinReader for GpioPin {
    fn read(&mut self) -> Result<Level, SensorError> {
        Ok(self.pin.read())
    }
}

/// Replays a fixed list of samples. Once the list runs out the stop token is
/// cancelled and the last sample keeps being returned, so a monitor driven by
/// it ends as if the operator had interrupted it.
pub struct ScriptedPin {
    samples: VecDeque<Level>,
    last: Option<Level>,
    stop: CancellationToken,
    reads: Rc<Cell<usize>>,
}

impl ScriptedPin {
    pub fn new(samples: Vec<Level>, stop: CancellationToken) -> Self {
        Self {
            samples: samples.into(),
            last: None,
            stop,
            reads: Rc::new(Cell::new(0)),
        }
    }

    /// Shared counter of samples handed out so far.
    pub fn reads(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.reads)
    }

    /// Builds a script from a string of `0`/`1` characters, other characters
    /// are ignored.
    pub fn from_pattern(pattern: &str, stop: CancellationToken) -> Self {
        let samples = pattern
            .chars()
            .filter_map(|c| match c {
                '0' => Some(Level::Low),
                '1' => Some(Level::High),
                _ => None,
            })
            .collect();
        Self::new(samples, stop)
    }
}

impl PinReader for ScriptedPin {
    fn read(&mut self) -> Result<Level, SensorError> {
        self.reads.set(self.reads.get() + 1);
        match self.samples.pop_front() {
            Some(level) => {
                if self.samples.is_empty() {
                    self.stop.cancel();
                }
                self.last = Some(level);
                Ok(level)
            }
            None => {
                self.stop.cancel();
                self.last.ok_or(SensorError::ScriptExhausted)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Two-state debounce: only a change against the previous sample is an edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    previous: Level,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self {
            previous: Level::Low,
        }
    }
}

impl EdgeDetector {
    pub fn previous(&self) -> Level {
        self.previous
    }

    pub fn observe(&mut self, current: Level) -> Option<Edge> {
        let edge = match (self.previous, current) {
            (Level::Low, Level::High) => Some(Edge::Rising),
            (Level::High, Level::Low) => Some(Edge::Falling),
            _ => None,
        };
        self.previous = current;
        edge
    }
}

/// Work done for every recognized motion.
pub trait MotionHandler {
    fn on_motion(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    Interrupted,
    RunOnceComplete,
}

pub struct MotionSensor {
    pub config: SensorConfig,
    pub run_once: bool,
    pin: Box<dyn PinReader>,
    pacer: Box<dyn Pacer>,
    detector: EdgeDetector,
    pub episodes: u64,
}

impl MotionSensor {
    pub fn new(
        config: SensorConfig,
        run_once: bool,
        pin: Box<dyn PinReader>,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        Self {
            config,
            run_once,
            pin,
            pacer,
            detector: EdgeDetector::default(),
            episodes: 0,
        }
    }

    /// Blocks until the sensor first reads idle. A PIR module drives its
    /// output high for a while after power-on.
    fn settle(&mut self, stop: &CancellationToken) -> Result<bool, SensorError> {
        info!("waiting for PIR sensor to settle...");
        loop {
            if stop.is_cancelled() {
                return Ok(false);
            }
            if self.pin.read()? == Level::Low {
                info!("PIR sensor is ready...");
                return Ok(true);
            }
            self.pacer.pause(self.config.refresh_rate());
        }
    }

    pub fn start_detector(
        &mut self,
        handler: &mut dyn MotionHandler,
        stop: &CancellationToken,
    ) -> Result<MonitorExit, SensorError> {
        info!("starting sensor: {:#?}", self.config);

        if !self.settle(stop)? {
            warn!("sensor stopping request came");
            return Ok(MonitorExit::Interrupted);
        }
        self.detector = EdgeDetector::default();

        loop {
            if stop.is_cancelled() {
                warn!("sensor stopping request came");
                return Ok(MonitorExit::Interrupted);
            }

            let current = self.pin.read()?;

            match self.detector.observe(current) {
                Some(Edge::Rising) => {
                    info!("PIR sensor has detected a motion");
                    handler.on_motion();
                    self.episodes += 1;
                    self.pacer.pause(self.config.trigger_pause());
                    if self.run_once {
                        info!("run-once mode, stopping after the first motion");
                        return Ok(MonitorExit::RunOnceComplete);
                    }
                }
                Some(Edge::Falling) => {
                    info!("resetting PIR sensor");
                    self.pacer.pause(self.config.reset_pause());
                }
                None => {
                    self.pacer.pause(self.config.refresh_rate());
                }
            }
        }
    }
}
