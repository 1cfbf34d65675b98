//! Startup glue: directory layout, logging, privilege check and wiring of the
//! monitor with its collaborators.

use env_logger::{Env, Target, WriteStyle};
use log::{info, LevelFilter};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::camera::{CaptureBurst, CaptureSequencer, V4l2Opener};
use crate::config::{AppConfig, CONFIG_FILE_NAME};
use crate::episode::AlarmEpisode;
use crate::notify::{CloudUploader, MailSender, Notifier, WebhookNotifier};
use crate::pacing::SleepPacer;
use crate::sensor::motion::{GpioPin, MonitorExit, MotionSensor, SensorError};

pub const IMG_DIR_NAME: &str = "images";
pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_NAME: &str = "monitor.log";

pub const EXIT_FAILURE: u8 = 1;
/// `EX_NOPERM` from sysexits.h
pub const EXIT_NOT_PRIVILEGED: u8 = 77;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot determine executable location: {0}")]
    ExecutablePath(io::Error),

    #[error("cannot create {path}: {source}")]
    CreateDir { path: String, source: io::Error },

    #[error("cannot open log file {path}: {source}")]
    LogFile { path: String, source: io::Error },

    #[error("logger already initialized: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("user must be root in order to access the GPIO pins")]
    NotPrivileged,
}

impl StartupError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotPrivileged => EXIT_NOT_PRIVILEGED,
            _ => EXIT_FAILURE,
        }
    }
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Sensor(#[from] SensorError),

    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Files and directories the monitor works with, all relative to one base
/// directory (by default the directory holding the executable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub base_dir: PathBuf,
    pub config_file: PathBuf,
    pub image_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Layout {
    pub fn new(base_dir: PathBuf, config_file: Option<PathBuf>) -> Self {
        Self {
            config_file: config_file.unwrap_or_else(|| base_dir.join(CONFIG_FILE_NAME)),
            image_dir: base_dir.join(IMG_DIR_NAME),
            log_dir: base_dir.join(LOG_DIR_NAME),
            base_dir,
        }
    }

    pub fn resolve(
        base_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> Result<Self, StartupError> {
        let base_dir = match base_dir {
            Some(dir) => dir,
            None => executable_dir()?,
        };
        Ok(Self::new(base_dir, config_file))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    pub fn create_dirs(&self) -> Result<(), StartupError> {
        for dir in [&self.image_dir, &self.log_dir] {
            fs::create_dir_all(dir).map_err(|source| StartupError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

fn executable_dir() -> Result<PathBuf, StartupError> {
    let exe = std::env::current_exe().map_err(StartupError::ExecutablePath)?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        StartupError::ExecutablePath(io::Error::new(
            io::ErrorKind::NotFound,
            "executable has no parent directory",
        ))
    })
}

/// Copies every log line to the log file and to the console. The file is
/// written first; a console that went away (closed stderr under a service
/// manager) is ignored.
struct Tee<C, F> {
    console: C,
    file: F,
}

impl<C: Write, F: Write> Write for Tee<C, F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        let _ = self.console.write_all(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logger(log_file: &Path) -> Result<(), StartupError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|source| StartupError::LogFile {
            path: log_file.display().to_string(),
            source,
        })?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(Tee {
            console: io::stderr(),
            file,
        })))
        .write_style(WriteStyle::Never)
        .try_init()?;
    Ok(())
}

/// Applies `debug.enable_logging` once the configuration is known.
pub fn apply_logging_switch(config: &AppConfig) {
    if !config.debug.enable_logging {
        info!("logging disabled by configuration");
        log::set_max_level(LevelFilter::Off);
    }
}

pub fn ensure_root() -> Result<(), StartupError> {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let euid = unsafe { libc::geteuid() };
    if euid == 0 {
        Ok(())
    } else {
        Err(StartupError::NotPrivileged)
    }
}

/// Builds the monitor and its episode from the configuration and runs it on
/// the calling thread until it is stopped.
pub fn run_monitor(
    config: &AppConfig,
    layout: &Layout,
    stop: &CancellationToken,
) -> Result<MonitorExit, MonitorError> {
    info!("setting up GPIO...");
    let pin = GpioPin::open(config.sensor.pin_number)?;

    let http = reqwest::blocking::Client::builder().build()?;

    let notifiers: Vec<Box<dyn Notifier>> = vec![
        Box::new(MailSender::new(config.mail.clone())),
        Box::new(WebhookNotifier::new(config.webhook.clone(), http.clone())),
    ];
    let burst = CaptureBurst::new(&config.camera, &config.image, &layout.image_dir);
    let sequencer = CaptureSequencer::new(
        config.camera.clone(),
        burst,
        Box::new(V4l2Opener),
        Box::new(CloudUploader::new(config.cloud_storage.clone(), http)),
        Box::new(SleepPacer::new(stop.clone())),
    );
    let mut episode = AlarmEpisode::new(notifiers, sequencer);

    let mut sensor = MotionSensor::new(
        config.sensor.clone(),
        config.debug.run_once,
        Box::new(pin),
        Box::new(SleepPacer::new(stop.clone())),
    );

    Ok(sensor.start_detector(&mut episode, stop)?)
}
