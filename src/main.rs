use clap::Parser;
use log::{error, info, warn};
use pir_cam_guard::bootstrap::{self, Layout, EXIT_FAILURE};
use pir_cam_guard::config::AppConfig;
use pir_cam_guard::sensor::helpers::supervise;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long an interrupted monitor gets to release the sensor pin.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// PIR motion monitor: mail and webhook alerts plus a camera burst on every motion
#[derive(Parser, Debug)]
#[command(name = "pir-cam-guard", version, about)]
struct Args {
    /// Directory holding the configuration, `images/` and `logs/`
    /// (defaults to the executable's directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Configuration file (defaults to `<base-dir>/monitor_conf.json`)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after the first motion episode
    #[arg(long)]
    run_once: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let layout = match Layout::resolve(args.base_dir, args.config) {
        Ok(layout) => layout,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };
    if let Err(err) = layout
        .create_dirs()
        .and_then(|()| bootstrap::init_logger(&layout.log_file()))
    {
        eprintln!("{err}");
        return ExitCode::from(err.exit_code());
    }

    let mut config = AppConfig::load_or_default(&layout.config_file);
    config.debug.run_once |= args.run_once;
    bootstrap::apply_logging_switch(&config);

    if let Err(err) = bootstrap::ensure_root() {
        error!("{err}");
        return ExitCode::from(err.exit_code());
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("cannot start runtime: {err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let stop = CancellationToken::new();
    let detector_stop = stop.clone();
    let detector = runtime
        .spawn_blocking(move || bootstrap::run_monitor(&config, &layout, &detector_stop));
    let outcome = runtime.block_on(supervise(detector, stop, SHUTDOWN_GRACE));
    // an abandoned episode must not keep the process alive
    runtime.shutdown_timeout(Duration::from_millis(100));

    match outcome {
        Ok(Some(Ok(exit))) => {
            info!("monitor stopped: {exit:?}");
            ExitCode::SUCCESS
        }
        Ok(Some(Err(err))) => {
            error!("{err}");
            ExitCode::from(EXIT_FAILURE)
        }
        Ok(None) => {
            warn!("motion episode still running, abandoning it");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("monitor thread failed: {err}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
