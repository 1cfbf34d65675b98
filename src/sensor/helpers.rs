use log::{error, warn};
use std::io;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() -> io::Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

/// Waits for the blocking detector thread to finish on its own, or for an
/// operator interrupt.
///
/// On interrupt the stop token is cancelled and the detector gets `grace` to
/// notice it and release the sensor pin. `Ok(None)` means it was still busy
/// (in the middle of a motion episode) when the grace period ran out and has
/// been left behind.
pub async fn supervise<T>(
    mut detector: JoinHandle<T>,
    stop: CancellationToken,
    grace: Duration,
) -> Result<Option<T>, JoinError>
where
    T: Send + 'static,
{
    tokio::select! {
        finished = &mut detector => return finished.map(Some),
        signalled = shutdown_signal() => {
            if let Err(err) = signalled {
                error!("cannot listen for shutdown signals: {err}");
                return detector.await.map(Some);
            }
        }
    }

    warn!("program interrupted by user");
    stop.cancel();

    match tokio::time::timeout(grace, &mut detector).await {
        Ok(finished) => finished.map(Some),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_detector_result_when_it_finishes_first() {
        let stop = CancellationToken::new();
        let detector = tokio::task::spawn_blocking(|| 42);

        let result = supervise(detector, stop.clone(), Duration::from_millis(10)).await;

        assert_eq!(result.unwrap(), Some(42));
        assert!(!stop.is_cancelled());
    }

    #[tokio::test]
    async fn stop_token_reaches_blocking_detector() {
        let stop = CancellationToken::new();
        let job_stop = stop.clone();
        let detector = tokio::task::spawn_blocking(move || {
            while !job_stop.is_cancelled() {
                std::thread::sleep(Duration::from_millis(1));
            }
            "stopped"
        });

        stop.cancel();
        let result = supervise(detector, stop, Duration::from_millis(10)).await;

        assert_eq!(result.unwrap(), Some("stopped"));
    }
}
