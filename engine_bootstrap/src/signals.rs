//! Wires OS termination signals to a [`ShutdownCoordinator`](crate::shutdown::ShutdownCoordinator)
//! so a running pipeline or dispatch sweep gets a chance to finish its
//! current unit of work before the process exits (§10.2).

use tokio::signal::unix::{signal, SignalKind};

use crate::shutdown::ShutdownCoordinator;

/// Spawns a background task that waits for SIGTERM, SIGINT, or SIGHUP and
/// calls [`ShutdownCoordinator::initiate_shutdown`] on the first one
/// received. Returns immediately; the returned `JoinHandle` is rarely
/// awaited directly since the process exits once shutdown completes.
pub fn install_signal_handlers(coordinator: ShutdownCoordinator) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut term = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!("failed to install SIGTERM handler: {error}");
                return;
            }
        };
        let mut int = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!("failed to install SIGINT handler: {error}");
                return;
            }
        };
        let mut hup = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!("failed to install SIGHUP handler: {error}");
                return;
            }
        };

        let name = tokio::select! {
            _ = term.recv() => "SIGTERM",
            _ = int.recv() => "SIGINT",
            _ = hup.recv() => "SIGHUP",
        };
        tracing::info!("received {name}, initiating shutdown");
        coordinator.initiate_shutdown();
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn handler_task_starts_without_panicking() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));
        let handle = install_signal_handlers(coordinator.clone());
        assert!(!handle.is_finished());
        handle.abort();
    }
}
