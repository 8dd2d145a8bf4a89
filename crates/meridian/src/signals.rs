//! Signal handling for graceful server shutdown.
//!
//! The first signal starts a graceful shutdown; a second one while that is
//! in progress terminates the process (see [`crate::app::Application::run`]).

use meridian_event_system::ShutdownState;
use tokio::signal;
use tracing::info;

/// Resolves when the process receives SIGINT or SIGTERM (Ctrl+C on Windows).
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    Ok(())
}

/// Waits for a termination signal, then initiates shutdown on `state`.
pub async fn shutdown_on_signal(state: &ShutdownState) -> std::io::Result<()> {
    wait_for_signal().await?;
    info!("📡 Received shutdown signal - initiating graceful shutdown");
    state.initiate_shutdown();
    Ok(())
}
