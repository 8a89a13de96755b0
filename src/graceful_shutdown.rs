//! # Graceful Shutdown
//!
//! Signal handling for the gateway server. On SIGINT/SIGTERM the server stops
//! accepting connections and the shared [`CancellationToken`] is cancelled, so
//! every in-flight backend stream stops reading and its SSE body ends.
//!
//! ## Shutdown Process:
//!
//! 1. **Signal Reception**: SIGINT, SIGTERM or SIGQUIT
//! 2. **Cancel**: the server-wide token fires; request tokens are its children
//! 3. **Drain**: axum finishes the connections that are still open
//! 4. **Exit**

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Time the server gets to close open connections after a shutdown signal.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct GracefulShutdown {
    token: CancellationToken,
    shutdown_complete: Arc<AtomicBool>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Server-wide token. Hand it to [`crate::server::AppState`].
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Relaxed)
    }

    pub fn initiate_shutdown(&self) {
        if !self.token.is_cancelled() {
            info!("🛑 Graceful shutdown initiated; cancelling in-flight streams");
        }
        self.token.cancel();
    }

    pub fn complete_shutdown(&self) {
        info!("✅ Graceful shutdown completed");
        self.shutdown_complete.store(true, Ordering::Relaxed);
    }

    /// Block until an OS shutdown signal arrives.
    pub async fn wait_for_shutdown_signal(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigquit = signal(SignalKind::quit())?;

            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("📡 Received SIGINT (Ctrl+C)");
                }
                _ = sigterm.recv() => info!("📡 Received SIGTERM"),
                _ = sigquit.recv() => info!("📡 Received SIGQUIT"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            info!("📡 Received Ctrl+C");
        }

        Ok(())
    }

    /// Future for `axum::serve(..).with_graceful_shutdown`. Resolves on an OS
    /// signal or when the token is cancelled programmatically.
    pub async fn signal(self) {
        tokio::select! {
            result = self.wait_for_shutdown_signal() => {
                if let Err(e) = result {
                    error!("❌ Error waiting for shutdown signal: {}", e);
                }
            }
            _ = self.token.cancelled() => {}
        }
        self.initiate_shutdown();
    }

    /// Drive `server` to completion. Once shutdown is initiated the server
    /// gets at most `drain_timeout` to close its remaining connections.
    pub async fn run_until_drained<F>(&self, server: F, drain_timeout: Duration) -> std::io::Result<()>
    where
        F: std::future::Future<Output = std::io::Result<()>>,
    {
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => result?,
            _ = self.token.cancelled() => {
                match tokio::time::timeout(drain_timeout, &mut server).await {
                    Ok(result) => result?,
                    Err(_) => warn!("⏰ Drain timeout of {:?} exceeded, forcing shutdown", drain_timeout),
                }
            }
        }

        self.complete_shutdown();
        Ok(())
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_graceful_shutdown_creation() {
        let shutdown = GracefulShutdown::new();
        assert!(!shutdown.is_shutdown_initiated());
        assert!(!shutdown.is_shutdown_complete());
    }

    #[tokio::test]
    async fn test_initiate_cancels_request_tokens() {
        let shutdown = GracefulShutdown::new();
        let request = shutdown.token().child_token();

        shutdown.initiate_shutdown();
        assert!(shutdown.is_shutdown_initiated());
        assert!(request.is_cancelled());
        assert!(!shutdown.is_shutdown_complete());
    }

    #[tokio::test]
    async fn test_signal_resolves_on_programmatic_cancel() {
        let shutdown = GracefulShutdown::new();
        let waiter = tokio::spawn(shutdown.clone().signal());

        shutdown.token().cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("signal future should resolve")
            .unwrap();
        assert!(shutdown.is_shutdown_initiated());
    }

    #[tokio::test]
    async fn test_run_until_drained_server_exits() {
        let shutdown = GracefulShutdown::new();
        let result = shutdown
            .run_until_drained(async { Ok(()) }, Duration::from_secs(1))
            .await;

        assert!(result.is_ok());
        assert!(shutdown.is_shutdown_complete());
    }

    #[tokio::test]
    async fn test_run_until_drained_forces_after_timeout() {
        let shutdown = GracefulShutdown::new();
        shutdown.initiate_shutdown();

        let never = std::future::pending::<std::io::Result<()>>();
        let result = shutdown
            .run_until_drained(never, Duration::from_millis(50))
            .await;

        assert!(result.is_ok());
        assert!(shutdown.is_shutdown_complete());
    }

    #[tokio::test]
    async fn test_run_until_drained_propagates_server_error() {
        let shutdown = GracefulShutdown::new();
        let failing = async { Err(std::io::Error::new(std::io::ErrorKind::Other, "bind lost")) };

        let result = shutdown
            .run_until_drained(failing, Duration::from_secs(1))
            .await;
        assert!(result.is_err());
        assert!(!shutdown.is_shutdown_complete());
    }
}
