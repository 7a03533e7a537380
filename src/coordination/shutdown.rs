//! Cooperative Shutdown Handling
//!
//! OS signals are routed into a single shared [`ShutdownController`] that the
//! supervisor polls at its cycle boundaries. Nothing is ever hard-killed:
//! the in-flight cycle finishes through its persistence step before the loop
//! exits. A second signal while a stop is already pending forces immediate
//! process exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shared stop flag passed into the supervisor at construction.
///
/// Keeping signal delivery out of the loop makes the loop fully testable
/// without real OS signals.
pub struct ShutdownController {
    stop_requested: AtomicBool,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            stop_requested: AtomicBool::new(false),
            stop_tx,
            stop_rx,
        }
    }

    /// Request a cooperative stop. Returns false if one was already pending.
    pub fn request_stop(&self) -> bool {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("Shutdown requested");
        let _ = self.stop_tx.send(true);
        true
    }

    /// Check the stop flag without blocking.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Receiver for select!-style integration with sleeps.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.stop_rx.clone()
    }

    /// Resolve once a stop has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.stop_rx.clone();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

/// Install OS signal handlers feeding the shared controller.
///
/// First signal: cooperative stop. Any further signal: forced exit with the
/// conventional 128+signo code.
pub fn install_signal_handlers(shutdown: Arc<ShutdownController>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let shutdown_sigint = shutdown.clone();
        tokio::spawn(async move {
            let mut stream =
                signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");
            loop {
                stream.recv().await;
                info!("Received SIGINT");
                if !shutdown_sigint.request_stop() {
                    warn!("Second signal while stopping, forcing immediate exit");
                    std::process::exit(130);
                }
            }
        });

        let shutdown_sigterm = shutdown;
        tokio::spawn(async move {
            let mut stream =
                signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
            loop {
                stream.recv().await;
                info!("Received SIGTERM");
                if !shutdown_sigterm.request_stop() {
                    warn!("Second signal while stopping, forcing immediate exit");
                    std::process::exit(143);
                }
            }
        });
    }

    #[cfg(windows)]
    {
        tokio::spawn(async move {
            loop {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install Ctrl+C handler");
                info!("Received Ctrl+C");
                if !shutdown.request_stop() {
                    warn!("Second signal while stopping, forcing immediate exit");
                    std::process::exit(130);
                }
            }
        });
    }
}
