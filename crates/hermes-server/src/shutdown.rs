//! Shutdown coordination.
//!
//! Both types sit on a `tokio::sync::watch` channel: [`ShutdownSignal`]
//! publishes a fired flag, [`ConnectionTracker`] publishes the number of
//! open connections.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable, one-way shutdown flag.
///
/// ```
/// use hermes_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
/// shutdown.trigger();
/// assert!(observer.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    fired: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Creates a signal that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (fired, _) = watch::channel(false);
        Self {
            fired: Arc::new(fired),
        }
    }

    /// Creates a signal that fires on SIGTERM or SIGINT (Ctrl+C off unix).
    ///
    /// Spawns a task, so it needs a running Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let shutdown = Self::new();
        let on_signal = shutdown.clone();
        tokio::spawn(async move {
            os_signal().await;
            on_signal.trigger();
        });
        shutdown
    }

    /// Fires the signal. Later calls do nothing.
    pub fn trigger(&self) {
        let first = self.fired.send_if_modified(|fired| !std::mem::replace(fired, true));
        if first {
            tracing::debug!("shutdown triggered");
        }
    }

    /// Returns true once the signal has fired.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.fired.borrow()
    }

    /// Resolves when the signal fires, at once if it already has.
    pub fn recv(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut fired = self.fired.subscribe();
        async move {
            // Err means every signal was dropped, which can never fire.
            if fired.wait_for(|fired| *fired).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let terminate = signal(SignalKind::terminate());
        let interrupt = signal(SignalKind::interrupt());
        if let (Ok(mut terminate), Ok(mut interrupt)) = (terminate, interrupt) {
            let name = tokio::select! {
                _ = terminate.recv() => "SIGTERM",
                _ = interrupt.recv() => "SIGINT",
            };
            tracing::info!(signal = name, "shutdown requested");
            return;
        }
        tracing::error!("unix signal handlers unavailable, falling back to ctrl-c");
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!(signal = "ctrl-c", "shutdown requested"),
        Err(error) => {
            tracing::error!(%error, "no os signal available, shutdown only via trigger");
            std::future::pending::<()>().await;
        }
    }
}

/// Counts open connections so the server can wait for them on shutdown.
///
/// ```
/// use hermes_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let connection = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
/// drop(connection);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    open: Arc<watch::Sender<usize>>,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTracker {
    /// Creates a tracker with nothing open.
    #[must_use]
    pub fn new() -> Self {
        let (open, _) = watch::channel(0);
        Self {
            open: Arc::new(open),
        }
    }

    /// Counts one connection until the returned guard is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionGuard {
        self.open.send_modify(|open| *open += 1);
        ConnectionGuard {
            open: Arc::clone(&self.open),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        *self.open.borrow()
    }

    /// Resolves once no connection is open.
    pub async fn drained(&self) {
        let mut open = self.open.subscribe();
        // The tracker holds the sender, so the channel cannot close here.
        let _ = open.wait_for(|open| *open == 0).await;
    }
}

/// One open connection, released on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    open: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.open.send_modify(|open| *open = open.saturating_sub(1));
    }
}
