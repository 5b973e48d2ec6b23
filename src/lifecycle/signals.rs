//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM / SIGINT (Ctrl+C) and SIGHUP
//! - Translate signals to lifecycle events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Streams are registered once in [`Signals::new`]; a signal that arrives
//!   while the previous event is being handled is queued, not lost
//! - SIGHUP triggers policy reload, not shutdown
//! - Non-unix targets only see Ctrl+C

use std::io;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// What the process should do in response to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Shutdown,
    Reload,
}

/// Registered signal streams.
#[cfg(unix)]
pub struct Signals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

#[cfg(unix)]
impl Signals {
    /// Install the handlers. Must be called from within a Tokio runtime.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next shutdown or reload signal.
    pub async fn next_event(&mut self) -> LifecycleEvent {
        tokio::select! {
            _ = self.interrupt.recv() => LifecycleEvent::Shutdown,
            _ = self.terminate.recv() => LifecycleEvent::Shutdown,
            _ = self.hangup.recv() => LifecycleEvent::Reload,
        }
    }
}

#[cfg(not(unix))]
pub struct Signals;

#[cfg(not(unix))]
impl Signals {
    pub fn new() -> io::Result<Self> {
        Ok(Self)
    }

    pub async fn next_event(&mut self) -> LifecycleEvent {
        match tokio::signal::ctrl_c().await {
            Ok(()) => LifecycleEvent::Shutdown,
            Err(e) => {
                tracing::error!(error = %e, "Ctrl+C handler failed");
                LifecycleEvent::Shutdown
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::Duration;

    #[tokio::test]
    async fn test_hangup_delivered_before_wait_is_kept() {
        let mut signals = Signals::new().unwrap();

        let status = Command::new("kill")
            .args(["-HUP", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let event = tokio::time::timeout(Duration::from_secs(5), signals.next_event())
            .await
            .unwrap();
        assert_eq!(event, LifecycleEvent::Reload);
    }
}
