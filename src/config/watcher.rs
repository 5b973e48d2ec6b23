//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_reload_snapshot;
use crate::observability::metrics;
use crate::policy::PolicySnapshot;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<PolicySnapshot>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for compiled policy snapshots.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<PolicySnapshot>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Sender for snapshots produced outside the watcher (e.g. on SIGHUP).
    pub fn sender(&self) -> mpsc::UnboundedSender<PolicySnapshot> {
        self.update_tx.clone()
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned handle must be kept alive for as long as watching should continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        if let Some(snapshot) = reload_snapshot(&path) {
                            let _ = tx.send(snapshot);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load and compile `path` for a reload.
///
/// A rejected file is logged and counted; the caller keeps the active policy.
pub fn reload_snapshot(path: &Path) -> Option<PolicySnapshot> {
    match load_reload_snapshot(path) {
        Ok((_, snapshot)) => Some(snapshot),
        Err(e) => {
            metrics::record_reload("rejected");
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to reload config. Keeping current policy."
            );
            None
        }
    }
}
