//! Security header policy service.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────────┐
//!                       │                  header-policy                     │
//!                       │                                                    │
//!   Client Request      │  ┌──────────┐   ┌──────────────┐   ┌───────────┐  │
//!   ────────────────────┼─▶│ request  │──▶│ policy       │──▶│  handler  │  │
//!                       │  │ id/trace │   │ middleware   │   │  (echo)   │  │
//!                       │  └──────────┘   └──────┬───────┘   └─────┬─────┘  │
//!                       │                        │ route + merge   │        │
//!   Client Response     │                        ▼                 │        │
//!   ◀───────────────────┼──────────────── applier ◀────────────────┘        │
//!                       │                        ▲                           │
//!                       │                ┌───────┴────────┐                  │
//!                       │                │ PolicySnapshot │◀── reload ───────┼── config file
//!                       │                │  (ArcSwap)     │    (watch/SIGHUP)│
//!                       │                └────────────────┘                  │
//!                       │                                                    │
//!                       │  admin API (status, policy, routes, effective)     │
//!                       │  metrics endpoint (Prometheus)                     │
//!                       └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use header_policy::admin::{setup_admin_router, AdminState};
use header_policy::config::{watcher::reload_snapshot, ConfigWatcher};
use header_policy::lifecycle::{startup, LifecycleEvent, Shutdown, Signals};
use header_policy::observability::{logging, metrics};
use header_policy::HttpServer;

#[derive(Parser)]
#[command(name = "header-policy")]
#[command(about = "Serve with a validated, hot-reloadable security header policy", long_about = None)]
struct Args {
    /// Path to the TOML configuration file (built-in defaults when omitted).
    #[arg(short, long, env = "HEADER_POLICY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration and compile the policy before anything is served
    let (config, snapshot) = startup::bootstrap(args.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!("header-policy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        directives = snapshot.store().len(),
        routes = snapshot.routes().len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config.clone(), snapshot);

    // Reload sources: file watcher and SIGHUP share one channel
    let (watcher, policy_updates) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher), rx)
        }
        None => {
            let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
            (None, rx)
        }
    };
    let reload_tx = watcher.as_ref().map(ConfigWatcher::sender);
    let _watch_handle = match watcher {
        Some(watcher) => Some(watcher.run()?),
        None => None,
    };

    {
        let shutdown = shutdown.clone();
        let path = args.config.clone();
        let mut signals = Signals::new()?;
        tokio::spawn(async move {
            loop {
                match signals.next_event().await {
                    LifecycleEvent::Shutdown => {
                        shutdown.trigger();
                        break;
                    }
                    LifecycleEvent::Reload => match (&path, &reload_tx) {
                        (Some(path), Some(tx)) => {
                            tracing::info!("SIGHUP received, reloading policy");
                            if let Some(snapshot) = reload_snapshot(path) {
                                let _ = tx.send(snapshot);
                            }
                        }
                        _ => tracing::warn!("SIGHUP ignored: no config file to reload"),
                    },
                }
            }
        });
    }

    if config.admin.enabled {
        let admin = setup_admin_router(AdminState {
            engine: server.engine(),
            api_key: config.admin.api_key.as_str().into(),
        });
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");

        let mut admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let result = axum::serve(admin_listener, admin)
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    server.run(listener, policy_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
