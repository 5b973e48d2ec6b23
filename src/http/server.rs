//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo echo handler
//! - Wire up middleware (request ID, tracing, header policy, timeout)
//! - Apply policy snapshots arriving from the reload channel
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request},
    middleware,
    routing::any,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::middleware::policy::header_policy_middleware;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::policy::{HeaderPolicyEngine, PolicySnapshot};

/// HTTP server fronting the echo handler with the header policy.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    engine: Arc<HeaderPolicyEngine>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and compiled policy.
    pub fn new(config: ServiceConfig, snapshot: PolicySnapshot) -> Self {
        let engine = Arc::new(HeaderPolicyEngine::new(snapshot));
        let router = Self::build_router(&config, engine.clone());
        Self {
            router,
            config,
            engine,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The policy layer sits outside the timeout so that timed-out
    /// responses carry the security headers too.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, engine: Arc<HeaderPolicyEngine>) -> Router {
        Router::new()
            .route("/{*path}", any(echo_handler))
            .route("/", any(echo_handler))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(engine, header_policy_middleware))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for serving it elsewhere or driving it in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared handle to the active policy.
    pub fn engine(&self) -> Arc<HeaderPolicyEngine> {
        self.engine.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Snapshots received on `policy_updates` replace the active policy;
    /// the server stops when `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut policy_updates: mpsc::UnboundedReceiver<PolicySnapshot>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let engine = self.engine.clone();
        tokio::spawn(async move {
            while let Some(snapshot) = policy_updates.recv().await {
                engine.reload(snapshot);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EchoResponse {
    method: String,
    path: String,
    request_id: String,
    client: Option<String>,
}

/// Describe the request back to the caller.
async fn echo_handler(request: Request) -> Json<EchoResponse> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    Json(EchoResponse {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        request_id: request_id(&request).to_string(),
        client,
    })
}
