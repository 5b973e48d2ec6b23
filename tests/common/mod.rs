//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    middleware, Router,
};
use tower::ServiceExt;

use header_policy::config::{compile, parse_config};
use header_policy::http::header_policy_middleware;
use header_policy::{HeaderPolicyEngine, PolicySnapshot};

/// Compile a TOML policy config into a snapshot.
pub fn snapshot(toml: &str) -> PolicySnapshot {
    let config = parse_config(toml).unwrap();
    compile(&config).unwrap()
}

pub fn engine(toml: &str) -> Arc<HeaderPolicyEngine> {
    Arc::new(HeaderPolicyEngine::new(snapshot(toml)))
}

/// Wrap `app` in the header policy middleware.
pub fn with_policy(app: Router, engine: Arc<HeaderPolicyEngine>) -> Router {
    app.layer(middleware::from_fn_with_state(engine, header_policy_middleware))
}

/// Send a GET for `uri` through `app`.
pub async fn get(app: Router, uri: &str, host: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(host) = host {
        request = request.header("Host", host);
    }
    app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
}

/// All values a response carries for `name`.
pub fn header_values(response: &Response<Body>, name: &str) -> Vec<String> {
    response
        .headers()
        .get_all(name)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}
