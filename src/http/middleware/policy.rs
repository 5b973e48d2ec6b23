//! Header policy middleware.
//!
//! Resolves the route before the handler runs, so the whole request is
//! served by one policy snapshot even if a reload lands mid-request, and
//! applies the merged headers to the handler's response before it goes back
//! to the transport.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::request_id;
use crate::observability::metrics;
use crate::policy::{apply, HeaderPolicyEngine};
use crate::routing::{PolicyRoute, RequestTarget};

const DEFAULT_ROUTE: &str = "default";

pub async fn header_policy_middleware(
    State(engine): State<Arc<HeaderPolicyEngine>>,
    request: Request,
    next: Next,
) -> Response {
    let snapshot = engine.snapshot();
    let (route, policy) = snapshot.effective_for(&RequestTarget::from_request(&request));
    let route = route.map(PolicyRoute::name).unwrap_or(DEFAULT_ROUTE);
    let request_id = request_id(&request).to_string();

    tracing::trace!(
        request_id = %request_id,
        route = %route,
        directives = policy.len(),
        "Resolved header policy"
    );

    let mut response = next.run(request).await;

    match apply(&policy, &mut response) {
        Ok(()) => {
            metrics::record_applied(route);
            response
        }
        Err(violation) => {
            metrics::record_lifecycle_violation();
            tracing::error!(
                request_id = %request_id,
                route = %route,
                phase = %violation.phase,
                pending = ?violation.pending,
                "Header policy applied after headers were sent; aborting request"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
