pub mod envelope;
pub mod handlers;

pub use envelope::Envelope;

use crate::governance::{GovernanceError, GovernanceService};
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

/// Build the router over a shared service.
pub fn router(service: Arc<GovernanceService>) -> Router {
    Router::new()
        .route("/governance/proposals", any(handlers::proposals))
        .route("/governance/proposal", any(handlers::proposal))
        .route("/governance/vote", any(handlers::vote))
        .with_state(service)
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// A panic below a handler becomes an opaque backend failure.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %message, "handler panicked");
    envelope::failure(GovernanceError::BackendUnavailable(message))
}
