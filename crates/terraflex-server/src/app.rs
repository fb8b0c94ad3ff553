//! Wraps the route table with the tracing middleware every request goes
//! through.

use crate::routes::router;
use axum::Router;
use std::sync::Arc;
use terraflex_engine::StateLockController;
use tower_http::trace::TraceLayer;

/// Build the full application: routes plus request tracing.
#[must_use]
pub fn build(controller: Arc<StateLockController>) -> Router {
    router(controller).layer(TraceLayer::new_for_http())
}
