//! Pluggable providers.
//!
//! A provider contributes routes mounted under the admin path and a
//! middleware hook run on every admin request. The security provider uses
//! both: login pages and the session check.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;

use crate::state::AdminState;

/// A unit of functionality plugged into the admin app.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &str;

    /// Routes relative to the admin path.
    fn routes(self: Arc<Self>) -> Router<AdminState> {
        Router::new()
    }

    /// Runs around every admin request, including the provider's own routes.
    async fn handle(&self, _state: &AdminState, request: Request, next: Next) -> Response {
        next.run(request).await
    }
}

/// Adapts [`Provider::handle`] to `axum::middleware::from_fn_with_state`.
pub(crate) async fn provider_middleware(
    State((state, provider)): State<(AdminState, Arc<dyn Provider>)>,
    request: Request,
    next: Next,
) -> Response {
    provider.handle(&state, request, next).await
}
