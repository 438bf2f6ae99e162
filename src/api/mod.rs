mod error;
mod session;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::rate_limit::RateLimitConfig;
use crate::registry::KeyRegistry;
use crate::store::Store;

pub use error::ApiError;
pub use session::{LoginRequest, SessionHooks, SessionLoginHooks, SessionState};

/// Create the API router.
pub fn create_api_router(
    auth: Arc<AuthConfig>,
    registry: Arc<dyn KeyRegistry>,
    store: Store,
    rate_limit: Arc<RateLimitConfig>,
) -> Router {
    let session_state = SessionState::new(auth, registry, store);

    Router::new().nest("/session", session::router(session_state, rate_limit))
}
