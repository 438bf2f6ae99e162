pub mod api;
pub mod auth;
pub mod cli;
pub mod jwt;
pub mod rate_limit;
pub mod registry;
pub mod store;

use api::create_api_router;
use auth::AuthConfig;
use axum::Router;
use rate_limit::RateLimitConfig;
use registry::{KeyRegistry, MemoryKeyRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use store::{Store, UserStore};
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Engine settings for issuing and checking tokens
    pub auth: AuthConfig,
    /// Accounts allowed to log in
    pub users: UserStore,
    /// Signing keys by subject. Shared with the caller so keys can be inspected or revoked
    /// out of band.
    pub registry: Arc<dyn KeyRegistry>,
    /// Login attempts per second per client
    pub login_per_sec: u32,
    /// Login attempts a client may burst
    pub login_burst: u32,
    /// Key rate limits by `X-Forwarded-For` (requires running behind a proxy)
    pub trust_forwarded_for: bool,
}

impl ServerConfig {
    pub fn new(auth: AuthConfig, users: UserStore) -> Self {
        Self {
            auth,
            users,
            registry: Arc::new(MemoryKeyRegistry::new()),
            login_per_sec: rate_limit::DEFAULT_LOGIN_PER_SEC,
            login_burst: rate_limit::DEFAULT_LOGIN_BURST,
            trust_forwarded_for: false,
        }
    }
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let rate_limit = Arc::new(RateLimitConfig::new(
        config.login_per_sec,
        config.login_burst,
        config.trust_forwarded_for,
    ));

    let api_router = create_api_router(
        Arc::new(config.auth.clone()),
        config.registry.clone(),
        Store::new(config.users.clone()),
        rate_limit,
    );

    Router::new().nest("/api", api_router)
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    Ok((handle, local_addr))
}
