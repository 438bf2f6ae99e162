//! Session endpoints: login, whoami, logout.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, request::Parts},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::error::ApiError;
use crate::auth::{
    ApiAuth, AuthConfig, AuthErrorKind, Authenticator, Authorizer, AuthorizeHooks, BoxError,
    IssuedToken, LoginError, LoginGrant, LoginHooks, require_auth,
};
use crate::rate_limit::{RateLimitConfig, rate_limit_login};
use crate::registry::{KeyRegistry, SigningKey};
use crate::store::Store;

#[derive(Clone)]
pub struct SessionState {
    pub authenticator: Authenticator,
    pub authorizer: Authorizer,
    pub registry: Arc<dyn KeyRegistry>,
    pub store: Store,
    pub login_hooks: SessionLoginHooks,
    pub hooks: SessionHooks,
}

crate::impl_has_authorizer!(SessionState, SessionHooks);

impl SessionState {
    pub fn new(config: Arc<AuthConfig>, registry: Arc<dyn KeyRegistry>, store: Store) -> Self {
        Self {
            authenticator: Authenticator::new(config.clone(), registry.clone()),
            authorizer: Authorizer::new(config.clone(), registry.clone()),
            login_hooks: SessionLoginHooks {
                store: store.clone(),
                registry: registry.clone(),
                subject_field: config.subject_field.clone(),
            },
            hooks: SessionHooks {
                store: store.clone(),
            },
            registry,
            store,
        }
    }

    fn subject_field(&self) -> &str {
        &self.authorizer.config().subject_field
    }
}

pub fn router(state: SessionState, rate_limit: Arc<RateLimitConfig>) -> Router {
    let public = Router::new()
        .route("/login", post(login))
        .layer(middleware::from_fn_with_state(rate_limit, rate_limit_login));

    let protected = Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<SessionState>,
        ));

    public.merge(protected).with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub subject: String,
    pub password: String,
}

/// Per-call login context. The hooks write the HTTP response into it.
pub struct LoginContext {
    body: LoginRequest,
    response: Option<Response>,
}

/// Checks passwords against the user table and renders login outcomes.
#[derive(Clone)]
pub struct SessionLoginHooks {
    store: Store,
    registry: Arc<dyn KeyRegistry>,
    subject_field: String,
}

impl LoginHooks<LoginContext> for SessionLoginHooks {
    async fn check_credentials(&self, request: &mut LoginContext) -> Result<LoginGrant, BoxError> {
        let user = self
            .store
            .users()
            .get(&request.body.subject)
            .cloned()
            .ok_or("invalid credentials")?;

        // bcrypt is CPU bound.
        let candidate = request.body.password.clone();
        let checked = user.clone();
        let matches =
            tokio::task::spawn_blocking(move || checked.verify_password(&candidate)).await?;
        if !matches {
            return Err("invalid credentials".into());
        }

        let mut claims = Map::new();
        claims.insert(self.subject_field.clone(), Value::from(user.subject.clone()));
        claims.insert("role".to_string(), Value::from(user.role.as_str()));

        // Existing sessions keep their key; a subject without one gets a fresh key.
        let grant = LoginGrant::new(claims);
        Ok(match self.registry.lookup(&user.subject) {
            Some(_) => grant,
            None => grant.with_key(SigningKey::generate()),
        })
    }

    fn on_login_response(&self, request: &mut LoginContext, issued: &IssuedToken) {
        info!(subject = %request.body.subject, "Login succeeded");
        request.response = Some(Json(issued).into_response());
    }

    fn on_login_error(&self, request: &mut LoginContext, error: &LoginError) {
        let api_error = match error {
            LoginError::Credentials(e) => {
                warn!(subject = %request.body.subject, reason = %e, "Login rejected");
                ApiError::unauthorized("Invalid credentials")
            }
            LoginError::UnknownSubject => {
                debug!(subject = %request.body.subject, "Signing key removed during login");
                ApiError::internal("Failed to issue token")
            }
            other => ApiError::internal_error("Failed to issue token", other),
        };
        request.response = Some(api_error.into_response());
    }
}

/// Revocation lookups and rejection logging for protected routes.
#[derive(Clone)]
pub struct SessionHooks {
    store: Store,
}

impl AuthorizeHooks<Parts> for SessionHooks {
    async fn is_revoked(&self, _request: &Parts, signature: &str) -> bool {
        self.store.revoked().contains(signature)
    }

    fn on_authorize_error(&self, request: &mut Parts, error: AuthErrorKind) {
        let path = request.uri.path();
        if error.is_security_violation() {
            warn!(kind = %error.as_str(), path = %path, "Rejected forged token");
        } else {
            debug!(kind = %error.as_str(), path = %path, "Rejected request");
        }
    }
}

async fn login(State(state): State<SessionState>, Json(body): Json<LoginRequest>) -> Response {
    if body.subject.is_empty() {
        return ApiError::bad_request("Subject is required").into_response();
    }

    let mut ctx = LoginContext {
        body,
        response: None,
    };
    // Both outcomes are rendered by the hooks.
    let outcome = state.authenticator.login(&mut ctx, &state.login_hooks).await;

    // A concurrent logout-all can drop the key between the credential check and signing.
    // The second attempt finds no key and registers a fresh one.
    if matches!(outcome, Err(LoginError::UnknownSubject)) {
        ctx.response = None;
        let _ = state.authenticator.login(&mut ctx, &state.login_hooks).await;
    }

    ctx.response
        .unwrap_or_else(|| ApiError::internal("Login produced no response").into_response())
}

async fn me(State(state): State<SessionState>, ApiAuth(session): ApiAuth) -> Json<Value> {
    Json(json!({
        "subject": session.claims.subject(state.subject_field()),
        "claims": session.claims.as_map(),
    }))
}

/// Revoke only the token that made this request.
async fn logout(State(state): State<SessionState>, ApiAuth(session): ApiAuth) -> StatusCode {
    state.store.revoked().revoke(&session.signature);
    info!(
        subject = ?session.claims.subject(state.subject_field()),
        "Token revoked"
    );
    StatusCode::NO_CONTENT
}

/// Drop the subject's key, invalidating every token it signed.
async fn logout_all(
    State(state): State<SessionState>,
    ApiAuth(session): ApiAuth,
) -> Result<StatusCode, ApiError> {
    let subject = session
        .claims
        .subject(state.subject_field())
        .ok_or_else(|| ApiError::internal("Session has no subject"))?;

    state.registry.remove(&subject);
    info!(subject = %subject, "All sessions revoked");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryKeyRegistry;
    use crate::store::{UserRole, UserStore};
    use axum::{body::Body, extract::Request};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    /// Forgets a subject's key right after the next lookup returns it, the way a logout-all
    /// racing with a login would.
    #[derive(Default)]
    struct RacingRegistry {
        inner: MemoryKeyRegistry,
        drop_next: AtomicBool,
    }

    impl KeyRegistry for RacingRegistry {
        fn register(&self, subject: &str, key: SigningKey) {
            self.inner.register(subject, key)
        }

        fn lookup(&self, subject: &str) -> Option<SigningKey> {
            let key = self.inner.lookup(subject);
            if self.drop_next.swap(false, Ordering::SeqCst) {
                self.inner.remove(subject);
            }
            key
        }

        fn remove(&self, subject: &str) -> Option<SigningKey> {
            self.inner.remove(subject)
        }
    }

    fn app(registry: Arc<dyn KeyRegistry>) -> Router {
        let users = UserStore::new().with_user(
            "alice",
            &bcrypt::hash("wonderland", 4).unwrap(),
            UserRole::Admin,
        );
        let state =
            SessionState::new(Arc::new(AuthConfig::default()), registry, Store::new(users));
        router(state, Arc::new(RateLimitConfig::new(1000, 1000, false)))
    }

    fn login_request(password: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"subject": "alice", "password": password}).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_survives_key_removed_mid_login() {
        let registry = Arc::new(RacingRegistry::default());
        registry.register("alice", SigningKey::from("old"));
        registry.drop_next.store(true, Ordering::SeqCst);

        let response = app(registry.clone())
            .oneshot(login_request("wonderland"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let key = registry.lookup("alice").unwrap();
        assert_ne!(key, SigningKey::from("old"));
    }

    #[tokio::test]
    async fn test_wrong_password_registers_nothing() {
        let registry = Arc::new(MemoryKeyRegistry::new());

        let response = app(registry.clone())
            .oneshot(login_request("looking-glass"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(registry.is_empty());
    }
}
