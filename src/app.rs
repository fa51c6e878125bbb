use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthError, SessionCookie, TokenService};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::DocumentStore;
use crate::handlers::{protected, public};
use crate::middleware::require_auth;

/// Everything a handler needs, built once in `main` and cloned per request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: Arc<TokenService>,
    pub session_cookie: Arc<SessionCookie>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, AuthError> {
        let tokens = TokenService::from_config(&config.security)?;
        let session_cookie = SessionCookie::from_config(&config);
        Ok(Self {
            store,
            tokens: Arc::new(tokens),
            session_cookie: Arc::new(session_cookie),
            config: Arc::new(config),
        })
    }
}

pub fn app(state: AppState) -> Router {
    let protected = if state.config.security.enforce_auth {
        protected_routes().route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
    } else {
        tracing::warn!("ENFORCE_AUTH is off: write routes are open to anonymous callers");
        protected_routes()
    };

    Router::new()
        // Public
        .route("/", get(public::service::root))
        .route("/health", get(public::service::health))
        .merge(public_routes())
        // Token acquisition
        .merge(auth_routes())
        // Session cookie required unless ENFORCE_AUTH=false
        .merge(protected)
        .fallback(public::service::not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::jobs;

    Router::new()
        .route("/jobs", get(jobs::list))
        // Details view and edit form load the same document
        .route("/job/:id", get(jobs::show))
        .route("/get-job/:id", get(jobs::show))
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/jwt", post(auth::issue_token))
        .route("/logout", post(auth::logout))
}

fn protected_routes() -> Router<AppState> {
    use protected::{applications, jobs};

    Router::new()
        // Job postings
        .route("/my-jobs", get(jobs::my_jobs))
        .route("/add-job", post(jobs::add))
        .route("/update/:id", put(jobs::update))
        .route("/applicants/:id", patch(jobs::increment_applicants))
        .route("/delete/:id", delete(jobs::remove))
        // Applications
        .route("/applied-jobs", get(applications::applied_jobs))
        .route("/apply", post(applications::apply))
        .route("/undo/:id", delete(applications::undo))
}

/// Credentialed CORS for the configured frontends, or mirror-any-origin
/// when the origin list is "*".
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_is_open() {
        return CorsLayer::very_permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}
