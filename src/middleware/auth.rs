use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde_json::Value;

use crate::app::AppState;
use crate::auth::{AuthError, Claims};
use crate::error::ApiError;
use crate::types::Document;

/// Authenticated caller extracted from the session cookie
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub identity: Document,
}

impl AuthUser {
    pub fn email(&self) -> Option<&str> {
        self.identity.get("email").and_then(Value::as_str)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            identity: claims.identity,
        }
    }
}

/// Cookie authentication middleware that validates tokens and injects the caller
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, &jar).map_err(|e| {
        tracing::warn!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, jar: &CookieJar) -> Result<Claims, AuthError> {
    let token = jar
        .get(state.session_cookie.name())
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingToken)?;

    state.tokens.verify(token)
}
