// handlers/public/auth.rs - Session cookie issuance and removal
use axum::{extract::State, Json};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiResult;

/// POST /jwt - sign the posted identity and set it as the session cookie
///
/// The body is the token payload verbatim (typically `{"email": ...}`); it
/// must be a JSON object. Responds `{"success": true}`.
pub async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<Value>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let email = payload.get("email").and_then(Value::as_str).map(str::to_string);
    let token = state.tokens.issue(payload)?;

    tracing::info!(
        "Issued session token for {} (ttl {}s)",
        email.as_deref().unwrap_or("<no email>"),
        state.tokens.ttl().num_seconds()
    );

    let jar = jar.add(state.session_cookie.issue(token));
    Ok((jar, Json(json!({ "success": true }))))
}

/// POST /logout - expire the session cookie
///
/// Any body is accepted and only logged.
pub async fn logout(State(state): State<AppState>, jar: CookieJar, body: Option<Json<Value>>) -> (CookieJar, Json<Value>) {
    match body {
        Some(Json(user)) => tracing::info!("Logging out {}", user),
        None => tracing::info!("Logging out anonymous session"),
    }

    let jar = jar.add(state.session_cookie.clear());
    (jar, Json(json!({ "success": true })))
}
