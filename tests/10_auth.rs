mod common;

use axum::http::{header, Method, StatusCode};
use chrono::Duration;
use jobquest_api::app;
use jobquest_api::auth::TokenService;
use serde_json::json;

use common::{get, login, request, send, test_app, test_config, test_state, TEST_SECRET};

#[tokio::test]
async fn jwt_sets_http_only_session_cookie() {
    let (app, _) = test_app();

    let res = send(&app, request(Method::POST, "/jwt", Some(json!({"email": "seeker@jobs.io"})), None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"success": true}));

    let set_cookie = res.set_cookie().expect("set-cookie header");
    assert!(set_cookie.starts_with("token="), "{set_cookie}");
    assert!(set_cookie.contains("HttpOnly"), "{set_cookie}");
    assert!(set_cookie.contains("SameSite=Strict"), "{set_cookie}");
    assert!(set_cookie.contains("Path=/"), "{set_cookie}");
}

#[tokio::test]
async fn jwt_rejects_non_object_payload() {
    let (app, _) = test_app();
    let res = send(&app, request(Method::POST, "/jwt", Some(json!(["not", "an", "object"])), None)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.session_cookie().is_none());
}

#[tokio::test]
async fn protected_route_requires_cookie() {
    let (app, _) = test_app();

    let res = get(&app, "/my-jobs?email=hr@acme.io", None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Token is required");
    assert_eq!(res.body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn issued_token_is_accepted() {
    let (app, _) = test_app();
    let cookie = login(&app, "hr@acme.io").await;

    let res = get(&app, "/my-jobs?email=hr@acme.io", Some(&cookie)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let (app, _) = test_app();
    let expired = TokenService::new(TEST_SECRET, Duration::seconds(-5))
        .unwrap()
        .issue(json!({"email": "hr@acme.io"}))
        .unwrap();

    let res = get(&app, "/my-jobs?email=hr@acme.io", Some(&format!("token={expired}"))).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "unauthorized");
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let (app, _) = test_app();
    let cookie = login(&app, "seeker@jobs.io").await;
    let token = cookie.trim_start_matches("token=");

    // Payload from a token signed elsewhere, signature from ours
    let forged = TokenService::new("other-secret", Duration::hours(1))
        .unwrap()
        .issue(json!({"email": "admin@jobs.io"}))
        .unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[1] = forged.split('.').nth(1).unwrap();
    let tampered = parts.join(".");

    let res = get(&app, "/applied-jobs?email=admin@jobs.io", Some(&format!("token={tampered}"))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = get(&app, "/applied-jobs?email=admin@jobs.io", Some(&format!("token={forged}"))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_expires_cookie() {
    let (app, _) = test_app();
    let cookie = login(&app, "seeker@jobs.io").await;

    let res = send(
        &app,
        request(Method::POST, "/logout", Some(json!({"email": "seeker@jobs.io"})), Some(&cookie)),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"success": true}));
    let set_cookie = res.set_cookie().expect("removal cookie");
    assert!(set_cookie.starts_with("token=;"), "{set_cookie}");
    assert!(set_cookie.contains("Max-Age=0"), "{set_cookie}");
    assert!(set_cookie.contains("HttpOnly"), "{set_cookie}");
}

#[tokio::test]
async fn logout_without_body_still_clears() {
    let (app, _) = test_app();
    let res = send(&app, request(Method::POST, "/logout", None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie().unwrap_or_default().contains("Max-Age=0"));
}

#[tokio::test]
async fn production_cookie_is_secure_and_cross_site() {
    let mut config = test_config();
    config.environment = jobquest_api::config::Environment::Production;
    let (state, _) = test_state(config);
    let app = app(state);

    let res = send(&app, request(Method::POST, "/jwt", Some(json!({"email": "a@jobs.io"})), None)).await;
    let set_cookie = res.set_cookie().expect("set-cookie header");
    assert!(set_cookie.contains("Secure"), "{set_cookie}");
    assert!(set_cookie.contains("SameSite=None"), "{set_cookie}");
}

#[tokio::test]
async fn open_routes_when_auth_not_enforced() {
    let mut config = test_config();
    config.security.enforce_auth = false;
    let (state, store) = test_state(config);
    let app = app(state);

    let res = send(&app, request(Method::POST, "/add-job", Some(json!({"title": "Ops"})), None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(store.len(jobquest_api::types::Collection::Jobs).await, 1);
}

#[tokio::test]
async fn cors_preflight_allows_configured_frontend_with_credentials() {
    let (app, _) = test_app();
    let preflight = axum::http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/add-job")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = send(&app, preflight).await;

    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn wildcard_cors_mirrors_any_origin_with_credentials() {
    let mut config = test_config();
    config.security.cors_origins = vec!["*".to_string()];
    let (state, _) = test_state(config);
    let app = app(state);

    let preflight = axum::http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/add-job")
        .header(header::ORIGIN, "https://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = send(&app, preflight).await;

    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://evil.example"
    );
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn restricted_cors_ignores_unknown_origin() {
    let (app, _) = test_app();
    let preflight = axum::http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/add-job")
        .header(header::ORIGIN, "https://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = send(&app, preflight).await;

    assert!(res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
