//! HTTP API tests
//!
//! Drives the full router with `tower::ServiceExt::oneshot` against an
//! in-memory store:
//! - Storefront reads and submissions
//! - Error response shape
//! - Admin session handling and protected routes

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use winelots_backend::external::LogMailer;
use winelots_backend::repository::InMemoryStore;
use winelots_backend::{create_app, AppState, Config};

const PASSWORD: &str = "grand-cru";

// ============================================================================
// Test Helpers
// ============================================================================

fn app() -> Router {
    app_with_store().0
}

/// Router plus a handle on its store, for outage tests
fn app_with_store() -> (Router, InMemoryStore) {
    let mut config = Config::default();
    config.admin.password_hash = bcrypt::hash(PASSWORD, 4).unwrap();
    let store = InMemoryStore::new();
    let state = AppState::in_memory(store.clone(), Arc::new(LogMailer), config);
    (create_app(state), store)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/admin/auth",
        None,
        Some(json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn seed_case(app: &Router, token: &str, slug: &str, min: i32) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/admin/cases",
        Some(token),
        Some(json!({
            "name": format!("Caisse {}", slug),
            "slug": slug,
            "category": "red",
            "minParticipants": min,
            "items": [{ "name": "Saint-Joseph", "price": "14,90€", "quantity": 6 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

// ============================================================================
// Storefront
// ============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "connected");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_and_counts() {
    let app = app();
    let token = admin_token(&app).await;
    let created = seed_case(&app, &token, "rhone", 2).await;
    // 14.90 × 6 = 89.40
    assert_eq!(created["price"], "90");

    let (status, cases) = send(&app, Method::GET, "/api/v1/cases", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cases[0]["slug"], "rhone");
    assert_eq!(cases[0]["minParticipants"], 2);
    assert_eq!(cases[0]["pricePerBottle"], "15.00€");
    assert_eq!(cases[0]["items"][0]["quantity"], 6);

    let (status, counts) = send(&app, Method::GET, "/api/v1/counts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        counts,
        json!({ "rhone": { "current": 0, "completeLots": 0, "minPersonnes": 2 } })
    );
}

#[tokio::test]
async fn test_submission_flow() {
    let app = app();
    let token = admin_token(&app).await;
    seed_case(&app, &token, "rhone", 2).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({
            "name": "Camille",
            "email": "camille@example.fr",
            "cases": { "rhone": 3 }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["lotsCompleted"], 1);
    assert_eq!(
        body["results"],
        json!([
            { "case": "rhone", "lotNumber": 1, "count": 1, "unit": 1 },
            { "case": "rhone", "lotNumber": 1, "count": 2, "unit": 2 },
            { "case": "rhone", "lotNumber": 2, "count": 1, "unit": 3 }
        ])
    );

    let (_, counts) = send(&app, Method::GET, "/api/v1/counts", None, None).await;
    assert_eq!(counts["rhone"]["current"], 1);
    assert_eq!(counts["rhone"]["completeLots"], 1);
}

#[tokio::test]
async fn test_submission_validation_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({ "email": "camille@example.fr", "cases": { "rhone": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "name");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({ "name": "Camille", "email": "camille@example.fr", "cases": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "cases");
    assert_eq!(body["error"]["message_fr"], "Aucune caisse sélectionnée");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({ "name": "Camille", "email": "camille@example.fr", "cases": { "ghost": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNKNOWN_CASE");
}

#[tokio::test]
async fn test_submission_quantity_cap() {
    let app = app();
    let token = admin_token(&app).await;
    seed_case(&app, &token, "rhone", 3).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({
            "name": "Camille",
            "email": "camille@example.fr",
            "cases": { "rhone": 4_000_000_000u64 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "cases");

    let (_, intentions) = send(&app, Method::GET, "/api/v1/admin/intentions", Some(&token), None).await;
    assert_eq!(intentions.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_get_json_errors() {
    let app = app();

    // Wrong type for a quantity
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({ "name": "Camille", "email": "camille@example.fr", "cases": { "rhone": "2" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Not JSON at all
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/intentions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{name: Camille"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Missing content type on the login form
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/auth")
        .body(Body::from(json!({ "password": PASSWORD }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submission_during_store_outage() {
    let (app, store) = app_with_store();
    let token = admin_token(&app).await;
    seed_case(&app, &token, "rhone", 2).await;
    store.set_offline(true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({ "name": "Camille", "email": "camille@example.fr", "cases": { "rhone": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");

    store.set_offline(false);
    let (_, intentions) = send(&app, Method::GET, "/api/v1/admin/intentions", Some(&token), None).await;
    assert_eq!(intentions.as_array().unwrap().len(), 0);
}

// ============================================================================
// Admin Session
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = app();
    for uri in [
        "/api/v1/admin/cases",
        "/api/v1/admin/intentions",
        "/api/v1/admin/stats",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    let (status, _) = send(&app, Method::GET, "/api/v1/admin/stats", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/auth",
        None,
        Some(json!({ "password": "piquette" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_sets_cookie_and_cookie_authenticates() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "password": PASSWORD }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("admin_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let status_request = Request::builder()
        .uri("/api/v1/admin/stats")
        .header(header::COOKIE, cookie.clone())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(status_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session_request = Request::builder()
        .uri("/api/v1/admin/auth")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(session_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_status_without_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/admin/auth", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "authenticated": false }));

    let (status, body) = send(&app, Method::DELETE, "/api/v1/admin/auth", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);
}

// ============================================================================
// Admin Panel
// ============================================================================

#[tokio::test]
async fn test_admin_manages_intentions_and_stats() {
    let app = app();
    let token = admin_token(&app).await;
    seed_case(&app, &token, "rhone", 2).await;

    send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({ "name": "Camille", "email": "camille@example.fr", "cases": { "rhone": 2 } })),
    )
    .await;

    let (status, intentions) =
        send(&app, Method::GET, "/api/v1/admin/intentions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = intentions.as_array().unwrap();
    assert_eq!(list.len(), 2);
    let id = list[0]["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/admin/intentions/{}", id),
        Some(&token),
        Some(json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "paid");

    let (status, stats) = send(&app, Method::GET, "/api/v1/admin/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalIntentions"], 2);
    assert_eq!(stats["completedLots"], 1);
    assert_eq!(stats["totalCases"], 1);
    assert_eq!(stats["paidIntentions"], 1);
    assert_eq!(stats["pendingIntentions"], 1);
    assert_eq!(stats["revenue"], "180");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/admin/intentions/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_intentions_csv_export() {
    let app = app();
    let token = admin_token(&app).await;
    seed_case(&app, &token, "rhone", 3).await;
    send(
        &app,
        Method::POST,
        "/api/v1/intentions",
        None,
        Some(json!({ "name": "Camille", "email": "camille@example.fr", "cases": { "rhone": 1 } })),
    )
    .await;

    let request = Request::builder()
        .uri("/api/v1/admin/intentions?format=csv")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("camille@example.fr"));
}

#[tokio::test]
async fn test_admin_case_update_and_delete() {
    let app = app();
    let token = admin_token(&app).await;
    let created = seed_case(&app, &token, "rhone", 2).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/admin/cases/{}", id),
        Some(&token),
        Some(json!({
            "name": "Rhône",
            "slug": "rhone",
            "category": "red",
            "active": false,
            "items": [{ "name": "Cornas", "price": 30, "quantity": 6 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], "180");
    assert_eq!(updated["active"], false);

    // Inactive cases leave the storefront
    let (_, cases) = send(&app, Method::GET, "/api/v1/cases", None, None).await;
    assert_eq!(cases, json!([]));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/admin/cases/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/admin/cases/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
