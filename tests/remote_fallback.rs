//! ApiClient + gateway/catalog against an in-process stub of the REST API.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use sweet_shop::app::App;
use sweet_shop::config::{Config, LogoutScope};
use sweet_shop::errors::AuthError;
use sweet_shop::guard::Route;
use sweet_shop::models::{LoginRequest, RegisterRequest, Role};
use sweet_shop::session::SessionChange;
use sweet_shop::storage::Storage;

type Seen = Arc<Mutex<Vec<Option<String>>>>;

fn record(seen: &Seen, headers: &HeaderMap) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.lock().push(auth);
}

async fn login_ok(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "token": "srv-token",
        "user": { "id": 42, "username": body["username"], "email": "srv@shop.com", "role": "ADMIN" }
    }))
}

async fn sweets_ok(State(seen): State<Seen>, headers: HeaderMap) -> Json<Value> {
    record(&seen, &headers);
    Json(json!([
        { "id": 77, "name": "Server Toffee", "category": "Fudge", "price": 1.5, "quantity": 9 }
    ]))
}

async fn sweet_by_id(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({ "id": id, "name": "Remote Toffee", "category": "Fudge", "price": 9.0, "quantity": 6 }))
}

async fn accepted(State(seen): State<Seen>, headers: HeaderMap) -> Json<Value> {
    record(&seen, &headers);
    Json(json!({ "message": "ok" }))
}

async fn unauthorized(State(seen): State<Seen>, headers: HeaderMap) -> StatusCode {
    record(&seen, &headers);
    StatusCode::UNAUTHORIZED
}

async fn conflict() -> (StatusCode, Json<Value>) {
    (StatusCode::CONFLICT, Json(json!({ "message": "taken" })))
}

async fn spawn(api: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().unwrap();
    let app = Router::new().nest("/api", api);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

/// Base URL of a port nothing listens on
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

fn app_for(base_url: String, logout_scope: LogoutScope) -> App {
    let config = Config {
        api_base_url: base_url,
        request_timeout: Duration::from_secs(2),
        logout_scope,
        ..Config::default()
    };
    App::with_storage(config, Storage::temporary().unwrap()).unwrap()
}

fn creds(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn remote_login_is_used_and_bearer_attached() {
    let seen: Seen = Default::default();
    let api = Router::new()
        .route("/auth/login", post(login_ok))
        .route("/sweets", get(sweets_ok))
        .with_state(seen.clone());
    let app = app_for(spawn(api).await, LogoutScope::AllEndpoints);

    // Unknown locally; only the remote can accept this
    let resp = app.auth.login(creds("remote-only", "whatever")).await.unwrap();
    assert_eq!(resp.token, "srv-token");
    assert_eq!(resp.user.id, 42);
    assert!(app.auth.is_admin());

    let sweets = app.catalog.list().await.unwrap();
    assert_eq!(sweets.len(), 1);
    assert_eq!(sweets[0].name, "Server Toffee");
    assert_eq!(seen.lock().as_slice(), [Some("Bearer srv-token".to_string())]);

    // Local copy now mirrors the remote listing
    assert_eq!(app.storage.all_sweets().unwrap().len(), 1);
}

#[tokio::test]
async fn unauthorized_catalog_read_forces_logout_and_falls_back() {
    let seen: Seen = Default::default();
    let api = Router::new()
        .route("/auth/login", post(login_ok))
        .route("/sweets", get(unauthorized))
        .with_state(seen.clone());
    let app = app_for(spawn(api).await, LogoutScope::AllEndpoints);

    app.auth.login(creds("admin", "admin123")).await.unwrap();
    assert_eq!(app.navigate(Route::Dashboard), Route::Dashboard);
    let mut watcher = app.session.watch();

    let sweets = app.catalog.list().await.unwrap();
    assert_eq!(sweets.len(), 12, "demo catalog served locally");
    assert!(!app.auth.is_authenticated());
    assert_eq!(watcher.latest(Duration::from_millis(200)), Some(SessionChange::SignedOut));
    assert_eq!(app.navigate(Route::Dashboard), Route::Auth);
}

#[tokio::test]
async fn protected_scope_keeps_session_on_read_401() {
    let seen: Seen = Default::default();
    let api = Router::new()
        .route("/auth/login", post(login_ok))
        .route("/sweets", get(unauthorized))
        .route("/sweets/:id/purchase", post(unauthorized))
        .with_state(seen.clone());
    let app = app_for(spawn(api).await, LogoutScope::ProtectedEndpointsOnly);

    app.auth.login(creds("user1", "user123")).await.unwrap();
    app.catalog.list().await.unwrap();
    assert!(app.auth.is_authenticated());

    // The purchase is still applied locally, but the 401 ends the session
    let record = app.catalog.purchase(1, 1).await.unwrap();
    assert_eq!(record.user_id, Some(42));
    assert!(!app.auth.is_authenticated());
    assert_eq!(seen.lock().len(), 2);
}

#[tokio::test]
async fn rejected_remote_login_does_not_touch_session() {
    let seen: Seen = Default::default();
    let api = Router::new()
        .route("/auth/login", post(unauthorized))
        .with_state(seen.clone());
    let app = app_for(spawn(api).await, LogoutScope::AllEndpoints);

    // Remote says 401, local store still knows john
    let resp = app.auth.login(creds("john", "john123")).await.unwrap();
    assert_eq!(resp.user.role, Role::User);
    let before = app.auth.current_user();
    assert!(before.is_some());

    let err = app.auth.login(creds("nope", "x")).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(app.auth.current_user(), before);
}

#[tokio::test]
async fn unreachable_remote_falls_back_to_local_store() {
    let app = app_for(dead_url().await, LogoutScope::AllEndpoints);

    let resp = app.auth.login(creds("admin", "admin123")).await.unwrap();
    assert!(resp.token.starts_with("mock_"));
    assert!(app.auth.is_admin());
    assert_eq!(app.navigate(Route::Admin), Route::Admin);

    let user = app
        .auth
        .register(RegisterRequest {
            username: "newbie".to_string(),
            email: "newbie@example.com".to_string(),
            password: "secret1".to_string(),
            role: None,
        })
        .await
        .unwrap();
    assert_eq!(user.role, Role::User);
}

#[tokio::test]
async fn remote_register_error_falls_back_to_duplicate_check() {
    let seen: Seen = Default::default();
    let api = Router::new()
        .route("/auth/register", post(conflict))
        .with_state(seen);
    let app = app_for(spawn(api).await, LogoutScope::AllEndpoints);

    let err = app
        .auth
        .register(RegisterRequest {
            username: "admin".to_string(),
            email: "x@y.com".to_string(),
            password: "p".to_string(),
            role: Some(Role::User),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateUser));
}

#[tokio::test]
async fn anonymous_requests_carry_no_authorization_header() {
    let seen: Seen = Default::default();
    let api = Router::new()
        .route("/sweets", get(sweets_ok))
        .with_state(seen.clone());
    let app = app_for(spawn(api).await, LogoutScope::AllEndpoints);

    app.catalog.list().await.unwrap();
    assert_eq!(seen.lock().as_slice(), [None::<String>]);
}

#[tokio::test]
async fn locally_issued_token_is_sent_to_remote() {
    let seen: Seen = Default::default();
    // No /auth/login route: the stub answers 404 and login falls back locally
    let api = Router::new()
        .route("/sweets", get(sweets_ok))
        .with_state(seen.clone());
    let app = app_for(spawn(api).await, LogoutScope::AllEndpoints);

    let resp = app.auth.login(creds("john", "john123")).await.unwrap();
    assert!(resp.token.starts_with("mock_"));

    app.catalog.list().await.unwrap();
    let expected = format!("Bearer {}", resp.token);
    assert_eq!(seen.lock().as_slice(), [Some(expected)]);
}

#[tokio::test]
async fn purchase_records_the_remote_sweet() {
    let seen: Seen = Default::default();
    let api = Router::new()
        .route("/auth/login", post(login_ok))
        .route("/sweets/:id", get(sweet_by_id))
        .route("/sweets/:id/purchase", post(accepted))
        .with_state(seen.clone());
    let app = app_for(spawn(api).await, LogoutScope::AllEndpoints);

    app.auth.login(creds("user1", "user123")).await.unwrap();
    assert_eq!(app.catalog.get(1).await.unwrap().name, "Remote Toffee");

    let record = app.catalog.purchase(1, 2).await.unwrap();
    assert_eq!(record.sweet_name, "Remote Toffee");
    assert_eq!(record.total_price, 18.0);
    assert_eq!(app.storage.get_sweet(1).unwrap().unwrap().quantity, 4);
    assert_eq!(seen.lock().len(), 1);

    // Only the remote knows sweet 500
    let record = app.catalog.purchase(500, 1).await.unwrap();
    assert_eq!(record.sweet_id, 500);
    assert_eq!(record.total_price, 9.0);
}
