#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flashcard_vault::config::AppConfig;
use flashcard_vault::infrastructure::database;
use flashcard_vault::{AppState, create_app};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        max_pdf_size: 64 * 1024,
        ..AppConfig::default()
    }
}

pub async fn setup_app() -> (Router, DatabaseConnection) {
    setup_app_with(test_config()).await
}

pub async fn setup_app_with(config: AppConfig) -> (Router, DatabaseConnection) {
    let _ = tracing_subscriber::fmt::try_init();
    let db = database::setup_database(&config.database_url).await.unwrap();
    let app = create_app(AppState::new(db.clone(), config));
    (app, db)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app, method, uri, token, body).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user with the given email and returns a session token.
pub async fn register_and_login(app: &Router, email: &str, password: &str) -> String {
    let (status, _) = send_json(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Test User", "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

pub async fn create_workspace(app: &Router, token: &str, body: Value) -> Value {
    let (status, workspace) = send_json(app, "POST", "/workspaces", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", workspace);
    workspace
}

pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n".to_vec()
}

pub fn pdf_data_url(bytes: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", STANDARD.encode(bytes))
}
