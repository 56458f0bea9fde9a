mod common;

use axum::http::StatusCode;
use common::*;
use flashcard_vault::entities::prelude::*;
use flashcard_vault::utils::auth::{create_jwt, create_jwt_with_expiry};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_register_and_login() {
    let (app, db) = setup_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Alice", "email": "  Alice@Example.com ", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let stored = Users::find().all(&db).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0].password_hash, "pw123");

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["name"], "Alice");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let (app, _db) = setup_app().await;
    register_and_login(&app, "alice@example.com", "pw123").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Other", "email": "ALICE@example.com", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn test_register_store_failure_is_internal_error() {
    let (app, db) = setup_app().await;
    db.execute_unprepared(
        "CREATE TRIGGER fail_user_insert BEFORE INSERT ON users \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .await
    .unwrap();

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Alice", "email": "alice@example.com", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");
    assert!(Users::find().all(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_validates_input() {
    let (app, _db) = setup_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": " ", "email": "not-an-email", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("email"));
    assert!(error.contains("name"));

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "a@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON payload"));
}

#[tokio::test]
async fn test_login_with_wrong_credentials() {
    let (app, _db) = setup_app().await;
    register_and_login(&app, "alice@example.com", "pw123").await;

    for (email, password) in [
        ("alice@example.com", "wrong"),
        ("nobody@example.com", "pw123"),
    ] {
        let (status, body) = send_json(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_verify_status_codes() {
    let (app, _db) = setup_app().await;
    let token = register_and_login(&app, "alice@example.com", "pw123").await;

    let (status, body) = send_json(&app, "GET", "/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token is valid");
    assert!(!body["user_id"].as_str().unwrap().is_empty());

    // No credential at all
    let (status, _) = send_json(&app, "GET", "/auth/verify", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Header without a bearer token
    let response = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .uri("/auth/verify")
                .header("Authorization", "Bearer ")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Garbage, wrong secret, expired
    let (status, _) = send_json(&app, "GET", "/auth/verify", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let forged = create_jwt("someone", "another_secret", chrono::Duration::hours(1)).unwrap();
    let (status, _) = send_json(&app, "GET", "/auth/verify", Some(&forged), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let expired = create_jwt_with_expiry(
        "someone",
        TEST_SECRET,
        chrono::Utc::now() - chrono::Duration::minutes(1),
    )
    .unwrap();
    let (status, body) = send_json(&app, "GET", "/auth/verify", Some(&expired), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Token has expired");
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let (app, db) = setup_app().await;
    let token = register_and_login(&app, "alice@example.com", "pw123").await;
    let other = register_and_login(&app, "bob@example.com", "pw456").await;

    let workspace = create_workspace(
        &app,
        &token,
        json!({ "title": "Biology", "description": "Ch.1" }),
    )
    .await;
    create_workspace(
        &app,
        &other,
        json!({ "title": "History", "description": "Rome" }),
    )
    .await;
    let (status, _) = send_json(
        &app,
        "POST",
        "/flashcards",
        Some(&token),
        Some(json!({ "question": "q", "answer": "a", "workspace_id": workspace["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&app, "DELETE", "/auth/delete", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Account deleted successfully");

    assert_eq!(Users::find().all(&db).await.unwrap().len(), 1);
    assert_eq!(Workspaces::find().all(&db).await.unwrap().len(), 1);
    assert!(Flashcards::find().all(&db).await.unwrap().is_empty());

    // The token is still well-formed, but the account is gone
    let (status, _) = send_json(&app, "DELETE", "/auth/delete", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_json(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _db) = setup_app().await;
    let (status, body) = send_json(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}
