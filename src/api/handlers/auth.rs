use crate::AppState;
use crate::api::error::AppError;
use crate::entities::{prelude::*, users};
use crate::services::workspace_service::delete_all_for_owner;
use crate::utils::auth::{Claims, create_jwt, hash_password, verify_password};
use crate::utils::validation::not_blank;
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct VerifyResponse {
    pub message: String,
    pub user_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Invalid input or email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let email = normalize_email(&payload.email);

    let existing = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    let password_hash =
        hash_password(&payload.password).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now()),
    };

    // The unique index still guards against a concurrent registration
    let user = user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Validation("Email already registered".to_string())
        }
        _ => AppError::Database(e),
    })?;

    info!("👤 User {} registered", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let user = Users::find()
        .filter(users::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!("Failed login attempt for user {}", user.id);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let ttl = chrono::Duration::try_hours(state.config.token_ttl_hours)
        .ok_or_else(|| AppError::Internal("Token lifetime out of range".to_string()))?;
    let token = create_jwt(&user.id, &state.config.jwt_secret, ttl)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "No token provided"),
        (status = 403, description = "Invalid or expired token")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "auth"
)]
pub async fn verify(Extension(claims): Extension<Claims>) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        message: "Token is valid".to_string(),
        user_id: claims.sub,
    })
}

/// Deletes the caller's account together with all of their workspaces and
/// flashcards.
#[utoipa::path(
    delete,
    path = "/auth/delete",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "No token provided"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "User not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "auth"
)]
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;

    let user = Users::find_by_id(&claims.sub)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let workspaces = delete_all_for_owner(&txn, &user.id).await?;
    Users::delete_by_id(&user.id).exec(&txn).await?;

    txn.commit().await?;

    info!(
        "👋 User {} deleted along with {} workspace(s)",
        user.id, workspaces
    );

    Ok(MessageResponse::new("Account deleted successfully"))
}
