use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::auth::MessageResponse;
use crate::entities::flashcards;
use crate::services::flashcard_service::FlashcardChanges;
use crate::utils::auth::Claims;
use crate::utils::validation::not_blank;
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateFlashcardRequest {
    #[validate(custom(function = "not_blank"))]
    pub question: String,
    #[validate(custom(function = "not_blank"))]
    pub answer: String,
    #[serde(alias = "workspaceId")]
    #[validate(custom(function = "not_blank"))]
    pub workspace_id: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateFlashcardRequest {
    #[validate(custom(function = "not_blank"))]
    pub question: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub answer: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct FlashcardResponse {
    pub id: String,
    pub workspace_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<flashcards::Model> for FlashcardResponse {
    fn from(card: flashcards::Model) -> Self {
        Self {
            id: card.id,
            workspace_id: card.workspace_id,
            question: card.question,
            answer: card.answer,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/flashcards/{workspace_id}",
    params(
        ("workspace_id" = String, Path, description = "Workspace ID")
    ),
    responses(
        (status = 200, description = "Flashcards of the workspace, oldest first; empty for a workspace the caller does not own", body = Vec<FlashcardResponse>)
    ),
    security(
        ("jwt" = [])
    ),
    tag = "flashcards"
)]
pub async fn list_flashcards(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<FlashcardResponse>>, AppError> {
    let cards = state
        .flashcard_service
        .list_by_workspace(&claims.sub, &workspace_id)
        .await?;
    Ok(Json(cards.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/flashcards",
    request_body = CreateFlashcardRequest,
    responses(
        (status = 201, description = "Flashcard created", body = FlashcardResponse),
        (status = 400, description = "Blank question or answer"),
        (status = 404, description = "Workspace not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "flashcards"
)]
pub async fn create_flashcard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateFlashcardRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FlashcardResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let card = state
        .flashcard_service
        .create(
            &claims.sub,
            &payload.workspace_id,
            &payload.question,
            &payload.answer,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(card.into())))
}

#[utoipa::path(
    put,
    path = "/flashcards/{id}",
    params(
        ("id" = String, Path, description = "Flashcard ID")
    ),
    request_body = UpdateFlashcardRequest,
    responses(
        (status = 200, description = "Flashcard updated", body = FlashcardResponse),
        (status = 400, description = "Blank question or answer"),
        (status = 404, description = "Flashcard not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "flashcards"
)]
pub async fn update_flashcard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateFlashcardRequest>, JsonRejection>,
) -> Result<Json<FlashcardResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let card = state
        .flashcard_service
        .update(
            &claims.sub,
            &id,
            FlashcardChanges {
                question: payload.question,
                answer: payload.answer,
            },
        )
        .await?;

    Ok(Json(card.into()))
}

#[utoipa::path(
    delete,
    path = "/flashcards/{id}",
    params(
        ("id" = String, Path, description = "Flashcard ID")
    ),
    responses(
        (status = 200, description = "Flashcard deleted", body = MessageResponse),
        (status = 404, description = "Flashcard not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "flashcards"
)]
pub async fn delete_flashcard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.flashcard_service.delete(&claims.sub, &id).await?;
    Ok(MessageResponse::new("Flashcard deleted successfully"))
}
