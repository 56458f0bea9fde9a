//! Owner-scoped lookups. Every read-sensitive or mutating operation resolves
//! its target through these functions; a record owned by someone else is
//! reported exactly like a missing one.

use crate::api::error::AppError;
use crate::entities::{flashcards, prelude::*, workspaces};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DerivePartialModel, EntityTrait, FromQueryResult, QueryFilter,
};

/// A workspace row without the attachment bytes.
#[derive(Debug, Clone, PartialEq, DerivePartialModel, FromQueryResult)]
#[sea_orm(entity = "Workspaces")]
pub struct WorkspaceSummary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub pdf_name: Option<String>,
    pub pdf_content_type: Option<String>,
    pub pdf_size: Option<i64>,
    pub pdf_checksum: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceSummary {
    pub fn has_pdf(&self) -> bool {
        self.pdf_size.is_some()
    }
}

impl From<workspaces::Model> for WorkspaceSummary {
    fn from(model: workspaces::Model) -> Self {
        let pdf_size = model
            .pdf_data
            .as_ref()
            .map(|data| model.pdf_size.unwrap_or(data.len() as i64));
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            pdf_name: model.pdf_name,
            pdf_content_type: model.pdf_content_type,
            pdf_size,
            pdf_checksum: model.pdf_checksum,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub async fn find_owned<C: ConnectionTrait>(
    db: &C,
    workspace_id: &str,
    owner_id: &str,
) -> Result<WorkspaceSummary, AppError> {
    Workspaces::find_by_id(workspace_id)
        .filter(workspaces::Column::UserId.eq(owner_id))
        .into_partial_model::<WorkspaceSummary>()
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Workspace not found".to_string()))
}

/// Resolves a card, then its workspace through [`find_owned`].
pub async fn find_owned_flashcard<C: ConnectionTrait>(
    db: &C,
    card_id: &str,
    owner_id: &str,
) -> Result<flashcards::Model, AppError> {
    let not_found = || AppError::NotFound("Flashcard not found".to_string());

    let card = Flashcards::find_by_id(card_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;

    match find_owned(db, &card.workspace_id, owner_id).await {
        Ok(_) => Ok(card),
        Err(AppError::NotFound(_)) => {
            tracing::warn!(
                "Flashcard {} requested by non-owner {}",
                card_id,
                owner_id
            );
            Err(not_found())
        }
        Err(e) => Err(e),
    }
}
