use crate::api::error::AppError;
use crate::entities::{flashcards, prelude::*, workspaces};
use crate::services::scope::{find_owned, find_owned_flashcard};
use crate::utils::validation::ensure_not_blank;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct FlashcardChanges {
    pub question: Option<String>,
    pub answer: Option<String>,
}

/// Flashcard operations. Each one resolves the parent workspace against the
/// caller before touching any card.
pub struct FlashcardService {
    db: DatabaseConnection,
}

impl FlashcardService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_by_workspace(
        &self,
        owner_id: &str,
        workspace_id: &str,
    ) -> Result<Vec<flashcards::Model>, AppError> {
        // A missing or foreign workspace simply has no visible cards
        let cards = Flashcards::find()
            .inner_join(Workspaces)
            .filter(flashcards::Column::WorkspaceId.eq(workspace_id))
            .filter(workspaces::Column::UserId.eq(owner_id))
            .order_by_asc(flashcards::Column::CreatedAt)
            .order_by_asc(flashcards::Column::Id)
            .all(&self.db)
            .await?;
        Ok(cards)
    }

    pub async fn create(
        &self,
        owner_id: &str,
        workspace_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<flashcards::Model, AppError> {
        ensure_not_blank("question", question)?;
        ensure_not_blank("answer", answer)?;

        let workspace = find_owned(&self.db, workspace_id, owner_id).await?;

        let now = Utc::now();
        let card = flashcards::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            workspace_id: Set(workspace.id),
            question: Set(question.trim().to_string()),
            answer: Set(answer.trim().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            "🃏 Flashcard {} added to workspace {}",
            card.id, card.workspace_id
        );
        Ok(card)
    }

    pub async fn update(
        &self,
        owner_id: &str,
        card_id: &str,
        changes: FlashcardChanges,
    ) -> Result<flashcards::Model, AppError> {
        if let Some(question) = &changes.question {
            ensure_not_blank("question", question)?;
        }
        if let Some(answer) = &changes.answer {
            ensure_not_blank("answer", answer)?;
        }

        let card = find_owned_flashcard(&self.db, card_id, owner_id).await?;

        let mut active = card.into_active_model();
        if let Some(question) = changes.question {
            active.question = Set(question.trim().to_string());
        }
        if let Some(answer) = changes.answer {
            active.answer = Set(answer.trim().to_string());
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, owner_id: &str, card_id: &str) -> Result<(), AppError> {
        let card = find_owned_flashcard(&self.db, card_id, owner_id).await?;
        card.delete(&self.db).await?;

        info!("🗑️  Flashcard {} deleted", card_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::users;
    use crate::infrastructure::database::setup_database;

    async fn setup() -> FlashcardService {
        let db = setup_database("sqlite::memory:").await.unwrap();
        for id in ["owner", "intruder"] {
            users::ActiveModel {
                id: Set(id.to_string()),
                name: Set(id.to_string()),
                email: Set(format!("{}@example.com", id)),
                password_hash: Set("x".to_string()),
                created_at: Set(Utc::now()),
            }
            .insert(&db)
            .await
            .unwrap();
        }
        workspaces::ActiveModel {
            id: Set("ws".to_string()),
            user_id: Set("owner".to_string()),
            title: Set("Biology".to_string()),
            description: Set("Ch.1".to_string()),
            pdf_name: Set(None),
            pdf_data: Set(None),
            pdf_content_type: Set(None),
            pdf_size: Set(None),
            pdf_checksum: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        }
        .insert(&db)
        .await
        .unwrap();
        FlashcardService::new(db)
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let service = setup().await;
        let card = service
            .create("owner", "ws", "What is a cell?", "Basic unit of life")
            .await
            .unwrap();

        let cards = service.list_by_workspace("owner", "ws").await.unwrap();
        assert_eq!(cards, vec![card]);
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let service = setup().await;
        assert!(matches!(
            service.create("owner", "ws", "", "a").await,
            Err(AppError::Validation(_))
        ));

        let card = service.create("owner", "ws", "q", "a").await.unwrap();
        let err = service
            .update(
                "owner",
                &card.id,
                FlashcardChanges {
                    answer: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_other_users_cannot_touch_cards() {
        let service = setup().await;
        let card = service.create("owner", "ws", "q", "a").await.unwrap();

        assert!(service.list_by_workspace("intruder", "ws").await.unwrap().is_empty());
        assert!(service.list_by_workspace("owner", "missing").await.unwrap().is_empty());
        assert!(matches!(
            service.create("intruder", "ws", "q", "a").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update("intruder", &card.id, FlashcardChanges::default())
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete("intruder", &card.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_preserves_omitted_fields() {
        let service = setup().await;
        let card = service.create("owner", "ws", "q", "a").await.unwrap();
        let updated = service
            .update(
                "owner",
                &card.id,
                FlashcardChanges {
                    question: Some("new q".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.question, "new q");
        assert_eq!(updated.answer, "a");
        assert_eq!(updated.workspace_id, "ws");
    }

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let service = setup().await;
        let card = service.create("owner", "ws", "q", "a").await.unwrap();

        service.delete("owner", &card.id).await.unwrap();
        assert!(matches!(
            service.delete("owner", &card.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
