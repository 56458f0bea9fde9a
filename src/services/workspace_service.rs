use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::{flashcards, prelude::*, workspaces};
use crate::services::scope::{WorkspaceSummary, find_owned};
use crate::utils::hash::calculate_hash;
use crate::utils::validation::{DecodedPdf, ensure_not_blank};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

pub struct NewWorkspace {
    pub title: String,
    pub description: String,
    pub pdf: Option<DecodedPdf>,
}

/// What an update does to the attachment.
#[derive(Debug, Default)]
pub enum PdfChange {
    #[default]
    Keep,
    Replace(DecodedPdf),
    Remove,
}

#[derive(Debug, Default)]
pub struct WorkspaceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pdf: PdfChange,
}

/// Attachment bytes as they are streamed back to the owner
#[derive(Debug, Clone)]
pub struct StoredPdf {
    pub name: String,
    pub content_type: String,
    pub checksum: Option<String>,
    pub data: Vec<u8>,
}

pub struct WorkspaceService {
    db: DatabaseConnection,
    config: AppConfig,
}

impl WorkspaceService {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self { db, config }
    }

    pub fn max_pdf_size(&self) -> usize {
        self.config.max_pdf_size
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<WorkspaceSummary>, AppError> {
        let workspaces = Workspaces::find()
            .filter(workspaces::Column::UserId.eq(owner_id))
            .order_by_asc(workspaces::Column::CreatedAt)
            .order_by_asc(workspaces::Column::Id)
            .into_partial_model::<WorkspaceSummary>()
            .all(&self.db)
            .await?;
        Ok(workspaces)
    }

    pub async fn create(
        &self,
        owner_id: &str,
        input: NewWorkspace,
    ) -> Result<WorkspaceSummary, AppError> {
        ensure_not_blank("title", &input.title)?;
        ensure_not_blank("description", &input.description)?;

        let now = Utc::now();
        let mut workspace = workspaces::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(owner_id.to_string()),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description.trim().to_string()),
            pdf_name: Set(None),
            pdf_data: Set(None),
            pdf_content_type: Set(None),
            pdf_size: Set(None),
            pdf_checksum: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        if let Some(pdf) = input.pdf {
            attach(&mut workspace, pdf);
        }

        let model = workspace.insert(&self.db).await?;
        info!(
            "📚 Workspace {} created for user {} (pdf: {})",
            model.id,
            owner_id,
            model.has_pdf()
        );

        Ok(model.into())
    }

    pub async fn update(
        &self,
        owner_id: &str,
        workspace_id: &str,
        changes: WorkspaceChanges,
    ) -> Result<WorkspaceSummary, AppError> {
        if let Some(title) = &changes.title {
            ensure_not_blank("title", title)?;
        }
        if let Some(description) = &changes.description {
            ensure_not_blank("description", description)?;
        }

        let mut workspace = workspaces::ActiveModel {
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(title) = changes.title {
            workspace.title = Set(title.trim().to_string());
        }
        if let Some(description) = changes.description {
            workspace.description = Set(description.trim().to_string());
        }
        match changes.pdf {
            PdfChange::Keep => {}
            PdfChange::Replace(pdf) => attach(&mut workspace, pdf),
            PdfChange::Remove => detach(&mut workspace),
        }

        // Ownership is part of the UPDATE itself; the blob is never read back
        let result = Workspaces::update_many()
            .set(workspace)
            .filter(workspaces::Column::Id.eq(workspace_id))
            .filter(workspaces::Column::UserId.eq(owner_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Workspace not found".to_string()));
        }

        find_owned(&self.db, workspace_id, owner_id).await
    }

    /// Removes the workspace and every flashcard in it.
    pub async fn delete(&self, owner_id: &str, workspace_id: &str) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        find_owned(&txn, workspace_id, owner_id).await?;
        let removed = delete_with_flashcards(&txn, &[workspace_id.to_string()]).await?;

        txn.commit().await?;

        info!(
            "🗑️  Workspace {} deleted with {} flashcard(s)",
            workspace_id, removed
        );
        Ok(())
    }

    pub async fn get_pdf(&self, owner_id: &str, workspace_id: &str) -> Result<StoredPdf, AppError> {
        let workspace = Workspaces::find_by_id(workspace_id)
            .filter(workspaces::Column::UserId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Workspace not found".to_string()))?;

        let data = workspace
            .pdf_data
            .ok_or_else(|| AppError::NotFound("Workspace has no reference PDF".to_string()))?;

        Ok(StoredPdf {
            name: workspace
                .pdf_name
                .unwrap_or_else(|| "reference.pdf".to_string()),
            content_type: workspace
                .pdf_content_type
                .unwrap_or_else(|| crate::utils::validation::PDF_MIME_TYPE.to_string()),
            checksum: workspace.pdf_checksum,
            data,
        })
    }
}

/// Deletes every workspace owned by `owner_id` along with their flashcards.
/// Meant to run inside the caller's transaction.
pub async fn delete_all_for_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
) -> Result<usize, AppError> {
    let ids: Vec<String> = Workspaces::find()
        .select_only()
        .column(workspaces::Column::Id)
        .filter(workspaces::Column::UserId.eq(owner_id))
        .into_tuple()
        .all(db)
        .await?;

    if ids.is_empty() {
        return Ok(0);
    }

    delete_with_flashcards(db, &ids).await?;
    Ok(ids.len())
}

async fn delete_with_flashcards<C: ConnectionTrait>(
    db: &C,
    workspace_ids: &[String],
) -> Result<u64, AppError> {
    let cards = Flashcards::delete_many()
        .filter(flashcards::Column::WorkspaceId.is_in(workspace_ids.iter().cloned()))
        .exec(db)
        .await?;

    Workspaces::delete_many()
        .filter(workspaces::Column::Id.is_in(workspace_ids.iter().cloned()))
        .exec(db)
        .await?;

    Ok(cards.rows_affected)
}

fn attach(workspace: &mut workspaces::ActiveModel, pdf: DecodedPdf) {
    workspace.pdf_checksum = Set(Some(calculate_hash(&pdf.data)));
    workspace.pdf_size = Set(Some(pdf.data.len() as i64));
    workspace.pdf_name = Set(Some(pdf.name));
    workspace.pdf_content_type = Set(Some(pdf.content_type));
    workspace.pdf_data = Set(Some(pdf.data));
}

fn detach(workspace: &mut workspaces::ActiveModel) {
    workspace.pdf_name = Set(None);
    workspace.pdf_data = Set(None);
    workspace.pdf_content_type = Set(None);
    workspace.pdf_size = Set(None);
    workspace.pdf_checksum = Set(None);
}
