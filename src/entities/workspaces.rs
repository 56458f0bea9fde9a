use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A workspace row. The reference PDF lives inline in the `pdf_*` columns;
/// `pdf_data` being `None` means the workspace has no attachment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workspaces")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub pdf_name: Option<String>,
    #[serde(skip)]
    pub pdf_data: Option<Vec<u8>>,
    pub pdf_content_type: Option<String>,
    pub pdf_size: Option<i64>,
    pub pdf_checksum: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::flashcards::Entity")]
    Flashcards,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::flashcards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flashcards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn has_pdf(&self) -> bool {
        self.pdf_data.is_some()
    }
}
