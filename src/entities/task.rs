use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Descriptor of an image attached to a note, as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub thumb_base64: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// A note embedded in a task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub images_info: Vec<ImageInfo>,
}

/// Ordered notes of a task, stored as a single JSON column.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
pub struct NoteList(pub Vec<Note>);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub content: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub is_archived: bool,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub notes: NoteList,
    /// Local changes not yet confirmed by the server.
    pub is_dirty: bool,
    /// Deletion requested locally, pending server confirmation.
    pub is_deleted: bool,
    /// Local write counter. Every upsert over an existing row bumps it, so a
    /// snapshot can tell whether the row was rewritten since it was read.
    #[serde(default)]
    pub revision: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Clean: nothing to push.
    pub fn is_clean(&self) -> bool {
        !self.is_dirty && !self.is_deleted
    }

    /// Still waiting on the server, either for a create/update or a delete.
    pub fn is_pending(&self) -> bool {
        self.is_dirty || self.is_deleted
    }
}
