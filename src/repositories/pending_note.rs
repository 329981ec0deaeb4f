//! Pending note repository for database operations.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use crate::entities::pending_note;

/// Repository for the offline note queue.
pub struct PendingNoteRepository;

impl PendingNoteRepository {
    /// Queue a note, replacing any queued note with the same id.
    pub async fn enqueue<C>(conn: &C, note: pending_note::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let active = pending_note::ActiveModel {
            id: ActiveValue::Set(note.id),
            task_id: ActiveValue::Set(note.task_id),
            content: ActiveValue::Set(note.content),
            attachments: ActiveValue::Set(note.attachments),
            queued_at: ActiveValue::Set(note.queued_at),
        };

        pending_note::Entity::insert(active)
            .on_conflict(
                OnConflict::column(pending_note::Column::Id)
                    .update_columns([
                        pending_note::Column::TaskId,
                        pending_note::Column::Content,
                        pending_note::Column::Attachments,
                        pending_note::Column::QueuedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Get all queued notes in the order they were authored.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<pending_note::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(pending_note::Entity::find()
            .order_by_asc(pending_note::Column::QueuedAt)
            .order_by_asc(pending_note::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn count<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(pending_note::Entity::find().count(conn).await?)
    }

    /// Drop a note from the queue. Returns whether a row was removed.
    pub async fn remove<C>(conn: &C, id: &str) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let result = pending_note::Entity::delete_by_id(id.to_string()).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Drop every queued note of one task.
    pub async fn remove_for_task<C>(conn: &C, task_id: &str) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(pending_note::Entity::delete_many()
            .filter(pending_note::Column::TaskId.eq(task_id))
            .exec(conn)
            .await?
            .rows_affected)
    }

    /// Empty the queue.
    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(pending_note::Entity::delete_many().exec(conn).await?.rows_affected)
    }
}
