//! Task repository for database operations.

use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::task;

/// Repository for task-related database operations.
pub struct TaskRepository;

impl TaskRepository {
    /// Get all tasks that are not tombstoned, newest first.
    pub async fn get_visible<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::IsDeleted.eq(false))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_asc(task::Column::Id)
            .all(conn)
            .await?)
    }

    /// Get a single task by id, tombstoned or not.
    pub async fn get_by_id<C>(conn: &C, id: &str) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find_by_id(id.to_string()).one(conn).await?)
    }

    /// Get every task with unpushed changes, including tombstones marked dirty.
    pub async fn get_dirty<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::IsDirty.eq(true))
            .order_by_asc(task::Column::CreatedAt)
            .order_by_asc(task::Column::Id)
            .all(conn)
            .await?)
    }

    /// Get every tombstoned task.
    pub async fn get_tombstoned<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::IsDeleted.eq(true))
            .order_by_asc(task::Column::Id)
            .all(conn)
            .await?)
    }

    /// Insert or fully replace a task by id in a single statement.
    ///
    /// Replacing an existing row bumps its `revision`.
    pub async fn upsert<C>(conn: &C, model: task::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        task::Entity::insert(Self::to_active_model(model))
            .on_conflict(Self::replace_on_conflict())
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Insert or replace a task unless the stored copy is dirty or tombstoned.
    ///
    /// The check and the write are one `INSERT .. ON CONFLICT .. DO UPDATE ..
    /// WHERE` statement. Returns whether a row was written.
    pub async fn upsert_if_clean<C>(conn: &C, model: task::Model) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let written = task::Entity::insert(Self::to_active_model(model))
            .on_conflict(
                Self::replace_on_conflict()
                    .action_and_where(
                        Expr::col((task::Entity, task::Column::IsDirty))
                            .eq(false)
                            .and(Expr::col((task::Entity, task::Column::IsDeleted)).eq(false)),
                    )
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(written > 0)
    }

    /// Clear `is_dirty` on a live task, but only if its `revision` still
    /// matches. Returns whether the flag was cleared.
    pub async fn mark_clean_if_unchanged<C>(conn: &C, id: &str, revision: i64) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let result = task::Entity::update_many()
            .col_expr(task::Column::IsDirty, Expr::value(false))
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Revision.eq(revision))
            .filter(task::Column::IsDirty.eq(true))
            .filter(task::Column::IsDeleted.eq(false))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Physically remove a task. Returns whether a row was removed.
    pub async fn purge<C>(conn: &C, id: &str) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let result = task::Entity::delete_by_id(id.to_string()).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Remove every task.
    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::delete_many().exec(conn).await?.rows_affected)
    }

    fn replace_on_conflict() -> OnConflict {
        OnConflict::column(task::Column::Id)
            .update_columns([
                task::Column::Title,
                task::Column::Category,
                task::Column::Content,
                task::Column::Priority,
                task::Column::StartDate,
                task::Column::DueDate,
                task::Column::IsArchived,
                task::Column::Completed,
                task::Column::CompletedAt,
                task::Column::CreatedAt,
                task::Column::UpdatedAt,
                task::Column::Notes,
                task::Column::IsDirty,
                task::Column::IsDeleted,
            ])
            .value(
                task::Column::Revision,
                Expr::col((task::Entity, task::Column::Revision)).add(1),
            )
            .to_owned()
    }

    fn to_active_model(model: task::Model) -> task::ActiveModel {
        task::ActiveModel {
            id: ActiveValue::Set(model.id),
            title: ActiveValue::Set(model.title),
            category: ActiveValue::Set(model.category),
            content: ActiveValue::Set(model.content),
            priority: ActiveValue::Set(model.priority),
            start_date: ActiveValue::Set(model.start_date),
            due_date: ActiveValue::Set(model.due_date),
            is_archived: ActiveValue::Set(model.is_archived),
            completed: ActiveValue::Set(model.completed),
            completed_at: ActiveValue::Set(model.completed_at),
            created_at: ActiveValue::Set(model.created_at),
            updated_at: ActiveValue::Set(model.updated_at),
            notes: ActiveValue::Set(model.notes),
            is_dirty: ActiveValue::Set(model.is_dirty),
            is_deleted: ActiveValue::Set(model.is_deleted),
            revision: ActiveValue::Set(model.revision),
        }
    }
}
