use sqlx::types::Uuid;
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::db::error::DatabaseError;
use crate::db::models::{NewNotification, Notification, NotificationType};

pub struct NotificationRepository;

impl NotificationRepository {
    /// Appends a notification inside the caller's transaction so the event
    /// and the write that caused it commit together.
    pub async fn create_tx(
        tx: &mut Transaction<'_, Sqlite>,
        data: &NewNotification,
    ) -> Result<Notification, DatabaseError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications
                (id, notification_type, message, batch_id, trainer_id, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.notification_type)
        .bind(&data.message)
        .bind(data.batch_id)
        .bind(data.trainer_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut **tx)
        .await?;
        Ok(notification)
    }

    pub async fn list(
        pool: &SqlitePool,
        unread_only: bool,
    ) -> Result<Vec<Notification>, DatabaseError> {
        let query = if unread_only {
            "SELECT * FROM notifications WHERE is_read = 0 ORDER BY created_at DESC"
        } else {
            "SELECT * FROM notifications ORDER BY created_at DESC"
        };
        let notifications = sqlx::query_as::<_, Notification>(query)
            .fetch_all(pool)
            .await?;
        Ok(notifications)
    }

    pub async fn mark_read(pool: &SqlitePool, id: Uuid) -> Result<Notification, DatabaseError> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = 1, read_at = ? WHERE id = ? RETURNING *",
        )
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;
        Ok(notification)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    /// Dedup check for batch-scoped reminders: an unread one of the same type
    /// for the same batch suppresses a new append.
    pub async fn exists_unread_for_batch_tx(
        tx: &mut Transaction<'_, Sqlite>,
        batch_id: Uuid,
        notification_type: NotificationType,
    ) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM notifications
                WHERE batch_id = ? AND notification_type = ? AND is_read = 0
            )
            "#,
        )
        .bind(batch_id)
        .bind(notification_type)
        .fetch_one(&mut **tx)
        .await?;
        Ok(exists)
    }
}
