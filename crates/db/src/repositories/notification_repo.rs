//! Repository for the `notifications` queue.
//!
//! The evaluation engine only ever enqueues; the sent flag and retry
//! count belong to the external dispatcher.

use sentra_core::signal::NewNotification;

/// Column list for `notifications` INSERT (sent/retry_count default in
/// the schema).
const INSERT_COLUMNS: &str = "tenant_id, signal_id, channel_type, recipient, subject, body";

/// Provides enqueue operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Enqueue one notification inside the cycle transaction.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        notification: &NewNotification,
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6)"
        );
        sqlx::query(&query)
            .bind(notification.tenant_id)
            .bind(notification.signal_id)
            .bind(notification.channel_type.to_string())
            .bind(&notification.recipient)
            .bind(&notification.subject)
            .bind(&notification.body)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
