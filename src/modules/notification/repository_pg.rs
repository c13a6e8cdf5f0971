use uuid::Uuid;

use crate::{
    api::error,
    modules::notification::{
        repository::NotificationRepository,
        schema::{NotificationEntity, NotificationKind},
    },
};

#[derive(Clone)]
pub struct NotificationRepositoryPg {
    pool: sqlx::PgPool,
}

impl NotificationRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NotificationRepository for NotificationRepositoryPg {
    async fn append(
        &self,
        recipient_id: &Uuid,
        kind: NotificationKind,
        actor_id: &Uuid,
        message: &str,
        link: &str,
    ) -> Result<NotificationEntity, error::SystemError> {
        let notification = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (user_id, kind, actor_id, message, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(recipient_id)
        .bind(kind)
        .bind(actor_id)
        .bind(message)
        .bind(link)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }
}
