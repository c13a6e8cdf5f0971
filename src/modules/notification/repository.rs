use uuid::Uuid;

use crate::api::error;
use crate::modules::notification::schema::{NotificationEntity, NotificationKind};

/// Append-only interface to the notification collaborator's feed. Rendering and
/// read-tracking belong to that collaborator; the relationship service only
/// appends, and only to the recipient.
#[async_trait::async_trait]
pub trait NotificationRepository {
    async fn append(
        &self,
        recipient_id: &Uuid,
        kind: NotificationKind,
        actor_id: &Uuid,
        message: &str,
        link: &str,
    ) -> Result<NotificationEntity, error::SystemError>;
}
