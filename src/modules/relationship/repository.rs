use uuid::Uuid;

use crate::api::error;
use crate::modules::relationship::model::{PairKey, RelationUserRow, RelationshipCounts};
use crate::modules::relationship::schema::RelationshipEntity;

/// Store interface. Every mutation is a single conditional statement keyed by
/// the pair; the pair-key uniqueness constraint is the only concurrency
/// primitive. Methods return the affected row (or None when the condition did
/// not match) so the service can decide between event emission and the
/// idempotent no-op path.
#[async_trait::async_trait]
pub trait RelationshipRepository {
    async fn find_by_pair(
        &self,
        pair: &PairKey,
    ) -> Result<Option<RelationshipEntity>, error::SystemError>;

    /// Insert a pending record unless the pair already has one.
    async fn try_create_pending(
        &self,
        pair: &PairKey,
        requester: &Uuid,
        recipient: &Uuid,
    ) -> Result<Option<RelationshipEntity>, error::SystemError>;

    /// Flip pending -> accepted and clear direction, only when the pending
    /// request is addressed to `viewer`.
    async fn accept_pending_addressed_to(
        &self,
        pair: &PairKey,
        viewer: &Uuid,
    ) -> Result<Option<RelationshipEntity>, error::SystemError>;

    /// Delete the pending record, only when `viewer` is the requester.
    async fn delete_pending_requested_by(
        &self,
        pair: &PairKey,
        viewer: &Uuid,
    ) -> Result<Option<RelationshipEntity>, error::SystemError>;

    /// Delete the pending record, only when it is addressed to `viewer`.
    async fn delete_pending_addressed_to(
        &self,
        pair: &PairKey,
        viewer: &Uuid,
    ) -> Result<Option<RelationshipEntity>, error::SystemError>;

    /// Delete the accepted record for the pair.
    async fn delete_accepted(
        &self,
        pair: &PairKey,
    ) -> Result<Option<RelationshipEntity>, error::SystemError>;

    async fn counts(&self, user_id: &Uuid) -> Result<RelationshipCounts, error::SystemError>;

    async fn incoming_for(&self, user_id: &Uuid)
        -> Result<Vec<RelationUserRow>, error::SystemError>;

    async fn outgoing_for(&self, user_id: &Uuid)
        -> Result<Vec<RelationUserRow>, error::SystemError>;

    async fn friends_for(&self, user_id: &Uuid)
        -> Result<Vec<RelationUserRow>, error::SystemError>;
}
