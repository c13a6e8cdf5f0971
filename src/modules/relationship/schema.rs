use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, PartialEq, Clone, Type, Serialize, Deserialize)]
#[sqlx(type_name = "relationship_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    Pending,
    Accepted,
}

/// Canonical store record: at most one row per unordered account pair.
/// `(user_low, user_high)` is the sorted pair key and carries the UNIQUE
/// constraint that arbitrates concurrent writes. Direction columns are both set
/// and distinct while pending, both NULL once accepted. Decline, cancel and
/// unfriend delete the row; there is no rejected tombstone.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RelationshipEntity {
    pub id: Uuid,
    pub user_low: Uuid,
    pub user_high: Uuid,
    pub status: RelationshipStatus,
    pub requested_by: Option<Uuid>,
    pub requested_to: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
