use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::relationship::schema::{RelationshipEntity, RelationshipStatus};
use crate::modules::user::schema::PublicUser;

/// Order-independent identifier for an unordered account pair. Always stores
/// the smaller id in `low`. The two ids must be distinct; callers reject
/// self-reference before building a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    low: Uuid,
    high: Uuid,
}

impl PairKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }
}

/// Relationship state as seen from one account's viewpoint. Not persisted;
/// computed per viewer from the stored record.
///
/// `rank()` defines the lattice used for client-side race arbitration:
/// none < pending = incoming < friends < self. Pending and incoming share a
/// rank but are mutually exclusive for a healthy server (crossed requests
/// resolve to accepted before either side can observe both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedStatus {
    #[serde(rename = "self")]
    Myself,
    None,
    Pending,
    Incoming,
    Friends,
}

impl DerivedStatus {
    pub fn rank(&self) -> u8 {
        match self {
            DerivedStatus::None => 0,
            DerivedStatus::Pending | DerivedStatus::Incoming => 1,
            DerivedStatus::Friends => 2,
            DerivedStatus::Myself => 3,
        }
    }

    pub fn derive(viewer: &Uuid, target: &Uuid, record: Option<&RelationshipEntity>) -> Self {
        if viewer == target {
            return DerivedStatus::Myself;
        }
        let Some(rel) = record else {
            return DerivedStatus::None;
        };
        match rel.status {
            RelationshipStatus::Accepted => DerivedStatus::Friends,
            RelationshipStatus::Pending => {
                if rel.requested_by == Some(*viewer) {
                    DerivedStatus::Pending
                } else if rel.requested_to == Some(*viewer) {
                    DerivedStatus::Incoming
                } else {
                    DerivedStatus::None
                }
            }
        }
    }
}

/// Target of an operation: either a resolved account id or a username to be
/// resolved through the identity-lookup collaborator.
#[derive(Debug, Clone)]
pub enum TargetRef {
    Id(Uuid),
    Username(String),
}

impl TargetRef {
    pub fn from_parts(id: Option<Uuid>, username: Option<String>) -> Option<Self> {
        match (id, username) {
            (Some(id), _) => Some(TargetRef::Id(id)),
            (None, Some(name)) => Some(TargetRef::Username(name)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: DerivedStatus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RelationshipCounts {
    pub incoming: i64,
    pub outgoing: i64,
    pub friends: i64,
}

/// Joined row backing the incoming/outgoing/list reads.
#[derive(Debug, Clone, FromRow)]
pub struct RelationUserRow {
    pub id: Uuid,
    pub from_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationResponse {
    pub id: Uuid,
    pub from_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    pub user: PublicUser,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<RelationUserRow> for RelationResponse {
    fn from(row: RelationUserRow) -> Self {
        RelationResponse {
            id: row.id,
            from_user_id: row.from_user_id,
            to_user_id: row.to_user_id,
            user: PublicUser {
                id: row.user_id,
                username: row.username,
                display_name: row.display_name,
                avatar_url: row.avatar_url,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 3, max = 32))]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub to_user_id: Option<Uuid>,
    #[validate(length(min = 3, max = 32))]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RespondBody {
    pub from_user_id: Option<Uuid>,
    #[validate(length(min = 3, max = 32))]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnfriendBody {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 3, max = 32))]
    pub username: Option<String>,
}
