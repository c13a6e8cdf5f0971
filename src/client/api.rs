use uuid::Uuid;

use crate::modules::relationship::model::DerivedStatus;

/// Outcome split the engine cares about: both kinds roll the optimistic state
/// back, neither is retried automatically.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Terminal rejection (invalid target, not found, conflict).
    #[error("request rejected: {0}")]
    Rejected(String),
    /// Transport or server failure; fail closed.
    #[error("transient failure: {0}")]
    Transient(String),
}

/// Network port for the six relationship calls. Every call returns the
/// authoritative derived status for the (viewer, target) key.
#[async_trait::async_trait]
pub trait RelationshipApi: Send + Sync {
    async fn request(&self, target: Uuid) -> Result<DerivedStatus, ApiError>;
    async fn cancel(&self, target: Uuid) -> Result<DerivedStatus, ApiError>;
    async fn accept(&self, target: Uuid) -> Result<DerivedStatus, ApiError>;
    async fn decline(&self, target: Uuid) -> Result<DerivedStatus, ApiError>;
    async fn unfriend(&self, target: Uuid) -> Result<DerivedStatus, ApiError>;
    async fn status(&self, target: Uuid) -> Result<DerivedStatus, ApiError>;
}
