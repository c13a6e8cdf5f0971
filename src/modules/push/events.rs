/// Actor messages exchanged between session actors and the push server actor.
use actix::prelude::*;
use uuid::Uuid;

use super::message::RelationshipEvent;
use super::session::PushSession;

/// A new socket connected.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: Uuid,
    pub addr: Addr<PushSession>,
}

/// A socket disconnected.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: Uuid,
}

/// A session authenticated as an account and subscribes to its channel.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Authenticate {
    pub session_id: Uuid,
    pub user_id: Uuid,
}

/// Fan a relationship-change event out to its participants: targeted delivery
/// to every session of each participant, plus a best-effort broadcast carrying
/// the target id for sessions not yet subscribed.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct PublishRelationship {
    pub event: RelationshipEvent,
}
