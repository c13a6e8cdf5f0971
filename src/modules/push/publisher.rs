use actix::Addr;

use super::events::PublishRelationship;
use super::message::RelationshipEvent;
use super::server::PushServer;

/// Seam between the relationship service and the push layer. Emission is
/// fire-and-forget and happens causally after the store mutation; a dropped
/// event is corrected by the next authoritative refresh on the client.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: RelationshipEvent);
}

pub struct PushPublisher {
    server: Addr<PushServer>,
}

impl PushPublisher {
    pub fn new(server: Addr<PushServer>) -> Self {
        Self { server }
    }
}

impl EventPublisher for PushPublisher {
    fn publish(&self, event: RelationshipEvent) {
        self.server.do_send(PublishRelationship { event });
    }
}
