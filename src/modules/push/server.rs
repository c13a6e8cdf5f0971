/// Push server actor.
///
/// Owns all connected sockets and the account -> sessions registry, and fans
/// relationship-change events out to subscribed sessions. Delivery is
/// fire-and-forget and at-least-once: every event goes to the targeted
/// per-account sessions and, as a fallback for sessions that connected but have
/// not authenticated yet, to every connected socket with an explicit target id.
use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::events::*;
use super::message::ServerMessage;
use super::session::PushSession;

pub struct PushServer {
    /// Map: session_id -> session actor address.
    sessions: HashMap<Uuid, Addr<PushSession>>,

    /// Map: user_id -> set of session_ids. One account can hold several open
    /// sessions (tabs, devices); all of them receive targeted events.
    users: HashMap<Uuid, HashSet<Uuid>>,
}

impl PushServer {
    pub fn new() -> Self {
        Self { sessions: HashMap::new(), users: HashMap::new() }
    }

    fn send_to_session(&self, session_id: &Uuid, message: ServerMessage) {
        if let Some(session_addr) = self.sessions.get(session_id) {
            session_addr.do_send(message);
        }
    }

    fn send_to_user(&self, user_id: &Uuid, message: ServerMessage) {
        if let Some(session_ids) = self.users.get(user_id) {
            for session_id in session_ids {
                self.send_to_session(session_id, message.clone());
            }
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for session_addr in self.sessions.values() {
            session_addr.do_send(message.clone());
        }
    }
}

impl Actor for PushServer {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Push server started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Push server stopped");
    }
}

impl Handler<Connect> for PushServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        tracing::debug!("New push session connected: {}", msg.id);
        self.sessions.insert(msg.id, msg.addr);
    }
}

impl Handler<Disconnect> for PushServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        tracing::debug!("Push session disconnected: {}", msg.id);

        self.sessions.remove(&msg.id);

        let mut user_to_remove: Option<Uuid> = None;
        for (&user_id, sessions) in self.users.iter_mut() {
            if sessions.remove(&msg.id) {
                if sessions.is_empty() {
                    user_to_remove = Some(user_id);
                }
                break;
            }
        }

        if let Some(user_id) = user_to_remove {
            self.users.remove(&user_id);
            tracing::info!("User {} fully disconnected (no more sessions)", user_id);
        }
    }
}

impl Handler<Authenticate> for PushServer {
    type Result = ();

    fn handle(&mut self, msg: Authenticate, _: &mut Context<Self>) {
        let sessions = self.users.entry(msg.user_id).or_default();
        sessions.insert(msg.session_id);

        tracing::info!(
            "User {} subscribed on session {} ({} active session(s))",
            msg.user_id,
            msg.session_id,
            sessions.len()
        );
    }
}

impl Handler<PublishRelationship> for PushServer {
    type Result = ();

    fn handle(&mut self, msg: PublishRelationship, _: &mut Context<Self>) {
        for target_user_id in msg.event.participants() {
            let frame =
                ServerMessage::Relationship { target_user_id, event: msg.event };

            // Targeted delivery to every subscribed session of the account,
            // then the broadcast fallback. Subscribed sessions see the frame
            // twice; consumers are idempotent by rank.
            self.send_to_user(&target_user_id, frame.clone());
            self.broadcast(frame);
        }

        tracing::debug!(
            "Published relationship event to {} connected session(s)",
            self.sessions.len()
        );
    }
}

/// Allow ServerMessage to be sent directly to session actors.
impl Message for ServerMessage {
    type Result = ();
}

impl Default for PushServer {
    fn default() -> Self {
        Self::new()
    }
}
