/// Push session actor.
///
/// One actor per WebSocket connection. Holds auth state and forwards
/// ServerMessages to the client through the mpsc channel bridged in
/// handler.rs. Sockets authenticate in-band with `ClientMessage::Auth`.
use actix::prelude::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::utils::Claims;
use crate::ENV;

use super::events::{Authenticate, Connect, Disconnect};
use super::message::{ClientMessage, ServerMessage};
use super::server::PushServer;

pub struct PushSession {
    pub id: Uuid,

    /// Account id once authenticated; None until then. Unauthenticated sessions
    /// still receive broadcast frames and filter by target id client-side.
    pub user_id: Option<Uuid>,

    pub server: Addr<PushServer>,

    /// Outbound JSON channel (session actor -> handler.rs -> socket).
    pub tx: mpsc::UnboundedSender<String>,
}

impl PushSession {
    pub fn new(server: Addr<PushServer>, tx: mpsc::UnboundedSender<String>) -> Self {
        Self { id: Uuid::now_v7(), user_id: None, server, tx }
    }

    fn send_to_client(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = self.tx.send(json) {
                    tracing::error!("Failed to send message to client (session {}): {}", self.id, e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to serialize ServerMessage (session {}): {}", self.id, e);
            }
        }
    }

    fn handle_client_message(&mut self, msg: &ClientMessage) {
        match msg {
            ClientMessage::Auth { token } => self.handle_auth(token),
            ClientMessage::Ping => self.send_to_client(&ServerMessage::Pong),
        }
    }

    fn handle_auth(&mut self, token: &str) {
        if self.user_id.is_some() {
            self.send_to_client(&ServerMessage::Error {
                message: "Session already authenticated".to_string(),
            });
            return;
        }

        let claims = match Claims::decode(token, ENV.jwt_secret.as_ref()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("JWT verification failed (session {}): {}", self.id, e);
                self.send_to_client(&ServerMessage::AuthFailed {
                    reason: "Token invalid or expired".to_string(),
                });
                return;
            }
        };

        let user_id = claims.sub;
        self.user_id = Some(user_id);

        self.server.do_send(Authenticate { session_id: self.id, user_id });
        self.send_to_client(&ServerMessage::AuthSuccess { user_id });

        tracing::info!("User {} authenticated on push session {}", user_id, self.id);
    }
}

impl Actor for PushSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("Push session started: {}", self.id);
        self.server.do_send(Connect { id: self.id, addr: ctx.address() });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("Push session stopped: {}", self.id);
        self.server.do_send(Disconnect { id: self.id });
    }
}

impl Message for ClientMessage {
    type Result = ();
}

impl Handler<ClientMessage> for PushSession {
    type Result = ();

    fn handle(&mut self, msg: ClientMessage, _ctx: &mut Context<Self>) {
        self.handle_client_message(&msg);
    }
}

impl Handler<ServerMessage> for PushSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _ctx: &mut Context<Self>) {
        self.send_to_client(&msg);
    }
}
