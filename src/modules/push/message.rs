/// Push channel wire protocol.
///
/// Relationship-change events are fire-and-forget and at-least-once: the same
/// event may arrive twice (targeted delivery plus the broadcast fallback) and
/// out of order across types. Consumers reconcile by rank, so duplicates and
/// stale frames are harmless.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Authenticate the socket with a JWT access token.
    #[serde(rename_all = "camelCase")]
    Auth { token: String },

    /// Keep-alive.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    AuthSuccess { user_id: Uuid },

    #[serde(rename_all = "camelCase")]
    AuthFailed { reason: String },

    /// A relationship changed for `target_user_id`. The explicit target lets
    /// sessions that receive the broadcast fallback drop frames meant for
    /// another account.
    #[serde(rename_all = "camelCase")]
    Relationship { target_user_id: Uuid, event: RelationshipEvent },

    Pong,

    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

/// The five relationship-change event shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelationshipEvent {
    #[serde(rename = "request-created", rename_all = "camelCase")]
    RequestCreated { from_user_id: Uuid, to_user_id: Uuid, id: Uuid },

    #[serde(rename = "request-canceled", rename_all = "camelCase")]
    RequestCanceled { from_user_id: Uuid, to_user_id: Uuid },

    #[serde(rename = "accepted")]
    Accepted { a: Uuid, b: Uuid },

    #[serde(rename = "declined", rename_all = "camelCase")]
    Declined { from_user_id: Uuid, to_user_id: Uuid },

    #[serde(rename = "removed")]
    Removed { a: Uuid, b: Uuid },
}

impl RelationshipEvent {
    /// Both accounts involved in the event; also the fan-out recipient set.
    pub fn participants(&self) -> [Uuid; 2] {
        match *self {
            RelationshipEvent::RequestCreated { from_user_id, to_user_id, .. }
            | RelationshipEvent::RequestCanceled { from_user_id, to_user_id }
            | RelationshipEvent::Declined { from_user_id, to_user_id } => {
                [from_user_id, to_user_id]
            }
            RelationshipEvent::Accepted { a, b } | RelationshipEvent::Removed { a, b } => [a, b],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_auth_deserialize() {
        let json = r#"{"type":"auth","token":"my-jwt-token"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Auth { token } if token == "my-jwt-token"));
    }

    #[test]
    fn client_ping_deserialize() {
        let json = r#"{"type":"ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn invalid_type_returns_error() {
        let json = r#"{"type":"unknownType"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn request_created_wire_shape() {
        let from = Uuid::now_v7();
        let to = Uuid::now_v7();
        let id = Uuid::now_v7();
        let event = RelationshipEvent::RequestCreated { from_user_id: from, to_user_id: to, id };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"request-created""#));
        assert!(json.contains(&format!(r#""fromUserId":"{from}""#)));
        assert!(json.contains(&format!(r#""toUserId":"{to}""#)));
        assert!(json.contains(&format!(r#""id":"{id}""#)));
    }

    #[test]
    fn request_canceled_wire_shape() {
        let from = Uuid::now_v7();
        let to = Uuid::now_v7();
        let event = RelationshipEvent::RequestCanceled { from_user_id: from, to_user_id: to };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"request-canceled""#));
    }

    #[test]
    fn accepted_and_removed_carry_unordered_pair() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let json = serde_json::to_string(&RelationshipEvent::Accepted { a, b }).unwrap();
        assert!(json.contains(r#""type":"accepted""#));
        assert!(json.contains(&format!(r#""a":"{a}""#)));
        assert!(json.contains(&format!(r#""b":"{b}""#)));

        let json = serde_json::to_string(&RelationshipEvent::Removed { a, b }).unwrap();
        assert!(json.contains(r#""type":"removed""#));
    }

    #[test]
    fn declined_wire_shape() {
        let from = Uuid::now_v7();
        let to = Uuid::now_v7();
        let json =
            serde_json::to_string(&RelationshipEvent::Declined { from_user_id: from, to_user_id: to })
                .unwrap();
        assert!(json.contains(r#""type":"declined""#));
    }

    #[test]
    fn relationship_frame_carries_target() {
        let target = Uuid::now_v7();
        let a = Uuid::now_v7();
        let msg = ServerMessage::Relationship {
            target_user_id: target,
            event: RelationshipEvent::Accepted { a, b: target },
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"relationship""#));
        assert!(json.contains(&format!(r#""targetUserId":"{target}""#)));

        let back: ServerMessage = serde_json::from_str(&json).unwrap();
        match back {
            ServerMessage::Relationship { target_user_id, event } => {
                assert_eq!(target_user_id, target);
                assert_eq!(event, RelationshipEvent::Accepted { a, b: target });
            }
            _ => panic!("Expected Relationship variant"),
        }
    }

    #[test]
    fn participants_cover_all_shapes() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let id = Uuid::now_v7();

        let events = [
            RelationshipEvent::RequestCreated { from_user_id: a, to_user_id: b, id },
            RelationshipEvent::RequestCanceled { from_user_id: a, to_user_id: b },
            RelationshipEvent::Accepted { a, b },
            RelationshipEvent::Declined { from_user_id: a, to_user_id: b },
            RelationshipEvent::Removed { a, b },
        ];
        for event in events {
            assert_eq!(event.participants(), [a, b]);
        }
    }
}
