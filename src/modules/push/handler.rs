/// WebSocket upgrade handler.
///
/// - Inbound:  client -> WebSocket -> parse ClientMessage -> session actor
/// - Outbound: push server actor -> session actor -> mpsc channel -> WebSocket
use actix::{Actor, Addr};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::Message;
use tokio::sync::mpsc;

use super::message::ClientMessage;
use super::server::PushServer;
use super::session::PushSession;

/// Endpoint: GET /ws
pub async fn push_handler(
    req: HttpRequest,
    stream: web::Payload,
    server: web::Data<Addr<PushServer>>,
) -> Result<HttpResponse, Error> {
    tracing::debug!("WebSocket upgrade request from {:?}", req.peer_addr());

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let addr = PushSession::new(server.get_ref().clone(), tx).start();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                msg = msg_stream.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let text_str = text.to_string();

                            match serde_json::from_str::<ClientMessage>(&text_str) {
                                Ok(client_msg) => {
                                    addr.do_send(client_msg);
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        "Failed to parse client message: {} - raw: {}",
                                        e,
                                        log_preview(&text_str)
                                    );
                                }
                            }
                        }

                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_session.pong(&data).await {
                                tracing::error!("Failed to send pong: {}", e);
                                break;
                            }
                        }

                        Some(Ok(Message::Pong(_))) => {}

                        Some(Ok(Message::Close(reason))) => {
                            tracing::info!("WebSocket close frame: {:?}", reason);
                            break;
                        }

                        Some(Ok(Message::Binary(_))) => {
                            tracing::warn!("Binary messages are not supported");
                        }

                        Some(Ok(Message::Continuation(_) | Message::Nop)) => {}

                        Some(Err(e)) => {
                            tracing::error!("WebSocket protocol error: {}", e);
                            break;
                        }

                        None => break,
                    }
                }

                Some(json) = rx.recv() => {
                    if ws_session.text(json).await.is_err() {
                        tracing::error!("Failed to send message to WebSocket client");
                        break;
                    }
                }
            }
        }

        let _ = ws_session.close(None).await;
        tracing::debug!("WebSocket message loop ended");
    });

    tracing::info!("WebSocket connection established");
    Ok(response)
}

/// First 100 characters of an untrusted frame. Truncates on a char boundary;
/// frames are arbitrary client input and may contain multibyte text.
fn log_preview(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_preview_truncates_on_char_boundaries() {
        let short = "hello";
        assert_eq!(log_preview(short), "hello");

        // 120 multibyte characters: byte 100 falls mid-character.
        let multibyte: String = "é".repeat(120);
        let preview = log_preview(&multibyte);
        assert_eq!(preview.chars().count(), 100);
        assert!(multibyte.is_char_boundary(preview.len()));
    }
}
