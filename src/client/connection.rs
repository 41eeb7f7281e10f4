//! Per-connection WebSocket driver for the client link (component J).
//!
//! Owns one accepted WebSocket end to end: performs the handshake while
//! capturing the request target, authenticates the upgrade, attaches to
//! (or spawns) the named session's controller, then relays frames in
//! both directions until either side closes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tokio_tungstenite::WebSocketStream;

use crate::client::link::{
    client_channel, parse_pane_id, AuthHook, ClientFrame, ClientOutbound, CloseCode, ServerFrame,
};
use crate::command::Intent;
use crate::events::ControllerMessage;
use crate::resize::Size;
use crate::session::controller::SpawnSpec;
use crate::session::{ControllerHandle, Supervisor};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// A parsed `/ws/control/{sessionId}?token=...` upgrade target.
struct UpgradeTarget {
    session_id: String,
    token: Option<String>,
}

fn parse_upgrade_target(path_and_query: &str) -> Option<UpgradeTarget> {
    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };
    let session_id = path.strip_prefix("/ws/control/")?.to_string();
    if session_id.is_empty() {
        return None;
    }
    let token = query.and_then(|query| {
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == "token").then(|| value.to_string())
        })
    });
    Some(UpgradeTarget { session_id, token })
}

/// Drives one accepted TCP connection through the WebSocket handshake and,
/// if it authenticates, for the lifetime of the resulting link.
///
/// `spawn_spec` builds the [`SpawnSpec`] a brand-new session should be
/// started with, given its session id; it is only invoked when no
/// controller is already running for that id.
pub async fn serve<S>(
    stream: S,
    supervisor: Supervisor,
    auth: Arc<dyn AuthHook>,
    spawn_spec: impl Fn(&str) -> SpawnSpec,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let captured_target: Arc<std::sync::Mutex<Option<String>>> = Arc::new(std::sync::Mutex::new(None));
    let captured_for_callback = Arc::clone(&captured_target);
    let callback = move |request: &Request, response: Response| {
        *captured_for_callback.lock().expect("capture lock poisoned") =
            Some(request.uri().to_string());
        Ok(response)
    };

    let ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(err) => {
            log::warn!("websocket handshake failed: {err}");
            return;
        }
    };

    let target = captured_target.lock().expect("capture lock poisoned").clone();
    let Some(upgrade) = target.as_deref().and_then(parse_upgrade_target) else {
        log::warn!("websocket upgrade to unrecognized path rejected");
        close_immediately(ws, CloseCode::AuthRejected).await;
        return;
    };

    if !auth.validate(&upgrade.session_id, upgrade.token.as_deref()) {
        log::warn!("session {}: upgrade failed authentication", upgrade.session_id);
        close_immediately(ws, CloseCode::AuthRejected).await;
        return;
    }

    let (handle, is_new) = match supervisor.attach(&upgrade.session_id, || spawn_spec(&upgrade.session_id)) {
        Ok(pair) => pair,
        Err(err) => {
            log::warn!("session {}: could not attach: {err}", upgrade.session_id);
            close_immediately(ws, CloseCode::InternalError).await;
            return;
        }
    };

    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    let (outbound_tx, outbound_rx) = client_channel();
    let ping_tx = outbound_tx.clone();

    if is_new {
        let _ = outbound_tx.try_send(ClientOutbound::Frame(ServerFrame::NewSession {
            session_id: upgrade.session_id.clone(),
        }));
    }
    handle.send(ControllerMessage::ClientJoined { client_id, sender: outbound_tx });

    let (mut ws_tx, mut ws_rx) = ws.split();
    let mut outbound_rx = outbound_rx;
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            match message {
                ClientOutbound::Frame(frame) => {
                    let Ok(json) = serde_json::to_string(&frame) else { continue };
                    if ws_tx.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                ClientOutbound::Close(code) => {
                    let _ = ws_tx.send(Message::Close(Some(close_frame(code)))).await;
                    break;
                }
            }
        }
        let _ = ws_tx.close().await;
    });

    while let Some(message) = ws_rx.next().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                log::debug!("session {}: client {client_id} socket error: {err}", upgrade.session_id);
                break;
            }
        };
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientFrame>(text.as_ref()) {
                Ok(ClientFrame::Ping) => {
                    let _ = ping_tx.try_send(ClientOutbound::Frame(ServerFrame::Pong));
                }
                Ok(frame) => dispatch_client_frame(&handle, client_id, frame),
                Err(err) => {
                    log::warn!("session {}: client {client_id} sent unparseable frame: {err}", upgrade.session_id);
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle.send(ControllerMessage::ClientLeft { client_id });
    writer.abort();
}

/// Translates one [`ClientFrame`] into the `ControllerMessage` it maps
/// to, dropping frames with an unparseable pane id rather than posting a
/// malformed intent (the parser already rejected anything worse).
fn dispatch_client_frame(handle: &ControllerHandle, client_id: u64, frame: ClientFrame) {
    let pane = |raw: &str| parse_pane_id(raw).ok();
    match frame {
        ClientFrame::Input { pane_id, bytes } => {
            if let (Some(pane_id), Ok(bytes)) = (pane(&pane_id), BASE64.decode(bytes)) {
                handle.send(ControllerMessage::Client {
                    client_id,
                    intent: Intent::Input { pane_id, bytes },
                });
            }
        }
        ClientFrame::Resize { cols, rows } => {
            handle.send(ControllerMessage::ClientResize { client_id, size: Size::new(cols, rows) });
        }
        ClientFrame::Split { pane_id, orientation } => {
            if let Some(pane_id) = pane(&pane_id) {
                handle.send(ControllerMessage::Client {
                    client_id,
                    intent: Intent::Split { pane_id, orientation },
                });
            }
        }
        ClientFrame::ClosePane { pane_id } => {
            if let Some(pane_id) = pane(&pane_id) {
                handle.send(ControllerMessage::Client { client_id, intent: Intent::ClosePane { pane_id } });
            }
        }
        ClientFrame::ResizePane { pane_id, cols, rows } => {
            if let Some(pane_id) = pane(&pane_id) {
                handle.send(ControllerMessage::PaneResizeRequest { pane_id, size: Size::new(cols, rows) });
            }
        }
        ClientFrame::SelectPane { pane_id } => {
            if let Some(pane_id) = pane(&pane_id) {
                handle.send(ControllerMessage::Client { client_id, intent: Intent::SelectPane { pane_id } });
            }
        }
        ClientFrame::Scroll { pane_id, amount } => {
            if let Some(pane_id) = pane(&pane_id) {
                handle.send(ControllerMessage::Client { client_id, intent: Intent::Scroll { pane_id, amount } });
            }
        }
        ClientFrame::AdjustPane { pane_id, direction, cells } => {
            if let Some(pane_id) = pane(&pane_id) {
                handle.send(ControllerMessage::Client {
                    client_id,
                    intent: Intent::AdjustPane { pane_id, direction, cells },
                });
            }
        }
        ClientFrame::EqualizePanes { vertical } => {
            let intent = if vertical { Intent::EqualizeVertical } else { Intent::EqualizeHorizontal };
            handle.send(ControllerMessage::Client { client_id, intent });
        }
        ClientFrame::RequestContent { pane_id } => {
            if let Some(pane_id) = pane(&pane_id) {
                handle.send(ControllerMessage::Client {
                    client_id,
                    intent: Intent::RequestContent { pane_id },
                });
            }
        }
        ClientFrame::ZoomPane { pane_id } => {
            if let Some(pane_id) = pane(&pane_id) {
                handle.send(ControllerMessage::Client { client_id, intent: Intent::ZoomToggle { pane_id } });
            }
        }
        ClientFrame::ClientInfo { name } => {
            log::debug!("client {client_id} identified as {name:?}");
        }
        ClientFrame::Ping => unreachable!("handled before dispatch"),
    }
}

fn close_frame(code: CloseCode) -> CloseFrame {
    CloseFrame { code: code.as_u16().into(), reason: "".into() }
}

async fn close_immediately<S>(ws: WebSocketStream<S>, code: CloseCode)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ws = ws;
    let _ = ws.close(Some(close_frame(code))).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_id_and_token_from_upgrade_path() {
        let target = parse_upgrade_target("/ws/control/abc123?token=secret").unwrap();
        assert_eq!(target.session_id, "abc123");
        assert_eq!(target.token.as_deref(), Some("secret"));
    }

    #[test]
    fn parses_session_id_with_no_query_string() {
        let target = parse_upgrade_target("/ws/control/abc123").unwrap();
        assert_eq!(target.session_id, "abc123");
        assert_eq!(target.token, None);
    }

    #[test]
    fn rejects_path_missing_session_id() {
        assert!(parse_upgrade_target("/ws/control/").is_none());
    }

    #[test]
    fn rejects_unrelated_path() {
        assert!(parse_upgrade_target("/healthz").is_none());
    }
}
