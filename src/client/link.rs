//! Client link (component J).
//!
//! Defines the WebSocket JSON frame schemas exchanged with a browser
//! client and the close codes used to signal why a link ended.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::command::{AdjustDirection, SplitOrientation};
use crate::constants::CLIENT_SEND_QUEUE_CAPACITY;

/// Messages the server sends to a browser client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// Decoded pane output bytes, base64-encoded.
    Output {
        #[serde(rename = "paneId")]
        pane_id: String,
        bytes: String,
    },
    /// A window's current layout tree, serialized as its compact string.
    Layout {
        #[serde(rename = "windowId")]
        window_id: String,
        #[serde(rename = "layoutString")]
        layout_string: String,
    },
    /// An initial content capture, base64-encoded, with the clear
    /// sequence the client should prepend before replaying it.
    InitialContent {
        #[serde(rename = "paneId")]
        pane_id: String,
        bytes: String,
        explicit: bool,
    },
    /// The controller reached `Ready`; the client may now send intents.
    Ready,
    /// Reply to a client `ping`.
    Pong,
    /// A non-fatal error tied to a specific pane or request.
    Error { message: String },
    /// A new session was created on behalf of this client.
    NewSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

impl ServerFrame {
    /// Builds an [`Self::Output`] frame, base64-encoding `bytes`.
    #[must_use]
    pub fn output(pane_id: u32, bytes: &[u8]) -> Self {
        Self::Output { pane_id: format!("%{pane_id}"), bytes: BASE64.encode(bytes) }
    }

    /// Builds an [`Self::InitialContent`] frame, base64-encoding `bytes`.
    #[must_use]
    pub fn initial_content(pane_id: u32, bytes: &[u8], explicit: bool) -> Self {
        Self::InitialContent {
            pane_id: format!("%{pane_id}"),
            bytes: BASE64.encode(bytes),
            explicit,
        }
    }
}

/// Messages a browser client sends to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Literal typed input, base64-encoded.
    Input {
        #[serde(rename = "paneId")]
        pane_id: String,
        bytes: String,
    },
    /// A desired whole-window size.
    Resize { cols: u16, rows: u16 },
    /// Split a pane.
    Split {
        #[serde(rename = "paneId")]
        pane_id: String,
        orientation: SplitOrientation,
    },
    ClosePane {
        #[serde(rename = "paneId")]
        pane_id: String,
    },
    ResizePane {
        #[serde(rename = "paneId")]
        pane_id: String,
        cols: u16,
        rows: u16,
    },
    SelectPane {
        #[serde(rename = "paneId")]
        pane_id: String,
    },
    Scroll {
        #[serde(rename = "paneId")]
        pane_id: String,
        amount: i32,
    },
    AdjustPane {
        #[serde(rename = "paneId")]
        pane_id: String,
        direction: AdjustDirection,
        cells: u16,
    },
    EqualizePanes { vertical: bool },
    RequestContent {
        #[serde(rename = "paneId")]
        pane_id: String,
    },
    ZoomPane {
        #[serde(rename = "paneId")]
        pane_id: String,
    },
    ClientInfo { name: String },
    Ping,
}

/// One message pushed down a client's outbound channel by the session
/// controller: either a frame to relay verbatim, or an instruction to
/// close the socket with a specific code (the `SlowConsumer` path closes
/// this way without ever reaching the bounded channel it just overflowed).
#[derive(Debug, Clone)]
pub enum ClientOutbound {
    /// Relay this frame to the browser.
    Frame(ServerFrame),
    /// Close the socket with this code; no further frames follow.
    Close(CloseCode),
}

/// Sending half of a client's bounded outbound queue. Bounded at
/// [`CLIENT_SEND_QUEUE_CAPACITY`]; a full queue is the `SlowConsumer`
/// path (spec §5, §7) — the controller observes the `try_send` failure
/// and closes that link with [`CloseCode::InternalError`] without
/// blocking delivery to any other client.
pub type ClientSender = mpsc::Sender<ClientOutbound>;

/// Creates a bounded outbound channel sized to the slow-consumer limit.
#[must_use]
pub fn client_channel() -> (ClientSender, mpsc::Receiver<ClientOutbound>) {
    mpsc::channel(CLIENT_SEND_QUEUE_CAPACITY)
}

/// Close codes defined for this link. Application close codes must be in
/// the `4000..=4999` private-use range, except `1000` (normal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// Normal close; client SHOULD NOT auto-reconnect.
    Normal,
    /// Authentication rejected; client MUST NOT auto-reconnect.
    AuthRejected,
    /// Internal error (PTY died, protocol error); client SHOULD
    /// auto-reconnect after [`crate::constants::RECONNECT_DELAY`].
    InternalError,
}

impl CloseCode {
    #[must_use]
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::AuthRejected => 4004,
            Self::InternalError => 4500,
        }
    }

    /// Whether a well-behaved client should attempt to reconnect after
    /// receiving this close code.
    #[must_use]
    pub fn should_reconnect(self) -> bool {
        match self {
            Self::Normal | Self::AuthRejected => false,
            Self::InternalError => true,
        }
    }
}

/// Validates a WebSocket upgrade's session id and token before the core
/// ever sees the connection. Real token-based authentication is out of
/// scope for this crate (spec.md §1); this seam exists so a deployment
/// that does own it can plug in without touching the core.
pub trait AuthHook: Send + Sync {
    /// Returns whether `token` (query-string `?token=...`, if present)
    /// authorizes the upgrade for `session_id`.
    fn validate(&self, session_id: &str, token: Option<&str>) -> bool;
}

/// The default hook used by the bare harness binary: authenticates
/// every upgrade. Not suitable for an exposed deployment.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughAuth;

impl AuthHook for PassthroughAuth {
    fn validate(&self, _session_id: &str, _token: Option<&str>) -> bool {
        true
    }
}

/// Parses a `%N`-form pane id string into its numeric id.
///
/// # Errors
///
/// Returns [`crate::error::CoreError::ProtocolError`] if `raw` is not of
/// the form `%` followed by decimal digits.
pub fn parse_pane_id(raw: &str) -> crate::error::CoreResult<u32> {
    raw.strip_prefix('%')
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| crate::error::CoreError::ProtocolError(format!("invalid pane id: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_frame_base64_encodes_bytes() {
        let frame = ServerFrame::output(3, b"hello");
        match frame {
            ServerFrame::Output { pane_id, bytes } => {
                assert_eq!(pane_id, "%3");
                assert_eq!(BASE64.decode(bytes).unwrap(), b"hello");
            }
            other => panic!("expected Output, got {other:?}"),
        }
    }

    #[test]
    fn server_frame_serializes_with_type_tag() {
        let frame = ServerFrame::Ready;
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"ready"}"#);
    }

    #[test]
    fn client_frame_input_round_trips_through_json() {
        let original = ClientFrame::Input { pane_id: "%0".to_string(), bytes: BASE64.encode(b"ls\n") };
        let json = serde_json::to_string(&original).unwrap();
        let parsed: ClientFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn client_frame_ping_deserializes_from_minimal_json() {
        let parsed: ClientFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(parsed, ClientFrame::Ping);
    }

    #[test]
    fn close_code_values_match_spec() {
        assert_eq!(CloseCode::Normal.as_u16(), 1000);
        assert_eq!(CloseCode::AuthRejected.as_u16(), 4004);
        assert_eq!(CloseCode::InternalError.as_u16(), 4500);
    }

    #[test]
    fn only_internal_error_signals_reconnect() {
        assert!(!CloseCode::Normal.should_reconnect());
        assert!(!CloseCode::AuthRejected.should_reconnect());
        assert!(CloseCode::InternalError.should_reconnect());
    }

    #[test]
    fn parse_pane_id_accepts_percent_prefixed_decimal() {
        assert_eq!(parse_pane_id("%42").unwrap(), 42);
    }

    #[test]
    fn parse_pane_id_rejects_missing_prefix() {
        assert!(parse_pane_id("42").is_err());
    }
}
