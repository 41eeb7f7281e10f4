//! Crate-wide error taxonomy for the control multiplexer core.
//!
//! Mirrors the error handling design: transient parser faults on a single
//! payload are skipped, structural protocol faults kill the controller,
//! per-client faults kill only that client. See variant docs for the
//! policy attached to each kind.

use thiserror::Error;

/// Errors raised by the control multiplexer core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// WebSocket upgrade rejected by the auth collaborator. Client Link
    /// closes with code 4004.
    #[error("authentication rejected")]
    AuthFailed,

    /// The supervisor found no such multiplexer session and could not
    /// create one. Client Link closes with code 4004.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The line parser saw an unparseable frame, or a `%begin` with no
    /// matching `%end`/`%error`. Fatal: the controller transitions to
    /// `Dead` and all clients close with code 4500.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Subscription to a pane that has already been removed from the
    /// registry. Non-fatal: the Client Link emits `error{paneId}` and
    /// continues.
    #[error("pane gone: {0}")]
    PaneGone(String),

    /// A command had no `%end`/`%error` within the configured timeout.
    /// Non-fatal: logged, reply dropped, controller stays `Ready`.
    #[error("command timed out waiting for reply")]
    CommandTimeout,

    /// Octal decode failure on a single `%output` payload. Non-fatal:
    /// the bad event is logged and skipped.
    #[error("malformed escape sequence: {0}")]
    MalformedEscape(String),

    /// A Client Link's bounded send queue overflowed. That link alone
    /// is closed with code 4500.
    #[error("client send queue overflowed")]
    SlowConsumer,

    /// The PTY-hosted multiplexer process exited or its PTY died.
    /// Fatal: controller transitions to `Dead`.
    #[error("multiplexer process died: {0}")]
    PtyDied(String),
}

/// Result alias used throughout the core.
pub type CoreResult<T> = Result<T, CoreError>;
