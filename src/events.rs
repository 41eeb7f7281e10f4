//! Shared mailbox message types for the session controller actor.
//!
//! A controller's event loop selects over three sources: lines from its
//! PTY host, intents posted by client links, and its own timers. This
//! module names the envelope each source wraps its payload in before it
//! reaches the mailbox.

use crate::client::link::ClientSender;
use crate::command::Intent;
use crate::control::ControlEvent;
use crate::resize::Size;

/// One entry in a session controller's inbound mailbox.
#[derive(Debug, Clone)]
pub enum ControllerMessage {
    /// A parsed control-mode event from the PTY host's stdout.
    Parser(ControlEvent),
    /// A client posted an intent (split, input, resize, …).
    Client { client_id: u64, intent: Intent },
    /// A client announced its desired whole-window size.
    ClientResize { client_id: u64, size: Size },
    /// A client dragged a pane border to a target size; handled by the
    /// per-pane resize debouncer rather than dispatched immediately.
    PaneResizeRequest { pane_id: u32, size: Size },
    /// A new client attached to this session, with the channel the
    /// controller should push outbound frames through.
    ClientJoined { client_id: u64, sender: ClientSender },
    /// A client detached from this session.
    ClientLeft { client_id: u64 },
    /// The debounced resize timer fired.
    ResizeTick,
    /// The debounced per-pane resize timer fired.
    PaneResizeTick,
    /// The `Draining` idle timer expired with no client having returned.
    DrainTimeout,
    /// The resize arbiter's safety timeout elapsed without a
    /// `%layout-change` clearing `pending`.
    ResizePendingTimeout,
    /// A previously issued command's reply timed out.
    CommandTimeout { ticket: u64 },
}
