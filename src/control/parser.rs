//! Control line parser (component B).
//!
//! Reads the multiplexer's control-mode stdout line by line and classifies
//! each line into a typed [`ControlEvent`]. Lines inside a `%begin`/`%end`
//! (or `%error`) block are buffered and re-emitted as a single
//! [`ControlEvent::CommandReply`] once the block closes.

use crate::control::decode;
use crate::error::{CoreError, CoreResult};

/// A single parsed control-mode notification or command reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// `%output %N payload` — decoded pane output bytes.
    Output {
        /// Pane id in `%N` form.
        pane_id: String,
        /// Decoded raw bytes (see component A).
        bytes: Vec<u8>,
    },
    /// `%layout-change …` — a window's layout was recomputed.
    Layout {
        /// Window id the layout belongs to.
        window_id: String,
        /// The compact layout string (checksum included, as received).
        layout_string: String,
        /// The visible-layout string, if the multiplexer sent one.
        visible_layout: Option<String>,
        /// Whether this window is the currently active one.
        active: bool,
    },
    /// `%window-pane-changed` / `%pane-mode-changed`.
    PaneChanged,
    /// `%session-changed` — the control attachment was rebound.
    SessionChanged {
        /// Session id (e.g. `$1`).
        session_id: String,
        /// Session name.
        session_name: String,
    },
    /// `%sessions-changed` / `%window-add` / `%window-close`.
    Topology,
    /// `%exit` — the multiplexer is terminating this attachment.
    Exit,
    /// The buffered reply to a previously issued command.
    CommandReply {
        /// Lines accumulated between `%begin` and `%end`/`%error`.
        lines: Vec<String>,
        /// `true` if the block closed with `%error` rather than `%end`.
        is_error: bool,
    },
}

/// Incremental line-oriented parser with command-reply buffering state.
#[derive(Debug, Default)]
pub struct ControlParser {
    reply_buffer: Option<Vec<String>>,
}

impl ControlParser {
    /// Creates a parser with no in-flight command reply.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line (without its trailing newline; a trailing `\r` is
    /// tolerated and stripped). Returns `None` while a `%begin` block is
    /// still being buffered, `Some(event)` otherwise.
    pub fn feed_line(&mut self, line: &str) -> CoreResult<Option<ControlEvent>> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(buffer) = &mut self.reply_buffer {
            if let Some(rest) = line.strip_prefix("%end") {
                let _ = rest;
                let lines = self.reply_buffer.take().unwrap_or_default();
                return Ok(Some(ControlEvent::CommandReply { lines, is_error: false }));
            }
            if let Some(rest) = line.strip_prefix("%error") {
                let _ = rest;
                let lines = self.reply_buffer.take().unwrap_or_default();
                return Ok(Some(ControlEvent::CommandReply { lines, is_error: true }));
            }
            buffer.push(line.to_string());
            return Ok(None);
        }

        if let Some(rest) = line.strip_prefix("%begin") {
            let _ = rest;
            self.reply_buffer = Some(Vec::new());
            return Ok(None);
        }

        if let Some(rest) = line.strip_prefix("%output ") {
            return Self::parse_output(rest).map(Some);
        }
        if let Some(rest) = line.strip_prefix("%layout-change ") {
            return Ok(Some(Self::parse_layout_change(rest)));
        }
        if line.starts_with("%window-pane-changed") || line.starts_with("%pane-mode-changed") {
            return Ok(Some(ControlEvent::PaneChanged));
        }
        if let Some(rest) = line.strip_prefix("%session-changed ") {
            return Self::parse_session_changed(rest).map(Some);
        }
        if line.starts_with("%sessions-changed")
            || line.starts_with("%window-add")
            || line.starts_with("%window-close")
        {
            return Ok(Some(ControlEvent::Topology));
        }
        if line.starts_with("%exit") {
            return Ok(Some(ControlEvent::Exit));
        }

        Err(CoreError::ProtocolError(format!("unrecognized control line: {line:?}")))
    }

    /// Call at EOF. Fails with [`CoreError::ProtocolError`] if a
    /// `%begin` block was left open without a matching `%end`/`%error`.
    pub fn finish(&mut self) -> CoreResult<()> {
        if self.reply_buffer.take().is_some() {
            return Err(CoreError::ProtocolError(
                "stream ended inside an unterminated %begin block".to_string(),
            ));
        }
        Ok(())
    }

    fn parse_output(rest: &str) -> CoreResult<ControlEvent> {
        let (pane_id, payload) = rest.split_once(' ').ok_or_else(|| {
            CoreError::ProtocolError(format!("malformed %output line: {rest:?}"))
        })?;
        let bytes = decode::decode(payload)?;
        Ok(ControlEvent::Output { pane_id: pane_id.to_string(), bytes })
    }

    fn parse_layout_change(rest: &str) -> ControlEvent {
        let mut parts = rest.splitn(3, ' ');
        let window_id = parts.next().unwrap_or_default().to_string();
        let layout_string = parts.next().unwrap_or_default().to_string();
        let tail = parts.next().unwrap_or_default();
        let mut tail_parts = tail.splitn(2, ' ');
        let visible_layout = tail_parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let active = tail_parts.next().is_some_and(|flags| flags.contains('*'));
        ControlEvent::Layout { window_id, layout_string, visible_layout, active }
    }

    fn parse_session_changed(rest: &str) -> CoreResult<ControlEvent> {
        let (session_id, session_name) = rest.split_once(' ').ok_or_else(|| {
            CoreError::ProtocolError(format!("malformed %session-changed line: {rest:?}"))
        })?;
        Ok(ControlEvent::SessionChanged {
            session_id: session_id.to_string(),
            session_name: session_name.to_string(),
        })
    }
}
