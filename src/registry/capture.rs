//! Initial content capture (component F).
//!
//! Builds the `capture-pane` command issued for a pane's initial content,
//! turns its buffered command reply back into raw bytes, and decides
//! which clear sequence the client link should prepend before replaying
//! them.

/// What triggered an initial content capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTrigger {
    /// A pane was just discovered with no recent capture of its own.
    NewSubscriber,
    /// A client (re)attached to a pane that already has live content.
    ClientAttach,
    /// The client explicitly asked for a fresh capture.
    RequestContent,
    /// The pane's zoom state changed.
    ZoomTransition,
}

impl CaptureTrigger {
    /// Whether this trigger is explicit by default. Only `ClientAttach`
    /// is implicit: it covers a client attaching to a pane that already
    /// has live content (including a reconnect), where a full clear
    /// would also wipe the client's own scrollback for no reason. The
    /// other three all correspond to content the client has never seen
    /// in this form before, so they clear the scrollback too.
    #[must_use]
    pub fn is_explicit_by_default(self) -> bool {
        !matches!(self, Self::ClientAttach)
    }
}

/// Builds the `capture-pane` command for `pane_id`: visible screen with
/// ANSI attributes preserved, plus the full scrollback from its top.
#[must_use]
pub fn capture_command(pane_id: u32) -> String {
    format!("capture-pane -e -p -t %{pane_id} -S -")
}

/// Reassembles a buffered `%begin`/`%end` command reply (one string per
/// line) back into the raw captured bytes.
#[must_use]
pub fn reply_to_bytes(lines: &[String]) -> Vec<u8> {
    lines.join("\n").into_bytes()
}

/// Builds the bytes an `initial-content` frame actually carries: the
/// clear sequence appropriate to `explicit` (see [`clear_sequence`]),
/// immediately followed by the captured pane content. This is the byte
/// stream scenarios S3/S4 assert against — the clear sequence is part of
/// the wire payload the core emits, not something left for the browser
/// to infer from a flag.
#[must_use]
pub fn framed_initial_content(lines: &[String], explicit: bool) -> Vec<u8> {
    let mut bytes = clear_sequence(explicit).to_vec();
    bytes.extend_from_slice(&reply_to_bytes(lines));
    bytes
}

/// Per-session flag distinguishing an explicit capture (full clear,
/// including the client's own scrollback) from an implicit one
/// (reconnect: clear screen only). Set true by an explicit trigger,
/// consumed exactly once by the next capture the client link sends.
#[derive(Debug, Default)]
pub struct ClearFlag(bool);

impl ClearFlag {
    /// Marks the next capture as explicit.
    pub fn set_explicit(&mut self) {
        self.0 = true;
    }

    /// Reads and resets the flag, returning whether the next capture
    /// should be treated as explicit.
    pub fn consume(&mut self) -> bool {
        std::mem::take(&mut self.0)
    }
}

/// Clear sequence the client link must send before replaying captured
/// bytes, chosen from whether the triggering capture was explicit.
#[must_use]
pub fn clear_sequence(explicit: bool) -> &'static [u8] {
    if explicit {
        b"\x1b[2J\x1b[3J\x1b[H"
    } else {
        b"\x1b[2J\x1b[H"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_command_matches_expected_form() {
        assert_eq!(capture_command(3), "capture-pane -e -p -t %3 -S -");
    }

    #[test]
    fn reply_to_bytes_joins_lines_with_newline() {
        let lines = vec!["line one".to_string(), "line two".to_string()];
        assert_eq!(reply_to_bytes(&lines), b"line one\nline two".to_vec());
    }

    #[test]
    fn reply_to_bytes_handles_empty_capture() {
        assert_eq!(reply_to_bytes(&[]), Vec::<u8>::new());
    }

    #[test]
    fn explicit_clear_sequence_wipes_client_scrollback_too() {
        assert_eq!(clear_sequence(true), b"\x1b[2J\x1b[3J\x1b[H");
    }

    #[test]
    fn implicit_clear_sequence_preserves_client_scrollback() {
        assert_eq!(clear_sequence(false), b"\x1b[2J\x1b[H");
    }

    #[test]
    fn request_content_and_zoom_are_explicit_by_default() {
        assert!(CaptureTrigger::NewSubscriber.is_explicit_by_default());
        assert!(CaptureTrigger::RequestContent.is_explicit_by_default());
        assert!(CaptureTrigger::ZoomTransition.is_explicit_by_default());
        assert!(!CaptureTrigger::ClientAttach.is_explicit_by_default());
    }

    #[test]
    fn clear_flag_is_consumed_exactly_once() {
        let mut flag = ClearFlag::default();
        assert!(!flag.consume());
        flag.set_explicit();
        assert!(flag.consume());
        assert!(!flag.consume());
    }

    #[test]
    fn s3_explicit_capture_is_framed_with_full_clear_sequence() {
        let lines = vec!["captured screen".to_string()];
        let framed = framed_initial_content(&lines, true);
        assert_eq!(
            &framed[..10],
            &[0x1b, b'[', b'2', b'J', 0x1b, b'[', b'3', b'J', 0x1b, b'[']
        );
        assert_eq!(&framed[10], &b'H');
        assert_eq!(&framed[11..], b"captured screen");
    }

    #[test]
    fn s4_implicit_capture_is_framed_without_scrollback_clear() {
        let lines = vec!["captured screen".to_string()];
        let framed = framed_initial_content(&lines, false);
        assert_eq!(&framed[..6], &[0x1b, b'[', b'2', b'J', 0x1b, b'[']);
        assert_eq!(&framed[6], &b'H');
        assert_eq!(&framed[7..], b"captured screen");
        // The 3J (scrollback clear) must not appear anywhere in an
        // implicit capture's framing.
        assert!(!framed.starts_with(b"\x1b[2J\x1b[3J"));
    }
}
