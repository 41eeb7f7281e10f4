//! Command dispatcher (component H).
//!
//! Translates client intents into the multiplexer's command-line syntax,
//! and strips xterm mouse-tracking escape sequences from literal input
//! before it reaches `send-keys`.

use serde::{Deserialize, Serialize};

/// A resize-pane drag direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustDirection {
    Left,
    Right,
    Up,
    Down,
}

impl AdjustDirection {
    fn flag(self) -> &'static str {
        match self {
            Self::Left => "-L",
            Self::Right => "-R",
            Self::Up => "-U",
            Self::Down => "-D",
        }
    }
}

/// Split orientation for a `split` intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitOrientation {
    Horizontal,
    Vertical,
}

/// A client intent translated into a multiplexer command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Split { pane_id: u32, orientation: SplitOrientation },
    ClosePane { pane_id: u32 },
    SelectPane { pane_id: u32 },
    ZoomToggle { pane_id: u32 },
    AdjustPane { pane_id: u32, direction: AdjustDirection, cells: u16 },
    EqualizeHorizontal,
    EqualizeVertical,
    /// Positive `amount` scrolls up, negative scrolls down.
    Scroll { pane_id: u32, amount: i32 },
    RespawnPane { pane_id: u32 },
    Input { pane_id: u32, bytes: Vec<u8> },
    /// Explicit client-requested refresh of a pane's initial content.
    /// Dispatched to the same `capture-pane` line component F issues on
    /// a fresh subscriber; the session controller routes replies to it
    /// back through the capture path rather than treating it as a
    /// fire-and-forget command, so [`dispatch`] is provided for
    /// completeness but the controller does not call it for this intent.
    RequestContent { pane_id: u32 },
}

/// Renders `intent` into the sequence of multiplexer commands needed to
/// carry it out. Most intents map to exactly one command; `scroll`
/// additionally enters copy-mode first and issues one `send-keys -X`
/// per unit of scroll amount, and `input` sanitizes its bytes through
/// [`strip_mouse_sequences`] before quoting them.
#[must_use]
pub fn dispatch(intent: &Intent) -> Vec<String> {
    match intent {
        Intent::Split { pane_id, orientation } => {
            let flag = match orientation {
                SplitOrientation::Horizontal => "-h",
                SplitOrientation::Vertical => "-v",
            };
            vec![format!("split-window {flag} -t %{pane_id}")]
        }
        Intent::ClosePane { pane_id } => vec![format!("kill-pane -t %{pane_id}")],
        Intent::SelectPane { pane_id } => vec![format!("select-pane -t %{pane_id}")],
        Intent::ZoomToggle { pane_id } => vec![format!("resize-pane -Z -t %{pane_id}")],
        Intent::AdjustPane { pane_id, direction, cells } => {
            vec![format!("resize-pane -t %{pane_id} {} {cells}", direction.flag())]
        }
        Intent::EqualizeHorizontal => vec!["select-layout even-horizontal".to_string()],
        Intent::EqualizeVertical => vec!["select-layout even-vertical".to_string()],
        Intent::Scroll { pane_id, amount } => build_scroll_commands(*pane_id, *amount),
        Intent::RespawnPane { pane_id } => vec![format!("respawn-pane -k -t %{pane_id}")],
        Intent::Input { pane_id, bytes } => {
            let sanitized = strip_mouse_sequences(bytes);
            vec![format!(
                "send-keys -t %{pane_id} -l {}",
                shell_quote(&sanitized)
            )]
        }
        Intent::RequestContent { pane_id } => {
            vec![crate::registry::capture::capture_command(*pane_id)]
        }
    }
}

fn build_scroll_commands(pane_id: u32, amount: i32) -> Vec<String> {
    let direction = if amount >= 0 { "scroll-up" } else { "scroll-down" };
    let count = amount.unsigned_abs() as usize;
    let mut commands = Vec::with_capacity(count + 1);
    commands.push(format!("copy-mode -t %{pane_id}"));
    for _ in 0..count {
        commands.push(format!("send-keys -X -t %{pane_id} {direction}"));
    }
    commands
}

/// Wraps literal bytes in single quotes for `send-keys -l`, escaping any
/// embedded single quote as `'\''`.
fn shell_quote(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// Strips xterm mouse-tracking escape sequences a browser's own terminal
/// emulator may have injected, so the multiplexer never interprets them
/// as literal typed input: `ESC [ M` followed by exactly 3 bytes (legacy
/// X10/UTF-8 mouse reporting), and SGR mouse reports of the form
/// `ESC [ < params M` / `ESC [ < params m`.
#[must_use]
pub fn strip_mouse_sequences(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if let Some(len) = legacy_mouse_len(&bytes[i..]) {
            i += len;
            continue;
        }
        if let Some(len) = sgr_mouse_len(&bytes[i..]) {
            i += len;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Matches `ESC [ M` followed by exactly 3 bytes; returns the total
/// sequence length (6) if present at the start of `bytes`.
fn legacy_mouse_len(bytes: &[u8]) -> Option<usize> {
    if bytes.len() >= 6 && bytes[0] == 0x1b && bytes[1] == b'[' && bytes[2] == b'M' {
        Some(6)
    } else {
        None
    }
}

/// Matches `ESC [ < digits ; digits ; digits (M|m)`; returns the total
/// sequence length if present at the start of `bytes`.
fn sgr_mouse_len(bytes: &[u8]) -> Option<usize> {
    if !(bytes.len() >= 4 && bytes[0] == 0x1b && bytes[1] == b'[' && bytes[2] == b'<') {
        return None;
    }
    let mut i = 3;
    while i < bytes.len() {
        match bytes[i] {
            b'M' | b'm' => return Some(i + 1),
            b'0'..=b'9' | b';' => i += 1,
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_horizontal_command() {
        let commands = dispatch(&Intent::Split { pane_id: 3, orientation: SplitOrientation::Horizontal });
        assert_eq!(commands, vec!["split-window -h -t %3".to_string()]);
    }

    #[test]
    fn split_vertical_command() {
        let commands = dispatch(&Intent::Split { pane_id: 3, orientation: SplitOrientation::Vertical });
        assert_eq!(commands, vec!["split-window -v -t %3".to_string()]);
    }

    #[test]
    fn close_pane_command() {
        assert_eq!(dispatch(&Intent::ClosePane { pane_id: 7 }), vec!["kill-pane -t %7".to_string()]);
    }

    #[test]
    fn zoom_toggle_command() {
        assert_eq!(
            dispatch(&Intent::ZoomToggle { pane_id: 1 }),
            vec!["resize-pane -Z -t %1".to_string()]
        );
    }

    #[test]
    fn adjust_pane_command() {
        let commands = dispatch(&Intent::AdjustPane {
            pane_id: 2,
            direction: AdjustDirection::Left,
            cells: 5,
        });
        assert_eq!(commands, vec!["resize-pane -t %2 -L 5".to_string()]);
    }

    #[test]
    fn equalize_commands() {
        assert_eq!(dispatch(&Intent::EqualizeHorizontal), vec!["select-layout even-horizontal".to_string()]);
        assert_eq!(dispatch(&Intent::EqualizeVertical), vec!["select-layout even-vertical".to_string()]);
    }

    #[test]
    fn scroll_up_enters_copy_mode_then_issues_n_scroll_commands() {
        let commands = dispatch(&Intent::Scroll { pane_id: 0, amount: 3 });
        assert_eq!(
            commands,
            vec![
                "copy-mode -t %0".to_string(),
                "send-keys -X -t %0 scroll-up".to_string(),
                "send-keys -X -t %0 scroll-up".to_string(),
                "send-keys -X -t %0 scroll-up".to_string(),
            ]
        );
    }

    #[test]
    fn scroll_down_on_negative_amount() {
        let commands = dispatch(&Intent::Scroll { pane_id: 0, amount: -2 });
        assert_eq!(
            commands,
            vec![
                "copy-mode -t %0".to_string(),
                "send-keys -X -t %0 scroll-down".to_string(),
                "send-keys -X -t %0 scroll-down".to_string(),
            ]
        );
    }

    #[test]
    fn respawn_pane_command() {
        assert_eq!(
            dispatch(&Intent::RespawnPane { pane_id: 4 }),
            vec!["respawn-pane -k -t %4".to_string()]
        );
    }

    #[test]
    fn typed_input_uses_literal_flag_and_quotes_bytes() {
        let commands = dispatch(&Intent::Input { pane_id: 0, bytes: b"ls -la".to_vec() });
        assert_eq!(commands, vec!["send-keys -t %0 -l 'ls -la'".to_string()]);
    }

    #[test]
    fn typed_input_escapes_embedded_single_quote() {
        let commands = dispatch(&Intent::Input { pane_id: 0, bytes: b"it's".to_vec() });
        assert_eq!(commands, vec!["send-keys -t %0 -l 'it'\\''s'".to_string()]);
    }

    #[test]
    fn strip_legacy_mouse_sequence() {
        let mut input = b"hello".to_vec();
        input.extend_from_slice(&[0x1b, b'[', b'M', 0x20, 0x30, 0x30]);
        input.extend_from_slice(b"world");
        assert_eq!(strip_mouse_sequences(&input), b"helloworld");
    }

    #[test]
    fn strip_sgr_mouse_sequence() {
        let mut input = b"a".to_vec();
        input.extend_from_slice(b"\x1b[<0;10;20M");
        input.extend_from_slice(b"b");
        assert_eq!(strip_mouse_sequences(&input), b"ab");
    }

    #[test]
    fn strip_sgr_mouse_release_sequence() {
        let mut input = b"a".to_vec();
        input.extend_from_slice(b"\x1b[<0;10;20m");
        input.extend_from_slice(b"b");
        assert_eq!(strip_mouse_sequences(&input), b"ab");
    }

    #[test]
    fn strip_leaves_plain_escape_sequences_untouched() {
        let input = b"\x1b[31mred\x1b[0m".to_vec();
        assert_eq!(strip_mouse_sequences(&input), input);
    }

    #[test]
    fn request_content_command() {
        assert_eq!(
            dispatch(&Intent::RequestContent { pane_id: 2 }),
            vec!["capture-pane -e -p -t %2 -S -".to_string()]
        );
    }

    #[test]
    fn typed_input_sanitizes_mouse_sequences_before_quoting() {
        let mut bytes = b"before".to_vec();
        bytes.extend_from_slice(&[0x1b, b'[', b'M', 1, 2, 3]);
        bytes.extend_from_slice(b"after");
        let commands = dispatch(&Intent::Input { pane_id: 9, bytes });
        assert_eq!(commands, vec!["send-keys -t %9 -l 'beforeafter'".to_string()]);
    }
}
