//! PTY host (component C) and process-boot initial sizing (component L).
//!
//! Launches the multiplexer binary under a real pseudo-terminal, forces an
//! initial 80x24 geometry before attaching in control mode, and mirrors its
//! stdout to the rest of the system line by line. Writes to the PTY are
//! serialized through a single writer so the multiplexer never sees
//! interleaved command bytes from two callers.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc;

use crate::constants::{CLIENT_NAME_PREFIX, INITIAL_COLS, INITIAL_ROWS};
use crate::error::{CoreError, CoreResult};

/// A line of raw stdout from the multiplexer, or the terminal event for its
/// process exiting.
#[derive(Debug, Clone)]
pub enum PtyLine {
    /// One complete line, LF-terminated on the wire but delivered without
    /// the line terminator. A lone trailing `\r` has already been trimmed.
    Line(String),
    /// The child process exited (or the PTY itself died).
    Exit { message: String },
}

/// A running multiplexer process attached to a pseudo-terminal.
///
/// Owns the write half of the PTY; reads happen on a dedicated OS thread
/// that forwards complete lines to an unbounded channel so the async side
/// of the system never blocks on PTY I/O.
pub struct PtyHost {
    master: Box<dyn MasterPty + Send>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    child: Box<dyn Child + Send>,
    reader_thread: Option<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for PtyHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHost").finish_non_exhaustive()
    }
}

/// Generates this host's unique control-mode client identity, so an orphan
/// sweep can recognize attachments left behind by a prior run.
#[must_use]
pub fn client_identity() -> String {
    format!("{CLIENT_NAME_PREFIX}{}", uuid::Uuid::new_v4())
}

impl PtyHost {
    /// Spawns `multiplexer_bin` under a PTY forced to `INITIAL_COLS` x
    /// `INITIAL_ROWS` (component L: geometry is never 0x0 at boot) and runs
    /// it with the given arguments (e.g. `["-C", "new-session", "-A", "-s",
    /// "main"]`) in `cwd`.
    ///
    /// Returns the host plus the receiving half of the line channel; the
    /// caller (the session controller) owns feeding those lines into the
    /// control line parser.
    pub fn spawn(
        multiplexer_bin: &Path,
        args: &[String],
        cwd: &Path,
    ) -> CoreResult<(Self, mpsc::UnboundedReceiver<PtyLine>)> {
        let pty_system = native_pty_system();
        let size = PtySize {
            rows: INITIAL_ROWS,
            cols: INITIAL_COLS,
            pixel_width: 0,
            pixel_height: 0,
        };
        let pair = pty_system
            .openpty(size)
            .map_err(|e| CoreError::PtyDied(format!("failed to open pty: {e}")))?;

        let mut cmd = CommandBuilder::new(multiplexer_bin);
        for arg in args {
            cmd.arg(arg);
        }
        cmd.cwd(cwd);

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| CoreError::PtyDied(format!("failed to spawn multiplexer: {e}")))?;
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| CoreError::PtyDied(format!("failed to take pty writer: {e}")))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| CoreError::PtyDied(format!("failed to clone pty reader: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let reader_thread = thread::spawn(move || read_lines(reader, &tx));

        Ok((
            Self {
                master: pair.master,
                writer: Arc::new(Mutex::new(writer)),
                child,
                reader_thread: Some(reader_thread),
            },
            rx,
        ))
    }

    /// Writes raw bytes to the PTY's stdin. Callers are expected to
    /// serialize through the session controller's single mailbox; this
    /// method additionally takes a lock so a second concurrent caller
    /// blocks rather than interleaving bytes.
    pub fn write(&self, bytes: &[u8]) -> CoreResult<()> {
        let mut writer = self.writer.lock().expect("pty writer lock poisoned");
        writer
            .write_all(bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| CoreError::PtyDied(format!("pty write failed: {e}")))
    }

    /// Resizes the underlying PTY. Does not touch the multiplexer's own
    /// notion of window size; that is renegotiated when the multiplexer
    /// reacts to the `SIGWINCH` this resize generates and emits a fresh
    /// `%layout-change`.
    pub fn resize(&self, cols: u16, rows: u16) -> CoreResult<()> {
        self.master
            .resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })
            .map_err(|e| CoreError::PtyDied(format!("pty resize failed: {e}")))
    }

    /// Sends `SIGTERM` (via `Child::kill`, which portable-pty maps to a
    /// graceful terminate where the platform supports it) to the child.
    pub fn terminate(&mut self) -> CoreResult<()> {
        self.child
            .kill()
            .map_err(|e| CoreError::PtyDied(format!("failed to terminate multiplexer: {e}")))
    }

    /// Blocks until the child process exits, returning its exit status
    /// description. Used by the session controller during the
    /// `Draining` -> `Dead` transition after the shutdown grace period.
    pub fn wait(&mut self) -> CoreResult<String> {
        self.child
            .wait()
            .map(|status| format!("{status:?}"))
            .map_err(|e| CoreError::PtyDied(format!("failed to wait on multiplexer: {e}")))
    }
}

impl Drop for PtyHost {
    fn drop(&mut self) {
        let _ = self.child.kill();
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Reads the PTY's raw byte stream on a blocking OS thread, reassembling
/// complete lines (tolerating a `\r\n` or bare `\n` terminator) and
/// forwarding them to the async side. Exits (and sends `PtyLine::Exit`)
/// when the PTY reports EOF or a read error.
fn read_lines(mut reader: Box<dyn Read + Send>, tx: &mpsc::UnboundedSender<PtyLine>) {
    let mut chunk = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => {
                let _ = tx.send(PtyLine::Exit { message: "pty reached eof".to_string() });
                return;
            }
            Ok(n) => {
                pending.extend_from_slice(&chunk[..n]);
                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let mut line: Vec<u8> = pending.drain(..=pos).collect();
                    line.pop(); // drop the '\n'
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    let line = String::from_utf8_lossy(&line).into_owned();
                    if tx.send(PtyLine::Line(line)).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(PtyLine::Exit { message: format!("pty read error: {e}") });
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_identity_has_expected_prefix() {
        let id = client_identity();
        assert!(id.starts_with(CLIENT_NAME_PREFIX));
    }

    #[test]
    fn client_identity_is_unique_per_call() {
        assert_ne!(client_identity(), client_identity());
    }

    // Exercises the real line-splitting loop without spawning a PTY: feeds
    // a reader built from an in-memory byte source and checks line framing,
    // CRLF trimming, and the final Exit event on EOF.
    #[test]
    fn read_lines_splits_on_lf_and_trims_cr() {
        let data = b"first\r\nsecond\nthird".to_vec();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader: Box<dyn Read + Send> = Box::new(std::io::Cursor::new(data));
        read_lines(reader, &tx);

        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        assert!(matches!(&lines[0], PtyLine::Line(s) if s == "first"));
        assert!(matches!(&lines[1], PtyLine::Line(s) if s == "second"));
        assert!(matches!(&lines[2], PtyLine::Exit { .. }));
    }

    #[test]
    #[ignore = "spawns a real PTY and shell; run explicitly in an environment with one available"]
    fn spawn_runs_a_real_shell_round_trip() {
        let (host, mut rx) = PtyHost::spawn(
            Path::new("bash"),
            &["-c".to_string(), "echo hello-from-pty".to_string()],
            Path::new("."),
        )
        .expect("spawn bash under pty");

        let mut saw_greeting = false;
        while let Some(line) = rx.blocking_recv() {
            if let PtyLine::Line(text) = &line {
                if text.contains("hello-from-pty") {
                    saw_greeting = true;
                    break;
                }
            }
            if matches!(line, PtyLine::Exit { .. }) {
                break;
            }
        }
        assert!(saw_greeting);
        drop(host);
    }
}
