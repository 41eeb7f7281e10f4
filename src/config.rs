//! Runtime configuration for the control multiplexer core and its
//! standalone WebSocket harness.
//!
//! Layering mirrors the teacher's config module: a `Default` impl with
//! sane constants, an optional file load, then environment variable
//! overrides applied on top.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants;

/// Configuration for the `cchub` binary and the core it wires up.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// Path to the multiplexer binary (tmux or compatible).
    pub multiplexer_bin: PathBuf,
    /// Address the bare WebSocket harness binds to.
    pub bind_addr: String,
    /// Port the bare WebSocket harness binds to.
    pub bind_port: u16,
    /// Idle timeout, in seconds, before a drained session detaches.
    pub draining_idle_timeout_secs: u64,
    /// Resize debounce window, in milliseconds.
    pub resize_debounce_ms: u64,
    /// Per-pane resize debounce window, in milliseconds.
    pub pane_resize_debounce_ms: u64,
    /// Resize tolerance, in cells.
    pub resize_tolerance_cells: u16,
    /// Command reply timeout, in seconds.
    pub command_reply_timeout_secs: u64,
    /// Per-pane ring buffer capacity, in bytes.
    pub pane_ring_buffer_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multiplexer_bin: PathBuf::from("tmux"),
            bind_addr: "127.0.0.1".to_string(),
            bind_port: 7681,
            draining_idle_timeout_secs: constants::DRAINING_IDLE_TIMEOUT.as_secs(),
            resize_debounce_ms: constants::RESIZE_DEBOUNCE.as_millis() as u64,
            pane_resize_debounce_ms: constants::PANE_RESIZE_DEBOUNCE.as_millis() as u64,
            resize_tolerance_cells: constants::RESIZE_TOLERANCE_CELLS,
            command_reply_timeout_secs: constants::COMMAND_REPLY_TIMEOUT.as_secs(),
            pane_ring_buffer_capacity: constants::PANE_RING_BUFFER_CAPACITY,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file, falling back to defaults if
    /// the file is absent or unreadable, then applies environment
    /// variable overrides.
    pub fn load(path: Option<&std::path::Path>) -> Self {
        let mut config = path
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        config
    }

    fn apply_env_overrides(config: &mut Self) {
        if let Ok(bin) = std::env::var("CCHUB_MULTIPLEXER_BIN") {
            config.multiplexer_bin = PathBuf::from(bin);
        }
        if let Ok(addr) = std::env::var("CCHUB_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(port) = std::env::var("CCHUB_BIND_PORT") {
            if let Ok(port) = port.parse() {
                config.bind_port = port;
            }
        }
        if let Ok(secs) = std::env::var("CCHUB_DRAINING_IDLE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.draining_idle_timeout_secs = secs;
            }
        }
    }

    /// Idle timeout in `Draining` as a `Duration`.
    #[must_use]
    pub fn draining_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.draining_idle_timeout_secs)
    }

    /// Resize debounce window as a `Duration`.
    #[must_use]
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Per-pane resize debounce window as a `Duration`.
    #[must_use]
    pub fn pane_resize_debounce(&self) -> Duration {
        Duration::from_millis(self.pane_resize_debounce_ms)
    }

    /// Command reply timeout as a `Duration`.
    #[must_use]
    pub fn command_reply_timeout(&self) -> Duration {
        Duration::from_secs(self.command_reply_timeout_secs)
    }

    /// Builds the [`constants::Tuning`] bundle a session controller reads
    /// its timing/sizing knobs from, reflecting any file/env overrides
    /// applied to this config. The resize safety timeout isn't itself
    /// configurable (spec.md §4.G ties it directly to the debounce
    /// window as a fallback, not an independent deployment knob), so it
    /// is left at its constant default.
    #[must_use]
    pub fn tuning(&self) -> constants::Tuning {
        constants::Tuning {
            draining_idle_timeout: self.draining_idle_timeout(),
            resize_debounce: self.resize_debounce(),
            pane_resize_debounce: self.pane_resize_debounce(),
            resize_tolerance_cells: self.resize_tolerance_cells,
            command_reply_timeout: self.command_reply_timeout(),
            pane_ring_buffer_capacity: self.pane_ring_buffer_capacity,
            ..constants::Tuning::default()
        }
    }
}

impl From<&Config> for constants::Tuning {
    fn from(config: &Config) -> Self {
        config.tuning()
    }
}
