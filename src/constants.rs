//! Application-wide constants for the control multiplexer core.
//!
//! Centralizes the timing and sizing values named in the component
//! design: debounce windows, tolerances, timeouts, and buffer capacities.

use std::time::Duration;

// ============================================================================
// PTY boot geometry
// ============================================================================

/// Initial PTY geometry forced before the control-mode attach. Never 0x0.
pub const INITIAL_COLS: u16 = 80;
/// Initial PTY geometry forced before the control-mode attach. Never 0x0.
pub const INITIAL_ROWS: u16 = 24;

// ============================================================================
// Resize Arbiter
// ============================================================================

/// Debounce window for whole-window resize proposals.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Debounce window for per-pane drag-resize dispatch.
pub const PANE_RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Tolerance, in cells, below which a proposed resize is suppressed as a
/// no-op against the last sent size.
pub const RESIZE_TOLERANCE_CELLS: u16 = 3;

/// Safety timeout clearing the `pending` flag if no `%layout-change`
/// arrives to clear it first.
pub const RESIZE_PENDING_TIMEOUT: Duration = Duration::from_millis(500);

// ============================================================================
// Command Dispatcher / protocol framing
// ============================================================================

/// Time to wait for a `%begin`/`%end` (or `%error`) reply to an issued
/// command before giving up and dropping it.
pub const COMMAND_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Session Controller
// ============================================================================

/// Idle timeout in the `Draining` state before the controller detaches
/// and transitions to `Dead`.
pub const DRAINING_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Grace period between SIGTERM and SIGKILL when tearing down the PTY
/// host's child process.
pub const SHUTDOWN_KILL_GRACE: Duration = Duration::from_secs(2);

/// Prefix used for this host's control-mode client identity, so orphan
/// sweeps can recognize and detach stale attachments from prior runs.
pub const CLIENT_NAME_PREFIX: &str = "cchub-";

// ============================================================================
// Pane Registry
// ============================================================================

/// Minimum capacity of the per-pane output ring buffer used to hold
/// bytes that arrive before a pane's first subscriber.
pub const PANE_RING_BUFFER_CAPACITY: usize = 64 * 1024;

// ============================================================================
// Client Link
// ============================================================================

/// Maximum number of queued outbound frames per client before it is
/// considered a slow consumer and closed.
pub const CLIENT_SEND_QUEUE_CAPACITY: usize = 256;

/// Suggested client reconnect delay after an internal-error close (4500).
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

// ============================================================================
// Tuning
// ============================================================================

/// The subset of timing/sizing constants above that a deployment can
/// override at runtime through [`crate::Config`], bundled so a
/// [`crate::session::controller::SpawnSpec`] can carry one value instead
/// of five. `Default` reproduces the bare constants above exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    /// See [`DRAINING_IDLE_TIMEOUT`].
    pub draining_idle_timeout: Duration,
    /// See [`RESIZE_DEBOUNCE`].
    pub resize_debounce: Duration,
    /// See [`PANE_RESIZE_DEBOUNCE`].
    pub pane_resize_debounce: Duration,
    /// See [`RESIZE_TOLERANCE_CELLS`].
    pub resize_tolerance_cells: u16,
    /// See [`RESIZE_PENDING_TIMEOUT`].
    pub resize_pending_timeout: Duration,
    /// See [`COMMAND_REPLY_TIMEOUT`].
    pub command_reply_timeout: Duration,
    /// See [`PANE_RING_BUFFER_CAPACITY`].
    pub pane_ring_buffer_capacity: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            draining_idle_timeout: DRAINING_IDLE_TIMEOUT,
            resize_debounce: RESIZE_DEBOUNCE,
            pane_resize_debounce: PANE_RESIZE_DEBOUNCE,
            resize_tolerance_cells: RESIZE_TOLERANCE_CELLS,
            resize_pending_timeout: RESIZE_PENDING_TIMEOUT,
            command_reply_timeout: COMMAND_REPLY_TIMEOUT,
            pane_ring_buffer_capacity: PANE_RING_BUFFER_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_geometry_is_never_zero() {
        assert_ne!(INITIAL_COLS, 0);
        assert_ne!(INITIAL_ROWS, 0);
    }

    #[test]
    fn timing_constants_are_ordered_sanely() {
        assert!(RESIZE_DEBOUNCE < RESIZE_PENDING_TIMEOUT);
        assert!(PANE_RESIZE_DEBOUNCE < COMMAND_REPLY_TIMEOUT);
        assert!(RESIZE_PENDING_TIMEOUT < DRAINING_IDLE_TIMEOUT);
    }

    #[test]
    fn ring_buffer_capacity_meets_spec_minimum() {
        assert!(PANE_RING_BUFFER_CAPACITY >= 64 * 1024);
    }

    #[test]
    fn default_tuning_matches_bare_constants() {
        let tuning = Tuning::default();
        assert_eq!(tuning.draining_idle_timeout, DRAINING_IDLE_TIMEOUT);
        assert_eq!(tuning.resize_debounce, RESIZE_DEBOUNCE);
        assert_eq!(tuning.pane_resize_debounce, PANE_RESIZE_DEBOUNCE);
        assert_eq!(tuning.resize_tolerance_cells, RESIZE_TOLERANCE_CELLS);
        assert_eq!(tuning.resize_pending_timeout, RESIZE_PENDING_TIMEOUT);
        assert_eq!(tuning.command_reply_timeout, COMMAND_REPLY_TIMEOUT);
        assert_eq!(tuning.pane_ring_buffer_capacity, PANE_RING_BUFFER_CAPACITY);
    }
}
