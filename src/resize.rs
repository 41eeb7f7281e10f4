//! Resize arbiter (component G).
//!
//! Debounces client-proposed window sizes down to one `refresh-client`
//! command, reconciling multiple attached clients to the smallest common
//! size and suppressing oscillation against the multiplexer's own border
//! rounding. A second, independently debounced path handles per-pane
//! drag-resize.

use std::collections::HashMap;
use std::time::Duration;

use crate::constants::{PANE_RESIZE_DEBOUNCE, RESIZE_DEBOUNCE, RESIZE_TOLERANCE_CELLS};

/// A terminal size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    fn within_tolerance_of(self, other: Size, tolerance_cells: u16) -> bool {
        self.cols.abs_diff(other.cols) <= tolerance_cells
            && self.rows.abs_diff(other.rows) <= tolerance_cells
    }
}

/// What the arbiter decided to do with a resize tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDecision {
    /// Send `refresh-client -C {cols}x{rows}` and mark `pending`.
    Send(Size),
    /// A prior resize is still pending a `%layout-change`; skip this tick.
    SkipPending,
    /// The proposal is within tolerance of the last sent size; suppress.
    SkipTolerance,
    /// No clients are attached, so there is nothing to propose.
    SkipNoClients,
}

/// Debounces per-window resize proposals across all attached clients.
///
/// Owned and driven entirely by the session controller's actor loop: the
/// controller is responsible for actually debouncing calls to
/// [`Self::propose`] by `RESIZE_DEBOUNCE`/`PANE_RESIZE_DEBOUNCE` (it owns
/// the only timer), and for clearing `pending` via [`Self::on_layout_change`]
/// or a safety-timeout call to [`Self::clear_pending`].
#[derive(Debug)]
pub struct ResizeArbiter {
    client_sizes: HashMap<u64, Size>,
    last_sent_size: Option<Size>,
    pending: bool,
    tolerance_cells: u16,
}

impl Default for ResizeArbiter {
    fn default() -> Self {
        Self::with_tolerance(RESIZE_TOLERANCE_CELLS)
    }
}

impl ResizeArbiter {
    /// Creates an arbiter with no attached clients and no prior proposal,
    /// using the default tolerance ([`RESIZE_TOLERANCE_CELLS`]).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arbiter with a deployment-configured tolerance (spec.md
    /// §4.G's "±3 cell tolerance" as a tunable rather than a hardcoded
    /// constant; see [`crate::constants::Tuning::resize_tolerance_cells`]).
    #[must_use]
    pub fn with_tolerance(tolerance_cells: u16) -> Self {
        Self {
            client_sizes: HashMap::new(),
            last_sent_size: None,
            pending: false,
            tolerance_cells,
        }
    }

    /// The default debounce window callers should wait after a
    /// `desiredSize` update before calling [`Self::propose`], when not
    /// overridden by [`crate::constants::Tuning::resize_debounce`].
    #[must_use]
    pub fn debounce_window() -> Duration {
        RESIZE_DEBOUNCE
    }

    /// Records (or updates) a client's desired size.
    pub fn set_client_size(&mut self, client_id: u64, size: Size) {
        self.client_sizes.insert(client_id, size);
    }

    /// Drops a client's desired size, e.g. when it disconnects.
    pub fn remove_client(&mut self, client_id: u64) {
        self.client_sizes.remove(&client_id);
    }

    /// Runs one debounced resize tick: computes the minimum cols and rows
    /// across all attached clients, and decides whether to actually send
    /// a `refresh-client`.
    pub fn propose(&mut self) -> ResizeDecision {
        let Some(proposed) = self.minimum_size() else {
            return ResizeDecision::SkipNoClients;
        };

        if self.pending {
            return ResizeDecision::SkipPending;
        }

        if let Some(last) = self.last_sent_size {
            if proposed.within_tolerance_of(last, self.tolerance_cells) {
                return ResizeDecision::SkipTolerance;
            }
        }

        self.last_sent_size = Some(proposed);
        self.pending = true;
        ResizeDecision::Send(proposed)
    }

    /// Computes the minimum cols and minimum rows across all attached
    /// clients' desired sizes; `None` if no client is attached.
    fn minimum_size(&self) -> Option<Size> {
        let mut sizes = self.client_sizes.values();
        let first = *sizes.next()?;
        let (cols, rows) = sizes.fold((first.cols, first.rows), |(cols, rows), s| {
            (cols.min(s.cols), rows.min(s.rows))
        });
        Some(Size::new(cols, rows))
    }

    /// Clears `pending` on receipt of the next `%layout-change`, and
    /// applies the "last-write-wins" cross-client rule: if the window
    /// size the multiplexer reports differs from `lastSentSize` by more
    /// than the tolerance on either axis, forget `lastSentSize` so the
    /// next local update re-asserts our view.
    pub fn on_layout_change(&mut self, reported: Size) {
        self.pending = false;
        if let Some(last) = self.last_sent_size {
            if !reported.within_tolerance_of(last, self.tolerance_cells) {
                self.last_sent_size = None;
            }
        }
    }

    /// Clears `pending` after the safety timeout elapses with no
    /// `%layout-change` having arrived.
    pub fn clear_pending(&mut self) {
        self.pending = false;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    #[must_use]
    pub fn last_sent_size(&self) -> Option<Size> {
        self.last_sent_size
    }
}

/// Debounces per-pane drag-resize events independently of the whole-window
/// arbiter above.
#[derive(Debug, Default)]
pub struct PaneResizeDebouncer {
    latest: HashMap<u32, Size>,
}

impl PaneResizeDebouncer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default debounce window callers should wait after the last
    /// pane-drag event before calling [`Self::drain`], when not overridden
    /// by [`crate::constants::Tuning::pane_resize_debounce`].
    #[must_use]
    pub fn debounce_window() -> Duration {
        PANE_RESIZE_DEBOUNCE
    }

    /// Records the latest proposed size for a dragged pane.
    pub fn propose(&mut self, pane_id: u32, size: Size) {
        self.latest.insert(pane_id, size);
    }

    /// Drains all pending per-pane resizes as `resize-pane -t %N -x C -y R`
    /// commands, oldest-inserted pane first is not guaranteed; callers
    /// that need deterministic ordering should sort by pane id.
    pub fn drain(&mut self) -> Vec<(u32, Size)> {
        let mut pending: Vec<(u32, Size)> = self.latest.drain().collect();
        pending.sort_unstable_by_key(|(id, _)| *id);
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_client_proposal_uses_its_own_size() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(100, 40));
        assert_eq!(arbiter.propose(), ResizeDecision::Send(Size::new(100, 40)));
    }

    #[test]
    fn s5_two_clients_resize_proposal_is_the_minimum_on_each_axis() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(120, 40));
        arbiter.set_client_size(2, Size::new(90, 50));
        assert_eq!(arbiter.propose(), ResizeDecision::Send(Size::new(90, 40)));
    }

    #[test]
    fn no_clients_skips_proposal() {
        let mut arbiter = ResizeArbiter::new();
        assert_eq!(arbiter.propose(), ResizeDecision::SkipNoClients);
    }

    #[test]
    fn pending_resize_suppresses_further_proposals() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(100, 40));
        assert_eq!(arbiter.propose(), ResizeDecision::Send(Size::new(100, 40)));
        assert!(arbiter.is_pending());
        assert_eq!(arbiter.propose(), ResizeDecision::SkipPending);
    }

    #[test]
    fn within_tolerance_proposal_is_suppressed_after_pending_clears() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(100, 40));
        arbiter.propose();
        arbiter.on_layout_change(Size::new(100, 40));

        arbiter.set_client_size(1, Size::new(102, 41));
        assert_eq!(arbiter.propose(), ResizeDecision::SkipTolerance);
    }

    #[test]
    fn outside_tolerance_proposal_sends_again() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(100, 40));
        arbiter.propose();
        arbiter.on_layout_change(Size::new(100, 40));

        arbiter.set_client_size(1, Size::new(110, 40));
        assert_eq!(arbiter.propose(), ResizeDecision::Send(Size::new(110, 40)));
    }

    #[test]
    fn layout_change_clears_pending_flag() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(100, 40));
        arbiter.propose();
        assert!(arbiter.is_pending());
        arbiter.on_layout_change(Size::new(100, 40));
        assert!(!arbiter.is_pending());
    }

    #[test]
    fn safety_timeout_clears_pending_without_layout_change() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(100, 40));
        arbiter.propose();
        arbiter.clear_pending();
        assert!(!arbiter.is_pending());
    }

    #[test]
    fn cross_client_last_write_wins_forgets_stale_last_sent_size() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(100, 40));
        arbiter.propose();
        // The multiplexer reports a size far from what we last sent
        // (e.g. another agent drove a direct resize).
        arbiter.on_layout_change(Size::new(200, 80));
        assert_eq!(arbiter.last_sent_size(), None);
    }

    #[test]
    fn removed_client_no_longer_affects_minimum() {
        let mut arbiter = ResizeArbiter::new();
        arbiter.set_client_size(1, Size::new(90, 40));
        arbiter.set_client_size(2, Size::new(120, 50));
        arbiter.remove_client(1);
        assert_eq!(arbiter.propose(), ResizeDecision::Send(Size::new(120, 50)));
    }

    #[test]
    fn pane_resize_debouncer_drains_latest_size_per_pane_sorted() {
        let mut debouncer = PaneResizeDebouncer::new();
        debouncer.propose(2, Size::new(40, 20));
        debouncer.propose(1, Size::new(30, 15));
        debouncer.propose(2, Size::new(42, 22));
        let drained = debouncer.drain();
        assert_eq!(drained, vec![(1, Size::new(30, 15)), (2, Size::new(42, 22))]);
        assert!(debouncer.drain().is_empty());
    }

    #[test]
    fn configured_tolerance_overrides_the_default() {
        let mut arbiter = ResizeArbiter::with_tolerance(10);
        arbiter.set_client_size(1, Size::new(100, 40));
        arbiter.propose();
        arbiter.on_layout_change(Size::new(100, 40));

        // Within the configured tolerance of 10, though outside the
        // crate-wide default of 3.
        arbiter.set_client_size(1, Size::new(108, 40));
        assert_eq!(arbiter.propose(), ResizeDecision::SkipTolerance);
    }
}
