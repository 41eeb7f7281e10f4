//! Pane registry (component E).
//!
//! Tracks the live set of panes by diffing successive layout trees,
//! fans output bytes out to subscribers in registration order, and
//! buffers output for panes that have not yet been subscribed to.
//!
//! Not internally synchronized: the session controller actor owns the
//! only handle to a `PaneRegistry` and calls into it from its single
//! event loop, matching the "guarded by the controller actor" resource
//! model.

use std::collections::HashMap;

use crate::control::LayoutNode;
use crate::error::{CoreError, CoreResult};
use crate::registry::ring_buffer::RingBuffer;

/// A pane appeared, was resized, or disappeared between two observed
/// layout trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneRegistryEvent {
    /// A pane id present in the new tree but absent from the last one.
    Added { pane_id: u32, w: u16, h: u16 },
    /// A pane id present in both trees with different dimensions.
    Resized { pane_id: u32, w: u16, h: u16 },
    /// A pane id present in the last tree but absent from the new one.
    Removed { pane_id: u32 },
}

/// Callback invoked with output bytes for a subscribed pane.
pub type SubscriberCallback = Box<dyn FnMut(&[u8]) + Send>;

/// Handle returned by [`PaneRegistry::subscribe`]; pass to
/// [`PaneRegistry::unsubscribe`] to stop receiving output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pane_id: u32,
    sub_id: u64,
}

struct Subscriber {
    sub_id: u64,
    callback: SubscriberCallback,
}

struct PaneEntry {
    w: u16,
    h: u16,
    removed: bool,
    buffer: RingBuffer,
    subscribers: Vec<Subscriber>,
    next_sub_id: u64,
}

impl PaneEntry {
    fn new(w: u16, h: u16, ring_capacity: usize) -> Self {
        Self {
            w,
            h,
            removed: false,
            buffer: RingBuffer::new(ring_capacity),
            subscribers: Vec::new(),
            next_sub_id: 0,
        }
    }
}

/// Tracks panes, their live subscribers, and pre-subscription output
/// buffers.
pub struct PaneRegistry {
    panes: HashMap<u32, PaneEntry>,
    ring_capacity: usize,
}

impl Default for PaneRegistry {
    fn default() -> Self {
        Self::with_ring_capacity(crate::constants::PANE_RING_BUFFER_CAPACITY)
    }
}

impl PaneRegistry {
    /// Creates an empty registry with no known panes, using the default
    /// per-pane ring buffer capacity ([`crate::constants::PANE_RING_BUFFER_CAPACITY`]).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose per-pane pre-subscription ring
    /// buffers are sized to `ring_capacity` bytes instead of the crate
    /// default (spec.md §4.E's "bounded ring, ≥64 KiB" as a deployment
    /// tunable; see [`crate::constants::Tuning::pane_ring_buffer_capacity`]).
    #[must_use]
    pub fn with_ring_capacity(ring_capacity: usize) -> Self {
        Self { panes: HashMap::new(), ring_capacity }
    }

    /// Diffs `tree`'s leaves against the previously observed set,
    /// returning `Added`/`Resized`/`Removed` events in no particular
    /// cross-kind order (callers needing a stable order should sort by
    /// `pane_id`).
    pub fn observe(&mut self, tree: &LayoutNode) -> Vec<PaneRegistryEvent> {
        let mut current = Vec::new();
        collect_leaf_dims(tree, &mut current);

        let mut events = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (pane_id, w, h) in current {
            seen.insert(pane_id);
            match self.panes.get_mut(&pane_id) {
                Some(entry) if entry.removed => {
                    // A pane id was reused after removal; treat as fresh.
                    *entry = PaneEntry::new(w, h, self.ring_capacity);
                    events.push(PaneRegistryEvent::Added { pane_id, w, h });
                }
                Some(entry) => {
                    if entry.w != w || entry.h != h {
                        entry.w = w;
                        entry.h = h;
                        events.push(PaneRegistryEvent::Resized { pane_id, w, h });
                    }
                }
                None => {
                    self.panes.insert(pane_id, PaneEntry::new(w, h, self.ring_capacity));
                    events.push(PaneRegistryEvent::Added { pane_id, w, h });
                }
            }
        }

        for (&pane_id, entry) in &mut self.panes {
            if !entry.removed && !seen.contains(&pane_id) {
                entry.removed = true;
                entry.subscribers.clear();
                events.push(PaneRegistryEvent::Removed { pane_id });
            }
        }

        events
    }

    /// Registers `callback` for `pane_id`'s output. If the pane has
    /// buffered output (arrived before any subscriber existed), the
    /// callback is invoked once immediately with that backlog before the
    /// buffer is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PaneGone`] if `pane_id` was observed and has
    /// since been removed from the layout tree.
    pub fn subscribe(
        &mut self,
        pane_id: u32,
        mut callback: SubscriberCallback,
    ) -> CoreResult<SubscriptionHandle> {
        let ring_capacity = self.ring_capacity;
        let entry = self.panes.entry(pane_id).or_insert_with(|| PaneEntry::new(0, 0, ring_capacity));
        if entry.removed {
            return Err(CoreError::PaneGone(format!("%{pane_id}")));
        }

        if !entry.buffer.is_empty() {
            callback(&entry.buffer.to_vec());
            entry.buffer.clear();
        }

        let sub_id = entry.next_sub_id;
        entry.next_sub_id += 1;
        entry.subscribers.push(Subscriber { sub_id, callback });
        Ok(SubscriptionHandle { pane_id, sub_id })
    }

    /// Removes a previously registered subscriber. A no-op if the pane or
    /// subscription no longer exists.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        if let Some(entry) = self.panes.get_mut(&handle.pane_id) {
            entry.subscribers.retain(|s| s.sub_id != handle.sub_id);
        }
    }

    /// Delivers output bytes for `pane_id`. If subscribers exist, they
    /// are invoked in registration order; otherwise the bytes are
    /// appended to the pane's bounded pre-subscription buffer.
    ///
    /// Creates an (unobserved) entry on demand, since output can arrive
    /// before the layout diff that announces the pane.
    pub fn broadcast(&mut self, pane_id: u32, bytes: &[u8]) {
        let ring_capacity = self.ring_capacity;
        let entry = self.panes.entry(pane_id).or_insert_with(|| PaneEntry::new(0, 0, ring_capacity));
        if entry.subscribers.is_empty() {
            entry.buffer.push(bytes);
        } else {
            for subscriber in &mut entry.subscribers {
                (subscriber.callback)(bytes);
            }
        }
    }

    /// True if `pane_id` is known and has not been removed.
    #[must_use]
    pub fn is_live(&self, pane_id: u32) -> bool {
        self.panes.get(&pane_id).is_some_and(|e| !e.removed)
    }

    /// Current set of live pane ids.
    #[must_use]
    pub fn live_pane_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> =
            self.panes.iter().filter(|(_, e)| !e.removed).map(|(&id, _)| id).collect();
        ids.sort_unstable();
        ids
    }
}

fn collect_leaf_dims(node: &LayoutNode, out: &mut Vec<(u32, u16, u16)>) {
    match node {
        LayoutNode::Leaf { pane_id, w, h, .. } => out.push((*pane_id, *w, *h)),
        LayoutNode::HSplit { children, .. } | LayoutNode::VSplit { children, .. } => {
            for child in children {
                collect_leaf_dims(child, out);
            }
        }
    }
}
