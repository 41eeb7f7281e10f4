//! Pane tracking: the live-pane registry, its pre-subscription ring
//! buffer, and initial content capture.

pub mod capture;
pub mod pane;
pub mod ring_buffer;

pub use pane::{PaneRegistry, PaneRegistryEvent, SubscriberCallback, SubscriptionHandle};
