//! Session controller (component I) and registry supervisor (component K).
//!
//! A [`SessionController`] owns one PTY-hosted multiplexer attachment end
//! to end: the PTY host, the control-mode line parser, the layout tree,
//! the pane registry, the resize arbiter, and the set of attached client
//! links. It runs as a single actor task so every one of those pieces is
//! mutated from exactly one place. The [`Supervisor`] is the process-wide
//! map from session id to a running controller's mailbox handle.

pub mod controller;
pub mod supervisor;

pub use controller::{ControllerHandle, ControllerState, SessionController, SpawnSpec};
pub use supervisor::Supervisor;
