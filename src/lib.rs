//! Control multiplexer core: the subsystem that owns one long-lived
//! control attachment to a terminal multiplexer per logical session,
//! demultiplexes its output to browser clients over WebSocket, and
//! arbitrates layout, resize, split, kill, zoom, and scroll commands.
//!
//! HTTP routing, static asset serving, token-based authentication, TLS
//! termination, and frontend rendering are out of scope (see `spec.md`
//! §1) and are left to external collaborators; this crate's binary wires
//! the core to a bare WebSocket listener only so it is runnable end to
//! end.

pub mod client;
pub mod command;
pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod events;
pub mod pty;
pub mod registry;
pub mod resize;
pub mod session;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use session::{ControllerHandle, ControllerState, SessionController, Supervisor};
