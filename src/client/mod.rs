//! Browser-facing WebSocket frame schemas and close-code policy.

pub mod connection;
pub mod link;

pub use connection::serve;
pub use link::{
    client_channel, parse_pane_id, AuthHook, ClientFrame, ClientOutbound, ClientSender, CloseCode,
    PassthroughAuth, ServerFrame,
};
