//! peerbeacon gateway: HTTP and WebSocket transport over the share
//! session lifecycle.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod server;
pub mod state;
