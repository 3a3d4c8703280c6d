//! Relay server bootstrap
//!
//! Thin process-facing layer: configuration, the TCP accept loop, and the
//! [`SessionDriver`] seam behind which the wire protocol lives.

pub mod config;
pub mod driver;
pub mod listener;

pub use config::ServerConfig;
pub use driver::SessionDriver;
pub use listener::RelayServer;
