//! Session adapter layer
//!
//! Everything between the wire protocol and the relay core: per-connection
//! identity, the role state machine, and the process-wide adapter that
//! session drivers call into.

pub mod adapter;
pub mod context;

pub use adapter::{ConnectionSession, RelayAdapter};
pub use context::SessionContext;
