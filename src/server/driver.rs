//! Session driver boundary
//!
//! The wire-level session protocol and the unit codec are not part of this
//! crate. A driver owns everything on the socket side of the seam:
//! handshaking, command negotiation, decoding inbound bytes into media
//! units, and encoding delivered units back out.

use std::future::Future;

use tokio::net::TcpStream;

use crate::error::Result;
use crate::session::ConnectionSession;

/// Protocol driver for one accepted connection
///
/// The listener hands each accepted socket to `drive` on its own task and
/// expects the driver to run the connection to completion: translate
/// protocol commands into `session` operations, feed decoded units through
/// [`ConnectionSession::handle_unit`], and bind a sink at play time that
/// writes delivered units to the socket.
pub trait SessionDriver: Send + Sync + 'static {
    /// Run the connection to completion
    ///
    /// The driver must call `session.disconnect()` on its way out — on
    /// clean close and protocol error alike — so held roles are released.
    /// A malformed metadata payload is dropped, not fatal: the publisher
    /// keeps going.
    fn drive(
        &self,
        socket: TcpStream,
        session: ConnectionSession,
    ) -> impl Future<Output = Result<()>> + Send;
}
