//! Live-media relay library
//!
//! One producer publishes timestamped audio/video/metadata units under a
//! named channel; any number of consumers attach to that channel and
//! receive the same units in order. A consumer joining mid-stream is
//! primed with the cached video sequence header and most recent keyframe,
//! so it can decode immediately instead of waiting for the producer's next
//! keyframe. Every consumer sees its own zero-based timeline, baselined to
//! the first timestamp it observed.
//!
//! The wire protocol is deliberately not part of this crate. Implement
//! [`SessionDriver`] over a session/codec library and hand it to
//! [`RelayServer`] for the TCP bootstrap, or drive [`RelayAdapter`]
//! directly for in-process relays (see `demos/relay_demo.rs`).
//!
//! # Modules
//!
//! - [`media`] — the unit model the relay moves around
//! - [`relay`] — registry, channels, subscribers: the fan-out core
//! - [`session`] — the adapter between protocol events and the core
//! - [`server`] — TCP accept loop and the driver seam
//! - [`stats`] — observability snapshots

pub mod error;
pub mod media;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use media::{MediaPayload, MediaUnit, VideoFrameType, VideoPacketType};
pub use relay::{
    Channel, ChannelRegistry, DeliveryResult, PublisherHandle, RelayError, SubscriberHandle,
    UnitSink,
};
pub use server::{RelayServer, ServerConfig, SessionDriver};
pub use session::{ConnectionSession, RelayAdapter, SessionContext};
pub use stats::{ChannelStats, RelayStats};
