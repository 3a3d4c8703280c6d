//! Relay core: named channels with single-publisher fan-out
//!
//! The registry maps stream names to channels; each channel couples one
//! publisher to any number of subscribers and replays cached decoder state
//! to consumers that join mid-stream.
//!
//! # Architecture
//!
//! ```text
//!                      Arc<ChannelRegistry>
//!                 ┌─────────────────────────────┐
//!                 │ channels: HashMap<String,   │
//!                 │   Arc<Channel> {            │
//!                 │     sequence_header,        │
//!                 │     last_keyframe,          │
//!                 │     subscribers,            │
//!                 │   }                         │
//!                 │ >                           │
//!                 └──────────────┬──────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Publisher]            [Subscriber]            [Subscriber]
//!   handle.publish()       sink(unit)              sink(unit)
//!        │                       ▲                       ▲
//!        └──► Channel.publish ───┴───────────────────────┘
//! ```
//!
//! # Deep-Copy Design
//!
//! The channel caches hold `bytes::Bytes`, so keeping the last sequence
//! header and keyframe around is reference counting, not copying. The
//! delivery boundary is the opposite: every subscriber gets a detached
//! copy of every unit, because subscribers rebase timestamps on their copy
//! and delivery sinks may consume the buffer they are handed.
//!
//! # Delivery Model
//!
//! `publish` runs on the publisher's own task and awaits each subscriber's
//! sink in turn — no queue sits between a channel and its subscribers, so
//! per-subscriber ordering is publish order by construction and a stalled
//! sink stalls the channel. Sink failures are counted and skipped; they
//! never abort fan-out to the remaining subscribers.

pub mod channel;
pub mod error;
pub mod registry;
pub mod subscriber;

pub use channel::{Channel, PublisherHandle};
pub use error::RelayError;
pub use registry::ChannelRegistry;
pub use subscriber::{
    DeliveryError, DeliveryResult, SinkFuture, Subscriber, SubscriberHandle, UnitSink,
};
