//! Media handling for the relay
//!
//! This module provides the unit model the relay moves around. The relay
//! never inspects payload bytes; it routes on the kind tags alone.

pub mod unit;

pub use unit::{MediaPayload, MediaUnit, VideoFrameType, VideoPacketType};
