//! Subscriber delivery state
//!
//! Each consumer attachment owns a delivery sink plus the state needed to
//! hand that consumer a clean stream: an initialization flag (late joiners
//! are primed with decoder state before seeing live video) and a timestamp
//! baseline (the first non-zero timestamp observed, subtracted from every
//! later unit so each consumer starts at zero regardless of when it
//! joined).
//!
//! Only the channel's publish pass calls `deliver`, so the per-subscriber
//! fields are plain atomics rather than a lock.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::media::MediaUnit;

/// Error returned by a delivery sink
pub type DeliveryError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one delivery attempt
pub type DeliveryResult = Result<(), DeliveryError>;

/// Future returned by a delivery sink
pub type SinkFuture = Pin<Box<dyn Future<Output = DeliveryResult> + Send>>;

/// Delivery callback bound to a subscriber at attach time
///
/// Invoked on the publisher's task; the relay awaits each invocation to
/// completion before moving to the next subscriber. A sink that stalls
/// stalls the channel.
pub type UnitSink = Box<dyn Fn(MediaUnit) -> SinkFuture + Send + Sync>;

/// One consumer attachment to a channel
pub struct Subscriber {
    sink: UnitSink,
    initialized: AtomicBool,
    closed: AtomicBool,
    baseline: AtomicU32,
}

impl Subscriber {
    pub(crate) fn new(sink: UnitSink) -> Self {
        Self {
            sink,
            initialized: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            baseline: AtomicU32::new(0),
        }
    }

    /// Deliver one unit through the sink
    ///
    /// Closed subscribers discard silently. The first non-zero timestamp
    /// observed becomes the baseline; every delivered timestamp is rebased
    /// against it. Sink errors propagate to the caller unretried.
    pub(crate) async fn deliver(&self, mut unit: MediaUnit) -> DeliveryResult {
        if self.is_closed() {
            return Ok(());
        }

        let timestamp = unit.timestamp;
        if timestamp != 0 && self.baseline.load(Ordering::Relaxed) == 0 {
            self.baseline.store(timestamp, Ordering::Relaxed);
        }

        // The baseline never runs ahead of a live timestamp, but a cached
        // priming replay can predate a baseline established by audio;
        // saturate rather than wrap.
        unit.timestamp = timestamp.saturating_sub(self.baseline.load(Ordering::Relaxed));

        (self.sink)(unit).await
    }

    /// Whether the consumer has received its priming frames
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Relaxed);
    }

    /// Whether the subscriber has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the subscriber; idempotent
    ///
    /// Later deliveries are silently discarded. The owning channel sweeps
    /// closed subscribers out of its set on the next publish pass.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Consumer-facing handle to a subscriber
pub struct SubscriberHandle {
    subscriber: Arc<Subscriber>,
}

impl SubscriberHandle {
    pub(crate) fn new(subscriber: Arc<Subscriber>) -> Self {
        Self { subscriber }
    }

    /// Close the subscriber; idempotent
    pub fn close(&self) {
        self.subscriber.close();
    }

    /// Whether the subscriber has been closed
    pub fn is_closed(&self) -> bool {
        self.subscriber.is_closed()
    }
}
