//! Channel state and fan-out
//!
//! A channel owns one named stream: the single publisher slot, the cached
//! video sequence header and most recent keyframe, and the set of attached
//! subscribers. `publish` is the fan-out path; it also primes late joiners
//! with the cached decoder state so they can decode without waiting for
//! the producer's next keyframe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::media::{MediaPayload, MediaUnit, VideoFrameType, VideoPacketType};
use crate::relay::error::RelayError;
use crate::relay::registry::ChannelRegistry;
use crate::relay::subscriber::{Subscriber, SubscriberHandle, UnitSink};
use crate::stats::ChannelStats;

/// State guarded by the channel lock
struct ChannelState {
    publisher_present: bool,
    sequence_header: Option<MediaUnit>,
    last_keyframe: Option<MediaUnit>,
    subscribers: Vec<Arc<Subscriber>>,
}

/// One named stream: a single publisher fanning out to many subscribers
pub struct Channel {
    name: String,
    state: Mutex<ChannelState>,
    units_relayed: AtomicU64,
    delivery_failures: AtomicU64,
}

impl Channel {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ChannelState {
                publisher_present: false,
                sequence_header: None,
                last_keyframe: None,
                subscribers: Vec::new(),
            }),
            units_relayed: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        }
    }

    /// Stream name this channel relays
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Claim the single publisher slot
    pub(crate) async fn attach_publisher(&self) -> Result<(), RelayError> {
        let mut state = self.state.lock().await;
        if state.publisher_present {
            return Err(RelayError::PublisherSlotTaken(self.name.clone()));
        }
        state.publisher_present = true;
        Ok(())
    }

    /// Attach a subscriber with its delivery sink already bound
    pub(crate) async fn attach_subscriber(&self, sink: UnitSink) -> SubscriberHandle {
        let subscriber = Arc::new(Subscriber::new(sink));

        let mut state = self.state.lock().await;
        state.subscribers.push(Arc::clone(&subscriber));
        tracing::debug!(
            stream = %self.name,
            subscribers = state.subscribers.len(),
            "Subscriber attached"
        );

        SubscriberHandle::new(subscriber)
    }

    /// Fan one unit out to every subscriber
    ///
    /// Cache updates, the closed-subscriber sweep, and the subscriber
    /// snapshot share one short critical section; every delivery happens
    /// with the lock released. A subscriber attaching during fan-out lands
    /// in the next publish pass.
    pub async fn publish(&self, unit: MediaUnit) {
        let (subscribers, sequence_header, last_keyframe) = {
            let mut state = self.state.lock().await;

            if let MediaPayload::Video { frame, packet, .. } = &unit.payload {
                if *packet == VideoPacketType::SequenceHeader {
                    state.sequence_header = Some(unit.clone());
                }
                if *frame == VideoFrameType::Key {
                    state.last_keyframe = Some(unit.clone());
                }
            }

            state.subscribers.retain(|s| !s.is_closed());

            (
                state.subscribers.clone(),
                state.sequence_header.clone(),
                state.last_keyframe.clone(),
            )
        };

        tracing::trace!(
            stream = %self.name,
            kind = unit.kind(),
            timestamp = unit.timestamp,
            subscribers = subscribers.len(),
            "Relaying unit"
        );

        match &unit.payload {
            // Audio and metadata flow to everyone, primed or not.
            MediaPayload::Audio(_) | MediaPayload::Metadata(_) => {
                for subscriber in &subscribers {
                    self.dispatch(subscriber, unit.detached_copy()).await;
                }
            }
            MediaPayload::Video { .. } => {
                for subscriber in &subscribers {
                    if !subscriber.is_initialized() {
                        // Prime the joiner with the cached decoder state.
                        // The current unit is dropped for this subscriber
                        // this round: the cached keyframe stands in for it,
                        // and a possibly-inter frame on top of an
                        // out-of-order keyframe would desynchronize decode.
                        if let Some(header) = &sequence_header {
                            self.dispatch(subscriber, header.detached_copy()).await;
                        }
                        if let Some(keyframe) = &last_keyframe {
                            self.dispatch(subscriber, keyframe.detached_copy()).await;
                        }
                        subscriber.mark_initialized();
                        continue;
                    }

                    self.dispatch(subscriber, unit.detached_copy()).await;
                }
            }
        }

        self.units_relayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Deliver one unit to one subscriber, best effort
    ///
    /// A failing sink never aborts fan-out to the remaining subscribers
    /// and never surfaces to the publisher.
    async fn dispatch(&self, subscriber: &Subscriber, unit: MediaUnit) {
        if let Err(e) = subscriber.deliver(unit).await {
            self.delivery_failures.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                stream = %self.name,
                error = %e,
                "Delivery failed, subscriber skipped"
            );
        }
    }

    /// Close every subscriber and release the publisher slot
    pub(crate) async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        for subscriber in state.subscribers.drain(..) {
            subscriber.close();
        }
        state.publisher_present = false;
        tracing::info!(stream = %self.name, "Channel shut down");
    }

    /// Whether a publisher currently holds the slot
    pub async fn has_publisher(&self) -> bool {
        self.state.lock().await.publisher_present
    }

    /// Number of attached subscribers
    ///
    /// Closed subscribers linger until the next publish sweep.
    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }

    /// Snapshot of channel statistics
    pub async fn stats(&self) -> ChannelStats {
        let state = self.state.lock().await;
        ChannelStats {
            subscriber_count: state.subscribers.len(),
            publisher_present: state.publisher_present,
            has_sequence_header: state.sequence_header.is_some(),
            has_keyframe: state.last_keyframe.is_some(),
            units_relayed: self.units_relayed.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Producer-facing handle to a channel
///
/// Holding the handle is holding the channel's publisher slot. `detach`
/// consumes the handle, so nothing can publish through it afterwards.
pub struct PublisherHandle {
    channel: Arc<Channel>,
    registry: Arc<ChannelRegistry>,
}

impl PublisherHandle {
    pub(crate) fn new(channel: Arc<Channel>, registry: Arc<ChannelRegistry>) -> Self {
        Self { channel, registry }
    }

    /// Channel this handle publishes to
    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Relay one unit to every subscriber of the channel
    pub async fn publish(&self, unit: MediaUnit) {
        self.channel.publish(unit).await;
    }

    /// Tear the channel down
    ///
    /// Closes every attached subscriber and removes the channel's name from
    /// the registry. A channel's life ends here, not in `publish`: with no
    /// producer there is nothing left to relay.
    pub async fn detach(self) {
        self.channel.shutdown().await;
        if let Err(e) = self.registry.remove(self.channel.name()).await {
            tracing::warn!(
                stream = %self.channel.name(),
                error = %e,
                "Channel was already removed at detach"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use bytes::Bytes;

    use super::*;

    fn collecting_sink() -> (UnitSink, Arc<StdMutex<Vec<MediaUnit>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: UnitSink = Box::new(move |unit| {
            let seen = Arc::clone(&sink_seen);
            Box::pin(async move {
                seen.lock().unwrap().push(unit);
                Ok(())
            })
        });
        (sink, seen)
    }

    fn failing_sink() -> UnitSink {
        Box::new(|_unit| Box::pin(async { Err("sink refused the unit".into()) }))
    }

    fn sequence_header(timestamp: u32) -> MediaUnit {
        MediaUnit::video(
            timestamp,
            VideoFrameType::Key,
            VideoPacketType::SequenceHeader,
            Bytes::from_static(b"sps+pps"),
        )
    }

    fn keyframe(timestamp: u32) -> MediaUnit {
        MediaUnit::video(
            timestamp,
            VideoFrameType::Key,
            VideoPacketType::NalUnit,
            Bytes::from_static(b"keyframe"),
        )
    }

    fn inter_frame(timestamp: u32, data: &'static [u8]) -> MediaUnit {
        MediaUnit::video(
            timestamp,
            VideoFrameType::Inter,
            VideoPacketType::NalUnit,
            Bytes::from_static(data),
        )
    }

    #[tokio::test]
    async fn test_late_joiner_primed_with_header_and_keyframe() {
        let channel = Channel::new("live");

        channel.publish(sequence_header(0)).await;
        channel.publish(keyframe(40)).await;

        // Joins after the keyframe went out.
        let (sink, seen) = collecting_sink();
        let _handle = channel.attach_subscriber(sink).await;

        // First video unit after the join primes the subscriber; the inter
        // frame itself is dropped for it this round.
        channel.publish(inter_frame(80, b"u1")).await;

        {
            let units = seen.lock().unwrap();
            assert_eq!(units.len(), 2);
            assert!(units[0].is_sequence_header());
            assert!(units[1].is_keyframe());
            assert!(!units.iter().any(|u| u.data().as_ref() == b"u1"));
        }

        // The next unit flows normally.
        channel.publish(inter_frame(120, b"u2")).await;

        let units = seen.lock().unwrap();
        assert_eq!(units.len(), 3);
        assert_eq!(units[2].data().as_ref(), b"u2");
    }

    #[tokio::test]
    async fn test_priming_without_caches_still_initializes() {
        let channel = Channel::new("live");

        let (sink, seen) = collecting_sink();
        let _handle = channel.attach_subscriber(sink).await;

        // No header or keyframe cached yet: the first video round delivers
        // nothing but still flips the subscriber to initialized.
        channel.publish(inter_frame(10, b"u1")).await;
        channel.publish(inter_frame(20, b"u2")).await;

        let units = seen.lock().unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].data().as_ref(), b"u2");
    }

    #[tokio::test]
    async fn test_audio_bypasses_initialization() {
        let channel = Channel::new("live");

        let (sink, seen) = collecting_sink();
        let _handle = channel.attach_subscriber(sink).await;

        channel
            .publish(MediaUnit::audio(10, Bytes::from_static(b"a1")))
            .await;
        channel
            .publish(MediaUnit::metadata(0, Bytes::from_static(b"meta")))
            .await;

        let units = seen.lock().unwrap();
        assert_eq!(units.len(), 2);

        // Audio and metadata never count as priming.
        assert_eq!(channel.subscriber_count().await, 1);
    }

    #[tokio::test]
    async fn test_fanout_survives_failing_sink() {
        let channel = Channel::new("live");

        let _bad = channel.attach_subscriber(failing_sink()).await;
        let (sink, seen) = collecting_sink();
        let _good = channel.attach_subscriber(sink).await;

        channel
            .publish(MediaUnit::audio(10, Bytes::from_static(b"a1")))
            .await;

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(channel.stats().await.delivery_failures, 1);
    }

    #[tokio::test]
    async fn test_deliveries_do_not_alias_between_subscribers() {
        let channel = Channel::new("live");

        let (sink_a, seen_a) = collecting_sink();
        let (sink_b, seen_b) = collecting_sink();
        let _a = channel.attach_subscriber(sink_a).await;
        let _b = channel.attach_subscriber(sink_b).await;

        channel
            .publish(MediaUnit::audio(10, Bytes::from(vec![1, 2, 3])))
            .await;

        let a_units = seen_a.lock().unwrap();
        let b_units = seen_b.lock().unwrap();
        assert_eq!(a_units[0].data(), b_units[0].data());
        assert_ne!(a_units[0].data().as_ptr(), b_units[0].data().as_ptr());
    }

    #[tokio::test]
    async fn test_per_subscriber_timelines_are_independent() {
        let channel = Channel::new("live");

        let (sink_a, seen_a) = collecting_sink();
        let _a = channel.attach_subscriber(sink_a).await;
        channel
            .publish(MediaUnit::audio(100, Bytes::from_static(b"a")))
            .await;

        let (sink_b, seen_b) = collecting_sink();
        let _b = channel.attach_subscriber(sink_b).await;
        channel
            .publish(MediaUnit::audio(500, Bytes::from_static(b"a")))
            .await;
        channel
            .publish(MediaUnit::audio(600, Bytes::from_static(b"a")))
            .await;

        // Each consumer is baselined to the first timestamp it observed.
        let a_ts: Vec<u32> = seen_a.lock().unwrap().iter().map(|u| u.timestamp).collect();
        let b_ts: Vec<u32> = seen_b.lock().unwrap().iter().map(|u| u.timestamp).collect();
        assert_eq!(a_ts, vec![0, 400, 500]);
        assert_eq!(b_ts, vec![0, 100]);
    }

    #[tokio::test]
    async fn test_closed_subscribers_swept_on_publish() {
        let channel = Channel::new("live");

        let (sink, _seen) = collecting_sink();
        let handle = channel.attach_subscriber(sink).await;
        assert_eq!(channel.subscriber_count().await, 1);

        handle.close();
        assert_eq!(channel.subscriber_count().await, 1);

        channel
            .publish(MediaUnit::audio(10, Bytes::from_static(b"a1")))
            .await;
        assert_eq!(channel.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_second_publisher_rejected() {
        let channel = Channel::new("live");

        channel.attach_publisher().await.unwrap();
        let result = channel.attach_publisher().await;

        assert_eq!(
            result,
            Err(RelayError::PublisherSlotTaken("live".to_string()))
        );
    }

    #[tokio::test]
    async fn test_detach_tears_channel_down() {
        let registry = Arc::new(ChannelRegistry::new());
        let channel = registry.create("live").await.unwrap();
        channel.attach_publisher().await.unwrap();
        let publisher = PublisherHandle::new(Arc::clone(&channel), Arc::clone(&registry));

        let (sink, seen) = collecting_sink();
        let subscriber = channel.attach_subscriber(sink).await;

        publisher.detach().await;

        // Subscriber is closed, later deliveries are no-ops, and the name
        // is free again.
        assert!(subscriber.is_closed());
        channel
            .publish(MediaUnit::audio(10, Bytes::from_static(b"a1")))
            .await;
        assert!(seen.lock().unwrap().is_empty());
        assert!(matches!(
            registry.get("live").await,
            Err(RelayError::StreamNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let channel = Channel::new("live");
        channel.attach_publisher().await.unwrap();

        let (sink, _seen) = collecting_sink();
        let _handle = channel.attach_subscriber(sink).await;

        channel.publish(sequence_header(0)).await;
        channel.publish(keyframe(40)).await;

        let stats = channel.stats().await;
        assert!(stats.publisher_present);
        assert!(stats.has_sequence_header);
        assert!(stats.has_keyframe);
        assert_eq!(stats.subscriber_count, 1);
        assert_eq!(stats.units_relayed, 2);
        assert_eq!(stats.delivery_failures, 0);
    }
}
