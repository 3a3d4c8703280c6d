//! In-process relay demo
//!
//! Run with: cargo run --example relay_demo
//!
//! Publishes a short synthetic stream into a channel while two consumers
//! attach at different times. The late joiner is primed with the cached
//! sequence header and most recent keyframe before it sees live units, and
//! each consumer's timestamps start at zero regardless of when it joined.
//!
//! Set RUST_LOG=relay_rs=debug to watch the relay's own log events.

use std::sync::Arc;

use bytes::Bytes;

use relay_rs::{
    ChannelRegistry, MediaUnit, RelayAdapter, UnitSink, VideoFrameType, VideoPacketType,
};

fn printing_sink(label: &'static str) -> UnitSink {
    Box::new(move |unit: MediaUnit| {
        Box::pin(async move {
            println!(
                "[{label}] t={:>4}ms {:<8} {:?}",
                unit.timestamp,
                unit.kind(),
                String::from_utf8_lossy(unit.data())
            );
            Ok(())
        })
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let registry = Arc::new(ChannelRegistry::new());
    let adapter = RelayAdapter::new(Arc::clone(&registry));

    let publisher = adapter.publish_request("demo").await?;

    // Early joiner: attached before the first frame.
    adapter.play_request("demo", printing_sink("early")).await?;

    publisher
        .publish(MediaUnit::video(
            0,
            VideoFrameType::Key,
            VideoPacketType::SequenceHeader,
            Bytes::from_static(b"sps+pps"),
        ))
        .await;
    publisher
        .publish(MediaUnit::video(
            40,
            VideoFrameType::Key,
            VideoPacketType::NalUnit,
            Bytes::from_static(b"keyframe-1"),
        ))
        .await;
    publisher
        .publish(MediaUnit::audio(60, Bytes::from_static(b"aac-1")))
        .await;
    publisher
        .publish(MediaUnit::video(
            80,
            VideoFrameType::Inter,
            VideoPacketType::NalUnit,
            Bytes::from_static(b"inter-1"),
        ))
        .await;

    println!("--- late consumer joins ---");
    let late = adapter.play_request("demo", printing_sink("late ")).await?;

    // The next video unit primes the late joiner with the cached header
    // and keyframe; inter-2 itself reaches only the early consumer.
    publisher
        .publish(MediaUnit::video(
            120,
            VideoFrameType::Inter,
            VideoPacketType::NalUnit,
            Bytes::from_static(b"inter-2"),
        ))
        .await;
    publisher
        .publish(MediaUnit::video(
            160,
            VideoFrameType::Inter,
            VideoPacketType::NalUnit,
            Bytes::from_static(b"inter-3"),
        ))
        .await;

    println!("--- publisher detaches, channel tears down ---");
    publisher.detach().await;

    assert!(late.is_closed());
    println!("live channels: {}", registry.channel_count().await);

    Ok(())
}
