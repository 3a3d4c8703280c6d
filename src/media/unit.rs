//! Media unit model
//!
//! A `MediaUnit` is the unit of relay: one timestamped piece of stream data
//! tagged with its kind. Kinds form a closed sum type, so every routing
//! decision is an exhaustive match and adding a kind surfaces every match
//! site at compile time.
//!
//! Payload buffers are `bytes::Bytes`: cheap to hold in the channel caches
//! (clones are reference-count bumps). At the delivery boundary the relay
//! hands every subscriber a [`detached_copy`](MediaUnit::detached_copy)
//! instead — subscribers rebase the timestamp on their copy, and downstream
//! protocol writers may consume or recycle the buffer.

use bytes::Bytes;

/// Video frame type (decode dependency class)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameType {
    /// Self-contained frame, decodable without prior frames
    Key,
    /// Frame predicted from prior frames
    Inter,
}

/// Video packet type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPacketType {
    /// Codec configuration (SPS/PPS); required before any inter frame decodes
    SequenceHeader,
    /// Coded picture data
    NalUnit,
    /// End-of-stream marker
    EndOfSequence,
}

/// Kind-specific payload of a media unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPayload {
    /// Coded audio
    Audio(Bytes),
    /// Coded video, tagged with frame and packet type
    Video {
        /// Frame type
        frame: VideoFrameType,
        /// Packet type
        packet: VideoPacketType,
        /// Coded payload
        data: Bytes,
    },
    /// Stream metadata
    Metadata(Bytes),
}

/// One timestamped piece of stream data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUnit {
    /// Timestamp in milliseconds on the publisher's clock, monotonically
    /// non-decreasing as produced
    pub timestamp: u32,
    /// Kind-tagged payload
    pub payload: MediaPayload,
}

impl MediaUnit {
    /// Create an audio unit
    pub fn audio(timestamp: u32, data: Bytes) -> Self {
        Self {
            timestamp,
            payload: MediaPayload::Audio(data),
        }
    }

    /// Create a video unit
    pub fn video(
        timestamp: u32,
        frame: VideoFrameType,
        packet: VideoPacketType,
        data: Bytes,
    ) -> Self {
        Self {
            timestamp,
            payload: MediaPayload::Video {
                frame,
                packet,
                data,
            },
        }
    }

    /// Create a metadata unit
    pub fn metadata(timestamp: u32, data: Bytes) -> Self {
        Self {
            timestamp,
            payload: MediaPayload::Metadata(data),
        }
    }

    /// Whether this is a video sequence header
    pub fn is_sequence_header(&self) -> bool {
        matches!(
            self.payload,
            MediaPayload::Video {
                packet: VideoPacketType::SequenceHeader,
                ..
            }
        )
    }

    /// Whether this is a video keyframe
    pub fn is_keyframe(&self) -> bool {
        matches!(
            self.payload,
            MediaPayload::Video {
                frame: VideoFrameType::Key,
                ..
            }
        )
    }

    /// Kind name for log fields
    pub fn kind(&self) -> &'static str {
        match self.payload {
            MediaPayload::Audio(_) => "audio",
            MediaPayload::Video { .. } => "video",
            MediaPayload::Metadata(_) => "metadata",
        }
    }

    /// Borrow the payload bytes
    pub fn data(&self) -> &Bytes {
        match &self.payload {
            MediaPayload::Audio(data) | MediaPayload::Metadata(data) => data,
            MediaPayload::Video { data, .. } => data,
        }
    }

    /// Payload length in bytes
    pub fn payload_len(&self) -> usize {
        self.data().len()
    }

    /// Copy this unit into a freshly allocated payload buffer
    ///
    /// A plain clone would share the underlying buffer. Deliveries must not:
    /// each subscriber rebases the timestamp on its own copy, and sinks may
    /// consume the buffer they are handed.
    pub fn detached_copy(&self) -> Self {
        let payload = match &self.payload {
            MediaPayload::Audio(data) => MediaPayload::Audio(Bytes::copy_from_slice(data)),
            MediaPayload::Video {
                frame,
                packet,
                data,
            } => MediaPayload::Video {
                frame: *frame,
                packet: *packet,
                data: Bytes::copy_from_slice(data),
            },
            MediaPayload::Metadata(data) => MediaPayload::Metadata(Bytes::copy_from_slice(data)),
        };

        Self {
            timestamp: self.timestamp,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let audio = MediaUnit::audio(10, Bytes::from_static(b"aac"));
        assert_eq!(audio.timestamp, 10);
        assert_eq!(audio.kind(), "audio");

        let video = MediaUnit::video(
            20,
            VideoFrameType::Key,
            VideoPacketType::NalUnit,
            Bytes::from_static(b"nalu"),
        );
        assert_eq!(video.kind(), "video");
        assert!(video.is_keyframe());
        assert!(!video.is_sequence_header());

        let meta = MediaUnit::metadata(0, Bytes::from_static(b"onMetaData"));
        assert_eq!(meta.kind(), "metadata");
        assert!(!meta.is_keyframe());
    }

    #[test]
    fn test_sequence_header_detection() {
        let header = MediaUnit::video(
            0,
            VideoFrameType::Key,
            VideoPacketType::SequenceHeader,
            Bytes::from_static(b"sps"),
        );
        assert!(header.is_sequence_header());
        assert!(header.is_keyframe());

        let inter = MediaUnit::video(
            40,
            VideoFrameType::Inter,
            VideoPacketType::NalUnit,
            Bytes::from_static(b"p-frame"),
        );
        assert!(!inter.is_sequence_header());
        assert!(!inter.is_keyframe());
    }

    #[test]
    fn test_detached_copy_does_not_alias() {
        let original = MediaUnit::video(
            100,
            VideoFrameType::Key,
            VideoPacketType::NalUnit,
            Bytes::from(vec![1, 2, 3, 4]),
        );

        let copy = original.detached_copy();

        assert_eq!(copy, original);
        assert_ne!(copy.data().as_ptr(), original.data().as_ptr());
    }

    #[test]
    fn test_plain_clone_aliases() {
        // Baseline for the test above: a derive-clone shares the buffer,
        // which is exactly why deliveries go through detached_copy.
        let original = MediaUnit::audio(0, Bytes::from(vec![9, 9, 9]));
        let clone = original.clone();

        assert_eq!(clone.data().as_ptr(), original.data().as_ptr());
    }

    #[test]
    fn test_payload_len() {
        let unit = MediaUnit::metadata(0, Bytes::from_static(b"12345"));
        assert_eq!(unit.payload_len(), 5);
    }
}
