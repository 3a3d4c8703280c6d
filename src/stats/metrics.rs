//! Statistics for relay channels
//!
//! Snapshots, not live views: each struct is assembled under the relevant
//! lock and handed out by value.

/// Snapshot of one channel's state
#[derive(Debug, Clone, Default)]
pub struct ChannelStats {
    /// Number of attached subscribers
    pub subscriber_count: usize,
    /// Whether a publisher holds the slot
    pub publisher_present: bool,
    /// Whether a video sequence header is cached
    pub has_sequence_header: bool,
    /// Whether a keyframe is cached
    pub has_keyframe: bool,
    /// Units accepted from the publisher
    pub units_relayed: u64,
    /// Failed per-subscriber deliveries
    pub delivery_failures: u64,
}

/// Aggregate snapshot across every live channel
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Number of live channels
    pub channel_count: usize,
    /// Subscribers attached across all channels
    pub total_subscribers: usize,
    /// Units accepted across all channels
    pub total_units_relayed: u64,
    /// Failed deliveries across all channels
    pub total_delivery_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_stats_default() {
        let stats = ChannelStats::default();
        assert_eq!(stats.subscriber_count, 0);
        assert!(!stats.publisher_present);
        assert!(!stats.has_sequence_header);
        assert!(!stats.has_keyframe);
        assert_eq!(stats.units_relayed, 0);
        assert_eq!(stats.delivery_failures, 0);
    }

    #[test]
    fn test_relay_stats_default() {
        let stats = RelayStats::default();
        assert_eq!(stats.channel_count, 0);
        assert_eq!(stats.total_subscribers, 0);
        assert_eq!(stats.total_units_relayed, 0);
        assert_eq!(stats.total_delivery_failures, 0);
    }
}
