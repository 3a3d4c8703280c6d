//! Channel registry
//!
//! Process-wide map from stream name to live channel. One instance is
//! constructed at startup and injected into whatever drives sessions —
//! never reached through a global — so tests build isolated registries.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::relay::channel::Channel;
use crate::relay::error::RelayError;
use crate::stats::RelayStats;

/// Process-wide mapping of stream name to channel
///
/// All three operations serialize on one exclusive lock, so two concurrent
/// `create` calls for the same name resolve to exactly one winner.
pub struct ChannelRegistry {
    channels: Mutex<HashMap<String, Arc<Channel>>>,
}

impl ChannelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Create a channel under a name not yet in use
    pub async fn create(&self, name: &str) -> Result<Arc<Channel>, RelayError> {
        let mut channels = self.channels.lock().await;

        if channels.contains_key(name) {
            return Err(RelayError::AlreadyPublishing(name.to_string()));
        }

        let channel = Arc::new(Channel::new(name));
        channels.insert(name.to_string(), Arc::clone(&channel));

        tracing::info!(stream = %name, "Channel created");
        Ok(channel)
    }

    /// Look up a live channel; no mutation
    pub async fn get(&self, name: &str) -> Result<Arc<Channel>, RelayError> {
        self.channels
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| RelayError::StreamNotFound(name.to_string()))
    }

    /// Remove a channel mapping
    pub async fn remove(&self, name: &str) -> Result<(), RelayError> {
        let mut channels = self.channels.lock().await;

        if channels.remove(name).is_none() {
            return Err(RelayError::StreamNotFound(name.to_string()));
        }

        tracing::info!(stream = %name, "Channel removed");
        Ok(())
    }

    /// Number of live channels
    pub async fn channel_count(&self) -> usize {
        self.channels.lock().await.len()
    }

    /// Aggregate statistics across every live channel
    pub async fn stats(&self) -> RelayStats {
        let channels: Vec<Arc<Channel>> =
            self.channels.lock().await.values().cloned().collect();

        let mut stats = RelayStats {
            channel_count: channels.len(),
            ..RelayStats::default()
        };
        for channel in channels {
            let snapshot = channel.stats().await;
            stats.total_subscribers += snapshot.subscriber_count;
            stats.total_units_relayed += snapshot.units_relayed;
            stats.total_delivery_failures += snapshot.delivery_failures;
        }

        stats
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
