//! Session adapter
//!
//! Translates session-protocol lifecycle events into relay operations. The
//! wire protocol itself lives behind the server's `SessionDriver` seam;
//! this module owns the rules at the boundary: publish and play are
//! mutually exclusive per connection, a publisher disconnect tears its
//! channel down, a subscriber disconnect closes only that subscriber.

use std::sync::Arc;

use crate::media::MediaUnit;
use crate::relay::{ChannelRegistry, PublisherHandle, RelayError, SubscriberHandle, UnitSink};

use super::context::SessionContext;

/// Process-wide entry points for session drivers
///
/// Cheap to clone; every clone shares the injected registry.
#[derive(Clone)]
pub struct RelayAdapter {
    registry: Arc<ChannelRegistry>,
}

impl RelayAdapter {
    /// Create an adapter over an injected registry
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Access the underlying registry
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Handle a publish request: claim a fresh channel under `name`
    pub async fn publish_request(&self, name: &str) -> Result<PublisherHandle, RelayError> {
        if name.is_empty() {
            return Err(RelayError::EmptyStreamName);
        }

        let channel = self.registry.create(name).await?;
        channel.attach_publisher().await?;

        Ok(PublisherHandle::new(channel, Arc::clone(&self.registry)))
    }

    /// Handle a play request: attach a subscriber to a live channel
    ///
    /// The delivery sink is bound at attach, so a subscriber never exists
    /// half-wired.
    pub async fn play_request(
        &self,
        name: &str,
        sink: UnitSink,
    ) -> Result<SubscriberHandle, RelayError> {
        let channel = self.registry.get(name).await?;
        Ok(channel.attach_subscriber(sink).await)
    }
}

/// Role a connection holds for its lifetime
enum ConnectionRole {
    Idle,
    Publishing(PublisherHandle),
    Playing(SubscriberHandle),
}

/// Per-connection state machine over the relay
///
/// A connection is a publisher or a subscriber, never both.
pub struct ConnectionSession {
    adapter: RelayAdapter,
    context: SessionContext,
    role: ConnectionRole,
}

impl ConnectionSession {
    /// Create a session for one accepted connection
    pub fn new(adapter: RelayAdapter, context: SessionContext) -> Self {
        Self {
            adapter,
            context,
            role: ConnectionRole::Idle,
        }
    }

    /// Identity of this connection
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Take the publisher role for `stream`
    pub async fn handle_publish_request(&mut self, stream: &str) -> Result<(), RelayError> {
        if !matches!(self.role, ConnectionRole::Idle) {
            return Err(RelayError::RoleConflict);
        }

        let handle = self.adapter.publish_request(stream).await?;
        tracing::info!(
            session_id = self.context.session_id,
            stream = %stream,
            "Publishing started"
        );
        self.role = ConnectionRole::Publishing(handle);
        Ok(())
    }

    /// Take the subscriber role for `stream`, binding the delivery sink
    pub async fn handle_play_request(
        &mut self,
        stream: &str,
        sink: UnitSink,
    ) -> Result<(), RelayError> {
        if !matches!(self.role, ConnectionRole::Idle) {
            return Err(RelayError::RoleConflict);
        }

        let handle = self.adapter.play_request(stream, sink).await?;
        tracing::info!(
            session_id = self.context.session_id,
            stream = %stream,
            "Playing started"
        );
        self.role = ConnectionRole::Playing(handle);
        Ok(())
    }

    /// Relay one decoded inbound unit
    ///
    /// Fire-and-forget: delivery failures stay inside the channel. Units
    /// arriving on a connection that never took the publisher role are
    /// dropped.
    pub async fn handle_unit(&self, unit: MediaUnit) {
        match &self.role {
            ConnectionRole::Publishing(handle) => handle.publish(unit).await,
            _ => {
                tracing::warn!(
                    session_id = self.context.session_id,
                    kind = unit.kind(),
                    "Unit received on a non-publishing connection, dropped"
                );
            }
        }
    }

    /// Release whatever role the connection holds; idempotent
    pub async fn disconnect(&mut self) {
        match std::mem::replace(&mut self.role, ConnectionRole::Idle) {
            ConnectionRole::Publishing(handle) => {
                tracing::info!(
                    session_id = self.context.session_id,
                    stream = %handle.channel().name(),
                    "Publisher disconnected"
                );
                handle.detach().await;
            }
            ConnectionRole::Playing(handle) => {
                tracing::info!(
                    session_id = self.context.session_id,
                    "Subscriber disconnected"
                );
                handle.close();
            }
            ConnectionRole::Idle => {}
        }
    }

    /// Whether the connection currently holds the publisher role
    pub fn is_publishing(&self) -> bool {
        matches!(self.role, ConnectionRole::Publishing(_))
    }

    /// Whether the connection currently holds the subscriber role
    pub fn is_playing(&self) -> bool {
        matches!(self.role, ConnectionRole::Playing(_))
    }
}
