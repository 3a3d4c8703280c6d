//! Relay error types
//!
//! Precondition errors surfaced to the session adapter. The core never
//! retries any of these; the adapter rejects the requesting connection's
//! action and moves on.

/// Error type for relay operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Publish requested with an empty stream name
    EmptyStreamName,
    /// A live channel already exists under this name
    AlreadyPublishing(String),
    /// No live channel under this name
    StreamNotFound(String),
    /// The channel already has an attached publisher
    PublisherSlotTaken(String),
    /// The connection already holds a publisher or subscriber role
    RoleConflict,
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::EmptyStreamName => write!(f, "Stream name is empty"),
            RelayError::AlreadyPublishing(name) => {
                write!(f, "Already publishing: {}", name)
            }
            RelayError::StreamNotFound(name) => write!(f, "Stream not found: {}", name),
            RelayError::PublisherSlotTaken(name) => {
                write!(f, "Channel already has a publisher: {}", name)
            }
            RelayError::RoleConflict => {
                write!(f, "Connection already holds a stream role")
            }
        }
    }
}

impl std::error::Error for RelayError {}
