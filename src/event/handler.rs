use async_trait::async_trait;
use thiserror::Error;

use super::events::HostEvent;

/// Errors that can occur when handling events
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Retryable error: {0}")]
    Retryable(String),

    #[error("Non-retryable error: {0}")]
    NonRetryable(String),
}

impl EventError {
    /// Whether this error indicates the operation could be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, EventError::Retryable(_))
    }

    /// Create a retryable error
    pub fn retryable(msg: impl Into<String>) -> Self {
        EventError::Retryable(msg.into())
    }

    /// Create a non-retryable error
    pub fn non_retryable(msg: impl Into<String>) -> Self {
        EventError::NonRetryable(msg.into())
    }
}

/// Trait for components that react to host events.
///
/// Handlers must complete synchronously-fast: the host delivers events on a
/// single callback thread and everything stalls while a handler runs. No
/// handler may block indefinitely.
///
/// Handlers should be idempotent where possible - the host is known to
/// deliver the occasional duplicate part/pause event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle a host event.
    ///
    /// Returning an error never aborts event processing; the dispatcher
    /// logs it and moves on.
    async fn handle(&self, event: &HostEvent) -> Result<(), EventError>;

    /// Get a human-readable name for this handler (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// A no-op event handler for testing
pub struct NoOpEventHandler;

#[async_trait]
impl EventHandler for NoOpEventHandler {
    async fn handle(&self, _event: &HostEvent) -> Result<(), EventError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NoOpEventHandler"
    }
}
