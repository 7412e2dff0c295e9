use std::sync::Arc;
use tracing::{debug, error, info};

use super::{
    events::HostEvent,
    handler::{EventError, EventHandler},
};

/// Routes host events to registered handlers.
///
/// Delivery is strictly ordered: events are dispatched in the order the host
/// fires them, and each event is handed to every handler sequentially in
/// registration order. Session begin/end pairs for a player must never be
/// reordered, so there is no per-handler spawning here.
///
/// Handlers are isolated from each other: a failing handler is logged and
/// the event still reaches the remaining handlers.
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Add an event handler to the dispatcher
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        info!(handler_name = handler.name(), "Registering event handler");
        self.handlers.push(handler);
    }

    /// Deliver one event to every handler, in registration order.
    ///
    /// Returns the errors collected from failing handlers; the host binding
    /// is free to ignore them, they are already logged.
    pub async fn dispatch(&self, event: &HostEvent) -> Vec<EventError> {
        debug!(
            event_type = event.event_type(),
            handler_count = self.handlers.len(),
            "Dispatching event"
        );

        let mut failures = Vec::new();
        for handler in &self.handlers {
            if let Err(e) = handler.handle(event).await {
                error!(
                    handler = handler.name(),
                    event_type = event.event_type(),
                    error = %e,
                    "Handler failed; continuing with remaining handlers"
                );
                failures.push(e);
            }
        }
        failures
    }
}
