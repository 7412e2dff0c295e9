// Host event surface
//
// The host game server fires events one at a time on a single callback
// thread. This module defines the event vocabulary the engine consumes and
// the dispatch machinery that fans events out to handlers without ever
// reordering them.

// Public API - what other modules can use
pub use dispatcher::EventDispatcher;
pub use events::HostEvent;
pub use handler::{EventError, EventHandler, NoOpEventHandler};

// Internal modules
mod dispatcher;
mod events;
mod handler;
