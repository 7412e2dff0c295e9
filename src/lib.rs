// MoFo Cup - per-player statistics and leaderboards for a multiplayer tank
// game server. The host delivers game events (joins, kills, captures, ticks)
// through the event dispatcher; accumulated points and playing time are
// persisted per scoring period ("cup") and ranked by a points-per-day ratio.
//
// This file exposes the public API for host bindings and integration tests.

pub mod commands;
pub mod config;
pub mod cup;
pub mod event;
pub mod scoring;
pub mod session;
pub mod shared;

// Re-export commonly used types for easier access
pub use commands::{CommandHandler, CupCommand};
pub use config::CupConfig;
pub use cup::{
    Category, Cup, CupEventSubscriber, CupRepository, CupService, InMemoryCupRepository,
    LeaderboardEntry, SqliteCupRepository,
};
pub use event::{EventDispatcher, EventHandler, HostEvent};
pub use session::PlayingTimeTracker;
pub use shared::CupError;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes tracing the way the host is expected to: env-filtered,
/// defaulting to debug output for this crate. Safe to call once per process.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mofocup=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
