pub mod flush_task;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{BzId, Category, CategoryScore, Cup, CupId, CupState, LeaderboardEntry, PlayerRecord};
pub use repository::{CupRepository, InMemoryCupRepository, SqliteCupRepository};
pub use service::{CupEventSubscriber, CupService, CupServiceBuilder};
