use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Stable numeric player identity assigned by the league (BZID).
/// Host player-slot indexes are transient and never used as keys.
pub type BzId = i64;

/// Durable cup identifier.
pub type CupId = i64;

/// Score categories, each ranked independently.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Category {
    Capture,
    Bounty,
    Geno,
    Kill,
}

/// Lifecycle of a scoring period relative to some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CupState {
    Pending,
    Current,
    Closed,
}

/// A scoring period: a half-open time window `[start_time, end_time)` bound
/// to one server context. Points accumulate only while the cup is current;
/// a closed cup's data is frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cup {
    pub id: CupId,
    pub server_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Cup {
    pub fn state(&self, now: DateTime<Utc>) -> CupState {
        if now < self.start_time {
            CupState::Pending
        } else if now < self.end_time {
            CupState::Current
        } else {
            CupState::Closed
        }
    }

    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == CupState::Current
    }
}

/// Per-cup player record. The callsign is the last-seen display name;
/// playing time only ever grows within a cup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub bz_id: BzId,
    pub cup_id: CupId,
    pub callsign: String,
    pub playing_time: i64,
}

/// Accumulated points and the derived ranking ratio for one
/// (player, category, cup) tuple. The ratio is never mutated on its own:
/// it is recomputed whenever points or playing time change.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryScore {
    pub points: i64,
    pub ratio: i64,
}

/// One row of a category leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub bz_id: BzId,
    pub callsign: String,
    pub points: i64,
    pub ratio: i64,
    pub playing_time: i64,
}
