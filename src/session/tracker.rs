use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::cup::BzId;

/// Tracks the in-flight play interval of every active player.
///
/// This is the only place not-yet-committed playing time lives. Sessions are
/// purely in-memory: one entry per active player, created on join/unpause,
/// consumed on part/pause/flush and committed into the player's persisted
/// playing time by the caller. The set can never grow past the number of
/// connected players.
#[derive(Debug, Default)]
pub struct PlayingTimeTracker {
    sessions: HashMap<BzId, DateTime<Utc>>,
}

impl PlayingTimeTracker {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Records a session start for a player.
    ///
    /// Replaces any prior unflushed session for the same player: the host
    /// occasionally re-fires join events and last write wins.
    pub fn begin_session(&mut self, bz_id: BzId, now: DateTime<Utc>) {
        if let Some(previous) = self.sessions.insert(bz_id, now) {
            debug!(
                bz_id = %bz_id,
                discarded_start = %previous,
                "Replacing unflushed session; last write wins"
            );
        }
    }

    /// Ends a player's session and returns the elapsed whole seconds.
    ///
    /// A missing session is not an error - duplicate part/pause events are a
    /// known host behavior - so it logs and reports zero elapsed time.
    /// Elapsed time is clamped to >= 0 to defend against clock skew.
    pub fn end_session(&mut self, bz_id: BzId, now: DateTime<Utc>) -> i64 {
        match self.sessions.remove(&bz_id) {
            Some(started) => clamped_elapsed(started, now),
            None => {
                warn!(bz_id = %bz_id, "No session to end; counting zero elapsed time");
                0
            }
        }
    }

    /// Commits the elapsed seconds of a running session and restarts it at
    /// `now`, so time keeps accruing. Used by the periodic flush.
    ///
    /// Returns zero for players without a session.
    pub fn split_session(&mut self, bz_id: BzId, now: DateTime<Utc>) -> i64 {
        match self.sessions.insert(bz_id, now) {
            Some(started) => clamped_elapsed(started, now),
            None => {
                // Don't leave the just-inserted phantom session behind.
                self.sessions.remove(&bz_id);
                warn!(bz_id = %bz_id, "No session to split; counting zero elapsed time");
                0
            }
        }
    }

    /// Players with a running session, for the flush fan-out.
    pub fn active_players(&self) -> Vec<BzId> {
        self.sessions.keys().copied().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn clamped_elapsed(started: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started).num_seconds().max(0)
}
