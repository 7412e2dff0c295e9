use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{BzId, Category, CategoryScore, Cup, CupId, LeaderboardEntry, PlayerRecord};
use crate::shared::CupError;

/// Durable storage for cups, player records and category scores.
///
/// The store is the only resource shared between event processing and
/// queries. Implementations must serialize reads against writes so a
/// leaderboard query never observes a half-written score row; beyond that
/// no locking is required, there is a single event-processing thread.
#[async_trait]
pub trait CupRepository: Send + Sync {
    async fn create_cup(
        &self,
        server_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Cup, CupError>;

    /// The cup whose half-open window contains `now` for this server,
    /// if one exists.
    async fn current_cup(&self, server_id: &str, now: DateTime<Utc>)
        -> Result<Option<Cup>, CupError>;

    /// Creates the player's record in the cup on first sight, refreshing the
    /// callsign on every later call (display names are mutable).
    async fn upsert_player(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        callsign: &str,
    ) -> Result<(), CupError>;

    /// Accumulates committed playing time. `seconds` must be non-negative:
    /// playing time never shrinks within a cup.
    async fn add_playing_time(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        seconds: i64,
    ) -> Result<(), CupError>;

    /// Total committed playing time; a player with no record yet is 0.
    async fn playing_time(&self, cup_id: CupId, bz_id: BzId) -> Result<i64, CupError>;

    /// Accumulates category points, creating the score row with zero points
    /// on first use. `amount` must be non-negative: the ledger never
    /// decrements.
    async fn add_points(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
        amount: i64,
    ) -> Result<(), CupError>;

    async fn category_score(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
    ) -> Result<Option<CategoryScore>, CupError>;

    /// Writes the derived ratio for a score row. No-op when the player has
    /// no score row in the category.
    async fn store_ratio(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
        ratio: i64,
    ) -> Result<(), CupError>;

    /// Top `n` players of a category: ratio descending, ties broken by
    /// ascending playing time, then ascending BZID for determinism.
    async fn top_n(
        &self,
        cup_id: CupId,
        category: Category,
        n: usize,
    ) -> Result<Vec<LeaderboardEntry>, CupError>;

    /// 1-based rank: players with a strictly greater ratio, plus one.
    /// `None` when the player has no score in the category (unranked).
    async fn rank_of(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
    ) -> Result<Option<u32>, CupError>;
}

fn check_non_negative(what: &str, amount: i64) -> Result<(), CupError> {
    if amount < 0 {
        return Err(CupError::Validation(format!(
            "{what} must be non-negative, got {amount}"
        )));
    }
    Ok(())
}

/// In-memory implementation of `CupRepository` for development and testing.
///
/// Data is stored in process memory and lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryCupRepository {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_cup_id: CupId,
    cups: Vec<Cup>,
    players: HashMap<(CupId, BzId), PlayerRecord>,
    scores: HashMap<(CupId, BzId, Category), CategoryScore>,
}

impl InMemoryCupRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_cup_id: 1,
                ..MemoryState::default()
            }),
        }
    }

    /// Number of player records across all cups (useful for debugging).
    pub fn player_count(&self) -> usize {
        self.state.lock().unwrap().players.len()
    }
}

#[async_trait]
impl CupRepository for InMemoryCupRepository {
    async fn create_cup(
        &self,
        server_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Cup, CupError> {
        if end_time <= start_time {
            return Err(CupError::Validation(
                "cup end time must be after start time".to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        let cup = Cup {
            id: state.next_cup_id,
            server_id: server_id.to_string(),
            start_time,
            end_time,
        };
        state.next_cup_id += 1;
        state.cups.push(cup.clone());
        Ok(cup)
    }

    async fn current_cup(
        &self,
        server_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Cup>, CupError> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<&Cup> = state
            .cups
            .iter()
            .filter(|c| c.server_id == server_id && c.is_current(now))
            .collect();
        matching.sort_by_key(|c| c.start_time);
        if matching.len() > 1 {
            warn!(
                server_id = %server_id,
                count = matching.len(),
                "Multiple overlapping current cups; using the earliest"
            );
        }
        Ok(matching.first().map(|c| (*c).clone()))
    }

    async fn upsert_player(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        callsign: &str,
    ) -> Result<(), CupError> {
        let mut state = self.state.lock().unwrap();
        state
            .players
            .entry((cup_id, bz_id))
            .and_modify(|p| p.callsign = callsign.to_string())
            .or_insert_with(|| PlayerRecord {
                bz_id,
                cup_id,
                callsign: callsign.to_string(),
                playing_time: 0,
            });
        Ok(())
    }

    async fn add_playing_time(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        seconds: i64,
    ) -> Result<(), CupError> {
        check_non_negative("playing time increment", seconds)?;
        let mut state = self.state.lock().unwrap();
        match state.players.get_mut(&(cup_id, bz_id)) {
            Some(player) => {
                player.playing_time += seconds;
                Ok(())
            }
            None => Err(CupError::NotFound(format!(
                "player {bz_id} has no record in cup {cup_id}"
            ))),
        }
    }

    async fn playing_time(&self, cup_id: CupId, bz_id: BzId) -> Result<i64, CupError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .players
            .get(&(cup_id, bz_id))
            .map(|p| p.playing_time)
            .unwrap_or(0))
    }

    async fn add_points(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
        amount: i64,
    ) -> Result<(), CupError> {
        check_non_negative("point increment", amount)?;
        let mut state = self.state.lock().unwrap();
        state
            .scores
            .entry((cup_id, bz_id, category))
            .or_default()
            .points += amount;
        Ok(())
    }

    async fn category_score(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
    ) -> Result<Option<CategoryScore>, CupError> {
        let state = self.state.lock().unwrap();
        Ok(state.scores.get(&(cup_id, bz_id, category)).copied())
    }

    async fn store_ratio(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
        ratio: i64,
    ) -> Result<(), CupError> {
        let mut state = self.state.lock().unwrap();
        if let Some(score) = state.scores.get_mut(&(cup_id, bz_id, category)) {
            score.ratio = ratio;
        }
        Ok(())
    }

    async fn top_n(
        &self,
        cup_id: CupId,
        category: Category,
        n: usize,
    ) -> Result<Vec<LeaderboardEntry>, CupError> {
        let state = self.state.lock().unwrap();
        let mut entries: Vec<LeaderboardEntry> = state
            .scores
            .iter()
            .filter(|((cid, _, cat), _)| *cid == cup_id && *cat == category)
            .filter_map(|((_, bz_id, _), score)| {
                state
                    .players
                    .get(&(cup_id, *bz_id))
                    .map(|player| LeaderboardEntry {
                        bz_id: *bz_id,
                        callsign: player.callsign.clone(),
                        points: score.points,
                        ratio: score.ratio,
                        playing_time: player.playing_time,
                    })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.ratio
                .cmp(&a.ratio)
                .then(a.playing_time.cmp(&b.playing_time))
                .then(a.bz_id.cmp(&b.bz_id))
        });
        entries.truncate(n);
        Ok(entries)
    }

    async fn rank_of(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
    ) -> Result<Option<u32>, CupError> {
        let state = self.state.lock().unwrap();
        let own = match state.scores.get(&(cup_id, bz_id, category)) {
            Some(score) => score.ratio,
            None => return Ok(None),
        };
        let better = state
            .scores
            .iter()
            .filter(|((cid, _, cat), score)| {
                *cid == cup_id && *cat == category && score.ratio > own
            })
            .count();
        Ok(Some(better as u32 + 1))
    }
}

/// SQLite implementation of `CupRepository`.
///
/// The store is embedded and local, as event handling requires: a stalled
/// database write would stall all game-event processing. Every statement is
/// parameterized; player-controlled strings (callsigns) never touch SQL
/// text.
pub struct SqliteCupRepository {
    pool: SqlitePool,
}

impl SqliteCupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist yet. The plugin has always
    /// owned its own tables; there is no separate migration step.
    pub async fn ensure_schema(&self) -> Result<(), CupError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cups (
                cup_id INTEGER PRIMARY KEY AUTOINCREMENT,
                server_id TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS players (
                bz_id INTEGER NOT NULL,
                cup_id INTEGER NOT NULL,
                callsign TEXT NOT NULL,
                playing_time INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (bz_id, cup_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS category_scores (
                category TEXT NOT NULL,
                bz_id INTEGER NOT NULL,
                cup_id INTEGER NOT NULL,
                points INTEGER NOT NULL DEFAULT 0,
                ratio INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (category, bz_id, cup_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        debug!("Cup schema ensured");
        Ok(())
    }
}

#[async_trait]
impl CupRepository for SqliteCupRepository {
    #[instrument(skip(self))]
    async fn create_cup(
        &self,
        server_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Cup, CupError> {
        if end_time <= start_time {
            return Err(CupError::Validation(
                "cup end time must be after start time".to_string(),
            ));
        }
        let result = sqlx::query(
            "INSERT INTO cups (server_id, start_time, end_time) VALUES (?, ?, ?)",
        )
        .bind(server_id)
        .bind(start_time)
        .bind(end_time)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create cup");
            CupError::Database(e.to_string())
        })?;

        Ok(Cup {
            id: result.last_insert_rowid(),
            server_id: server_id.to_string(),
            start_time,
            end_time,
        })
    }

    #[instrument(skip(self))]
    async fn current_cup(
        &self,
        server_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Cup>, CupError> {
        let row = sqlx::query(
            "SELECT cup_id, server_id, start_time, end_time FROM cups
             WHERE server_id = ? AND start_time <= ? AND end_time > ?
             ORDER BY start_time LIMIT 1",
        )
        .bind(server_id)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, server_id = %server_id, "Failed to look up current cup");
            CupError::Database(e.to_string())
        })?;

        Ok(row.map(|row| Cup {
            id: row.get("cup_id"),
            server_id: row.get("server_id"),
            start_time: row.get("start_time"),
            end_time: row.get("end_time"),
        }))
    }

    #[instrument(skip(self, callsign))]
    async fn upsert_player(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        callsign: &str,
    ) -> Result<(), CupError> {
        sqlx::query(
            "INSERT INTO players (bz_id, cup_id, callsign, playing_time)
             VALUES (?, ?, ?, 0)
             ON CONFLICT (bz_id, cup_id) DO UPDATE SET callsign = excluded.callsign",
        )
        .bind(bz_id)
        .bind(cup_id)
        .bind(callsign)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, bz_id = %bz_id, "Failed to upsert player");
            CupError::Database(e.to_string())
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_playing_time(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        seconds: i64,
    ) -> Result<(), CupError> {
        check_non_negative("playing time increment", seconds)?;
        let result = sqlx::query(
            "UPDATE players SET playing_time = playing_time + ?
             WHERE bz_id = ? AND cup_id = ?",
        )
        .bind(seconds)
        .bind(bz_id)
        .bind(cup_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, bz_id = %bz_id, "Failed to add playing time");
            CupError::Database(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(CupError::NotFound(format!(
                "player {bz_id} has no record in cup {cup_id}"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn playing_time(&self, cup_id: CupId, bz_id: BzId) -> Result<i64, CupError> {
        let row = sqlx::query(
            "SELECT playing_time FROM players WHERE bz_id = ? AND cup_id = ?",
        )
        .bind(bz_id)
        .bind(cup_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CupError::Database(e.to_string()))?;

        // A player we have never seen has simply played zero seconds.
        Ok(row.map(|r| r.get("playing_time")).unwrap_or(0))
    }

    #[instrument(skip(self))]
    async fn add_points(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
        amount: i64,
    ) -> Result<(), CupError> {
        check_non_negative("point increment", amount)?;
        sqlx::query(
            "INSERT INTO category_scores (category, bz_id, cup_id, points, ratio)
             VALUES (?, ?, ?, ?, 0)
             ON CONFLICT (category, bz_id, cup_id)
             DO UPDATE SET points = points + excluded.points",
        )
        .bind(category.to_string())
        .bind(bz_id)
        .bind(cup_id)
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, bz_id = %bz_id, category = %category, "Failed to add points");
            CupError::Database(e.to_string())
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn category_score(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
    ) -> Result<Option<CategoryScore>, CupError> {
        let row = sqlx::query(
            "SELECT points, ratio FROM category_scores
             WHERE category = ? AND bz_id = ? AND cup_id = ?",
        )
        .bind(category.to_string())
        .bind(bz_id)
        .bind(cup_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CupError::Database(e.to_string()))?;

        Ok(row.map(|r| CategoryScore {
            points: r.get("points"),
            ratio: r.get("ratio"),
        }))
    }

    #[instrument(skip(self))]
    async fn store_ratio(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
        ratio: i64,
    ) -> Result<(), CupError> {
        sqlx::query(
            "UPDATE category_scores SET ratio = ?
             WHERE category = ? AND bz_id = ? AND cup_id = ?",
        )
        .bind(ratio)
        .bind(category.to_string())
        .bind(bz_id)
        .bind(cup_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, bz_id = %bz_id, category = %category, "Failed to store ratio");
            CupError::Database(e.to_string())
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn top_n(
        &self,
        cup_id: CupId,
        category: Category,
        n: usize,
    ) -> Result<Vec<LeaderboardEntry>, CupError> {
        let rows = sqlx::query(
            "SELECT s.bz_id, p.callsign, s.points, s.ratio, p.playing_time
             FROM category_scores s
             JOIN players p ON p.bz_id = s.bz_id AND p.cup_id = s.cup_id
             WHERE s.cup_id = ? AND s.category = ?
             ORDER BY s.ratio DESC, p.playing_time ASC, s.bz_id ASC
             LIMIT ?",
        )
        .bind(cup_id)
        .bind(category.to_string())
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, category = %category, "Failed to fetch leaderboard");
            CupError::Database(e.to_string())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                bz_id: row.get("bz_id"),
                callsign: row.get("callsign"),
                points: row.get("points"),
                ratio: row.get("ratio"),
                playing_time: row.get("playing_time"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn rank_of(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
    ) -> Result<Option<u32>, CupError> {
        let own = sqlx::query(
            "SELECT ratio FROM category_scores
             WHERE category = ? AND bz_id = ? AND cup_id = ?",
        )
        .bind(category.to_string())
        .bind(bz_id)
        .bind(cup_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CupError::Database(e.to_string()))?;

        let own_ratio: i64 = match own {
            Some(row) => row.get("ratio"),
            None => return Ok(None),
        };

        let better: i64 = sqlx::query(
            "SELECT COUNT(*) AS better FROM category_scores
             WHERE category = ? AND cup_id = ? AND ratio > ?",
        )
        .bind(category.to_string())
        .bind(cup_id)
        .bind(own_ratio)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CupError::Database(e.to_string()))?
        .get("better");

        Ok(Some(better as u32 + 1))
    }
}
