use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use strum::IntoEnumIterator;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::CupConfig;
use crate::event::{EventError, EventHandler, HostEvent};
use crate::scoring::calculators::{
    CaptureCalculator, GenocideCalculator, KillCalculator, RampageCalculator,
};
use crate::scoring::{ranking_ratio, PointAward, PointsCalculator, ScoringContext};
use crate::session::PlayingTimeTracker;
use crate::shared::CupError;

use super::models::{BzId, Category, Cup, CupId, LeaderboardEntry};
use super::repository::CupRepository;

/// The statistics/ranking aggregator.
///
/// Owns the ephemeral state (sessions, kill streaks, the dirty set) and
/// drives the repository. Every operation completes synchronously before
/// control returns to the host; the repository is embedded and local, so
/// nothing here blocks for long.
pub struct CupService {
    repository: Arc<dyn CupRepository>,
    calculators: Vec<Arc<dyn PointsCalculator>>,
    config: CupConfig,
    tracker: Mutex<PlayingTimeTracker>,
    /// Callsigns of connected players, so flushes can (re)create player rows
    /// after a cup rollover without waiting for a rejoin.
    roster: Mutex<HashMap<BzId, String>>,
    kill_streaks: Mutex<HashMap<BzId, u32>>,
    /// (cup, player, category) tuples whose ratio is stale. Ratios are only
    /// ever recomputed from here; they are never mutated independently.
    dirty: Mutex<HashSet<(CupId, BzId, Category)>>,
    last_flush: Mutex<Option<DateTime<Utc>>>,
}

impl CupService {
    pub fn builder(repository: Arc<dyn CupRepository>) -> CupServiceBuilder {
        CupServiceBuilder::new(repository)
    }

    /// A player joined the server: start their session and make sure their
    /// record exists in the current cup.
    pub async fn handle_join(
        &self,
        bz_id: BzId,
        callsign: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CupError> {
        self.roster
            .lock()
            .await
            .insert(bz_id, callsign.to_string());
        self.tracker.lock().await.begin_session(bz_id, now);

        match self.current_cup(now).await? {
            Some(cup) => self.repository.upsert_player(cup.id, bz_id, callsign).await,
            None => {
                debug!(bz_id = %bz_id, "Join with no current cup; session tracked, nothing persisted");
                Ok(())
            }
        }
    }

    /// A player left: end their session and commit the elapsed time.
    pub async fn handle_part(&self, bz_id: BzId, now: DateTime<Utc>) -> Result<(), CupError> {
        let callsign = self.roster.lock().await.remove(&bz_id);
        let elapsed = self.tracker.lock().await.end_session(bz_id, now);
        self.commit_time(bz_id, callsign.as_deref(), elapsed, now)
            .await
    }

    /// Pause ends the session (paused tanks accrue no playing time);
    /// unpause starts a fresh one.
    pub async fn handle_pause(
        &self,
        bz_id: BzId,
        paused: bool,
        now: DateTime<Utc>,
    ) -> Result<(), CupError> {
        if paused {
            let callsign = self.roster.lock().await.get(&bz_id).cloned();
            let elapsed = self.tracker.lock().await.end_session(bz_id, now);
            self.commit_time(bz_id, callsign.as_deref(), elapsed, now)
                .await
        } else {
            self.tracker.lock().await.begin_session(bz_id, now);
            Ok(())
        }
    }

    /// Scores a capture or kill event: updates kill streaks, runs every
    /// points calculator, and applies the awards against the current cup.
    ///
    /// With no current cup the awards are dropped with a warning - points
    /// only ever accumulate inside a cup window.
    pub async fn handle_scoring_event(
        &self,
        event: &HostEvent,
        now: DateTime<Utc>,
    ) -> Result<(), CupError> {
        let awards = {
            let mut streaks = self.kill_streaks.lock().await;
            update_kill_streaks(&mut streaks, event);
            let ctx = ScoringContext::new(&streaks);
            let mut awards: Vec<PointAward> = Vec::new();
            for calculator in &self.calculators {
                awards.extend(calculator.points_for(event, &ctx));
            }
            awards
        };

        if awards.is_empty() {
            return Ok(());
        }

        let cup = match self.current_cup(now).await? {
            Some(cup) => cup,
            None => {
                warn!(
                    event_type = event.event_type(),
                    "Scoring event with no current cup; dropping awards"
                );
                return Ok(());
            }
        };

        // One award failing must not lose the rest of the event's awards.
        for award in awards {
            if let Err(e) = self.apply_award(&cup, &award).await {
                warn!(
                    bz_id = %award.bz_id,
                    category = %award.category,
                    error = %e,
                    "Failed to apply point award; continuing"
                );
            }
        }
        Ok(())
    }

    /// Periodic tick: throttled to the configured flush interval. Commits
    /// every active session's accrued time, then recomputes every dirty
    /// ratio.
    pub async fn handle_tick(&self, now: DateTime<Utc>) -> Result<(), CupError> {
        {
            let mut last_flush = self.last_flush.lock().await;
            let due = match *last_flush {
                Some(last) => now - last >= chrono::Duration::from_std(self.config.flush_interval)
                    .unwrap_or_else(|_| chrono::Duration::seconds(300)),
                None => true,
            };
            if !due {
                return Ok(());
            }
            *last_flush = Some(now);
        }

        self.flush_sessions(now).await;
        self.recompute_dirty(now).await;
        Ok(())
    }

    /// Leaderboard of the current cup: ratio descending, ties broken by
    /// ascending playing time then BZID. Read-only.
    pub async fn leaderboard(
        &self,
        category: Category,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>, CupError> {
        match self.current_cup(now).await? {
            Some(cup) => {
                self.repository
                    .top_n(cup.id, category, self.config.leaderboard_size)
                    .await
            }
            None => Err(CupError::NoCurrentCup(self.config.server_id.clone())),
        }
    }

    /// 1-based rank of a player in the current cup; `None` when the player
    /// has no score in the category. Read-only.
    pub async fn rank_of(
        &self,
        bz_id: BzId,
        category: Category,
        now: DateTime<Utc>,
    ) -> Result<Option<u32>, CupError> {
        match self.current_cup(now).await? {
            Some(cup) => self.repository.rank_of(cup.id, bz_id, category).await,
            None => Err(CupError::NoCurrentCup(self.config.server_id.clone())),
        }
    }

    /// Leaderboard of an arbitrary (possibly closed) cup. Closed cups are
    /// frozen but stay queryable.
    pub async fn leaderboard_for(
        &self,
        cup_id: CupId,
        category: Category,
    ) -> Result<Vec<LeaderboardEntry>, CupError> {
        self.repository
            .top_n(cup_id, category, self.config.leaderboard_size)
            .await
    }

    pub fn config(&self) -> &CupConfig {
        &self.config
    }

    async fn current_cup(&self, now: DateTime<Utc>) -> Result<Option<Cup>, CupError> {
        self.repository
            .current_cup(&self.config.server_id, now)
            .await
    }

    /// Commits elapsed seconds for a player and marks their ratios stale.
    /// Zero elapsed time is a no-op: no write, nothing dirty.
    async fn commit_time(
        &self,
        bz_id: BzId,
        callsign: Option<&str>,
        elapsed: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CupError> {
        if elapsed == 0 {
            return Ok(());
        }

        let cup = match self.current_cup(now).await? {
            Some(cup) => cup,
            None => {
                warn!(bz_id = %bz_id, elapsed, "Elapsed time with no current cup; dropped");
                return Ok(());
            }
        };

        if let Some(callsign) = callsign {
            self.repository.upsert_player(cup.id, bz_id, callsign).await?;
        }
        self.repository.add_playing_time(cup.id, bz_id, elapsed).await?;

        // Playing time feeds every category's ratio.
        let mut dirty = self.dirty.lock().await;
        for category in Category::iter() {
            dirty.insert((cup.id, bz_id, category));
        }
        Ok(())
    }

    async fn apply_award(&self, cup: &Cup, award: &PointAward) -> Result<(), CupError> {
        if let Some(callsign) = self.roster.lock().await.get(&award.bz_id).cloned() {
            self.repository
                .upsert_player(cup.id, award.bz_id, &callsign)
                .await?;
        }
        self.repository
            .add_points(cup.id, award.bz_id, award.category, award.amount)
            .await?;
        self.dirty
            .lock()
            .await
            .insert((cup.id, award.bz_id, award.category));
        Ok(())
    }

    /// Splits every active session and commits the accrued time. One
    /// player's failure is logged and never stops the others.
    async fn flush_sessions(&self, now: DateTime<Utc>) {
        let commits: Vec<(BzId, i64)> = {
            let mut tracker = self.tracker.lock().await;
            tracker
                .active_players()
                .into_iter()
                .map(|bz_id| (bz_id, tracker.split_session(bz_id, now)))
                .collect()
        };

        debug!(players = commits.len(), "Flushing playing time");
        for (bz_id, elapsed) in commits {
            let callsign = self.roster.lock().await.get(&bz_id).cloned();
            if let Err(e) = self
                .commit_time(bz_id, callsign.as_deref(), elapsed, now)
                .await
            {
                warn!(bz_id = %bz_id, error = %e, "Failed to flush playing time; continuing");
            }
        }
    }

    /// Recomputes every dirty ratio against the current cup. Entries whose
    /// cup has rolled to Closed since they were marked are dropped: a closed
    /// cup's rows are frozen and never touched again.
    async fn recompute_dirty(&self, now: DateTime<Utc>) {
        let entries: Vec<(CupId, BzId, Category)> =
            self.dirty.lock().await.drain().collect();
        if entries.is_empty() {
            return;
        }

        let current = match self.current_cup(now).await {
            Ok(cup) => cup,
            Err(e) => {
                warn!(error = %e, "Cannot resolve current cup; ratios stay stale");
                // Put the entries back so the next tick retries them.
                self.dirty.lock().await.extend(entries);
                return;
            }
        };

        for (cup_id, bz_id, category) in entries {
            let result = match &current {
                Some(cup) if cup.id == cup_id => self.recompute(cup_id, bz_id, category).await,
                _ => Err(CupError::CupClosed(cup_id)),
            };
            if let Err(e) = result {
                match e {
                    CupError::CupClosed(_) => info!(
                        cup_id,
                        bz_id = %bz_id,
                        category = %category,
                        "Cup closed before recompute; frozen data left untouched"
                    ),
                    e => warn!(
                        cup_id,
                        bz_id = %bz_id,
                        category = %category,
                        error = %e,
                        "Ratio recompute failed; continuing"
                    ),
                }
            }
        }
    }

    async fn recompute(
        &self,
        cup_id: CupId,
        bz_id: BzId,
        category: Category,
    ) -> Result<(), CupError> {
        let score = match self.repository.category_score(cup_id, bz_id, category).await? {
            Some(score) => score,
            // Time changed but the player never scored in this category.
            None => return Ok(()),
        };
        let playing_time = self.repository.playing_time(cup_id, bz_id).await?;
        let ratio = ranking_ratio(score.points, playing_time);
        self.repository.store_ratio(cup_id, bz_id, category, ratio).await
    }
}

fn update_kill_streaks(streaks: &mut HashMap<BzId, u32>, event: &HostEvent) {
    if let HostEvent::PlayerKilled {
        victim_id,
        killer_id,
        ..
    } = event
    {
        streaks.insert(*victim_id, 0);
        if killer_id != victim_id {
            *streaks.entry(*killer_id).or_insert(0) += 1;
        }
    }
}

pub struct CupServiceBuilder {
    repository: Arc<dyn CupRepository>,
    calculators: Vec<Arc<dyn PointsCalculator>>,
    config: CupConfig,
}

impl CupServiceBuilder {
    fn new(repository: Arc<dyn CupRepository>) -> Self {
        Self {
            repository,
            calculators: vec![
                Arc::new(CaptureCalculator::new()),
                Arc::new(KillCalculator::new()),
                Arc::new(GenocideCalculator::new()),
                Arc::new(RampageCalculator::new()),
            ],
            config: CupConfig::default(),
        }
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn PointsCalculator>) -> Self {
        self.calculators.push(calculator);
        self
    }

    pub fn with_config(mut self, config: CupConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> CupService {
        CupService {
            repository: self.repository,
            calculators: self.calculators,
            config: self.config,
            tracker: Mutex::new(PlayingTimeTracker::new()),
            roster: Mutex::new(HashMap::new()),
            kill_streaks: Mutex::new(HashMap::new()),
            dirty: Mutex::new(HashSet::new()),
            last_flush: Mutex::new(None),
        }
    }
}

/// Adapter wiring the service into the host event dispatch.
///
/// Every error is logged here and swallowed: a scoring hiccup must never
/// abort event processing on the host.
pub struct CupEventSubscriber {
    service: Arc<CupService>,
}

impl CupEventSubscriber {
    pub fn new(service: Arc<CupService>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl EventHandler for CupEventSubscriber {
    async fn handle(&self, event: &HostEvent) -> Result<(), EventError> {
        let now = Utc::now();
        let result = match event {
            HostEvent::PlayerJoined { bz_id, callsign, .. } => {
                self.service.handle_join(*bz_id, callsign, now).await
            }
            HostEvent::PlayerParted { bz_id } => self.service.handle_part(*bz_id, now).await,
            HostEvent::PlayerPaused { bz_id, paused } => {
                self.service.handle_pause(*bz_id, *paused, now).await
            }
            HostEvent::FlagCaptured { .. } | HostEvent::PlayerKilled { .. } => {
                self.service.handle_scoring_event(event, now).await
            }
            HostEvent::Tick { now } => self.service.handle_tick(*now).await,
        };

        if let Err(e) = result {
            tracing::error!(
                event_type = event.event_type(),
                error = %e,
                "Cup event handling failed; statistics may be stale"
            );
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "CupEventSubscriber"
    }
}
