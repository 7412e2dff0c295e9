pub mod calculators;

use std::collections::HashMap;

use crate::cup::{BzId, Category};
use crate::event::HostEvent;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// The per-category ranking statistic: points normalized by playing time.
///
/// Numerically: floating-point intermediate division, truncated toward zero
/// once at the end - `floor(points / (time / 86400))` for the values the
/// engine produces (non-negative points and time). Several historical
/// revisions disagreed on the division order; this is the one consistent
/// rule used everywhere.
///
/// Zero playing time yields ratio 0: brand-new players rank at the bottom
/// instead of dividing by zero.
pub fn ranking_ratio(points: i64, playing_time: i64) -> i64 {
    if playing_time <= 0 {
        return 0;
    }
    let days = playing_time as f64 / SECONDS_PER_DAY as f64;
    (points as f64 / days).trunc() as i64
}

/// A point grant produced by a calculator for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointAward {
    pub bz_id: BzId,
    pub category: Category,
    pub amount: i64,
}

/// Read-only view of scoring state the calculators may consult.
///
/// Kill streaks are updated by the service before calculators run, so the
/// streak already includes the kill being scored.
pub struct ScoringContext<'a> {
    pub kill_streaks: &'a HashMap<BzId, u32>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(kill_streaks: &'a HashMap<BzId, u32>) -> Self {
        Self { kill_streaks }
    }
}

/// Maps a host event to zero or more point awards.
///
/// Calculators are pure with respect to persistent state; they only look at
/// the event and the in-memory scoring context. One calculator per bonus
/// rule keeps the formulas independently testable.
pub trait PointsCalculator: Send + Sync {
    fn points_for(&self, event: &HostEvent, ctx: &ScoringContext) -> Vec<PointAward>;

    /// Human-readable name, for logging.
    fn name(&self) -> &'static str;
}
