use crate::cup::Category;
use crate::event::HostEvent;

use super::super::{PointAward, PointsCalculator, ScoringContext};

/// Streak length at which a rampage bonus fires, and again at each multiple.
const RAMPAGE_STRIDE: u32 = 5;

/// Bounty points for rampages: every `RAMPAGE_STRIDE`th consecutive kill
/// without dying pays `2 * (streak / RAMPAGE_STRIDE)`, so a 5-streak pays 2,
/// a 10-streak pays 4, and so on.
///
/// The streak counter itself lives in the service; by the time this runs the
/// context already includes the kill being scored.
pub struct RampageCalculator;

impl RampageCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RampageCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsCalculator for RampageCalculator {
    fn points_for(&self, event: &HostEvent, ctx: &ScoringContext) -> Vec<PointAward> {
        let killer_id = match event {
            HostEvent::PlayerKilled {
                victim_id,
                killer_id,
                ..
            } if killer_id != victim_id => *killer_id,
            _ => return Vec::new(),
        };

        let streak = ctx.kill_streaks.get(&killer_id).copied().unwrap_or(0);
        if streak == 0 || streak % RAMPAGE_STRIDE != 0 {
            return Vec::new();
        }

        vec![PointAward {
            bz_id: killer_id,
            category: Category::Bounty,
            amount: 2 * i64::from(streak / RAMPAGE_STRIDE),
        }]
    }

    fn name(&self) -> &'static str {
        "RampageCalculator"
    }
}
