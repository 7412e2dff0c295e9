use crate::cup::Category;
use crate::event::HostEvent;

use super::super::{PointAward, PointsCalculator, ScoringContext};

/// Capture points with a team-size bonus.
///
/// Capping a full team while shorthanded is worth more than farming an
/// outnumbered one: `max(1, 2 * capped_team_size - capping_team_size)`.
pub struct CaptureCalculator;

impl CaptureCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CaptureCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsCalculator for CaptureCalculator {
    fn points_for(&self, event: &HostEvent, _ctx: &ScoringContext) -> Vec<PointAward> {
        match event {
            HostEvent::FlagCaptured {
                capper_id,
                capped_team_size,
                capping_team_size,
            } => {
                let bonus =
                    (2 * i64::from(*capped_team_size)) - i64::from(*capping_team_size);
                vec![PointAward {
                    bz_id: *capper_id,
                    category: Category::Capture,
                    amount: bonus.max(1),
                }]
            }
            _ => Vec::new(),
        }
    }

    fn name(&self) -> &'static str {
        "CaptureCalculator"
    }
}
