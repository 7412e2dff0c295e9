use crate::cup::Category;
use crate::event::HostEvent;

use super::super::{PointAward, PointsCalculator, ScoringContext};

/// Flag abbreviation the host reports for the Genocide flag.
const GENOCIDE_FLAG: &str = "G";

/// Points awarded per genocide kill. Historical revisions disagreed on this
/// constant; five is the rule used here.
const GENOCIDE_POINTS: i64 = 5;

/// Geno points for kills made with the Genocide flag, which wipes the
/// victim's whole team.
pub struct GenocideCalculator;

impl GenocideCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenocideCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsCalculator for GenocideCalculator {
    fn points_for(&self, event: &HostEvent, _ctx: &ScoringContext) -> Vec<PointAward> {
        match event {
            HostEvent::PlayerKilled {
                victim_id,
                killer_id,
                weapon,
                ..
            } if killer_id != victim_id && weapon == GENOCIDE_FLAG => vec![PointAward {
                bz_id: *killer_id,
                category: Category::Geno,
                amount: GENOCIDE_POINTS,
            }],
            _ => Vec::new(),
        }
    }

    fn name(&self) -> &'static str {
        "GenocideCalculator"
    }
}
