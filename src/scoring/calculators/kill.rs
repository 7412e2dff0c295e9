use crate::cup::Category;
use crate::event::HostEvent;

use super::super::{PointAward, PointsCalculator, ScoringContext};

/// One kill point per non-suicide kill.
pub struct KillCalculator;

impl KillCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KillCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsCalculator for KillCalculator {
    fn points_for(&self, event: &HostEvent, _ctx: &ScoringContext) -> Vec<PointAward> {
        match event {
            HostEvent::PlayerKilled {
                victim_id,
                killer_id,
                ..
            } if killer_id != victim_id => vec![PointAward {
                bz_id: *killer_id,
                category: Category::Kill,
                amount: 1,
            }],
            _ => Vec::new(),
        }
    }

    fn name(&self) -> &'static str {
        "KillCalculator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn kill(victim: i64, killer: i64) -> HostEvent {
        HostEvent::PlayerKilled {
            victim_id: victim,
            killer_id: killer,
            weapon: "L".to_string(),
            victim_team: "red".to_string(),
            killer_team: "blue".to_string(),
        }
    }

    #[test]
    fn kill_awards_one_point_to_the_killer() {
        let streaks = HashMap::new();
        let awards = KillCalculator::new().points_for(&kill(3, 7), &ScoringContext::new(&streaks));

        assert_eq!(
            awards,
            vec![PointAward {
                bz_id: 7,
                category: Category::Kill,
                amount: 1,
            }]
        );
    }

    #[test]
    fn suicide_awards_nothing() {
        let streaks = HashMap::new();
        let awards = KillCalculator::new().points_for(&kill(7, 7), &ScoringContext::new(&streaks));
        assert!(awards.is_empty());
    }
}
