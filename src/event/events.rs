use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cup::BzId;

/// Events delivered by the host game server.
///
/// Events represent facts about things that have already happened on the
/// server. The host fires them one at a time on a single callback thread,
/// in occurrence order; the dispatcher preserves that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HostEvent {
    /// A player connected to the server
    PlayerJoined {
        bz_id: BzId,
        callsign: String,
        team: String,
    },

    /// A player disconnected from the server
    PlayerParted { bz_id: BzId },

    /// A player paused or resumed play
    PlayerPaused { bz_id: BzId, paused: bool },

    /// A flag was captured
    FlagCaptured {
        capper_id: BzId,
        /// Size of the team whose flag was taken (the losing team)
        capped_team_size: u32,
        /// Size of the capturing team
        capping_team_size: u32,
    },

    /// A player was killed
    PlayerKilled {
        victim_id: BzId,
        killer_id: BzId,
        /// Flag abbreviation the killer shot with, e.g. "G" for Genocide
        weapon: String,
        victim_team: String,
        killer_team: String,
    },

    /// Periodic timer event, used to flush playing time and refresh ratios
    Tick { now: DateTime<Utc> },
}

impl HostEvent {
    /// Human-readable event type, for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            HostEvent::PlayerJoined { .. } => "player_joined",
            HostEvent::PlayerParted { .. } => "player_parted",
            HostEvent::PlayerPaused { .. } => "player_paused",
            HostEvent::FlagCaptured { .. } => "flag_captured",
            HostEvent::PlayerKilled { .. } => "player_killed",
            HostEvent::Tick { .. } => "tick",
        }
    }

    /// The player most directly concerned by this event, where one exists.
    pub fn player_id(&self) -> Option<BzId> {
        match self {
            HostEvent::PlayerJoined { bz_id, .. } => Some(*bz_id),
            HostEvent::PlayerParted { bz_id } => Some(*bz_id),
            HostEvent::PlayerPaused { bz_id, .. } => Some(*bz_id),
            HostEvent::FlagCaptured { capper_id, .. } => Some(*capper_id),
            HostEvent::PlayerKilled { killer_id, .. } => Some(*killer_id),
            HostEvent::Tick { .. } => None,
        }
    }
}
