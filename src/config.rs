use std::time::Duration;

/// Configuration for the cup engine.
#[derive(Debug, Clone)]
pub struct CupConfig {
    /// Identifier of the server context this engine scores for.
    /// At most one cup is "current" per server at any time.
    pub server_id: String,
    /// Minimum interval between playing-time flushes driven by `Tick` events.
    pub flush_interval: Duration,
    /// Number of rows shown by the `/cup` leaderboard.
    pub leaderboard_size: usize,
    /// Width callsigns are truncated to in leaderboard output.
    pub callsign_width: usize,
}

impl Default for CupConfig {
    fn default() -> Self {
        Self {
            server_id: "localhost:5154".to_string(),
            flush_interval: Duration::from_secs(300),
            leaderboard_size: 5,
            callsign_width: 16,
        }
    }
}

impl CupConfig {
    /// Builds a config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    ///
    /// Recognized variables: `CUP_SERVER_ID`, `CUP_FLUSH_INTERVAL_SECS`,
    /// `CUP_LEADERBOARD_SIZE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_id =
            std::env::var("CUP_SERVER_ID").unwrap_or_else(|_| defaults.server_id.clone());

        let flush_interval = std::env::var("CUP_FLUSH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.flush_interval);

        let leaderboard_size = std::env::var("CUP_LEADERBOARD_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.leaderboard_size);

        Self {
            server_id,
            flush_interval,
            leaderboard_size,
            callsign_width: defaults.callsign_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flush_interval_is_five_minutes() {
        let config = CupConfig::default();
        assert_eq!(config.flush_interval, Duration::from_secs(300));
        assert_eq!(config.leaderboard_size, 5);
    }
}
