// Slash-command surface
//
// Parses the `/cup` and `/rank` chat commands and renders the reply lines
// the host sends back to the requesting player. Parsing problems and engine
// errors both come back as reply lines; a bad command never aborts anything.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::cup::{BzId, Category, CupService, LeaderboardEntry};
use crate::shared::CupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CupCommand {
    /// `/cup [category]` - show the category leaderboard
    Cup { category: Category },
    /// `/rank [category]` - show the caller's rank in the category
    Rank { category: Category },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command /{0}")]
    UnknownCommand(String),

    #[error("unknown category '{0}' (try capture, bounty, geno or kill)")]
    UnknownCategory(String),
}

/// Parses a slash command name plus arguments. The category argument is
/// optional and defaults to capture, the cup's headline category.
pub fn parse_command(command: &str, args: &[String]) -> Result<CupCommand, CommandParseError> {
    let category = match args.first() {
        Some(raw) => Category::from_str(raw)
            .map_err(|_| CommandParseError::UnknownCategory(raw.clone()))?,
        None => Category::Capture,
    };

    match command {
        "cup" => Ok(CupCommand::Cup { category }),
        "rank" => Ok(CupCommand::Rank { category }),
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

/// Renders a leaderboard as fixed-width rows: position, callsign truncated
/// to `callsign_width`, ratio.
pub fn format_leaderboard(
    category: Category,
    entries: &[LeaderboardEntry],
    callsign_width: usize,
) -> Vec<String> {
    let mut lines = vec![format!("MoFo Cup - {category} standings")];
    if entries.is_empty() {
        lines.push("No scores recorded yet.".to_string());
        return lines;
    }
    for (index, entry) in entries.iter().enumerate() {
        let callsign: String = entry.callsign.chars().take(callsign_width).collect();
        lines.push(format!(
            "{:>2}. {:<width$} {:>8}",
            index + 1,
            callsign,
            entry.ratio,
            width = callsign_width,
        ));
    }
    lines
}

/// Single-line rank announcement; `None` renders as unranked rather than a
/// made-up position.
pub fn format_rank(category: Category, rank: Option<u32>) -> String {
    match rank {
        Some(position) => format!("You are ranked #{position} in the {category} cup."),
        None => format!("You are not ranked in the {category} cup yet."),
    }
}

/// Binds the parser and formatters to a service. All failure modes come
/// back as reply lines for the requesting player.
pub struct CommandHandler {
    service: Arc<CupService>,
}

impl CommandHandler {
    pub fn new(service: Arc<CupService>) -> Self {
        Self { service }
    }

    pub async fn respond(
        &self,
        bz_id: BzId,
        command: &str,
        args: &[String],
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let parsed = match parse_command(command, args) {
            Ok(parsed) => parsed,
            Err(e) => return vec![e.to_string()],
        };

        let result = match parsed {
            CupCommand::Cup { category } => self
                .service
                .leaderboard(category, now)
                .await
                .map(|entries| {
                    format_leaderboard(
                        category,
                        &entries,
                        self.service.config().callsign_width,
                    )
                }),
            CupCommand::Rank { category } => self
                .service
                .rank_of(bz_id, category, now)
                .await
                .map(|rank| vec![format_rank(category, rank)]),
        };

        match result {
            Ok(lines) => lines,
            Err(CupError::NoCurrentCup(_)) => {
                vec!["No cup is currently running.".to_string()]
            }
            Err(e) => {
                warn!(bz_id = %bz_id, command, error = %e, "Command query failed");
                vec!["Cup statistics are unavailable right now.".to_string()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("cup", &[], CupCommand::Cup { category: Category::Capture })]
    #[case("cup", &["geno"], CupCommand::Cup { category: Category::Geno })]
    #[case("rank", &[], CupCommand::Rank { category: Category::Capture })]
    #[case("rank", &["Kill"], CupCommand::Rank { category: Category::Kill })]
    fn parses_valid_commands(
        #[case] command: &str,
        #[case] raw_args: &[&str],
        #[case] expected: CupCommand,
    ) {
        assert_eq!(parse_command(command, &args(raw_args)).unwrap(), expected);
    }

    #[test]
    fn unknown_category_is_a_user_error() {
        let err = parse_command("cup", &args(&["bogus"])).unwrap_err();
        assert_eq!(
            err,
            CommandParseError::UnknownCategory("bogus".to_string())
        );
    }

    #[test]
    fn unknown_command_is_a_user_error() {
        let err = parse_command("leaderboard", &[]).unwrap_err();
        assert!(matches!(err, CommandParseError::UnknownCommand(_)));
    }

    #[test]
    fn leaderboard_rows_are_fixed_width() {
        let entries = vec![
            LeaderboardEntry {
                bz_id: 1,
                callsign: "a-very-long-callsign-indeed".to_string(),
                points: 100,
                ratio: 250,
                playing_time: 3600,
            },
            LeaderboardEntry {
                bz_id: 2,
                callsign: "shorty".to_string(),
                points: 10,
                ratio: 40,
                playing_time: 7200,
            },
        ];

        let lines = format_leaderboard(Category::Capture, &entries, 16);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("capture"));
        // Both data rows end up the same width despite differing names.
        assert_eq!(lines[1].len(), lines[2].len());
        assert!(lines[1].contains("a-very-long-call"));
        assert!(!lines[1].contains("indeed"));
    }

    #[test]
    fn empty_leaderboard_says_so() {
        let lines = format_leaderboard(Category::Bounty, &[], 16);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "No scores recorded yet.");
    }

    #[test]
    fn rank_formatting_handles_unranked() {
        assert_eq!(
            format_rank(Category::Geno, Some(3)),
            "You are ranked #3 in the geno cup."
        );
        assert_eq!(
            format_rank(Category::Geno, None),
            "You are not ranked in the geno cup yet."
        );
    }
}
