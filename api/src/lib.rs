pub mod client;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Canonical snapshot types — clean model, independent of the provider's
// wire format
// ---------------------------------------------------------------------------

/// The leagues the provider covers. Per-league differences (URL path,
/// box-score stat keys) live in data tables on this enum, not in
/// separately-coded sync paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum League {
    #[default]
    Nba,
    Wnba,
    GLeague,
}

impl League {
    pub const ALL: [League; 3] = [League::Nba, League::Wnba, League::GLeague];

    /// Path segment in the provider's URL scheme.
    pub fn path(&self) -> &'static str {
        match self {
            League::Nba => "nba",
            League::Wnba => "wnba",
            League::GLeague => "nba-development",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            League::Nba => "NBA",
            League::Wnba => "WNBA",
            League::GLeague => "G League",
        }
    }
}

impl std::fmt::Display for League {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Scheduled,
    Live,
    Halftime,
    Overtime,
    Final,
    Postponed,
    Cancelled,
}

impl GameStatus {
    /// Terminal statuses stop all polling; the live-sync path never
    /// re-fetches a terminal game.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameStatus::Final | GameStatus::Postponed | GameStatus::Cancelled
        )
    }

    pub fn is_live(&self) -> bool {
        matches!(
            self,
            GameStatus::Live | GameStatus::Halftime | GameStatus::Overtime
        )
    }
}

/// Normalized result of one box-score or scoreboard fetch for a single
/// game. This is the only shape the engine ever reconciles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSnapshot {
    pub remote_id: String,
    pub status: GameStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub home: TeamSide,
    pub away: TeamSide,
    pub player_lines: Vec<PlayerLine>,
    pub period: Option<u8>,
    pub clock: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamSide {
    pub remote_id: String,
    pub name: String,
    pub abbrev: String,
    pub score: u16,
}

/// One player's box-score line. Provider stat values arrive as strings;
/// anything unparsable is coerced to 0 during mapping, never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerLine {
    pub remote_id: String,
    pub name: String,
    pub team_remote_id: String,
    pub stats: StatLine,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLine {
    pub minutes: u16,
    pub points: u16,
    pub rebounds: u16,
    pub assists: u16,
    pub steals: u16,
    pub blocks: u16,
    pub turnovers: u16,
}

/// Roster fetch result, used by the nightly refresh.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    pub team_remote_id: String,
    pub players: Vec<RosterPlayer>,
}

#[derive(Debug, Clone, Default)]
pub struct RosterPlayer {
    pub remote_id: String,
    pub name: String,
    pub position: Option<String>,
    pub jersey: Option<String>,
}
