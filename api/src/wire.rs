//! Provider API raw wire types: serde shapes for deserializing the
//! upstream stats service's responses. These map to the clean snapshot
//! types via the mapping functions in client.rs.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Scoreboard  (per-league, per-date)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScoreboardResponse {
    pub events: Option<Vec<WireEvent>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireEvent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<WireStatus>,
    pub competitions: Option<Vec<WireCompetition>>,
    pub date: Option<String>, // ISO 8601
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireStatus {
    #[serde(rename = "type")]
    pub status_type: Option<WireStatusType>,
    pub period: Option<u8>,
    #[serde(rename = "displayClock")]
    pub display_clock: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireStatusType {
    pub name: Option<String>, // "STATUS_SCHEDULED", "STATUS_IN_PROGRESS", ...
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireCompetition {
    pub competitors: Option<Vec<WireCompetitor>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WireCompetitor {
    pub id: Option<String>,
    #[serde(rename = "homeAway")]
    pub home_away: Option<String>, // "home" | "away"
    pub team: Option<WireTeam>,
    pub score: Option<String>, // the provider sends scores as strings
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WireTeam {
    pub id: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub abbreviation: Option<String>,
}

// ---------------------------------------------------------------------------
// Box score summary  (per game)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SummaryResponse {
    pub header: Option<WireHeader>,
    pub boxscore: Option<WireBoxscore>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireHeader {
    pub id: Option<String>,
    pub competitions: Option<Vec<WireHeaderCompetition>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireHeaderCompetition {
    pub date: Option<String>,
    pub status: Option<WireStatus>,
    pub competitors: Option<Vec<WireCompetitor>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireBoxscore {
    pub players: Option<Vec<WireTeamPlayers>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireTeamPlayers {
    pub team: Option<WireTeam>,
    pub statistics: Option<Vec<WireStatCategory>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireStatCategory {
    pub name: Option<String>, // interested in "athletes"
    /// Column keys, positionally aligned with each athlete's stats array.
    pub keys: Option<Vec<String>>,
    pub athletes: Option<Vec<WireAthleteLine>>,
    pub totals: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireAthleteLine {
    pub athlete: Option<WireAthlete>,
    pub stats: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireAthlete {
    pub id: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub position: Option<WirePosition>,
    pub jersey: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WirePosition {
    pub abbreviation: Option<String>,
}

// ---------------------------------------------------------------------------
// Roster  (per team)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RosterResponse {
    pub team: Option<WireTeam>,
    pub athletes: Option<Vec<WireAthlete>>,
}
