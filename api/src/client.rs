use crate::wire::{
    RosterResponse, ScoreboardResponse, SummaryResponse, WireCompetitor, WireEvent,
    WireTeamPlayers,
};
use crate::{
    GameSnapshot, GameStatus, League, PlayerLine, RosterPlayer, RosterSnapshot, StatLine, TeamSide,
};
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const PROVIDER_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports/basketball";

/// Stats provider client backed by the public per-league JSON endpoints.
///
/// One network call per operation, no retries and no backoff inside the
/// client — pacing and retry cadence belong to the callers. Safe to
/// invoke in tight sequential loops.
#[derive(Debug, Clone)]
pub struct StatsApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for StatsApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("courtside/0.1 (scores sync)")
                .build()
                .unwrap_or_default(),
            base_url: PROVIDER_BASE.to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fetch failures are soft: callers treat both variants as "try again
/// on the next scheduled interval," never as fatal.
#[derive(Debug)]
pub enum ApiError {
    /// Entity does not exist upstream (HTTP 404).
    NotFound(String),
    /// Any other non-success response, timeout, or malformed body.
    Upstream(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "not found upstream: {msg}"),
            ApiError::Upstream(msg) => write!(f, "upstream unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl StatsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at a different base URL. Used by tests to talk
    /// to a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Fetch the scoreboard for one league and date. Scoreboard events
    /// carry status, start time, and team scores but no player lines.
    pub async fn fetch_scoreboard(
        &self,
        league: League,
        date: NaiveDate,
    ) -> ApiResult<Vec<GameSnapshot>> {
        let url = format!(
            "{}/{}/scoreboard?dates={}&limit=100",
            self.base_url,
            league.path(),
            date.format("%Y%m%d")
        );
        let raw: ScoreboardResponse = self.get(&url).await?;
        Ok(raw
            .events
            .unwrap_or_default()
            .iter()
            .map(map_event)
            .collect())
    }

    /// Fetch the full box score for one game, player lines included.
    pub async fn fetch_box_score(&self, league: League, remote_id: &str) -> ApiResult<GameSnapshot> {
        let url = format!(
            "{}/{}/summary?event={remote_id}",
            self.base_url,
            league.path()
        );
        let raw: SummaryResponse = self.get(&url).await?;
        map_summary(remote_id, raw)
    }

    /// Fetch a team's current roster (nightly refresh path).
    pub async fn fetch_roster(&self, league: League, team_id: &str) -> ApiResult<RosterSnapshot> {
        let url = format!(
            "{}/{}/teams/{team_id}/roster",
            self.base_url,
            league.path()
        );
        let raw: RosterResponse = self.get(&url).await?;
        Ok(map_roster(team_id, raw))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("{url}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.to_owned()));
        }
        if !status.is_success() {
            return Err(ApiError::Upstream(format!("{url}: HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Upstream(format!("{url}: bad body: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Mapping: provider wire types → canonical snapshots
// ---------------------------------------------------------------------------

fn map_event(event: &WireEvent) -> GameSnapshot {
    let status = event
        .status
        .as_ref()
        .and_then(|s| s.status_type.as_ref())
        .and_then(|t| t.name.as_deref())
        .map(parse_status)
        .unwrap_or_default();

    let period = event.status.as_ref().and_then(|s| s.period);
    let clock = event.status.as_ref().and_then(|s| s.display_clock.clone());

    let start_time = event
        .date
        .as_deref()
        .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let competitors: Vec<&WireCompetitor> = event
        .competitions
        .as_deref()
        .unwrap_or_default()
        .iter()
        .flat_map(|c| c.competitors.iter().flatten())
        .collect();

    let (home, away) = split_sides(&competitors);

    GameSnapshot {
        remote_id: event.id.clone().unwrap_or_default(),
        status,
        start_time,
        home,
        away,
        player_lines: Vec::new(),
        period,
        clock,
    }
}

fn map_summary(remote_id: &str, raw: SummaryResponse) -> ApiResult<GameSnapshot> {
    let competition = raw
        .header
        .as_ref()
        .and_then(|h| h.competitions.as_deref())
        .and_then(|c| c.first())
        .ok_or_else(|| ApiError::Upstream(format!("summary for {remote_id} has no competition")))?;

    let status = competition
        .status
        .as_ref()
        .and_then(|s| s.status_type.as_ref())
        .and_then(|t| t.name.as_deref())
        .map(parse_status)
        .unwrap_or_default();

    let period = competition.status.as_ref().and_then(|s| s.period);
    let clock = competition
        .status
        .as_ref()
        .and_then(|s| s.display_clock.clone());

    let start_time = competition
        .date
        .as_deref()
        .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let competitors: Vec<&WireCompetitor> =
        competition.competitors.iter().flatten().collect();
    let (home, away) = split_sides(&competitors);

    let player_lines = raw
        .boxscore
        .and_then(|b| b.players)
        .unwrap_or_default()
        .into_iter()
        .flat_map(map_team_players)
        .collect();

    Ok(GameSnapshot {
        remote_id: remote_id.to_owned(),
        status,
        start_time,
        home,
        away,
        player_lines,
        period,
        clock,
    })
}

fn map_roster(team_id: &str, raw: RosterResponse) -> RosterSnapshot {
    let players = raw
        .athletes
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| {
            let remote_id = a.id?;
            Some(RosterPlayer {
                remote_id,
                name: a.display_name.unwrap_or_default(),
                position: a.position.and_then(|p| p.abbreviation),
                jersey: a.jersey,
            })
        })
        .collect();

    RosterSnapshot {
        team_remote_id: raw
            .team
            .and_then(|t| t.id)
            .unwrap_or_else(|| team_id.to_owned()),
        players,
    }
}

fn split_sides(competitors: &[&WireCompetitor]) -> (TeamSide, TeamSide) {
    // "home" first, "away" second; fall back to index order.
    let home = competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some("home"))
        .copied()
        .or_else(|| competitors.first().copied());
    let away = competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some("away"))
        .copied()
        .or_else(|| competitors.get(1).copied());
    (
        home.map(map_side).unwrap_or_default(),
        away.map(map_side).unwrap_or_default(),
    )
}

fn map_side(c: &WireCompetitor) -> TeamSide {
    let team = c.team.clone().unwrap_or_default();
    TeamSide {
        remote_id: team.id.or_else(|| c.id.clone()).unwrap_or_default(),
        name: team.display_name.unwrap_or_default(),
        abbrev: team.abbreviation.unwrap_or_default(),
        score: coerce_u16(c.score.as_deref()),
    }
}

fn map_team_players(team_data: WireTeamPlayers) -> Vec<PlayerLine> {
    let team_remote_id = team_data
        .team
        .and_then(|t| t.id)
        .unwrap_or_default();

    let Some(cat) = team_data
        .statistics
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.name.as_deref() == Some("athletes"))
    else {
        return Vec::new();
    };

    let keys = cat.keys.unwrap_or_default();
    cat.athletes
        .unwrap_or_default()
        .into_iter()
        .filter_map(|line| {
            let athlete = line.athlete?;
            let remote_id = athlete.id?;
            let stats = parse_stat_line(&line.stats.unwrap_or_default(), &keys);
            Some(PlayerLine {
                remote_id,
                name: athlete.display_name.unwrap_or_default(),
                team_remote_id: team_remote_id.clone(),
                stats,
            })
        })
        .collect()
}

/// Positional stat parsing: `keys` names each column of the athlete's
/// stats array. Missing columns and unparsable values coerce to 0.
fn parse_stat_line(stats: &[String], keys: &[String]) -> StatLine {
    let get = |key: &str| -> Option<&str> {
        keys.iter()
            .position(|k| k == key)
            .and_then(|i| stats.get(i))
            .map(String::as_str)
    };
    let num = |key: &str| coerce_u16(get(key));

    StatLine {
        minutes: num("MIN"),
        points: num("PTS"),
        rebounds: num("REB"),
        assists: num("AST"),
        steals: num("STL"),
        blocks: num("BLK"),
        turnovers: num("TO"),
    }
}

/// The provider sends numeric values as strings, occasionally malformed
/// ("--", "DNP", empty). Coerce to 0 rather than failing the whole map.
fn coerce_u16(raw: Option<&str>) -> u16 {
    raw.and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or_default()
}

fn parse_status(s: &str) -> GameStatus {
    match s {
        "STATUS_IN_PROGRESS" => GameStatus::Live,
        "STATUS_HALFTIME" => GameStatus::Halftime,
        "STATUS_END_PERIOD" => GameStatus::Live,
        "STATUS_OVERTIME" => GameStatus::Overtime,
        "STATUS_FINAL" | "STATUS_FINAL_OT" => GameStatus::Final,
        "STATUS_POSTPONED" | "STATUS_SUSPENDED" => GameStatus::Postponed,
        "STATUS_CANCELED" | "STATUS_CANCELLED" => GameStatus::Cancelled,
        _ => GameStatus::Scheduled,
    }
}
