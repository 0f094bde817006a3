//! Storage boundary. The engine persists through the [`Store`] trait
//! only; at-most-one-row-per-key upsert semantics are what make
//! concurrent reconciliation safe (duplicate work converges instead of
//! duplicating rows).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hoops_api::{GameStatus, League, StatLine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One tracked game. Created the first time the provider lists it,
/// updated by the reconciler on every successful sync, never deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameRecord {
    pub league: League,
    pub remote_id: String,
    pub status: GameStatus,
    pub start_time: Option<DateTime<Utc>>,
    /// `None` means never fetched. Monotonically non-decreasing.
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_score: u16,
    pub away_score: u16,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRecord {
    pub league: League,
    pub remote_id: String,
    pub name: String,
    pub abbrev: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerRecord {
    pub league: League,
    pub remote_id: String,
    pub name: String,
    pub team_remote_id: String,
    pub position: Option<String>,
    pub jersey: Option<String>,
}

/// One row per `(game, team)` — patched on repeat reconciles.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGameRow {
    pub league: League,
    pub game_remote_id: String,
    pub team_remote_id: String,
    pub score: u16,
    pub is_home: bool,
}

/// One row per `(game, player)` — patched on repeat reconciles.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerGameRow {
    pub league: League,
    pub game_remote_id: String,
    pub player_remote_id: String,
    pub team_remote_id: String,
    pub stats: StatLine,
}

/// Season rollup, recomputed when a game goes final and by the nightly
/// job. Derived data; safe to rebuild from player-game rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSeasonRow {
    pub league: League,
    pub player_remote_id: String,
    pub games_played: u32,
    pub points_per_game: f64,
    pub rebounds_per_game: f64,
    pub assists_per_game: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandingsRow {
    pub league: League,
    pub team_remote_id: String,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: f64,
}

// ---------------------------------------------------------------------------
// Poll queue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueuePurpose {
    /// Historical box-score backfill over a date range.
    Backfill,
    /// Delayed post-game stat collection for the current day.
    PostGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueStatus {
    Pending,
    Checking,
    Processed,
    Abandoned,
    Failed,
}

impl QueueStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueStatus::Processed | QueueStatus::Abandoned | QueueStatus::Failed
        )
    }

    /// Queue items move forward only; terminal states are never
    /// reopened.
    pub fn can_transition(&self, next: QueueStatus) -> bool {
        match self {
            QueueStatus::Pending => next != QueueStatus::Pending,
            QueueStatus::Checking => next != QueueStatus::Pending,
            _ => false,
        }
    }
}

/// Work item tracking one game through a background job.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub league: League,
    pub remote_id: String,
    pub purpose: QueuePurpose,
    pub status: QueueStatus,
    /// Monotonically increasing count of processing attempts.
    pub check_count: u32,
    pub first_eligible_at: DateTime<Utc>,
    pub abandon_after: DateTime<Utc>,
}

impl QueueItem {
    /// Apply a forward transition. Returns false (and leaves the item
    /// untouched) if the transition would reopen or rewind the item.
    pub fn transition(&mut self, next: QueueStatus) -> bool {
        if self.status.can_transition(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Store: Send + Sync {
    async fn game(&self, league: League, remote_id: &str) -> StoreResult<Option<GameRecord>>;
    async fn games(&self, league: League) -> StoreResult<Vec<GameRecord>>;
    async fn upsert_game(&self, record: GameRecord) -> StoreResult<()>;

    async fn teams(&self, league: League) -> StoreResult<Vec<TeamRecord>>;
    async fn upsert_team(&self, record: TeamRecord) -> StoreResult<()>;

    async fn players(&self, league: League) -> StoreResult<Vec<PlayerRecord>>;
    async fn upsert_player(&self, record: PlayerRecord) -> StoreResult<()>;

    async fn team_games(&self, league: League) -> StoreResult<Vec<TeamGameRow>>;
    async fn upsert_team_game(&self, row: TeamGameRow) -> StoreResult<()>;

    /// All stat rows for one game, at most one per player.
    async fn game_player_rows(
        &self,
        league: League,
        game_remote_id: &str,
    ) -> StoreResult<Vec<PlayerGameRow>>;
    /// All stat rows for one player across games.
    async fn player_games(
        &self,
        league: League,
        player_remote_id: &str,
    ) -> StoreResult<Vec<PlayerGameRow>>;
    async fn upsert_player_game(&self, row: PlayerGameRow) -> StoreResult<()>;

    async fn upsert_player_season(&self, row: PlayerSeasonRow) -> StoreResult<()>;
    async fn player_season(
        &self,
        league: League,
        player_remote_id: &str,
    ) -> StoreResult<Option<PlayerSeasonRow>>;

    async fn standings(&self, league: League) -> StoreResult<Vec<StandingsRow>>;
    /// Atomic swap of a league's standings (shadow-compute then replace).
    async fn replace_standings(
        &self,
        league: League,
        rows: Vec<StandingsRow>,
    ) -> StoreResult<()>;

    async fn queue_item(
        &self,
        league: League,
        remote_id: &str,
        purpose: QueuePurpose,
    ) -> StoreResult<Option<QueueItem>>;
    async fn upsert_queue_item(&self, item: QueueItem) -> StoreResult<()>;
    /// Non-terminal items whose `first_eligible_at` has passed.
    async fn eligible_queue_items(
        &self,
        purpose: QueuePurpose,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<QueueItem>>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

type Key = (League, String);
type RowKey = (League, String, String); // (league, game, participant)

/// Reference [`Store`] implementation over hash maps. Doubles as the
/// test double; keyed inserts give the same at-most-one-row-per-key
/// guarantee the production storage service provides.
#[derive(Default)]
pub struct MemoryStore {
    games: RwLock<HashMap<Key, GameRecord>>,
    teams: RwLock<HashMap<Key, TeamRecord>>,
    players: RwLock<HashMap<Key, PlayerRecord>>,
    team_games: RwLock<HashMap<RowKey, TeamGameRow>>,
    player_games: RwLock<HashMap<RowKey, PlayerGameRow>>,
    player_seasons: RwLock<HashMap<Key, PlayerSeasonRow>>,
    standings: RwLock<HashMap<League, Vec<StandingsRow>>>,
    queue: RwLock<HashMap<(League, String, QueuePurpose), QueueItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn game(&self, league: League, remote_id: &str) -> StoreResult<Option<GameRecord>> {
        Ok(self
            .games
            .read()
            .await
            .get(&(league, remote_id.to_owned()))
            .cloned())
    }

    async fn games(&self, league: League) -> StoreResult<Vec<GameRecord>> {
        Ok(self
            .games
            .read()
            .await
            .values()
            .filter(|g| g.league == league)
            .cloned()
            .collect())
    }

    async fn upsert_game(&self, record: GameRecord) -> StoreResult<()> {
        self.games
            .write()
            .await
            .insert((record.league, record.remote_id.clone()), record);
        Ok(())
    }

    async fn teams(&self, league: League) -> StoreResult<Vec<TeamRecord>> {
        Ok(self
            .teams
            .read()
            .await
            .values()
            .filter(|t| t.league == league)
            .cloned()
            .collect())
    }

    async fn upsert_team(&self, record: TeamRecord) -> StoreResult<()> {
        self.teams
            .write()
            .await
            .insert((record.league, record.remote_id.clone()), record);
        Ok(())
    }

    async fn players(&self, league: League) -> StoreResult<Vec<PlayerRecord>> {
        Ok(self
            .players
            .read()
            .await
            .values()
            .filter(|p| p.league == league)
            .cloned()
            .collect())
    }

    async fn upsert_player(&self, record: PlayerRecord) -> StoreResult<()> {
        self.players
            .write()
            .await
            .insert((record.league, record.remote_id.clone()), record);
        Ok(())
    }

    async fn team_games(&self, league: League) -> StoreResult<Vec<TeamGameRow>> {
        Ok(self
            .team_games
            .read()
            .await
            .values()
            .filter(|r| r.league == league)
            .cloned()
            .collect())
    }

    async fn upsert_team_game(&self, row: TeamGameRow) -> StoreResult<()> {
        let key = (
            row.league,
            row.game_remote_id.clone(),
            row.team_remote_id.clone(),
        );
        self.team_games.write().await.insert(key, row);
        Ok(())
    }

    async fn game_player_rows(
        &self,
        league: League,
        game_remote_id: &str,
    ) -> StoreResult<Vec<PlayerGameRow>> {
        Ok(self
            .player_games
            .read()
            .await
            .values()
            .filter(|r| r.league == league && r.game_remote_id == game_remote_id)
            .cloned()
            .collect())
    }

    async fn player_games(
        &self,
        league: League,
        player_remote_id: &str,
    ) -> StoreResult<Vec<PlayerGameRow>> {
        Ok(self
            .player_games
            .read()
            .await
            .values()
            .filter(|r| r.league == league && r.player_remote_id == player_remote_id)
            .cloned()
            .collect())
    }

    async fn upsert_player_game(&self, row: PlayerGameRow) -> StoreResult<()> {
        let key = (
            row.league,
            row.game_remote_id.clone(),
            row.player_remote_id.clone(),
        );
        self.player_games.write().await.insert(key, row);
        Ok(())
    }

    async fn upsert_player_season(&self, row: PlayerSeasonRow) -> StoreResult<()> {
        self.player_seasons
            .write()
            .await
            .insert((row.league, row.player_remote_id.clone()), row);
        Ok(())
    }

    async fn player_season(
        &self,
        league: League,
        player_remote_id: &str,
    ) -> StoreResult<Option<PlayerSeasonRow>> {
        Ok(self
            .player_seasons
            .read()
            .await
            .get(&(league, player_remote_id.to_owned()))
            .cloned())
    }

    async fn standings(&self, league: League) -> StoreResult<Vec<StandingsRow>> {
        Ok(self
            .standings
            .read()
            .await
            .get(&league)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_standings(
        &self,
        league: League,
        rows: Vec<StandingsRow>,
    ) -> StoreResult<()> {
        self.standings.write().await.insert(league, rows);
        Ok(())
    }

    async fn queue_item(
        &self,
        league: League,
        remote_id: &str,
        purpose: QueuePurpose,
    ) -> StoreResult<Option<QueueItem>> {
        Ok(self
            .queue
            .read()
            .await
            .get(&(league, remote_id.to_owned(), purpose))
            .cloned())
    }

    async fn upsert_queue_item(&self, item: QueueItem) -> StoreResult<()> {
        self.queue
            .write()
            .await
            .insert((item.league, item.remote_id.clone(), item.purpose), item);
        Ok(())
    }

    async fn eligible_queue_items(
        &self,
        purpose: QueuePurpose,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<QueueItem>> {
        let mut items: Vec<QueueItem> = self
            .queue
            .read()
            .await
            .values()
            .filter(|i| {
                i.purpose == purpose && !i.status.is_terminal() && i.first_eligible_at <= now
            })
            .cloned()
            .collect();
        items.sort_by_key(|i| i.first_eligible_at);
        Ok(items)
    }
}
