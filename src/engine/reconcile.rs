use crate::store::{
    GameRecord, PlayerGameRow, PlayerRecord, PlayerSeasonRow, Store, StoreResult, TeamGameRow,
    TeamRecord,
};
use chrono::{DateTime, Utc};
use hoops_api::{GameSnapshot, League, TeamSide};
use tracing::warn;

/// Outcome of merging one snapshot into storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileResult {
    /// The game is in a terminal status after this call. Used by the
    /// scheduler to stop polling and by the backfill queue to mark
    /// items processed.
    pub now_terminal: bool,
    /// One or more sub-row writes failed and were skipped. The game
    /// record itself still advanced; a later retry is idempotent.
    pub partial: bool,
}

/// Merge a freshly fetched snapshot into the local store.
///
/// Every write is a keyed upsert: teams by `(league, id)`, per-game
/// stat rows by `(game, participant)`. Applying the same snapshot twice
/// converges to the same stored state, which is what makes racing
/// callers safe without a lock.
pub async fn reconcile<S: Store>(
    store: &S,
    league: League,
    snapshot: &GameSnapshot,
    now: DateTime<Utc>,
) -> StoreResult<ReconcileResult> {
    let previous = store.game(league, &snapshot.remote_id).await?;
    let mut partial = false;

    for (side, is_home) in [(&snapshot.home, true), (&snapshot.away, false)] {
        if side.remote_id.is_empty() {
            continue;
        }
        if let Err(e) = store.upsert_team(team_record(league, side)).await {
            warn!(game = %snapshot.remote_id, team = %side.remote_id, error = %e, "team upsert failed");
            partial = true;
        }
        let row = TeamGameRow {
            league,
            game_remote_id: snapshot.remote_id.clone(),
            team_remote_id: side.remote_id.clone(),
            score: side.score,
            is_home,
        };
        if let Err(e) = store.upsert_team_game(row).await {
            warn!(game = %snapshot.remote_id, team = %side.remote_id, error = %e, "team-game upsert failed");
            partial = true;
        }
    }

    for line in &snapshot.player_lines {
        let player = PlayerRecord {
            league,
            remote_id: line.remote_id.clone(),
            name: line.name.clone(),
            team_remote_id: line.team_remote_id.clone(),
            position: None,
            jersey: None,
        };
        if let Err(e) = store.upsert_player(player).await {
            warn!(game = %snapshot.remote_id, player = %line.remote_id, error = %e, "player upsert failed");
            partial = true;
            continue;
        }
        let row = PlayerGameRow {
            league,
            game_remote_id: snapshot.remote_id.clone(),
            player_remote_id: line.remote_id.clone(),
            team_remote_id: line.team_remote_id.clone(),
            stats: line.stats,
        };
        if let Err(e) = store.upsert_player_game(row).await {
            warn!(game = %snapshot.remote_id, player = %line.remote_id, error = %e, "player-game upsert failed");
            partial = true;
        }
    }

    // Terminal statuses are sticky: a provider glitch flipping a final
    // game back to live must not resurrect polling.
    let status = match &previous {
        Some(prev) if prev.status.is_terminal() => prev.status,
        _ => snapshot.status,
    };

    // lastFetchedAt advances unconditionally on a successful fetch,
    // even when nothing else changed, so the throttle gate moves
    // forward. Never backwards.
    let last_fetched_at = previous
        .as_ref()
        .and_then(|p| p.last_fetched_at)
        .map_or(now, |prev| prev.max(now));

    let record = GameRecord {
        league,
        remote_id: snapshot.remote_id.clone(),
        status,
        start_time: snapshot
            .start_time
            .or_else(|| previous.as_ref().and_then(|p| p.start_time)),
        last_fetched_at: Some(last_fetched_at),
        home_team_id: snapshot.home.remote_id.clone(),
        away_team_id: snapshot.away.remote_id.clone(),
        home_score: snapshot.home.score,
        away_score: snapshot.away.score,
    };
    store.upsert_game(record).await?;

    // Season rollups are O(all historical rows per player); only pay
    // that on the transition into a final score, never on live ticks.
    let was_terminal = previous.map(|p| p.status.is_terminal()).unwrap_or(false);
    if status.is_terminal() && !was_terminal {
        for line in &snapshot.player_lines {
            match store.player_games(league, &line.remote_id).await {
                Ok(rows) => {
                    let rollup = season_rollup(league, &line.remote_id, &rows);
                    if let Err(e) = store.upsert_player_season(rollup).await {
                        warn!(player = %line.remote_id, error = %e, "season rollup upsert failed");
                        partial = true;
                    }
                }
                Err(e) => {
                    warn!(player = %line.remote_id, error = %e, "season rollup read failed");
                    partial = true;
                }
            }
        }
    }

    Ok(ReconcileResult {
        now_terminal: status.is_terminal(),
        partial,
    })
}

/// Per-player season averages over stored per-game rows. Shared by the
/// final-whistle rollup above and the nightly recompute.
pub fn season_rollup(
    league: League,
    player_remote_id: &str,
    rows: &[PlayerGameRow],
) -> PlayerSeasonRow {
    let games = rows.len() as u32;
    let per_game = |total: u32| -> f64 {
        if games == 0 {
            0.0
        } else {
            f64::from(total) / f64::from(games)
        }
    };

    let points: u32 = rows.iter().map(|r| u32::from(r.stats.points)).sum();
    let rebounds: u32 = rows.iter().map(|r| u32::from(r.stats.rebounds)).sum();
    let assists: u32 = rows.iter().map(|r| u32::from(r.stats.assists)).sum();

    PlayerSeasonRow {
        league,
        player_remote_id: player_remote_id.to_owned(),
        games_played: games,
        points_per_game: per_game(points),
        rebounds_per_game: per_game(rebounds),
        assists_per_game: per_game(assists),
    }
}

fn team_record(league: League, side: &TeamSide) -> TeamRecord {
    TeamRecord {
        league,
        remote_id: side.remote_id.clone(),
        name: side.name.clone(),
        abbrev: side.abbrev.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, QueueItem, QueuePurpose, StandingsRow, StoreError};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use hoops_api::{GameStatus, PlayerLine, StatLine};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 12, h, m, s).unwrap()
    }

    fn side(id: &str, score: u16) -> TeamSide {
        TeamSide {
            remote_id: id.into(),
            name: format!("Team {id}"),
            abbrev: id.to_uppercase(),
            score,
        }
    }

    fn line(player: &str, team: &str, points: u16) -> PlayerLine {
        PlayerLine {
            remote_id: player.into(),
            name: format!("Player {player}"),
            team_remote_id: team.into(),
            stats: StatLine {
                points,
                rebounds: 5,
                assists: 3,
                ..StatLine::default()
            },
        }
    }

    fn live_snapshot() -> GameSnapshot {
        GameSnapshot {
            remote_id: "g1".into(),
            status: GameStatus::Live,
            start_time: Some(at(0, 30, 0)),
            home: side("lal", 58),
            away: side("bos", 61),
            player_lines: vec![line("p1", "lal", 20), line("p2", "bos", 25)],
            period: Some(2),
            clock: Some("4:21".into()),
        }
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let store = MemoryStore::new();
        let snap = live_snapshot();
        let now = at(1, 0, 0);

        reconcile(&store, League::Nba, &snap, now).await.unwrap();
        let first_game = store.game(League::Nba, "g1").await.unwrap().unwrap();
        let first_rows = store.game_player_rows(League::Nba, "g1").await.unwrap();

        reconcile(&store, League::Nba, &snap, now).await.unwrap();
        let second_game = store.game(League::Nba, "g1").await.unwrap().unwrap();
        let mut second_rows = store.game_player_rows(League::Nba, "g1").await.unwrap();

        assert_eq!(first_game, second_game);
        assert_eq!(first_rows.len(), 2);
        second_rows.sort_by(|a, b| a.player_remote_id.cmp(&b.player_remote_id));
        let mut sorted_first = first_rows.clone();
        sorted_first.sort_by(|a, b| a.player_remote_id.cmp(&b.player_remote_id));
        assert_eq!(sorted_first, second_rows);
    }

    #[tokio::test]
    async fn last_fetched_at_never_decreases() {
        let store = MemoryStore::new();
        let snap = live_snapshot();

        reconcile(&store, League::Nba, &snap, at(1, 0, 0)).await.unwrap();
        reconcile(&store, League::Nba, &snap, at(1, 5, 0)).await.unwrap();
        // A straggler commit with an older `now` must not rewind.
        reconcile(&store, League::Nba, &snap, at(1, 2, 0)).await.unwrap();

        let game = store.game(League::Nba, "g1").await.unwrap().unwrap();
        assert_eq!(game.last_fetched_at, Some(at(1, 5, 0)));
    }

    #[tokio::test]
    async fn terminal_status_is_sticky() {
        let store = MemoryStore::new();
        let mut snap = live_snapshot();
        snap.status = GameStatus::Final;
        let result = reconcile(&store, League::Nba, &snap, at(3, 0, 0)).await.unwrap();
        assert!(result.now_terminal);

        // Provider glitch: same game reported live again.
        snap.status = GameStatus::Live;
        let result = reconcile(&store, League::Nba, &snap, at(3, 5, 0)).await.unwrap();
        assert!(result.now_terminal);
        let game = store.game(League::Nba, "g1").await.unwrap().unwrap();
        assert_eq!(game.status, GameStatus::Final);
    }

    #[tokio::test]
    async fn rollup_runs_only_on_the_transition_into_final() {
        let store = MemoryStore::new();
        let mut snap = live_snapshot();

        reconcile(&store, League::Nba, &snap, at(1, 0, 0)).await.unwrap();
        assert!(
            store
                .player_season(League::Nba, "p1")
                .await
                .unwrap()
                .is_none(),
            "live ticks must not trigger the expensive rollup"
        );

        snap.status = GameStatus::Final;
        reconcile(&store, League::Nba, &snap, at(3, 0, 0)).await.unwrap();
        let season = store
            .player_season(League::Nba, "p1")
            .await
            .unwrap()
            .expect("rollup after final");
        assert_eq!(season.games_played, 1);
        assert!((season.points_per_game - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn season_rollup_averages_across_games() {
        let rows = vec![
            PlayerGameRow {
                league: League::Wnba,
                game_remote_id: "g1".into(),
                player_remote_id: "p1".into(),
                team_remote_id: "t1".into(),
                stats: StatLine {
                    points: 20,
                    rebounds: 10,
                    assists: 4,
                    ..StatLine::default()
                },
            },
            PlayerGameRow {
                league: League::Wnba,
                game_remote_id: "g2".into(),
                player_remote_id: "p1".into(),
                team_remote_id: "t1".into(),
                stats: StatLine {
                    points: 30,
                    rebounds: 6,
                    assists: 8,
                    ..StatLine::default()
                },
            },
        ];
        let rollup = season_rollup(League::Wnba, "p1", &rows);
        assert_eq!(rollup.games_played, 2);
        assert!((rollup.points_per_game - 25.0).abs() < f64::EPSILON);
        assert!((rollup.rebounds_per_game - 8.0).abs() < f64::EPSILON);
        assert!((rollup.assists_per_game - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn season_rollup_with_no_rows_is_zeroed() {
        let rollup = season_rollup(League::Nba, "p9", &[]);
        assert_eq!(rollup.games_played, 0);
        assert_eq!(rollup.points_per_game, 0.0);
    }

    /// Store wrapper that fails player-game writes on demand.
    struct FlakyStore {
        inner: MemoryStore,
        fail_player_games: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_player_games: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn game(&self, league: League, id: &str) -> StoreResult<Option<GameRecord>> {
            self.inner.game(league, id).await
        }
        async fn games(&self, league: League) -> StoreResult<Vec<GameRecord>> {
            self.inner.games(league).await
        }
        async fn upsert_game(&self, record: GameRecord) -> StoreResult<()> {
            self.inner.upsert_game(record).await
        }
        async fn teams(&self, league: League) -> StoreResult<Vec<TeamRecord>> {
            self.inner.teams(league).await
        }
        async fn upsert_team(&self, record: TeamRecord) -> StoreResult<()> {
            self.inner.upsert_team(record).await
        }
        async fn players(&self, league: League) -> StoreResult<Vec<PlayerRecord>> {
            self.inner.players(league).await
        }
        async fn upsert_player(&self, record: PlayerRecord) -> StoreResult<()> {
            self.inner.upsert_player(record).await
        }
        async fn team_games(&self, league: League) -> StoreResult<Vec<TeamGameRow>> {
            self.inner.team_games(league).await
        }
        async fn upsert_team_game(&self, row: TeamGameRow) -> StoreResult<()> {
            self.inner.upsert_team_game(row).await
        }
        async fn game_player_rows(
            &self,
            league: League,
            game: &str,
        ) -> StoreResult<Vec<PlayerGameRow>> {
            self.inner.game_player_rows(league, game).await
        }
        async fn player_games(
            &self,
            league: League,
            player: &str,
        ) -> StoreResult<Vec<PlayerGameRow>> {
            self.inner.player_games(league, player).await
        }
        async fn upsert_player_game(&self, row: PlayerGameRow) -> StoreResult<()> {
            if self.fail_player_games.load(Ordering::Relaxed) {
                return Err(StoreError::Backend("disk full".into()));
            }
            self.inner.upsert_player_game(row).await
        }
        async fn upsert_player_season(&self, row: PlayerSeasonRow) -> StoreResult<()> {
            self.inner.upsert_player_season(row).await
        }
        async fn player_season(
            &self,
            league: League,
            player: &str,
        ) -> StoreResult<Option<PlayerSeasonRow>> {
            self.inner.player_season(league, player).await
        }
        async fn standings(&self, league: League) -> StoreResult<Vec<StandingsRow>> {
            self.inner.standings(league).await
        }
        async fn replace_standings(
            &self,
            league: League,
            rows: Vec<StandingsRow>,
        ) -> StoreResult<()> {
            self.inner.replace_standings(league, rows).await
        }
        async fn queue_item(
            &self,
            league: League,
            id: &str,
            purpose: QueuePurpose,
        ) -> StoreResult<Option<QueueItem>> {
            self.inner.queue_item(league, id, purpose).await
        }
        async fn upsert_queue_item(&self, item: QueueItem) -> StoreResult<()> {
            self.inner.upsert_queue_item(item).await
        }
        async fn eligible_queue_items(
            &self,
            purpose: QueuePurpose,
            now: DateTime<Utc>,
        ) -> StoreResult<Vec<QueueItem>> {
            self.inner.eligible_queue_items(purpose, now).await
        }
    }

    #[tokio::test]
    async fn failed_sub_rows_flag_partial_but_still_advance_the_game() {
        let store = FlakyStore::new();
        let snap = live_snapshot();
        let now = at(1, 0, 0);

        let result = reconcile(&store, League::Nba, &snap, now).await.unwrap();
        assert!(result.partial);

        // The game record itself still advanced, so the gate moves on.
        let game = store.game(League::Nba, "g1").await.unwrap().unwrap();
        assert_eq!(game.last_fetched_at, Some(now));

        // Retry after the backend recovers fills in the missing rows.
        store.fail_player_games.store(false, Ordering::Relaxed);
        let result = reconcile(&store, League::Nba, &snap, at(1, 1, 0)).await.unwrap();
        assert!(!result.partial);
        assert_eq!(
            store.game_player_rows(League::Nba, "g1").await.unwrap().len(),
            2
        );
    }
}
