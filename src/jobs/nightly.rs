use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::engine::reconcile::season_rollup;
use crate::engine::sync::SyncError;
use crate::pacer::Pacer;
use crate::store::{PlayerRecord, StandingsRow, Store};
use hoops_api::client::StatsApi;
use hoops_api::{GameStatus, League};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Nightly aggregation: refresh rosters team by team (politely paced),
/// rebuild league standings from stored results, and recompute player
/// season averages. Idempotent; a cron trigger re-running it is safe.
pub struct NightlyJob<S> {
    api: StatsApi,
    store: Arc<S>,
    config: SyncConfig,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NightlyReport {
    pub rosters_refreshed: usize,
    pub standings_rows: usize,
    pub seasons_recomputed: usize,
}

impl<S: Store> NightlyJob<S> {
    pub fn new(api: StatsApi, store: Arc<S>, config: SyncConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            store,
            config,
            clock,
        }
    }

    pub async fn run(&self) -> Result<NightlyReport, SyncError> {
        let mut report = NightlyReport::default();
        let mut pacer = Pacer::new(
            self.clock.clone(),
            self.config.pacer_item_delay,
            self.config.pacer_group_delay,
        );

        for league in League::ALL {
            report.rosters_refreshed += self.refresh_rosters(league, &mut pacer).await?;
            report.standings_rows += self.rebuild_standings(league).await?;
            report.seasons_recomputed += self.recompute_player_seasons(league).await?;
            pacer.group().await;
        }

        info!(?report, "nightly aggregation complete");
        Ok(report)
    }

    /// One roster fetch per known team, paced. A team's failure never
    /// aborts the rest of the league.
    async fn refresh_rosters(&self, league: League, pacer: &mut Pacer) -> Result<usize, SyncError> {
        let mut refreshed = 0;
        for team in self.store.teams(league).await? {
            pacer.item().await;
            let roster = match self.api.fetch_roster(league, &team.remote_id).await {
                Ok(roster) => roster,
                Err(e) => {
                    warn!(%league, team = %team.remote_id, error = %e, "roster fetch failed");
                    continue;
                }
            };
            for player in roster.players {
                let record = PlayerRecord {
                    league,
                    remote_id: player.remote_id,
                    name: player.name,
                    team_remote_id: roster.team_remote_id.clone(),
                    position: player.position,
                    jersey: player.jersey,
                };
                if let Err(e) = self.store.upsert_player(record).await {
                    warn!(%league, team = %team.remote_id, error = %e, "player upsert failed");
                }
            }
            refreshed += 1;
        }
        Ok(refreshed)
    }

    /// Rebuild a league's standings from final results into a shadow
    /// vec, then swap it in atomically.
    async fn rebuild_standings(&self, league: League) -> Result<usize, SyncError> {
        let finals: HashSet<String> = self
            .store
            .games(league)
            .await?
            .into_iter()
            .filter(|g| g.status == GameStatus::Final)
            .map(|g| g.remote_id)
            .collect();

        // Pair each final game's two team rows and compare scores.
        let mut by_game: HashMap<String, Vec<_>> = HashMap::new();
        for row in self.store.team_games(league).await? {
            if finals.contains(&row.game_remote_id) {
                by_game.entry(row.game_remote_id.clone()).or_default().push(row);
            }
        }

        let mut tally: HashMap<String, (u32, u32)> = HashMap::new();
        for rows in by_game.values() {
            let [a, b] = rows.as_slice() else { continue };
            if a.score == b.score {
                // Basketball has no draws; equal scores mean bad data.
                warn!(%league, game = %a.game_remote_id, "tied final score, skipping for standings");
                continue;
            }
            let (winner, loser) = if a.score > b.score { (a, b) } else { (b, a) };
            tally.entry(winner.team_remote_id.clone()).or_default().0 += 1;
            tally.entry(loser.team_remote_id.clone()).or_default().1 += 1;
        }

        let mut shadow: Vec<StandingsRow> = tally
            .into_iter()
            .map(|(team_remote_id, (wins, losses))| StandingsRow {
                league,
                team_remote_id,
                wins,
                losses,
                win_pct: f64::from(wins) / f64::from(wins + losses),
            })
            .collect();
        shadow.sort_by(|a, b| {
            b.win_pct
                .partial_cmp(&a.win_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.wins.cmp(&a.wins))
                .then(a.team_remote_id.cmp(&b.team_remote_id))
        });

        let count = shadow.len();
        self.store.replace_standings(league, shadow).await?;
        Ok(count)
    }

    async fn recompute_player_seasons(&self, league: League) -> Result<usize, SyncError> {
        let mut recomputed = 0;
        for player in self.store.players(league).await? {
            let rows = self.store.player_games(league, &player.remote_id).await?;
            if rows.is_empty() {
                continue;
            }
            let rollup = season_rollup(league, &player.remote_id, &rows);
            self.store.upsert_player_season(rollup).await?;
            recomputed += 1;
        }
        Ok(recomputed)
    }
}
