use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use courtside::clock::SystemClock;
use courtside::engine::policy::next_poll_interval;
use courtside::engine::SyncEngine;
use courtside::jobs::{BackfillJob, NightlyJob};
use courtside::store::{MemoryStore, Store};
use courtside::SyncConfig;
use hoops_api::client::StatsApi;
use hoops_api::League;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("courtside=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let store = Arc::new(MemoryStore::new());
    let config = SyncConfig::default();

    match args.first().map(String::as_str) {
        Some("live") => {
            let league = parse_league(args.get(1).map(String::as_str).unwrap_or("nba"))?;
            run_live(league, store, config).await
        }
        Some("backfill") => {
            let league = parse_league(args.get(1).map(String::as_str).unwrap_or("nba"))?;
            let from = parse_date(args.get(2)).context("backfill needs <from> YYYY-MM-DD")?;
            let to = parse_date(args.get(3)).context("backfill needs <to> YYYY-MM-DD")?;
            let job = BackfillJob::new(StatsApi::new(), store, config, Arc::new(SystemClock));
            let queued = job.discover(league, from, to).await?;
            info!(queued, "discovery done, running queue");
            let report = job.run().await?;
            info!(?report, "backfill finished");
            Ok(())
        }
        Some("nightly") => {
            let job = NightlyJob::new(StatsApi::new(), store, config, Arc::new(SystemClock));
            let report = job.run().await?;
            info!(?report, "nightly finished");
            Ok(())
        }
        _ => {
            eprintln!("usage: courtside live [league] | backfill [league] <from> <to> | nightly");
            eprintln!("  league: nba (default) | wnba | gleague");
            Ok(())
        }
    }
}

fn parse_league(raw: &str) -> anyhow::Result<League> {
    match raw.to_ascii_lowercase().as_str() {
        "nba" => Ok(League::Nba),
        "wnba" => Ok(League::Wnba),
        "gleague" | "g-league" | "nba-development" => Ok(League::GLeague),
        other => bail!("unknown league: {other}"),
    }
}

fn parse_date(raw: Option<&String>) -> anyhow::Result<NaiveDate> {
    let raw = raw.context("missing date argument")?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("bad date: {raw}"))
}

/// Follow today's slate: discover the scoreboard once, then poll each
/// game at the cadence the scheduler dictates until every game is
/// terminal.
async fn run_live(
    league: League,
    store: Arc<MemoryStore>,
    config: SyncConfig,
) -> anyhow::Result<()> {
    let engine = SyncEngine::new(StatsApi::new(), store, config);
    let today = Utc::now().date_naive();
    let ids = engine.discover_games(league, today).await?;
    if ids.is_empty() {
        info!(%league, "no games today");
        return Ok(());
    }

    loop {
        let now = Utc::now();
        let mut shortest: Option<Duration> = None;

        for id in &ids {
            let Some(game) = engine.store().game(league, id).await? else {
                continue;
            };
            let Some(interval) =
                next_poll_interval(game.status, game.start_time, now, engine.config())
            else {
                continue;
            };
            engine.sync_if_due(league, id, now).await?;
            shortest = Some(shortest.map_or(interval, |s| s.min(interval)));
        }

        // All games terminal or outside their pre-game windows: check
        // back occasionally for windows that open later in the day.
        match shortest {
            Some(interval) => tokio::time::sleep(interval).await,
            None => {
                let all_done = {
                    let mut done = true;
                    for id in &ids {
                        if let Some(game) = engine.store().game(league, id).await? {
                            done &= game.status.is_terminal();
                        }
                    }
                    done
                };
                if all_done {
                    info!(%league, "all games final, stopping");
                    return Ok(());
                }
                tokio::time::sleep(Duration::from_secs(300)).await;
            }
        }
    }
}
