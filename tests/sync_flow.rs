//! End-to-end engine flows against a mock provider: soft upstream
//! failures, terminal no-ops, and racing callers converging.

use chrono::{TimeZone, Utc};
use courtside::engine::{SyncEngine, SyncOutcome};
use courtside::store::{GameRecord, MemoryStore, Store};
use courtside::SyncConfig;
use hoops_api::client::StatsApi;
use hoops_api::{GameStatus, League};
use std::sync::Arc;

fn engine_with(url: String, store: Arc<MemoryStore>) -> SyncEngine<MemoryStore> {
    SyncEngine::new(
        StatsApi::with_base_url(url),
        store,
        SyncConfig::default(),
    )
}

fn live_summary_body() -> String {
    serde_json::json!({
        "header": {
            "competitions": [{
                "date": "2026-02-12T00:00:00Z",
                "status": { "type": { "name": "STATUS_IN_PROGRESS" }, "period": 3,
                            "displayClock": "7:02" },
                "competitors": [
                    { "homeAway": "home", "team": { "id": "lal", "displayName": "Los Angeles Lakers", "abbreviation": "LAL" }, "score": "88" },
                    { "homeAway": "away", "team": { "id": "bos", "displayName": "Boston Celtics", "abbreviation": "BOS" }, "score": "84" }
                ]
            }]
        },
        "boxscore": {
            "players": [{
                "team": { "id": "lal" },
                "statistics": [{
                    "name": "athletes",
                    "keys": ["MIN", "PTS", "REB", "AST"],
                    "athletes": [
                        { "athlete": { "id": "p1", "displayName": "Player One" },
                          "stats": ["30", "25", "6", "4"] },
                        { "athlete": { "id": "p2", "displayName": "Player Two" },
                          "stats": ["28", "18", "9", "2"] }
                    ]
                }]
            }]
        }
    })
    .to_string()
}

#[tokio::test]
async fn upstream_404_is_soft_and_leaves_the_gate_untouched() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/nba/summary?event=g1")
        .with_status(404)
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::new());
    let fetched_at = Utc.with_ymd_and_hms(2026, 2, 12, 1, 0, 0).unwrap();
    store
        .upsert_game(GameRecord {
            league: League::Nba,
            remote_id: "g1".into(),
            status: GameStatus::Live,
            last_fetched_at: Some(fetched_at),
            ..GameRecord::default()
        })
        .await
        .unwrap();

    let engine = engine_with(server.url(), store.clone());
    let now = fetched_at + chrono::Duration::minutes(5);
    let outcome = engine.sync_if_due(League::Nba, "g1", now).await.unwrap();
    assert_eq!(outcome, SyncOutcome::UpstreamSkipped);

    let game = store.game(League::Nba, "g1").await.unwrap().unwrap();
    assert_eq!(game.last_fetched_at, Some(fetched_at));
}

#[tokio::test]
async fn terminal_games_are_never_refetched() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/nba/summary?event=g1")
        .with_status(200)
        .with_body(live_summary_body())
        .expect(0)
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::new());
    store
        .upsert_game(GameRecord {
            league: League::Nba,
            remote_id: "g1".into(),
            status: GameStatus::Final,
            ..GameRecord::default()
        })
        .await
        .unwrap();

    let engine = engine_with(server.url(), store);
    let now = Utc.with_ymd_and_hms(2026, 2, 13, 0, 0, 0).unwrap();
    let outcome = engine.sync_if_due(League::Nba, "g1", now).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Terminal);
    m.assert_async().await;
}

#[tokio::test]
async fn racing_callers_converge_without_duplicate_rows() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/nba/summary?event=g1")
        .with_status(200)
        .with_body(live_summary_body())
        .expect_at_least(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(engine_with(server.url(), store.clone()));
    let now = Utc.with_ymd_and_hms(2026, 2, 12, 2, 0, 0).unwrap();

    // No record yet, so both callers pass the gate and both fetch the
    // same snapshot. Wasted work is accepted; duplicated rows are not.
    let (a, b) = tokio::join!(
        engine.sync_if_due(League::Nba, "g1", now),
        engine.sync_if_due(League::Nba, "g1", now),
    );
    for outcome in [a.unwrap(), b.unwrap()] {
        assert!(matches!(
            outcome,
            SyncOutcome::Synced { terminal: false, partial: false } | SyncOutcome::Throttled
        ));
    }

    let rows = store.game_player_rows(League::Nba, "g1").await.unwrap();
    assert_eq!(rows.len(), 2, "exactly one row per player");

    let game = store.game(League::Nba, "g1").await.unwrap().unwrap();
    assert_eq!(game.status, GameStatus::Live);
    assert_eq!(game.home_score, 88);
    assert_eq!(game.away_score, 84);
    assert_eq!(game.last_fetched_at, Some(now));

    // A third pass with the same snapshot changes nothing.
    let later = now + chrono::Duration::seconds(20);
    engine.sync_if_due(League::Nba, "g1", later).await.unwrap();
    let rows_again = store.game_player_rows(League::Nba, "g1").await.unwrap();
    assert_eq!(rows_again.len(), 2);
}
