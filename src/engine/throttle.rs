use chrono::{DateTime, Utc};
use hoops_api::GameStatus;
use std::time::Duration;

/// Decide whether enough time has passed to justify another upstream
/// fetch for one game.
///
/// Pure and side-effect free. The read-decide-fetch-write sequence is
/// not atomic, so callers re-check immediately before the actual fetch;
/// two callers racing through the same window is accepted wasted work,
/// absorbed by the reconciler's keyed upserts.
pub fn should_fetch(
    status: GameStatus,
    last_fetched_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> bool {
    if status.is_terminal() {
        return false;
    }
    match last_fetched_at {
        None => true,
        Some(last) => now
            .signed_duration_since(last)
            .to_std()
            .map(|elapsed| elapsed >= min_interval)
            // Clock went backwards relative to the stored stamp.
            .unwrap_or(false),
    }
}
