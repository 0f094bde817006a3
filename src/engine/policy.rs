use crate::config::SyncConfig;
use chrono::{DateTime, Utc};
use hoops_api::GameStatus;
use std::time::Duration;

/// Client- and job-side re-poll cadence for one game. `None` means stop
/// polling.
///
/// Pure given `(status, start_time, now)` — how it gets invoked (timer,
/// visibility event, cron tick) is the caller's business.
pub fn next_poll_interval(
    status: GameStatus,
    start_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &SyncConfig,
) -> Option<Duration> {
    if status.is_terminal() {
        return None;
    }
    if status.is_live() {
        return Some(config.live_poll_interval);
    }

    // Scheduled: poll at the live cadence once inside the pre-game
    // window, otherwise wait for the window to open.
    let start = start_time?;
    let window = chrono::Duration::from_std(config.pre_game_window).unwrap_or_default();
    if now >= start - window {
        Some(config.live_poll_interval)
    } else {
        None
    }
}

/// Abandonment policy for queue-based jobs: a game still not terminal
/// this long past tip-off is assumed to never report completion
/// upstream (data-quality failure) and is given up on.
pub fn is_abandoned(
    start_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    ceiling: Duration,
) -> bool {
    let Some(start) = start_time else {
        return false;
    };
    let ceiling = chrono::Duration::from_std(ceiling).unwrap_or_default();
    now > start + ceiling
}
