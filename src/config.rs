use std::time::Duration;

/// Tuning constants for the polling and reconciliation engine.
///
/// The backfill ceilings (2h15m first check, 5h abandonment) are
/// business tuning carried over from operations, not derived from any
/// provider SLA. Treat them as configuration, not truths.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Minimum gap between upstream fetches for one live game; also the
    /// client-side poll cadence while a game is live.
    pub live_poll_interval: Duration,
    /// How long before scheduled tip-off polling starts.
    pub pre_game_window: Duration,
    /// Backfill: how long after tip-off a game becomes eligible for its
    /// first box-score check.
    pub first_check_delay: Duration,
    /// Backfill: give up on a game this long past tip-off if the
    /// provider never reports it final.
    pub abandonment_ceiling: Duration,
    /// Courtesy delay between consecutive upstream fetches in bulk jobs.
    pub pacer_item_delay: Duration,
    /// Courtesy delay between groups (team to team, league to league).
    pub pacer_group_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            live_poll_interval: Duration::from_secs(15),
            pre_game_window: Duration::from_secs(90 * 60),
            first_check_delay: Duration::from_secs(2 * 3600 + 15 * 60),
            abandonment_ceiling: Duration::from_secs(5 * 3600),
            pacer_item_delay: Duration::from_secs(2),
            pacer_group_delay: Duration::from_secs(30),
        }
    }
}
