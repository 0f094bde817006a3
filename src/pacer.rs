use crate::clock::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Spaces out a sequence of outbound calls to respect the provider's
/// undocumented rate limits: a fixed delay between consecutive items
/// and a larger one between groups (team to team, league to league).
///
/// The delay policy lives here, not in the fetcher, so bulk jobs stay
/// unit-testable against a manual clock.
pub struct Pacer {
    clock: Arc<dyn Clock>,
    item_delay: Duration,
    group_delay: Duration,
    first: bool,
}

impl Pacer {
    pub fn new(clock: Arc<dyn Clock>, item_delay: Duration, group_delay: Duration) -> Self {
        Self {
            clock,
            item_delay,
            group_delay,
            first: true,
        }
    }

    /// Wait before the next item fetch. The first item after
    /// construction or a group boundary goes immediately.
    pub async fn item(&mut self) {
        if self.first {
            self.first = false;
            return;
        }
        self.clock.sleep(self.item_delay).await;
    }

    /// Wait out a group boundary; the next item then goes immediately.
    pub async fn group(&mut self) {
        self.clock.sleep(self.group_delay).await;
        self.first = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 2, 12, 8, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn first_item_goes_immediately_then_items_are_spaced() {
        let clock = clock();
        let mut pacer = Pacer::new(
            clock.clone(),
            Duration::from_secs(2),
            Duration::from_secs(30),
        );

        pacer.item().await;
        pacer.item().await;
        pacer.item().await;

        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(2), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn group_boundary_resets_item_spacing() {
        let clock = clock();
        let mut pacer = Pacer::new(
            clock.clone(),
            Duration::from_secs(2),
            Duration::from_secs(30),
        );

        pacer.item().await; // immediate
        pacer.item().await; // +2s
        pacer.group().await; // +30s
        pacer.item().await; // immediate again
        pacer.item().await; // +2s

        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(30),
                Duration::from_secs(2),
            ]
        );
    }
}
