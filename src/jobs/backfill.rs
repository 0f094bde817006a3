use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::engine::reconcile::reconcile;
use crate::engine::sync::SyncError;
use crate::pacer::Pacer;
use crate::store::{QueueItem, QueuePurpose, QueueStatus, Store};
use chrono::{DateTime, NaiveDate, Utc};
use hoops_api::client::StatsApi;
use hoops_api::League;
use std::sync::Arc;
use tracing::{info, warn};

/// Historical box-score backfill. Discovery scans a date range and
/// queues one item per game; the runner works through eligible items
/// strictly sequentially (rate-limit politeness, not a scalability
/// limit) and drives each through the forward-only queue state machine.
pub struct BackfillJob<S> {
    api: StatsApi,
    store: Arc<S>,
    config: SyncConfig,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillReport {
    pub processed: usize,
    pub abandoned: usize,
    pub failed: usize,
    pub still_checking: usize,
}

impl<S: Store> BackfillJob<S> {
    pub fn new(api: StatsApi, store: Arc<S>, config: SyncConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            store,
            config,
            clock,
        }
    }

    /// Scan a date range's scoreboards and queue every game found.
    /// Re-running over the same range is harmless: existing queue items
    /// are left untouched.
    pub async fn discover(
        &self,
        league: League,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize, SyncError> {
        let mut pacer = Pacer::new(
            self.clock.clone(),
            self.config.pacer_item_delay,
            self.config.pacer_group_delay,
        );
        let mut queued = 0;
        let mut date = from;
        while date <= to {
            pacer.item().await;
            match self.api.fetch_scoreboard(league, date).await {
                Ok(snapshots) => {
                    for snapshot in &snapshots {
                        if snapshot.remote_id.is_empty() {
                            continue;
                        }
                        let now = self.clock.now();
                        reconcile(self.store.as_ref(), league, snapshot, now).await?;
                        if self
                            .store
                            .queue_item(league, &snapshot.remote_id, QueuePurpose::Backfill)
                            .await?
                            .is_none()
                        {
                            let item = self.new_item(league, &snapshot.remote_id, snapshot.start_time, now);
                            self.store.upsert_queue_item(item).await?;
                            queued += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(%league, %date, error = %e, "scoreboard fetch failed, skipping day");
                }
            }
            let Some(next) = date.succ_opt() else { break };
            date = next;
        }
        info!(%league, %from, %to, queued, "backfill discovery complete");
        Ok(queued)
    }

    fn new_item(
        &self,
        league: League,
        remote_id: &str,
        start_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> QueueItem {
        let first_check =
            chrono::Duration::from_std(self.config.first_check_delay).unwrap_or_default();
        let ceiling =
            chrono::Duration::from_std(self.config.abandonment_ceiling).unwrap_or_default();
        let anchor = start_time.unwrap_or(now);
        QueueItem {
            league,
            remote_id: remote_id.to_owned(),
            purpose: QueuePurpose::Backfill,
            status: QueueStatus::Pending,
            check_count: 0,
            first_eligible_at: anchor + first_check,
            abandon_after: anchor + ceiling,
        }
    }

    /// Process every eligible queue item once. One item's failure never
    /// aborts its siblings.
    pub async fn run(&self) -> Result<BackfillReport, SyncError> {
        let now = self.clock.now();
        let items = self
            .store
            .eligible_queue_items(QueuePurpose::Backfill, now)
            .await?;
        info!(eligible = items.len(), "backfill run starting");

        let mut pacer = Pacer::new(
            self.clock.clone(),
            self.config.pacer_item_delay,
            self.config.pacer_group_delay,
        );
        let mut report = BackfillReport::default();
        for item in items {
            pacer.item().await;
            self.process_item(item, &mut report).await?;
        }
        info!(?report, "backfill run complete");
        Ok(report)
    }

    async fn process_item(
        &self,
        mut item: QueueItem,
        report: &mut BackfillReport,
    ) -> Result<(), SyncError> {
        item.transition(QueueStatus::Checking);
        item.check_count += 1;
        self.store.upsert_queue_item(item.clone()).await?;

        let snapshot = match self.api.fetch_box_score(item.league, &item.remote_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(game = %item.remote_id, error = %e, "backfill fetch failed");
                self.settle_without_result(item, report).await?;
                return Ok(());
            }
        };

        let now = self.clock.now();
        match reconcile(self.store.as_ref(), item.league, &snapshot, now).await {
            Ok(result) if result.now_terminal => {
                item.transition(QueueStatus::Processed);
                report.processed += 1;
                self.store.upsert_queue_item(item).await?;
            }
            Ok(_) => {
                self.settle_without_result(item, report).await?;
            }
            Err(e) => {
                // Storage trouble on this one game; mark it and move on.
                warn!(game = %item.remote_id, error = %e, "backfill reconcile failed");
                item.transition(QueueStatus::Failed);
                report.failed += 1;
                self.store.upsert_queue_item(item).await?;
            }
        }
        Ok(())
    }

    /// The game did not reach a terminal provider status this attempt:
    /// abandon it past the ceiling, otherwise leave it checking.
    async fn settle_without_result(
        &self,
        mut item: QueueItem,
        report: &mut BackfillReport,
    ) -> Result<(), SyncError> {
        if self.clock.now() > item.abandon_after {
            item.transition(QueueStatus::Abandoned);
            report.abandoned += 1;
            warn!(game = %item.remote_id, checks = item.check_count, "backfill item abandoned");
            self.store.upsert_queue_item(item).await?;
        } else {
            report.still_checking += 1;
            self.store.upsert_queue_item(item).await?;
        }
        Ok(())
    }
}
