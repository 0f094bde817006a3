use crate::config::SyncConfig;
use crate::engine::reconcile::{reconcile, ReconcileResult};
use crate::engine::throttle::should_fetch;
use crate::store::{Store, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use hoops_api::client::{ApiError, StatsApi};
use hoops_api::League;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What one `sync_if_due` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Fetched and reconciled.
    Synced { terminal: bool, partial: bool },
    /// Inside the throttle window; nothing fetched.
    Throttled,
    /// Game already terminal; the live path never re-fetches it.
    Terminal,
    /// Upstream said no (404, 5xx, timeout, bad body). Last-known-good
    /// state stays on display; retry on the next interval.
    UpstreamSkipped,
}

/// The engine: throttle gate + fetcher + reconciler behind one entry
/// point. Cheap to clone per caller; concurrent callers racing on the
/// same game converge through the store's keyed upserts.
pub struct SyncEngine<S> {
    api: StatsApi,
    store: Arc<S>,
    config: SyncConfig,
}

impl<S> Clone for SyncEngine<S> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> SyncEngine<S> {
    pub fn new(api: StatsApi, store: Arc<S>, config: SyncConfig) -> Self {
        Self { api, store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Fetch and reconcile one game if the throttle gate allows it.
    ///
    /// This is the entry point for client polling hooks and job
    /// drivers alike; it never fails on upstream trouble, only on a
    /// broken store.
    pub async fn sync_if_due(
        &self,
        league: League,
        remote_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        // Gate check happens right before the fetch; an interleaved
        // caller may still slip through, which the reconciler absorbs.
        if let Some(game) = self.store.game(league, remote_id).await? {
            if game.status.is_terminal() {
                return Ok(SyncOutcome::Terminal);
            }
            if !should_fetch(
                game.status,
                game.last_fetched_at,
                now,
                self.config.live_poll_interval,
            ) {
                return Ok(SyncOutcome::Throttled);
            }
        }

        let snapshot = match self.api.fetch_box_score(league, remote_id).await {
            Ok(snapshot) => snapshot,
            Err(ApiError::NotFound(msg)) => {
                debug!(%league, game = remote_id, %msg, "game missing upstream, skipping this round");
                return Ok(SyncOutcome::UpstreamSkipped);
            }
            Err(ApiError::Upstream(msg)) => {
                warn!(%league, game = remote_id, %msg, "upstream unavailable, retrying next interval");
                return Ok(SyncOutcome::UpstreamSkipped);
            }
        };

        let ReconcileResult {
            now_terminal,
            partial,
        } = reconcile(self.store.as_ref(), league, &snapshot, now).await?;

        Ok(SyncOutcome::Synced {
            terminal: now_terminal,
            partial,
        })
    }

    /// Pull one day's scoreboard and reconcile every listed game,
    /// creating records the first time the provider mentions them.
    /// Returns the remote ids seen.
    pub async fn discover_games(
        &self,
        league: League,
        date: NaiveDate,
    ) -> Result<Vec<String>, SyncError> {
        let snapshots = match self.api.fetch_scoreboard(league, date).await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!(%league, %date, error = %e, "scoreboard fetch failed");
                return Ok(Vec::new());
            }
        };

        let now = Utc::now();
        let mut seen = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            if snapshot.remote_id.is_empty() {
                continue;
            }
            reconcile(self.store.as_ref(), league, snapshot, now).await?;
            seen.push(snapshot.remote_id.clone());
        }
        info!(%league, %date, games = seen.len(), "scoreboard discovered");
        Ok(seen)
    }
}
