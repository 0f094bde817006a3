//! Scheduled-job instantiations of the engine: historical box-score
//! backfill and the nightly roster/aggregate refresh. Both entry
//! points are idempotent and safe to re-run; a cron-like trigger calls
//! them roughly once per run.

pub mod backfill;
pub mod nightly;

pub use backfill::{BackfillJob, BackfillReport};
pub use nightly::{NightlyJob, NightlyReport};
