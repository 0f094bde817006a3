//! The polling and reconciliation engine: decide when to fetch, fetch
//! and normalize, merge into storage, and compute the next poll
//! cadence. One generic engine serves all three leagues.

pub mod policy;
pub mod reconcile;
pub mod sync;
pub mod throttle;

pub use reconcile::{reconcile, ReconcileResult};
pub use sync::{SyncEngine, SyncError, SyncOutcome};
