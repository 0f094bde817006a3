//! courtside — live game synchronization for a basketball stats
//! service.
//!
//! One polling and reconciliation engine, instantiated three ways:
//! live score sync, historical box-score backfill, and nightly
//! roster/aggregate refresh. The provider client lives in the
//! `hoops-api` crate; persistence goes through the [`store::Store`]
//! trait.

pub mod clock;
pub mod config;
pub mod engine;
pub mod jobs;
pub mod pacer;
pub mod store;

pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncOutcome};
