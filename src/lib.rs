// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod batch;
pub mod bootstrap;
pub mod completeness;
pub mod components;
pub mod composer;
pub mod config;
pub mod elite;
pub mod engine;
pub mod error;
pub mod explain;
pub mod history;
pub mod invariants;
pub mod metrics;
pub mod momentum;
pub mod profile;
pub mod result;
pub mod selector;
pub mod signals;
pub mod store;
pub mod taxonomy;
pub mod versioning;
pub mod weights;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::batch::{run_batch, BatchJob, BatchReport, StatsCollector};
pub use crate::config::RuntimeConfig;
pub use crate::engine::{EngineStores, PersistOutcome, ScoringEngine};
pub use crate::error::{ConfigError, InvariantViolation, ScoreError, StoreError};
pub use crate::profile::StartupProfile;
pub use crate::result::ScoreResult;
pub use crate::selector::{select, Candidate, SelectionResult, SelectionSubject};
pub use crate::versioning::WeightsHandle;
pub use crate::weights::{WeightsRegistry, WeightsVersion};
