//! # Scoring Engine
//! Orchestrates the layered pipeline for one subject and owns the only write
//! paths: signal state, score history and the audit log.
//!
//! Order per evaluation: kill switch → version → components → base →
//! bootstrap (unless rich) → signals → momentum → elite → strict validation →
//! signal-state write. The per-subject lock spans the signal read, the
//! validation and the write, so concurrent evaluations of one subject
//! serialize while different subjects run in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bootstrap;
use crate::completeness::{data_completeness, DataTier};
use crate::components::score_components;
use crate::composer;
use crate::config::RuntimeConfig;
use crate::elite;
use crate::error::{ScoreError, StoreError};
use crate::explain;
use crate::history::{AuditEntry, AuditLog};
use crate::invariants;
use crate::momentum;
use crate::profile::{HistorySource, ScoreHistoryRecord, StartupProfile};
use crate::result::{ScoreResult, StageBreakdown};
use crate::signals;
use crate::store::{
    InMemoryHistoryStore, InMemorySignalStore, InMemorySocialSource, ScoreHistoryStore,
    SignalStore, SocialSignalSource,
};
use crate::taxonomy::Taxonomy;
use crate::versioning::{self, PersistMode, WeightsHandle};
use crate::weights::WeightsRegistry;

/// Totals closer than this are treated as unchanged.
const SCORE_EPS: f64 = 1e-9;

/// Short, stable, non-reversible id for logs.
pub(crate) fn anon_id(subject_id: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(subject_id.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Clone)]
pub struct EngineStores {
    pub signals: Arc<dyn SignalStore>,
    pub history: Arc<dyn ScoreHistoryStore>,
    pub social: Arc<dyn SocialSignalSource>,
}

impl EngineStores {
    pub fn in_memory() -> Self {
        Self {
            signals: Arc::new(InMemorySignalStore::new()),
            history: Arc::new(InMemoryHistoryStore::new()),
            social: Arc::new(InMemorySocialSource::default()),
        }
    }
}

/// What `persist` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistOutcome {
    Written,
    DryRun,
    Unchanged,
}

type SubjectLocks = Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// Handle on one subject's lock. Dropping the last handle removes the map
/// entry, so the map only holds subjects with an evaluation in flight.
struct SubjectLease<'a> {
    locks: &'a SubjectLocks,
    subject_id: String,
    lock: Arc<Mutex<()>>,
}

impl Drop for SubjectLease<'_> {
    fn drop(&mut self) {
        // Handles are only cloned under the map lock, so a count of 2
        // (map + this lease) means nobody else is waiting.
        if let Ok(mut locks) = self.locks.lock() {
            if Arc::strong_count(&self.lock) == 2 {
                locks.remove(&self.subject_id);
            }
        }
    }
}

pub struct ScoringEngine {
    weights: WeightsHandle,
    taxonomy: Option<Arc<Taxonomy>>,
    stores: EngineStores,
    audit: AuditLog,
    subject_locks: SubjectLocks,
}

impl ScoringEngine {
    pub fn new(weights: WeightsHandle, stores: EngineStores) -> Self {
        Self {
            weights,
            taxonomy: None,
            stores,
            audit: AuditLog::default(),
            subject_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Seeded weights, built-in taxonomy, in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            WeightsHandle::new(WeightsRegistry::seeded()),
            EngineStores::in_memory(),
        )
    }

    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = Some(Arc::new(taxonomy));
        self
    }

    pub fn with_audit_capacity(mut self, cap: usize) -> Self {
        self.audit = AuditLog::with_capacity(cap);
        self
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        self.taxonomy.as_deref().unwrap_or(Taxonomy::builtin())
    }

    pub fn weights(&self) -> &WeightsHandle {
        &self.weights
    }

    pub fn stores(&self) -> &EngineStores {
        &self.stores
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    fn subject_lock(&self, subject_id: &str) -> Result<SubjectLease<'_>, StoreError> {
        let mut locks = self
            .subject_locks
            .lock()
            .map_err(|_| StoreError::Poisoned("subject locks"))?;
        let lock = locks
            .entry(subject_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Ok(SubjectLease {
            locks: &self.subject_locks,
            subject_id: subject_id.to_string(),
            lock,
        })
    }

    pub fn evaluate(
        &self,
        runtime: &RuntimeConfig,
        subject_id: &str,
        profile: &StartupProfile,
    ) -> Result<ScoreResult, ScoreError> {
        self.evaluate_at(runtime, subject_id, profile, Utc::now())
    }

    /// Full pipeline at a fixed clock.
    pub fn evaluate_at(
        &self,
        runtime: &RuntimeConfig,
        subject_id: &str,
        profile: &StartupProfile,
        now: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoreError> {
        versioning::ensure_live(runtime)?;
        let outcome = self.run_pipeline(runtime, subject_id, profile, now);
        match &outcome {
            Ok(r) => {
                counter!("god_score_evaluations_total").increment(1);
                debug!(subject = %anon_id(subject_id), total = r.total, version = %r.weights_version, "evaluated");
            }
            Err(e) => {
                counter!("god_score_failures_total", "kind" => e.label()).increment(1);
                warn!(subject = %anon_id(subject_id), kind = e.label(), "evaluation failed: {e}");
            }
        }
        outcome
    }

    fn run_pipeline(
        &self,
        runtime: &RuntimeConfig,
        subject_id: &str,
        profile: &StartupProfile,
        now: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoreError> {
        let version = self.weights.resolve(runtime)?;
        let taxonomy = self.taxonomy();

        let components = score_components(profile, taxonomy);
        let base = composer::compose(&components, &profile.text, &version);
        let completeness = data_completeness(profile);

        let social = if completeness.tier == DataTier::Rich {
            Vec::new()
        } else {
            self.stores.social.records_for(subject_id)?
        };
        let boot = bootstrap::compensate(subject_id, &completeness, &social, &version.bootstrap, now);

        let history = self.stores.history.records(subject_id)?;
        let mom = momentum::momentum(profile, &completeness, &history, &version.momentum, now);
        let excellence = elite::excellence(profile, &components, &completeness, taxonomy);

        let lease = self.subject_lock(subject_id)?;
        let guard = lease
            .lock
            .lock()
            .map_err(|_| StoreError::Poisoned("subject lock"))?;

        let stored = self.stores.signals.load(subject_id)?;
        let sig = signals::apply_signals(&profile.round, stored.as_ref(), &version.signals);

        let mut breakdown = StageBreakdown::assemble(
            completeness,
            components,
            base,
            boot,
            sig,
            mom,
            |intermediate| elite::elite_multiplier(intermediate, excellence, &version.elite),
        );
        invariants::validate_breakdown(&breakdown, &version)?;
        let warnings = invariants::lenient_warnings(&breakdown, &version);

        if let Some(next) = breakdown.signals.next_state(now) {
            match versioning::persist_mode(runtime)? {
                PersistMode::Write => {
                    self.stores.signals.save(subject_id, &next)?;
                    breakdown.signals.persisted = true;
                    counter!("god_score_signal_updates_total").increment(1);
                }
                PersistMode::DryRun => {
                    info!(
                        target: "persist",
                        subject = %anon_id(subject_id),
                        bonus = next.bonus,
                        "dry-run: would write signal state"
                    );
                }
            }
        }
        drop(guard);
        drop(lease);

        let explanation = explain::build(&breakdown, &version.name);
        let signal_tags = explain::signal_tags(profile, &breakdown, taxonomy);

        Ok(ScoreResult {
            subject_id: subject_id.to_string(),
            total: breakdown.total,
            breakdown,
            weights_version: version.name,
            signal_tags,
            explanation,
            warnings,
            computed_at: now,
        })
    }

    /// Latest persisted total for the subject, from the history.
    pub fn previous_score(&self, subject_id: &str) -> Result<Option<f64>, ScoreError> {
        let records = self.stores.history.records(subject_id)?;
        Ok(records
            .iter()
            .max_by_key(|r| r.recorded_at)
            .map(|r| r.new_score))
    }

    /// Record a score change: a recalculation history entry plus an audit entry.
    /// Unchanged totals write nothing; dry-run only logs.
    pub fn persist(
        &self,
        runtime: &RuntimeConfig,
        result: &ScoreResult,
        previous: Option<f64>,
        reason: &str,
    ) -> Result<PersistOutcome, ScoreError> {
        let mode = versioning::persist_mode(runtime)?;
        if previous.is_some_and(|p| (p - result.total).abs() < SCORE_EPS) {
            return Ok(PersistOutcome::Unchanged);
        }

        let subject = anon_id(&result.subject_id);
        if mode == PersistMode::DryRun {
            info!(
                target: "persist",
                subject = %subject,
                old = ?previous,
                new = result.total,
                version = %result.weights_version,
                reason,
                "dry-run: would append score history and audit entry"
            );
            return Ok(PersistOutcome::DryRun);
        }

        self.stores.history.append(ScoreHistoryRecord {
            subject_id: result.subject_id.clone(),
            old_score: previous.unwrap_or(result.total),
            new_score: result.total,
            recorded_at: result.computed_at,
            source: HistorySource::Recalculation,
        })?;
        self.audit.push(AuditEntry {
            subject_id: result.subject_id.clone(),
            old_score: previous,
            new_score: result.total,
            weights_version: result.weights_version.clone(),
            reason: reason.to_string(),
            recorded_at: result.computed_at,
        })?;
        info!(subject = %subject, old = ?previous, new = result.total, reason, "score persisted");
        Ok(PersistOutcome::Written)
    }

    /// Evaluate, then persist against the latest history entry.
    pub fn recalculate(
        &self,
        runtime: &RuntimeConfig,
        subject_id: &str,
        profile: &StartupProfile,
        reason: &str,
    ) -> Result<(ScoreResult, PersistOutcome), ScoreError> {
        let result = self.evaluate(runtime, subject_id, profile)?;
        let previous = self.previous_score(subject_id)?;
        let outcome = self.persist(runtime, &result, previous, reason)?;
        Ok((result, outcome))
    }
}
