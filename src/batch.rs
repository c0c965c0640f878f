//! Batch recalculation.
//!
//! Subjects are scored in parallel on the rayon pool; each one is an isolated
//! unit, so a failure is recorded in its outcome and the batch carries on.
//! Distribution statistics go into a caller-owned `StatsCollector` scoped to
//! the run.

use metrics::gauge;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RuntimeConfig;
use crate::engine::{PersistOutcome, ScoringEngine};
use crate::error::ScoreError;
use crate::profile::StartupProfile;
use crate::result::ScoreResult;
use crate::versioning;

const BUCKETS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub subject_id: String,
    #[serde(default)]
    pub profile: StartupProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectOutcome {
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<PersistOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BatchFailure>,
}

/// Run-scoped distribution of totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsCollector {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    histogram: [usize; BUCKETS],
    failures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub failures: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Ten-point buckets: [0,10), [10,20), … [90,100].
    pub histogram: [usize; BUCKETS],
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, total: f64) {
        self.count += 1;
        self.sum += total;
        self.min = Some(self.min.map_or(total, |m| m.min(total)));
        self.max = Some(self.max.map_or(total, |m| m.max(total)));
        let bucket = ((total / 10.0).floor().max(0.0) as usize).min(BUCKETS - 1);
        self.histogram[bucket] += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn summary(&self) -> DistributionSummary {
        DistributionSummary {
            count: self.count,
            failures: self.failures,
            mean: self.mean(),
            min: self.min,
            max: self.max,
            histogram: self.histogram,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<SubjectOutcome>,
    /// Lenient-validator notes, prefixed with the subject id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub summary: DistributionSummary,
}

fn run_one(
    engine: &ScoringEngine,
    runtime: &RuntimeConfig,
    job: &BatchJob,
    persist_reason: Option<&str>,
) -> Result<(ScoreResult, Option<PersistOutcome>), ScoreError> {
    match persist_reason {
        Some(reason) => engine
            .recalculate(runtime, &job.subject_id, &job.profile, reason)
            .map(|(r, p)| (r, Some(p))),
        None => engine
            .evaluate(runtime, &job.subject_id, &job.profile)
            .map(|r| (r, None)),
    }
}

/// Score every job. Fails as a whole only when the kill switch is engaged.
/// With `persist_reason` set, each result is also persisted.
pub fn run_batch(
    engine: &ScoringEngine,
    runtime: &RuntimeConfig,
    jobs: &[BatchJob],
    persist_reason: Option<&str>,
    stats: &mut StatsCollector,
) -> Result<BatchReport, ScoreError> {
    versioning::ensure_live(runtime)?;

    let outcomes: Vec<SubjectOutcome> = jobs
        .par_iter()
        .map(|job| match run_one(engine, runtime, job, persist_reason) {
            Ok((result, persisted)) => SubjectOutcome {
                subject_id: job.subject_id.clone(),
                result: Some(result),
                persisted,
                error: None,
            },
            Err(e) => SubjectOutcome {
                subject_id: job.subject_id.clone(),
                result: None,
                persisted: None,
                error: Some(BatchFailure {
                    kind: e.label().to_string(),
                    message: e.to_string(),
                }),
            },
        })
        .collect();

    let mut warnings = Vec::new();
    for o in &outcomes {
        match &o.result {
            Some(r) => {
                stats.record(r.total);
                warnings.extend(r.warnings.iter().map(|w| format!("{}: {w}", o.subject_id)));
            }
            None => stats.record_failure(),
        }
    }

    let summary = stats.summary();
    if let Some(mean) = summary.mean {
        gauge!("god_score_last_batch_mean").set(mean);
    }
    info!(
        count = summary.count,
        failures = summary.failures,
        mean = ?summary.mean,
        "batch finished"
    );

    Ok(BatchReport {
        outcomes,
        warnings,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_buckets_and_bounds() {
        let mut s = StatsCollector::new();
        for t in [0.0, 9.99, 10.0, 55.0, 100.0] {
            s.record(t);
        }
        s.record_failure();
        let sum = s.summary();
        assert_eq!(sum.count, 5);
        assert_eq!(sum.failures, 1);
        assert_eq!(sum.histogram[0], 2);
        assert_eq!(sum.histogram[1], 1);
        assert_eq!(sum.histogram[5], 1);
        assert_eq!(sum.histogram[9], 1);
        assert_eq!(sum.min, Some(0.0));
        assert_eq!(sum.max, Some(100.0));
    }

    #[test]
    fn empty_collector_has_no_mean() {
        assert_eq!(StatsCollector::new().mean(), None);
    }
}
