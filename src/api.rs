//! HTTP surface: scoring, batch, matches and debug views over one engine.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::batch::{self, BatchJob, BatchReport, StatsCollector};
use crate::config::RuntimeConfig;
use crate::engine::{PersistOutcome, ScoringEngine};
use crate::error::ScoreError;
use crate::history::AuditEntry;
use crate::profile::StartupProfile;
use crate::result::ScoreResult;
use crate::selector::{self, Candidate, SelectionResult, SelectionSubject};
use crate::versioning;
use crate::weights::WeightsVersion;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoringEngine>,
    pub runtime: Arc<RuntimeConfig>,
}

impl AppState {
    pub fn new(engine: ScoringEngine, runtime: RuntimeConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            runtime: Arc::new(runtime),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/score", post(score))
        .route("/score/batch", post(score_batch))
        .route("/matches", post(matches))
        .route("/debug/weights", get(debug_weights))
        .route("/debug/audit", get(debug_audit))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Router over an in-memory engine and runtime flags from the environment.
pub fn router() -> Router {
    create_router(AppState::new(
        ScoringEngine::in_memory(),
        RuntimeConfig::from_env(),
    ))
}

#[derive(Debug)]
pub enum ApiError {
    Score(ScoreError),
    BadRequest(String),
    Internal(String),
}

impl From<ScoreError> for ApiError {
    fn from(e: ScoreError) -> Self {
        ApiError::Score(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Score(e) => {
                let status = match &e {
                    ScoreError::Frozen => StatusCode::SERVICE_UNAVAILABLE,
                    ScoreError::Config(_) | ScoreError::Store(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    ScoreError::Invariant(_) => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, e.label(), e.to_string())
            }
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", m),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

fn require_subject(id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::BadRequest("subject_id must not be empty".into()));
    }
    Ok(())
}

#[derive(Deserialize)]
struct ScoreReq {
    subject_id: String,
    #[serde(default)]
    profile: StartupProfile,
    /// Append to history and audit when the total changed.
    #[serde(default)]
    persist: bool,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Serialize)]
struct ScoreResp {
    result: ScoreResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    persisted: Option<PersistOutcome>,
}

async fn score(
    State(state): State<AppState>,
    Json(body): Json<ScoreReq>,
) -> Result<Json<ScoreResp>, ApiError> {
    versioning::ensure_live(&state.runtime)?;
    require_subject(&body.subject_id)?;

    let resp = if body.persist {
        let reason = body.reason.as_deref().unwrap_or("api recalculation");
        let (result, outcome) =
            state
                .engine
                .recalculate(&state.runtime, &body.subject_id, &body.profile, reason)?;
        ScoreResp {
            result,
            persisted: Some(outcome),
        }
    } else {
        ScoreResp {
            result: state
                .engine
                .evaluate(&state.runtime, &body.subject_id, &body.profile)?,
            persisted: None,
        }
    };
    Ok(Json(resp))
}

#[derive(Deserialize)]
struct BatchReq {
    jobs: Vec<BatchJob>,
    #[serde(default)]
    persist: bool,
}

async fn score_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchReq>,
) -> Result<Json<BatchReport>, ApiError> {
    versioning::ensure_live(&state.runtime)?;
    if let Some(job) = body.jobs.iter().find(|j| j.subject_id.trim().is_empty()) {
        return Err(ApiError::BadRequest(format!(
            "job with empty subject_id (profile name {:?})",
            job.profile.name
        )));
    }

    let report = tokio::task::spawn_blocking(move || {
        let mut stats = StatsCollector::new();
        let reason = body.persist.then_some("batch recalculation");
        batch::run_batch(&state.engine, &state.runtime, &body.jobs, reason, &mut stats)
    })
    .await
    .map_err(|e| {
        warn!("batch worker panicked: {e}");
        ApiError::Internal("batch worker failed".into())
    })??;
    Ok(Json(report))
}

#[derive(Deserialize)]
struct MatchesReq {
    subject_id: String,
    #[serde(default)]
    profile: StartupProfile,
    /// Use this total instead of evaluating the profile.
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    pool: Vec<Candidate>,
}

async fn matches(
    State(state): State<AppState>,
    Json(body): Json<MatchesReq>,
) -> Result<Json<SelectionResult>, ApiError> {
    versioning::ensure_live(&state.runtime)?;
    require_subject(&body.subject_id)?;
    if let Some(c) = body.pool.iter().find(|c| !selector::valid_fit(c.fit_score)) {
        return Err(ApiError::BadRequest(format!(
            "candidate {:?} has fit_score {} outside [0, 100]",
            c.counterparty_id, c.fit_score
        )));
    }

    let subject = match body.score {
        Some(score) if (0.0..=100.0).contains(&score) => SelectionSubject {
            subject_id: body.subject_id.clone(),
            stage: body.profile.stage,
            sectors: body.profile.sectors.clone(),
            score,
        },
        Some(score) => {
            return Err(ApiError::BadRequest(format!(
                "score {score} is outside [0, 100]"
            )))
        }
        None => {
            let result = state
                .engine
                .evaluate(&state.runtime, &body.subject_id, &body.profile)?;
            SelectionSubject::from_result(&body.profile, &result)
        }
    };
    Ok(Json(selector::select(&subject, &body.pool, Utc::now())))
}

#[derive(Serialize)]
struct WeightsView {
    active: Option<String>,
    versions: Vec<WeightsVersion>,
    runtime: RuntimeConfig,
}

async fn debug_weights(State(state): State<AppState>) -> Result<Json<WeightsView>, ApiError> {
    let registry = state
        .engine
        .weights()
        .snapshot()
        .map_err(ScoreError::from)?;
    let versions = registry
        .names()
        .into_iter()
        .filter_map(|n| registry.get(n).cloned())
        .collect();
    Ok(Json(WeightsView {
        active: registry.active_name().map(str::to_string),
        versions,
        runtime: (*state.runtime).clone(),
    }))
}

#[derive(Deserialize)]
struct AuditQuery {
    n: Option<usize>,
}

async fn debug_audit(
    State(state): State<AppState>,
    Query(q): Query<AuditQuery>,
) -> Json<Vec<AuditEntry>> {
    Json(state.engine.audit().snapshot_last_n(q.n.unwrap_or(20).min(500)))
}
