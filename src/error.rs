//! Error taxonomy for the scoring pipeline.
//!
//! Four families never get conflated: configuration problems, invariant
//! violations, store I/O, and the kill switch. Missing profile data is not an
//! error anywhere in the crate.

use thiserror::Error;

/// Top-level error returned by every evaluation entry point.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Kill switch engaged; nothing was computed or written.
    #[error("scoring is frozen by the kill switch; no evaluation was performed")]
    Frozen,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ScoreError {
    /// Short machine label, used in batch reports and API bodies.
    pub fn label(&self) -> &'static str {
        match self {
            ScoreError::Frozen => "frozen",
            ScoreError::Config(_) => "config",
            ScoreError::Invariant(_) => "invariant",
            ScoreError::Store(_) => "store",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no active weights version is configured")]
    NoActiveVersion,
    #[error("active weights version `{0}` is not registered")]
    ActiveVersionMissing(String),
    #[error("requested weights version `{requested}` does not exist")]
    VersionNotFound { requested: String },
    #[error("weights version `{name}` is invalid: {reason}")]
    InvalidVersion { name: String, reason: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// A numeric invariant that the strict validator refused to let through.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("weights `{version}` sum to {sum:.4}, expected 1.0 ± {tolerance}")]
    WeightSum {
        version: String,
        sum: f64,
        tolerance: f64,
    },
    #[error("parameter `{name}` = {value} is not allowed: {rule}")]
    InvalidParameter {
        name: String,
        value: f64,
        rule: &'static str,
    },
    #[error("feature `{name}` = {value} is outside [0, 1]")]
    FeatureOutOfRange { name: String, value: f64 },
    #[error("signal `{name}` contributed {points} points, cap is {cap}")]
    SignalOverCap { name: String, points: f64, cap: f64 },
    #[error("stage `{stage}` produced {value}, allowed range is [0, {max}]")]
    StageOutOfRange {
        stage: &'static str,
        value: f64,
        max: f64,
    },
    #[error("final total {value} is outside [0, 100]")]
    TotalOutOfRange { value: f64 },
    #[error("elite multiplier lowered the score ({boost} points)")]
    NegativeBoost { boost: f64 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned: {0}")]
    Poisoned(&'static str),
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}
