//! Operator runtime flags: kill switch, dry-run and version override.

use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_FROZEN: &str = "SCORING_FROZEN";
pub const ENV_DRY_RUN: &str = "SCORING_DRY_RUN";
pub const ENV_VERSION_OVERRIDE: &str = "SCORING_WEIGHTS_VERSION";

/// Operator controls, built once at process start and passed by reference into
/// every evaluation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Kill switch: every entry point fails before computing anything.
    #[serde(default)]
    pub frozen: bool,
    /// Compute, but log instead of writing.
    #[serde(default)]
    pub dry_run: bool,
    /// Pin a registered weights version instead of the active one.
    #[serde(default)]
    pub version_override: Option<String>,
}

impl RuntimeConfig {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn frozen() -> Self {
        Self {
            frozen: true,
            ..Self::default()
        }
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn with_version(mut self, name: impl Into<String>) -> Self {
        self.version_override = Some(name.into());
        self
    }

    /// Read from process env (after `.env`, if present).
    /// Unparseable flags are treated as `false`; an empty override as none.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            frozen: parse_flag(env::var(ENV_FROZEN).ok()),
            dry_run: parse_flag(env::var(ENV_DRY_RUN).ok()),
            version_override: env::var(ENV_VERSION_OVERRIDE)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

fn parse_flag(raw: Option<String>) -> bool {
    matches!(
        raw.unwrap_or_default().trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
