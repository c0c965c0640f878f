//! Active-version resolution and the kill switch.
//!
//! Order matters: the frozen check runs before anything else, then the
//! version is resolved (override first) and validated. Writers consult
//! `persist_mode` immediately before every write.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::error::{ConfigError, ScoreError, StoreError};
use crate::invariants;
use crate::weights::{WeightsRegistry, WeightsVersion};

pub const ENV_WEIGHTS_HOT_RELOAD: &str = "WEIGHTS_HOT_RELOAD";

/// Whether a write may happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    Write,
    DryRun,
}

/// Fail fast when the kill switch is engaged.
pub fn ensure_live(runtime: &RuntimeConfig) -> Result<(), ScoreError> {
    if runtime.frozen {
        info!(target: "kill_switch", "evaluation refused: scoring is frozen");
        return Err(ScoreError::Frozen);
    }
    Ok(())
}

/// Gate for a single write. Frozen refuses; dry-run reports `DryRun`.
pub fn persist_mode(runtime: &RuntimeConfig) -> Result<PersistMode, ScoreError> {
    ensure_live(runtime)?;
    Ok(if runtime.dry_run {
        PersistMode::DryRun
    } else {
        PersistMode::Write
    })
}

/// Resolve which version this evaluation uses.
/// An override must name a registered version; it never falls back silently.
pub fn resolve<'a>(
    registry: &'a WeightsRegistry,
    runtime: &RuntimeConfig,
) -> Result<&'a WeightsVersion, ScoreError> {
    ensure_live(runtime)?;

    let version = match runtime.version_override.as_deref() {
        Some(requested) => {
            let v = registry
                .get(requested)
                .ok_or_else(|| ConfigError::VersionNotFound {
                    requested: requested.to_string(),
                })?;
            debug!(version = %requested, "using weights override");
            v
        }
        None => {
            let active = registry.active_name().ok_or(ConfigError::NoActiveVersion)?;
            registry
                .get(active)
                .ok_or_else(|| ConfigError::ActiveVersionMissing(active.to_string()))?
        }
    };

    invariants::validate_weights(version)?;
    Ok(version)
}

/// Shared, swappable registry. Readers clone the resolved version out so the
/// lock is never held across a pipeline run.
#[derive(Debug, Clone)]
pub struct WeightsHandle {
    inner: Arc<RwLock<WeightsRegistry>>,
}

impl WeightsHandle {
    pub fn new(registry: WeightsRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn resolve(&self, runtime: &RuntimeConfig) -> Result<WeightsVersion, ScoreError> {
        ensure_live(runtime)?;
        let guard = self
            .inner
            .read()
            .map_err(|_| StoreError::Poisoned("weights registry"))?;
        resolve(&guard, runtime).cloned()
    }

    pub fn snapshot(&self) -> Result<WeightsRegistry, StoreError> {
        self.inner
            .read()
            .map(|g| g.clone())
            .map_err(|_| StoreError::Poisoned("weights registry"))
    }

    /// Swap in a new registry. Rejected if its active version fails validation,
    /// leaving the current one in place.
    pub fn replace(&self, registry: WeightsRegistry) -> Result<(), ScoreError> {
        resolve(&registry, &RuntimeConfig::live())?;
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError::Poisoned("weights registry"))?;
        *guard = registry;
        Ok(())
    }
}

/// Hot reload is opt-in and only honoured in dev environments.
fn hot_reload_enabled() -> bool {
    if std::env::var(ENV_WEIGHTS_HOT_RELOAD).ok().as_deref() != Some("1") {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Poll `path` every 2s and swap the registry when its mtime moves forward.
pub fn start_hot_reload_thread(handle: WeightsHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = last_mtime.is_some_and(|prev| mtime > prev);
                if last_mtime.is_none() || changed {
                    last_mtime = Some(mtime);
                }
                if changed {
                    match WeightsRegistry::load_from_file(&path)
                        .map_err(ScoreError::from)
                        .and_then(|r| handle.replace(r))
                    {
                        Ok(()) => info!(path = %path.display(), "weights registry reloaded"),
                        Err(e) => warn!(path = %path.display(), "weights reload rejected: {e}"),
                    }
                }
            }
            thread::sleep(poll);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::{ComponentWeights, WeightsVersion};

    #[test]
    fn frozen_wins_over_everything() {
        let reg = WeightsRegistry::seeded();
        let rt = RuntimeConfig::frozen().with_version("does-not-exist");
        assert!(matches!(resolve(&reg, &rt), Err(ScoreError::Frozen)));
        assert!(matches!(persist_mode(&rt), Err(ScoreError::Frozen)));
    }

    #[test]
    fn resolves_active_by_default() {
        let reg = WeightsRegistry::seeded();
        let v = resolve(&reg, &RuntimeConfig::live()).unwrap();
        assert_eq!(v.name, "v2");
    }

    #[test]
    fn override_must_exist() {
        let reg = WeightsRegistry::seeded();
        let v = resolve(&reg, &RuntimeConfig::live().with_version("v1")).unwrap();
        assert_eq!(v.name, "v1");

        let err = resolve(&reg, &RuntimeConfig::live().with_version("v9")).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::Config(ConfigError::VersionNotFound { .. })
        ));
    }

    #[test]
    fn missing_active_is_config_error() {
        let reg = WeightsRegistry::new(None, vec![WeightsVersion::seed_v2()]).unwrap();
        assert!(matches!(
            resolve(&reg, &RuntimeConfig::live()),
            Err(ScoreError::Config(ConfigError::NoActiveVersion))
        ));
        let reg =
            WeightsRegistry::new(Some("v7".into()), vec![WeightsVersion::seed_v2()]).unwrap();
        assert!(matches!(
            resolve(&reg, &RuntimeConfig::live()),
            Err(ScoreError::Config(ConfigError::ActiveVersionMissing(_)))
        ));
    }

    #[test]
    fn drifted_weights_are_rejected_at_resolution() {
        let mut bad = WeightsVersion::seed_v2();
        bad.name = "bad".into();
        bad.components = ComponentWeights {
            team: 0.3,
            ..ComponentWeights::uniform()
        };
        let reg = WeightsRegistry::new(Some("bad".into()), vec![bad]).unwrap();
        assert!(matches!(
            resolve(&reg, &RuntimeConfig::live()),
            Err(ScoreError::Invariant(_))
        ));
    }

    #[test]
    fn handle_refuses_invalid_replacement() {
        let handle = WeightsHandle::new(WeightsRegistry::seeded());
        let mut bad = WeightsVersion::seed_v2();
        bad.normalization_divisor = -1.0;
        let reg = WeightsRegistry::new(Some("v2".into()), vec![bad]).unwrap();
        assert!(handle.replace(reg).is_err());
        let v = handle.resolve(&RuntimeConfig::live()).unwrap();
        assert_eq!(v.normalization_divisor, 10.5);
    }

    #[test]
    fn dry_run_mode() {
        assert_eq!(
            persist_mode(&RuntimeConfig::dry_run()).unwrap(),
            PersistMode::DryRun
        );
        assert_eq!(
            persist_mode(&RuntimeConfig::live()).unwrap(),
            PersistMode::Write
        );
    }
}
