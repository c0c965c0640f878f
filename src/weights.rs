//! Versioned scoring weights.
//!
//! A `WeightsVersion` is an immutable bundle of every knob the pipeline reads.
//! Versions are kept side by side in a `WeightsRegistry` so a rollback is a
//! change of the active name, never an edit of numbers in place.
//!
//! File shape (TOML; JSON mirrors it):
//! ```toml
//! active = "v2"
//!
//! [[versions]]
//! name = "v2"
//! normalization_divisor = 10.5
//! base_boost_minimum = 1.0
//! [versions.components]
//! team = 0.2
//! traction = 0.2
//! market = 0.2
//! product = 0.2
//! vision = 0.2
//! ```
//! Omitted sections fall back to the seeded defaults.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use crate::error::ConfigError;

pub const ENV_WEIGHTS_CONFIG_PATH: &str = "WEIGHTS_CONFIG_PATH";
pub const DEFAULT_WEIGHTS_CONFIG_PATH: &str = "config/weights.toml";
/// Longest history/social lookback a version may ask for.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Relative emphasis of each component; must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub team: f64,
    pub traction: f64,
    pub market: f64,
    pub product: f64,
    pub vision: f64,
}

impl ComponentWeights {
    pub const COUNT: usize = 5;

    pub fn uniform() -> Self {
        Self {
            team: 0.2,
            traction: 0.2,
            market: 0.2,
            product: 0.2,
            vision: 0.2,
        }
    }

    pub fn sum(&self) -> f64 {
        self.team + self.traction + self.market + self.product + self.vision
    }

    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("team", self.team),
            ("traction", self.traction),
            ("market", self.market),
            ("product", self.product),
            ("vision", self.vision),
        ]
    }
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Point caps for the five market-psychology dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalCaps {
    pub investor_fomo: f64,
    pub insider_conviction: f64,
    pub round_urgency: f64,
    pub press_velocity: f64,
    pub hiring_velocity: f64,
}

impl SignalCaps {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.investor_fomo,
            self.insider_conviction,
            self.round_urgency,
            self.press_velocity,
            self.hiring_velocity,
        ]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

impl Default for SignalCaps {
    fn default() -> Self {
        Self {
            investor_fomo: 3.0,
            insider_conviction: 2.5,
            round_urgency: 1.5,
            press_velocity: 1.5,
            hiring_velocity: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub caps: SignalCaps,
    /// Relative change that counts as significant when the stored value is > 0.
    pub relative_threshold: f64,
    /// Absolute value that counts as significant when the stored value is 0.
    pub zero_baseline_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            caps: SignalCaps::default(),
            relative_threshold: 0.5,
            zero_baseline_threshold: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub social_proof_cap: f64,
    pub founder_velocity_cap: f64,
    pub founder_reputation_cap: f64,
    pub sparse_multiplier: f64,
    pub standard_multiplier: f64,
    pub max_points: f64,
    /// Only signals observed within this many days count.
    pub lookback_days: i64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            social_proof_cap: 4.0,
            founder_velocity_cap: 3.0,
            founder_reputation_cap: 3.0,
            sparse_multiplier: 1.0,
            standard_multiplier: 0.5,
            max_points: 8.0,
            lookback_days: 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub revenue_cap: f64,
    pub customer_cap: f64,
    pub product_cap: f64,
    pub team_cap: f64,
    pub effort_cap: f64,
    pub trajectory_bonus: f64,
    pub max_points: f64,
    pub lookback_days: i64,
    /// Minimum verified increase (points) across the lookback window.
    pub min_increase: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            revenue_cap: 2.0,
            customer_cap: 1.5,
            product_cap: 1.5,
            team_cap: 1.5,
            effort_cap: 1.0,
            trajectory_bonus: 2.0,
            max_points: 8.0,
            lookback_days: 30,
            min_increase: 5.0,
        }
    }
}

/// Band floor → maximum multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EliteTier {
    pub min_total: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EliteConfig {
    pub min_total: f64,
    pub min_excellence: f64,
    pub max_boost: f64,
    /// Sorted ascending by `min_total`.
    pub tiers: Vec<EliteTier>,
}

impl EliteConfig {
    /// Multiplier of the highest tier whose floor is ≤ `total`.
    pub fn tier_for(&self, total: f64) -> Option<EliteTier> {
        self.tiers
            .iter()
            .copied()
            .filter(|t| total >= t.min_total)
            .max_by(|a, b| a.min_total.total_cmp(&b.min_total))
    }
}

impl Default for EliteConfig {
    fn default() -> Self {
        Self {
            min_total: 60.0,
            min_excellence: 3.0,
            max_boost: 15.0,
            tiers: vec![
                EliteTier {
                    min_total: 60.0,
                    multiplier: 1.05,
                },
                EliteTier {
                    min_total: 70.0,
                    multiplier: 1.10,
                },
                EliteTier {
                    min_total: 80.0,
                    multiplier: 1.14,
                },
                EliteTier {
                    min_total: 90.0,
                    multiplier: 1.18,
                },
            ],
        }
    }
}

/// Immutable, named configuration bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsVersion {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub components: ComponentWeights,
    pub normalization_divisor: f64,
    pub base_boost_minimum: f64,
    #[serde(default = "default_boost_cap")]
    pub base_boost_cap: f64,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub momentum: MomentumConfig,
    #[serde(default)]
    pub elite: EliteConfig,
}

fn default_boost_cap() -> f64 {
    2.0
}

impl WeightsVersion {
    /// Current production calibration.
    pub fn seed_v2() -> Self {
        Self {
            name: "v2".to_string(),
            description: Some("uniform components, divisor 10.5, boost floor 1.0".to_string()),
            components: ComponentWeights::uniform(),
            normalization_divisor: 10.5,
            base_boost_minimum: 1.0,
            base_boost_cap: default_boost_cap(),
            signals: SignalConfig::default(),
            bootstrap: BootstrapConfig::default(),
            momentum: MomentumConfig::default(),
            elite: EliteConfig::default(),
        }
    }

    /// Previous calibration, retained for audit and rollback.
    pub fn seed_v1() -> Self {
        Self {
            name: "v1".to_string(),
            description: Some("traction-heavy, divisor 12.0, boost floor 0.5".to_string()),
            components: ComponentWeights {
                team: 0.2,
                traction: 0.3,
                market: 0.2,
                product: 0.15,
                vision: 0.15,
            },
            normalization_divisor: 12.0,
            base_boost_minimum: 0.5,
            ..Self::seed_v2()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RegistryFile {
    active: Option<String>,
    #[serde(default)]
    versions: Vec<WeightsVersion>,
}

/// All known versions plus the name of the active one.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightsRegistry {
    active: Option<String>,
    versions: BTreeMap<String, WeightsVersion>,
}

impl WeightsRegistry {
    pub fn new(active: Option<String>, versions: Vec<WeightsVersion>) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for v in versions {
            let name = v.name.clone();
            if map.insert(name.clone(), v).is_some() {
                return Err(ConfigError::InvalidVersion {
                    name,
                    reason: "duplicate version name".to_string(),
                });
            }
        }
        Ok(Self {
            active,
            versions: map,
        })
    }

    /// Built-in registry: v1 (historical) and v2 (active).
    pub fn seeded() -> Self {
        let mut versions = BTreeMap::new();
        for v in [WeightsVersion::seed_v1(), WeightsVersion::seed_v2()] {
            versions.insert(v.name.clone(), v);
        }
        Self {
            active: Some("v2".to_string()),
            versions,
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&WeightsVersion> {
        self.versions.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.versions.keys().map(String::as_str).collect()
    }

    /// Load from an explicit path. Supports TOML or JSON by extension.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let origin = path.display().to_string();
        let file: RegistryFile = if ext == "json" {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: origin,
                reason: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: origin,
                reason: e.to_string(),
            })?
        };
        Self::new(file.active, file.versions)
    }

    /// Load using env var + fallbacks:
    /// 1) $WEIGHTS_CONFIG_PATH (must exist)
    /// 2) config/weights.toml
    /// 3) built-in seed
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = std::env::var(ENV_WEIGHTS_CONFIG_PATH) {
            return Self::load_from_file(&PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_WEIGHTS_CONFIG_PATH);
        if default.exists() {
            return Self::load_from_file(&default);
        }
        Ok(Self::seeded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn seeded_versions_sum_to_one() {
        let r = WeightsRegistry::seeded();
        for name in r.names() {
            let v = r.get(name).unwrap();
            assert!((v.components.sum() - 1.0).abs() <= 0.001, "{name}");
        }
        assert_eq!(r.active_name(), Some("v2"));
    }

    #[test]
    fn signal_caps_total_ten() {
        assert!((SignalCaps::default().total() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn tier_lookup_picks_highest_floor() {
        let e = EliteConfig::default();
        assert_eq!(e.tier_for(59.9), None);
        assert_eq!(e.tier_for(60.0).map(|t| t.multiplier), Some(1.05));
        assert_eq!(e.tier_for(72.0).map(|t| t.multiplier), Some(1.10));
        assert_eq!(e.tier_for(95.0).map(|t| t.multiplier), Some(1.18));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = WeightsRegistry::new(
            Some("v2".into()),
            vec![WeightsVersion::seed_v2(), WeightsVersion::seed_v2()],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVersion { .. }));
    }

    #[test]
    fn loads_minimal_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.toml");
        let mut f = fs::File::create(&path).unwrap();
        write!(
            f,
            r#"
active = "v3"

[[versions]]
name = "v3"
normalization_divisor = 11.0
base_boost_minimum = 0.8

[versions.components]
team = 0.3
traction = 0.25
market = 0.15
product = 0.15
vision = 0.15
"#
        )
        .unwrap();
        let r = WeightsRegistry::load_from_file(&path).unwrap();
        let v = r.get("v3").unwrap();
        assert_eq!(r.active_name(), Some("v3"));
        assert!((v.normalization_divisor - 11.0).abs() < 1e-9);
        assert_eq!(v.elite, EliteConfig::default());
        assert_eq!(v.base_boost_cap, 2.0);
    }

    #[test]
    fn loads_json_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let body = serde_json::json!({
            "active": "v2",
            "versions": [WeightsVersion::seed_v2()]
        });
        fs::write(&path, body.to_string()).unwrap();
        let r = WeightsRegistry::load_from_file(&path).unwrap();
        assert_eq!(r.get("v2"), Some(&WeightsVersion::seed_v2()));
    }
}
