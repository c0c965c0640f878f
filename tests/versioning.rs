// tests/versioning.rs
//
// Weights registry loading, env resolution and live replacement.

use std::io::Write;
use std::path::Path;

use serial_test::serial;
use tempfile::NamedTempFile;

use god_score_engine::weights::{DEFAULT_WEIGHTS_CONFIG_PATH, ENV_WEIGHTS_CONFIG_PATH};
use god_score_engine::{
    ConfigError, RuntimeConfig, ScoreError, ScoringEngine, StartupProfile, WeightsHandle,
    WeightsRegistry,
};

const CUSTOM: &str = r#"
active = "v3"

[[versions]]
name = "v3"
normalization_divisor = 10.0
base_boost_minimum = 1.0

[versions.components]
team = 0.3
traction = 0.3
market = 0.2
product = 0.1
vision = 0.1
"#;

fn temp_with(content: &str, suffix: &str) -> NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("tempfile");
    f.write_all(content.as_bytes()).expect("write");
    f
}

#[test]
fn shipped_config_matches_builtin_seed() {
    let loaded = WeightsRegistry::load_from_file(Path::new(DEFAULT_WEIGHTS_CONFIG_PATH))
        .expect("config/weights.toml parses");
    assert_eq!(loaded.active_name(), Some("v2"));
    assert_eq!(loaded, WeightsRegistry::seeded());
}

#[test]
#[serial]
fn env_path_takes_precedence() {
    let f = temp_with(CUSTOM, ".toml");
    std::env::set_var(ENV_WEIGHTS_CONFIG_PATH, f.path());
    let loaded = WeightsRegistry::load_default();
    std::env::remove_var(ENV_WEIGHTS_CONFIG_PATH);

    let registry = loaded.expect("custom registry");
    assert_eq!(registry.active_name(), Some("v3"));
    assert_eq!(registry.names(), vec!["v3"]);
}

#[test]
#[serial]
fn missing_env_path_is_an_error() {
    std::env::set_var(ENV_WEIGHTS_CONFIG_PATH, "/definitely/not/here.toml");
    let loaded = WeightsRegistry::load_default();
    std::env::remove_var(ENV_WEIGHTS_CONFIG_PATH);
    assert!(matches!(loaded, Err(ConfigError::Io { .. })));
}

#[test]
fn json_registry_is_accepted() {
    let json = r#"{
        "active": "j1",
        "versions": [{
            "name": "j1",
            "normalization_divisor": 10.5,
            "base_boost_minimum": 1.0
        }]
    }"#;
    let f = temp_with(json, ".json");
    let registry = WeightsRegistry::load_from_file(f.path()).expect("json parses");
    let v = registry.get("j1").expect("j1");
    assert!((v.components.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn malformed_file_reports_parse_error() {
    let f = temp_with("active = [", ".toml");
    let err = WeightsRegistry::load_from_file(f.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn replacing_the_registry_moves_new_evaluations() {
    let f = temp_with(CUSTOM, ".toml");
    let engine = ScoringEngine::in_memory();
    let rt = RuntimeConfig::live();
    let p = StartupProfile::default();

    assert_eq!(engine.evaluate(&rt, "s", &p).unwrap().weights_version, "v2");

    let custom = WeightsRegistry::load_from_file(f.path()).unwrap();
    engine.weights().replace(custom).expect("valid registry");
    assert_eq!(engine.evaluate(&rt, "s", &p).unwrap().weights_version, "v3");
}

#[test]
fn invalid_active_version_is_refused_at_resolve() {
    let bad = CUSTOM.replace("vision = 0.1", "vision = 0.3");
    let f = temp_with(&bad, ".toml");
    let registry = WeightsRegistry::load_from_file(f.path()).expect("parses");

    let handle = WeightsHandle::new(registry);
    let err = handle.resolve(&RuntimeConfig::live()).unwrap_err();
    assert!(matches!(err, ScoreError::Invariant(_)));
}

#[test]
fn out_of_range_lookback_is_rejected_not_panicking() {
    let mut v = god_score_engine::WeightsVersion::seed_v2();
    v.momentum.lookback_days = i64::MAX;
    let registry = WeightsRegistry::new(Some(v.name.clone()), vec![v]).expect("registry");
    let engine = ScoringEngine::new(
        WeightsHandle::new(registry),
        god_score_engine::EngineStores::in_memory(),
    );

    let err = engine
        .evaluate(&RuntimeConfig::live(), "s", &StartupProfile::default())
        .unwrap_err();
    assert!(matches!(err, ScoreError::Invariant(_)));
}
