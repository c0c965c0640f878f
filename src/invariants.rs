//! # Invariant Validator
//! Strict checks return the first violation as an error and never clamp.
//! Lenient checks only produce near-threshold warnings for dashboards.
//!
//! Range checks use `RangeInclusive::contains`, so NaN always fails.

use crate::bootstrap::MAX_BOOTSTRAP;
use crate::elite::{GATE_MIN_EXCELLENCE, GATE_MIN_TOTAL, MAX_ELITE_BOOST, MAX_TIER_MULTIPLIER};
use crate::error::InvariantViolation;
use crate::momentum::MAX_MOMENTUM;
use crate::result::{StageBreakdown, MAX_TOTAL};
use crate::signals::{DIMENSION_NAMES, MAX_BONUS, RELATIVE_THRESHOLD, ZERO_BASELINE_THRESHOLD};
use crate::weights::{WeightsVersion, MAX_LOOKBACK_DAYS};

pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Warn when the weight sum has used this share of its tolerance.
const WEIGHT_SUM_WARN_SHARE: f64 = 0.8;
const TOTAL_WARN_MARGIN: f64 = 1.0;
const FEATURE_WARN_MARGIN: f64 = 0.01;
/// Float slack for cap comparisons of derived values.
const EPS: f64 = 1e-9;

fn param(name: &str, value: f64, rule: &'static str) -> InvariantViolation {
    InvariantViolation::InvalidParameter {
        name: name.to_string(),
        value,
        rule,
    }
}

/// Structural checks on a version, run every time it is resolved.
pub fn validate_weights(v: &WeightsVersion) -> Result<(), InvariantViolation> {
    for (name, w) in v.components.named() {
        if !(0.0..=1.0).contains(&w) {
            return Err(param(name, w, "component weight must be in [0, 1]"));
        }
    }
    let sum = v.components.sum();
    if !((1.0 - WEIGHT_SUM_TOLERANCE)..=(1.0 + WEIGHT_SUM_TOLERANCE)).contains(&sum) {
        return Err(InvariantViolation::WeightSum {
            version: v.name.clone(),
            sum,
            tolerance: WEIGHT_SUM_TOLERANCE,
        });
    }
    if !(v.normalization_divisor.is_finite() && v.normalization_divisor > 0.0) {
        return Err(param(
            "normalization_divisor",
            v.normalization_divisor,
            "must be finite and > 0",
        ));
    }
    if !(0.0..=v.base_boost_cap).contains(&v.base_boost_minimum) {
        return Err(param(
            "base_boost_minimum",
            v.base_boost_minimum,
            "must be in [0, base_boost_cap]",
        ));
    }
    for (name, cap) in DIMENSION_NAMES.iter().zip(v.signals.caps.as_array()) {
        if !(0.0..=MAX_BONUS).contains(&cap) {
            return Err(param(name, cap, "signal cap must be in [0, 10]"));
        }
    }
    let caps_total = v.signals.caps.total();
    if !(0.0..=MAX_BONUS + EPS).contains(&caps_total) {
        return Err(param("signal_caps_total", caps_total, "signal caps must sum to <= 10"));
    }
    if (v.signals.relative_threshold - RELATIVE_THRESHOLD).abs() > EPS {
        return Err(param(
            "signals.relative_threshold",
            v.signals.relative_threshold,
            "must equal 0.5",
        ));
    }
    if (v.signals.zero_baseline_threshold - ZERO_BASELINE_THRESHOLD).abs() > EPS {
        return Err(param(
            "signals.zero_baseline_threshold",
            v.signals.zero_baseline_threshold,
            "must equal 0.2",
        ));
    }
    if !(0.0..=MAX_BOOTSTRAP).contains(&v.bootstrap.max_points) {
        return Err(param("bootstrap.max_points", v.bootstrap.max_points, "must be in [0, 8]"));
    }
    if !(0.0..=MAX_MOMENTUM).contains(&v.momentum.max_points) {
        return Err(param("momentum.max_points", v.momentum.max_points, "must be in [0, 8]"));
    }
    for (name, days) in [
        ("bootstrap.lookback_days", v.bootstrap.lookback_days),
        ("momentum.lookback_days", v.momentum.lookback_days),
    ] {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&days) {
            return Err(param(name, days as f64, "must be in [1, 3650]"));
        }
    }
    if v.elite.min_total < GATE_MIN_TOTAL || v.elite.min_total.is_nan() {
        return Err(param("elite.min_total", v.elite.min_total, "must be >= 60"));
    }
    if v.elite.min_excellence < GATE_MIN_EXCELLENCE || v.elite.min_excellence.is_nan() {
        return Err(param(
            "elite.min_excellence",
            v.elite.min_excellence,
            "must be >= 3",
        ));
    }
    if !(0.0..=MAX_ELITE_BOOST).contains(&v.elite.max_boost) {
        return Err(param("elite.max_boost", v.elite.max_boost, "must be in [0, 15]"));
    }
    for t in &v.elite.tiers {
        if t.min_total < GATE_MIN_TOTAL || t.min_total.is_nan() {
            return Err(param("elite.tier.min_total", t.min_total, "must be >= 60"));
        }
        if !(1.0..=MAX_TIER_MULTIPLIER).contains(&t.multiplier) {
            return Err(param(
                "elite.tier.multiplier",
                t.multiplier,
                "must be in [1, 1.18]",
            ));
        }
    }
    Ok(())
}

pub fn validate_feature(name: &str, value: f64) -> Result<(), InvariantViolation> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InvariantViolation::FeatureOutOfRange {
            name: name.to_string(),
            value,
        })
    }
}

pub fn validate_signal(name: &str, points: f64, cap: f64) -> Result<(), InvariantViolation> {
    if (0.0..=cap + EPS).contains(&points) {
        Ok(())
    } else {
        Err(InvariantViolation::SignalOverCap {
            name: name.to_string(),
            points,
            cap,
        })
    }
}

pub fn validate_stage(stage: &'static str, value: f64, max: f64) -> Result<(), InvariantViolation> {
    if (0.0..=max + EPS).contains(&value) {
        Ok(())
    } else {
        Err(InvariantViolation::StageOutOfRange { stage, value, max })
    }
}

pub fn validate_total(value: f64) -> Result<(), InvariantViolation> {
    if (0.0..=MAX_TOTAL).contains(&value) {
        Ok(())
    } else {
        Err(InvariantViolation::TotalOutOfRange { value })
    }
}

/// Strict pass over a full breakdown.
pub fn validate_breakdown(b: &StageBreakdown, v: &WeightsVersion) -> Result<(), InvariantViolation> {
    for (name, c) in b.components.named() {
        validate_stage(name, c.value, c.max)?;
    }
    validate_stage("base", b.base.total_0_to_100, MAX_TOTAL)?;
    validate_stage("bootstrap", b.bootstrap.points, v.bootstrap.max_points.min(MAX_BOOTSTRAP))?;

    for (name, value) in b.signals.dimensions.named() {
        validate_feature(name, value)?;
    }
    let caps = v.signals.caps.as_array();
    for ((name, points), cap) in DIMENSION_NAMES.iter().zip(b.signals.contributions).zip(caps) {
        validate_signal(name, points, cap)?;
    }
    validate_stage("signals", b.signals.applied_bonus, MAX_BONUS)?;
    validate_stage("momentum", b.momentum.points, MAX_MOMENTUM)?;

    if b.elite.boost < 0.0 {
        return Err(InvariantViolation::NegativeBoost {
            boost: b.elite.boost,
        });
    }
    if b.intermediate < GATE_MIN_TOTAL && b.elite.boost > 0.0 {
        return Err(InvariantViolation::StageOutOfRange {
            stage: "elite",
            value: b.elite.boost,
            max: 0.0,
        });
    }
    validate_stage("elite", b.elite.boost, MAX_ELITE_BOOST)?;
    validate_total(b.total)
}

/// Near-threshold conditions worth a look; never blocks a result.
pub fn lenient_warnings(b: &StageBreakdown, v: &WeightsVersion) -> Vec<String> {
    let mut out = Vec::new();

    let drift = (v.components.sum() - 1.0).abs();
    if drift >= WEIGHT_SUM_TOLERANCE * WEIGHT_SUM_WARN_SHARE {
        out.push(format!(
            "weights `{}` sum drifts by {drift:.5}, close to the {WEIGHT_SUM_TOLERANCE} tolerance",
            v.name
        ));
    }
    if b.total <= TOTAL_WARN_MARGIN || b.total >= MAX_TOTAL - TOTAL_WARN_MARGIN {
        out.push(format!("total {:.2} is within 1 point of a bound", b.total));
    }
    for (name, value) in b.signals.dimensions.named() {
        let near_low = value > 0.0 && value <= FEATURE_WARN_MARGIN;
        let near_high = value < 1.0 && value >= 1.0 - FEATURE_WARN_MARGIN;
        if near_low || near_high {
            out.push(format!("feature `{name}` = {value:.3} is near a bound"));
        }
    }
    if !b.elite.gated && b.elite.boost >= v.elite.max_boost {
        out.push(format!("elite boost hit the {} point cap", v.elite.max_boost));
    }
    out
}
