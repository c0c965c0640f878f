//! # Base Composer
//! Weighted component sum plus a floored narrative boost, normalized to 0–10
//! by the version's divisor and reported on the 0–100 scale.
//!
//! Component weights express emphasis around an even split: each score is
//! multiplied by `weight × N`, so uniform weights reduce to the plain sum.

use serde::{Deserialize, Serialize};

use crate::components::ComponentScores;
use crate::profile::PitchText;
use crate::weights::{ComponentWeights, WeightsVersion};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseComposition {
    /// Narrative heuristics before the floor.
    pub narrative_raw: f64,
    /// `max(min(narrative_raw, cap), base_boost_minimum)`.
    pub boost_term: f64,
    pub weighted_components: f64,
    pub raw_total: f64,
    pub total_0_to_10: f64,
    /// The GOD score before additive layers.
    pub total_0_to_100: f64,
}

/// Story-clarity heuristics over the free text. Uncapped; the composer caps it.
pub fn narrative_points(text: &PitchText) -> f64 {
    let mut pts = 0.0;
    if let Some(tagline) = text.tagline.as_deref().map(str::trim) {
        let words = tagline.split_whitespace().count();
        if (1..=12).contains(&words) {
            pts += 0.25;
        }
    }
    match text.pitch.as_deref().map(|p| p.trim().chars().count()) {
        Some(n) if n >= 200 => pts += 0.5,
        Some(n) if n >= 80 => pts += 0.25,
        _ => {}
    }
    if text.problem.as_deref().is_some_and(|s| !s.trim().is_empty()) {
        pts += 0.5;
    }
    if text.solution.as_deref().is_some_and(|s| !s.trim().is_empty()) {
        pts += 0.5;
    }
    if text.corpus().chars().any(|c| c.is_ascii_digit()) {
        pts += 0.25;
    }
    pts
}

pub fn weighted_sum(scores: &ComponentScores, w: &ComponentWeights) -> f64 {
    let n = ComponentWeights::COUNT as f64;
    scores.team.value * w.team * n
        + scores.traction.value * w.traction * n
        + scores.market.value * w.market * n
        + scores.product.value * w.product * n
        + scores.vision.value * w.vision * n
}

pub fn compose(scores: &ComponentScores, text: &PitchText, v: &WeightsVersion) -> BaseComposition {
    let narrative_raw = narrative_points(text);
    let boost_term = narrative_raw.min(v.base_boost_cap).max(v.base_boost_minimum);
    let weighted_components = weighted_sum(scores, &v.components);
    let raw_total = boost_term + weighted_components;
    let total_0_to_10 = (raw_total / v.normalization_divisor * 10.0).min(10.0);
    BaseComposition {
        narrative_raw,
        boost_term,
        weighted_components,
        raw_total,
        total_0_to_10,
        total_0_to_100: total_0_to_10 * 10.0,
    }
}
