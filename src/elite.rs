//! # Tiered Elite Multiplier
//! Multiplicative uplift for subjects that are already strong and show
//! corroborated excellence. The tier sets the ceiling, excellence decides how
//! much of it is earned, and an absolute cap bounds the result. The boost is
//! never negative.

use serde::{Deserialize, Serialize};

use crate::completeness::Completeness;
use crate::components::{product::stage_points, ComponentScores};
use crate::profile::StartupProfile;
use crate::taxonomy::Taxonomy;
use crate::weights::EliteConfig;

/// Per-dimension cap of the excellence score.
pub const DIMENSION_CAP: f64 = 2.0;
/// Width of the excellence range above the gate that maps to ratio 1.0.
const RATIO_SPAN: f64 = 7.0;

/// Hard gate: no boost below this intermediate total.
pub const GATE_MIN_TOTAL: f64 = 60.0;
/// Hard gate: no boost below this excellence score.
pub const GATE_MIN_EXCELLENCE: f64 = 3.0;
/// Highest tier ceiling any version may configure.
pub const MAX_TIER_MULTIPLIER: f64 = 1.18;
/// Absolute cap on the boost, in points.
pub const MAX_ELITE_BOOST: f64 = 15.0;

/// Excellence evidence, each dimension in [0, 2]; total in [0, 10].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Excellence {
    pub traction: f64,
    pub team_pedigree: f64,
    pub investor_validation: f64,
    pub product_maturity: f64,
    pub completeness: f64,
}

impl Excellence {
    pub fn total(&self) -> f64 {
        self.traction
            + self.team_pedigree
            + self.investor_validation
            + self.product_maturity
            + self.completeness
    }
}

pub fn excellence(
    profile: &StartupProfile,
    components: &ComponentScores,
    completeness: &Completeness,
    taxonomy: &Taxonomy,
) -> Excellence {
    let traction = if components.traction.max > 0.0 {
        components.traction.value / components.traction.max * DIMENSION_CAP
    } else {
        0.0
    };

    let t = &profile.team;
    let mut team_pedigree = f64::from(t.prior_exits.unwrap_or(0).min(2))
        + taxonomy.count_elite(&t.founder_backgrounds) as f64 * 0.5;
    if t.technical_cofounder == Some(true) {
        team_pedigree += 0.5;
    }

    let f = &profile.funding;
    let raised = match f.total_raised_usd {
        Some(r) if r >= 10_000_000.0 => 0.5,
        Some(r) if r >= 1_000_000.0 => 0.25,
        _ => 0.0,
    };
    let investor_validation = taxonomy.count_tier1(&f.investors) as f64 + raised;

    let pr = &profile.product;
    let mut product_maturity = match (pr.stage, pr.launched) {
        (Some(stage), _) => stage_points(stage),
        (None, Some(true)) => 1.0,
        _ => 0.0,
    };
    if pr.has_patents == Some(true) {
        product_maturity += 0.5;
    }
    if pr.demo_available == Some(true) {
        product_maturity += 0.25;
    }

    Excellence {
        traction: traction.clamp(0.0, DIMENSION_CAP),
        team_pedigree: team_pedigree.clamp(0.0, DIMENSION_CAP),
        investor_validation: investor_validation.clamp(0.0, DIMENSION_CAP),
        product_maturity: product_maturity.clamp(0.0, DIMENSION_CAP),
        completeness: (completeness.ratio * DIMENSION_CAP).clamp(0.0, DIMENSION_CAP),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteOutcome {
    pub excellence: Excellence,
    /// True when the gate rejected the subject.
    pub gated: bool,
    pub tier_multiplier: Option<f64>,
    pub excellence_ratio: f64,
    pub effective_multiplier: f64,
    /// Points added to the intermediate total, in [0, max_boost].
    pub boost: f64,
    /// True when the absolute cap cut the boost.
    pub capped: bool,
}

impl EliteOutcome {
    fn gated(excellence: Excellence) -> Self {
        Self {
            excellence,
            gated: true,
            tier_multiplier: None,
            excellence_ratio: 0.0,
            effective_multiplier: 1.0,
            boost: 0.0,
            capped: false,
        }
    }
}

pub fn elite_multiplier(intermediate: f64, excellence: Excellence, cfg: &EliteConfig) -> EliteOutcome {
    let score = excellence.total();
    let min_total = cfg.min_total.max(GATE_MIN_TOTAL);
    let min_excellence = cfg.min_excellence.max(GATE_MIN_EXCELLENCE);
    if intermediate < min_total || score < min_excellence {
        return EliteOutcome::gated(excellence);
    }
    let Some(tier) = cfg.tier_for(intermediate) else {
        return EliteOutcome::gated(excellence);
    };

    let ratio = ((score - min_excellence) / RATIO_SPAN).clamp(0.0, 1.0);
    let ceiling = tier.multiplier.min(MAX_TIER_MULTIPLIER);
    let effective = 1.0 + (ceiling - 1.0).max(0.0) * ratio;
    let raw = (intermediate * (effective - 1.0)).round().max(0.0);
    let max_boost = cfg.max_boost.min(MAX_ELITE_BOOST);
    let boost = raw.min(max_boost);

    EliteOutcome {
        excellence,
        gated: false,
        tier_multiplier: Some(tier.multiplier),
        excellence_ratio: ratio,
        effective_multiplier: effective,
        boost,
        capped: raw > max_boost,
    }
}
