//! # Momentum Layer
//! Forward-trajectory bonus: six capped sub-dimensions summed and capped again.
//! The score-trajectory part only trusts server-side recalculations from the
//! history; anything a client reported is ignored.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::completeness::Completeness;
use crate::components::product::stage_points;
use crate::profile::{HistorySource, ScoreHistoryRecord, StartupProfile};
use crate::weights::{MomentumConfig, MAX_LOOKBACK_DAYS};

/// Absolute ceiling of the layer, whatever a version configures.
pub const MAX_MOMENTUM: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumOutcome {
    pub revenue: f64,
    pub customers: f64,
    pub product: f64,
    pub team: f64,
    pub effort: f64,
    pub trajectory: f64,
    /// Verified increase across the lookback, when enough history exists.
    pub verified_increase: Option<f64>,
    pub points: f64,
}

impl MomentumOutcome {
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("revenue", self.revenue),
            ("customers", self.customers),
            ("product", self.product),
            ("team", self.team),
            ("effort", self.effort),
            ("trajectory", self.trajectory),
        ]
    }
}

fn revenue_trajectory(p: &StartupProfile) -> f64 {
    match p.traction.revenue_growth_pct {
        Some(g) if g >= 30.0 => 2.0,
        Some(g) if g >= 15.0 => 1.5,
        Some(g) if g >= 5.0 => 1.0,
        Some(g) if g > 0.0 => 0.5,
        _ => 0.0,
    }
}

fn customer_trajectory(p: &StartupProfile) -> f64 {
    match (p.traction.customer_growth_pct, p.traction.customers) {
        (Some(g), _) if g >= 20.0 => 1.5,
        (Some(g), _) if g >= 10.0 => 1.0,
        (Some(g), _) if g > 0.0 => 0.5,
        (None, Some(n)) if n >= 10 => 0.25,
        _ => 0.0,
    }
}

fn product_maturity(p: &StartupProfile) -> f64 {
    let base = match (p.product.stage, p.product.launched) {
        (Some(stage), _) => stage_points(stage),
        (None, Some(true)) => 1.0,
        _ => 0.0,
    };
    let demo = if p.product.demo_available == Some(true) {
        0.25
    } else {
        0.0
    };
    base + demo
}

fn team_strength(p: &StartupProfile) -> f64 {
    let size = match p.team.team_size {
        Some(n) if n >= 20 => 1.0,
        Some(n) if n >= 10 => 0.75,
        Some(n) if n >= 5 => 0.5,
        Some(n) if n >= 2 => 0.25,
        _ => 0.0,
    };
    let technical = if p.team.technical_cofounder == Some(true) {
        0.5
    } else {
        0.0
    };
    size + technical
}

/// Increase from the earliest `old_score` to the latest `new_score` among
/// recalculations inside the window. `None` with no qualifying records.
pub fn verified_increase(
    history: &[ScoreHistoryRecord],
    cfg: &MomentumConfig,
    now: DateTime<Utc>,
) -> Option<f64> {
    let cutoff = now - Duration::days(cfg.lookback_days.clamp(0, MAX_LOOKBACK_DAYS));
    let mut window: Vec<&ScoreHistoryRecord> = history
        .iter()
        .filter(|r| r.source == HistorySource::Recalculation)
        .filter(|r| r.recorded_at >= cutoff && r.recorded_at <= now)
        .collect();
    window.sort_by_key(|r| r.recorded_at);
    let first = window.first()?;
    let last = window.last()?;
    Some(last.new_score - first.old_score)
}

pub fn momentum(
    profile: &StartupProfile,
    completeness: &Completeness,
    history: &[ScoreHistoryRecord],
    cfg: &MomentumConfig,
    now: DateTime<Utc>,
) -> MomentumOutcome {
    let revenue = revenue_trajectory(profile).min(cfg.revenue_cap);
    let customers = customer_trajectory(profile).min(cfg.customer_cap);
    let product = product_maturity(profile).min(cfg.product_cap);
    let team = team_strength(profile).min(cfg.team_cap);
    let effort = (completeness.ratio * cfg.effort_cap).clamp(0.0, cfg.effort_cap);

    let verified = verified_increase(history, cfg, now);
    let trajectory = match verified {
        Some(delta) if delta >= cfg.min_increase => cfg.trajectory_bonus,
        _ => 0.0,
    };

    let points =
        (revenue + customers + product + team + effort + trajectory).clamp(0.0, cfg.max_points.min(MAX_MOMENTUM));

    MomentumOutcome {
        revenue,
        customers,
        product,
        team,
        effort,
        trajectory,
        verified_increase: verified,
        points,
    }
}
