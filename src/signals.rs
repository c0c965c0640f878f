//! # Market-Signal Layer
//! Five market-psychology dimensions, each normalized to [0, 1] from the
//! round signals, weighted by per-dimension point caps into a 0–10 bonus.
//!
//! Hysteresis keeps the bonus from flapping: a new bonus is applied only when
//! at least one dimension moved significantly since the last applied state.
//! Otherwise the stored bonus is reused unchanged and nothing is written.
//! The first observation for a subject is always significant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::RoundSignals;
use crate::weights::SignalConfig;

/// Upper bound of the bonus, whatever the caps say.
pub const MAX_BONUS: f64 = 10.0;
/// Significance thresholds. Fixed across versions; the validator rejects others.
pub const RELATIVE_THRESHOLD: f64 = 0.5;
pub const ZERO_BASELINE_THRESHOLD: f64 = 0.2;

pub const DIMENSION_NAMES: [&str; 5] = [
    "investor_fomo",
    "insider_conviction",
    "round_urgency",
    "press_velocity",
    "hiring_velocity",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalDimensions {
    pub investor_fomo: f64,
    pub insider_conviction: f64,
    pub round_urgency: f64,
    pub press_velocity: f64,
    pub hiring_velocity: f64,
}

impl SignalDimensions {
    /// Normalize round signals. Absent inputs contribute 0.
    pub fn from_round(r: &RoundSignals) -> Self {
        let mut fomo = 0.0;
        if r.oversubscribed == Some(true) {
            fomo += 0.6;
        }
        if let Some(n) = r.competing_term_sheets {
            fomo += f64::from(n.min(4)) / 10.0;
        }

        let conviction = if r.insider_follow_on == Some(true) {
            0.8
        } else {
            0.0
        };

        let urgency = match r.round_closing_days {
            Some(d) if d <= 14 => 1.0,
            Some(d) if d <= 30 => 0.6,
            Some(d) if d <= 60 => 0.3,
            _ => 0.0,
        };

        let press = r
            .press_mentions_90d
            .map_or(0.0, |n| f64::from(n.min(10)) / 10.0);
        let hiring = r.open_roles.map_or(0.0, |n| f64::from(n.min(20)) / 20.0);

        Self {
            investor_fomo: fomo.clamp(0.0, 1.0),
            insider_conviction: conviction,
            round_urgency: urgency,
            press_velocity: press,
            hiring_velocity: hiring,
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.investor_fomo,
            self.insider_conviction,
            self.round_urgency,
            self.press_velocity,
            self.hiring_velocity,
        ]
    }

    pub fn named(&self) -> [(&'static str, f64); 5] {
        let v = self.as_array();
        [
            (DIMENSION_NAMES[0], v[0]),
            (DIMENSION_NAMES[1], v[1]),
            (DIMENSION_NAMES[2], v[2]),
            (DIMENSION_NAMES[3], v[3]),
            (DIMENSION_NAMES[4], v[4]),
        ]
    }
}

/// Last-applied state for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalState {
    pub dimensions: SignalDimensions,
    pub bonus: f64,
    pub last_changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalOutcome {
    pub dimensions: SignalDimensions,
    /// Per-dimension points, `dimension × cap`.
    pub contributions: [f64; 5],
    /// What the bonus would be if applied now.
    pub candidate_bonus: f64,
    /// The bonus that actually counts toward the total.
    pub applied_bonus: f64,
    pub is_significant_change: bool,
    /// Set by the caller once the new state is durably written.
    pub persisted: bool,
}

impl SignalOutcome {
    /// State to write when the change is significant.
    pub fn next_state(&self, now: DateTime<Utc>) -> Option<SignalState> {
        self.is_significant_change.then(|| SignalState {
            dimensions: self.dimensions,
            bonus: self.applied_bonus,
            last_changed_at: now,
        })
    }
}

fn dimension_moved(old: f64, new: f64, cfg: &SignalConfig) -> bool {
    if old > 0.0 {
        (new - old).abs() / old >= cfg.relative_threshold
    } else {
        new >= cfg.zero_baseline_threshold
    }
}

/// True when no state exists or any dimension crossed its threshold.
pub fn is_significant(
    old: Option<&SignalState>,
    new: &SignalDimensions,
    cfg: &SignalConfig,
) -> bool {
    match old {
        None => true,
        Some(state) => state
            .dimensions
            .as_array()
            .iter()
            .zip(new.as_array())
            .any(|(&o, n)| dimension_moved(o, n, cfg)),
    }
}

/// Compute dimensions and decide between the candidate and the stored bonus.
/// Pure; persisting `next_state` is the caller's job.
pub fn apply_signals(
    round: &RoundSignals,
    stored: Option<&SignalState>,
    cfg: &SignalConfig,
) -> SignalOutcome {
    let dimensions = SignalDimensions::from_round(round);
    let caps = cfg.caps.as_array();
    let dims = dimensions.as_array();
    let mut contributions = [0.0; 5];
    for i in 0..5 {
        contributions[i] = dims[i] * caps[i];
    }
    let candidate_bonus = contributions.iter().sum::<f64>().clamp(0.0, MAX_BONUS);

    let significant = is_significant(stored, &dimensions, cfg);
    let applied_bonus = match (significant, stored) {
        (false, Some(state)) => state.bonus,
        _ => candidate_bonus,
    };

    SignalOutcome {
        dimensions,
        contributions,
        candidate_bonus,
        applied_bonus,
        is_significant_change: significant,
        persisted: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fomo_and_conviction() -> RoundSignals {
        RoundSignals {
            competing_term_sheets: Some(4),
            insider_follow_on: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn first_observation_applies_candidate() {
        let out = apply_signals(&fomo_and_conviction(), None, &SignalConfig::default());
        assert!(out.is_significant_change);
        assert!((out.candidate_bonus - 3.2).abs() < 1e-9);
        assert_eq!(out.applied_bonus, out.candidate_bonus);
        assert!(out.next_state(Utc::now()).is_some());
    }

    #[test]
    fn unchanged_dimensions_reuse_stored_bonus() {
        let round = fomo_and_conviction();
        let stored = SignalState {
            dimensions: SignalDimensions::from_round(&round),
            bonus: 4.0,
            last_changed_at: Utc::now(),
        };
        let out = apply_signals(&round, Some(&stored), &SignalConfig::default());
        assert!(!out.is_significant_change);
        assert_eq!(out.applied_bonus, 4.0);
        assert!(out.next_state(Utc::now()).is_none());
    }

    #[test]
    fn thresholds_relative_and_from_zero() {
        let cfg = SignalConfig::default();
        assert!(!dimension_moved(0.4, 0.59, &cfg));
        assert!(dimension_moved(0.4, 0.6, &cfg));
        assert!(dimension_moved(0.4, 0.2, &cfg));
        assert!(!dimension_moved(0.0, 0.19, &cfg));
        assert!(dimension_moved(0.0, 0.2, &cfg));
    }

    #[test]
    fn saturated_round_stays_within_caps() {
        let round = RoundSignals {
            oversubscribed: Some(true),
            competing_term_sheets: Some(9),
            insider_follow_on: Some(true),
            round_closing_days: Some(3),
            press_mentions_90d: Some(50),
            open_roles: Some(80),
        };
        let cfg = SignalConfig::default();
        let out = apply_signals(&round, None, &cfg);
        for (c, cap) in out.contributions.iter().zip(cfg.caps.as_array()) {
            assert!(*c <= cap + 1e-12);
        }
        assert!(out.candidate_bonus <= MAX_BONUS);
        for (_, d) in out.dimensions.named() {
            assert!((0.0..=1.0).contains(&d));
        }
    }
}
