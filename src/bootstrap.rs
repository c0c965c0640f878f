//! # Sparse-Data Compensator
//! Profiles with little structured data get a substitute score built from
//! external corroborating signals: social proof, founder velocity, founder
//! reputation. Rich profiles bypass this layer entirely.
//!
//! Pure: reads the records it is given and never mutates them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::completeness::{Completeness, DataTier};
use crate::profile::{SocialSignalKind, SocialSignalRecord};
use crate::weights::{BootstrapConfig, MAX_LOOKBACK_DAYS};

/// Absolute ceiling of the layer, whatever a version configures.
pub const MAX_BOOTSTRAP: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapOutcome {
    pub tier: DataTier,
    /// False when the profile is rich and the layer was skipped.
    pub applied: bool,
    pub social_proof: f64,
    pub founder_velocity: f64,
    pub founder_reputation: f64,
    pub multiplier: f64,
    /// Points added to the base total.
    pub points: f64,
    pub records_considered: usize,
}

impl BootstrapOutcome {
    fn bypassed(tier: DataTier) -> Self {
        Self {
            tier,
            applied: false,
            social_proof: 0.0,
            founder_velocity: 0.0,
            founder_reputation: 0.0,
            multiplier: 0.0,
            points: 0.0,
            records_considered: 0,
        }
    }
}

fn sentiment_of(r: &SocialSignalRecord) -> f64 {
    r.sentiment.unwrap_or(0.0).clamp(-1.0, 1.0)
}

fn social_proof(records: &[&SocialSignalRecord]) -> f64 {
    let mut mentions = 0.0;
    let mut followers = 0.0;
    let mut upvotes = 0.0;
    for r in records {
        match r.kind {
            SocialSignalKind::Mention => {
                let s = sentiment_of(r);
                if s > 0.3 {
                    mentions += 0.4;
                } else if s >= -0.3 {
                    mentions += 0.25;
                }
            }
            SocialSignalKind::Followers => followers += r.value.max(0.0) / 1_000.0 * 0.5,
            SocialSignalKind::Upvotes => upvotes += r.value.max(0.0) / 100.0 * 0.25,
            _ => {}
        }
    }
    mentions + followers.min(2.0) + upvotes.min(1.0)
}

fn founder_velocity(records: &[&SocialSignalRecord]) -> f64 {
    let mut releases = 0.0;
    let mut commits = 0.0;
    for r in records {
        match r.kind {
            SocialSignalKind::Release => releases += 0.5,
            SocialSignalKind::ProductLaunch => releases += 1.0,
            SocialSignalKind::Commit => commits += r.value.max(0.0) / 50.0 * 0.25,
            _ => {}
        }
    }
    releases + commits.min(1.0)
}

fn founder_reputation(records: &[&SocialSignalRecord]) -> f64 {
    records
        .iter()
        .map(|r| match r.kind {
            SocialSignalKind::Press if sentiment_of(r) > 0.3 => 0.75,
            SocialSignalKind::Press => 0.5,
            SocialSignalKind::Award => 1.0,
            SocialSignalKind::Endorsement => 0.75,
            _ => 0.0,
        })
        .sum()
}

/// Compute the bootstrap contribution for one subject.
pub fn compensate(
    subject_id: &str,
    completeness: &Completeness,
    records: &[SocialSignalRecord],
    cfg: &BootstrapConfig,
    now: DateTime<Utc>,
) -> BootstrapOutcome {
    let multiplier = match completeness.tier {
        DataTier::Rich => return BootstrapOutcome::bypassed(DataTier::Rich),
        DataTier::Standard => cfg.standard_multiplier,
        DataTier::Sparse => cfg.sparse_multiplier,
    };

    let cutoff = now - Duration::days(cfg.lookback_days.clamp(0, MAX_LOOKBACK_DAYS));
    let relevant: Vec<&SocialSignalRecord> = records
        .iter()
        .filter(|r| r.subject_id == subject_id && r.observed_at >= cutoff && r.observed_at <= now)
        .collect();

    let social_proof = social_proof(&relevant).min(cfg.social_proof_cap);
    let founder_velocity = founder_velocity(&relevant).min(cfg.founder_velocity_cap);
    let founder_reputation = founder_reputation(&relevant).min(cfg.founder_reputation_cap);

    let points = ((social_proof + founder_velocity + founder_reputation) * multiplier)
        .clamp(0.0, cfg.max_points.min(MAX_BOOTSTRAP));

    BootstrapOutcome {
        tier: completeness.tier,
        applied: true,
        social_proof,
        founder_velocity,
        founder_reputation,
        multiplier,
        points,
        records_considered: relevant.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
    }

    fn rec(kind: SocialSignalKind, value: f64, days_ago: i64) -> SocialSignalRecord {
        SocialSignalRecord {
            subject_id: "s1".into(),
            platform: "x".into(),
            kind,
            value,
            sentiment: None,
            observed_at: now() - Duration::days(days_ago),
        }
    }

    fn completeness(tier: DataTier) -> Completeness {
        Completeness {
            ratio: match tier {
                DataTier::Sparse => 0.1,
                DataTier::Standard => 0.5,
                DataTier::Rich => 0.9,
            },
            present: 0,
            tier,
        }
    }

    #[test]
    fn rich_profiles_bypass() {
        let recs = vec![rec(SocialSignalKind::Award, 1.0, 1)];
        let out = compensate(
            "s1",
            &completeness(DataTier::Rich),
            &recs,
            &BootstrapConfig::default(),
            now(),
        );
        assert!(!out.applied);
        assert_eq!(out.points, 0.0);
    }

    #[test]
    fn standard_tier_is_halved() {
        let recs = vec![
            rec(SocialSignalKind::Award, 1.0, 1),
            rec(SocialSignalKind::Release, 1.0, 2),
        ];
        let cfg = BootstrapConfig::default();
        let sparse = compensate("s1", &completeness(DataTier::Sparse), &recs, &cfg, now());
        let standard = compensate("s1", &completeness(DataTier::Standard), &recs, &cfg, now());
        assert!((sparse.points - 1.5).abs() < 1e-9);
        assert!((standard.points - 0.75).abs() < 1e-9);
    }

    #[test]
    fn sub_scores_and_total_are_capped() {
        let mut recs = Vec::new();
        for _ in 0..20 {
            recs.push(rec(SocialSignalKind::Mention, 1.0, 3));
            recs.push(rec(SocialSignalKind::ProductLaunch, 1.0, 3));
            recs.push(rec(SocialSignalKind::Award, 1.0, 3));
        }
        let cfg = BootstrapConfig::default();
        let out = compensate("s1", &completeness(DataTier::Sparse), &recs, &cfg, now());
        assert_eq!(out.social_proof, cfg.social_proof_cap);
        assert_eq!(out.founder_velocity, cfg.founder_velocity_cap);
        assert_eq!(out.founder_reputation, cfg.founder_reputation_cap);
        assert_eq!(out.points, cfg.max_points);
    }

    #[test]
    fn ignores_stale_and_foreign_records() {
        let mut foreign = rec(SocialSignalKind::Award, 1.0, 1);
        foreign.subject_id = "other".into();
        let recs = vec![foreign, rec(SocialSignalKind::Award, 1.0, 400)];
        let out = compensate(
            "s1",
            &completeness(DataTier::Sparse),
            &recs,
            &BootstrapConfig::default(),
            now(),
        );
        assert!(out.applied);
        assert_eq!(out.records_considered, 0);
        assert_eq!(out.points, 0.0);
    }

    #[test]
    fn oversized_lookback_is_clamped_not_panicking() {
        let recs = vec![rec(SocialSignalKind::Award, 1.0, 1)];
        let cfg = BootstrapConfig {
            lookback_days: i64::MAX,
            ..BootstrapConfig::default()
        };
        let out = compensate("s1", &completeness(DataTier::Sparse), &recs, &cfg, now());
        assert_eq!(out.records_considered, 1);
    }
}
