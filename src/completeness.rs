//! Shared data-completeness measure and tiering.
//!
//! Bootstrap, momentum and the elite layer all read the same `DataTier`, so
//! the thresholds live here and nowhere else.

use serde::{Deserialize, Serialize};

use crate::profile::StartupProfile;

/// Completeness below this is sparse.
pub const SPARSE_BELOW: f64 = 0.40;
/// Completeness at or above this is rich.
pub const RICH_AT: f64 = 0.70;

const KEY_FIELDS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTier {
    Sparse,
    Standard,
    Rich,
}

impl DataTier {
    pub fn from_completeness(c: f64) -> Self {
        if c >= RICH_AT {
            DataTier::Rich
        } else if c >= SPARSE_BELOW {
            DataTier::Standard
        } else {
            DataTier::Sparse
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Completeness {
    /// Fraction of key fields present, in [0, 1].
    pub ratio: f64,
    pub present: u8,
    pub tier: DataTier,
}

/// Fraction of the ten key fields that are present on the profile.
pub fn data_completeness(p: &StartupProfile) -> Completeness {
    let checks = [
        p.traction.annual_revenue().is_some(),
        p.traction.revenue_growth_pct.is_some(),
        p.traction.customers.is_some(),
        p.traction.active_users.is_some(),
        p.team.team_size.is_some(),
        p.team.founders_count.is_some(),
        p.market.market_size_usd.is_some(),
        p.product.stage.is_some() || p.product.launched.is_some(),
        p.funding.total_raised_usd.is_some(),
        !p.text.is_empty(),
    ];
    let present = checks.iter().filter(|&&c| c).count() as u8;
    let ratio = (f64::from(present) / KEY_FIELDS).clamp(0.0, 1.0);
    Completeness {
        ratio,
        present,
        tier: DataTier::from_completeness(ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ProductStage, StartupProfile};

    #[test]
    fn empty_profile_is_sparse() {
        let c = data_completeness(&StartupProfile::default());
        assert_eq!(c.present, 0);
        assert_eq!(c.ratio, 0.0);
        assert_eq!(c.tier, DataTier::Sparse);
    }

    #[test]
    fn tier_boundaries_are_inclusive_at_the_low_edge() {
        assert_eq!(DataTier::from_completeness(0.39), DataTier::Sparse);
        assert_eq!(DataTier::from_completeness(0.40), DataTier::Standard);
        assert_eq!(DataTier::from_completeness(0.69), DataTier::Standard);
        assert_eq!(DataTier::from_completeness(0.70), DataTier::Rich);
    }

    #[test]
    fn counts_present_fields() {
        let mut p = StartupProfile::default();
        p.traction.mrr_usd = Some(5_000.0);
        p.team.founders_count = Some(2);
        p.product.stage = Some(ProductStage::Beta);
        p.text.pitch = Some("We help clinics".into());
        let c = data_completeness(&p);
        assert_eq!(c.present, 4);
        assert!((c.ratio - 0.4).abs() < 1e-9);
        assert_eq!(c.tier, DataTier::Standard);
    }
}
