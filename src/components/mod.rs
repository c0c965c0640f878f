//! Component scorer: five independent, bounded sub-scores.
//!
//! Every component follows the same three-way branch:
//! 1) structured fields, when any are present;
//! 2) free-text phrase matches from the evidence taxonomy, when they are not;
//! 3) a fixed floor, when neither yields a signal.
//!
//! The floor keeps a missing section from reading as a literal zero.

pub mod market;
pub mod product;
pub mod team;
pub mod traction;
pub mod vision;

use serde::{Deserialize, Serialize};

use crate::profile::StartupProfile;
use crate::taxonomy::Taxonomy;

/// Which evidence path produced a component score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    Structured,
    Text,
    Floor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub value: f64,
    pub max: f64,
    pub basis: Basis,
    /// Short evidence notes for the explanation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
}

impl ComponentScore {
    pub(crate) fn structured(raw: f64, max: f64, evidence: Vec<String>) -> Self {
        Self {
            value: raw.clamp(0.0, max),
            max,
            basis: Basis::Structured,
            evidence,
        }
    }

    /// Text fallback; zero phrase hits means no signal, so the floor applies.
    pub(crate) fn from_text(hits: usize, per_hit: f64, text_cap: f64, max: f64, floor: f64) -> Self {
        if hits == 0 {
            return Self::floor(floor, max);
        }
        let value = (hits as f64 * per_hit).min(text_cap).clamp(0.0, max);
        Self {
            value,
            max,
            basis: Basis::Text,
            evidence: vec![format!("{hits} phrase match(es) in pitch text")],
        }
    }

    pub(crate) fn floor(floor: f64, max: f64) -> Self {
        Self {
            value: floor.clamp(0.0, max),
            max,
            basis: Basis::Floor,
            evidence: vec!["no data; benefit-of-the-doubt floor".to_string()],
        }
    }
}

/// Immutable per-evaluation component scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub team: ComponentScore,
    pub traction: ComponentScore,
    pub market: ComponentScore,
    pub product: ComponentScore,
    pub vision: ComponentScore,
}

impl ComponentScores {
    pub fn named(&self) -> [(&'static str, &ComponentScore); 5] {
        [
            ("team", &self.team),
            ("traction", &self.traction),
            ("market", &self.market),
            ("product", &self.product),
            ("vision", &self.vision),
        ]
    }
}

/// Pure function of the profile and the taxonomy.
pub fn score_components(profile: &StartupProfile, taxonomy: &Taxonomy) -> ComponentScores {
    ComponentScores {
        team: team::score(profile, taxonomy),
        traction: traction::score(profile, taxonomy),
        market: market::score(profile, taxonomy),
        product: product::score(profile, taxonomy),
        vision: vision::score(profile, taxonomy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_yields_every_floor() {
        let s = score_components(&StartupProfile::default(), Taxonomy::builtin());
        assert_eq!(s.team.value, team::FLOOR);
        assert_eq!(s.traction.value, traction::FLOOR);
        assert_eq!(s.market.value, market::FLOOR);
        assert_eq!(s.product.value, product::FLOOR);
        assert_eq!(s.vision.value, vision::FLOOR);
        for (name, c) in s.named() {
            assert_eq!(c.basis, Basis::Floor, "{name}");
            assert!(c.value > 0.0, "{name}");
        }
    }

    #[test]
    fn every_component_stays_within_its_cap() {
        let mut p = StartupProfile::default();
        p.team.founders_count = Some(3);
        p.team.technical_cofounder = Some(true);
        p.team.prior_exits = Some(4);
        p.team.years_experience = Some(20.0);
        p.team.team_size = Some(40);
        p.team.founder_backgrounds = vec!["Google".into(), "Stripe".into(), "OpenAI".into()];
        p.traction.arr_usd = Some(50_000_000.0);
        p.traction.revenue_growth_pct = Some(40.0);
        p.traction.customers = Some(5_000);
        p.traction.active_users = Some(1_000_000);
        p.traction.retention_pct = Some(95.0);
        p.market.market_size_usd = Some(1e12);
        p.market.market_growth_pct = Some(50.0);
        p.sectors = vec!["AI".into()];
        p.product.stage = Some(crate::profile::ProductStage::Scaling);
        p.product.demo_available = Some(true);
        p.product.has_patents = Some(true);
        p.text.tagline = Some("The operating system for clinics".into());
        p.text.problem =
            Some("Independent clinics lose a fifth of revenue to no-shows and paperwork".into());
        p.text.solution =
            Some("An AI front desk that books, reminds and bills without staff involvement".into());
        p.text.pitch = Some("Our mission: reimagine care access.".into());
        let s = score_components(&p, Taxonomy::builtin());
        for (name, c) in s.named() {
            assert!(c.value <= c.max, "{name} {} > {}", c.value, c.max);
            assert_eq!(c.value, c.max, "{name} should saturate");
        }
    }
}
