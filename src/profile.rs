//! Input records produced by upstream enrichment.
//!
//! Every field is optional. `None` (or an empty list) means "unknown" and each
//! consumer decides its own fallback; nothing here defaults to zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Funding stage of a company (and the stages an investor writes checks for).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idea,
    PreSeed,
    Seed,
    SeriesA,
    SeriesB,
    Growth,
}

/// How far along the product is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStage {
    Concept,
    Prototype,
    Beta,
    Launched,
    Scaling,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamFacts {
    pub founders_count: Option<u32>,
    pub team_size: Option<u32>,
    pub technical_cofounder: Option<bool>,
    pub prior_exits: Option<u32>,
    pub years_experience: Option<f64>,
    /// Companies the founders previously worked at.
    #[serde(default)]
    pub founder_backgrounds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TractionFacts {
    pub mrr_usd: Option<f64>,
    pub arr_usd: Option<f64>,
    /// Month-over-month revenue growth, in percent.
    pub revenue_growth_pct: Option<f64>,
    pub customers: Option<u32>,
    /// Month-over-month customer growth, in percent.
    pub customer_growth_pct: Option<f64>,
    pub active_users: Option<u64>,
    pub retention_pct: Option<f64>,
}

impl TractionFacts {
    /// Annualized revenue: ARR when reported, else MRR × 12.
    pub fn annual_revenue(&self) -> Option<f64> {
        self.arr_usd.or(self.mrr_usd.map(|m| m * 12.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketFacts {
    pub market_size_usd: Option<f64>,
    pub market_growth_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFacts {
    pub stage: Option<ProductStage>,
    pub launched: Option<bool>,
    pub demo_available: Option<bool>,
    pub has_patents: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingFacts {
    pub total_raised_usd: Option<f64>,
    #[serde(default)]
    pub investors: Vec<String>,
}

/// Round dynamics feeding the market-psychology dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundSignals {
    pub oversubscribed: Option<bool>,
    pub competing_term_sheets: Option<u32>,
    pub insider_follow_on: Option<bool>,
    pub round_closing_days: Option<u32>,
    pub press_mentions_90d: Option<u32>,
    pub open_roles: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchText {
    pub tagline: Option<String>,
    pub pitch: Option<String>,
    pub problem: Option<String>,
    pub solution: Option<String>,
}

impl PitchText {
    /// All non-empty text fields joined, for phrase matching.
    pub fn corpus(&self) -> String {
        [&self.tagline, &self.pitch, &self.problem, &self.solution]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.corpus().is_empty()
    }
}

/// Read-only snapshot of one startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupProfile {
    pub name: Option<String>,
    pub stage: Option<Stage>,
    pub sectors: Vec<String>,
    pub team: TeamFacts,
    pub traction: TractionFacts,
    pub market: MarketFacts,
    pub product: ProductFacts,
    pub funding: FundingFacts,
    pub round: RoundSignals,
    pub text: PitchText,
}

/// Kind of externally corroborated signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialSignalKind {
    Mention,
    Followers,
    Upvotes,
    Release,
    Commit,
    ProductLaunch,
    Press,
    Award,
    Endorsement,
}

/// One record from an external platform scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialSignalRecord {
    pub subject_id: String,
    pub platform: String,
    pub kind: SocialSignalKind,
    /// Magnitude (count, followers, upvotes); 1.0 for single events.
    #[serde(default = "one")]
    pub value: f64,
    /// Sentiment in [-1, 1] when the scraper could tell.
    pub sentiment: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

fn one() -> f64 {
    1.0
}

/// Who produced a score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    /// Server-side recalculation; the only source momentum trusts.
    Recalculation,
    Manual,
    ClientReported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreHistoryRecord {
    pub subject_id: String,
    pub old_score: f64,
    pub new_score: f64,
    pub recorded_at: DateTime<Utc>,
    pub source: HistorySource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_an_empty_profile() {
        let p: StartupProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(p, StartupProfile::default());
        assert!(p.text.is_empty());
        assert_eq!(p.traction.annual_revenue(), None);
    }

    #[test]
    fn annual_revenue_prefers_arr() {
        let t = TractionFacts {
            mrr_usd: Some(10_000.0),
            ..Default::default()
        };
        assert_eq!(t.annual_revenue(), Some(120_000.0));
        let t = TractionFacts {
            mrr_usd: Some(10_000.0),
            arr_usd: Some(90_000.0),
            ..Default::default()
        };
        assert_eq!(t.annual_revenue(), Some(90_000.0));
    }

    #[test]
    fn corpus_skips_blank_fields() {
        let t = PitchText {
            tagline: Some("  ".into()),
            pitch: Some("AI for clinics".into()),
            problem: None,
            solution: Some("Scheduling agent".into()),
        };
        assert_eq!(t.corpus(), "AI for clinics Scheduling agent");
    }
}
