//! Output shapes of one evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bootstrap::BootstrapOutcome;
use crate::completeness::Completeness;
use crate::components::ComponentScores;
use crate::composer::BaseComposition;
use crate::elite::EliteOutcome;
use crate::explain::Explanation;
use crate::momentum::MomentumOutcome;
use crate::signals::SignalOutcome;

/// Upper bound of every reported total.
pub const MAX_TOTAL: f64 = 100.0;

/// Numbers produced by every stage, in pipeline order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBreakdown {
    pub completeness: Completeness,
    pub components: ComponentScores,
    pub base: BaseComposition,
    pub bootstrap: BootstrapOutcome,
    pub signals: SignalOutcome,
    pub momentum: MomentumOutcome,
    /// Base plus every additive layer, before any clamping.
    pub additive_sum: f64,
    /// `min(additive_sum, 100)`; the elite layer's input.
    pub intermediate: f64,
    pub elite: EliteOutcome,
    /// Points lost to the 0–100 ceiling.
    pub overflow: f64,
    pub total: f64,
}

impl StageBreakdown {
    /// Combine stage outputs into the final total.
    pub fn assemble(
        completeness: Completeness,
        components: ComponentScores,
        base: BaseComposition,
        bootstrap: BootstrapOutcome,
        signals: SignalOutcome,
        momentum: MomentumOutcome,
        elite: impl FnOnce(f64) -> EliteOutcome,
    ) -> Self {
        let additive_sum =
            base.total_0_to_100 + bootstrap.points + signals.applied_bonus + momentum.points;
        let intermediate = additive_sum.min(MAX_TOTAL);
        let elite = elite(intermediate);
        let total = (intermediate + elite.boost).min(MAX_TOTAL);
        let overflow = (additive_sum + elite.boost - total).max(0.0);
        Self {
            completeness,
            components,
            base,
            bootstrap,
            signals,
            momentum,
            additive_sum,
            intermediate,
            elite,
            overflow,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub subject_id: String,
    /// GOD score, 0–100.
    pub total: f64,
    pub breakdown: StageBreakdown,
    pub weights_version: String,
    #[serde(default)]
    pub signal_tags: Vec<String>,
    pub explanation: Explanation,
    /// Near-threshold notes from the lenient validator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub computed_at: DateTime<Utc>,
}
