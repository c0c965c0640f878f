//! explain.rs: structured audit of every stage plus short signal tags.
//!
//! Every line names the stage it belongs to and, where it makes sense, the
//! points it moved. The shape is stable so dashboards can diff explanations
//! across weight versions.

use serde::{Deserialize, Serialize};

use crate::completeness::DataTier;
use crate::components::Basis;
use crate::profile::StartupProfile;
use crate::result::StageBreakdown;
use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Components,
    Base,
    Bootstrap,
    Signals,
    Momentum,
    Elite,
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationLine {
    pub stage: PipelineStage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub weights_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<ExplanationLine>,
}

impl Explanation {
    pub fn new(weights_version: impl Into<String>) -> Self {
        Self {
            weights_version: weights_version.into(),
            lines: Vec::new(),
        }
    }

    /// Builder style, like the rest of the result types.
    pub fn with_line(mut self, stage: PipelineStage, message: impl Into<String>) -> Self {
        self.lines.push(ExplanationLine {
            stage,
            message: message.into(),
            points: None,
        });
        self
    }

    pub fn with_points(
        mut self,
        stage: PipelineStage,
        message: impl Into<String>,
        points: f64,
    ) -> Self {
        self.lines.push(ExplanationLine {
            stage,
            message: message.into(),
            points: Some(points),
        });
        self
    }

    pub fn for_stage(&self, stage: PipelineStage) -> impl Iterator<Item = &ExplanationLine> {
        self.lines.iter().filter(move |l| l.stage == stage)
    }
}

fn basis_label(b: Basis) -> &'static str {
    match b {
        Basis::Structured => "structured data",
        Basis::Text => "pitch text",
        Basis::Floor => "floor",
    }
}

fn tier_label(t: DataTier) -> &'static str {
    match t {
        DataTier::Sparse => "sparse",
        DataTier::Standard => "standard",
        DataTier::Rich => "rich",
    }
}

/// Numeric walk through the breakdown, in pipeline order.
pub fn build(b: &StageBreakdown, weights_version: &str) -> Explanation {
    let mut ex = Explanation::new(weights_version);

    for (name, c) in b.components.named() {
        let mut msg = format!("{name} {:.2}/{:.0} from {}", c.value, c.max, basis_label(c.basis));
        if !c.evidence.is_empty() {
            msg.push_str(&format!(" ({})", c.evidence.join(", ")));
        }
        ex = ex.with_points(PipelineStage::Components, msg, c.value);
    }

    ex = ex
        .with_points(
            PipelineStage::Base,
            format!(
                "narrative boost {:.2} (raw {:.2}) + weighted components {:.2}",
                b.base.boost_term, b.base.narrative_raw, b.base.weighted_components
            ),
            b.base.raw_total,
        )
        .with_points(
            PipelineStage::Base,
            format!("normalized base {:.1}/100", b.base.total_0_to_100),
            b.base.total_0_to_100,
        );

    let tier = tier_label(b.completeness.tier);
    ex = if b.bootstrap.applied {
        ex.with_points(
            PipelineStage::Bootstrap,
            format!(
                "{tier} data ({}/10 fields): social {:.2}, velocity {:.2}, reputation {:.2} × {:.1}",
                b.completeness.present,
                b.bootstrap.social_proof,
                b.bootstrap.founder_velocity,
                b.bootstrap.founder_reputation,
                b.bootstrap.multiplier
            ),
            b.bootstrap.points,
        )
    } else {
        ex.with_line(PipelineStage::Bootstrap, "rich data, compensation bypassed")
    };

    let s = &b.signals;
    let dims = s
        .dimensions
        .named()
        .iter()
        .map(|(n, v)| format!("{n} {v:.2}"))
        .collect::<Vec<_>>()
        .join(", ");
    let held = if s.is_significant_change {
        format!("applied new bonus {:.2}", s.candidate_bonus)
    } else {
        format!(
            "held stored bonus {:.2} (candidate {:.2} not significant)",
            s.applied_bonus, s.candidate_bonus
        )
    };
    ex = ex.with_points(
        PipelineStage::Signals,
        format!("{held}; {dims}"),
        s.applied_bonus,
    );

    let m = &b.momentum;
    let parts = m
        .named()
        .iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(n, v)| format!("{n} {v:.2}"))
        .collect::<Vec<_>>();
    let msg = if parts.is_empty() {
        "no forward momentum".to_string()
    } else {
        parts.join(", ")
    };
    ex = ex.with_points(PipelineStage::Momentum, msg, m.points);

    let e = &b.elite;
    ex = match e.tier_multiplier {
        Some(tier) if !e.gated => ex.with_points(
            PipelineStage::Elite,
            format!(
                "excellence {:.2}, tier ×{tier:.2}, effective ×{:.3}{}",
                e.excellence.total(),
                e.effective_multiplier,
                if e.capped { ", capped" } else { "" }
            ),
            e.boost,
        ),
        _ => ex.with_line(
            PipelineStage::Elite,
            format!(
                "gated: intermediate {:.1}, excellence {:.2}",
                b.intermediate,
                e.excellence.total()
            ),
        ),
    };

    let mut total = format!("final {:.1}/100", b.total);
    if b.overflow > 0.0 {
        total.push_str(&format!(" ({:.1} points over the ceiling dropped)", b.overflow));
    }
    ex.with_points(PipelineStage::Total, total, b.total)
}

/// Short human-readable tags for list views.
pub fn signal_tags(profile: &StartupProfile, b: &StageBreakdown, taxonomy: &Taxonomy) -> Vec<String> {
    let mut tags = Vec::new();
    if profile.sectors.iter().any(|s| taxonomy.is_hot_sector(s)) {
        tags.push("hot-sector");
    }
    if taxonomy.count_tier1(&profile.funding.investors) > 0 {
        tags.push("tier1-investor");
    }
    if b.elite.boost > 0.0 {
        tags.push("elite-boost");
    }
    if b.bootstrap.applied && b.bootstrap.points > 0.0 {
        tags.push("bootstrap");
    }
    if b.completeness.tier == DataTier::Sparse {
        tags.push("sparse-data");
    }
    if b.signals.is_significant_change {
        tags.push("signals-updated");
    } else {
        tags.push("signals-held");
    }
    if b.momentum.trajectory > 0.0 {
        tags.push("verified-trajectory");
    }
    tags.into_iter().map(String::from).collect()
}
