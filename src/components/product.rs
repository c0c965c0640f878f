//! Product: maturity, demo, defensibility.

use super::ComponentScore;
use crate::profile::{ProductStage, StartupProfile};
use crate::taxonomy::{PhraseSet, Taxonomy};

pub const MAX: f64 = 2.0;
pub const FLOOR: f64 = 0.25;

pub(crate) fn stage_points(stage: ProductStage) -> f64 {
    match stage {
        ProductStage::Concept => 0.25,
        ProductStage::Prototype => 0.5,
        ProductStage::Beta => 0.75,
        ProductStage::Launched => 1.0,
        ProductStage::Scaling => 1.25,
    }
}

pub fn score(p: &StartupProfile, tax: &Taxonomy) -> ComponentScore {
    let f = &p.product;
    let has_structured = f.stage.is_some()
        || f.launched.is_some()
        || f.demo_available.is_some()
        || f.has_patents.is_some();

    if !has_structured {
        let hits = tax.phrase_hits(PhraseSet::Product, &p.text.corpus());
        return ComponentScore::from_text(hits, 0.3, 1.0, MAX, FLOOR);
    }

    let mut raw = 0.0;
    let mut evidence = Vec::new();

    match (f.stage, f.launched) {
        (Some(stage), _) => {
            raw += stage_points(stage);
            evidence.push(format!("product stage {stage:?}"));
        }
        (None, Some(true)) => {
            raw += 1.0;
            evidence.push("launched".to_string());
        }
        (None, Some(false)) => raw += 0.25,
        (None, None) => {}
    }
    if f.demo_available == Some(true) {
        raw += 0.25;
    }
    if f.has_patents == Some(true) {
        raw += 0.5;
        evidence.push("patents".to_string());
    }

    ComponentScore::structured(raw, MAX, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_takes_precedence_over_launched_flag() {
        let mut p = StartupProfile::default();
        p.product.stage = Some(ProductStage::Beta);
        p.product.launched = Some(true);
        assert!((score(&p, Taxonomy::builtin()).value - 0.75).abs() < 1e-9);
    }

    #[test]
    fn launched_flag_without_stage() {
        let mut p = StartupProfile::default();
        p.product.launched = Some(true);
        p.product.demo_available = Some(true);
        assert!((score(&p, Taxonomy::builtin()).value - 1.25).abs() < 1e-9);
    }
}
