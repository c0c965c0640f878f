//! Team: founder count, technical depth, exits, pedigree, experience.

use super::ComponentScore;
use crate::profile::StartupProfile;
use crate::taxonomy::{PhraseSet, Taxonomy};

pub const MAX: f64 = 3.0;
pub const FLOOR: f64 = 0.5;

pub fn score(p: &StartupProfile, tax: &Taxonomy) -> ComponentScore {
    let t = &p.team;
    let has_structured = t.founders_count.is_some()
        || t.team_size.is_some()
        || t.technical_cofounder.is_some()
        || t.prior_exits.is_some()
        || t.years_experience.is_some()
        || !t.founder_backgrounds.is_empty();

    if !has_structured {
        let hits = tax.phrase_hits(PhraseSet::Team, &p.text.corpus());
        return ComponentScore::from_text(hits, 0.4, 1.5, MAX, FLOOR);
    }

    let mut raw = 0.0;
    let mut evidence = Vec::new();

    if t.founders_count.is_some_and(|n| n >= 2) {
        raw += 0.5;
        evidence.push("multiple founders".to_string());
    }
    if t.technical_cofounder == Some(true) {
        raw += 0.5;
        evidence.push("technical cofounder".to_string());
    }
    match t.prior_exits {
        Some(n) if n >= 2 => {
            raw += 1.0;
            evidence.push(format!("{n} prior exits"));
        }
        Some(1) => {
            raw += 0.75;
            evidence.push("1 prior exit".to_string());
        }
        _ => {}
    }
    let elite = tax.count_elite(&t.founder_backgrounds);
    if elite > 0 {
        raw += elite.min(2) as f64 * 0.5;
        evidence.push(format!("{elite} elite employer background(s)"));
    }
    match t.years_experience {
        Some(y) if y >= 10.0 => raw += 0.5,
        Some(y) if y >= 5.0 => raw += 0.25,
        _ => {}
    }
    if t.team_size.is_some_and(|n| n >= 5) {
        raw += 0.25;
    }

    ComponentScore::structured(raw, MAX, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Basis;

    #[test]
    fn text_fallback_when_no_team_fields() {
        let mut p = StartupProfile::default();
        p.text.pitch = Some("Founded by a serial entrepreneur with a PhD in robotics".into());
        let s = score(&p, Taxonomy::builtin());
        assert_eq!(s.basis, Basis::Text);
        assert!((s.value - 0.8).abs() < 1e-9);
    }

    #[test]
    fn solo_founder_with_data_is_not_floored() {
        let mut p = StartupProfile::default();
        p.team.founders_count = Some(1);
        let s = score(&p, Taxonomy::builtin());
        assert_eq!(s.basis, Basis::Structured);
        assert_eq!(s.value, 0.0);
    }

    #[test]
    fn exits_and_pedigree_add_up() {
        let mut p = StartupProfile::default();
        p.team.founders_count = Some(2);
        p.team.technical_cofounder = Some(true);
        p.team.prior_exits = Some(1);
        p.team.founder_backgrounds = vec!["ex-Stripe".into(), "Acme".into()];
        let s = score(&p, Taxonomy::builtin());
        // "ex-Stripe" normalizes to "ex stripe", which is not an elite name.
        assert!((s.value - 1.75).abs() < 1e-9, "{}", s.value);
    }
}
