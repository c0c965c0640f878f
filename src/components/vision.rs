//! Vision: clarity of problem and solution, and ambition in the pitch.
//!
//! Problem/solution statements count as the structured path; tagline and
//! pitch phrases alone are the text path.

use super::ComponentScore;
use crate::profile::StartupProfile;
use crate::taxonomy::{PhraseSet, Taxonomy};

pub const MAX: f64 = 2.0;
pub const FLOOR: f64 = 0.5;

const SUBSTANTIAL_CHARS: usize = 40;

fn statement_points(s: Option<&String>) -> f64 {
    match s.map(|s| s.trim().chars().count()) {
        Some(n) if n >= SUBSTANTIAL_CHARS => 0.5,
        Some(n) if n > 0 => 0.25,
        _ => 0.0,
    }
}

pub fn score(p: &StartupProfile, tax: &Taxonomy) -> ComponentScore {
    let text = &p.text;
    let problem = statement_points(text.problem.as_ref());
    let solution = statement_points(text.solution.as_ref());
    let vision_hits = tax.phrase_hits(PhraseSet::Vision, &text.corpus());
    let tagline = text
        .tagline
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());

    if problem == 0.0 && solution == 0.0 {
        if vision_hits == 0 {
            return ComponentScore::floor(FLOOR, MAX);
        }
        let mut s = ComponentScore::from_text(vision_hits, 0.25, 0.75, MAX, FLOOR);
        if tagline {
            s.value = (s.value + 0.25).min(MAX);
        }
        return s;
    }

    let mut raw = problem + solution + (vision_hits as f64 * 0.25).min(0.75);
    if tagline {
        raw += 0.25;
    }
    let mut evidence = Vec::new();
    if problem > 0.0 {
        evidence.push("problem statement".to_string());
    }
    if solution > 0.0 {
        evidence.push("solution statement".to_string());
    }
    ComponentScore::structured(raw, MAX, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Basis;

    #[test]
    fn full_narrative_saturates() {
        let mut p = StartupProfile::default();
        p.text.tagline = Some("The operating system for clinics".into());
        p.text.problem =
            Some("Independent clinics lose a fifth of revenue to no-shows and paperwork".into());
        p.text.solution =
            Some("An AI front desk that books, reminds and bills without staff involvement".into());
        p.text.pitch = Some("Our mission: reimagine care access. The future of clinics.".into());
        let s = score(&p, Taxonomy::builtin());
        assert_eq!(s.basis, Basis::Structured);
        assert_eq!(s.value, MAX);
    }

    #[test]
    fn pitch_without_vision_language_is_floored() {
        let mut p = StartupProfile::default();
        p.text.pitch = Some("We sell shoes online.".into());
        let s = score(&p, Taxonomy::builtin());
        assert_eq!(s.basis, Basis::Floor);
        assert_eq!(s.value, FLOOR);
    }
}
