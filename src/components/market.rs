//! Market: size, growth, and whether the sector is currently hot.

use super::ComponentScore;
use crate::profile::StartupProfile;
use crate::taxonomy::{PhraseSet, Taxonomy};

pub const MAX: f64 = 2.0;
pub const FLOOR: f64 = 0.5;

pub fn score(p: &StartupProfile, tax: &Taxonomy) -> ComponentScore {
    let m = &p.market;
    let has_structured =
        m.market_size_usd.is_some() || m.market_growth_pct.is_some() || !p.sectors.is_empty();

    if !has_structured {
        let corpus = p.text.corpus();
        let hits = tax.phrase_hits(PhraseSet::Market, &corpus) + tax.hot_sectors_in_text(&corpus);
        return ComponentScore::from_text(hits, 0.3, 1.0, MAX, FLOOR);
    }

    let mut raw = 0.0;
    let mut evidence = Vec::new();

    if let Some(size) = m.market_size_usd {
        raw += match size {
            s if s >= 10e9 => 1.0,
            s if s >= 1e9 => 0.75,
            s if s >= 100e6 => 0.5,
            s if s > 0.0 => 0.25,
            _ => 0.0,
        };
        evidence.push(format!("market size ${:.1}B", size / 1e9));
    }
    match m.market_growth_pct {
        Some(g) if g >= 20.0 => raw += 0.5,
        Some(g) if g >= 10.0 => raw += 0.25,
        _ => {}
    }
    if let Some(hot) = p.sectors.iter().find(|s| tax.is_hot_sector(s)) {
        raw += 0.5;
        evidence.push(format!("hot sector: {hot}"));
    }

    ComponentScore::structured(raw, MAX, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Basis;

    #[test]
    fn hot_sector_alone_counts() {
        let mut p = StartupProfile::default();
        p.sectors = vec!["Climate Tech".into()];
        let s = score(&p, Taxonomy::builtin());
        assert_eq!(s.basis, Basis::Structured);
        assert!((s.value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn cold_sector_with_nothing_else_is_zero() {
        let mut p = StartupProfile::default();
        p.sectors = vec!["Retail".into()];
        assert_eq!(score(&p, Taxonomy::builtin()).value, 0.0);
    }

    #[test]
    fn large_growing_market() {
        let mut p = StartupProfile::default();
        p.market.market_size_usd = Some(25e9);
        p.market.market_growth_pct = Some(12.0);
        assert!((score(&p, Taxonomy::builtin()).value - 1.25).abs() < 1e-9);
    }
}
