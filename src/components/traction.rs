//! Traction: revenue, growth, customers, usage, retention.

use super::ComponentScore;
use crate::profile::StartupProfile;
use crate::taxonomy::{PhraseSet, Taxonomy};

pub const MAX: f64 = 3.0;
pub const FLOOR: f64 = 0.25;

pub fn score(p: &StartupProfile, tax: &Taxonomy) -> ComponentScore {
    let t = &p.traction;
    let revenue = t.annual_revenue();
    let has_structured = revenue.is_some()
        || t.revenue_growth_pct.is_some()
        || t.customers.is_some()
        || t.customer_growth_pct.is_some()
        || t.active_users.is_some()
        || t.retention_pct.is_some();

    if !has_structured {
        let hits = tax.phrase_hits(PhraseSet::Traction, &p.text.corpus());
        return ComponentScore::from_text(hits, 0.3, 1.0, MAX, FLOOR);
    }

    let mut raw = 0.0;
    let mut evidence = Vec::new();

    if let Some(rev) = revenue {
        let pts = match rev {
            r if r >= 1_000_000.0 => 1.5,
            r if r >= 100_000.0 => 1.0,
            r if r >= 10_000.0 => 0.5,
            r if r > 0.0 => 0.25,
            _ => 0.0,
        };
        raw += pts;
        evidence.push(format!("annual revenue ${rev:.0}"));
    }
    if let Some(g) = t.revenue_growth_pct {
        raw += match g {
            g if g >= 20.0 => 0.75,
            g if g >= 10.0 => 0.5,
            g if g >= 5.0 => 0.25,
            _ => 0.0,
        };
        evidence.push(format!("{g:.0}% MoM revenue growth"));
    }
    match t.customers {
        Some(c) if c >= 100 => raw += 0.5,
        Some(c) if c >= 10 => raw += 0.25,
        _ => {}
    }
    match t.active_users {
        Some(u) if u >= 10_000 => raw += 0.5,
        Some(u) if u >= 1_000 => raw += 0.25,
        _ => {}
    }
    if t.retention_pct.is_some_and(|r| r >= 80.0) {
        raw += 0.25;
        evidence.push("strong retention".to_string());
    }

    ComponentScore::structured(raw, MAX, evidence)
}
