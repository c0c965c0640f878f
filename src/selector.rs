//! # Candidate Selector
//! Anchor-then-fill selection of five visible matches from a scored pool,
//! plus a blurred preview of what was left out.
//!
//! Anchors, in strict order: best overall, first exact stage match, first
//! sector overlap, then fill by score. Every step only takes candidates not
//! already used, so the visible and hidden lists never share an id.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::{Stage, StartupProfile};
use crate::result::ScoreResult;

pub const VISIBLE_SLOTS: usize = 5;
pub const HIDDEN_PREVIEW_MAX: usize = 10;
/// Activity within this many days earns a "recently active" bullet.
const RECENT_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirmType {
    Vc,
    Angel,
    Accelerator,
    Corporate,
    FamilyOffice,
    #[default]
    Other,
}

/// One counterparty in a subject's pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub counterparty_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub firm_type: FirmType,
    /// Composite fit, 0–100.
    pub fit_score: f64,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    /// Typical minimum GOD score this counterparty engages with.
    #[serde(default)]
    pub quality_bar: Option<f64>,
}

/// What the selector needs to know about the subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSubject {
    pub subject_id: String,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub sectors: Vec<String>,
    /// The subject's GOD score.
    #[serde(default)]
    pub score: f64,
}

impl SelectionSubject {
    pub fn from_result(profile: &StartupProfile, result: &ScoreResult) -> Self {
        Self {
            subject_id: result.subject_id.clone(),
            stage: profile.stage,
            sectors: profile.sectors.clone(),
            score: result.total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorReason {
    BestOverall,
    StageMatch,
    SectorOverlap,
    ScoreFill,
}

/// Coarse fit band; the only fit information the hidden preview exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitBand {
    Exploratory,
    Good,
    Strong,
    Exceptional,
}

impl FitBand {
    pub fn from_score(fit: f64) -> Self {
        if fit >= 85.0 {
            FitBand::Exceptional
        } else if fit >= 70.0 {
            FitBand::Strong
        } else if fit >= 50.0 {
            FitBand::Good
        } else {
            FitBand::Exploratory
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FitBand::Exceptional => "Exceptional fit",
            FitBand::Strong => "Strong fit",
            FitBand::Good => "Good fit",
            FitBand::Exploratory => "Worth exploring",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleMatch {
    pub counterparty_id: String,
    pub name: String,
    pub firm_type: FirmType,
    pub fit_score: f64,
    pub fit_label: String,
    pub anchor: AnchorReason,
    pub why: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenPreview {
    /// Opaque per-subject token; not reversible to the counterparty id.
    pub preview_token: String,
    pub firm_type: FirmType,
    pub primary_sector: Option<String>,
    pub fit_band: FitBand,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub visible: Vec<VisibleMatch>,
    pub hidden_preview: Vec<HiddenPreview>,
    /// Every candidate left out of the visible list, previewed or not.
    pub hidden_total: usize,
}

fn stage_label(s: Stage) -> &'static str {
    match s {
        Stage::Idea => "idea",
        Stage::PreSeed => "pre-seed",
        Stage::Seed => "seed",
        Stage::SeriesA => "Series A",
        Stage::SeriesB => "Series B",
        Stage::Growth => "growth",
    }
}

fn norm_sector(s: &str) -> String {
    s.trim().to_lowercase()
}

fn shared_sectors(subject: &SelectionSubject, c: &Candidate) -> Vec<String> {
    let theirs: HashSet<String> = c.sectors.iter().map(|s| norm_sector(s)).collect();
    let mut seen = HashSet::new();
    subject
        .sectors
        .iter()
        .map(|s| norm_sector(s))
        .filter(|s| !s.is_empty() && theirs.contains(s) && seen.insert(s.clone()))
        .collect()
}

fn stage_match(subject: &SelectionSubject, c: &Candidate) -> bool {
    subject.stage.is_some_and(|s| c.stages.contains(&s))
}

fn preview_token(subject_id: &str, counterparty_id: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(subject_id.as_bytes());
    hasher.update(b":");
    hasher.update(counterparty_id.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Whether a fit score is usable for ranking.
pub fn valid_fit(fit_score: f64) -> bool {
    (0.0..=100.0).contains(&fit_score)
}

/// Fit desc, then fresher activity, then id asc; first occurrence of an id wins.
/// Candidates with a fit outside [0, 100] (or NaN) are dropped.
fn rank(pool: &[Candidate]) -> Vec<&Candidate> {
    let mut sorted: Vec<&Candidate> = pool.iter().filter(|c| valid_fit(c.fit_score)).collect();
    sorted.sort_by(|a, b| {
        b.fit_score
            .total_cmp(&a.fit_score)
            .then_with(|| b.last_active.cmp(&a.last_active))
            .then_with(|| a.counterparty_id.cmp(&b.counterparty_id))
    });
    let mut seen = HashSet::new();
    sorted.retain(|c| seen.insert(c.counterparty_id.clone()));
    sorted
}

fn why_bullets(
    subject: &SelectionSubject,
    c: &Candidate,
    anchor: AnchorReason,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut why = Vec::new();
    why.push(
        match anchor {
            AnchorReason::BestOverall => "Highest overall fit in your pool",
            AnchorReason::StageMatch => "Best match for your stage",
            AnchorReason::SectorOverlap => "Best match for your sector",
            AnchorReason::ScoreFill => "Strong overall fit",
        }
        .to_string(),
    );
    if let Some(stage) = subject.stage.filter(|_| stage_match(subject, c)) {
        why.push(format!("Invests at {} stage", stage_label(stage)));
    }
    let shared = shared_sectors(subject, c);
    if !shared.is_empty() {
        why.push(format!("Shared focus: {}", shared.join(", ")));
    }
    if c
        .last_active
        .is_some_and(|t| t <= now && now - t <= Duration::days(RECENT_DAYS))
    {
        why.push(format!("Active in the last {RECENT_DAYS} days"));
    }
    if let Some(bar) = c.quality_bar {
        if subject.score >= bar {
            why.push(format!(
                "Your score {:.0} clears their usual bar of {bar:.0}",
                subject.score
            ));
        } else {
            why.push(format!(
                "Your score {:.0} is below their usual bar of {bar:.0}",
                subject.score
            ));
        }
    }
    why
}

pub fn select(subject: &SelectionSubject, pool: &[Candidate], now: DateTime<Utc>) -> SelectionResult {
    let ranked = rank(pool);
    let mut used = vec![false; ranked.len()];
    let mut picks: Vec<(usize, AnchorReason)> = Vec::with_capacity(VISIBLE_SLOTS);

    let mut take_first = |pred: &dyn Fn(&Candidate) -> bool, reason: AnchorReason| {
        if picks.len() >= VISIBLE_SLOTS {
            return;
        }
        if let Some(i) = (0..ranked.len()).find(|&i| !used[i] && pred(ranked[i])) {
            used[i] = true;
            picks.push((i, reason));
        }
    };

    take_first(&|_: &Candidate| true, AnchorReason::BestOverall);
    take_first(
        &|c: &Candidate| stage_match(subject, c),
        AnchorReason::StageMatch,
    );
    take_first(
        &|c: &Candidate| !shared_sectors(subject, c).is_empty(),
        AnchorReason::SectorOverlap,
    );
    for _ in 0..VISIBLE_SLOTS {
        take_first(&|_: &Candidate| true, AnchorReason::ScoreFill);
    }

    let visible = picks
        .iter()
        .map(|&(i, anchor)| {
            let c = ranked[i];
            VisibleMatch {
                counterparty_id: c.counterparty_id.clone(),
                name: c.name.clone(),
                firm_type: c.firm_type,
                fit_score: c.fit_score,
                fit_label: FitBand::from_score(c.fit_score).label().to_string(),
                anchor,
                why: why_bullets(subject, c, anchor, now),
            }
        })
        .collect();

    let unused: Vec<&Candidate> = ranked
        .iter()
        .zip(&used)
        .filter(|(_, u)| !**u)
        .map(|(c, _)| *c)
        .collect();

    let hidden_preview = unused
        .iter()
        .take(HIDDEN_PREVIEW_MAX)
        .map(|c| HiddenPreview {
            preview_token: preview_token(&subject.subject_id, &c.counterparty_id),
            firm_type: c.firm_type,
            primary_sector: c.sectors.first().map(|s| norm_sector(s)),
            fit_band: FitBand::from_score(c.fit_score),
        })
        .collect();

    SelectionResult {
        visible,
        hidden_preview,
        hidden_total: unused.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(id: &str, fit: f64, stages: &[Stage], sectors: &[&str]) -> Candidate {
        Candidate {
            counterparty_id: id.into(),
            name: id.to_uppercase(),
            firm_type: FirmType::Vc,
            fit_score: fit,
            stages: stages.to_vec(),
            sectors: sectors.iter().map(|s| s.to_string()).collect(),
            last_active: None,
            quality_bar: None,
        }
    }

    fn subject() -> SelectionSubject {
        SelectionSubject {
            subject_id: "s1".into(),
            stage: Some(Stage::Seed),
            sectors: vec!["Fintech".into()],
            score: 64.0,
        }
    }

    #[test]
    fn anchors_pull_stage_and_sector_ahead_of_score() {
        let pool = vec![
            cand("a", 95.0, &[Stage::Growth], &["biotech"]),
            cand("b", 90.0, &[Stage::Growth], &["biotech"]),
            cand("c", 85.0, &[Stage::Growth], &["biotech"]),
            cand("d", 80.0, &[Stage::Growth], &["biotech"]),
            cand("e", 75.0, &[Stage::Growth], &["biotech"]),
            cand("stage", 40.0, &[Stage::Seed], &["biotech"]),
            cand("sector", 30.0, &[Stage::Growth], &[" FINTECH "]),
        ];
        let out = select(&subject(), &pool, Utc::now());
        let ids: Vec<&str> = out.visible.iter().map(|v| v.counterparty_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "stage", "sector", "b", "c"]);
        assert_eq!(out.visible[1].anchor, AnchorReason::StageMatch);
        assert_eq!(out.visible[2].anchor, AnchorReason::SectorOverlap);
        assert_eq!(out.hidden_total, 2);
        assert_eq!(out.hidden_preview.len(), 2);
    }

    #[test]
    fn ties_prefer_fresher_then_id() {
        let now = Utc::now();
        let mut old = cand("a", 50.0, &[], &[]);
        old.last_active = Some(now - Duration::days(90));
        let mut fresh = cand("z", 50.0, &[], &[]);
        fresh.last_active = Some(now - Duration::days(1));
        let plain_b = cand("b", 50.0, &[], &[]);
        let plain_c = cand("c", 50.0, &[], &[]);
        let out = select(&subject(), &[plain_c, old, plain_b, fresh], now);
        let ids: Vec<&str> = out.visible.iter().map(|v| v.counterparty_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "b", "c"]);
        assert!(out.visible[0].why.iter().any(|w| w.contains("Active")));
    }

    #[test]
    fn duplicates_collapse_to_best_entry() {
        let pool = vec![
            cand("a", 30.0, &[], &[]),
            cand("a", 70.0, &[], &[]),
            cand("b", 60.0, &[], &[]),
        ];
        let out = select(&subject(), &pool, Utc::now());
        assert_eq!(out.visible.len(), 2);
        assert_eq!(out.visible[0].fit_score, 70.0);
        assert_eq!(out.hidden_total, 0);
    }

    #[test]
    fn empty_pool_is_not_an_error() {
        let out = select(&subject(), &[], Utc::now());
        assert!(out.visible.is_empty());
        assert_eq!(out.hidden_total, 0);
    }

    #[test]
    fn hidden_preview_is_bounded_and_opaque() {
        let pool: Vec<Candidate> = (0..30)
            .map(|i| cand(&format!("c{i:02}"), 100.0 - i as f64, &[], &["ai"]))
            .collect();
        let out = select(&subject(), &pool, Utc::now());
        assert_eq!(out.visible.len(), VISIBLE_SLOTS);
        assert_eq!(out.hidden_preview.len(), HIDDEN_PREVIEW_MAX);
        assert_eq!(out.hidden_total, 25);
        for p in &out.hidden_preview {
            assert_eq!(p.preview_token.len(), 16);
            assert!(pool.iter().all(|c| c.counterparty_id != p.preview_token));
        }
    }

    #[test]
    fn quality_bar_bullet() {
        let mut c = cand("a", 80.0, &[Stage::Seed], &["fintech"]);
        c.quality_bar = Some(70.0);
        let out = select(&subject(), &[c], Utc::now());
        let why = &out.visible[0].why;
        assert!(why.iter().any(|w| w.contains("below their usual bar of 70")));
        assert!(why.iter().any(|w| w == "Invests at seed stage"));
        assert!(why.iter().any(|w| w == "Shared focus: fintech"));
    }

    #[test]
    fn out_of_range_fits_are_dropped() {
        let pool = vec![
            cand("ok", 60.0, &[], &[]),
            cand("huge", 250.0, &[], &[]),
            cand("neg", -1.0, &[], &[]),
            cand("nan", f64::NAN, &[], &[]),
        ];
        let out = select(&subject(), &pool, Utc::now());
        let ids: Vec<&str> = out.visible.iter().map(|v| v.counterparty_id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
        assert_eq!(out.hidden_total, 0);
    }
}
