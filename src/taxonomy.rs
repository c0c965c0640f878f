//! # Evidence Taxonomy
//!
//! One versioned data asset holding every curated list the scorers consult:
//! hot sectors, tier-1 investors, elite employers, and the free-text phrase
//! sets used as fallbacks when structured fields are missing.
//!
//! - Loads from JSON (`config/taxonomy.json` is embedded as the built-in).
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Aliases map alternative spellings (`a16z`, `yc`) to canonical names.
//! - Phrase sets are compiled once into word-boundary regexes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
};

use crate::error::ConfigError;

static BUILTIN: Lazy<Taxonomy> = Lazy::new(|| {
    let raw = include_str!("../config/taxonomy.json");
    Taxonomy::from_json_str(raw, "config/taxonomy.json").expect("valid built-in taxonomy")
});

/// Raw shape of the taxonomy file.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyConfig {
    pub version: String,
    #[serde(default)]
    pub hot_sectors: Vec<String>,
    #[serde(default)]
    pub tier1_investors: Vec<String>,
    #[serde(default)]
    pub elite_companies: Vec<String>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub phrases: PhraseSets,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhraseSets {
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(default)]
    pub traction: Vec<String>,
    #[serde(default)]
    pub market: Vec<String>,
    #[serde(default)]
    pub product: Vec<String>,
    #[serde(default)]
    pub vision: Vec<String>,
}

/// Which phrase set to match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseSet {
    Team,
    Traction,
    Market,
    Product,
    Vision,
}

#[derive(Debug)]
struct PhraseMatcher {
    re: Option<Regex>,
}

impl PhraseMatcher {
    fn compile(phrases: &[String]) -> Result<Self, regex::Error> {
        let alts: Vec<String> = phrases
            .iter()
            .map(|p| normalize(p))
            .filter(|p| !p.is_empty())
            .map(|p| regex::escape(&p))
            .collect();
        if alts.is_empty() {
            return Ok(Self { re: None });
        }
        let re = Regex::new(&format!(r"\b(?:{})\b", alts.join("|")))?;
        Ok(Self { re: Some(re) })
    }

    /// Distinct phrases found in already-normalized text.
    fn distinct(&self, normalized: &str) -> BTreeSet<String> {
        match &self.re {
            Some(re) => re
                .find_iter(normalized)
                .map(|m| m.as_str().to_string())
                .collect(),
            None => BTreeSet::new(),
        }
    }
}

/// Compiled taxonomy.
#[derive(Debug)]
pub struct Taxonomy {
    pub version: String,
    hot_sectors: PhraseMatcher,
    tier1_investors: BTreeSet<String>,
    elite_companies: BTreeSet<String>,
    aliases: HashMap<String, String>,
    team: PhraseMatcher,
    traction: PhraseMatcher,
    market: PhraseMatcher,
    product: PhraseMatcher,
    vision: PhraseMatcher,
}

impl Taxonomy {
    /// The embedded taxonomy shipped with the crate.
    pub fn builtin() -> &'static Taxonomy {
        &BUILTIN
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw, &path.display().to_string())
    }

    pub fn from_json_str(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        let cfg: TaxonomyConfig = serde_json::from_str(raw).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;
        Self::compile(cfg).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn compile(cfg: TaxonomyConfig) -> Result<Self, regex::Error> {
        let set = |v: &[String]| v.iter().map(|s| normalize(s)).collect::<BTreeSet<_>>();
        Ok(Self {
            version: cfg.version,
            hot_sectors: PhraseMatcher::compile(&cfg.hot_sectors)?,
            tier1_investors: set(&cfg.tier1_investors),
            elite_companies: set(&cfg.elite_companies),
            aliases: cfg
                .aliases
                .into_iter()
                .map(|(a, c)| (normalize(&a), normalize(&c)))
                .collect(),
            team: PhraseMatcher::compile(&cfg.phrases.team)?,
            traction: PhraseMatcher::compile(&cfg.phrases.traction)?,
            market: PhraseMatcher::compile(&cfg.phrases.market)?,
            product: PhraseMatcher::compile(&cfg.phrases.product)?,
            vision: PhraseMatcher::compile(&cfg.phrases.vision)?,
        })
    }

    fn canonical(&self, name: &str) -> String {
        let n = normalize(name);
        self.aliases.get(&n).cloned().unwrap_or(n)
    }

    /// A sector label is hot if it contains any hot-sector phrase as whole words.
    pub fn is_hot_sector(&self, sector: &str) -> bool {
        !self.hot_sectors.distinct(&normalize(sector)).is_empty()
    }

    pub fn hot_sectors_in_text(&self, text: &str) -> usize {
        self.hot_sectors.distinct(&normalize(text)).len()
    }

    pub fn is_tier1_investor(&self, name: &str) -> bool {
        self.tier1_investors.contains(&self.canonical(name))
    }

    /// Elite match on the canonical name, or on its first word ("Google Brain").
    pub fn is_elite_company(&self, name: &str) -> bool {
        let c = self.canonical(name);
        if self.elite_companies.contains(&c) {
            return true;
        }
        self.elite_companies
            .iter()
            .any(|e| c.starts_with(&format!("{e} ")))
    }

    pub fn count_tier1(&self, investors: &[String]) -> usize {
        investors
            .iter()
            .map(|i| self.canonical(i))
            .filter(|c| self.tier1_investors.contains(c))
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn count_elite(&self, companies: &[String]) -> usize {
        companies
            .iter()
            .filter(|c| self.is_elite_company(c))
            .map(|c| self.canonical(c))
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Number of distinct phrases from `set` found in `text`.
    pub fn phrase_hits(&self, set: PhraseSet, text: &str) -> usize {
        let m = match set {
            PhraseSet::Team => &self.team,
            PhraseSet::Traction => &self.traction,
            PhraseSet::Market => &self.market,
            PhraseSet::Product => &self.product,
            PhraseSet::Vision => &self.vision,
        };
        m.distinct(&normalize(text)).len()
    }
}

/// Lowercase, replace punctuation/dashes with spaces, collapse whitespace.
pub fn normalize(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|ch| match ch {
            '—' | '–' | '-' | '_' | '/' | '\\' | '.' | ',' | '’' | '\'' | '(' | ')' | ':'
            | ';' | '!' | '?' | '"' => ' ',
            c => c,
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
