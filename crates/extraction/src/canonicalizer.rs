//! LabelCanonicalizer - maps a raw recognized label onto a canonical metric
//! name.
//!
//! Resolution order:
//! 1. direct: the normalized label starts with a canonical base, or is
//!    similar enough to it
//! 2. alias: the normalized label is similar enough to a known alias
//! 3. fallback: the cleaned label text itself
//!
//! Every candidate in a stage is scored and the best one wins, so the result
//! does not depend on dictionary iteration order. Prefix hits beat fuzzy
//! hits, longer bases beat shorter ones, then similarity, then dictionary
//! priority.

use std::cmp::Ordering;

use contracts::CanonicalizerConfig;
use tracing::trace;

use crate::dictionary::LabelDictionary;
use crate::normalize::{canonical_base, strip_diacritics, LabelNormalizer};
use crate::similarity::ratio;

/// How a label was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Direct,
    Alias,
    Fallback,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Alias => "alias",
            Self::Fallback => "fallback",
        }
    }
}

/// Resolved metric name. `name` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Canonicalized {
    pub name: String,
    pub via: MatchKind,
    /// Similarity of the winning comparison (100 for fallbacks)
    pub score: f64,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    base: String,
    aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    rank: usize,
    prefix: bool,
    base_len: usize,
    score: f64,
}

impl Candidate {
    /// Greater is better
    fn cmp_strength(&self, other: &Self) -> Ordering {
        self.prefix
            .cmp(&other.prefix)
            .then_with(|| {
                let a = if self.prefix { self.base_len } else { 0 };
                let b = if other.prefix { other.base_len } else { 0 };
                a.cmp(&b)
            })
            .then_with(|| self.score.total_cmp(&other.score))
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

/// Maps raw labels onto dictionary names
#[derive(Debug, Clone)]
pub struct LabelCanonicalizer {
    entries: Vec<Entry>,
    normalizer: LabelNormalizer,
    threshold: f64,
}

impl LabelCanonicalizer {
    pub fn new(dictionary: &LabelDictionary, normalizer: LabelNormalizer, threshold: f64) -> Self {
        let entries = dictionary
            .iter()
            .map(|(name, aliases)| Entry {
                name: name.to_string(),
                base: canonical_base(name),
                aliases: aliases
                    .iter()
                    .map(|a| strip_diacritics(a).trim().to_lowercase())
                    .filter(|a| !a.is_empty())
                    .collect(),
            })
            .collect();
        Self {
            entries,
            normalizer,
            threshold,
        }
    }

    /// Build from configuration; the dictionary priority list is applied here
    pub fn from_config(dictionary: LabelDictionary, config: &CanonicalizerConfig) -> Self {
        let dictionary = dictionary.with_priority(&config.priority);
        Self::new(
            &dictionary,
            LabelNormalizer::new(&config.stop_words),
            config.similarity_threshold,
        )
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Resolve a raw label. `None` when the label has no meaningful content.
    pub fn canonicalize(&self, raw: &str) -> Option<Canonicalized> {
        let label = self.normalizer.normalize(raw);
        if label.is_empty() {
            return None;
        }

        let resolved = self
            .direct_match(&label)
            .map(|c| self.resolved(c, MatchKind::Direct))
            .or_else(|| {
                self.alias_match(&label)
                    .map(|c| self.resolved(c, MatchKind::Alias))
            })
            .or_else(|| self.fallback(raw));

        if let Some(r) = &resolved {
            trace!(raw, normalized = %label, name = %r.name, via = r.via.as_str(), "label resolved");
        }
        resolved
    }

    fn resolved(&self, candidate: Candidate, via: MatchKind) -> Canonicalized {
        Canonicalized {
            name: self.entries[candidate.rank].name.clone(),
            via,
            score: candidate.score,
        }
    }

    fn direct_match(&self, label: &str) -> Option<Candidate> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(rank, entry)| {
                let prefix = !entry.base.is_empty() && label.starts_with(&entry.base);
                let score = ratio(label, &entry.base);
                (prefix || score >= self.threshold).then_some(Candidate {
                    rank,
                    prefix,
                    base_len: entry.base.chars().count(),
                    score,
                })
            })
            .max_by(|a, b| a.cmp_strength(b))
    }

    fn alias_match(&self, label: &str) -> Option<Candidate> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(rank, entry)| {
                entry
                    .aliases
                    .iter()
                    .map(|alias| ratio(label, alias))
                    .filter(|score| *score >= self.threshold)
                    .max_by(f64::total_cmp)
                    .map(|score| Candidate {
                        rank,
                        prefix: false,
                        base_len: 0,
                        score,
                    })
            })
            .max_by(|a, b| a.cmp_strength(b))
    }

    fn fallback(&self, raw: &str) -> Option<Canonicalized> {
        let cleaned = self.normalizer.clean(raw);
        (!cleaned.is_empty()).then(|| Canonicalized {
            name: cleaned,
            via: MatchKind::Fallback,
            score: 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonicalizer() -> LabelCanonicalizer {
        let dictionary = LabelDictionary::from_entries([
            ("Peso (kg)", vec!["peso"]),
            ("Grasa Corporal (%)", vec!["grasa corporal"]),
            ("Grasa Visceral", vec!["visceral"]),
            ("IMC", vec!["imc", "indice de masa corporal"]),
            ("Masa Muscular (kg)", vec!["musculo"]),
        ]);
        LabelCanonicalizer::from_config(dictionary, &CanonicalizerConfig::default())
    }

    #[test]
    fn test_exact_names() {
        let c = canonicalizer();
        assert_eq!(c.canonicalize("Peso").unwrap().name, "Peso (kg)");
        assert_eq!(c.canonicalize("Grasa Corporal").unwrap().name, "Grasa Corporal (%)");
        assert_eq!(c.canonicalize("IMC").unwrap().name, "IMC");
    }

    #[test]
    fn test_prefix_implies_canonical() {
        let c = canonicalizer();
        let r = c.canonicalize("Peso corporal actual").unwrap();
        assert_eq!(r.name, "Peso (kg)");
        assert_eq!(r.via, MatchKind::Direct);
    }

    #[test]
    fn test_longer_prefix_wins() {
        let dictionary = LabelDictionary::from_entries([
            ("Grasa", Vec::<&str>::new()),
            ("Grasa Visceral", Vec::<&str>::new()),
        ]);
        let c = LabelCanonicalizer::from_config(dictionary, &CanonicalizerConfig::default());
        assert_eq!(c.canonicalize("Grasa Visceral nivel").unwrap().name, "Grasa Visceral");
    }

    #[test]
    fn test_priority_breaks_ties() {
        let dictionary = LabelDictionary::from_entries([
            ("Agua (kg)", Vec::<&str>::new()),
            ("Agua (%)", Vec::<&str>::new()),
        ]);
        let mut config = CanonicalizerConfig::default();
        let c = LabelCanonicalizer::from_config(dictionary.clone(), &config);
        assert_eq!(c.canonicalize("Agua").unwrap().name, "Agua (%)");

        config.priority = vec!["Agua (kg)".to_string()];
        let c = LabelCanonicalizer::from_config(dictionary, &config);
        assert_eq!(c.canonicalize("Agua").unwrap().name, "Agua (kg)");
    }

    #[test]
    fn test_fuzzy_direct_match() {
        let c = canonicalizer();
        let r = c.canonicalize("Grasa Corpral").unwrap();
        assert_eq!(r.name, "Grasa Corporal (%)");
        assert!(r.score >= 80.0);
    }

    #[test]
    fn test_alias_match() {
        let c = canonicalizer();
        let r = c.canonicalize("Indice de masa corporal").unwrap();
        assert_eq!(r.name, "IMC");
        assert_eq!(r.via, MatchKind::Alias);
    }

    #[test]
    fn test_fallback_keeps_original_text() {
        let c = canonicalizer();
        let r = c.canonicalize("Proteína Total =").unwrap();
        assert_eq!(r.name, "Proteína Total");
        assert_eq!(r.via, MatchKind::Fallback);
    }

    #[test]
    fn test_empty_label_is_none() {
        let c = canonicalizer();
        assert!(c.canonicalize("").is_none());
        assert!(c.canonicalize("x = : ;").is_none());
        assert!(c.canonicalize("Perfil gráfico").is_none());
    }

    #[test]
    fn test_never_returns_empty_name() {
        let c = canonicalizer();
        for raw in ["a b c", "Peso", "~~~", "Agua total", "ÁÉÍ", "12 34", "kg %"] {
            if let Some(r) = c.canonicalize(raw) {
                assert!(!r.name.is_empty(), "empty name for {raw:?}");
            }
        }
    }

    #[test]
    fn test_empty_dictionary_falls_back() {
        let c = LabelCanonicalizer::from_config(
            LabelDictionary::empty(),
            &CanonicalizerConfig::default(),
        );
        assert_eq!(c.canonicalize("Masa Ósea").unwrap().name, "Masa Ósea");
    }
}
