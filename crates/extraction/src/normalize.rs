//! Label text normalization.
//!
//! Recognized labels are noisy: stray punctuation, one- and two-letter
//! fragments, decorative words from the dashboard chrome. Two forms are
//! produced from a raw label:
//! - *cleaned*: letters and spaces only, short and stop tokens removed,
//!   case and accents preserved (used as the fallback metric name)
//! - *normalized*: the cleaned form with diacritics stripped, lower-cased
//!   (used for matching)

use std::collections::HashSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Tokens this short never carry meaning in a label
const MIN_TOKEN_CHARS: usize = 3;

/// Remove accents: canonical decomposition, then drop combining marks.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Base of a canonical name used for direct matching: the text before ` (`,
/// accents stripped, lower-cased.
pub fn canonical_base(name: &str) -> String {
    let head = name.split(" (").next().unwrap_or(name);
    strip_diacritics(head).to_lowercase()
}

/// Label cleaner configured with a stop-word set.
#[derive(Debug, Clone, Default)]
pub struct LabelNormalizer {
    stop_words: HashSet<String>,
}

impl LabelNormalizer {
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Letters and spaces only, short and stop tokens dropped, single-spaced.
    pub fn clean(&self, raw: &str) -> String {
        let letters: String = raw
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .collect();

        letters
            .split_whitespace()
            .filter(|token| {
                token.chars().count() >= MIN_TOKEN_CHARS
                    && !self.stop_words.contains(&token.to_lowercase())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Matching form of a label. Empty when nothing meaningful remains.
    pub fn normalize(&self, raw: &str) -> String {
        strip_diacritics(&self.clean(raw)).trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> LabelNormalizer {
        LabelNormalizer::new(["medida", "perfil", "gráfico", "grafico"])
    }

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("Índice Músculo-Ñandú"), "Indice Musculo-Nandu");
    }

    #[test]
    fn test_canonical_base() {
        assert_eq!(canonical_base("Grasa Corporal (%)"), "grasa corporal");
        assert_eq!(canonical_base("Índice"), "indice");
    }

    #[test]
    fn test_clean_keeps_case_and_accents() {
        let n = normalizer();
        assert_eq!(n.clean("Masa Ósea 3.2 kg"), "Masa Ósea");
    }

    #[test]
    fn test_clean_drops_short_and_stop_tokens() {
        let n = normalizer();
        assert_eq!(n.clean("x Perfil de Agua = Corporal"), "Agua Corporal");
        assert_eq!(n.clean("Gráfico medida"), "");
    }

    #[test]
    fn test_normalize() {
        let n = normalizer();
        assert_eq!(n.normalize("  Proteína:  Total "), "proteina total");
        assert_eq!(n.normalize("12 | ="), "");
    }
}
