//! Normalized Indel similarity on a 0-100 scale.

use rapidfuzz::fuzz;

/// `100 * (1 - indel(a, b) / (|a| + |b|))`, counted in chars. Two empty
/// strings are identical (100).
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert_eq!(ratio("peso", "peso"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_disjoint() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_partial() {
        // one deletion over 27 chars
        let r = ratio("grasa corporal", "grasa corpral");
        assert!((r - 2600.0 / 27.0).abs() < 1e-9);
        assert!(r >= 80.0);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // one substitution is two indel edits over 8 chars
        assert!((ratio("ósea", "osea") - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(ratio("masa osea", "masa muscular"), ratio("masa muscular", "masa osea"));
    }
}
