//! Normalized edit-distance similarity between marking strings.
//!
//! Both inputs are lower-cased and stripped of all whitespace before the
//! Levenshtein distance is taken, so `"STM32 F103"` and `"stm32f103"` compare
//! as identical. The score is `1 - distance / max(len_a, len_b)` measured in
//! chars, and two empty strings score `1.0`.
//!
//! Lengths count Unicode scalar values, not UTF-16 code units, so a character
//! outside the Basic Multilingual Plane counts once. ASCII markings are unaffected.

/// Lower-cases `text` and removes every whitespace character.
pub fn normalize_marking(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Similarity in `[0, 1]` between two marking strings after normalization.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_marking(a), &normalize_marking(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_identical_strings_score_one() {
        assert_eq!(text_similarity("STM32F103C8T6", "STM32F103C8T6"), 1.0);
    }

    #[test]
    fn test_case_and_whitespace_are_ignored() {
        assert_eq!(text_similarity("STM32 F103\nC8T6", "stm32f103c8t6"), 1.0);
        assert_eq!(text_similarity("  atmega328p ", "ATMEGA 328P"), 1.0);
    }

    #[test]
    fn test_both_empty_score_one() {
        assert_eq!(text_similarity("", ""), 1.0);
        assert_eq!(text_similarity("   ", "\t"), 1.0);
    }

    #[test]
    fn test_empty_against_nonempty_scores_zero() {
        assert_eq!(text_similarity("", "X"), 0.0);
        assert_eq!(text_similarity("LM358", ""), 0.0);
    }

    #[test]
    fn test_single_substitution() {
        let score = text_similarity("STM32F103C8T6", "STM32F103C8T7");
        assert!((score - (1.0 - 1.0 / 13.0)).abs() < EPSILON);
    }

    #[test]
    fn test_insertion_uses_longer_length() {
        // "lm358" -> "lm358n": one insertion over six chars.
        let score = text_similarity("LM358", "LM358N");
        assert!((score - (1.0 - 1.0 / 6.0)).abs() < EPSILON);
    }

    #[test]
    fn test_completely_different_strings() {
        assert_eq!(text_similarity("ABC", "XYZ"), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("ATMEGA328P-PU", "ATMEGA328-PU"),
            ("NE555P", "NE556N"),
            ("", "TL072"),
            ("74HC595", "74HC59S"),
        ];

        for (a, b) in pairs {
            assert_eq!(text_similarity(a, b), text_similarity(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        let samples = ["A", "AB", "ABC123", "ZZZZZZZZZZ", "stm32", "ÄÖÜ", "1 2 3"];

        for a in samples {
            for b in samples {
                let score = text_similarity(a, b);
                assert!((0.0..=1.0).contains(&score), "{a} vs {b} -> {score}");
            }
        }
    }

    #[test]
    fn test_normalize_marking() {
        assert_eq!(normalize_marking(" TI\tLM 358 \r\n"), "tilm358");
        assert_eq!(normalize_marking(""), "");
    }

    #[test]
    fn test_multibyte_chars_count_once() {
        // One substituted char in a five-char string regardless of UTF-8 width.
        let score = text_similarity("ÄBCDE", "ABCDE");
        assert!((score - 0.8).abs() < EPSILON);
    }

    #[test]
    fn test_astral_chars_count_once() {
        // U+1D400 is two UTF-16 code units but one scalar value.
        let score = text_similarity("\u{1D400}BCD", "ABCD");
        assert!((score - 0.75).abs() < EPSILON);
    }
}
