//! Arabic text normalization for comparison.
//!
//! Pipeline, in this order:
//! 1. Whole-word spelling rewrites from the equivalence table
//! 2. Remove diacritics and tatweel
//! 3. Alef variants to plain alef
//! 4. Ta marbuta to ha, alef maqsura / ya with hamza to ya, waw with hamza to waw
//! 5. Drop characters outside the Arabic block
//! 6. Collapse whitespace
//!
//! Step 1 runs on the raw token because some written variants fold to the
//! same letters as unrelated words. Tokens are checked against the table once
//! more after folding, which keeps `normalize` idempotent.

use crate::verses::{EquivalenceClass, SpellingKind, EQUIVALENCES};
use std::borrow::Cow;

/// Superscript (dagger) alef. Kept in spelling keys, removed by folding.
const SUPERSCRIPT_ALEF: char = '\u{0670}';

/// Tatweel (kashida) elongation character.
const TATWEEL: char = '\u{0640}';

const PLAIN_ALEF: char = '\u{0627}';

/// Alef variants folded to plain alef (ا)
const ALEF_VARIANTS: &[char] = &[
    '\u{0622}', // Alef with madda (آ)
    '\u{0623}', // Alef with hamza above (أ)
    '\u{0625}', // Alef with hamza below (إ)
    '\u{0671}', // Alef wasla (ٱ)
    '\u{0672}', // Alef with wavy hamza above
    '\u{0673}', // Alef with wavy hamza below
    '\u{0675}', // High hamza alef
];

/// Ya variants folded to ya (ي)
const YA_VARIANTS: &[char] = &[
    '\u{0649}', // Alef maqsura (ى)
    '\u{0626}', // Ya with hamza above (ئ)
    '\u{06CC}', // Farsi ya (ی)
];

/// Whether `c` is a combining mark: harakat, tanween, shadda, sukun, the
/// superscript alef and the Quranic annotation signs.
#[inline]
pub fn is_diacritic(c: char) -> bool {
    matches!(
        c,
        '\u{0610}'..='\u{061A}'
            | '\u{064B}'..='\u{065F}'
            | SUPERSCRIPT_ALEF
            | '\u{06D6}'..='\u{06DC}'
            | '\u{06DF}'..='\u{06E8}'
            | '\u{06EA}'..='\u{06ED}'
    )
}

/// Arabic block: U+0600 to U+06FF
#[inline]
fn is_arabic(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

/// Normalize Arabic text for comparison.
///
/// Deterministic and idempotent: `normalize(&normalize(x)) == normalize(x)`.
/// Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let rewritten = text
        .split_whitespace()
        .map(|token| rewrite_spelling(token, EQUIVALENCES.iter()))
        .collect::<Vec<_>>()
        .join(" ");

    let folded = fold_letters(&rewritten);

    folded
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(|token| rewrite_spelling(token, EQUIVALENCES.iter()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize and split into words.
pub fn normalize_words(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Key under which a raw token is looked up in the spelling table: the token
/// without diacritics and tatweel, but keeping the superscript alef.
pub fn spelling_key(token: &str) -> String {
    token
        .chars()
        .filter(|&c| c == SUPERSCRIPT_ALEF || (!is_diacritic(c) && c != TATWEEL))
        .collect()
}

/// Replace `token` with its canonical spelling if it is a listed orthographic
/// variant in any of `classes`.
pub fn rewrite_spelling<'a, 'c, I>(token: &'a str, classes: I) -> Cow<'a, str>
where
    I: IntoIterator<Item = &'c EquivalenceClass>,
{
    let key = spelling_key(token);

    for class in classes {
        let hit = class
            .spellings
            .iter()
            .any(|s| s.kind == SpellingKind::Orthographic && s.text == key);
        if hit {
            return Cow::Borrowed(class.canonical);
        }
    }

    Cow::Borrowed(token)
}

/// Character-level folding (steps 2 to 6).
pub fn fold_letters(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_space = true; // Start true to skip leading spaces

    for c in text.chars() {
        if is_diacritic(c) || c == TATWEEL {
            continue;
        }

        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
            continue;
        }

        let folded = if ALEF_VARIANTS.contains(&c) {
            PLAIN_ALEF
        } else if YA_VARIANTS.contains(&c) {
            '\u{064A}' // Ya
        } else if c == '\u{0629}' {
            '\u{0647}' // Ta marbuta to ha
        } else if c == '\u{0624}' {
            '\u{0648}' // Waw with hamza to waw
        } else {
            c
        };

        if is_arabic(folded) {
            result.push(folded);
            last_was_space = false;
        }
    }

    // Remove trailing space
    if result.ends_with(' ') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verses::VERSES;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_reference_example() {
        let input = "ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ";
        assert_eq!(normalize(input), "الحمد لله رب العالمين");
    }

    #[test]
    fn test_normalize_basmala() {
        let input = "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ";
        assert_eq!(normalize(input), "بسم الله الرحمن الرحيم");
    }

    #[test]
    fn test_normalize_alef_variants() {
        assert_eq!(normalize("إِيَّاكَ"), "اياك");
        assert_eq!(normalize("أَنْعَمْتَ"), "انعمت");
        assert_eq!(normalize("ٱلضَّآلِّينَ"), "الضالين");
    }

    #[test]
    fn test_normalize_letter_variants() {
        assert_eq!(normalize("للة"), "لله");
        assert_eq!(normalize("على"), "علي");
        assert_eq!(normalize("شئ"), "شي");
        assert_eq!(normalize("مؤمن"), "مومن");
    }

    #[test]
    fn test_spelling_rewrites() {
        assert_eq!(normalize("صِرَٰطَ"), "صراط");
        assert_eq!(normalize("ٱلصِّرَٰطَ"), "الصراط");
        assert_eq!(normalize("صرط"), "صراط");
        assert_eq!(normalize("مَٰلِكِ"), "مالك");
        // Short reading is a distinct word and is left alone.
        assert_eq!(normalize("مَلِكِ"), "ملك");
    }

    #[test]
    fn test_strips_tatweel_and_non_arabic() {
        assert_eq!(normalize("الحـــمد"), "الحمد");
        assert_eq!(normalize("abc الحمد, 123 لله!"), "الحمد لله");
        assert_eq!(normalize("  الحمد \t\n لله  "), "الحمد لله");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("hello"), "");
    }

    #[test]
    fn test_idempotent_on_reference_text() {
        for v in &VERSES {
            let once = normalize(v.text);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_canonicals_are_fixed_points() {
        for class in EQUIVALENCES {
            assert_eq!(fold_letters(class.canonical), class.canonical);
            assert!(class.spellings.iter().all(|s| s.text != class.canonical));
        }
    }

    #[test]
    fn test_rewrite_order_is_confluent() {
        let forward: Vec<String> = VERSES
            .iter()
            .flat_map(|v| v.words())
            .map(|w| fold_letters(&rewrite_spelling(w, EQUIVALENCES.iter())))
            .collect();
        let reversed: Vec<String> = VERSES
            .iter()
            .flat_map(|v| v.words())
            .map(|w| fold_letters(&rewrite_spelling(w, EQUIVALENCES.iter().rev())))
            .collect();
        assert_eq!(forward, reversed);

        // No spelling belongs to two classes with different canonicals.
        for a in EQUIVALENCES {
            for b in EQUIVALENCES {
                if a.canonical == b.canonical {
                    continue;
                }
                for s in a.spellings {
                    assert!(b.spellings.iter().all(|t| t.text != s.text));
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(s in "[\u{0621}-\u{0655}\u{0670}\u{0671}\u{0640} a-z]{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_idempotent_on_reference_words(
            idx in 0usize..VERSES.len(),
            noise in "[\u{064B}-\u{0652}\u{0640}]{0,3}",
        ) {
            let text = format!("{}{}", VERSES[idx].text, noise);
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
