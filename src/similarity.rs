//! Phonetic-variant aware string similarity.
//!
//! The base score is the matching-block ratio `2 * M / T` used by difflib's
//! `SequenceMatcher.ratio()`: M is the number of characters in the matching
//! blocks found by repeatedly taking the longest common substring, T the total
//! length of both strings. Each input is also expanded into spellings that
//! differ only in commonly confused letters, and the best pair wins.

use crate::normalize::normalize;

/// Letters a transcriber commonly writes in place of each other.
/// Each entry substitutes one letter class at a time.
const CONFUSABLE_LETTERS: &[(char, &[char])] = &[
    ('ا', &['ى', 'آ', 'أ', 'إ']),
    ('ه', &['ة']),
    ('ي', &['ى', 'ئ']),
    ('و', &['ؤ']),
    ('س', &['ص']),
    ('ت', &['ط']),
    ('ذ', &['ز', 'ظ']),
    ('د', &['ض']),
    ('ح', &['ه']),
    ('ك', &['ق']),
];

/// Very short, very frequent particles and prepositions. A single letter off
/// costs these a large share of their ratio, so they are accepted above
/// `SHORT_WORD_THRESHOLD`. Content words do not belong here.
const SHORT_FUNCTION_WORDS: &[&str] = &[
    "في", "من", "ما", "لا", "ولا", "يا", "ان", "لم", "لن", "عن", "علي",
];

/// Acceptance threshold for short function words.
pub const SHORT_WORD_THRESHOLD: f64 = 0.7;

/// Similarity between two strings in `[0, 1]`.
///
/// Both inputs are normalized first; equal normalized forms score 1.0.
pub fn similar(a: &str, b: &str) -> f64 {
    similar_normalized(&normalize(a), &normalize(b))
}

/// Same as [`similar`] for inputs that are already normalized.
pub fn similar_normalized(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let mut best = ratio(a, b);

    let variants_a = phonetic_variants(a);
    let variants_b = phonetic_variants(b);

    for va in &variants_a {
        for vb in &variants_b {
            if va == vb {
                return 1.0;
            }
            best = best.max(ratio(va, vb));
        }
    }

    if best > SHORT_WORD_THRESHOLD && (is_short_function_word(a) || is_short_function_word(b)) {
        return 1.0;
    }

    best.clamp(0.0, 1.0)
}

/// Whether `word` (normalized) is on the short function word list.
pub fn is_short_function_word(word: &str) -> bool {
    SHORT_FUNCTION_WORDS.contains(&word)
}

/// The word itself plus one spelling per confusable substitution, in table
/// order and without duplicates.
pub fn phonetic_variants(word: &str) -> Vec<String> {
    let mut variants = vec![word.to_string()];

    for &(letter, alternatives) in CONFUSABLE_LETTERS {
        if !word.contains(letter) {
            continue;
        }
        for &alt in alternatives {
            let variant = word.replace(letter, alt.encode_utf8(&mut [0; 4]));
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
    }

    variants
}

/// Matching-block ratio between two strings, compared by character.
pub fn ratio(a: &str, b: &str) -> f64 {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();

    let total = chars_a.len() + chars_b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * count_matching_chars(&chars_a, &chars_b) as f64 / total as f64
}

/// Sum of matching block sizes.
fn count_matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = find_longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;

        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common substring of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Ties go to the earliest start in `a`, then the earliest start in `b`.
/// Returns `(a_start, b_start, size)`; size 0 means no common character.
fn find_longest_match(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let width = b_hi - b_lo + 1;
    // run[j + 1] = length of the common run ending at a[i] and b[b_lo + j]
    let mut prev = vec![0usize; width];
    let mut curr = vec![0usize; width];

    let mut best = (a_lo, b_lo, 0);

    for i in a_lo..a_hi {
        for j in b_lo..b_hi {
            let col = j - b_lo + 1;
            curr[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };

            let k = curr[col];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}
