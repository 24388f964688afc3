//! Duration-based elongation (Madd) checks.
//!
//! Per-word timing is a proportional estimate: each word gets a share of the
//! total audio duration equal to its share of normalized characters. There is
//! no acoustic alignment behind it, so the thresholds in [`EngineParams`] are
//! heuristics.

use crate::models::{DurationVerdict, ElongationAssessment, EngineParams, MaddRule};
use crate::normalize::normalize;
use crate::verses;
use tracing::debug;

/// Letters that carry a natural elongation.
pub const MADD_LETTERS: [char; 3] = ['ا', 'و', 'ي'];

/// Letter held for six counts in the closing verse.
const MADD_LAAZIM_LETTER: char = 'ا';

/// Assess elongations using the default thresholds.
pub fn assess_elongation<S: AsRef<str>>(
    verse_index: usize,
    words: &[S],
    audio_duration_seconds: f64,
) -> Vec<ElongationAssessment> {
    assess_elongation_with(verse_index, words, audio_duration_seconds, &EngineParams::default())
}

/// Assess elongations for the recited `words` of a verse.
///
/// A duration that is negative or not finite is treated as the 0.0
/// "unavailable" sentinel, which lands every check in the too-short branch.
/// An index outside the reference set yields no assessments.
pub fn assess_elongation_with<S: AsRef<str>>(
    verse_index: usize,
    words: &[S],
    audio_duration_seconds: f64,
    params: &EngineParams,
) -> Vec<ElongationAssessment> {
    let Some(verse) = verses::verse(verse_index) else {
        return Vec::new();
    };

    let normalized: Vec<String> = words.iter().map(|w| normalize(w.as_ref())).collect();
    let durations = estimate_word_durations(&normalized, audio_duration_seconds);

    match verse.madd_laazim {
        Some(target) => {
            let Some(index) = normalized.iter().position(|w| w == target) else {
                debug!(verse = verse_index, "madd laazim word not recited, skipping");
                return Vec::new();
            };
            vec![assess_laazim(&normalized[index], durations[index], params)]
        }
        None => normalized
            .iter()
            .zip(&durations)
            .flat_map(|(word, &seconds)| {
                word.chars()
                    .filter(|c| MADD_LETTERS.contains(c))
                    .map(move |letter| assess_asli(word, letter, seconds, params))
            })
            .collect(),
    }
}

/// Split `total_seconds` across words in proportion to their character count.
pub fn estimate_word_durations(normalized_words: &[String], total_seconds: f64) -> Vec<f64> {
    let total = if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds
    } else {
        0.0
    };

    let lengths: Vec<usize> = normalized_words.iter().map(|w| w.chars().count()).collect();
    let sum: usize = lengths.iter().sum();

    if sum == 0 {
        return vec![0.0; lengths.len()];
    }

    lengths
        .iter()
        .map(|&len| total * len as f64 / sum as f64)
        .collect()
}

fn classify(seconds: f64, min: f64, max: f64) -> DurationVerdict {
    if seconds < min {
        DurationVerdict::TooShort
    } else if seconds > max {
        DurationVerdict::TooLong
    } else {
        DurationVerdict::Correct
    }
}

fn assess_asli(word: &str, letter: char, seconds: f64, params: &EngineParams) -> ElongationAssessment {
    let verdict = classify(seconds, params.madd_asli_min, params.madd_asli_max);
    let message = match verdict {
        DurationVerdict::Correct => format!(
            "✅ Madd Asli on '{}' in '{}' held for about {:.2}s.",
            letter, word, seconds
        ),
        _ => format!(
            "⚠️ Madd Asli on '{}' in '{}' is {} ({:.2}s, expected {:.1}-{:.1}s, two counts).",
            letter, word, verdict, seconds, params.madd_asli_min, params.madd_asli_max
        ),
    };

    ElongationAssessment {
        word: word.to_string(),
        letter,
        rule: MaddRule::Asli,
        detected: verdict == DurationVerdict::Correct,
        verdict,
        estimated_seconds: seconds,
        message,
    }
}

fn assess_laazim(word: &str, seconds: f64, params: &EngineParams) -> ElongationAssessment {
    let verdict = classify(seconds, params.madd_laazim_min, params.madd_laazim_max);
    let message = format!(
        "Madd Laazim in '{}' must be stretched for six counts ({:.1}-{:.1}s). \
         Estimated {:.2}s: {}.",
        word, params.madd_laazim_min, params.madd_laazim_max, seconds, verdict
    );

    ElongationAssessment {
        word: word.to_string(),
        letter: MADD_LAAZIM_LETTER,
        rule: MaddRule::Laazim,
        detected: verdict == DurationVerdict::Correct,
        verdict,
        estimated_seconds: seconds,
        message,
    }
}
