//! Verse matching: which reference verse (and starting word) a transcript
//! most likely belongs to.
//!
//! Stages run in strict priority order and the first confident answer wins:
//! whole-verse similarity, keyword identifiers, then a sliding-window search
//! over every verse. Iteration is ascending by verse index throughout, so the
//! first maximal score wins ties.

use crate::models::{EngineParams, MatchResult, MatchStage};
use crate::normalize::normalize;
use crate::similarity::similar_normalized;
use crate::verses::{ReferenceVerse, VERSES};
use std::collections::HashSet;
use tracing::debug;

/// Match a transcript using the default thresholds.
pub fn match_verse(transcript: &str) -> MatchResult {
    match_verse_with(transcript, &EngineParams::default())
}

/// Match a transcript against the reference verses.
pub fn match_verse_with(transcript: &str, params: &EngineParams) -> MatchResult {
    let normalized = normalize(transcript);
    let words: Vec<&str> = normalized.split_whitespace().collect();

    if words.is_empty() {
        debug!("empty transcript, no match");
        return MatchResult::none();
    }

    if let Some(result) = match_whole_verse(&normalized, params) {
        debug!(verse = ?result.verse_index, score = result.score, "whole-verse match");
        return result;
    }

    if let Some(result) = match_keywords(&words) {
        debug!(verse = ?result.verse_index, "keyword match");
        return result;
    }

    let result = match_windows(&words, params);
    debug!(
        verse = ?result.verse_index,
        word = ?result.word_index,
        score = result.score,
        "window search finished"
    );
    result
}

/// Stage 1: the whole transcript against each whole verse.
fn match_whole_verse(normalized: &str, params: &EngineParams) -> Option<MatchResult> {
    VERSES.iter().find_map(|verse| {
        let score = similar_normalized(normalized, &verse.normalized_text());
        (score > params.whole_verse_threshold)
            .then(|| MatchResult::found(verse.index, 0, score, MatchStage::WholeVerse))
    })
}

/// Stage 2: keyword identifiers. A verse matches when every token of at
/// least one of its keyword groups is present in the transcript.
fn match_keywords(words: &[&str]) -> Option<MatchResult> {
    let present: HashSet<&str> = words.iter().copied().collect();

    VERSES
        .iter()
        .find(|verse| satisfies_keywords(verse, &present))
        .map(|verse| MatchResult::found(verse.index, 0, 1.0, MatchStage::Keyword))
}

fn satisfies_keywords(verse: &ReferenceVerse, present: &HashSet<&str>) -> bool {
    verse
        .keywords
        .iter()
        .any(|group| group.iter().all(|token| present.contains(token)))
}

/// Stage 3: every window length of every verse against every transcript
/// window of the same length.
fn match_windows(words: &[&str], params: &EngineParams) -> MatchResult {
    let mut best = MatchResult::none();

    for verse in &VERSES {
        let verse_words = verse.normalized_words();

        for size in 1..=verse_words.len() {
            if size > words.len() {
                break;
            }

            for verse_start in 0..=verse_words.len() - size {
                let verse_window = verse_words[verse_start..verse_start + size].join(" ");

                for start in 0..=words.len() - size {
                    let window = words[start..start + size].join(" ");
                    let score = similar_normalized(&window, &verse_window);

                    if score > best.score {
                        best = MatchResult::found(verse.index, verse_start, score, MatchStage::Window);
                        if score > params.window_accept_threshold {
                            return best;
                        }
                    }
                }
            }
        }
    }

    if best.score > params.window_min_threshold {
        best
    } else {
        MatchResult::none()
    }
}

/// Reference words around a matched position, `window` words on each side.
pub fn context_words(verse_index: usize, word_index: usize, window: usize) -> Vec<&'static str> {
    let Some(verse) = VERSES.get(verse_index) else {
        return Vec::new();
    };

    let words = verse.words();
    let start = word_index.saturating_sub(window);
    let end = (word_index + window + 1).min(words.len());
    if start >= end {
        return Vec::new();
    }

    words[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_reference_example() {
        let result = match_verse("الحمد لله رب العالمين");
        assert_eq!(result.position(), Some((1, 0)));
        assert_eq!(result.stage, Some(MatchStage::WholeVerse));
    }

    #[test]
    fn test_match_with_diacritics() {
        let result = match_verse("ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ");
        assert_eq!(result.position(), Some((1, 0)));
    }

    #[test]
    fn test_match_common_variations() {
        assert_eq!(match_verse("الحمد للة رب العلمين").position(), Some((1, 0)));
        assert_eq!(match_verse("الحمدلله رب العالمين").position(), Some((1, 0)));
    }

    #[test]
    fn test_every_verse_matches_itself() {
        for verse in &VERSES {
            assert_eq!(
                match_verse(verse.text).position(),
                Some((verse.index, 0)),
                "verse {}",
                verse.index
            );
        }
    }

    #[test]
    fn test_keyword_stage() {
        // Partial recitation that is below the whole-verse threshold.
        let result = match_verse("رب العالمين");
        assert_eq!(result.position(), Some((1, 0)));
        assert_eq!(result.stage, Some(MatchStage::Keyword));
    }

    #[test]
    fn test_keyword_group_needs_all_tokens() {
        let words = ["صراط"];
        let present: HashSet<&str> = words.iter().copied().collect();
        assert!(!satisfies_keywords(&VERSES[6], &present));

        let words = ["صراط", "الذين"];
        let present: HashSet<&str> = words.iter().copied().collect();
        assert!(satisfies_keywords(&VERSES[6], &present));
    }

    #[test]
    fn test_window_stage_finds_offset() {
        // "رب" alone: no keyword, best window is verse 1 word 2.
        let result = match_verse("رب");
        assert_eq!(result.position(), Some((1, 2)));
        assert_eq!(result.stage, Some(MatchStage::Window));
    }

    #[test]
    fn test_near_miss_short_word_is_not_perfect() {
        // "له" is closest to "لله" but is not the reference word.
        let result = match_verse("له");
        assert_eq!(result.position(), Some((1, 1)));
        assert_eq!(result.stage, Some(MatchStage::Window));
        assert!((result.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_transcript() {
        assert_eq!(match_verse(""), MatchResult::none());
        assert_eq!(match_verse("   "), MatchResult::none());
        assert_eq!(match_verse("hello world"), MatchResult::none());
    }

    #[test]
    fn test_unrelated_text_no_match() {
        assert!(!match_verse("قل هو").is_match());
    }

    #[test]
    fn test_deterministic() {
        let a = match_verse("غير المغضوب");
        let b = match_verse("غير المغضوب");
        assert_eq!(a, b);
    }

    #[test]
    fn test_context_words() {
        let ctx = context_words(6, 4, 1);
        assert_eq!(ctx.len(), 3);
        assert!(context_words(9, 0, 2).is_empty());
        assert_eq!(context_words(2, 0, 5).len(), 2);
    }
}
