//! Word-level mistake analysis of a transcript against one reference verse.
//!
//! The verse's [`MatchStrategy`] picks the comparison. The generic strategy
//! runs four passes over the normalized words and reports in this order:
//! positional substitutions and mispronunciations (transcript order),
//! omissions (reference order), insertions (transcript order), rhythm notes.

use crate::models::{EngineParams, Feedback, Mistake, MistakeKind, Severity};
use crate::normalize::normalize_words;
use crate::similarity::similar_normalized;
use crate::verses::{self, case_ending_confusion, is_equivalent, MatchStrategy, ReferenceVerse};
use tracing::debug;

/// Analyze a transcript against a verse using the default thresholds.
pub fn analyze(verse_index: usize, transcript: &str) -> Vec<Feedback> {
    analyze_with(verse_index, transcript, &EngineParams::default())
}

/// Analyze a transcript against a verse and return the ordered feedback list.
///
/// An index outside the reference set yields a single error item.
pub fn analyze_with(verse_index: usize, transcript: &str, params: &EngineParams) -> Vec<Feedback> {
    let Some(verse) = verses::verse(verse_index) else {
        return vec![Feedback::invalid_verse()];
    };

    let heard = normalize_words(transcript);

    let mistakes = match verse.strategy {
        MatchStrategy::Generic => generic_mistakes(verse, &heard, params),
        MatchStrategy::ExactCount => {
            if heard.len() != verse.word_count() {
                debug!(
                    verse = verse_index,
                    heard = heard.len(),
                    expected = verse.word_count(),
                    "word count mismatch"
                );
                return vec![Feedback::wrong_ayah(verse.text)];
            }
            exact_count_mistakes(verse, &heard, params)
        }
    };

    debug!(verse = verse_index, mistakes = mistakes.len(), "analysis finished");

    if mistakes.is_empty() {
        return vec![Feedback::success()];
    }

    let mut feedback: Vec<Feedback> = mistakes.into_iter().map(Feedback::from).collect();
    feedback.push(Feedback::disclaimer());
    feedback
}

/// Transcript words paired with one verse's words.
struct Comparison<'a> {
    verse: &'a ReferenceVerse,
    expected: Vec<String>,
    display: Vec<&'static str>,
    heard: &'a [String],
}

impl<'a> Comparison<'a> {
    fn new(verse: &'a ReferenceVerse, heard: &'a [String]) -> Self {
        Comparison {
            verse,
            expected: verse.normalized_words(),
            display: verse.words(),
            heard,
        }
    }

    /// Whether `word` stands for the reference word at `position`.
    fn accepts(&self, position: usize, word: &str) -> bool {
        self.expected[position] == word || is_equivalent(self.verse.index, position, word)
    }

    fn compare_word(&self, position: usize, threshold: f64) -> Option<Mistake> {
        let heard = &self.heard[position];
        if self.accepts(position, heard) {
            return None;
        }

        let expected = self.display[position];
        let score = similar_normalized(heard, &self.expected[position]);

        if score > threshold {
            Some(Mistake {
                word: expected.to_string(),
                kind: MistakeKind::Mispronunciation,
                message: format!(
                    "Word {}: expected '{}' but heard '{}'. Check the pronunciation.",
                    position + 1,
                    expected,
                    heard
                ),
                severity: Severity::Moderate,
                position,
            })
        } else {
            Some(Mistake {
                word: expected.to_string(),
                kind: MistakeKind::Substitution,
                message: format!(
                    "Word {}: expected '{}' but heard '{}'.",
                    position + 1,
                    expected,
                    heard
                ),
                severity: Severity::Critical,
                position,
            })
        }
    }
}

fn generic_mistakes(verse: &ReferenceVerse, heard: &[String], params: &EngineParams) -> Vec<Mistake> {
    let cmp = Comparison::new(verse, heard);

    let mut mistakes = positional_pass(&cmp, params);
    mistakes.extend(omission_pass(&cmp));
    mistakes.extend(insertion_pass(&cmp));
    mistakes.extend(fluency_pass(&cmp, params));
    mistakes
}

/// Pair transcript word i with reference word i. No re-alignment.
fn positional_pass(cmp: &Comparison, params: &EngineParams) -> Vec<Mistake> {
    let mut mistakes = Vec::new();
    let mut confused_at = Vec::new();

    let paired = cmp.heard.len().min(cmp.expected.len());
    for position in 0..paired {
        let heard = &cmp.heard[position];

        if let Some(confusion) = case_ending_confusion(&cmp.expected[position]) {
            if *heard == confusion.heard {
                confused_at.push(position);
                mistakes.push(Mistake {
                    word: cmp.display[position].to_string(),
                    kind: MistakeKind::Mispronunciation,
                    message: format!(
                        "Word {}: '{}' was heard as '{}': {}.",
                        position + 1,
                        cmp.display[position],
                        heard,
                        confusion.description
                    ),
                    severity: Severity::Moderate,
                    position,
                });
                continue;
            }
        }

        if let Some(mistake) = cmp.compare_word(position, params.mispronunciation_threshold) {
            mistakes.push(mistake);
        }
    }

    if confused_at.len() > 1 {
        let first = confused_at[0];
        let confusion = case_ending_confusion(&cmp.expected[first]);
        let description = confusion.map(|c| c.description).unwrap_or_default();
        let words = confused_at
            .iter()
            .map(|p| (p + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ");

        mistakes.push(Mistake {
            word: cmp.display[first].to_string(),
            kind: MistakeKind::Pattern,
            message: format!(
                "Recurring pattern: the ending of '{}' was mispronounced at words {} ({}).",
                cmp.display[first], words, description
            ),
            severity: Severity::Critical,
            position: first,
        });
    }

    mistakes
}

/// Reference words that appear nowhere in the transcript.
fn omission_pass(cmp: &Comparison) -> Vec<Mistake> {
    (0..cmp.expected.len())
        .filter(|&position| {
            let confused = case_ending_confusion(&cmp.expected[position]).map(|c| c.heard);
            !cmp
                .heard
                .iter()
                .any(|word| cmp.accepts(position, word) || Some(word.as_str()) == confused)
        })
        .map(|position| Mistake {
            word: cmp.display[position].to_string(),
            kind: MistakeKind::Omission,
            message: format!(
                "Word {} '{}' was not recited.",
                position + 1,
                cmp.display[position]
            ),
            severity: Severity::Critical,
            position,
        })
        .collect()
}

/// Transcript words past the paired range that match no reference word.
fn insertion_pass(cmp: &Comparison) -> Vec<Mistake> {
    (cmp.expected.len()..cmp.heard.len())
        .filter(|&position| {
            let word = &cmp.heard[position];
            !(0..cmp.expected.len()).any(|p| cmp.accepts(p, word))
        })
        .map(|position| Mistake {
            word: cmp.heard[position].clone(),
            kind: MistakeKind::Insertion,
            message: format!(
                "Extra word '{}' at position {} is not part of this ayah.",
                cmp.heard[position],
                position + 1
            ),
            severity: Severity::Moderate,
            position,
        })
        .collect()
}

/// Flag long gaps between consecutive exactly matching positions.
fn fluency_pass(cmp: &Comparison, params: &EngineParams) -> Vec<Mistake> {
    let paired = cmp.heard.len().min(cmp.expected.len());
    let exact: Vec<usize> = (0..paired)
        .filter(|&p| cmp.heard[p] == cmp.expected[p])
        .collect();

    exact
        .windows(2)
        .filter(|pair| pair[1] - pair[0] > params.rhythm_gap)
        .map(|pair| Mistake {
            word: cmp.display[pair[0]].to_string(),
            kind: MistakeKind::Rhythm,
            message: format!(
                "Possible break in flow after word {} '{}'. Try to keep a steady pace.",
                pair[0] + 1,
                cmp.display[pair[0]]
            ),
            severity: Severity::Minor,
            position: pair[0],
        })
        .collect()
}

/// Word counts already agree; compare each position on its own.
fn exact_count_mistakes(verse: &ReferenceVerse, heard: &[String], params: &EngineParams) -> Vec<Mistake> {
    let cmp = Comparison::new(verse, heard);

    (0..cmp.expected.len())
        .filter_map(|position| cmp.compare_word(position, params.exact_count_threshold))
        .collect()
}
