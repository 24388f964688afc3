//! Reference verses of Surah al-Fatiha and the lookup tables keyed on them.
//!
//! Everything here is immutable, process-wide data. The verse set is closed:
//! indices run from 0 (the basmala, kept as its own entry) to 6 (the closing verse).

use crate::normalize::normalize;

/// Number of reference verses.
pub const VERSE_COUNT: usize = 7;

/// Index of the closing verse.
pub const CLOSING_VERSE: usize = 6;

/// How the Mistake Analyzer compares a transcript against a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Positional pass plus omission, insertion and fluency passes.
    Generic,
    /// Word counts must agree exactly; each position is compared on its own
    /// with the relaxed `exact_count_threshold`.
    ExactCount,
}

/// One verse of the reference chapter.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceVerse {
    pub index: usize,
    /// Fully vocalized text, words separated by single spaces.
    pub text: &'static str,
    /// Keyword identifiers in normalized form. Each inner slice is a
    /// co-occurrence group: every token in it must appear in the transcript.
    pub keywords: &'static [&'static [&'static str]],
    pub strategy: MatchStrategy,
    /// Normalized word that carries a mandatory six-count elongation.
    pub madd_laazim: Option<&'static str>,
}

impl ReferenceVerse {
    /// Vocalized words in recitation order.
    pub fn words(&self) -> Vec<&'static str> {
        self.text.split_whitespace().collect()
    }

    /// Normalized words in recitation order.
    pub fn normalized_words(&self) -> Vec<String> {
        self.text.split_whitespace().map(normalize).collect()
    }

    /// Whole verse in normalized form.
    pub fn normalized_text(&self) -> String {
        normalize(self.text)
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

pub static VERSES: [ReferenceVerse; VERSE_COUNT] = [
    ReferenceVerse {
        index: 0,
        text: "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ",
        keywords: &[&["بسم"]],
        strategy: MatchStrategy::Generic,
        madd_laazim: None,
    },
    ReferenceVerse {
        index: 1,
        text: "ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ",
        keywords: &[&["الحمد"], &["العالمين"]],
        strategy: MatchStrategy::Generic,
        madd_laazim: None,
    },
    ReferenceVerse {
        index: 2,
        text: "ٱلرَّحْمَٰنِ ٱلرَّحِيمِ",
        // Both names also occur in the basmala, which is checked first.
        keywords: &[&["الرحمن", "الرحيم"]],
        strategy: MatchStrategy::ExactCount,
        madd_laazim: None,
    },
    ReferenceVerse {
        index: 3,
        text: "مَٰلِكِ يَوْمِ ٱلدِّينِ",
        keywords: &[&["مالك"], &["ملك"], &["يوم"], &["الدين"]],
        strategy: MatchStrategy::Generic,
        madd_laazim: None,
    },
    ReferenceVerse {
        index: 4,
        text: "إِيَّاكَ نَعْبُدُ وَإِيَّاكَ نَسْتَعِينُ",
        keywords: &[&["نعبد"], &["نستعين"], &["واياك"]],
        strategy: MatchStrategy::Generic,
        madd_laazim: None,
    },
    ReferenceVerse {
        index: 5,
        text: "ٱهْدِنَا ٱلصِّرَٰطَ ٱلْمُسْتَقِيمَ",
        keywords: &[&["اهدنا"], &["المستقيم"], &["الصراط"]],
        strategy: MatchStrategy::Generic,
        madd_laazim: None,
    },
    ReferenceVerse {
        index: 6,
        text: "صِرَٰطَ ٱلَّذِينَ أَنْعَمْتَ عَلَيْهِمْ غَيْرِ ٱلْمَغْضُوبِ عَلَيْهِمْ وَلَا ٱلضَّآلِّينَ",
        // A bare "صراط" is a frequent mis-hearing of verse 5's "الصراط",
        // so it only counts together with the relative pronoun.
        keywords: &[
            &["انعمت"],
            &["عليهم"],
            &["المغضوب"],
            &["الضالين"],
            &["صراط", "الذين"],
        ],
        strategy: MatchStrategy::Generic,
        madd_laazim: Some("الضالين"),
    },
];

/// Look up a verse by zero-based index.
pub fn verse(index: usize) -> Option<&'static ReferenceVerse> {
    VERSES.get(index)
}

/// Analyzer strategy for a verse, or `None` outside the closed set.
pub fn match_strategy(index: usize) -> Option<MatchStrategy> {
    verse(index).map(|v| v.strategy)
}

/// How a listed spelling relates to its canonical word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellingKind {
    /// Written variant of the same word; the normalizer rewrites it to the
    /// canonical spelling.
    Orthographic,
    /// Distinct but valid reading; the normalizer leaves it alone and the
    /// analyzer accepts it at this position without a mistake.
    Accepted,
}

#[derive(Debug, Clone, Copy)]
pub struct Spelling {
    /// Orthographic spellings are written with diacritics removed except the
    /// superscript alef (U+0670), which is what tells them apart from
    /// unrelated words.
    pub text: &'static str,
    pub kind: SpellingKind,
}

/// All spellings that stand for the reference word at `(verse, position)`.
#[derive(Debug, Clone, Copy)]
pub struct EquivalenceClass {
    pub verse: usize,
    pub position: usize,
    /// Normalized canonical spelling.
    pub canonical: &'static str,
    pub spellings: &'static [Spelling],
}

const fn ortho(text: &'static str) -> Spelling {
    Spelling {
        text,
        kind: SpellingKind::Orthographic,
    }
}

const fn accepted(text: &'static str) -> Spelling {
    Spelling {
        text,
        kind: SpellingKind::Accepted,
    }
}

pub const EQUIVALENCES: &[EquivalenceClass] = &[
    EquivalenceClass {
        verse: 1,
        position: 3,
        canonical: "العالمين",
        spellings: &[
            ortho("\u{0671}لع\u{0670}لمين"),
            ortho("الع\u{0670}لمين"),
            accepted("العلمين"),
        ],
    },
    EquivalenceClass {
        verse: 3,
        position: 0,
        canonical: "مالك",
        // "ملك" is also an unrelated word, so only the superscript-alef
        // spelling is rewritten; the short reading is accepted in place.
        spellings: &[ortho("م\u{0670}لك"), accepted("ملك")],
    },
    EquivalenceClass {
        verse: 5,
        position: 1,
        canonical: "الصراط",
        spellings: &[
            ortho("\u{0671}لصر\u{0670}ط"),
            ortho("الصر\u{0670}ط"),
            ortho("الصرط"),
            accepted("السراط"),
        ],
    },
    EquivalenceClass {
        verse: 6,
        position: 0,
        canonical: "صراط",
        spellings: &[ortho("صر\u{0670}ط"), ortho("صرط"), accepted("سراط")],
    },
];

/// Whether `word` (normalized) is an accepted spelling of the reference word
/// at `(verse, position)`.
pub fn is_equivalent(verse: usize, position: usize, word: &str) -> bool {
    EQUIVALENCES
        .iter()
        .filter(|class| class.verse == verse && class.position == position)
        .any(|class| {
            class.canonical == word
                || class
                    .spellings
                    .iter()
                    .any(|spelling| normalize(spelling.text) == word)
        })
}

/// A recurring case-ending mis-hearing on a specific word.
#[derive(Debug, Clone, Copy)]
pub struct CaseEndingConfusion {
    /// Normalized reference word.
    pub word: &'static str,
    /// Normalized form the transcriber produces instead.
    pub heard: &'static str,
    pub description: &'static str,
}

pub const CASE_ENDING_CONFUSIONS: &[CaseEndingConfusion] = &[CaseEndingConfusion {
    word: "عليهم",
    heard: "عليهمو",
    description: "the silent final meem (sukun) was voiced with a damma",
}];

/// Confusion entry for a reference word, if it has one.
pub fn case_ending_confusion(word: &str) -> Option<&'static CaseEndingConfusion> {
    CASE_ENDING_CONFUSIONS.iter().find(|c| c.word == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_set_is_closed() {
        assert_eq!(VERSES.len(), VERSE_COUNT);
        for (i, v) in VERSES.iter().enumerate() {
            assert_eq!(v.index, i);
        }
        assert!(verse(VERSE_COUNT).is_none());
        assert!(match_strategy(42).is_none());
    }

    #[test]
    fn test_word_counts() {
        let counts: Vec<usize> = VERSES.iter().map(|v| v.word_count()).collect();
        assert_eq!(counts, vec![4, 4, 2, 3, 4, 3, 9]);
    }

    #[test]
    fn test_keywords_are_normalized() {
        for v in &VERSES {
            for group in v.keywords {
                assert!(!group.is_empty());
                for token in *group {
                    assert_eq!(normalize(token), *token, "verse {} keyword", v.index);
                }
            }
        }
    }

    #[test]
    fn test_only_two_word_verse_is_exact_count() {
        for v in &VERSES {
            let expected = if v.word_count() == 2 {
                MatchStrategy::ExactCount
            } else {
                MatchStrategy::Generic
            };
            assert_eq!(v.strategy, expected);
        }
    }

    #[test]
    fn test_equivalence_canonicals_match_reference_words() {
        for class in EQUIVALENCES {
            let words = VERSES[class.verse].normalized_words();
            assert_eq!(words[class.position], class.canonical);
        }
    }

    #[test]
    fn test_closing_verse_madd_word_present() {
        let closing = &VERSES[CLOSING_VERSE];
        let word = closing.madd_laazim.unwrap();
        assert!(closing.normalized_words().iter().any(|w| w == word));
        assert!(VERSES[..CLOSING_VERSE].iter().all(|v| v.madd_laazim.is_none()));
    }

    #[test]
    fn test_is_equivalent() {
        assert!(is_equivalent(3, 0, "ملك"));
        assert!(is_equivalent(3, 0, "مالك"));
        assert!(!is_equivalent(3, 1, "ملك"));
        assert!(is_equivalent(5, 1, "السراط"));
        assert!(is_equivalent(1, 3, "العلمين"));
    }

    #[test]
    fn test_case_ending_confusion_word_recurs() {
        for confusion in CASE_ENDING_CONFUSIONS {
            let occurrences: usize = VERSES
                .iter()
                .map(|v| {
                    v.normalized_words()
                        .iter()
                        .filter(|w| *w == confusion.word)
                        .count()
                })
                .sum();
            assert!(occurrences > 1);
            assert_eq!(normalize(confusion.heard), confusion.heard);
        }
    }
}
