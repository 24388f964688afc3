//! Data structures for the recitation verification pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// How serious a detected mistake is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Critical,
}

/// Class of a word-level mistake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeKind {
    Substitution,
    Mispronunciation,
    Omission,
    Insertion,
    Rhythm,
    Pattern,
}

/// Kind of an externally visible feedback item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Substitution,
    Mispronunciation,
    Omission,
    Insertion,
    Rhythm,
    Pattern,
    Success,
    Disclaimer,
    Error,
    WrongAyah,
    NoMatch,
}

impl From<MistakeKind> for FeedbackKind {
    fn from(kind: MistakeKind) -> Self {
        match kind {
            MistakeKind::Substitution => FeedbackKind::Substitution,
            MistakeKind::Mispronunciation => FeedbackKind::Mispronunciation,
            MistakeKind::Omission => FeedbackKind::Omission,
            MistakeKind::Insertion => FeedbackKind::Insertion,
            MistakeKind::Rhythm => FeedbackKind::Rhythm,
            MistakeKind::Pattern => FeedbackKind::Pattern,
        }
    }
}

impl FeedbackKind {
    /// Whether this item reports a mistake (as opposed to a status note).
    pub fn is_mistake(self) -> bool {
        !matches!(
            self,
            FeedbackKind::Success
                | FeedbackKind::Disclaimer
                | FeedbackKind::Error
                | FeedbackKind::WrongAyah
                | FeedbackKind::NoMatch
        )
    }
}

/// A word-level discrepancy between transcript and reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mistake {
    pub word: String,
    pub kind: MistakeKind,
    pub message: String,
    pub severity: Severity,
    pub position: usize, // Reference position for omissions, transcript position otherwise
}

pub const SUCCESS_MESSAGE: &str = "✅ Recitation matches the reference text. Note: detailed Tajweed rules \
     like Ghunnah, Qalqalah and Idghaam are not verified automatically.";

pub const DISCLAIMER_MESSAGE: &str = "ℹ️ Note: this tool only verifies word presence, order and \
     pronunciation. Detailed Tajweed rules require a qualified Quran instructor.";

pub const INVALID_VERSE_MESSAGE: &str = "⚠️ Invalid ayah number.";

pub const NO_MATCH_MESSAGE: &str = "⚠️ Could not match the recitation to any ayah of al-Fatiha. \
     Please try again, reciting clearly.";

/// One entry of the ordered feedback list shown to the reciter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
}

impl Feedback {
    fn note(kind: FeedbackKind, message: impl Into<String>) -> Self {
        Feedback {
            kind,
            message: message.into(),
            severity: None,
            position: None,
            word: None,
        }
    }

    pub fn success() -> Self {
        Self::note(FeedbackKind::Success, SUCCESS_MESSAGE)
    }

    pub fn disclaimer() -> Self {
        Self::note(FeedbackKind::Disclaimer, DISCLAIMER_MESSAGE)
    }

    pub fn invalid_verse() -> Self {
        Self::note(FeedbackKind::Error, INVALID_VERSE_MESSAGE)
    }

    pub fn no_match() -> Self {
        Self::note(FeedbackKind::NoMatch, NO_MATCH_MESSAGE)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::note(FeedbackKind::Error, message)
    }

    pub fn wrong_ayah(expected: &str) -> Self {
        Self::note(
            FeedbackKind::WrongAyah,
            format!("⚠️ This ayah has only two words. Please recite only: {}", expected),
        )
    }
}

impl From<Mistake> for Feedback {
    fn from(mistake: Mistake) -> Self {
        Feedback {
            kind: mistake.kind.into(),
            message: mistake.message,
            severity: Some(mistake.severity),
            position: Some(mistake.position),
            word: Some(mistake.word),
        }
    }
}

/// Which matcher stage produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    WholeVerse,
    Keyword,
    Window,
}

/// Outcome of matching a transcript against the reference verses.
/// Both indices absent means no confident match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub verse_index: Option<usize>,
    pub word_index: Option<usize>,
    pub score: f64,
    pub stage: Option<MatchStage>,
}

impl MatchResult {
    pub fn none() -> Self {
        MatchResult {
            verse_index: None,
            word_index: None,
            score: 0.0,
            stage: None,
        }
    }

    pub fn found(verse_index: usize, word_index: usize, score: f64, stage: MatchStage) -> Self {
        MatchResult {
            verse_index: Some(verse_index),
            word_index: Some(word_index),
            score,
            stage: Some(stage),
        }
    }

    /// `(verse, word)` when matched.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.verse_index.zip(self.word_index)
    }

    pub fn is_match(&self) -> bool {
        self.position().is_some()
    }
}

/// Elongation rule class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaddRule {
    #[serde(rename = "Madd Asli")]
    Asli,
    #[serde(rename = "Madd Laazim")]
    Laazim,
}

impl fmt::Display for MaddRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaddRule::Asli => write!(f, "Madd Asli"),
            MaddRule::Laazim => write!(f, "Madd Laazim"),
        }
    }
}

/// Verdict of the duration heuristic for one elongation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationVerdict {
    TooShort,
    Correct,
    TooLong,
}

impl fmt::Display for DurationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationVerdict::TooShort => write!(f, "too short"),
            DurationVerdict::Correct => write!(f, "correct"),
            DurationVerdict::TooLong => write!(f, "too long"),
        }
    }
}

/// Assessment of one elongation letter occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElongationAssessment {
    pub word: String,
    pub letter: char,
    #[serde(rename = "rule_type")]
    pub rule: MaddRule,
    pub detected: bool, // Held within the expected range
    pub verdict: DurationVerdict,
    pub estimated_seconds: f64,
    pub message: String,
}

/// Tunable thresholds for the whole engine.
///
/// The duration bounds come from a proportional per-word estimate, not from
/// acoustic alignment, and should be validated against labeled recitations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub whole_verse_threshold: f64,
    pub window_accept_threshold: f64,
    pub window_min_threshold: f64,
    pub mispronunciation_threshold: f64,
    pub exact_count_threshold: f64,
    pub rhythm_gap: usize,
    // Madd Asli bounds in seconds
    pub madd_asli_min: f64,
    pub madd_asli_max: f64,
    // Madd Laazim (six counts) bounds in seconds
    pub madd_laazim_min: f64,
    pub madd_laazim_max: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            whole_verse_threshold: 0.8,
            window_accept_threshold: 0.9,
            window_min_threshold: 0.5,
            mispronunciation_threshold: 0.8,
            exact_count_threshold: 0.7,
            rhythm_gap: 2,
            madd_asli_min: 0.4,
            madd_asli_max: 0.7,
            madd_laazim_min: 2.0,
            madd_laazim_max: 3.0,
        }
    }
}

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid params JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineParams {
    /// Load params from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ParamsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Full result of checking one recitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecitationReport {
    pub transcript: String,
    pub normalized: String,
    #[serde(rename = "match")]
    pub match_result: MatchResult,
    pub feedback: Vec<Feedback>,
    pub elongation: Vec<ElongationAssessment>,
    pub duration_seconds: Option<f64>,
}

impl RecitationReport {
    /// Number of feedback items that report mistakes.
    pub fn mistake_count(&self) -> usize {
        self.feedback.iter().filter(|f| f.kind.is_mistake()).count()
    }

    pub fn is_success(&self) -> bool {
        self.feedback
            .iter()
            .any(|f| f.kind == FeedbackKind::Success)
    }
}

/// One line of a batch input file (JSON Lines)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub transcript: String,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// A batch entry together with its report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: String,
    pub report: RecitationReport,
}
