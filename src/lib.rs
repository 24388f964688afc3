//! Tajweed Check Library
//!
//! Verification of recited Surah al-Fatiha against the reference text.
//! A transcript is normalized, matched to a verse, compared word by word and
//! optionally checked for elongation timing.
//!
//! # Example
//!
//! ```
//! use tajweed_check::prelude::*;
//!
//! let result = match_verse("الحمد لله رب العالمين");
//! assert_eq!(result.position(), Some((1, 0)));
//!
//! let feedback = analyze(1, "الحمد لله رب العالمين");
//! assert_eq!(feedback[0].kind, FeedbackKind::Success);
//! ```
//!
//! # Full Check Example
//!
//! ```no_run
//! use tajweed_check::prelude::*;
//!
//! let params = EngineParams::default();
//! let audio = std::fs::read("recitation.wav").unwrap();
//!
//! // Any speech-to-text backend can act as the transcriber
//! let transcriber = |_: &[u8]| -> Result<String, TranscribeError> {
//!     Ok("غير المغضوب عليهم ولا الضالين".to_string())
//! };
//!
//! let report = check_recording(&transcriber, &FallbackChain::standard(), &audio, &params);
//! for item in &report.feedback {
//!     println!("{}", format_feedback(item));
//! }
//! ```

pub mod analyze;
pub mod audio;
pub mod madd;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod similarity;
pub mod verses;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analyze::{analyze, analyze_with};
    pub use crate::audio::{
        AudioError, ContainerHeaderEstimator, DurationEstimator, FallbackChain,
        PacketDecodeEstimator, RawPcmEstimator,
    };
    pub use crate::madd::{assess_elongation, assess_elongation_with, estimate_word_durations};
    pub use crate::matcher::{context_words, match_verse, match_verse_with};
    pub use crate::models::{
        BatchEntry, BatchRecord, DurationVerdict, ElongationAssessment, EngineParams, Feedback,
        FeedbackKind, MaddRule, MatchResult, MatchStage, Mistake, MistakeKind, ParamsError,
        RecitationReport, Severity,
    };
    pub use crate::normalize::{normalize, normalize_words};
    pub use crate::output::{
        format_elongation, format_feedback, print_report, print_verses, write_report_json,
        write_report_json_file, write_reports_csv, write_reports_csv_file, write_reports_json,
        write_reports_json_file, OutputError,
    };
    pub use crate::pipeline::{check_recording, check_transcript, TranscribeError, Transcriber};
    pub use crate::similarity::similar;
    pub use crate::verses::{MatchStrategy, ReferenceVerse, VERSES};
}

// Re-export commonly used types at the crate root
pub use models::{EngineParams, Feedback, MatchResult, RecitationReport};
