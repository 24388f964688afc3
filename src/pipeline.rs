//! End-to-end recitation check: transcript (and optional duration) in, report out.

use crate::analyze::analyze_with;
use crate::audio::FallbackChain;
use crate::madd::assess_elongation_with;
use crate::matcher::match_verse_with;
use crate::models::{EngineParams, Feedback, MatchResult, RecitationReport};
use crate::normalize::normalize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
#[error("transcription failed: {0}")]
pub struct TranscribeError(pub String);

/// Turns recorded audio into Arabic text. The engine does not care how.
pub trait Transcriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String, TranscribeError>;
}

impl<F> Transcriber for F
where
    F: Fn(&[u8]) -> Result<String, TranscribeError>,
{
    fn transcribe(&self, audio: &[u8]) -> Result<String, TranscribeError> {
        self(audio)
    }
}

/// Check a transcript. Elongation is only assessed when `duration` is given.
pub fn check_transcript(
    transcript: &str,
    duration: Option<f64>,
    params: &EngineParams,
) -> RecitationReport {
    let normalized = normalize(transcript);
    let match_result = match_verse_with(transcript, params);

    let Some(verse_index) = match_result.verse_index else {
        debug!("no verse matched");
        return RecitationReport {
            transcript: transcript.to_string(),
            normalized,
            match_result,
            feedback: vec![Feedback::no_match()],
            elongation: Vec::new(),
            duration_seconds: duration,
        };
    };

    let feedback = analyze_with(verse_index, transcript, params);

    let elongation = match duration {
        Some(seconds) => {
            let words: Vec<&str> = transcript.split_whitespace().collect();
            assess_elongation_with(verse_index, &words, seconds, params)
        }
        None => Vec::new(),
    };

    RecitationReport {
        transcript: transcript.to_string(),
        normalized,
        match_result,
        feedback,
        elongation,
        duration_seconds: duration,
    }
}

/// Transcribe a recording, estimate its length and check the result.
pub fn check_recording(
    transcriber: &dyn Transcriber,
    durations: &FallbackChain,
    audio: &[u8],
    params: &EngineParams,
) -> RecitationReport {
    let transcript = match transcriber.transcribe(audio) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "transcription failed");
            return RecitationReport {
                transcript: String::new(),
                normalized: String::new(),
                match_result: MatchResult::none(),
                feedback: vec![Feedback::error(e.to_string())],
                elongation: Vec::new(),
                duration_seconds: None,
            };
        }
    };

    let seconds = durations.estimate(audio);
    check_transcript(&transcript, Some(seconds), params)
}
