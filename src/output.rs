//! Output formatting for recitation reports (JSON, CSV, console).

use crate::models::{BatchRecord, ElongationAssessment, Feedback, RecitationReport};
use crate::verses::VERSES;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write one report as JSON.
pub fn write_report_json<W: Write>(
    report: &RecitationReport,
    writer: &mut W,
) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(report)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

/// Write one report as JSON to a file.
pub fn write_report_json_file(report: &RecitationReport, path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_report_json(report, &mut file)
}

/// Write batch records as a JSON array.
pub fn write_reports_json<W: Write>(
    records: &[BatchRecord],
    writer: &mut W,
) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(records)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

pub fn write_reports_json_file(records: &[BatchRecord], path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_reports_json(records, &mut file)
}

/// Write batch records as CSV, one row per record.
pub fn write_reports_csv<W: Write>(
    records: &[BatchRecord],
    writer: &mut W,
) -> Result<(), OutputError> {
    writeln!(
        writer,
        "id,transcript,verse_index,word_index,score,stage,success,mistakes,\
         duration_seconds,feedback"
    )?;

    for record in records {
        let report = &record.report;
        let m = &report.match_result;
        let feedback: Vec<&str> = report.feedback.iter().map(|f| f.message.as_str()).collect();

        writeln!(
            writer,
            "{:?},{:?},{},{},{:.3},{},{},{},{},{:?}",
            record.id,
            report.transcript,
            optional(m.verse_index),
            optional(m.word_index),
            m.score,
            m.stage.map(|s| format!("{:?}", s)).unwrap_or_default(),
            report.is_success(),
            report.mistake_count(),
            report
                .duration_seconds
                .map(|d| format!("{:.3}", d))
                .unwrap_or_default(),
            feedback.join(" | ")
        )?;
    }

    Ok(())
}

pub fn write_reports_csv_file(records: &[BatchRecord], path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_reports_csv(records, &mut file)
}

fn optional(value: Option<usize>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One feedback item as a console line.
pub fn format_feedback(item: &Feedback) -> String {
    match item.position {
        Some(position) => format!("[{:?} @{}] {}", item.kind, position, item.message),
        None => item.message.clone(),
    }
}

pub fn format_elongation(assessment: &ElongationAssessment) -> String {
    format!(
        "{} '{}' ({}): {:.2}s, {}",
        assessment.rule,
        assessment.word,
        assessment.letter,
        assessment.estimated_seconds,
        assessment.verdict
    )
}

/// Print a report in a human-readable format.
pub fn print_report(report: &RecitationReport) {
    println!("\n=== Recitation Report ===");
    println!("Transcript: {}", report.transcript);
    println!("Normalized: {}", report.normalized);
    match report.match_result.position() {
        Some((verse, word)) => println!(
            "Matched: ayah {} word {} (score {:.2})",
            verse, word, report.match_result.score
        ),
        None => println!("Matched: none"),
    }
    if let Some(seconds) = report.duration_seconds {
        println!("Duration: {:.2}s", seconds);
    }

    println!();
    println!("Feedback:");
    for item in &report.feedback {
        println!("  {}", format_feedback(item));
    }

    if !report.elongation.is_empty() {
        println!();
        println!("Elongation:");
        for assessment in &report.elongation {
            println!("  {}", format_elongation(assessment));
        }
    }
}

/// Print the reference verses with their indices.
pub fn print_verses() {
    for verse in &VERSES {
        println!("{}: {} ({} words)", verse.index, verse.text, verse.word_count());
    }
}
