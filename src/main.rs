//! Tajweed Check CLI
//!
//! Verifies recited Surah al-Fatiha transcripts against the reference text.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tajweed_check::analyze::analyze_with;
use tajweed_check::audio::FallbackChain;
use tajweed_check::madd::assess_elongation_with;
use tajweed_check::matcher::{context_words, match_verse_with};
use tajweed_check::models::{BatchEntry, BatchRecord, EngineParams};
use tajweed_check::normalize::normalize;
use tajweed_check::output::{
    format_elongation, format_feedback, print_report, print_verses, write_report_json,
    write_reports_csv_file, write_reports_json_file,
};
use tajweed_check::pipeline::check_transcript;

#[derive(Parser)]
#[command(name = "tajweed-check")]
#[command(about = "Recitation verification for Surah al-Fatiha")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with engine parameters (missing fields keep defaults)
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    // === Overrides applied on top of the params file or EngineParams::default() ===

    /// Whole-verse similarity threshold [default: 0.8]
    #[arg(long, global = true)]
    whole_verse_threshold: Option<f64>,

    /// Window score that ends the search early [default: 0.9]
    #[arg(long, global = true)]
    window_accept_threshold: Option<f64>,

    /// Minimum window score for a match [default: 0.5]
    #[arg(long, global = true)]
    window_min_threshold: Option<f64>,

    /// Similarity above which a wrong word is a mispronunciation [default: 0.8]
    #[arg(long, global = true)]
    mispronunciation_threshold: Option<f64>,

    /// Similarity above which an exact-count word is mispronounced [default: 0.7]
    #[arg(long, global = true)]
    exact_count_threshold: Option<f64>,

    /// Largest allowed jump between exactly matched positions [default: 2]
    #[arg(long, global = true)]
    rhythm_gap: Option<usize>,

    /// Shortest natural elongation in seconds [default: 0.4]
    #[arg(long, global = true)]
    madd_asli_min: Option<f64>,

    /// Longest natural elongation in seconds [default: 0.7]
    #[arg(long, global = true)]
    madd_asli_max: Option<f64>,

    /// Shortest obligatory elongation in seconds [default: 2.0]
    #[arg(long, global = true)]
    madd_laazim_min: Option<f64>,

    /// Longest obligatory elongation in seconds [default: 3.0]
    #[arg(long, global = true)]
    madd_laazim_max: Option<f64>,

    /// Suppress progress output
    #[arg(long, global = true)]
    quiet: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Output format for batch results
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// JSON array of records
    Json,
    /// CSV file, one row per record
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized form of a text
    Normalize {
        #[arg(long)]
        text: String,
    },

    /// Find the verse and starting word a transcript belongs to
    Match {
        #[arg(long)]
        text: String,

        /// Reference words to show on each side of the match
        #[arg(long, default_value = "2")]
        context: usize,
    },

    /// Compare a transcript against a given verse
    Analyze {
        /// Verse index (0 = basmala, 6 = closing verse)
        #[arg(long)]
        verse: usize,

        #[arg(long)]
        text: String,
    },

    /// Check elongation timing for recited words
    Madd {
        #[arg(long)]
        verse: usize,

        /// Recited words, in order
        #[arg(long, num_args = 1.., required = true)]
        words: Vec<String>,

        /// Total audio duration in seconds
        #[arg(long, conflicts_with = "audio", required_unless_present = "audio")]
        duration: Option<f64>,

        /// Audio file to read the duration from
        #[arg(long)]
        audio: Option<PathBuf>,
    },

    /// Full check: match, analyze and (with a duration) elongation
    Check {
        #[arg(long)]
        text: String,

        #[arg(long, conflicts_with = "audio")]
        duration: Option<f64>,

        #[arg(long)]
        audio: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check many transcripts from a JSON Lines file
    Batch {
        /// One {"id", "transcript", "duration"} object per line
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// List the reference verses
    Verses,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

impl Cli {
    /// Params file (or defaults) with explicit flags overlaid.
    fn engine_params(&self) -> Result<EngineParams, Box<dyn std::error::Error>> {
        let base = match &self.params {
            Some(path) => EngineParams::from_json_file(path)?,
            None => EngineParams::default(),
        };

        Ok(EngineParams {
            whole_verse_threshold: self.whole_verse_threshold.unwrap_or(base.whole_verse_threshold),
            window_accept_threshold: self
                .window_accept_threshold
                .unwrap_or(base.window_accept_threshold),
            window_min_threshold: self.window_min_threshold.unwrap_or(base.window_min_threshold),
            mispronunciation_threshold: self
                .mispronunciation_threshold
                .unwrap_or(base.mispronunciation_threshold),
            exact_count_threshold: self
                .exact_count_threshold
                .unwrap_or(base.exact_count_threshold),
            rhythm_gap: self.rhythm_gap.unwrap_or(base.rhythm_gap),
            madd_asli_min: self.madd_asli_min.unwrap_or(base.madd_asli_min),
            madd_asli_max: self.madd_asli_max.unwrap_or(base.madd_asli_max),
            madd_laazim_min: self.madd_laazim_min.unwrap_or(base.madd_laazim_min),
            madd_laazim_max: self.madd_laazim_max.unwrap_or(base.madd_laazim_max),
        })
    }
}

fn audio_duration(path: &Path, quiet: bool) -> Result<f64, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let seconds = FallbackChain::standard().estimate(&bytes);
    if !quiet {
        eprintln!("Audio duration: {:.2}s ({})", seconds, path.display());
    }
    Ok(seconds)
}

fn read_batch(path: &Path) -> Result<Vec<(String, BatchEntry)>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut entries = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: BatchEntry = serde_json::from_str(&line)
            .map_err(|e| format!("{}:{}: {}", path.display(), line_no + 1, e))?;
        let id = entry.id.clone().unwrap_or_else(|| (line_no + 1).to_string());
        entries.push((id, entry));
    }

    Ok(entries)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let params = cli.engine_params()?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Normalize { text } => {
            println!("{}", normalize(&text));
        }

        Commands::Match { text, context } => {
            let result = match_verse_with(&text, &params);
            match result.position() {
                Some((verse, word)) => {
                    println!("Verse: {}", verse);
                    println!("Word: {}", word);
                    println!("Score: {:.3}", result.score);
                    if let Some(stage) = result.stage {
                        println!("Stage: {:?}", stage);
                    }
                    println!("Context: {}", context_words(verse, word, context).join(" "));
                }
                None => println!("No match"),
            }
        }

        Commands::Analyze { verse, text } => {
            for item in analyze_with(verse, &text, &params) {
                println!("{}", format_feedback(&item));
            }
        }

        Commands::Madd {
            verse,
            words,
            duration,
            audio,
        } => {
            let seconds = match (duration, audio) {
                (Some(d), _) => d,
                (None, Some(path)) => audio_duration(&path, quiet)?,
                (None, None) => 0.0,
            };

            let assessments = assess_elongation_with(verse, &words, seconds, &params);
            if assessments.is_empty() && !quiet {
                eprintln!("No elongation to assess");
            }
            for assessment in &assessments {
                println!("{}", format_elongation(assessment));
                println!("  {}", assessment.message);
            }
        }

        Commands::Check {
            text,
            duration,
            audio,
            json,
        } => {
            let seconds = match (duration, audio) {
                (Some(d), _) => Some(d),
                (None, Some(path)) => Some(audio_duration(&path, quiet)?),
                (None, None) => None,
            };

            let report = check_transcript(&text, seconds, &params);
            if json {
                let stdout = std::io::stdout();
                write_report_json(&report, &mut stdout.lock())?;
                println!();
            } else {
                print_report(&report);
            }
        }

        Commands::Batch {
            input,
            output,
            format,
        } => {
            let entries = read_batch(&input)?;
            if !quiet {
                eprintln!("Checking {} transcripts from {}", entries.len(), input.display());
            }

            let progress = if !quiet {
                let pb = ProgressBar::new(entries.len() as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template(
                            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
                        )?
                        .progress_chars("#>-"),
                );
                Some(pb)
            } else {
                None
            };

            let records: Vec<BatchRecord> = entries
                .par_iter()
                .map(|(id, entry)| {
                    let report = check_transcript(&entry.transcript, entry.duration, &params);
                    if let Some(ref pb) = progress {
                        pb.inc(1);
                    }
                    BatchRecord {
                        id: id.clone(),
                        report,
                    }
                })
                .collect();

            if let Some(pb) = progress {
                pb.finish_and_clear();
            }

            match format {
                OutputFormat::Json => write_reports_json_file(&records, &output)?,
                OutputFormat::Csv => write_reports_csv_file(&records, &output)?,
            }

            if !quiet {
                let successes = records.iter().filter(|r| r.report.is_success()).count();
                let unmatched = records
                    .iter()
                    .filter(|r| !r.report.match_result.is_match())
                    .count();
                eprintln!("\n=== Batch Summary ===");
                eprintln!("Transcripts: {}", records.len());
                eprintln!("Correct: {}", successes);
                eprintln!("Unmatched: {}", unmatched);
                eprintln!("\nOutput: {}", output.display());
            }
        }

        Commands::Verses => {
            print_verses();
        }
    }

    Ok(())
}
