use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use shape_match::{MatchConfig, Matcher, NoProgress, ProgressObserver, Series};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shape-match")]
#[command(about = "Find historical price windows shaped like a reference window", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the windows most similar to the one starting at --start
    Match {
        /// Series file (i64 count, then i64 timestamp + f32 price records)
        file: PathBuf,

        /// Offset of the query window
        #[arg(short, long)]
        start: usize,

        /// Window length
        #[arg(short, long, default_value = "60")]
        window: usize,

        /// Number of matches to keep
        #[arg(short, long, default_value = "10")]
        keep: usize,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Do not draw a progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Print the record count and the first records of a series file
    Inspect {
        file: PathBuf,

        /// Number of records to print
        #[arg(long, default_value = "5")]
        head: usize,
    },

    /// Compare the query window with one candidate window
    Compare {
        file: PathBuf,

        /// Offset of the query window
        #[arg(short, long)]
        reference: usize,

        /// Offset of the candidate window
        #[arg(short, long)]
        candidate: usize,

        /// Window length
        #[arg(short, long, default_value = "60")]
        window: usize,

        /// Extra window lengths of raw prices to include after each window
        #[arg(long, default_value = "2")]
        horizon: usize,

        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Progress observer drawing an indicatif bar on stderr.
struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    fn new() -> Result<Self> {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }
}

impl ProgressObserver for BarObserver {
    fn on_progress(&self, current: usize, total: usize) {
        if self.bar.length() != Some(total as u64) {
            self.bar.set_length(total as u64);
        }
        self.bar.set_position(current as u64);
    }
}

fn load(file: &Path) -> Result<Series> {
    Series::load(file).with_context(|| format!("load series from '{}'", file.display()))
}

fn run_match(
    file: &Path,
    start: usize,
    window: usize,
    keep: usize,
    json: bool,
    no_progress: bool,
) -> Result<()> {
    let series = load(file)?;
    let matcher = Matcher::new(MatchConfig::new(window, keep));

    let outcome = if no_progress {
        matcher.find_with(&series, start, &NoProgress, None)
    } else {
        let observer = BarObserver::new()?;
        let outcome = matcher.find_with(&series, start, &observer, None);
        observer.bar.finish_and_clear();
        outcome
    };
    let result =
        outcome.with_context(|| format!("match window [{start}, {start}+{window})"))?;

    tracing::info!(
        start,
        window,
        candidates = result.candidates,
        kept = result.len(),
        "match complete"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in result.to_lines() {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_inspect(file: &Path, head: usize) -> Result<()> {
    let series = load(file)?;
    println!("{} records read from '{}'", series.len(), file.display());
    for obs in series.iter().take(head) {
        println!("{obs}");
    }
    Ok(())
}

fn run_compare(
    file: &Path,
    reference: usize,
    candidate: usize,
    window: usize,
    horizon: usize,
    json: bool,
) -> Result<()> {
    let series = load(file)?;
    let matcher = Matcher::new(MatchConfig::new(window, 1));
    let cmp = matcher
        .compare(&series, reference, candidate, horizon)
        .with_context(|| format!("compare windows at {reference} and {candidate}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cmp)?);
        return Ok(());
    }

    println!(
        "reference {reference} vs candidate {candidate} (window {window}): score {:.3}",
        cmp.score
    );
    println!("{:>6}  {:>9}  {:>9}  {:>10}  {:>10}", "step", "ref_z", "cand_z", "ref", "cand");
    let rows = cmp.reference_raw.len().max(cmp.candidate_raw.len());
    for step in 0..rows {
        let z = |v: &[f64]| v.get(step).map_or(String::new(), |x| format!("{x:.3}"));
        let raw = |v: &[f32]| v.get(step).map_or(String::new(), |x| format!("{x:.4}"));
        println!(
            "{step:>6}  {:>9}  {:>9}  {:>10}  {:>10}",
            z(&cmp.reference_normalized[..]),
            z(&cmp.candidate_normalized[..]),
            raw(&cmp.reference_raw[..]),
            raw(&cmp.candidate_raw[..]),
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Match {
            file,
            start,
            window,
            keep,
            json,
            no_progress,
        } => run_match(&file, start, window, keep, json, no_progress),
        Commands::Inspect { file, head } => run_inspect(&file, head),
        Commands::Compare {
            file,
            reference,
            candidate,
            window,
            horizon,
            json,
        } => run_compare(&file, reference, candidate, window, horizon, json),
    };

    if let Err(err) = outcome {
        match err.downcast_ref::<shape_match::Error>() {
            Some(kind) => eprintln!("error [{}]: {err:#}", kind.kind()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
