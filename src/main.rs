//! Synheart Activity Eval CLI
//!
//! Windowing and partitioning of accelerometer recordings for activity
//! recognition experiments.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synheart_activity_eval::{
    config::Config,
    core::{shuffle, Splitter, WindowEngine},
    dataset::{load_csv, save_csv, Dataset},
    protocol::{ProtocolLog, SharedProtocolLog},
    VERSION,
};

#[derive(Parser)]
#[command(name = "synheart-eval")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Windowing and evaluation toolkit for activity recognition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a raw sensor CSV into feature windows
    Window {
        /// Raw accelerometer CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Destination of the windowed CSV
        #[arg(long, short)]
        output: PathBuf,

        /// Instances per window (defaults to the configured size)
        #[arg(long)]
        size: Option<usize>,

        /// Instances shared by consecutive windows (defaults to the configured overlap)
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Partition a dataset and show the resulting sets
    Split {
        /// Raw or windowed CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Apply the configured sliding window before splitting
        #[arg(long)]
        window: bool,

        /// Fraction of instances used for training
        #[arg(long)]
        train: Option<f64>,

        /// Fraction of instances used for testing
        #[arg(long)]
        test: Option<f64>,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,

        /// Keep the original instance order
        #[arg(long)]
        no_shuffle: bool,
    },

    /// Show configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "synheart_activity_eval=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Window {
            input,
            output,
            size,
            overlap,
        } => cmd_window(&config, &input, &output, size, overlap),
        Commands::Split {
            input,
            window,
            train,
            test,
            seed,
            no_shuffle,
        } => cmd_split(&config, &input, window, train, test, seed, no_shuffle),
        Commands::Config => {
            cmd_config(&config);
            Ok(())
        }
    }
}

fn cmd_window(
    config: &Config,
    input: &Path,
    output: &Path,
    size: Option<usize>,
    overlap: Option<usize>,
) -> anyhow::Result<()> {
    let log = open_protocol(config)?;
    let size = size.unwrap_or(config.window.size);
    let overlap = overlap.unwrap_or(config.window.overlap);

    let raw = load_dataset(config, input, &log)?;
    let engine = WindowEngine::new(raw.schema_arc(), &config.channels)?;
    let windows = engine.windowify(&raw, size, overlap, &log)?;

    log.log(format!(
        "Saving {} instances to file '{}'...",
        windows.len(),
        output.display()
    ));
    save_csv(&windows, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} windows ({} raw instances) to {}",
        windows.len(),
        raw.len(),
        output.display()
    );
    close_protocol(config, &log)
}

fn cmd_split(
    config: &Config,
    input: &Path,
    window: bool,
    train: Option<f64>,
    test: Option<f64>,
    seed: Option<u64>,
    no_shuffle: bool,
) -> anyhow::Result<()> {
    let log = open_protocol(config)?;

    let mut data = load_dataset(config, input, &log)?;
    if window {
        let engine = WindowEngine::new(data.schema_arc(), &config.channels)?;
        data = engine.windowify(&data, config.window.size, config.window.overlap, &log)?;
    }

    if config.split.shuffle && !no_shuffle {
        let seed = seed.unwrap_or(config.split.seed);
        log.log(format!("Shuffling {} instances (seed {seed})...", data.len()));
        data = shuffle(&data, seed);
    }

    let splitter = Splitter::new(
        train.unwrap_or(config.split.train),
        test.unwrap_or(config.split.test),
    )?;
    let parts = splitter.split(&data)?;
    log.log(format!(
        "Split {} instances into {} training and {} test instances",
        data.len(),
        parts.train.len(),
        parts.test.len()
    ));

    println!("Training set: {} instances", parts.train.len());
    print_distribution(&parts.train);
    println!();
    println!("Test set: {} instances", parts.test.len());
    print_distribution(&parts.test);

    close_protocol(config, &log)
}

fn cmd_config(config: &Config) {
    println!("Configuration file: {:?}", Config::config_path());
    println!();
    match serde_json::to_string_pretty(config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing configuration: {e}"),
    }
}

fn open_protocol(config: &Config) -> anyhow::Result<SharedProtocolLog> {
    let timezone = config.timezone()?;
    Ok(Arc::new(ProtocolLog::open(timezone).with_console(config.console)))
}

/// Load a CSV and account for rows dropped by the missing-label filter.
fn load_dataset(config: &Config, path: &Path, log: &ProtocolLog) -> anyhow::Result<Dataset> {
    log.log(format!("Loading instances from file '{}'...", path.display()));
    let outcome = load_csv(path, &config.csv_options())
        .with_context(|| format!("Failed to load {}", path.display()))?;

    if outcome.rows_filtered > 0 {
        log.record_filtered(outcome.rows_filtered as u64);
        log.log(format!(
            "Filtered {} of {} instances without a '{}' label",
            outcome.rows_filtered, outcome.rows_read, config.label
        ));
    }
    if outcome.dataset.is_empty() {
        bail!("{} holds no labeled instances", path.display());
    }

    log.log(format!(
        "Loaded {} instances with {} attributes",
        outcome.dataset.len(),
        outcome.dataset.schema().num_attributes()
    ));
    Ok(outcome.dataset)
}

/// Save the protocol and its statistics under the protocol directory.
fn close_protocol(config: &Config, log: &ProtocolLog) -> anyhow::Result<()> {
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
        return Ok(());
    }

    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let protocol_path = config.protocol_dir.join(format!("protocol_{stamp}.log"));
    log.save(&protocol_path)
        .with_context(|| format!("Failed to write {}", protocol_path.display()))?;
    log.save_stats(&config.protocol_dir.join(format!("protocol_{stamp}.json")))
        .context("Failed to write protocol statistics")?;

    println!();
    println!("{}", log.summary());
    println!("Protocol saved to {:?}", protocol_path);
    Ok(())
}

fn print_distribution(dataset: &Dataset) {
    let schema = dataset.schema();
    for (label, count) in dataset.class_counts().into_iter().enumerate() {
        if count == 0 {
            continue;
        }
        let name = schema.label_name(label).unwrap_or("?");
        let share = 100.0 * count as f64 / dataset.len() as f64;
        println!("  {name:<16}{count:>8}  ({share:.1}%)");
    }
}
