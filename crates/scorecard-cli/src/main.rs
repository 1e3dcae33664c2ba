use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use scorecard_acquire::{fetch, history};
use scorecard_model::Settings;

#[derive(Parser)]
#[command(name = "scorecard")]
#[command(about = "Turn a storefront purchase history into a review-score spreadsheet")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    /// Settings JSON file; fields omitted there keep their curated defaults
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Download review pages for every title in a purchase-history export
    Fetch {
        /// Plaintext purchase-history export file
        #[arg(short = 'H', long)]
        history: PathBuf,
    },

    /// Extract review metadata from cached pages and write the report
    Extract {
        /// Directory for the report files
        #[arg(short = 'O', long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Fetch then extract in one go
    Run {
        /// Plaintext purchase-history export file
        #[arg(short = 'H', long)]
        history: PathBuf,

        /// Directory for the report files
        #[arg(short = 'O', long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    let settings = Settings::load(cli.settings.as_deref())?;

    match cli.command {
        Commands::Fetch { history } => {
            run_fetch(&history, &settings).await?;
        }
        Commands::Extract { output_dir } => {
            run_extract(&output_dir, &settings)?;
        }
        Commands::Run { history, output_dir } => {
            run_fetch(&history, &settings).await?;
            run_extract(&output_dir, &settings)?;
        }
    }

    Ok(())
}

async fn run_fetch(history_file: &Path, settings: &Settings) -> Result<()> {
    tracing::info!(file = %history_file.display(), "Reading purchase history");
    let lines = history::read_history(history_file, settings)?;
    let records = history::build_records(&lines);

    let report = fetch::fetch_all(&records, settings).await?;

    if !report.failed.is_empty() {
        tracing::warn!(
            failed = report.failed.len(),
            "Some titles failed on every platform; add overrides or ignore \
             entries to the settings and re-run"
        );
        for failed in &report.failed {
            tracing::warn!("{}", failed.summary());
        }
    }

    Ok(())
}

fn run_extract(output_dir: &Path, settings: &Settings) -> Result<()> {
    let cache_dir = Path::new(&settings.cache_dir);
    let outcome = scorecard_extract::extract_dir(cache_dir, settings)?;

    if !outcome.skipped.is_empty() {
        tracing::warn!(skipped = outcome.skipped.len(), "Some pages could not be parsed");
        for page in &outcome.skipped {
            tracing::warn!(file = %page.file, "{}", page.error);
        }
    }

    let report_path = scorecard_report::write_report(&outcome.records, settings, output_dir)?;
    let genre_path = scorecard_report::write_genre_list(&outcome.records, &report_path)?;
    tracing::info!(
        report = %report_path.display(),
        genres = %genre_path.display(),
        "Done"
    );

    Ok(())
}
