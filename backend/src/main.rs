//! Campaign review CLI - rank and compare three days of campaign exports
//!
//! # Commands
//!
//! ```bash
//! campaign-review serve                                   # Start HTTP server (port 3000)
//! campaign-review process day.csv                         # One day as ranked JSON
//! campaign-review filter  --date 2024-06-05 d0.csv d1.csv d2.csv -c "1-99"
//! campaign-review compare --date 2024-06-05 d0.csv d1.csv d2.csv --campaign brand -m ACOS
//! campaign-review export  --date 2024-06-05 d0.csv d1.csv d2.csv -o Campaigns_3_days.xlsx
//! ```
//!
//! The three files are given most recent first: the first one belongs to
//! `--date`, the next to the day before, the last to two days before.

use campaign_review::{
    consecutive_days, save_workbook, sheet_label, transform_file, AggregatorSession,
    CategorySelection, MatchPolicy, Metric, ReviewError, ServerConfig, SessionError,
    DAYS_PER_SESSION, DEFAULT_WORKBOOK_NAME,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "campaign-review")]
#[command(about = "Review three days of advertising campaign exports side by side", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Target date plus its three daily exports.
#[derive(Args)]
struct DayFiles {
    /// Most recent day of the review (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,

    /// Exports for DATE, DATE-1 and DATE-2, in that order
    #[arg(num_args = 3, required = true, value_name = "CSV")]
    files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform one daily export and output ranked JSON
    Process {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the three day tables restricted to some categories
    Filter {
        #[command(flatten)]
        days: DayFiles,

        /// Category label to keep (repeatable), e.g. "1-99"
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Keep every category
        #[arg(long)]
        all: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare one campaign across the three days
    Compare {
        #[command(flatten)]
        days: DayFiles,

        /// Campaign name fragment
        #[arg(long)]
        campaign: String,

        /// Extra chart metric (repeatable): Orders, SpendUSD, ACOS
        #[arg(short, long = "metric")]
        metrics: Vec<String>,

        /// Chart the first match of a day instead of leaving the chart out on ambiguity
        #[arg(long)]
        first_match: bool,

        /// Match the campaign name case-sensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the three days to a workbook, one sheet per day
    Export {
        #[command(flatten)]
        days: DayFiles,

        /// Workbook path
        #[arg(short, long, default_value = DEFAULT_WORKBOOK_NAME)]
        output: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process { input, output } => cmd_process(&input, output.as_deref()),

        Commands::Filter {
            days,
            categories,
            all,
            output,
        } => cmd_filter(&days, &categories, all, output.as_deref()),

        Commands::Compare {
            days,
            campaign,
            metrics,
            first_match,
            case_sensitive,
            output,
        } => {
            let policy = if first_match {
                MatchPolicy::FirstMatch
            } else {
                MatchPolicy::RejectAmbiguous
            };
            cmd_compare(&days, &campaign, &metrics, policy, case_sensitive, output.as_deref())
        }

        Commands::Export { days, output } => cmd_export(&days, &output),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_process(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let table = transform_file(input)?;

    let json = serde_json::to_string_pretty(&table)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_filter(
    days: &DayFiles,
    categories: &[String],
    all: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = if all {
        CategorySelection::All
    } else {
        CategorySelection::from_labels(categories)?
    };

    let session = load_session(days)?;
    let filtered = session.filter_by_category(&selection);

    for day in &filtered {
        eprintln!("   {} ({}): {} campaigns", day.label, day.date, day.table.len());
    }

    let json = serde_json::to_string_pretty(&filtered)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_compare(
    days: &DayFiles,
    campaign: &str,
    metrics: &[String],
    policy: MatchPolicy,
    case_sensitive: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = metrics
        .iter()
        .map(|m| m.parse::<Metric>())
        .collect::<Result<BTreeSet<_>, _>>()?;

    let session = load_session(days)?;
    let comparison = session
        .compare(campaign, &metrics, policy, !case_sensitive)
        .map_err(ReviewError::from)?;

    eprintln!("🔎 '{}': {} matching rows", campaign, comparison.matches.len());
    match (&comparison.series, &comparison.series_error) {
        (Some(series), _) => eprintln!("   {} chart points", series.points.len()),
        (None, Some(reason)) => eprintln!("   ⚠️  No chart: {} (use --first-match)", reason),
        (None, None) => {}
    }

    let json = serde_json::to_string_pretty(&comparison)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_export(days: &DayFiles, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let session = load_session(days)?;
    save_workbook(&session.export(), output).map_err(ReviewError::from)?;

    eprintln!("💾 Workbook written to: {}", output.display());
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env().with_port(port);
    campaign_review::server::start_server(config).await
}

/// Transform the three exports and build the session.
fn load_session(days: &DayFiles) -> Result<AggregatorSession, ReviewError> {
    if days.files.len() != DAYS_PER_SESSION {
        return Err(SessionError::Arity {
            expected: DAYS_PER_SESSION,
            got: days.files.len(),
        }
        .into());
    }

    let mut loaded = Vec::with_capacity(DAYS_PER_SESSION);
    for (date, path) in consecutive_days(days.date).into_iter().zip(&days.files) {
        eprintln!("📄 {} → sheet {}", path.display(), sheet_label(date));
        let table = transform_file(path).map_err(|source| ReviewError::Day { date, source })?;
        loaded.push((date, table));
    }

    Ok(AggregatorSession::ingest(loaded)?)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
