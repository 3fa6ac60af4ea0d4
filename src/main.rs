use std::env::VarError;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod models;
mod report;
mod source;
mod trends;
mod week;

use source::InputFormat;
use week::WeekWindow;

const TODAY_ENV: &str = "LEAVE_GRID_TODAY";

#[derive(Parser)]
#[command(name = "leave-week-grid")]
#[command(about = "Weekly leave occupancy grid and leave trends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// CSV (`username,type,status,dates,notes`) or JSON API export
    #[arg(long)]
    input: PathBuf,
    /// Defaults from the file extension
    #[arg(long, value_enum)]
    format: Option<InputFormat>,
}

#[derive(clap::Args)]
struct WindowArgs {
    /// Anchor date, falls back to $LEAVE_GRID_TODAY and then the local date
    #[arg(long)]
    today: Option<NaiveDate>,
    /// Weeks relative to the anchor week, negative for the past
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i64,
}

#[derive(Subcommand)]
enum Commands {
    /// Print who is on leave for each day of a week
    Week {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        json: bool,
    },
    /// Print monthly and week-of-month request counts
    Trends {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the inclusive number of leave days between two dates
    Days {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_today(today: Option<NaiveDate>) -> anyhow::Result<NaiveDate> {
    pick_today(today, std::env::var(TODAY_ENV), || chrono::Local::now().date_naive())
}

/// `--today` wins over `$LEAVE_GRID_TODAY`, which wins over the clock.
fn pick_today(
    flag: Option<NaiveDate>,
    env: Result<String, VarError>,
    clock: impl FnOnce() -> NaiveDate,
) -> anyhow::Result<NaiveDate> {
    if let Some(today) = flag {
        return Ok(today);
    }
    match env {
        Ok(value) => week::parse_date(&value)
            .with_context(|| format!("{TODAY_ENV} must be a YYYY-MM-DD date")),
        Err(VarError::NotPresent) => Ok(clock()),
        Err(err @ VarError::NotUnicode(_)) => {
            Err(err).with_context(|| format!("{TODAY_ENV} must be a YYYY-MM-DD date"))
        }
    }
}

fn resolve_window(args: &WindowArgs) -> anyhow::Result<WeekWindow> {
    let today = resolve_today(args.today)?;
    let window = week::advance_week(&WeekWindow::current(today)?, args.offset)?;
    tracing::debug!(today = %window.today(), offset = window.offset(), week_start = %window.week_start(), "resolved week window");
    Ok(window)
}

fn log_skipped(projection: &models::Projection) {
    for skipped in &projection.skipped {
        tracing::warn!(
            subject = %skipped.subject_id,
            dates = %skipped.dates,
            reason = %skipped.reason,
            "skipping leave entry with unparsable dates"
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Week {
            input,
            window,
            json,
        } => {
            let rows = source::load_rows(&input.input, input.format)?;
            let window = resolve_window(&window)?;
            let projection = week::project(&rows, &window);
            log_skipped(&projection);

            if json {
                let body = serde_json::to_string_pretty(&projection)
                    .context("failed to serialize projection")?;
                println!("{body}");
            } else {
                print!("{}", report::render_grid(&window, &projection));
            }
        }
        Commands::Trends { input } => {
            let rows = source::load_rows(&input.input, input.format)?;
            for series in [trends::monthly_counts(&rows), trends::week_of_month_counts(&rows)] {
                println!("{}:", series.label);
                for (label, count) in &series.buckets {
                    println!("- {label}: {count}");
                }
            }
        }
        Commands::Days { from, to } => {
            if to < from {
                anyhow::bail!("--to ({to}) must not be before --from ({from})");
            }
            println!("{}", trends::leave_day_count(from, to));
        }
        Commands::Report { input, window, out } => {
            let rows = source::load_rows(&input.input, input.format)?;
            let window = resolve_window(&window)?;
            let projection = week::project(&rows, &window);
            log_skipped(&projection);

            let label = input.input.display().to_string();
            let report = report::build_report(&label, &window, &rows, &projection);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
