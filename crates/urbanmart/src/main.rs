use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use urbanmart_core::{
    filter_options, ChannelSelection, Dashboard, DateRange, FilterCriteria, FilterOptions, Session,
};
use urbanmart_parser::{load_transactions, parse_day_month_year, TransactionTable};

mod config;
mod render;

use config::DashboardConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "UrbanMart sales dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter the transactions and print KPIs, revenue breakdowns and a row preview
    Dashboard(DashboardArgs),
    /// List the values available for each filter
    Options(SourceArgs),
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Transactions CSV (falls back to URBANMART_DATA, then the config file)
    #[arg(long)]
    data: Option<PathBuf>,
    /// TOML file with data_path, [settings] and a [filters] preset
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct DashboardArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// First day to include (DD-MM-YYYY)
    #[arg(long, value_parser = parse_cli_date)]
    from: Option<NaiveDate>,
    /// Last day to include (DD-MM-YYYY)
    #[arg(long, value_parser = parse_cli_date)]
    to: Option<NaiveDate>,
    /// Store location to include; repeat for several
    #[arg(long = "store")]
    stores: Vec<String>,
    /// Channel to include, or "All"
    #[arg(long)]
    channel: Option<String>,
    /// Product category to include; repeat for several
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Customer segment to include; repeat for several
    #[arg(long = "segment")]
    segments: Vec<String>,
    /// Number of entries in the top products/customers tables
    #[arg(long)]
    top: Option<usize>,
    /// Number of raw rows to preview
    #[arg(long)]
    preview: Option<usize>,
    /// Emit the dashboard as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    parse_day_month_year(value).ok_or_else(|| format!("expected DD-MM-YYYY, got '{value}'"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Dashboard(args) => handle_dashboard(args),
        Command::Options(args) => handle_options(args),
    }
}

fn load(source: &SourceArgs) -> Result<(DashboardConfig, TransactionTable)> {
    dotenvy::dotenv().ok();

    let config = DashboardConfig::load(source.config.as_deref())?;
    let data_path = config.resolve_data_path(source.data.clone());
    let table = load_transactions(&data_path)
        .with_context(|| format!("failed to load transactions from {}", data_path.display()))?;

    Ok((config, table))
}

fn handle_options(args: SourceArgs) -> Result<()> {
    let (_, table) = load(&args)?;
    let options = filter_options(&table)?;
    println!("{}", render::render_options(&options));
    Ok(())
}

fn handle_dashboard(args: DashboardArgs) -> Result<()> {
    let (config, table) = load(&args.source)?;
    let options = filter_options(&table)?;
    let criteria = build_criteria(&args, config.filters.clone(), &options);

    let mut settings = config.settings.clone();
    if let Some(top) = args.top {
        settings.top_n = top;
    }
    if let Some(rows) = args.preview {
        settings.preview_rows = rows;
    }

    let session = Session::new(table).with_criteria(criteria);
    let dashboard = session.dashboard(&settings)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    match dashboard {
        Dashboard::Empty { .. } => {
            warn!("filter combination matched no rows");
            println!("{}", render::NO_DATA_MESSAGE);
        }
        Dashboard::Ready(view) => {
            info!(rows = view.row_count, "rendering dashboard");
            println!("UrbanMart Sales Dashboard\n");
            println!("{}", render::render_dashboard(&view));
        }
    }

    Ok(())
}

/// Flags override the config preset; a missing date range defaults to the data's full span.
fn build_criteria(
    args: &DashboardArgs,
    preset: FilterCriteria,
    options: &FilterOptions,
) -> FilterCriteria {
    let mut criteria = preset;

    if args.from.is_some() || args.to.is_some() {
        let bounds = criteria.date_range.or(options.date_bounds);
        let start = args.from.or(bounds.map(|b| b.start)).or(args.to);
        let end = args.to.or(bounds.map(|b| b.end)).or(args.from);
        if let (Some(start), Some(end)) = (start, end) {
            criteria.date_range = Some(DateRange::new(start, end));
        }
    } else if criteria.date_range.is_none() {
        criteria.date_range = options.date_bounds;
    }

    if !args.stores.is_empty() {
        criteria.stores = args.stores.iter().cloned().collect();
    }
    if let Some(channel) = &args.channel {
        criteria.channel = ChannelSelection::from(channel.as_str());
    }
    if !args.categories.is_empty() {
        criteria.categories = args.categories.iter().cloned().collect();
    }
    if !args.segments.is_empty() {
        criteria.segments = args.segments.iter().cloned().collect();
    }

    criteria
}
