use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use venuesync_core::config::{self, ImportConfig, ImportOptions, TableNames, DEFAULT_CSV_PATH};
use venuesync_core::db::MySqlStore;
use venuesync_core::processor::{run_and_release, ImportReport};
use venuesync_core::source;

#[derive(Parser, Debug)]
#[command(author, version, about = "Import venue hours and features into the CMS", long_about = None)]
struct Cli {
    /// Only import the row whose Title matches exactly
    restaurant: Option<String>,

    /// Spreadsheet export to read (defaults to $VENUESYNC_CSV or data.csv)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Look up posts and plan writes without changing the database
    #[arg(long)]
    dry_run: bool,

    /// Posts table name (defaults to <prefix>posts)
    #[arg(long)]
    posts_table: Option<String>,

    /// Post metadata table name (defaults to <prefix>postmeta)
    #[arg(long)]
    postmeta_table: Option<String>,

    /// Restrict title lookups to this post type
    #[arg(long)]
    post_type: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = resolve_config(cli)?;

    info!(path = %config.csv_path.display(), "Reading CSV export");
    let rows = source::read_rows_from_path(&config.csv_path)
        .with_context(|| format!("failed to read {}", config.csv_path.display()))?;
    if rows.is_empty() {
        info!("No data found in CSV");
        return Ok(());
    }
    info!(rows = rows.len(), "Loaded rows");

    let store = MySqlStore::connect(
        &config.database_url,
        config.tables.clone(),
        config.post_type.clone(),
    )
    .await
    .context("failed to connect to MySQL")?;

    match run_and_release(&store, &rows, &config.options).await {
        Ok(report) => {
            print_report(&report)?;
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "Import aborted");
            Err(err).context("import aborted")
        }
    }
}

fn resolve_config(cli: Cli) -> Result<ImportConfig> {
    let database_url = config::database_url_from_env()?;

    let prefix = config::table_prefix_from_env();
    let defaults = TableNames::with_prefix(&prefix)?;
    let tables = TableNames::new(
        cli.posts_table.unwrap_or(defaults.posts),
        cli.postmeta_table.unwrap_or(defaults.postmeta),
    )?;

    let csv_path = cli
        .csv
        .or_else(|| std::env::var("VENUESYNC_CSV").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH));

    Ok(ImportConfig {
        database_url,
        csv_path,
        tables,
        post_type: cli.post_type.or_else(config::post_type_from_env),
        options: ImportOptions {
            restaurant_filter: cli.restaurant,
            dry_run: cli.dry_run,
        },
    })
}

fn print_report(report: &ImportReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
