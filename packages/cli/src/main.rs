#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the safety map.
//!
//! ```text
//! safety_map serve
//! safety_map locations
//! safety_map stats CGK [--start-date 2024-01-01 --end-date 2024-06-30] [--window 6m]
//! safety_map hierarchy CGK
//! safety_map reports CGK --month "Jan 2024"
//! safety_map reports CGK --category "Bird Strike"
//! ```
//!
//! Every command reads the store from the same config as the server
//! (`--config` or `$SAFETY_MAP_CONFIG`) and prints JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use safety_map_analytics::{
    compute_hierarchy, compute_stats_localized, map_rollups, resolve_by_category,
    resolve_by_month, window_trend,
};
use safety_map_analytics_models::WindowMode;
use safety_map_location_models::LocationId;
use safety_map_report_models::{DateRange, MonthKey, MonthLocale, parse_date};
use safety_map_server::{ServerConfig, run_server};
use safety_map_server_models::{ApiLocationSummary, ApiReport, ApiStats};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "safety_map", about = "Airport safety report statistics")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "SAFETY_MAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Optional inclusive date filter. Both bounds are needed for a filter.
#[derive(clap::Args)]
struct RangeArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    start_date: Option<chrono::NaiveDate>,
    /// Last day of the range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    end_date: Option<chrono::NaiveDate>,
}

impl RangeArgs {
    fn range(&self) -> Result<Option<DateRange>, Box<dyn std::error::Error>> {
        if self.start_date.is_some() != self.end_date.is_some() {
            log::warn!("Ignoring date range: both --start-date and --end-date are required");
        }
        Ok(DateRange::from_bounds(self.start_date, self.end_date)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// List main branches shown on the map
    Locations,
    /// Show statistics for a location
    Stats {
        /// Location id
        id: String,
        #[command(flatten)]
        range: RangeArgs,
        /// Trend window when no date range is given (6m, 12m, all)
        #[arg(long, default_value = "all")]
        window: WindowMode,
        /// Month label language (english, indonesian); defaults to the config
        #[arg(long)]
        locale: Option<MonthLocale>,
    },
    /// Show report counts of a main branch and its children
    Hierarchy {
        /// Main branch id
        id: String,
    },
    /// List reports for a month or a category
    Reports {
        /// Location id
        id: String,
        /// Month as YYYY-MM or a label such as "Jan 2024"
        #[arg(long, conflicts_with = "category", required_unless_present = "category")]
        month: Option<String>,
        /// Exact category name
        #[arg(long)]
        category: Option<String>,
        #[command(flatten)]
        range: RangeArgs,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = ServerConfig::load(cli.config.as_deref())?;

    if matches!(cli.command, Commands::Serve) {
        // The server uses actix-web's runtime, so we need to run it
        // in a blocking task to avoid nesting tokio runtimes.
        tokio::task::spawn_blocking(move || {
            actix_web::rt::System::new()
                .block_on(run_server(config))
                .map_err(|e| e.to_string())
        })
        .await??;
        return Ok(());
    }

    let store = config.store.open().await?;
    let store = store.as_ref();

    match cli.command {
        Commands::Serve => {}
        Commands::Locations => {
            let summaries: Vec<ApiLocationSummary> = map_rollups(store)
                .await?
                .into_iter()
                .map(|rollup| {
                    ApiLocationSummary::new(
                        rollup.parent,
                        rollup.grand_total,
                        rollup.total_children > 0,
                    )
                })
                .collect();
            print_json(&summaries)?;
        }
        Commands::Stats {
            id,
            range,
            window,
            locale,
        } => {
            let range = range.range()?;
            let stats = compute_stats_localized(
                store,
                &LocationId::new(id),
                range.as_ref(),
                locale.unwrap_or(config.locale),
            )
            .await?;
            print_json(&ApiStats {
                ranked_categories: stats.ranked_categories(),
                display_trend: window_trend(&stats.monthly_trend, window, stats.range_active()),
                window,
                stats,
            })?;
        }
        Commands::Hierarchy { id } => {
            let rollup = compute_hierarchy(store, &LocationId::new(id)).await?;
            print_json(&rollup)?;
        }
        Commands::Reports {
            id,
            month,
            category,
            range,
        } => {
            let id = LocationId::new(id);
            let range = range.range()?;
            let reports = match (month, category) {
                (Some(month), _) => {
                    let month = MonthKey::parse(&month)?;
                    resolve_by_month(store, &id, month, range.as_ref()).await?
                }
                (None, Some(category)) => {
                    resolve_by_category(store, &id, &category, range.as_ref()).await?
                }
                (None, None) => return Err("either --month or --category is required".into()),
            };
            let reports: Vec<ApiReport> = reports.into_iter().map(ApiReport::from).collect();
            print_json(&reports)?;
        }
    }

    Ok(())
}
