//! Non-interactive NutriLog command line.
//!
//! # Responsibility
//! - Wire configuration, logging and the file store into `NutritionService`.
//! - Print plain-text reports; interactive menus live elsewhere.

use clap::{Parser, Subcommand};
use log::info;
use nutrilog_core::{
    core_version, init_logging, DateKey, FileDocumentStore, NutritionService, TrackerConfig,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "nutrilog")]
#[command(about = "Food catalog, calorie diary and daily targets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (overrides NUTRILOG_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error (overrides NUTRILOG_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the core library version
    Version,

    /// List every food with its live calories
    Foods,

    /// Search foods by keyword
    Search {
        /// Require every term to match instead of any
        #[arg(long)]
        all: bool,

        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Show entries and the calorie summary for a date (default: today)
    Day { date: Option<DateKey> },

    /// Log servings of a catalog food
    Log {
        food: String,
        servings: f64,
        date: Option<DateKey>,
    },

    /// Delete a diary entry by its 1-based number
    Delete {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        index: u32,
        date: Option<DateKey>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Commands::Version = cli.command {
        println!("nutrilog_core version={}", core_version());
        return Ok(());
    }

    let mut config = TrackerConfig::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(level) = cli.log_level.as_deref() {
        config = config.with_log_level(level)?;
    }

    let log_dir = config.absolute_log_dir()?;
    init_logging(config.log_level, &log_dir.to_string_lossy())?;
    info!("event=cli_start module=cli status=ok");

    let store = FileDocumentStore::open(&config.data_dir)?;
    let mut service = NutritionService::open(store)?;
    for warning in &service.load_report().warnings {
        eprintln!("warning: {warning}");
    }

    match cli.command {
        Commands::Version => {}
        Commands::Foods => print_foods(&service),
        Commands::Search { all, terms } => {
            for food in service.search_foods(&terms, all) {
                println!("{} ({}) - {:.1} calories", food.name(), food.kind(), food.calories());
            }
        }
        Commands::Day { date } => {
            print_day(&service, &date.unwrap_or_else(DateKey::today));
        }
        Commands::Log {
            food,
            servings,
            date,
        } => {
            let date = date.unwrap_or_else(DateKey::today);
            let entry = service.log_food(&date, &food, servings)?;
            service.save()?;
            println!(
                "logged {} serving(s) of {} ({:.1} calories) on {date}",
                entry.servings, entry.food, entry.calories
            );
        }
        Commands::Delete { index, date } => {
            let date = date.unwrap_or_else(DateKey::today);
            let entry = service.delete_entry(&date, usize::try_from(index - 1)?)?;
            service.save()?;
            println!("deleted {} from {date}", entry.food);
        }
    }
    Ok(())
}

fn print_foods(service: &NutritionService<FileDocumentStore>) {
    let catalog = service.catalog();
    println!("=== All Foods in Database ({}) ===", catalog.len());
    for food in catalog.foods() {
        println!("{} ({}) - {:.1} calories", food.name(), food.kind(), food.calories());
        for (component, servings) in food.components() {
            println!("  - {} x{}", component.name(), servings);
        }
    }
}

fn print_day(service: &NutritionService<FileDocumentStore>, date: &DateKey) {
    let entries = service.diary().entries(date);
    if entries.is_empty() {
        println!("No food entries for {date}");
    }
    for (position, entry) in entries.iter().enumerate() {
        println!(
            "{}. {} - {} serving(s) - {:.1} calories",
            position + 1,
            entry.food,
            entry.servings,
            entry.calories
        );
    }

    let summary = service.calorie_summary(date);
    println!("Target:   {:.0} calories", summary.target);
    println!("Consumed: {:.0} calories", summary.consumed);
    if summary.is_over_target() {
        println!("Over target by {:.0} calories", summary.difference);
    } else {
        println!("Remaining: {:.0} calories", -summary.difference);
    }
}
