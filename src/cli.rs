use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan daily meals from the dish catalog", long_about = None)]
pub struct Cli {
    /// Load dishes from this JSON file instead of the backend
    #[arg(long, global = true)]
    pub catalog_file: Option<PathBuf>,

    /// Backend base URL (overrides MEAL_PLANNER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Settings file (overrides MEAL_PLANNER_SETTINGS_FILE)
    #[arg(long, global = true)]
    pub settings_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List dishes in the catalog
    Dishes {
        /// Only dishes whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Apply a JSON plan file and print daily and monthly summaries
    Plan {
        plan_file: PathBuf,

        /// Switch to this many meals per day after applying the plan (not saved)
        #[arg(long)]
        meals: Option<String>,

        /// Also write the shopping list to this CSV file
        #[arg(long)]
        shopping_csv: Option<PathBuf>,
    },
    /// Show or change saved user settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        meals: Option<String>,
        #[arg(long)]
        calories: Option<String>,
        #[arg(long)]
        weight: Option<String>,
        #[arg(long)]
        height: Option<String>,
        #[arg(long)]
        age: Option<String>,
        /// male or female
        #[arg(long)]
        gender: Option<String>,
        /// low, moderate or high
        #[arg(long)]
        activity: Option<String>,
        /// Use the BMR-derived calorie target
        #[arg(long)]
        use_calculated: Option<bool>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
