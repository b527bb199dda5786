use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

use crate::api_connection::endpoints::DEFAULT_API_URL;

pub const API_URL_VAR: &str = "MEAL_PLANNER_API_URL";
pub const SETTINGS_FILE_VAR: &str = "MEAL_PLANNER_SETTINGS_FILE";
pub const LOG_LEVEL_VAR: &str = "MEAL_PLANNER_LOG";

pub const DEFAULT_SETTINGS_FILE: &str = "meal_planner_settings.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub settings_file: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            settings_file: PathBuf::from(DEFAULT_SETTINGS_FILE),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            api_url: non_empty(API_URL_VAR).unwrap_or(defaults.api_url),
            settings_file: non_empty(SETTINGS_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_file),
            log_level: non_empty(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
        }
    }
}
