pub mod api_connection;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod nutrition;
pub mod plan_file;
pub mod planner;
pub mod portion;
pub mod settings;
pub mod shopping_list;
pub mod validation;
