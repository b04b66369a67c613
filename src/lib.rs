pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::commands::AppState;
use crate::config::AppConfig;
use crate::error::AppResult;

/// Entry point for embedding shells: reads the environment, starts logging
/// and builds the shared command state.
pub fn bootstrap() -> AppResult<AppState> {
    bootstrap_with(AppConfig::from_env())
}

pub fn bootstrap_with(config: AppConfig) -> AppResult<AppState> {
    std::fs::create_dir_all(&config.data_dir)?;
    crate::utils::logger::init_logging(&config.log_dir())?;
    AppState::new(config)
}
