pub mod export;
pub mod import;

use std::path::Path;

use bmr_core::config::BmrConfig;
use bmr_core::db::sqlite::SqliteRepository;
use bmr_core::db::DatabasePool;
use tracing::info;

/// Load the config file (defaults when absent), apply environment overrides and validate.
pub fn load_config(config_path: &str) -> anyhow::Result<BmrConfig> {
    let mut config = BmrConfig::load_or_default(Path::new(config_path))?;
    config.apply_env_overrides();
    config.validate()?;

    info!("Loaded configuration from {}", config_path);
    Ok(config)
}

/// Open the configured SQLite database, creating it and its tables if needed.
pub async fn connect(config: &BmrConfig) -> anyhow::Result<SqliteRepository> {
    let connect_str = sqlite_url(&config.database.path);
    let pool = DatabasePool::new_sqlite(&connect_str)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to {}: {e}", config.database.path))?;

    info!("Connected to database");

    let DatabasePool::Sqlite(sqlite_pool) = pool;
    Ok(SqliteRepository::new(sqlite_pool))
}

fn sqlite_url(path: &str) -> String {
    format!("sqlite:{}?mode=rwc", path)
}
