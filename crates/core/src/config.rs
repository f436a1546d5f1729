//! TOML-based configuration for the BookMyRoom CSV tools.
//!
//! Connection parameters and file locations come from a config file and can be
//! overridden from the environment; nothing is compiled in.

use crate::error::{BmrError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that replaces `database.path`.
pub const ENV_DATABASE_PATH: &str = "BMR_DATABASE_PATH";
/// Environment variable that replaces `export.output_dir`.
pub const ENV_EXPORT_DIR: &str = "BMR_EXPORT_DIR";

/// Top-level configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BmrConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "bookmyroom.db".into()
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the CSV files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}

/// Import settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_users_file")]
    pub users_file: String,
    #[serde(default = "default_rooms_file")]
    pub rooms_file: String,
    #[serde(default)]
    pub on_invalid_row: RowFailurePolicy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            users_file: default_users_file(),
            rooms_file: default_rooms_file(),
            on_invalid_row: RowFailurePolicy::default(),
        }
    }
}

fn default_users_file() -> String {
    "users.csv".into()
}

fn default_rooms_file() -> String {
    "rooms.csv".into()
}

/// What the importer does with a row it cannot parse (missing column,
/// malformed record, non-numeric capacity or floor).
///
/// Missing references and duplicate natural keys are always skipped at row
/// level and are not affected by this policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RowFailurePolicy {
    /// Roll back every insert made for the file and stop processing it.
    #[default]
    Rollback,
    /// Record the row as an error and continue with the next one.
    Skip,
}

impl BmrConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| BmrError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist. A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|v| !v.is_empty()) {
            self.database.path = path;
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR).filter(|v| !v.is_empty()) {
            self.export.output_dir = dir;
        }
    }

    /// Validate the configuration, returning an error for unusable values.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(BmrError::Config("database.path must not be empty".into()));
        }

        if self.export.output_dir.trim().is_empty() {
            return Err(BmrError::Config(
                "export.output_dir must not be empty".into(),
            ));
        }

        if self.import.users_file.trim().is_empty() {
            return Err(BmrError::Config(
                "import.users_file must not be empty".into(),
            ));
        }

        if self.import.rooms_file.trim().is_empty() {
            return Err(BmrError::Config(
                "import.rooms_file must not be empty".into(),
            ));
        }

        Ok(())
    }
}
