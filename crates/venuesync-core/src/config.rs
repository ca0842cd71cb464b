use std::env;
use std::path::PathBuf;

use crate::error::{ImportError, Result};

pub const DEFAULT_TABLE_PREFIX: &str = "wp_";
pub const DEFAULT_CSV_PATH: &str = "data.csv";

/// Destination tables; differs between staging and production installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub posts: String,
    pub postmeta: String,
}

impl TableNames {
    pub fn with_prefix(prefix: &str) -> Result<Self> {
        Self::new(format!("{prefix}posts"), format!("{prefix}postmeta"))
    }

    pub fn new(posts: impl Into<String>, postmeta: impl Into<String>) -> Result<Self> {
        let tables = Self {
            posts: posts.into(),
            postmeta: postmeta.into(),
        };
        validate_identifier(&tables.posts)?;
        validate_identifier(&tables.postmeta)?;
        Ok(tables)
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            posts: format!("{DEFAULT_TABLE_PREFIX}posts"),
            postmeta: format!("{DEFAULT_TABLE_PREFIX}postmeta"),
        }
    }
}

/// Table names are formatted into SQL, so only plain identifiers are accepted.
pub fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ImportError::Config(format!("'{name}' is not a valid table name")))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Only rows whose title equals this exactly are processed.
    pub restaurant_filter: Option<String>,
    /// Plan and look up, but do not write.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub database_url: String,
    pub csv_path: PathBuf,
    pub tables: TableNames,
    pub post_type: Option<String>,
    pub options: ImportOptions,
}

pub fn database_url_from_env() -> Result<String> {
    env::var("DATABASE_URL")
        .or_else(|_| env::var("VENUESYNC_DATABASE_URL"))
        .map_err(|_| {
            ImportError::Config("DATABASE_URL (or VENUESYNC_DATABASE_URL) must be set".to_string())
        })
}

pub fn table_prefix_from_env() -> String {
    env::var("VENUESYNC_TABLE_PREFIX").unwrap_or_else(|_| DEFAULT_TABLE_PREFIX.to_string())
}

pub fn post_type_from_env() -> Option<String> {
    env::var("VENUESYNC_POST_TYPE")
        .ok()
        .filter(|value| !value.trim().is_empty())
}
