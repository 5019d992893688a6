//! Configuration loading for Bookshelf.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/bookshelf/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::BookshelfError;

/// Which backend serves keyword searches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchBackend {
    /// Substring scan over the record store
    Relational,
    /// N-gram full-text index
    #[default]
    Index,
}

impl SearchBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchBackend::Relational => "relational",
            SearchBackend::Index => "index",
        }
    }
}

impl std::str::FromStr for SearchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relational" | "db" | "sql" => Ok(SearchBackend::Relational),
            "index" | "fts" => Ok(SearchBackend::Index),
            _ => Err(format!("unknown search backend: {}", s)),
        }
    }
}

impl std::fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchSettings {
    #[serde(default)]
    pub backend: SearchBackend,
}

/// Reindex pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexSettings {
    /// Documents per bulk request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    1000
}

impl Default for ReindexSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB record store directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Root directory holding search indexes (one subdirectory per index)
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Name of the book index
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Memory budget for the index writer, in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub reindex: ReindexSettings,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "bookshelf")
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_index_path() -> String {
    ProjectDirs::from("", "", "bookshelf")
        .map(|p| p.data_local_dir().join("indexes"))
        .unwrap_or_else(|| PathBuf::from("./indexes"))
        .to_string_lossy()
        .to_string()
}

fn default_index_name() -> String {
    "book".to_string()
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            index_path: default_index_path(),
            index_name: default_index_name(),
            writer_memory_mb: default_writer_memory_mb(),
            log_level: default_log_level(),
            search: SearchSettings::default(),
            reindex: ReindexSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/bookshelf/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (BOOKSHELF_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, BookshelfError> {
        let config_dir = ProjectDirs::from("", "", "bookshelf")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| BookshelfError::Config(e.to_string()))?
            .set_default("index_path", default_index_path())
            .map_err(|e| BookshelfError::Config(e.to_string()))?
            .set_default("index_name", default_index_name())
            .map_err(|e| BookshelfError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| BookshelfError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| BookshelfError::Config(e.to_string()))?
            .set_default("search.backend", SearchBackend::default().as_str())
            .map_err(|e| BookshelfError::Config(e.to_string()))?
            .set_default("reindex.batch_size", default_batch_size() as i64)
            .map_err(|e| BookshelfError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // BOOKSHELF_DB_PATH, BOOKSHELF_SEARCH__BACKEND, BOOKSHELF_REINDEX__BATCH_SIZE
        builder = builder.add_source(
            Environment::with_prefix("BOOKSHELF")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| BookshelfError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| BookshelfError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), BookshelfError> {
        if self.reindex.batch_size == 0 {
            return Err(BookshelfError::Config(
                "reindex.batch_size must be > 0".to_string(),
            ));
        }
        if self.writer_memory_mb == 0 {
            return Err(BookshelfError::Config(
                "writer_memory_mb must be > 0".to_string(),
            ));
        }
        if self.index_name.is_empty()
            || !self
                .index_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(BookshelfError::Config(format!(
                "index_name must be non-empty ASCII [A-Za-z0-9_-], got {:?}",
                self.index_name
            )));
        }
        Ok(())
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// Expand ~ in index_path to the home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        expand_home(&self.index_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base) = directories::BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.index_name, "book");
        assert_eq!(settings.reindex.batch_size, 1000);
        assert_eq!(settings.writer_memory_mb, 50);
        assert_eq!(settings.search.backend, SearchBackend::Index);
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.index_name, "book");
        assert_eq!(settings.reindex.batch_size, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bookshelf.toml");
        std::fs::write(
            &path,
            "index_name = \"library\"\n[search]\nbackend = \"relational\"\n[reindex]\nbatch_size = 50\n",
        )
        .unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.index_name, "library");
        assert_eq!(settings.search.backend, SearchBackend::Relational);
        assert_eq!(settings.reindex.batch_size, 50);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut settings = Settings::default();
        settings.reindex.batch_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_index_name() {
        let mut settings = Settings::default();
        settings.index_name = "../escape".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(
            "relational".parse::<SearchBackend>().unwrap(),
            SearchBackend::Relational
        );
        assert_eq!("fts".parse::<SearchBackend>().unwrap(), SearchBackend::Index);
        assert!("nope".parse::<SearchBackend>().is_err());
    }

    #[test]
    fn test_expand_home_passthrough() {
        let settings = Settings {
            db_path: "/var/lib/bookshelf/db".to_string(),
            ..Default::default()
        };
        assert_eq!(
            settings.expanded_db_path(),
            PathBuf::from("/var/lib/bookshelf/db")
        );
    }
}
