//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (`--config <path>`)
//! 2. `~/.config/ppdcache/config.toml` (user)
//! 3. `/etc/ppdcache/config.toml` (system)
//!
//! Without an explicit path and without either file, defaults are used.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::LoadedCaches;
use crate::convert::JobRequest;
use crate::options::OptionList;
use crate::{PpdCacheError, Result};

/// ppdcache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Directory holding `<printer>.data` cache files.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Most finishings values reported by a reverse lookup (default: 10).
    #[serde(default = "default_max_finishings")]
    pub max_finishings: usize,
    /// Cache objects kept by the memoized loader (default: 64).
    #[serde(default = "default_loaded_capacity")]
    pub loaded_capacity: u64,
    /// `tracing` filter used by the CLI (default: `ppdcache=info`).
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            max_finishings: default_max_finishings(),
            loaded_capacity: default_loaded_capacity(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ppdcache")
}

fn default_max_finishings() -> usize {
    10
}

fn default_loaded_capacity() -> u64 {
    64
}

fn default_log_filter() -> String {
    "ppdcache=info".to_string()
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist; the standard locations are optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PpdCacheError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PpdCacheError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            PpdCacheError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(PpdCacheError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(dir) = dirs::config_dir() {
            let user_config = dir.join("ppdcache").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/ppdcache/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Cache file for a printer: an existing path is used as is, a bare
    /// printer name resolves to `<cache_dir>/<name>.data`.
    pub fn cache_file(&self, printer: &str) -> PathBuf {
        let path = Path::new(printer);
        if path.exists() || path.components().count() > 1 {
            return path.to_path_buf();
        }
        self.cache_dir.join(format!("{printer}.data"))
    }

    /// Memoized loader sized from this configuration.
    pub fn loaded_caches(&self) -> LoadedCaches {
        LoadedCaches::new(self.loaded_capacity)
    }

    /// Job translation request carrying the configured finishings cap.
    pub fn job_request(&self, options: OptionList, copies: i32) -> JobRequest {
        JobRequest::new(options, copies).max_finishings(self.max_finishings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml("max_finishings = 4\n").unwrap();
        assert_eq!(config.max_finishings, 4);
        assert_eq!(config.job_request(OptionList::new(), 1).max_finishings, 4);
        assert_eq!(config.loaded_capacity, 64);
        assert_eq!(config.log_filter, "ppdcache=info");
    }

    #[test]
    fn bare_printer_names_resolve_into_the_cache_dir() {
        let config = Config {
            cache_dir: PathBuf::from("/var/cache/ppdcache"),
            ..Config::default()
        };
        assert_eq!(
            config.cache_file("office-laser"),
            PathBuf::from("/var/cache/ppdcache/office-laser.data")
        );
        assert_eq!(config.cache_file("./local.data"), PathBuf::from("./local.data"));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = Config::from_toml("loaded_capacity = \"many\"\n").unwrap_err();
        assert!(matches!(err, PpdCacheError::Configuration(_)));
    }
}
