use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_FILTER_SERVER_URI, DEFAULT_HTTP_RETRY_ATTEMPTS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MAX_FILTERS, DEFAULT_MAX_IN_CLAUSE_SIZE, DEFAULT_NETWORK_STORE_URI,
};
use crate::data::sql::SqlDialect;
use crate::utils::file::expand_path;

#[derive(Debug, Default, Deserialize)]
pub struct HttpFileConfig {
    pub timeout_secs: Option<u64>,
    pub retry_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheFileConfig {
    pub enabled: Option<bool>,
    pub max_entries: Option<u64>,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompilerFileConfig {
    pub max_in_clause_size: Option<usize>,
    pub max_filters: Option<usize>,
    pub dialect: Option<SqlDialect>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub filter_server_uri: Option<String>,
    pub network_store_uri: Option<String>,
    pub http: Option<HttpFileConfig>,
    pub cache: Option<CacheFileConfig>,
    pub compiler: Option<CompilerFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

/// Collaborator HTTP settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub retry_attempts: u32,
}

/// Filter and network cache settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: u64,
    pub ttl: Duration,
}

/// Predicate compilation settings
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub max_in_clause_size: usize,
    /// Descriptors accepted in one filter list
    pub max_filters: usize,
    pub dialect: SqlDialect,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub filter_server_uri: String,
    pub network_store_uri: String,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub compiler: CompilerConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let config_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match config_path {
            Some(path) => {
                let file_config = FileConfig::load_from_file(&path)?;
                file_config.warn_unknown_fields();
                file_config
            }
            None => FileConfig::default(),
        };

        let config = Self::layer(cli, file_config)?;
        tracing::debug!(
            filter_server = %config.filter_server_uri,
            network_store = %config.network_store_uri,
            dialect = %config.compiler.dialect,
            cache = config.cache.enabled,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn layer(cli: &CliConfig, file: FileConfig) -> Result<Self> {
        let file_http = file.http.unwrap_or_default();
        let file_cache = file.cache.unwrap_or_default();
        let file_compiler = file.compiler.unwrap_or_default();

        let filter_server_uri = cli
            .filter_server_uri
            .clone()
            .or(file.filter_server_uri)
            .unwrap_or_else(|| DEFAULT_FILTER_SERVER_URI.to_string());

        let network_store_uri = cli
            .network_store_uri
            .clone()
            .or(file.network_store_uri)
            .unwrap_or_else(|| DEFAULT_NETWORK_STORE_URI.to_string());

        let retry_attempts = file_http
            .retry_attempts
            .unwrap_or(DEFAULT_HTTP_RETRY_ATTEMPTS);
        if retry_attempts == 0 {
            anyhow::bail!("http.retry_attempts must be at least 1");
        }

        let max_in_clause_size = cli
            .max_in_clause_size
            .or(file_compiler.max_in_clause_size)
            .unwrap_or(DEFAULT_MAX_IN_CLAUSE_SIZE);
        if max_in_clause_size == 0 {
            anyhow::bail!("compiler.max_in_clause_size must be at least 1");
        }

        let max_filters = file_compiler.max_filters.unwrap_or(DEFAULT_MAX_FILTERS);
        if max_filters == 0 {
            anyhow::bail!("compiler.max_filters must be at least 1");
        }

        // cache.enabled: file config sets default, --no-cache CLI flag disables
        let cache_enabled = if cli.no_cache {
            false
        } else {
            file_cache.enabled.unwrap_or(true)
        };

        Ok(Self {
            filter_server_uri,
            network_store_uri,
            http: HttpConfig {
                timeout: Duration::from_secs(
                    file_http.timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
                ),
                retry_attempts,
            },
            cache: CacheConfig {
                enabled: cache_enabled,
                max_entries: file_cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
                ttl: Duration::from_secs(file_cache.ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)),
            },
            compiler: CompilerConfig {
                max_in_clause_size,
                max_filters,
                dialect: cli.dialect.or(file_compiler.dialect).unwrap_or_default(),
            },
        })
    }
}
