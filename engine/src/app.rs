//! Core application

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::filters::{PredicateCompiler, ResultScope, parse_filters_with_limit};
use crate::data::sql::{SqlParams, SqlRenderer};
use crate::data::stores::{
    CachedFilterStore, CachedNetworkStore, FilterStore, HttpFilterStore, HttpNetworkStore,
    MemoryFilterStore, MemoryNetworkStore, NetworkStore,
};
use crate::domain::FilterService;
use crate::domain::criteria::parse_global_filter;
use crate::domain::network::EquipmentType;
use crate::utils::file::{expand_path, read_inline_or_file};

/// Flat result table addressed from the command line
struct ColumnScope {
    result_id_column: String,
}

impl ResultScope for ColumnScope {
    fn result_id_column(&self) -> &str {
        &self.result_id_column
    }

    fn id_column(&self) -> &str {
        "id"
    }
}

/// Arguments of one global filter resolution
struct ResolveRequest {
    network: Uuid,
    variant: String,
    global_filter: String,
    equipment_types: Vec<EquipmentType>,
    column: String,
}

pub struct CoreApp {
    pub config: AppConfig,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self {
            config: AppConfig::load(&cli_config)?,
        };

        match command {
            Commands::Compile {
                owner,
                filters,
                result_column,
                alias,
            } => {
                let filters = read_inline_or_file(&filters)?;
                let (sql, params) = app.compile(owner, &filters, result_column, alias.as_deref())?;
                println!("{}", sql);
                for (index, value) in params.values.iter().enumerate() {
                    println!("  {} = {}", index + 1, value);
                }
                Ok(())
            }
            Commands::Resolve {
                network,
                variant,
                global_filter,
                equipment_types,
                column,
                network_file,
                filters_file,
            } => {
                let (filters, networks) = app
                    .stores(filters_file.as_deref(), network_file.as_deref())
                    .await?;
                let request = ResolveRequest {
                    network,
                    variant,
                    global_filter: read_inline_or_file(&global_filter)?,
                    equipment_types,
                    column,
                };
                let output = app.resolve(filters, networks, request).await?;
                println!("{}", output);
                Ok(())
            }
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    /// Render the WHERE fragment selecting rows of `owner`
    fn compile(
        &self,
        owner: Uuid,
        filters_json: &str,
        result_id_column: String,
        alias: Option<&str>,
    ) -> Result<(String, SqlParams)> {
        let filters = parse_filters_with_limit(filters_json, self.config.compiler.max_filters)?;
        let scope = ColumnScope { result_id_column };
        let predicate = PredicateCompiler::new(self.config.compiler.max_in_clause_size)
            .compile_for_result(&scope, owner, &filters)?;

        let mut params = SqlParams::default();
        let sql = SqlRenderer::new(self.config.compiler.dialect.dialect())
            .with_alias(alias.unwrap_or_default())
            .render(&predicate, &mut params);
        tracing::debug!(
            dialect = %self.config.compiler.dialect,
            binds = params.len(),
            "Rendered filter predicate"
        );
        Ok((sql, params))
    }

    /// Resolve a global filter to the JSON of its descriptor, `null` when none
    async fn resolve(
        &self,
        filters: Arc<dyn FilterStore>,
        networks: Arc<dyn NetworkStore>,
        request: ResolveRequest,
    ) -> Result<String> {
        let Some(global_filter) = parse_global_filter(&request.global_filter)? else {
            tracing::debug!("No global filter given");
            return Ok("null".to_string());
        };

        let service = FilterService::new(filters, networks);
        let descriptor = service
            .resource_filter(
                request.network,
                &request.variant,
                &global_filter,
                &request.equipment_types,
                &request.column,
            )
            .await?;
        Ok(serde_json::to_string_pretty(&descriptor)?)
    }

    /// Collaborator stores, read from files when given, cached when enabled
    async fn stores(
        &self,
        filters_file: Option<&Path>,
        network_file: Option<&Path>,
    ) -> Result<(Arc<dyn FilterStore>, Arc<dyn NetworkStore>)> {
        let http = &self.config.http;

        let filters: Arc<dyn FilterStore> = match filters_file {
            Some(path) => {
                Arc::new(MemoryFilterStore::load(&expand_path(&path.to_string_lossy())).await?)
            }
            None => Arc::new(
                HttpFilterStore::new(
                    &self.config.filter_server_uri,
                    http.timeout,
                    http.retry_attempts,
                )
                .context("Failed to initialize filter store")?,
            ),
        };

        let networks: Arc<dyn NetworkStore> = match network_file {
            Some(path) => {
                Arc::new(MemoryNetworkStore::load(&expand_path(&path.to_string_lossy())).await?)
            }
            None => Arc::new(
                HttpNetworkStore::new(
                    &self.config.network_store_uri,
                    http.timeout,
                    http.retry_attempts,
                )
                .context("Failed to initialize network store")?,
            ),
        };

        tracing::debug!(
            filters = filters.name(),
            networks = networks.name(),
            cached = self.config.cache.enabled,
            "Stores initialized"
        );

        if !self.config.cache.enabled {
            return Ok((filters, networks));
        }
        let cache = &self.config.cache;
        Ok((
            Arc::new(CachedFilterStore::new(filters, cache.max_entries, cache.ttl)),
            Arc::new(CachedNetworkStore::new(networks, cache.max_entries, cache.ttl)),
        ))
    }
}
