use clap::{Parser, Subcommand};

use std::path::PathBuf;

use uuid::Uuid;

use super::constants::{
    DEFAULT_VARIANT_ID, ENV_CONFIG, ENV_DIALECT, ENV_FILTER_SERVER_URI, ENV_NETWORK_STORE_URI,
    ENV_NO_CACHE,
};
use crate::data::sql::SqlDialect;
use crate::domain::network::EquipmentType;

#[derive(Parser, Debug)]
#[command(name = "gridfilter")]
#[command(version, about = "Filter compilation for grid computation results", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Filter server base URI
    #[arg(long, global = true, env = ENV_FILTER_SERVER_URI)]
    pub filter_server_uri: Option<String>,

    /// Network store base URI
    #[arg(long, global = true, env = ENV_NETWORK_STORE_URI)]
    pub network_store_uri: Option<String>,

    /// SQL dialect used to render predicates (duckdb, postgres)
    #[arg(long, global = true, env = ENV_DIALECT, value_parser = parse_dialect)]
    pub dialect: Option<SqlDialect>,

    /// Largest IN list rendered as a single clause
    #[arg(long, global = true)]
    pub max_in_clause_size: Option<usize>,

    /// Disable caching of filters and networks
    #[arg(long, global = true, env = ENV_NO_CACHE)]
    pub no_cache: bool,
}

/// Parse SQL dialect from CLI/env string
fn parse_dialect(s: &str) -> Result<SqlDialect, String> {
    match s.to_lowercase().as_str() {
        "duckdb" => Ok(SqlDialect::Duckdb),
        "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
        _ => Err(format!(
            "Invalid dialect '{}'. Valid options: duckdb, postgres",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile filter descriptors into a SQL WHERE fragment
    Compile {
        /// Id of the result owning the rows
        #[arg(long)]
        owner: Uuid,

        /// JSON array of descriptors, or @file
        #[arg(long)]
        filters: String,

        /// Root column holding the owning result id
        #[arg(long, default_value = "result_uuid")]
        result_column: String,

        /// Table alias qualifying root columns
        #[arg(long)]
        alias: Option<String>,
    },
    /// Resolve a global filter into an identifier descriptor
    Resolve {
        /// Network id
        #[arg(long)]
        network: Uuid,

        /// Network variant
        #[arg(long, default_value = DEFAULT_VARIANT_ID)]
        variant: String,

        /// Global filter JSON, or @file
        #[arg(long)]
        global_filter: String,

        /// Equipment categories to resolve (repeatable or comma separated)
        #[arg(long = "equipment-type", required = true, value_delimiter = ',')]
        equipment_types: Vec<EquipmentType>,

        /// Column the resulting descriptor applies to
        #[arg(long)]
        column: String,

        /// Read networks from a JSON file instead of the network store
        #[arg(long)]
        network_file: Option<PathBuf>,

        /// Read filters from a JSON file instead of the filter server
        #[arg(long)]
        filters_file: Option<PathBuf>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub filter_server_uri: Option<String>,
    pub network_store_uri: Option<String>,
    pub dialect: Option<SqlDialect>,
    pub max_in_clause_size: Option<usize>,
    pub no_cache: bool,
}

impl Cli {
    /// Split into layered settings and the command to run
    pub fn into_parts(self) -> (CliConfig, Commands) {
        let config = CliConfig {
            config: self.config,
            filter_server_uri: self.filter_server_uri,
            network_store_uri: self.network_store_uri,
            dialect: self.dialect,
            max_in_clause_size: self.max_in_clause_size,
            no_cache: self.no_cache,
        };
        (config, self.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    Cli::parse().into_parts()
}
