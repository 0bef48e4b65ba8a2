// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "gridfilter";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "gridfilter.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "GRIDFILTER_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "GRIDFILTER_LOG";

/// Environment variable for the filter server base URI
pub const ENV_FILTER_SERVER_URI: &str = "GRIDFILTER_FILTER_SERVER_URI";

/// Environment variable for the network store base URI
pub const ENV_NETWORK_STORE_URI: &str = "GRIDFILTER_NETWORK_STORE_URI";

/// Environment variable for the SQL dialect
pub const ENV_DIALECT: &str = "GRIDFILTER_DIALECT";

/// Environment variable to disable collaborator caching
pub const ENV_NO_CACHE: &str = "GRIDFILTER_NO_CACHE";

// =============================================================================
// Collaborator Defaults
// =============================================================================

/// Default filter server base URI
pub const DEFAULT_FILTER_SERVER_URI: &str = "http://filter-server/";

/// Default network store base URI
pub const DEFAULT_NETWORK_STORE_URI: &str = "http://network-store-server/";

/// Default HTTP timeout for collaborator calls
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default attempts for collaborator calls (first try included)
pub const DEFAULT_HTTP_RETRY_ATTEMPTS: u32 = 3;

/// Variant used when none is given
pub const DEFAULT_VARIANT_ID: &str = "InitialState";

// =============================================================================
// Compilation
// =============================================================================

/// Largest IN list rendered as one clause; longer lists are OR-ed in chunks
pub const DEFAULT_MAX_IN_CLAUSE_SIZE: usize = 500;

/// Largest number of descriptors accepted in one filter list
pub const DEFAULT_MAX_FILTERS: usize = 1000;

// =============================================================================
// Cache
// =============================================================================

/// Default cache capacity (entries per store)
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1_000;

/// Default cache TTL
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
