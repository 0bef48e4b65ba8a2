//! Filter parsing
//!
//! Parses JSON filter definitions into ResourceFilter structs with validation.

use crate::core::constants::DEFAULT_MAX_FILTERS;
use crate::data::error::FilterError;

use super::types::ResourceFilter;

/// Maximum size of filter JSON in bytes (1MB)
const MAX_FILTER_JSON_SIZE: usize = 1024 * 1024;

/// Parse filters from a JSON array, accepting up to [`DEFAULT_MAX_FILTERS`]
pub fn parse_filters(json_str: &str) -> Result<Vec<ResourceFilter>, FilterError> {
    parse_filters_with_limit(json_str, DEFAULT_MAX_FILTERS)
}

/// Parse filters from a JSON array
///
/// Blank input means no filters. Validates JSON size, the filter count and
/// every descriptor's operator / data type / value combination.
pub fn parse_filters_with_limit(
    json_str: &str,
    max_filters: usize,
) -> Result<Vec<ResourceFilter>, FilterError> {
    if json_str.trim().is_empty() {
        return Ok(Vec::new());
    }

    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterError::InvalidFormat(format!(
            "Filter JSON exceeds maximum size of {} bytes",
            MAX_FILTER_JSON_SIZE
        )));
    }

    let filters: Vec<ResourceFilter> = serde_json::from_str(json_str)?;

    if filters.len() > max_filters {
        return Err(FilterError::InvalidFormat(format!(
            "Maximum {} filters allowed",
            max_filters
        )));
    }

    for filter in &filters {
        filter.validate()?;
    }

    Ok(filters)
}
