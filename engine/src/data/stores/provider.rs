use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::data::error::FilterError;
use crate::domain::criteria::GenericFilter;
use crate::domain::network::NetworkSnapshot;

/// Source of named filter metadata
#[async_trait]
pub trait FilterStore: Send + Sync + std::fmt::Debug {
    /// Metadata of the requested filters; unknown ids are left out
    async fn fetch_filters(&self, ids: &[Uuid]) -> Result<Vec<GenericFilter>, FilterError>;

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}

/// Source of network snapshots
#[async_trait]
pub trait NetworkStore: Send + Sync + std::fmt::Debug {
    /// Snapshot of one variant; `NetworkNotFound` when absent
    async fn fetch_network(
        &self,
        network_id: Uuid,
        variant_id: &str,
    ) -> Result<Arc<NetworkSnapshot>, FilterError>;

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}
