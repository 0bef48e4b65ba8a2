use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use uuid::Uuid;

use super::provider::{FilterStore, NetworkStore};
use crate::data::error::FilterError;
use crate::domain::criteria::GenericFilter;
use crate::domain::network::NetworkSnapshot;

/// Filter store caching metadata per filter id
///
/// Unknown ids are not cached, so a filter created later is picked up.
#[derive(Debug)]
pub struct CachedFilterStore {
    inner: Arc<dyn FilterStore>,
    cache: Cache<Uuid, GenericFilter>,
}

impl CachedFilterStore {
    pub fn new(inner: Arc<dyn FilterStore>, max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    pub async fn invalidate(&self, filter_id: &Uuid) {
        self.cache.invalidate(filter_id).await;
    }
}

#[async_trait]
impl FilterStore for CachedFilterStore {
    async fn fetch_filters(&self, ids: &[Uuid]) -> Result<Vec<GenericFilter>, FilterError> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match self.cache.get(id).await {
                Some(filter) => found.push(filter),
                None => missing.push(*id),
            }
        }
        if missing.is_empty() {
            return Ok(found);
        }

        tracing::trace!(hits = found.len(), misses = missing.len(), "Filter cache lookup");
        for filter in self.inner.fetch_filters(&missing).await? {
            self.cache.insert(filter.id(), filter.clone()).await;
            found.push(filter);
        }
        Ok(found)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Network store caching snapshots per (network, variant)
#[derive(Debug)]
pub struct CachedNetworkStore {
    inner: Arc<dyn NetworkStore>,
    cache: Cache<(Uuid, String), Arc<NetworkSnapshot>>,
}

impl CachedNetworkStore {
    pub fn new(inner: Arc<dyn NetworkStore>, max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { inner, cache }
    }

    /// Drop one variant, e.g. after it was modified
    pub async fn invalidate(&self, network_id: Uuid, variant_id: &str) {
        self.cache
            .invalidate(&(network_id, variant_id.to_string()))
            .await;
    }

    /// Drop every cached variant of a network
    pub fn invalidate_network(&self, network_id: Uuid) {
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |(id, _), _| *id == network_id)
        {
            tracing::warn!(error = %e, network_id = %network_id, "Failed to invalidate network cache");
        }
    }
}

#[async_trait]
impl NetworkStore for CachedNetworkStore {
    async fn fetch_network(
        &self,
        network_id: Uuid,
        variant_id: &str,
    ) -> Result<Arc<NetworkSnapshot>, FilterError> {
        let key = (network_id, variant_id.to_string());
        if let Some(network) = self.cache.get(&key).await {
            return Ok(network);
        }
        let network = self.inner.fetch_network(network_id, variant_id).await?;
        self.cache.insert(key, network.clone()).await;
        Ok(network)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
