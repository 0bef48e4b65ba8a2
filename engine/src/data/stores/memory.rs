use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::provider::{FilterStore, NetworkStore};
use crate::core::constants::DEFAULT_VARIANT_ID;
use crate::data::error::FilterError;
use crate::domain::criteria::GenericFilter;
use crate::domain::network::{NetworkData, NetworkSnapshot};

/// Filter metadata held in memory
#[derive(Debug, Default)]
pub struct MemoryFilterStore {
    filters: RwLock<FxHashMap<Uuid, GenericFilter>>,
}

impl MemoryFilterStore {
    pub fn new(filters: impl IntoIterator<Item = GenericFilter>) -> Self {
        Self {
            filters: RwLock::new(filters.into_iter().map(|f| (f.id(), f)).collect()),
        }
    }

    /// Load a JSON array of filters
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read filters file {}", path.display()))?;
        let filters: Vec<GenericFilter> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid filters file {}", path.display()))?;
        tracing::debug!(count = filters.len(), path = %path.display(), "Loaded filters from file");
        Ok(Self::new(filters))
    }

    pub async fn insert(&self, filter: GenericFilter) {
        self.filters.write().await.insert(filter.id(), filter);
    }

    pub async fn remove(&self, id: &Uuid) -> Option<GenericFilter> {
        self.filters.write().await.remove(id)
    }
}

#[async_trait]
impl FilterStore for MemoryFilterStore {
    async fn fetch_filters(&self, ids: &[Uuid]) -> Result<Vec<GenericFilter>, FilterError> {
        let filters = self.filters.read().await;
        Ok(ids.iter().filter_map(|id| filters.get(id).cloned()).collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Network document with its identity, as stored in network files
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDocument {
    pub network_id: Uuid,
    #[serde(default = "default_variant_id")]
    pub variant_id: String,
    #[serde(flatten)]
    pub data: NetworkData,
}

fn default_variant_id() -> String {
    DEFAULT_VARIANT_ID.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NetworkDocuments {
    Many(Vec<NetworkDocument>),
    One(NetworkDocument),
}

/// Network snapshots held in memory, keyed by network and variant
#[derive(Debug, Default)]
pub struct MemoryNetworkStore {
    networks: RwLock<FxHashMap<(Uuid, String), Arc<NetworkSnapshot>>>,
}

impl MemoryNetworkStore {
    pub fn new(networks: impl IntoIterator<Item = NetworkSnapshot>) -> Self {
        Self {
            networks: RwLock::new(
                networks
                    .into_iter()
                    .map(|n| ((n.network_id(), n.variant_id().to_string()), Arc::new(n)))
                    .collect(),
            ),
        }
    }

    /// Load one network document or an array of them
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read network file {}", path.display()))?;
        let documents = match serde_json::from_str::<NetworkDocuments>(&json)
            .with_context(|| format!("Invalid network file {}", path.display()))?
        {
            NetworkDocuments::Many(documents) => documents,
            NetworkDocuments::One(document) => vec![document],
        };

        let mut snapshots = Vec::with_capacity(documents.len());
        for document in documents {
            let network_id = document.network_id;
            let snapshot = NetworkSnapshot::from_data(network_id, document.variant_id, document.data)
                .with_context(|| format!("Invalid network {} in {}", network_id, path.display()))?;
            snapshots.push(snapshot);
        }
        tracing::debug!(count = snapshots.len(), path = %path.display(), "Loaded networks from file");
        Ok(Self::new(snapshots))
    }

    pub async fn insert(&self, network: NetworkSnapshot) {
        let key = (network.network_id(), network.variant_id().to_string());
        self.networks.write().await.insert(key, Arc::new(network));
    }
}

#[async_trait]
impl NetworkStore for MemoryNetworkStore {
    async fn fetch_network(
        &self,
        network_id: Uuid,
        variant_id: &str,
    ) -> Result<Arc<NetworkSnapshot>, FilterError> {
        self.networks
            .read()
            .await
            .get(&(network_id, variant_id.to_string()))
            .cloned()
            .ok_or_else(|| FilterError::network_not_found(network_id, variant_id))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
