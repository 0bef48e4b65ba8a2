use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use uuid::Uuid;

use super::provider::{FilterStore, NetworkStore};
use crate::data::error::FilterError;
use crate::domain::criteria::GenericFilter;
use crate::domain::network::{NetworkData, NetworkSnapshot};
use crate::utils::retry::{DEFAULT_BASE_DELAY_MS, retry_with_backoff};

fn build_client(timeout: Duration) -> Result<reqwest::Client, FilterError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn endpoint(base_url: &str, path: &str) -> Result<Url, FilterError> {
    Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), path))
        .map_err(|e| FilterError::invalid(format!("Invalid collaborator URL '{}': {}", base_url, e)))
}

/// Filter metadata from the filter server
#[derive(Debug)]
pub struct HttpFilterStore {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
}

impl HttpFilterStore {
    pub fn new(base_url: &str, timeout: Duration, max_attempts: u32) -> Result<Self, FilterError> {
        let client = build_client(timeout)?;
        endpoint(base_url, "/")?;
        tracing::debug!(base_url = %base_url, "HTTP filter store initialized");
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            max_attempts,
        })
    }

    /// `{base}/v1/filters/metadata?ids=a,b`
    fn metadata_url(&self, ids: &[Uuid]) -> Result<Url, FilterError> {
        let joined = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut url = endpoint(&self.base_url, "/v1/filters/metadata")?;
        url.query_pairs_mut().append_pair("ids", &joined);
        Ok(url)
    }
}

#[async_trait]
impl FilterStore for HttpFilterStore {
    async fn fetch_filters(&self, ids: &[Uuid]) -> Result<Vec<GenericFilter>, FilterError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.metadata_url(ids)?;
        let url = &url;
        let client = &self.client;

        let filters = retry_with_backoff(
            self.max_attempts,
            DEFAULT_BASE_DELAY_MS,
            FilterError::is_transient,
            move || async move {
                let resp = client.get(url.clone()).send().await?;
                if resp.status() == StatusCode::NOT_FOUND {
                    return Ok::<_, FilterError>(Vec::new());
                }
                Ok::<_, FilterError>(resp.error_for_status()?.json::<Vec<GenericFilter>>().await?)
            },
        )
        .await?;

        tracing::debug!(requested = ids.len(), found = filters.len(), "Fetched filter metadata");
        Ok(filters)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Network snapshots from the network store server
#[derive(Debug)]
pub struct HttpNetworkStore {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
}

impl HttpNetworkStore {
    pub fn new(base_url: &str, timeout: Duration, max_attempts: u32) -> Result<Self, FilterError> {
        let client = build_client(timeout)?;
        endpoint(base_url, "/")?;
        tracing::debug!(base_url = %base_url, "HTTP network store initialized");
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            max_attempts,
        })
    }

    /// `{base}/v1/networks/{id}?variantId=v`
    fn network_url(&self, network_id: Uuid, variant_id: &str) -> Result<Url, FilterError> {
        let mut url = endpoint(&self.base_url, &format!("/v1/networks/{}", network_id))?;
        url.query_pairs_mut().append_pair("variantId", variant_id);
        Ok(url)
    }
}

#[async_trait]
impl NetworkStore for HttpNetworkStore {
    async fn fetch_network(
        &self,
        network_id: Uuid,
        variant_id: &str,
    ) -> Result<Arc<NetworkSnapshot>, FilterError> {
        let url = self.network_url(network_id, variant_id)?;
        let url = &url;
        let client = &self.client;

        let data = retry_with_backoff(
            self.max_attempts,
            DEFAULT_BASE_DELAY_MS,
            FilterError::is_transient,
            move || async move {
                let resp = client.get(url.clone()).send().await?;
                if resp.status() == StatusCode::NOT_FOUND {
                    return Ok::<_, FilterError>(None);
                }
                Ok::<_, FilterError>(Some(resp.error_for_status()?.json::<NetworkData>().await?))
            },
        )
        .await?
        .ok_or_else(|| FilterError::network_not_found(network_id, variant_id))?;

        tracing::debug!(
            network_id = %network_id,
            variant_id = %variant_id,
            equipments = data.equipments.len(),
            "Fetched network"
        );
        Ok(Arc::new(NetworkSnapshot::from_data(network_id, variant_id, data)?))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
