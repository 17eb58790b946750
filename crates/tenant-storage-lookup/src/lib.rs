//! Tenant mapping lookup and remote secret resolution.
//!
//! `MappingClient` fetches a tenant's storage mapping from the mapping service
//! (`GET {base}/storageMapping/{tenantId}`). Nothing is cached: every call goes to the
//! service so credential changes are picked up immediately.

pub mod keyvault;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use tenant_storage_core::{
    EnvSecretStore, FetchError, SecretStore, SecretStoreConfig, TenantStorageMapping,
};
use url::Url;

pub use keyvault::KeyVaultSecretStore;

const MAPPING_PATH: &str = "storageMapping";
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Source of tenant storage mappings.
#[async_trait]
pub trait MappingSource: Send + Sync {
    /// Fetch the mapping for `tenant_id`
    async fn fetch(&self, tenant_id: &str) -> Result<TenantStorageMapping, FetchError>;
}

/// HTTP client for the mapping service.
#[derive(Clone, Debug)]
pub struct MappingClient {
    client: Client,
    base_url: Url,
}

impl MappingClient {
    pub fn new(base_url: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        let base_url = if base_url.path().ends_with('/') {
            base_url
        } else {
            let mut url = base_url;
            let path = format!("{}/", url.path());
            url.set_path(&path);
            url
        };

        Self { client, base_url }
    }

    /// URL of the mapping resource for a tenant. The tenant id is percent-encoded.
    pub fn mapping_url(&self, tenant_id: &str) -> Result<Url, FetchError> {
        // Dot segments survive encoding and would be resolved away by join
        if matches!(tenant_id, "." | "..") {
            return Err(FetchError::InvalidTenantId(tenant_id.to_string()));
        }

        self.base_url
            .join(&format!(
                "{}/{}",
                MAPPING_PATH,
                urlencoding::encode(tenant_id)
            ))
            .map_err(|_| FetchError::InvalidTenantId(tenant_id.to_string()))
    }
}

#[async_trait]
impl MappingSource for MappingClient {
    #[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn fetch(&self, tenant_id: &str) -> Result<TenantStorageMapping, FetchError> {
        if tenant_id.trim().is_empty() {
            return Err(FetchError::InvalidTenantId(tenant_id.to_string()));
        }

        let url = self.mapping_url(tenant_id)?;
        let start = std::time::Instant::now();

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(
                    error = %e,
                    tenant_id = %tenant_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Mapping service request failed"
                );
                FetchError::Unreachable {
                    tenant_id: tenant_id.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(tenant_id = %tenant_id, "No storage mapping for tenant");
            return Err(FetchError::NotFound {
                tenant_id: tenant_id.to_string(),
            });
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error_text: String = error_text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            tracing::debug!(
                tenant_id = %tenant_id,
                status = %status,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Mapping service returned an error"
            );
            return Err(FetchError::Unreachable {
                tenant_id: tenant_id.to_string(),
                reason: format!("mapping service returned {}: {}", status, error_text),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Unreachable {
            tenant_id: tenant_id.to_string(),
            reason: format!("failed to read response body: {}", e),
        })?;

        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(FetchError::NotFound {
                tenant_id: tenant_id.to_string(),
            });
        }

        let mapping: Option<TenantStorageMapping> =
            serde_json::from_slice(&body).map_err(|e| {
                tracing::debug!(
                    error = %e,
                    tenant_id = %tenant_id,
                    "Mapping service returned an undecodable body"
                );
                FetchError::Malformed {
                    tenant_id: tenant_id.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let mapping = mapping.ok_or_else(|| FetchError::NotFound {
            tenant_id: tenant_id.to_string(),
        })?;

        tracing::info!(
            tenant_id = %tenant_id,
            backend = %mapping.backend_kind,
            container = %mapping.container_name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Storage mapping fetched"
        );

        Ok(mapping)
    }
}

/// In-memory mapping source for tests and offline tooling.
#[derive(Default)]
pub struct StaticMappingSource {
    mappings: HashMap<String, TenantStorageMapping>,
    failures: HashMap<String, FetchError>,
    fetches: AtomicUsize,
}

impl StaticMappingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mut self, mapping: TenantStorageMapping) -> Self {
        self.mappings.insert(mapping.tenant_id.clone(), mapping);
        self
    }

    /// Make fetches for `tenant_id` fail with `error`
    pub fn with_failure(mut self, tenant_id: impl Into<String>, error: FetchError) -> Self {
        self.failures.insert(tenant_id.into(), error);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MappingSource for StaticMappingSource {
    async fn fetch(&self, tenant_id: &str) -> Result<TenantStorageMapping, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.get(tenant_id) {
            return Err(error.clone());
        }
        self.mappings
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                tenant_id: tenant_id.to_string(),
            })
    }
}

/// Create the secret store selected by configuration.
pub fn create_secret_store(
    config: &SecretStoreConfig,
    timeout: Duration,
) -> anyhow::Result<Arc<dyn SecretStore>> {
    match config {
        SecretStoreConfig::Env { prefix } => Ok(Arc::new(EnvSecretStore::new(prefix.clone()))),
        SecretStoreConfig::KeyVault {
            vault_url,
            authority_host,
            tenant_id,
            client_id,
            client_secret,
        } => {
            let store = KeyVaultSecretStore::new(
                vault_url.clone(),
                authority_host.clone(),
                tenant_id,
                client_id.clone(),
                client_secret.clone(),
                timeout,
            )?;
            Ok(Arc::new(store))
        }
    }
}
