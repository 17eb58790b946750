//! Connection strategy resolution.
//!
//! `select_strategy` checks the mapping and resolves the secrets it names;
//! `connect` turns the resulting strategy into a session without touching the network.

use std::sync::Arc;

use async_trait::async_trait;
use tenant_storage_core::{
    BackendKind, ConnectionKind, CrossTenantSecretNames, EndpointOverrides, ResolveError,
    S3Region, SecretStore, SecretValue, TenantStorageMapping,
};

use crate::session::StorageSession;
use crate::strategy::{AzureConnectionString, AzureSasUri, ConnectionStrategy, DelegatedIdentity};
use crate::traits::SessionResolver;
use crate::{azure, s3};

#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    pub cross_tenant_secrets: CrossTenantSecretNames,
    pub endpoints: EndpointOverrides,
}

/// Default resolver: secrets from a `SecretStore`, sessions from `object_store`.
pub struct ConnectionResolver {
    secrets: Arc<dyn SecretStore>,
    options: ResolverOptions,
}

impl ConnectionResolver {
    pub fn new(secrets: Arc<dyn SecretStore>, options: ResolverOptions) -> Self {
        Self { secrets, options }
    }

    /// Validate the mapping and resolve the credential material it refers to.
    pub async fn select_strategy(
        &self,
        mapping: &TenantStorageMapping,
    ) -> Result<ConnectionStrategy, ResolveError> {
        let tenant_id = mapping.tenant_id.as_str();

        // Checked before any secret lookup so a half-configured tenant costs nothing.
        if mapping.cross_tenant && mapping.cross_tenant_id().is_none() {
            return Err(ResolveError::invalid(
                tenant_id,
                "isAzureCrossTenant is set but azureCrossTenantId is missing",
            ));
        }

        match &mapping.backend_kind {
            BackendKind::AzureBlob => {
                check_container(mapping)?;
                self.select_azure(mapping).await
            }
            BackendKind::AmazonS3 => {
                check_container(mapping)?;
                self.select_s3(mapping).await
            }
            BackendKind::Unknown(value) => Err(ResolveError::UnsupportedBackend {
                tenant_id: tenant_id.to_string(),
                value: value.clone(),
            }),
        }
    }

    /// Build the session for an already selected strategy.
    pub fn connect(
        &self,
        strategy: &ConnectionStrategy,
        mapping: &TenantStorageMapping,
    ) -> Result<StorageSession, ResolveError> {
        let container = mapping.container_name.trim();
        let result = match strategy {
            ConnectionStrategy::S3AccessKey { .. } => {
                s3::connect(strategy, container, self.options.endpoints.s3.as_deref())
            }
            _ => azure::connect(
                strategy,
                container,
                &mapping.storage_identifier,
                self.options.endpoints.azure_blob.as_deref(),
            ),
        };

        result.map_err(|reason| {
            tracing::debug!(
                tenant_id = %mapping.tenant_id,
                strategy = %strategy.kind(),
                container = %container,
                error = %reason,
                "Failed to build storage session"
            );
            ResolveError::Backend {
                tenant_id: mapping.tenant_id.clone(),
                reason,
            }
        })
    }

    async fn select_azure(
        &self,
        mapping: &TenantStorageMapping,
    ) -> Result<ConnectionStrategy, ResolveError> {
        let tenant_id = mapping.tenant_id.as_str();

        let kind = match &mapping.connection_kind {
            None => {
                return Err(ResolveError::invalid(
                    tenant_id,
                    "connectionType is required for Azure mappings",
                ))
            }
            Some(kind) => kind,
        };

        match kind {
            ConnectionKind::ConnectionString => {
                let name = required_secret_ref(mapping)?;
                let raw = self.secret(mapping, name).await?;
                let parsed = AzureConnectionString::parse(raw.expose()).map_err(|reason| {
                    ResolveError::invalid(
                        tenant_id,
                        format!("secret {} is not a usable connection string: {}", name, reason),
                    )
                })?;
                Ok(ConnectionStrategy::AzureConnectionString(parsed))
            }
            ConnectionKind::SasUri => {
                let name = required_secret_ref(mapping)?;
                let raw = self.secret(mapping, name).await?;
                let parsed = AzureSasUri::parse(raw.expose()).map_err(|reason| {
                    ResolveError::invalid(
                        tenant_id,
                        format!("secret {} is not a usable SAS URI: {}", name, reason),
                    )
                })?;
                if let Some(container) = parsed.container.as_deref() {
                    if container != mapping.container_name.trim() {
                        return Err(ResolveError::invalid(
                            tenant_id,
                            format!(
                                "SAS URI is scoped to container {} but the mapping names {}",
                                container, mapping.container_name
                            ),
                        ));
                    }
                }
                Ok(ConnectionStrategy::AzureSasUri(parsed))
            }
            ConnectionKind::SharedKey => {
                let account = required_identifier(mapping)?;
                let name = required_secret_ref(mapping)?;
                let key = self.secret(mapping, name).await?;
                Ok(ConnectionStrategy::AzureSharedKey { account, key })
            }
            ConnectionKind::OAuth => {
                let account = required_identifier(mapping)?;
                let identity = match mapping.cross_tenant_id() {
                    Some(directory) if mapping.cross_tenant => {
                        let names = &self.options.cross_tenant_secrets;
                        let client_id = self.secret(mapping, &names.client_id).await?;
                        let client_secret = self.secret(mapping, &names.client_secret).await?;
                        DelegatedIdentity::CrossTenant {
                            tenant_id: directory.to_string(),
                            client_id: client_id.expose().to_string(),
                            client_secret,
                        }
                    }
                    _ => DelegatedIdentity::Ambient,
                };
                Ok(ConnectionStrategy::AzureOAuth { account, identity })
            }
            ConnectionKind::Unknown(value) => Err(ResolveError::UnsupportedConnectionKind {
                tenant_id: tenant_id.to_string(),
                value: value.clone(),
            }),
        }
    }

    async fn select_s3(
        &self,
        mapping: &TenantStorageMapping,
    ) -> Result<ConnectionStrategy, ResolveError> {
        let tenant_id = mapping.tenant_id.as_str();

        let raw_region = mapping.region().ok_or_else(|| {
            ResolveError::invalid(tenant_id, "storageRegion is required for S3 mappings")
        })?;
        let region: S3Region =
            raw_region
                .parse()
                .map_err(|_| ResolveError::UnsupportedRegion {
                    tenant_id: tenant_id.to_string(),
                    value: raw_region.to_string(),
                })?;

        let access_key_id = required_identifier(mapping)?;
        let name = required_secret_ref(mapping)?;
        let secret_access_key = self.secret(mapping, name).await?;

        Ok(ConnectionStrategy::S3AccessKey {
            access_key_id,
            secret_access_key,
            region,
        })
    }

    async fn secret(
        &self,
        mapping: &TenantStorageMapping,
        name: &str,
    ) -> Result<SecretValue, ResolveError> {
        self.secrets.get_secret(name).await.map_err(|source| {
            tracing::debug!(
                tenant_id = %mapping.tenant_id,
                secret = %name,
                store = self.secrets.store_name(),
                error = %source,
                "Secret resolution failed"
            );
            ResolveError::Secret {
                tenant_id: mapping.tenant_id.clone(),
                source,
            }
        })
    }
}

#[async_trait]
impl SessionResolver for ConnectionResolver {
    #[tracing::instrument(
        skip(self, mapping),
        fields(tenant_id = %mapping.tenant_id, backend = %mapping.backend_kind)
    )]
    async fn resolve(
        &self,
        mapping: &TenantStorageMapping,
    ) -> Result<StorageSession, ResolveError> {
        let start = std::time::Instant::now();
        let strategy = self.select_strategy(mapping).await?;
        let session = self.connect(&strategy, mapping)?;

        tracing::info!(
            tenant_id = %mapping.tenant_id,
            strategy = %session.strategy(),
            container = %session.container_name(),
            can_sign = session.can_generate_signed_url(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Storage session resolved"
        );

        Ok(session)
    }
}

fn check_container(mapping: &TenantStorageMapping) -> Result<(), ResolveError> {
    if mapping.container_name.trim().is_empty() {
        return Err(ResolveError::invalid(
            &mapping.tenant_id,
            "containerName is empty",
        ));
    }
    Ok(())
}

fn required_secret_ref(mapping: &TenantStorageMapping) -> Result<&str, ResolveError> {
    mapping.secret_ref().ok_or_else(|| {
        ResolveError::invalid(
            &mapping.tenant_id,
            format!(
                "storageAccessKeySecretRef is required for {} mappings",
                mapping
                    .connection_kind
                    .as_ref()
                    .map(|k| k.as_str().to_string())
                    .unwrap_or_else(|| mapping.backend_kind.to_string())
            ),
        )
    })
}

fn required_identifier(mapping: &TenantStorageMapping) -> Result<String, ResolveError> {
    let identifier = mapping.storage_identifier.trim();
    if identifier.is_empty() {
        return Err(ResolveError::invalid(
            &mapping.tenant_id,
            "storageIdentifier is empty",
        ));
    }
    Ok(identifier.to_string())
}
