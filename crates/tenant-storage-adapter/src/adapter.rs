//! Per-tenant storage facade.
//!
//! A `StorageAdapter` resolves its tenant once and then exposes transfers and URL
//! signing against the resulting session. The lifecycle is an explicit state machine:
//!
//! ```text
//! Uninitialized -> Resolving -> Ready
//!                            \-> Failed
//! ```
//!
//! `Ready` and `Failed` are terminal. A `Resolving` state observed on entry means an
//! earlier `initialize` future was dropped mid-flight; it is turned into `Failed`.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tenant_storage_backend::{create_resolver, SessionResolver, StorageSession};
use tenant_storage_core::{
    AdapterError, Config, LogLevel, SignedUrl, SignedUrlAction, SignedUrlRequest,
    TenantStorageMapping, DEFAULT_SIGNED_URL_TTL,
};
use tenant_storage_lookup::{create_secret_store, MappingClient, MappingSource};

/// Collaborators shared by every adapter.
#[derive(Clone)]
pub struct AdapterDeps {
    pub mappings: Arc<dyn MappingSource>,
    pub resolver: Arc<dyn SessionResolver>,
    /// Lifetime used by `generate_signed_url`
    pub default_ttl: Duration,
}

impl AdapterDeps {
    pub fn new(mappings: Arc<dyn MappingSource>, resolver: Arc<dyn SessionResolver>) -> Self {
        Self {
            mappings,
            resolver,
            default_ttl: DEFAULT_SIGNED_URL_TTL,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Wire the HTTP mapping client, the configured secret store and the default resolver.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mappings = MappingClient::new(config.mapping.base_url.clone(), config.mapping.timeout)?;
        let secrets = create_secret_store(&config.secret_store, config.mapping.timeout)?;
        let resolver = create_resolver(config, secrets);

        Ok(Self::new(Arc::new(mappings), Arc::new(resolver))
            .with_default_ttl(config.default_signed_url_ttl))
    }
}

#[derive(Debug, Clone)]
pub enum AdapterState {
    Uninitialized,
    Resolving,
    Ready {
        mapping: TenantStorageMapping,
        session: StorageSession,
    },
    Failed {
        reason: String,
    },
}

impl AdapterState {
    pub fn name(&self) -> &'static str {
        match self {
            AdapterState::Uninitialized => "uninitialized",
            AdapterState::Resolving => "resolving",
            AdapterState::Ready { .. } => "ready",
            AdapterState::Failed { .. } => "failed",
        }
    }
}

pub struct StorageAdapter {
    tenant_id: String,
    deps: AdapterDeps,
    state: AdapterState,
}

impl StorageAdapter {
    pub fn new(tenant_id: impl Into<String>, deps: AdapterDeps) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            deps,
            state: AdapterState::Uninitialized,
        }
    }

    /// Construct and initialize in one step.
    pub async fn create(
        tenant_id: impl Into<String>,
        deps: AdapterDeps,
    ) -> Result<Self, AdapterError> {
        let mut adapter = Self::new(tenant_id, deps);
        adapter.initialize().await?;
        Ok(adapter)
    }

    /// Fetch the tenant mapping and resolve a session. Runs at most once.
    #[tracing::instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn initialize(&mut self) -> Result<(), AdapterError> {
        match &self.state {
            AdapterState::Ready { .. } => return Ok(()),
            AdapterState::Failed { reason } => {
                return Err(AdapterError::ResolutionFailed {
                    tenant_id: self.tenant_id.clone(),
                    reason: reason.clone(),
                })
            }
            AdapterState::Resolving => {
                let reason = "previous initialization was cancelled".to_string();
                tracing::warn!(tenant_id = %self.tenant_id, "{}", reason);
                self.state = AdapterState::Failed {
                    reason: reason.clone(),
                };
                return Err(AdapterError::ResolutionFailed {
                    tenant_id: self.tenant_id.clone(),
                    reason,
                });
            }
            AdapterState::Uninitialized => {}
        }

        self.state = AdapterState::Resolving;
        let start = Instant::now();

        match self.resolve().await {
            Ok((mapping, session)) => {
                tracing::info!(
                    tenant_id = %self.tenant_id,
                    backend = %session.family(),
                    strategy = %session.strategy(),
                    container = %session.container_name(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Storage adapter ready"
                );
                self.state = AdapterState::Ready { mapping, session };
                Ok(())
            }
            Err(error) => {
                self.log_failure(&error);
                self.state = AdapterState::Failed {
                    reason: error.to_string(),
                };
                Err(error)
            }
        }
    }

    async fn resolve(&self) -> Result<(TenantStorageMapping, StorageSession), AdapterError> {
        let mapping = self.deps.mappings.fetch(&self.tenant_id).await?;
        let session = self.deps.resolver.resolve(&mapping).await?;
        Ok((mapping, session))
    }

    fn ready(&self) -> Result<(&TenantStorageMapping, &StorageSession), AdapterError> {
        match &self.state {
            AdapterState::Ready { mapping, session } => Ok((mapping, session)),
            AdapterState::Failed { reason } => Err(AdapterError::ResolutionFailed {
                tenant_id: self.tenant_id.clone(),
                reason: reason.clone(),
            }),
            AdapterState::Uninitialized | AdapterState::Resolving => {
                Err(AdapterError::NotInitialized {
                    tenant_id: self.tenant_id.clone(),
                })
            }
        }
    }

    fn ready_session(&self) -> Result<&StorageSession, AdapterError> {
        self.ready().map(|(_, session)| session)
    }

    fn log_failure(&self, error: &AdapterError) {
        let layer = error.layer();
        let code = error.error_code();
        match error.log_level() {
            LogLevel::Debug => {
                tracing::debug!(tenant_id = %self.tenant_id, layer = %layer, code, error = %error, "Storage operation failed");
            }
            LogLevel::Warn => {
                tracing::warn!(tenant_id = %self.tenant_id, layer = %layer, code, error = %error, "Storage operation failed");
            }
            LogLevel::Error => {
                tracing::error!(tenant_id = %self.tenant_id, layer = %layer, code, error = %error, "Storage operation failed");
            }
        }
    }

    fn logged<T>(&self, result: Result<T, AdapterError>) -> Result<T, AdapterError> {
        if let Err(error) = &result {
            self.log_failure(error);
        }
        result
    }

    /// Upload a local file, replacing any existing object.
    pub async fn upload(&self, object_key: &str, local_path: &Path) -> Result<u64, AdapterError> {
        self.upload_with(object_key, local_path, true).await
    }

    pub async fn upload_with(
        &self,
        object_key: &str,
        local_path: &Path,
        overwrite: bool,
    ) -> Result<u64, AdapterError> {
        let result = match self.ready_session() {
            Ok(session) => session
                .put_file(object_key, local_path, overwrite)
                .await
                .map_err(AdapterError::from),
            Err(e) => Err(e),
        };
        self.logged(result)
    }

    /// Stream an object into a local file.
    pub async fn download(&self, object_key: &str, local_path: &Path) -> Result<u64, AdapterError> {
        let result = match self.ready_session() {
            Ok(session) => session
                .get_to_file(object_key, local_path)
                .await
                .map_err(AdapterError::from),
            Err(e) => Err(e),
        };
        self.logged(result)
    }

    pub async fn delete(&self, object_key: &str) -> Result<(), AdapterError> {
        let result = match self.ready_session() {
            Ok(session) => session.delete(object_key).await.map_err(AdapterError::from),
            Err(e) => Err(e),
        };
        self.logged(result)
    }

    pub async fn exists(&self, object_key: &str) -> Result<bool, AdapterError> {
        let result = match self.ready_session() {
            Ok(session) => session.exists(object_key).await.map_err(AdapterError::from),
            Err(e) => Err(e),
        };
        self.logged(result)
    }

    /// Whether this adapter can issue signed URLs. False until ready.
    pub fn can_generate_signed_url(&self) -> bool {
        self.session()
            .map(StorageSession::can_generate_signed_url)
            .unwrap_or(false)
    }

    pub async fn generate_signed_url(
        &self,
        object_key: &str,
        action: SignedUrlAction,
    ) -> Result<SignedUrl, AdapterError> {
        self.generate_signed_url_with_ttl(object_key, action, self.deps.default_ttl)
            .await
    }

    pub async fn generate_signed_url_with_ttl(
        &self,
        object_key: &str,
        action: SignedUrlAction,
        ttl: Duration,
    ) -> Result<SignedUrl, AdapterError> {
        self.sign(&SignedUrlRequest::new(object_key, action).with_ttl(ttl))
            .await
    }

    pub async fn sign(&self, request: &SignedUrlRequest) -> Result<SignedUrl, AdapterError> {
        let result = match self.ready_session() {
            Ok(session) => session.sign(request).await.map_err(AdapterError::from),
            Err(e) => Err(e),
        };
        self.logged(result)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AdapterState::Ready { .. })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn state(&self) -> &AdapterState {
        &self.state
    }

    pub fn mapping(&self) -> Option<&TenantStorageMapping> {
        self.ready().ok().map(|(mapping, _)| mapping)
    }

    pub fn session(&self) -> Option<&StorageSession> {
        self.ready().ok().map(|(_, session)| session)
    }

    pub fn container_name(&self) -> Option<&str> {
        self.session().map(StorageSession::container_name)
    }

    pub fn storage_identifier(&self) -> Option<&str> {
        self.session().map(StorageSession::storage_identifier)
    }

    /// Consume a ready adapter, handing out its mapping and session.
    pub fn into_parts(self) -> Result<(TenantStorageMapping, StorageSession), AdapterError> {
        match self.state {
            AdapterState::Ready { mapping, session } => Ok((mapping, session)),
            AdapterState::Failed { reason } => Err(AdapterError::ResolutionFailed {
                tenant_id: self.tenant_id,
                reason,
            }),
            AdapterState::Uninitialized | AdapterState::Resolving => {
                Err(AdapterError::NotInitialized {
                    tenant_id: self.tenant_id,
                })
            }
        }
    }
}
