#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use object_store::memory::InMemory;
use tenant_storage_backend::{
    ConnectionResolver, ResolverOptions, SessionResolver, StorageSession, StrategyKind,
};
use tenant_storage_core::{
    BackendKind, ConnectionKind, FetchError, ResolveError, StaticSecretStore,
    TenantStorageMapping,
};
use tenant_storage_lookup::MappingSource;

// base64("secret-key-for-tests")
pub const TEST_ACCOUNT_KEY: &str = "c2VjcmV0LWtleS1mb3ItdGVzdHM=";

pub fn shared_key_mapping() -> TenantStorageMapping {
    TenantStorageMapping {
        tenant_id: "t1".into(),
        backend_kind: BackendKind::AzureBlob,
        connection_kind: Some(ConnectionKind::SharedKey),
        storage_identifier: "acct1".into(),
        secret_ref: Some("acct1-key".into()),
        container_name: "c1".into(),
        region: None,
        cross_tenant: false,
        cross_tenant_id: None,
    }
}

pub fn s3_mapping() -> TenantStorageMapping {
    TenantStorageMapping {
        tenant_id: "t2".into(),
        backend_kind: BackendKind::AmazonS3,
        connection_kind: None,
        storage_identifier: "AKIDEXAMPLE".into(),
        secret_ref: Some("t2-secret".into()),
        container_name: "b1".into(),
        region: Some("us-east-1".into()),
        cross_tenant: false,
        cross_tenant_id: None,
    }
}

pub fn oauth_mapping() -> TenantStorageMapping {
    TenantStorageMapping {
        tenant_id: "t3".into(),
        connection_kind: Some(ConnectionKind::OAuth),
        secret_ref: None,
        ..shared_key_mapping()
    }
}

pub fn test_secrets() -> Arc<StaticSecretStore> {
    Arc::new(
        StaticSecretStore::new()
            .with_secret("acct1-key", TEST_ACCOUNT_KEY)
            .with_secret("t2-secret", "wJalrXUtnFEMI"),
    )
}

pub fn connection_resolver(secrets: Arc<StaticSecretStore>) -> Arc<ConnectionResolver> {
    Arc::new(ConnectionResolver::new(secrets, ResolverOptions::default()))
}

/// Resolves every mapping to a session over one shared in-memory store.
pub struct MemoryResolver {
    pub store: Arc<InMemory>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
        }
    }
}

#[async_trait]
impl SessionResolver for MemoryResolver {
    async fn resolve(
        &self,
        mapping: &TenantStorageMapping,
    ) -> Result<StorageSession, ResolveError> {
        Ok(StorageSession::new(
            StrategyKind::AzureSharedKey,
            mapping.container_name.clone(),
            mapping.storage_identifier.clone(),
            self.store.clone(),
        ))
    }
}

/// Mapping source whose fetch never completes.
pub struct PendingSource;

#[async_trait]
impl MappingSource for PendingSource {
    async fn fetch(&self, _tenant_id: &str) -> Result<TenantStorageMapping, FetchError> {
        std::future::pending().await
    }
}

/// Counts events at warn level or above.
#[derive(Clone, Default)]
pub struct AlertCounter(Arc<AtomicUsize>);

impl AlertCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for AlertCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() <= tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
