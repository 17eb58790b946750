//! Session resolution abstraction
//!
//! The adapter only depends on this trait, so tests can hand it prebuilt sessions
//! (for example over `object_store::memory::InMemory`) without secrets or a backend.

use async_trait::async_trait;
use tenant_storage_core::{ResolveError, TenantStorageMapping};

use crate::session::StorageSession;

/// Turns a tenant mapping into a ready storage session.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve credentials and build a session for `mapping`.
    ///
    /// Implementations must not retry and must report the tenant id in every error.
    async fn resolve(&self, mapping: &TenantStorageMapping)
        -> Result<StorageSession, ResolveError>;
}
