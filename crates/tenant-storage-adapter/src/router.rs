//! One-shot routing: tenant id in, session or signed URL out.

use tenant_storage_backend::StorageSession;
use tenant_storage_core::{AdapterError, SignedUrl, SignedUrlRequest, TenantStorageMapping};

use crate::adapter::{AdapterDeps, StorageAdapter};

#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub tenant_id: String,
    /// When set, the response carries a signed URL instead of the session
    pub signed_url: Option<SignedUrlRequest>,
}

impl RouteRequest {
    pub fn session(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            signed_url: None,
        }
    }

    pub fn signed_url(tenant_id: impl Into<String>, request: SignedUrlRequest) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            signed_url: Some(request),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AdapterPayload {
    Session(StorageSession),
    SignedUrl(SignedUrl),
}

#[derive(Debug, Clone)]
pub struct AdapterResponse {
    pub mapping: TenantStorageMapping,
    pub payload: AdapterPayload,
}

/// Stateless router; every call fetches and resolves from scratch.
#[derive(Clone)]
pub struct StorageRouter {
    deps: AdapterDeps,
}

impl StorageRouter {
    pub fn new(deps: AdapterDeps) -> Self {
        Self { deps }
    }

    #[tracing::instrument(skip(self, request), fields(tenant_id = %request.tenant_id))]
    pub async fn route(&self, request: RouteRequest) -> Result<AdapterResponse, AdapterError> {
        let adapter = StorageAdapter::create(request.tenant_id, self.deps.clone()).await?;

        let signed = match &request.signed_url {
            Some(sign_request) => Some(adapter.sign(sign_request).await?),
            None => None,
        };

        let (mapping, session) = adapter.into_parts()?;
        let payload = match signed {
            Some(url) => AdapterPayload::SignedUrl(url),
            None => AdapterPayload::Session(session),
        };

        Ok(AdapterResponse { mapping, payload })
    }
}
