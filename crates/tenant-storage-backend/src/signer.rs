//! Pre-authorized URL generation.

use std::time::Duration;

use chrono::Utc;
use http::Method;
use object_store::signer::Signer;
use tenant_storage_core::{
    SignError, SignedUrl, SignedUrlAction, SignedUrlRequest, MAX_SIGNED_URL_TTL,
};

use crate::keys::object_path;
use crate::session::{BackendFamily, SigningHandle, StorageSession};

const AZURE_BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

fn validate_ttl(ttl: Duration) -> Result<(), SignError> {
    if ttl.is_zero() {
        return Err(SignError::InvalidTtl("lifetime must be positive".to_string()));
    }
    if ttl > MAX_SIGNED_URL_TTL {
        return Err(SignError::InvalidTtl(format!(
            "{}s exceeds the maximum of {}s",
            ttl.as_secs(),
            MAX_SIGNED_URL_TTL.as_secs()
        )));
    }
    Ok(())
}

impl StorageSession {
    /// Sign a URL for one action on one object.
    ///
    /// Sessions that cannot sign fail with `CannotSign` before anything is computed.
    /// Signing itself is local; no request is sent to the backend.
    #[tracing::instrument(
        skip(self, request),
        fields(container = %self.container_name(), key = %request.object_key, action = %request.action)
    )]
    pub async fn sign(&self, request: &SignedUrlRequest) -> Result<SignedUrl, SignError> {
        let signer = match (&self.signer, self.strategy().can_sign()) {
            (Some(signer), true) => signer,
            _ => {
                return Err(SignError::CannotSign {
                    strategy: self.strategy().to_string(),
                })
            }
        };

        validate_ttl(request.ttl)?;
        let location = object_path(&request.object_key).map_err(SignError::InvalidKey)?;

        let method = match request.action {
            SignedUrlAction::Upload => Method::PUT,
            SignedUrlAction::Download => Method::GET,
        };
        let expires_at = Utc::now()
            + chrono::Duration::from_std(request.ttl)
                .map_err(|e| SignError::InvalidTtl(e.to_string()))?;

        let result = match signer {
            SigningHandle::Azure(store) => {
                store
                    .signed_url(method.clone(), &location, request.ttl)
                    .await
            }
            SigningHandle::S3(store) => {
                store
                    .signed_url(method.clone(), &location, request.ttl)
                    .await
            }
        };

        let url = result.map_err(|e| {
            tracing::debug!(
                error = %e,
                container = %self.container_name(),
                key = %request.object_key,
                "Signed URL generation failed"
            );
            SignError::Backend(e.to_string())
        })?;

        // Azure rejects a PUT to a SAS URL unless the blob type is given.
        let required_headers = match (self.family(), request.action) {
            (BackendFamily::AzureBlob, SignedUrlAction::Upload) => vec![(
                AZURE_BLOB_TYPE_HEADER.to_string(),
                "BlockBlob".to_string(),
            )],
            _ => Vec::new(),
        };

        tracing::debug!(
            container = %self.container_name(),
            key = %request.object_key,
            action = %request.action,
            ttl_secs = request.ttl.as_secs(),
            "Signed URL generated"
        );

        Ok(SignedUrl {
            url,
            method: method.as_str().to_string(),
            action: request.action,
            object_key: request.object_key.clone(),
            expires_at,
            required_headers,
        })
    }
}
