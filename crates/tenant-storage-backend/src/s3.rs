use std::sync::Arc;

use object_store::aws::{AmazonS3, AmazonS3Builder};

use crate::retry_disabled;
use crate::session::StorageSession;
use crate::strategy::ConnectionStrategy;

/// Build an S3 session bound to `bucket`. No network call is made.
///
/// `endpoint_url` points the client at an S3-compatible provider
/// (e.g. "http://localhost:9000" for MinIO).
pub(crate) fn connect(
    strategy: &ConnectionStrategy,
    bucket: &str,
    endpoint_url: Option<&str>,
) -> Result<StorageSession, String> {
    let ConnectionStrategy::S3AccessKey {
        access_key_id,
        secret_access_key,
        region,
    } = strategy
    else {
        return Err("Azure strategy passed to the S3 connector".to_string());
    };

    // Explicit credentials only; ambient AWS_* variables must not leak into a tenant session.
    let mut builder = AmazonS3Builder::new()
        .with_region(region.as_str())
        .with_bucket_name(bucket)
        .with_access_key_id(access_key_id.clone())
        .with_secret_access_key(secret_access_key.expose())
        .with_retry(retry_disabled());

    if let Some(endpoint) = endpoint_url {
        let allow_http = endpoint.starts_with("http://");
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(allow_http);
    }

    let store: AmazonS3 = builder.build().map_err(|e| e.to_string())?;

    Ok(StorageSession::s3(
        bucket.to_string(),
        access_key_id.clone(),
        Arc::new(store),
    ))
}
