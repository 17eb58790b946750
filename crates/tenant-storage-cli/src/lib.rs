use chrono::{DateTime, Utc};
use serde::Serialize;
use tenant_storage_backend::StorageSession;
use tenant_storage_core::{AdapterError, TenantStorageMapping};

/// JSON view of a resolved tenant.
#[derive(Debug, Serialize)]
pub struct SessionView<'a> {
    pub tenant_id: &'a str,
    pub backend: String,
    pub strategy: String,
    pub container: &'a str,
    pub storage_identifier: &'a str,
    pub can_sign: bool,
    pub mapping: &'a TenantStorageMapping,
}

impl<'a> SessionView<'a> {
    pub fn new(mapping: &'a TenantStorageMapping, session: &'a StorageSession) -> Self {
        Self {
            tenant_id: &mapping.tenant_id,
            backend: session.family().to_string(),
            strategy: session.strategy().to_string(),
            container: session.container_name(),
            storage_identifier: session.storage_identifier(),
            can_sign: session.can_generate_signed_url(),
            mapping,
        }
    }
}

/// JSON error body printed when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub error: String,
    pub code: &'static str,
    pub layer: String,
    pub recoverable: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&AdapterError> for ErrorView {
    fn from(error: &AdapterError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code(),
            layer: error.layer().to_string(),
            recoverable: error.is_recoverable(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tenant_storage_backend::StrategyKind;
    use tenant_storage_core::{BackendKind, FetchError};

    #[test]
    fn error_view_fields() {
        let error = AdapterError::from(FetchError::NotFound {
            tenant_id: "t9".to_string(),
        });
        let view = ErrorView::from(&error);

        assert_eq!(view.code, "MAPPING_NOT_FOUND");
        assert_eq!(view.layer, "fetch");
        assert!(!view.recoverable);
        assert!(view.error.contains("t9"));
    }

    #[test]
    fn session_view_serializes() {
        let mapping = TenantStorageMapping {
            tenant_id: "t2".into(),
            backend_kind: BackendKind::AmazonS3,
            connection_kind: None,
            storage_identifier: "AKIDEXAMPLE".into(),
            secret_ref: Some("t2-secret".into()),
            container_name: "b1".into(),
            region: Some("us-east-1".into()),
            cross_tenant: false,
            cross_tenant_id: None,
        };
        let session = StorageSession::new(
            StrategyKind::S3AccessKey,
            "b1",
            "AKIDEXAMPLE",
            Arc::new(object_store::memory::InMemory::new()),
        );

        let json = serde_json::to_value(SessionView::new(&mapping, &session)).unwrap();
        assert_eq!(json["backend"], "amazon_s3");
        assert_eq!(json["strategy"], "s3_access_key");
        assert_eq!(json["container"], "b1");
        assert_eq!(json["can_sign"], false);
        assert_eq!(json["mapping"]["storageRegion"], "us-east-1");
    }
}

/// Initialize tracing for CLI binaries. Logs go to stderr; stdout carries JSON output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
