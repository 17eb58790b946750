//! Resolved storage sessions.

use std::fmt;
use std::sync::Arc;

use object_store::aws::AmazonS3;
use object_store::azure::MicrosoftAzure;
use object_store::ObjectStore;

/// Backend family a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendFamily {
    AzureBlob,
    AmazonS3,
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendFamily::AzureBlob => write!(f, "azure_blob"),
            BackendFamily::AmazonS3 => write!(f, "amazon_s3"),
        }
    }
}

/// Which connection strategy a session was built from, without its secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    AzureConnectionString { has_account_key: bool },
    AzureSasUri,
    AzureSharedKey,
    AzureOAuth { cross_tenant: bool },
    S3AccessKey,
}

impl StrategyKind {
    /// Whether sessions built from this strategy can sign URLs on their own.
    ///
    /// Only strategies that hold an account key (Azure) or an access key pair (S3) can.
    /// SAS-URI and delegated-identity sessions cannot.
    pub fn can_sign(&self) -> bool {
        match self {
            StrategyKind::AzureConnectionString { has_account_key } => *has_account_key,
            StrategyKind::AzureSasUri => false,
            StrategyKind::AzureSharedKey => true,
            StrategyKind::AzureOAuth { .. } => false,
            StrategyKind::S3AccessKey => true,
        }
    }

    pub fn family(&self) -> BackendFamily {
        match self {
            StrategyKind::S3AccessKey => BackendFamily::AmazonS3,
            _ => BackendFamily::AzureBlob,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::AzureConnectionString { .. } => write!(f, "azure_connection_string"),
            StrategyKind::AzureSasUri => write!(f, "azure_sas_uri"),
            StrategyKind::AzureSharedKey => write!(f, "azure_shared_key"),
            StrategyKind::AzureOAuth {
                cross_tenant: false,
            } => write!(f, "azure_oauth"),
            StrategyKind::AzureOAuth { cross_tenant: true } => {
                write!(f, "azure_oauth_cross_tenant")
            }
            StrategyKind::S3AccessKey => write!(f, "s3_access_key"),
        }
    }
}

/// Concrete store used for signing; only present when the strategy can sign.
#[derive(Clone)]
pub(crate) enum SigningHandle {
    Azure(Arc<MicrosoftAzure>),
    S3(Arc<AmazonS3>),
}

/// A storage session bound to one container or bucket.
///
/// Cheap to clone; clones share the underlying client. The session is never
/// reconfigured after construction.
#[derive(Clone)]
pub struct StorageSession {
    strategy: StrategyKind,
    container: String,
    storage_identifier: String,
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) signer: Option<SigningHandle>,
}

impl StorageSession {
    /// Wrap an arbitrary object store. Sessions built this way cannot sign URLs.
    pub fn new(
        strategy: StrategyKind,
        container: impl Into<String>,
        storage_identifier: impl Into<String>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            strategy,
            container: container.into(),
            storage_identifier: storage_identifier.into(),
            store,
            signer: None,
        }
    }

    pub(crate) fn azure(
        strategy: StrategyKind,
        container: String,
        storage_identifier: String,
        store: Arc<MicrosoftAzure>,
    ) -> Self {
        let signer = strategy
            .can_sign()
            .then(|| SigningHandle::Azure(Arc::clone(&store)));
        Self {
            strategy,
            container,
            storage_identifier,
            store,
            signer,
        }
    }

    pub(crate) fn s3(
        container: String,
        storage_identifier: String,
        store: Arc<AmazonS3>,
    ) -> Self {
        Self {
            strategy: StrategyKind::S3AccessKey,
            container,
            storage_identifier,
            signer: Some(SigningHandle::S3(Arc::clone(&store))),
            store,
        }
    }

    pub fn family(&self) -> BackendFamily {
        self.strategy.family()
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Container (Azure) or bucket (S3) name
    pub fn container_name(&self) -> &str {
        &self.container
    }

    /// Storage account name (Azure) or access key id (S3)
    pub fn storage_identifier(&self) -> &str {
        &self.storage_identifier
    }

    /// Whether `sign` can succeed for this session. No network call.
    pub fn can_generate_signed_url(&self) -> bool {
        self.strategy.can_sign() && self.signer.is_some()
    }
}

impl fmt::Debug for StorageSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSession")
            .field("family", &self.family())
            .field("strategy", &self.strategy)
            .field("container", &self.container)
            .field("storage_identifier", &self.storage_identifier)
            .field("can_sign", &self.can_generate_signed_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    #[test]
    fn capability_table() {
        let capable = [
            StrategyKind::AzureConnectionString {
                has_account_key: true,
            },
            StrategyKind::AzureSharedKey,
            StrategyKind::S3AccessKey,
        ];
        let incapable = [
            StrategyKind::AzureConnectionString {
                has_account_key: false,
            },
            StrategyKind::AzureSasUri,
            StrategyKind::AzureOAuth {
                cross_tenant: false,
            },
            StrategyKind::AzureOAuth { cross_tenant: true },
        ];

        for kind in capable {
            assert!(kind.can_sign(), "{} should sign", kind);
        }
        for kind in incapable {
            assert!(!kind.can_sign(), "{} should not sign", kind);
        }
    }

    #[test]
    fn custom_store_sessions_cannot_sign() {
        let session = StorageSession::new(
            StrategyKind::S3AccessKey,
            "b1",
            "AKIDEXAMPLE",
            Arc::new(InMemory::new()),
        );
        assert_eq!(session.family(), BackendFamily::AmazonS3);
        assert_eq!(session.container_name(), "b1");
        assert!(!session.can_generate_signed_url());
    }

    #[test]
    fn debug_output_names_strategy() {
        let session = StorageSession::new(
            StrategyKind::AzureSasUri,
            "c1",
            "acct1",
            Arc::new(InMemory::new()),
        );
        let printed = format!("{:?}", session);
        assert!(printed.contains("AzureSasUri"));
        assert!(printed.contains("c1"));
    }
}
