//! Error types module
//!
//! One error enum per layer (lookup, secrets, resolution, signing, transfer) plus
//! `AdapterError`, which wraps them so callers can tell which layer failed and decide on
//! fallback routing or retry. Nothing in the adapter retries or swallows these errors.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like unknown tenants
    Debug,
    /// Warning level - for configuration problems on the mapping side
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Mapping lookup failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Storage mapping not found for tenant {tenant_id}")]
    NotFound { tenant_id: String },

    #[error("Mapping service unreachable for tenant {tenant_id}: {reason}")]
    Unreachable { tenant_id: String, reason: String },

    #[error("Malformed storage mapping for tenant {tenant_id}: {reason}")]
    Malformed { tenant_id: String, reason: String },

    #[error("Invalid tenant id: {0:?}")]
    InvalidTenantId(String),
}

/// Secret store failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Secret store unavailable while reading {name}: {reason}")]
    Unavailable { name: String, reason: String },

    #[error("Access to secret {name} denied: {reason}")]
    Denied { name: String, reason: String },
}

/// Connection strategy resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid storage configuration for tenant {tenant_id}: {reason}")]
    InvalidConfiguration { tenant_id: String, reason: String },

    #[error("Unsupported storage backend {value:?} for tenant {tenant_id}")]
    UnsupportedBackend { tenant_id: String, value: String },

    #[error("Unsupported connection kind {value:?} for tenant {tenant_id}")]
    UnsupportedConnectionKind { tenant_id: String, value: String },

    #[error("Unsupported region {value:?} for tenant {tenant_id}")]
    UnsupportedRegion { tenant_id: String, value: String },

    #[error("Secret resolution failed for tenant {tenant_id}: {source}")]
    Secret {
        tenant_id: String,
        #[source]
        source: SecretError,
    },

    #[error("Failed to build storage session for tenant {tenant_id}: {reason}")]
    Backend { tenant_id: String, reason: String },
}

impl ResolveError {
    pub fn invalid(tenant_id: &str, reason: impl Into<String>) -> Self {
        ResolveError::InvalidConfiguration {
            tenant_id: tenant_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Signed URL generation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignError {
    #[error("Session authenticated via {strategy} cannot generate signed URLs")]
    CannotSign { strategy: String },

    #[error("Unsupported signed URL action: {0}")]
    UnsupportedAction(String),

    #[error("Invalid signed URL lifetime: {0}")]
    InvalidTtl(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Backend(String),
}

/// Object transfer failures.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Which part of the adapter produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureLayer {
    Fetch,
    Resolve,
    Sign,
    Transfer,
    Lifecycle,
}

impl std::fmt::Display for FailureLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureLayer::Fetch => "fetch",
            FailureLayer::Resolve => "resolve",
            FailureLayer::Sign => "sign",
            FailureLayer::Transfer => "transfer",
            FailureLayer::Lifecycle => "lifecycle",
        };
        f.write_str(name)
    }
}

/// Error returned by the adapter facade and router.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Storage adapter for tenant {tenant_id} is not initialized")]
    NotInitialized { tenant_id: String },

    #[error("Storage resolution for tenant {tenant_id} failed: {reason}")]
    ResolutionFailed { tenant_id: String, reason: String },
}

impl AdapterError {
    pub fn layer(&self) -> FailureLayer {
        match self {
            AdapterError::Fetch(_) => FailureLayer::Fetch,
            AdapterError::Resolve(_) => FailureLayer::Resolve,
            AdapterError::Sign(_) => FailureLayer::Sign,
            AdapterError::Transfer(_) => FailureLayer::Transfer,
            AdapterError::NotInitialized { .. } | AdapterError::ResolutionFailed { .. } => {
                FailureLayer::Lifecycle
            }
        }
    }

    /// Machine-readable error code (e.g., "MAPPING_NOT_FOUND")
    pub fn error_code(&self) -> &'static str {
        match self {
            AdapterError::Fetch(FetchError::NotFound { .. }) => "MAPPING_NOT_FOUND",
            AdapterError::Fetch(FetchError::Unreachable { .. }) => "MAPPING_UNREACHABLE",
            AdapterError::Fetch(FetchError::Malformed { .. }) => "MAPPING_MALFORMED",
            AdapterError::Fetch(FetchError::InvalidTenantId(_)) => "INVALID_TENANT_ID",
            AdapterError::Resolve(ResolveError::InvalidConfiguration { .. }) => {
                "INVALID_CONFIGURATION"
            }
            AdapterError::Resolve(ResolveError::UnsupportedBackend { .. }) => {
                "UNSUPPORTED_BACKEND"
            }
            AdapterError::Resolve(ResolveError::UnsupportedConnectionKind { .. }) => {
                "UNSUPPORTED_CONNECTION_KIND"
            }
            AdapterError::Resolve(ResolveError::UnsupportedRegion { .. }) => "UNSUPPORTED_REGION",
            AdapterError::Resolve(ResolveError::Secret { .. }) => "SECRET_RESOLUTION_FAILED",
            AdapterError::Resolve(ResolveError::Backend { .. }) => "SESSION_BUILD_FAILED",
            AdapterError::Sign(SignError::CannotSign { .. }) => "CANNOT_SIGN",
            AdapterError::Sign(SignError::UnsupportedAction(_)) => "UNSUPPORTED_ACTION",
            AdapterError::Sign(SignError::InvalidTtl(_)) => "INVALID_TTL",
            AdapterError::Sign(SignError::InvalidKey(_)) => "INVALID_KEY",
            AdapterError::Sign(SignError::Backend(_)) => "SIGNING_FAILED",
            AdapterError::Transfer(TransferError::AlreadyExists(_)) => "ALREADY_EXISTS",
            AdapterError::Transfer(TransferError::ObjectNotFound(_)) => "OBJECT_NOT_FOUND",
            AdapterError::Transfer(TransferError::InvalidKey(_)) => "INVALID_KEY",
            AdapterError::Transfer(TransferError::Io(_)) => "LOCAL_IO_ERROR",
            AdapterError::Transfer(TransferError::Backend(_)) => "STORAGE_ERROR",
            AdapterError::NotInitialized { .. } => "NOT_INITIALIZED",
            AdapterError::ResolutionFailed { .. } => "RESOLUTION_FAILED",
        }
    }

    /// Whether a caller may reasonably retry the same call later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AdapterError::Fetch(FetchError::Unreachable { .. })
                | AdapterError::Resolve(ResolveError::Secret {
                    source: SecretError::Unavailable { .. },
                    ..
                })
                | AdapterError::Sign(SignError::Backend(_))
                | AdapterError::Transfer(TransferError::Backend(_))
        )
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            AdapterError::Fetch(FetchError::NotFound { .. })
            | AdapterError::Sign(SignError::CannotSign { .. })
            | AdapterError::Sign(SignError::UnsupportedAction(_))
            | AdapterError::Transfer(TransferError::AlreadyExists(_))
            | AdapterError::Transfer(TransferError::ObjectNotFound(_)) => LogLevel::Debug,
            AdapterError::Resolve(ResolveError::InvalidConfiguration { .. })
            | AdapterError::Resolve(ResolveError::UnsupportedBackend { .. })
            | AdapterError::Resolve(ResolveError::UnsupportedConnectionKind { .. })
            | AdapterError::Resolve(ResolveError::UnsupportedRegion { .. })
            | AdapterError::Fetch(FetchError::Malformed { .. }) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
