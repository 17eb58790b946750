//! Tenant Storage Core Library
//!
//! Domain models, error types, configuration and the secret resolution contract shared by
//! the lookup, backend and adapter crates.

pub mod config;
pub mod error;
pub mod models;
pub mod secrets;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    BaseConfig, Config, CrossTenantSecretNames, EndpointOverrides, MappingServiceConfig,
    SecretStoreConfig,
};
pub use error::{
    AdapterError, FailureLayer, FetchError, LogLevel, ResolveError, SecretError, SignError,
    TransferError,
};
pub use models::{
    SignedUrl, SignedUrlAction, SignedUrlRequest, TenantStorageMapping, DEFAULT_SIGNED_URL_TTL,
    MAX_SIGNED_URL_TTL,
};
pub use secrets::{EnvSecretStore, SecretStore, SecretValue, StaticSecretStore};
pub use storage_types::{BackendKind, ConnectionKind, S3Region};
