//! Tenant Storage Backend Library
//!
//! Turns a tenant mapping into a storage session bound to one Azure Blob container or
//! S3 bucket, signs URLs for single objects and moves bytes through the session.
//!
//! # Object keys
//!
//! Keys are relative to the session's container. A single leading `/` is ignored;
//! empty segments and `..` are rejected. Validation is centralized in the `keys`
//! module so signing and transfers agree on what a key is.

mod azure;
pub mod factory;
pub mod keys;
pub mod resolver;
mod s3;
pub mod session;
pub mod signer;
pub mod strategy;
pub mod traits;
pub mod transfer;

use object_store::RetryConfig;

// Re-export commonly used types
pub use factory::create_resolver;
pub use resolver::{ConnectionResolver, ResolverOptions};
pub use session::{BackendFamily, StorageSession, StrategyKind};
pub use strategy::{
    AzureConnectionString, AzureSasUri, ConnectionStrategy, ConnectionStringCredential,
    DelegatedIdentity,
};
pub use traits::SessionResolver;

/// Failures surface to the caller unchanged; nothing is retried inside a session.
pub(crate) fn retry_disabled() -> RetryConfig {
    RetryConfig {
        max_retries: 0,
        ..Default::default()
    }
}
