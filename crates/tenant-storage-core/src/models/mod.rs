//! Domain models shared by the lookup, backend and adapter crates.

pub mod mapping;
pub mod signed_url;

pub use mapping::TenantStorageMapping;
pub use signed_url::{
    SignedUrl, SignedUrlAction, SignedUrlRequest, DEFAULT_SIGNED_URL_TTL, MAX_SIGNED_URL_TTL,
};
