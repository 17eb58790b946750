//! Tenant Storage Adapter
//!
//! Entry point for callers: map a tenant id to its storage, then upload, download or
//! sign URLs without knowing which backend or credential kind is behind it.

pub mod adapter;
pub mod router;

pub use adapter::{AdapterDeps, AdapterState, StorageAdapter};
pub use router::{AdapterPayload, AdapterResponse, RouteRequest, StorageRouter};
