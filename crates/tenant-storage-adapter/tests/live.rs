//! Tests against a real S3-compatible endpoint (MinIO, LocalStack, AWS).
//!
//! Run with `cargo test -p tenant-storage-adapter --test live -- --ignored` and:
//!
//! - `LIVE_S3_ENDPOINT` (optional, e.g. `http://localhost:9000`)
//! - `LIVE_S3_BUCKET`, `LIVE_S3_REGION`
//! - `LIVE_S3_ACCESS_KEY_ID`, `LIVE_S3_SECRET_ACCESS_KEY`

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tenant_storage_adapter::{AdapterDeps, StorageAdapter};
use tenant_storage_backend::{ConnectionResolver, ResolverOptions};
use tenant_storage_core::{
    BackendKind, EndpointOverrides, SignedUrlAction, StaticSecretStore, TenantStorageMapping,
};
use tenant_storage_lookup::StaticMappingSource;

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("{} must be set for live tests", name))
}

async fn live_adapter() -> StorageAdapter {
    let mapping = TenantStorageMapping {
        tenant_id: "live".into(),
        backend_kind: BackendKind::AmazonS3,
        connection_kind: None,
        storage_identifier: required("LIVE_S3_ACCESS_KEY_ID"),
        secret_ref: Some("live-secret".into()),
        container_name: required("LIVE_S3_BUCKET"),
        region: Some(required("LIVE_S3_REGION")),
        cross_tenant: false,
        cross_tenant_id: None,
    };
    let secrets = StaticSecretStore::new()
        .with_secret("live-secret", required("LIVE_S3_SECRET_ACCESS_KEY"));
    let options = ResolverOptions {
        endpoints: EndpointOverrides {
            s3: env::var("LIVE_S3_ENDPOINT").ok(),
            azure_blob: None,
        },
        ..Default::default()
    };

    let deps = AdapterDeps::new(
        Arc::new(StaticMappingSource::new().with_mapping(mapping)),
        Arc::new(ConnectionResolver::new(Arc::new(secrets), options)),
    );
    StorageAdapter::create("live", deps).await.unwrap()
}

#[tokio::test]
#[ignore]
async fn signed_urls_round_trip() {
    let adapter = live_adapter().await;
    let http = reqwest::Client::new();
    let key = "tenant-storage-live/round-trip.txt";

    let upload = adapter
        .generate_signed_url(key, SignedUrlAction::Upload)
        .await
        .unwrap();
    let response = http
        .put(upload.url.clone())
        .body("hello")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success(), "PUT returned {}", response.status());

    let download = adapter
        .generate_signed_url(key, SignedUrlAction::Download)
        .await
        .unwrap();
    let response = http.get(download.url.clone()).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "hello");

    // Written through the URL, readable through the session
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("via-session.txt");
    adapter.download(key, &target).await.unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"hello");

    // A download URL does not authorize a write
    let response = http
        .put(download.url.clone())
        .body("overwrite")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    // An upload URL does not authorize a read
    let response = http.get(upload.url.clone()).send().await.unwrap();
    assert!(response.status().is_client_error());

    adapter.delete(key).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn expired_url_is_rejected() {
    let adapter = live_adapter().await;
    let key = "tenant-storage-live/expiry.txt";

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("expiry.txt");
    std::fs::write(&source, b"expiry").unwrap();
    adapter.upload(key, &source).await.unwrap();

    let signed = adapter
        .generate_signed_url_with_ttl(key, SignedUrlAction::Download, Duration::from_secs(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let response = reqwest::get(signed.url.clone()).await.unwrap();
    assert!(response.status().is_client_error());

    adapter.delete(key).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn file_round_trip() {
    let adapter = live_adapter().await;
    let key = "tenant-storage-live/file.bin";

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.bin");
    let target = dir.path().join("out.bin");
    let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();
    std::fs::write(&source, &payload).unwrap();

    adapter.upload(key, &source).await.unwrap();
    let written = adapter.download(key, &target).await.unwrap();

    assert_eq!(written, payload.len() as u64);
    assert_eq!(std::fs::read(&target).unwrap(), payload);
    adapter.delete(key).await.unwrap();
}
