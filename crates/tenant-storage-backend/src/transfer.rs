//! Object transfers through a resolved session.

use std::ffi::OsString;
use std::path::{Path as LocalPath, PathBuf};
use std::time::Instant;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutMode, PutOptions, PutPayload};
use tenant_storage_core::TransferError;
use tokio::io::AsyncWriteExt;

use crate::keys::object_path;
use crate::session::StorageSession;

fn staging_path(local_path: &LocalPath) -> PathBuf {
    let mut name = OsString::from(local_path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

impl StorageSession {
    fn location(&self, key: &str) -> Result<Path, TransferError> {
        object_path(key).map_err(TransferError::InvalidKey)
    }

    fn map_error(&self, key: &str, error: ObjectStoreError) -> TransferError {
        match error {
            ObjectStoreError::NotFound { .. } => TransferError::ObjectNotFound(key.to_string()),
            ObjectStoreError::AlreadyExists { .. } | ObjectStoreError::Precondition { .. } => {
                TransferError::AlreadyExists(key.to_string())
            }
            other => TransferError::Backend(other.to_string()),
        }
    }

    /// Store `data` under `key`, returning the number of bytes written.
    ///
    /// With `overwrite` false the write is a conditional create and fails with
    /// `AlreadyExists` if the object is present.
    pub async fn put_bytes(
        &self,
        key: &str,
        data: Bytes,
        overwrite: bool,
    ) -> Result<u64, TransferError> {
        let location = self.location(key)?;
        let size = data.len() as u64;
        let start = Instant::now();

        let mode = if overwrite {
            PutMode::Overwrite
        } else {
            PutMode::Create
        };

        self.store
            .put_opts(&location, PutPayload::from(data), PutOptions::from(mode))
            .await
            .map_err(|e| {
                tracing::debug!(
                    error = %e,
                    container = %self.container_name(),
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object upload failed"
                );
                self.map_error(key, e)
            })?;

        tracing::info!(
            container = %self.container_name(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(size)
    }

    /// Upload the contents of a local file.
    pub async fn put_file(
        &self,
        key: &str,
        local_path: &LocalPath,
        overwrite: bool,
    ) -> Result<u64, TransferError> {
        // Validate before touching the filesystem
        self.location(key)?;
        let data = tokio::fs::read(local_path).await?;
        self.put_bytes(key, Bytes::from(data), overwrite).await
    }

    pub async fn get_bytes(&self, key: &str) -> Result<Bytes, TransferError> {
        let location = self.location(key)?;
        let start = Instant::now();

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| self.map_error(key, e))?;
        let bytes = result.bytes().await.map_err(|e| self.map_error(key, e))?;

        tracing::info!(
            container = %self.container_name(),
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(bytes)
    }

    /// Stream an object into a local file, returning the number of bytes written.
    ///
    /// The file is only created once the backend has confirmed the object exists. Data
    /// lands in a `.part` file next to the target and is renamed into place when the
    /// stream completes, so a failed download never leaves a truncated target behind.
    pub async fn get_to_file(&self, key: &str, local_path: &LocalPath) -> Result<u64, TransferError> {
        let location = self.location(key)?;
        let start = Instant::now();

        let result = self.store.get(&location).await.map_err(|e| {
            tracing::debug!(
                error = %e,
                container = %self.container_name(),
                key = %key,
                "Object download failed"
            );
            self.map_error(key, e)
        })?;

        let written = self
            .write_stream(key, local_path, result.into_stream())
            .await?;

        tracing::info!(
            container = %self.container_name(),
            key = %key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(written)
    }

    async fn write_stream<S>(
        &self,
        key: &str,
        local_path: &LocalPath,
        stream: S,
    ) -> Result<u64, TransferError>
    where
        S: Stream<Item = Result<Bytes, ObjectStoreError>> + Unpin,
    {
        let staging = staging_path(local_path);

        let outcome = match self.copy_stream(key, &staging, stream).await {
            Ok(written) => tokio::fs::rename(&staging, local_path)
                .await
                .map(|_| written)
                .map_err(TransferError::from),
            Err(e) => Err(e),
        };

        if outcome.is_err() {
            let _ = tokio::fs::remove_file(&staging).await;
        }
        outcome
    }

    async fn copy_stream<S>(
        &self,
        key: &str,
        staging: &LocalPath,
        mut stream: S,
    ) -> Result<u64, TransferError>
    where
        S: Stream<Item = Result<Bytes, ObjectStoreError>> + Unpin,
    {
        let mut file = tokio::fs::File::create(staging).await?;
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::debug!(
                    error = %e,
                    container = %self.container_name(),
                    key = %key,
                    size_bytes = written,
                    "Object download stream error"
                );
                self.map_error(key, e)
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    pub async fn delete(&self, key: &str) -> Result<(), TransferError> {
        let location = self.location(key)?;
        self.store.delete(&location).await.map_err(|e| {
            tracing::debug!(
                error = %e,
                container = %self.container_name(),
                key = %key,
                "Object delete failed"
            );
            self.map_error(key, e)
        })?;

        tracing::info!(container = %self.container_name(), key = %key, "Object deleted");
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, TransferError> {
        let location = self.location(key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.map_error(key, e)),
        }
    }
}
