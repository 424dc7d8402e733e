// ABOUTME: Storage gateway for recipe photos - blob store trait and implementations
// ABOUTME: Uploads are create-only under per-user timestamped keys, returning public URLs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # Storage Gateway
//!
//! Writes image payloads to an addressed blob store and returns a publicly
//! resolvable URL. Keys take the form `<userId>/<unixTimestampMillis>.png`,
//! so no two uploads within a user's namespace collide, and every upload is
//! "create new" — overwriting an existing key is an upload error.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, error};

use crate::errors::{AppError, AppResult};

/// Connection timeout for the blob store
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Request timeout for uploads
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Build the blob key for a user's upload at a point in time
#[must_use]
pub fn object_key(auth_subject: &str, at: DateTime<Utc>) -> String {
    format!("{auth_subject}/{}.png", at.timestamp_millis())
}

/// Content store addressed by key
///
/// `put` creates a new immutable blob and returns its public address; it
/// never replaces an existing key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a new blob, failing if the key already exists
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String>;
}

/// Blob store backed by a bucket HTTP API (Supabase-storage-style REST
/// surface: `POST {base}/object/{bucket}/{key}`)
pub struct HttpBucketStore {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl HttpBucketStore {
    /// Create a store for one bucket
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            bucket: bucket.into(),
            service_key: service_key.into(),
        }
    }

    fn upload_url(&self, key: &str) -> String {
        format!("{}/object/{}/{key}", self.base_url, self.bucket)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/object/public/{}/{key}", self.base_url, self.bucket)
    }
}

#[async_trait]
impl BlobStore for HttpBucketStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let url = self.upload_url(key);
        debug!(key, size = bytes.len(), "uploading blob");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("content-type", content_type)
            // Create-only: the store must reject writes to existing keys
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::upload(format!("blob store request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(key, status = %status, "blob store rejected upload");
            if status.as_u16() == 409 {
                return Err(AppError::upload(format!("blob key already exists: {key}")));
            }
            return Err(AppError::upload(format!(
                "blob store error ({status}): {body}"
            )));
        }

        Ok(self.public_url(key))
    }
}

/// In-memory blob store with the same create-only semantics, for tests and
/// local development
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.lock().len()
    }

    /// Whether a key holds a blob
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned lock only means another test thread panicked mid-insert;
        // the map itself is still usable
        self.objects.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> AppResult<String> {
        let mut objects = self.lock();
        if objects.contains_key(key) {
            return Err(AppError::upload(format!("blob key already exists: {key}")));
        }
        objects.insert(key.to_owned(), bytes);
        Ok(format!("memory://{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_object_key_format() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let key = object_key("30330c5d-6323-4f7d-a62d-368c3c2b6be8", at);
        assert_eq!(
            key,
            format!("30330c5d-6323-4f7d-a62d-368c3c2b6be8/{}.png", at.timestamp_millis())
        );
    }

    #[test]
    fn test_http_store_urls() {
        let store = HttpBucketStore::new("https://example.test/storage/v1/", "food-images", "k");
        assert_eq!(
            store.upload_url("u/1.png"),
            "https://example.test/storage/v1/object/food-images/u/1.png"
        );
        assert_eq!(
            store.public_url("u/1.png"),
            "https://example.test/storage/v1/object/public/food-images/u/1.png"
        );
    }

    #[tokio::test]
    async fn test_memory_store_is_create_only() {
        let store = MemoryBlobStore::new();
        let url = store.put("u/1.png", vec![1, 2, 3], "image/png").await.unwrap();
        assert_eq!(url, "memory://u/1.png");
        assert!(store.contains("u/1.png"));

        let err = store.put("u/1.png", vec![4], "image/png").await.unwrap_err();
        assert!(err.message.contains("already exists"));
        assert_eq!(store.object_count(), 1);
    }
}
