// ABOUTME: Environment-based configuration for the ingestion service
// ABOUTME: Parses ports, database URL, storage credentials, and the JWT secret from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! Environment-only configuration management
//!
//! All deployment-specific settings come from environment variables; there is
//! no configuration file. `OPENAI_API_KEY` and the model override variables
//! are read by the LLM provider itself.

use anyhow::{Context, Result};
use std::env;

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default database location
const DEFAULT_DATABASE_URL: &str = "sqlite:data/snapdish.db";

/// Default storage bucket for recipe photos
const DEFAULT_STORAGE_BUCKET: &str = "food-images";

/// Blob store connection settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base URL of the storage REST surface (e.g. `https://x.example/storage/v1`)
    pub base_url: String,
    /// Bucket name
    pub bucket: String,
    /// Service key authorizing uploads
    pub service_key: String,
}

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection URL
    pub database_url: String,
    /// Shared secret for validating platform-issued access tokens
    pub jwt_secret: String,
    /// Blob store settings
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error when a required variable is missing or a numeric
    /// variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("SNAPDISH_HTTP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("invalid SNAPDISH_HTTP_PORT: {value}"))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());

        let jwt_secret = env::var("SNAPDISH_JWT_SECRET")
            .context("SNAPDISH_JWT_SECRET environment variable not set")?;

        let storage = StorageConfig {
            base_url: env::var("SNAPDISH_STORAGE_URL")
                .context("SNAPDISH_STORAGE_URL environment variable not set")?,
            bucket: env::var("SNAPDISH_STORAGE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_owned()),
            service_key: env::var("SNAPDISH_STORAGE_SERVICE_KEY")
                .context("SNAPDISH_STORAGE_SERVICE_KEY environment variable not set")?,
        };

        Ok(Self {
            http_port,
            database_url,
            jwt_secret,
            storage,
        })
    }

    /// One-line settings summary with secrets redacted
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database_url={} storage_url={} bucket={}",
            self.http_port, self.database_url, self.storage.base_url, self.storage.bucket
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_redacts_secrets() {
        let config = ServerConfig {
            http_port: 8081,
            database_url: "sqlite::memory:".to_owned(),
            jwt_secret: "super-secret".to_owned(),
            storage: StorageConfig {
                base_url: "https://x.example/storage/v1".to_owned(),
                bucket: "food-images".to_owned(),
                service_key: "service-key".to_owned(),
            },
        };
        let summary = config.summary();
        assert!(!summary.contains("super-secret"));
        assert!(!summary.contains("service-key"));
        assert!(summary.contains("food-images"));
    }
}
