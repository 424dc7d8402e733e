// ABOUTME: Shared per-process resources handed to route handlers as Arc state
// ABOUTME: Bundles the database, blob store, extraction client, and token validator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! Server resources shared across requests
//!
//! Requests never share mutable state; everything here is either immutable
//! configuration or internally synchronized (the connection pool, the HTTP
//! clients).

use std::sync::Arc;

use crate::auth::AuthValidator;
use crate::database::Database;
use crate::extraction::RecipeAi;
use crate::storage::BlobStore;

/// Everything a request handler needs, wired once at startup
pub struct ServerResources {
    /// Persistence layer
    pub database: Database,
    /// Blob store for recipe photos
    pub storage: Arc<dyn BlobStore>,
    /// Vision/extraction model client
    pub ai: Arc<dyn RecipeAi>,
    /// Access token validator
    pub auth: AuthValidator,
}

impl ServerResources {
    /// Bundle the wired components
    #[must_use]
    pub fn new(
        database: Database,
        storage: Arc<dyn BlobStore>,
        ai: Arc<dyn RecipeAi>,
        auth: AuthValidator,
    ) -> Self {
        Self {
            database,
            storage,
            ai,
            auth,
        }
    }
}
