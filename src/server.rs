// ABOUTME: Router assembly and serve loop for the HTTP API
// ABOUTME: Layers request tracing, CORS, and body limits over the route modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! HTTP server assembly
//!
//! Requests are handled independently start to finish; the only cross-request
//! state is the shared [`ServerResources`] bundle.

use anyhow::Result;
use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

use crate::resources::ServerResources;
use crate::routes::{HealthRoutes, RecipeRoutes};

/// Maximum request body size; base64-encoded photos are large
const MAX_BODY_BYTES: usize = 15 * 1024 * 1024;

/// Build the application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(RecipeRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Bind the listener and serve until shutdown
///
/// # Errors
/// Returns an error if the port cannot be bound or the server loop fails.
pub async fn serve(resources: Arc<ServerResources>, http_port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, router(resources)).await?;
    Ok(())
}
