// ABOUTME: Main library entry point for the Snapdish ingestion service
// ABOUTME: Turns food photos into structured, persisted recipes via a vision model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

#![deny(unsafe_code)]

//! # Snapdish Server
//!
//! An image-to-recipe ingestion API. A mobile client posts a base64-encoded
//! photo; the service pre-checks that the image shows food, uploads it to a
//! blob store, asks a vision model for a schema-validated structured recipe,
//! persists the recipe with its ingredients and ordered instructions in one
//! transaction, and returns the new recipe id.
//!
//! ## Architecture
//!
//! - **storage**: blob store gateway (create-only, per-user timestamped keys)
//! - **llm / extraction**: vision model client with strict structured outputs
//! - **database**: transactional persistence writer over SQLite
//! - **routes**: linear per-request pipeline mapping failures to HTTP errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapdish_server::config::ServerConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ServerConfig::from_env()?;
//! println!("Snapdish configured: {}", config.summary());
//! # Ok(())
//! # }
//! ```

/// Bearer token validation for platform-issued access tokens
pub mod auth;
/// Environment-based configuration
pub mod config;
/// Persistence layer (profiles, recipes, children)
pub mod database;
/// Unified error handling with HTTP status mapping
pub mod errors;
/// Structured extraction client and pre-checks
pub mod extraction;
/// Generative model HTTP clients
pub mod llm;
/// Structured logging setup
pub mod logging;
/// Domain row types
pub mod models;
/// Shared per-process resources
pub mod resources;
/// HTTP route handlers
pub mod routes;
/// Router assembly and serve loop
pub mod server;
/// Blob store gateway
pub mod storage;
