// ABOUTME: Route module organization for the Snapdish HTTP endpoints
// ABOUTME: Groups health checks and the recipe ingestion/read endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! Route modules
//!
//! Each domain module exposes a `Routes` struct whose `routes()` method
//! builds an axum router with thin handlers over the shared resources.

/// Health check and readiness routes
pub mod health;
/// Recipe ingestion, pre-check, and read routes
pub mod recipes;

pub use health::HealthRoutes;
pub use recipes::RecipeRoutes;
