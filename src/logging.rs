// ABOUTME: Structured logging setup for observability and debugging
// ABOUTME: Configures env-filtered tracing output in compact or JSON format
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! Production logging configuration with structured output

use anyhow::Result;
use std::env;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Default filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize logging from the environment
///
/// `RUST_LOG` controls the filter; `SNAPDISH_LOG_FORMAT=json` switches from
/// the compact human format to JSON lines.
///
/// # Errors
/// Returns an error if a subscriber is already installed.
pub fn init_from_env() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let use_json = env::var("SNAPDISH_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let fmt_layer = if use_json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().compact().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
