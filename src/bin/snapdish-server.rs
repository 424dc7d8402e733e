// ABOUTME: Server binary wiring configuration, database, storage, and the LLM client
// ABOUTME: Starts the image-to-recipe ingestion API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # Snapdish Server Binary

use anyhow::Result;
use clap::Parser;
use snapdish_server::{
    auth::AuthValidator,
    config::ServerConfig,
    database::Database,
    extraction::RecipeExtractor,
    llm::OpenAiProvider,
    logging,
    resources::ServerResources,
    server,
    storage::HttpBucketStore,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "snapdish-server")]
#[command(about = "Snapdish - image-to-recipe ingestion API")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    info!("starting Snapdish server");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;
    info!("database initialized");

    let storage = Arc::new(HttpBucketStore::new(
        &config.storage.base_url,
        &config.storage.bucket,
        &config.storage.service_key,
    ));

    let provider = OpenAiProvider::from_env()?;
    info!(provider = ?provider, "extraction provider initialized");
    let ai = Arc::new(RecipeExtractor::new(provider));

    let auth = AuthValidator::new(config.jwt_secret.as_bytes());

    let resources = Arc::new(ServerResources::new(database, storage, ai, auth));

    server::serve(resources, config.http_port).await
}
