//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


use anyhow::Context;
use clap::Parser;
use savedrive_gateway::config::{Arguments, Configuration};
use savedrive_gateway::session::CookiePolicy;
use savedrive_gateway::{GatewayContext, GrammersConnector, server};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load arguments from the command line
    let arguments: Arguments = Parser::parse();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load environment variables from .env file if specified
    if let Some(ref env_file) = arguments.env_file {
        if std::path::Path::new(env_file).exists() {
            debug!("Loading environment variables from file: {}", env_file);
            dotenv::from_filename(env_file).ok();
        }
    } else {
        debug!("Loading environment variables from default file");
        dotenv::dotenv().ok();
    }

    // Load configuration from a file with environment variable substitution
    let config = Configuration::load(&arguments.config_file)
        .with_context(|| format!("Unable to load configuration file {}", arguments.config_file))?;
    config.validate()?;

    debug!("Configuration loaded: {:?}", config);
    info!("Starting SavedDrive Gateway...");

    let connector = GrammersConnector::new(*config.telegram.api_id, config.telegram.api_hash.as_str());
    let scratch_dir = config.upload.scratch_path();
    tokio::fs::create_dir_all(&scratch_dir)
        .await
        .with_context(|| format!("Unable to create upload directory {}", scratch_dir.display()))?;

    let context = GatewayContext::new(
        connector,
        config.cookie.key()?,
        CookiePolicy::new(*config.cookie.secure),
        scratch_dir,
        config.files.list_limit,
        config.upload.max_bytes,
    );
    let app = server::router(context);

    let addr = config.http.addr.to_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to bind to {}", addr))?;

    info!(
        "HTTP Server listening on {} ({}:{})",
        config.http.addr,
        config.http.addr.to_ip(),
        config.http.addr.to_port()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("SavedDrive Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
