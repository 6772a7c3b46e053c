// ABOUTME: Server binary for the homeserve services marketplace
// ABOUTME: Wires config, logging, database, sessions and uploads into the HTTP router
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Homeserve Server Binary
//!
//! Starts the homeserve HTTP API: runs migrations, seeds the default admin
//! account on an empty database, and serves the role-grouped routes.

use anyhow::Result;
use clap::Parser;
use homeserve::{
    auth::{hash_password, SessionManager},
    config::environment::ServerConfig,
    context::ServerResources,
    database::Database,
    logging, routes,
    uploads::DocumentStore,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "homeserve-server")]
#[command(about = "Homeserve - household services marketplace API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Fall back to environment-driven defaults if argument parsing fails
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using default configuration");
            Args {
                http_port: None,
                database_url: None,
            }
        }
    };

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    logging::init_from_env()?;

    info!("Starting Homeserve API");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    database.migrate().await?;
    info!("Database initialized: {}", config.database.url);

    let admin_hash = hash_password(&config.admin.password)
        .map_err(|e| anyhow::anyhow!("failed to hash admin password: {e}"))?;
    let seeded = database
        .seed_default_admin(&config.admin.email, &admin_hash)
        .await?;
    if seeded {
        warn!(
            email = %config.admin.email,
            "default admin account seeded; change its password"
        );
    }

    let documents = DocumentStore::new(&config.uploads.dir)
        .await
        .map_err(|e| anyhow::anyhow!("failed to prepare upload directory: {e}"))?;
    let sessions = SessionManager::new(config.sessions.max_sessions);

    let resources = Arc::new(ServerResources::new(database, sessions, documents, config.clone()));
    let app = routes::router(resources);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to install shutdown handler: {e}");
        // Without a handler the server runs until killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
