// ABOUTME: Environment-based configuration loading with sensible defaults
// ABOUTME: Covers HTTP port, database URL, upload directory, sessions and admin seed
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Environment-based server configuration.
//!
//! Every setting has a default suitable for local development; production
//! deployments override via environment variables.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8080;
/// Default SQLite database URL
const DEFAULT_DATABASE_URL: &str = "sqlite:./data/homeserve.db";
/// Default credential upload directory
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
/// Default bound on live sessions
const DEFAULT_MAX_SESSIONS: usize = 10_000;
/// Default seeded admin identity
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Credential document upload configuration
    pub uploads: UploadConfig,
    /// Session store configuration
    pub sessions: SessionConfig,
    /// Default admin seeded at first startup
    pub admin: AdminSeedConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,
}

/// Credential upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Server-controlled asset directory for professional credentials
    pub dir: PathBuf,
}

/// Session store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of live sessions held server-side
    pub max_sessions: usize,
}

/// Seeded admin identity, created once iff no admin exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSeedConfig {
    /// Admin login email
    pub email: String,
    /// Admin initial password (hashed before storage)
    #[serde(skip_serializing)]
    pub password: String,
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// development defaults
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| AppError::config(format!("invalid HTTP_PORT '{value}': {e}")))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let max_sessions = match env::var("MAX_SESSIONS") {
            Ok(value) => value
                .parse::<usize>()
                .map_err(|e| AppError::config(format!("invalid MAX_SESSIONS '{value}': {e}")))?,
            Err(_) => DEFAULT_MAX_SESSIONS,
        };

        Ok(Self {
            http_port,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into()),
            },
            uploads: UploadConfig {
                dir: env::var("UPLOAD_DIR")
                    .map_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR), PathBuf::from),
            },
            sessions: SessionConfig { max_sessions },
            admin: AdminSeedConfig {
                email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.into()),
                password: env::var("ADMIN_PASSWORD")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.into()),
            },
        })
    }

    /// One-line configuration summary for the startup log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database={} uploads={} max_sessions={} admin={}",
            self.http_port,
            self.database.url,
            self.uploads.dir.display(),
            self.sessions.max_sessions,
            self.admin.email
        )
    }
}
