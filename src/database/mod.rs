// ABOUTME: Database management over a shared SQLite pool
// ABOUTME: Owns migrations and the one-time default admin seed
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Database Management
//!
//! Storage for identities, sub-profiles and services. Schema is created
//! idempotently at startup; all mutations that touch more than one entity
//! run inside a single transaction.

mod analytics;
mod services;
mod users;

pub use analytics::*;
pub use services::AssignmentSearch;

use crate::models::{Role, User};
use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};
use tracing::info;

/// Database manager for identity and service storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options =
            if database_url.starts_with("sqlite:") && !database_url.contains('?') {
                format!("{database_url}?mode=rwc")
            } else {
                database_url.to_string()
            };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_services().await?;
        Ok(())
    }

    /// Seed the default admin identity iff no admin exists yet.
    /// Returns `true` when seeded, `false` when an admin was already present.
    pub async fn seed_default_admin(&self, email: &str, password_hash: &str) -> Result<bool> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(false);
        }

        let admin = User::new(
            "admin".into(),
            email.to_string(),
            password_hash.to_string(),
            Role::Admin,
        );
        self.insert_user(&mut *self.pool.acquire().await?, &admin)
            .await?;
        info!("seeded default admin identity: {email}");
        Ok(true)
    }
}
