// ABOUTME: Shared server resources injected into every route handler
// ABOUTME: Bundles database, session store, document store and configuration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Focused dependency injection context for the HTTP layer.

use crate::auth::SessionManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::uploads::DocumentStore;

/// Shared resources threaded through the router as axum state
pub struct ServerResources {
    /// Persistent storage
    pub database: Database,
    /// Server-held sessions
    pub sessions: SessionManager,
    /// Credential document store
    pub documents: DocumentStore,
    /// Loaded configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the server's long-lived collaborators
    #[must_use]
    pub fn new(
        database: Database,
        sessions: SessionManager,
        documents: DocumentStore,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            sessions,
            documents,
            config,
        }
    }
}
