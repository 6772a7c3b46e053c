// ABOUTME: Main library entry point for the homeserve services marketplace
// ABOUTME: Wires identity, catalog, lifecycle and role dashboards over SQLite
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![deny(unsafe_code)]

//! # Homeserve
//!
//! A household services marketplace where customers book or request
//! services, vetted professionals carry them out, and admins moderate the
//! catalog and its participants.
//!
//! ## Architecture
//!
//! The crate is organized around a small set of layers:
//! - **Models**: users, professional profiles, and the service entity with
//!   its lifecycle state machine
//! - **Database**: SQLite persistence; every state transition is a
//!   conditional update so concurrent actors resolve to a single winner
//! - **Permissions**: the guard layer dispatching on the closed role set
//! - **Routes**: role-grouped HTTP handlers behind cookie-session auth
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use homeserve::config::environment::ServerConfig;
//! use homeserve::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("homeserve configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Password hashing and server-side session management
pub mod auth;

/// Environment-based configuration management
pub mod config;

/// Shared server resources container
pub mod context;

/// SQLite persistence for users, services and analytics
pub mod database;

/// Typed errors with stable codes and HTTP mappings
pub mod errors;

/// Structured logging initialization
pub mod logging;

/// HTTP middleware for session authentication
pub mod middleware;

/// Domain models and the service lifecycle state machine
pub mod models;

/// Role-based authorization guards
pub mod permissions;

/// HTTP route handlers grouped by role
pub mod routes;

/// Credential document storage for professional signups
pub mod uploads;
