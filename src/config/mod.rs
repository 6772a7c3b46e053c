// ABOUTME: Configuration management for the homeserve server
// ABOUTME: Environment-driven typed configuration with startup summary
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Configuration management and persistence

/// Environment-driven server configuration
pub mod environment;

pub use environment::{
    AdminSeedConfig, DatabaseConfig, ServerConfig, SessionConfig, UploadConfig,
};
