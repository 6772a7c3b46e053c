// ABOUTME: HTTP middleware for the homeserve API
// ABOUTME: Session cookie extraction and request authentication
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! HTTP middleware for session authentication

/// Session-cookie authentication middleware
pub mod auth;

pub use auth::{get_cookie_value, require_session, SESSION_COOKIE};
