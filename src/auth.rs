// ABOUTME: Password hashing and server-side session management
// ABOUTME: Maps a successful login to a bounded, revocable session context
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Authentication and Session Management
//!
//! Passwords are bcrypt-hashed; `authenticate(email, password)` keeps its
//! pass/fail contract regardless of the hashing scheme. Sessions are opaque
//! server-held tokens mapping to a [`SessionContext`]; the store is a bounded
//! LRU so unauthenticated churn cannot grow memory without bound. Logout
//! revokes the token explicitly; there is no other expiry.

use crate::errors::{AppError, AppResult};
use crate::models::{Role, User};
use lru::LruCache;
use rand::{distributions::Alphanumeric, Rng};
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Length of generated session tokens
const SESSION_TOKEN_LEN: usize = 48;

/// Server-held context for an authenticated identity
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Authenticated user id
    pub user_id: Uuid,
    /// Role fixed at login
    pub role: Role,
    /// Display name for the view layer
    pub display_name: String,
}

/// Bounded in-memory session store keyed by opaque token
pub struct SessionManager {
    sessions: Mutex<LruCache<String, SessionContext>>,
}

impl SessionManager {
    /// Create a session store holding at most `capacity` live sessions
    /// (minimum 1). Oldest sessions are evicted when the bound is reached.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Create a session for an authenticated user and return its token
    pub fn create_session(&self, user: &User) -> String {
        let token = generate_session_token();
        let context = SessionContext {
            user_id: user.id,
            role: user.role,
            display_name: user.name.clone(),
        };
        self.lock().put(token.clone(), context);
        token
    }

    /// Resolve a token to its session context, refreshing its LRU position
    pub fn get(&self, token: &str) -> Option<SessionContext> {
        self.lock().get(token).cloned()
    }

    /// Revoke a session (logout)
    pub fn revoke(&self, token: &str) {
        self.lock().pop(token);
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no sessions are live
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, SessionContext>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Generate an opaque alphanumeric session token
fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

/// Verify a password against its stored hash
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| AppError::internal(format!("password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn test_user(name: &str) -> User {
        User::new(
            name.into(),
            format!("{name}@example.com"),
            "hash".into(),
            Role::Customer,
        )
    }

    #[test]
    fn test_session_create_get_revoke() {
        let sessions = SessionManager::new(8);
        let user = test_user("alice");

        let token = sessions.create_session(&user);
        let context = sessions.get(&token).unwrap();
        assert_eq!(context.user_id, user.id);
        assert_eq!(context.role, Role::Customer);
        assert_eq!(context.display_name, "alice");

        sessions.revoke(&token);
        assert!(sessions.get(&token).is_none());
    }

    #[test]
    fn test_unknown_token_resolves_to_none() {
        let sessions = SessionManager::new(8);
        assert!(sessions.get("nope").is_none());
    }

    #[test]
    fn test_session_store_is_bounded() {
        let sessions = SessionManager::new(2);
        let first = sessions.create_session(&test_user("a"));
        let _second = sessions.create_session(&test_user("b"));
        let _third = sessions.create_session(&test_user("c"));

        assert_eq!(sessions.len(), 2);
        // Oldest evicted
        assert!(sessions.get(&first).is_none());
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_eq!(a.len(), SESSION_TOKEN_LEN);
        assert_ne!(a, b);
    }
}
