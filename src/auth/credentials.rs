//! Credential verification
//!
//! The login path asks an [`Authenticator`] whether a username/password pair
//! is acceptable. [`ConfigAuthenticator`] checks against argon2 hashes from
//! the configuration file.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use log::{debug, warn};
use std::collections::HashMap;

use crate::auth::validator::validate_credentials;
use crate::config::UserConfig;
use crate::error::AuthError;

/// Opaque credential check. Implementations may block; callers run them on
/// the blocking pool.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Verifies against the `auth.users` section of the configuration.
pub struct ConfigAuthenticator {
    users: HashMap<String, String>,
    // Verified for unknown usernames so both paths cost one argon2 run.
    dummy_hash: String,
}

impl ConfigAuthenticator {
    /// Builds the user table; every stored hash must be a valid PHC string.
    pub fn new(users: &[UserConfig]) -> Result<Self, AuthError> {
        let mut table = HashMap::with_capacity(users.len());
        for user in users {
            PasswordHash::new(&user.password_hash).map_err(|e| {
                AuthError::Hash(format!("invalid hash for user {}: {}", user.username, e))
            })?;
            table.insert(user.username.clone(), user.password_hash.clone());
        }
        let dummy_hash = hash_password("rax-file-manager-unknown-user")?;
        Ok(Self {
            users: table,
            dummy_hash,
        })
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Authenticator for ConfigAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        if let Err(e) = validate_credentials(username, password) {
            debug!("Rejected login input: {}", e);
            return false;
        }

        let (hash, known) = match self.users.get(username) {
            Some(hash) => (hash.as_str(), true),
            None => (self.dummy_hash.as_str(), false),
        };
        let verified = verify_password(password, hash);
        known && verified
    }
}

/// Hash password using Argon2
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}
