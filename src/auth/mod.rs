//! Authentication system
//!
//! Credential checks for the login form and the gate in front of mutating
//! routes.

pub mod credentials;
pub mod gate;
pub mod validator;

pub use credentials::{Authenticator, ConfigAuthenticator, hash_password};
pub use gate::{AuthGate, Authenticated};
pub use validator::validate_credentials;
