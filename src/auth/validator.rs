//! Credential input validation
//!
//! Rejects malformed login input before any hashing work is done.

use crate::error::AuthError;

/// Upper bound for usernames and passwords, in bytes.
pub const MAX_CREDENTIAL_LENGTH: usize = 256;

/// Performs basic input sanitation to check for malicious or malformed input.
fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Validates the shape of a username/password pair.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if !is_valid_input(username, MAX_CREDENTIAL_LENGTH) {
        return Err(AuthError::MalformedInput("Invalid username format".into()));
    }
    if !is_valid_input(password, MAX_CREDENTIAL_LENGTH) {
        return Err(AuthError::MalformedInput("Invalid password format".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_credentials() {
        assert!(validate_credentials("alice", "correct horse").is_ok());
    }

    #[test]
    fn rejects_blank_and_control_characters() {
        for (user, pass) in [
            ("", "pw"),
            ("   ", "pw"),
            ("alice", ""),
            ("ali\nce", "pw"),
            ("alice", "pw\r\n"),
            ("alice\0", "pw"),
        ] {
            assert!(
                matches!(
                    validate_credentials(user, pass),
                    Err(AuthError::MalformedInput(_))
                ),
                "{user:?}/{pass:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_oversized_input() {
        let long = "a".repeat(MAX_CREDENTIAL_LENGTH + 1);
        assert!(validate_credentials(&long, "pw").is_err());
        assert!(validate_credentials("alice", &long).is_err());
        let max = "a".repeat(MAX_CREDENTIAL_LENGTH);
        assert!(validate_credentials(&max, &max).is_ok());
    }
}
