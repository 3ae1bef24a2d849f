//! Caller Authentication
//!
//! Bearer tokens presented by a caller are checked against independently
//! configured expected tokens, one per role.

use tracing::warn;

use crate::audit::mac::constant_time_eq;
use crate::error::{GalleryLogError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Writer,
    Reader,
}

impl Role {
    /// Environment variable the caller presents its token in.
    pub fn token_env(&self) -> &'static str {
        match self {
            Role::Writer => "ARTLOG_TOKEN_WRITE",
            Role::Reader => "ARTLOG_TOKEN_READ",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Writer => "writer",
            Role::Reader => "reader",
        }
    }
}

/// Check a presented token against the configured one for `role`.
pub fn authorize(role: Role, provided: Option<&str>, expected: Option<&str>) -> Result<()> {
    let provided = provided
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GalleryLogError::missing_secret("Auth token"))?;
    let expected = expected
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GalleryLogError::missing_secret(&format!("Expected {} token", role.as_str())))?;

    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        warn!("Rejected {} token", role.as_str());
        return Err(GalleryLogError::Unauthorized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_token_is_accepted() {
        assert!(authorize(Role::Writer, Some("writer123"), Some("writer123")).is_ok());
    }

    #[test]
    fn test_wrong_token_is_rejected() {
        assert!(matches!(
            authorize(Role::Reader, Some("reader123"), Some("reader124")),
            Err(GalleryLogError::Unauthorized)
        ));
        assert!(matches!(
            authorize(Role::Reader, Some("reader"), Some("reader123")),
            Err(GalleryLogError::Unauthorized)
        ));
    }

    #[test]
    fn test_missing_tokens_are_configuration_errors() {
        assert!(matches!(
            authorize(Role::Writer, None, Some("writer123")),
            Err(GalleryLogError::ConfigError(_))
        ));
        assert!(matches!(
            authorize(Role::Writer, Some(""), Some("writer123")),
            Err(GalleryLogError::ConfigError(_))
        ));
        assert!(matches!(
            authorize(Role::Writer, Some("writer123"), None),
            Err(GalleryLogError::ConfigError(_))
        ));
    }

    #[test]
    fn test_error_does_not_echo_token() {
        let err = authorize(Role::Writer, Some("s3cr3t"), Some("other")).unwrap_err();
        assert!(!err.to_string().contains("s3cr3t"));
    }
}
