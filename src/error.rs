use thiserror::Error;

use crate::audit::verify::ViolationReason;

impl From<std::io::Error> for GalleryLogError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(format!("I/O error: {}", err))
    }
}

impl From<::config::ConfigError> for GalleryLogError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::ConfigError(format!("Failed to load configuration: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum GalleryLogError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Integrity check failed at entry {index}: {reason}")]
    IntegrityError {
        index: usize,
        reason: ViolationReason,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    #[error("Unauthorized")]
    Unauthorized,
}

pub type Result<T> = std::result::Result<T, GalleryLogError>;

impl GalleryLogError {
    pub fn invalid_field(field: &str) -> Self {
        Self::ValidationError(format!("Invalid value for field '{}'", field))
    }

    pub fn missing_secret(name: &str) -> Self {
        Self::ConfigError(format!("{} not set", name))
    }

    pub fn lock_failed(err: std::io::Error) -> Self {
        Self::StorageError(format!("Failed to lock log store: {}", err))
    }

    pub fn write_failed(err: std::io::Error) -> Self {
        Self::StorageError(format!("Failed to write log entry: {}", err))
    }

    /// Generic, secret-free message for end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "Configuration error.",
            Self::ValidationError(_) => "Bad input.",
            Self::IntegrityError { .. } => "Log integrity FAILED.",
            Self::StorageError(_) => "Storage error.",
            Self::CryptoError(_) => "Internal error.",
            Self::Unauthorized => "Unauthorized.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_generic() {
        let err = GalleryLogError::StorageError("disk full at /secret/path".to_string());
        assert_eq!(err.user_message(), "Storage error.");

        let err = GalleryLogError::IntegrityError {
            index: 3,
            reason: ViolationReason::DigestMismatch,
        };
        assert_eq!(err.user_message(), "Log integrity FAILED.");
        assert!(err.to_string().contains("entry 3"));
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            GalleryLogError::from(io),
            GalleryLogError::StorageError(_)
        ));
    }
}
