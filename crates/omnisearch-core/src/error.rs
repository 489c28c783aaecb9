//! Error types for Omnisearch

use thiserror::Error;

/// Result type alias using Omnisearch's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Omnisearch error types with stable codes and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Saved search '{0}' not found. List saved searches to see available ids.")]
    SavedSearchNotFound(String),

    // Domain errors (E100-E199)
    #[error("Search domain '{domain}' failed: {reason}")]
    DomainFailure { domain: String, reason: String },

    #[error("Search domain '{domain}' timed out after {timeout_ms}ms")]
    DomainTimeout { domain: String, timeout_ms: u64 },

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Failed to decode stored data: {0}")]
    Parse(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // User errors (E700-E799)
    #[error("Search was cancelled by the caller")]
    Cancelled,

    // Input errors (E800-E899)
    #[error("Invalid search request: {0}")]
    Validation(String),

    #[error("User '{user_id}' is not allowed to modify saved search '{saved_search_id}'")]
    PermissionDenied {
        user_id: String,
        saved_search_id: String,
    },

    // Generic errors
    #[error("Internal search error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::SavedSearchNotFound(_) => "E001",
            Self::DomainFailure { .. } => "E100",
            Self::DomainTimeout { .. } => "E101",
            Self::DatabaseError(_) => "E400",
            Self::Parse(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::Cancelled => "E700",
            Self::Validation(_) => "E800",
            Self::PermissionDenied { .. } => "E801",
            Self::Internal(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::SavedSearchNotFound(_) => Some("List saved searches for this user".to_string()),
            Self::Validation(_) => Some(
                "Use a non-negative limit/offset, scope one of all|messages|dms|files|channels|users \
                 and sort one of relevance|date"
                    .to_string(),
            ),
            Self::PermissionDenied { .. } => {
                Some("Only the owner of a saved search can change it".to_string())
            }
            Self::ConfigError(_) => Some("Check OMNISEARCH_CONFIG_DIR/config.toml".to_string()),
            _ => None,
        }
    }

    /// Whether the caller should see this as "the search failed" rather than a user mistake
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::Parse(_) | Self::Internal(_) | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = Error::Validation("limit must not be negative".to_string());
        assert_eq!(error.code(), "E800");
        assert!(error.suggestion().is_some());
        assert!(error.to_string().contains("limit must not be negative"));
        assert!(!error.is_internal());
    }

    #[test]
    fn test_permission_denied_error() {
        let error = Error::PermissionDenied {
            user_id: "u2".to_string(),
            saved_search_id: "s1".to_string(),
        };
        assert_eq!(error.code(), "E801");
        assert!(error.to_string().contains("u2"));
        assert!(error.to_string().contains("s1"));
    }

    #[test]
    fn test_domain_errors_have_no_suggestion() {
        let error = Error::DomainTimeout {
            domain: "files".to_string(),
            timeout_ms: 250,
        };
        assert_eq!(error.code(), "E101");
        assert_eq!(error.suggestion(), None);
        assert!(error.to_string().contains("250ms"));
    }

    #[test]
    fn test_internal_errors() {
        assert!(Error::Internal("boom".to_string()).is_internal());
        assert!(Error::Parse("bad uuid".to_string()).is_internal());
        assert!(!Error::Cancelled.is_internal());
        assert_eq!(Error::Cancelled.code(), "E700");
    }
}
