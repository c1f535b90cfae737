use thiserror::Error;

/// Core error types for synchronizer records
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    #[error("If you specify a url, you also need to specify a version. ONOSApp: {name}")]
    MissingVersion { name: String },

    #[error("{kind} '{name}' has no creator: an explicit caller is required")]
    MissingCaller { kind: String, name: String },

    #[error("Invalid attribute '{name}': {message}")]
    InvalidAttribute { name: String, message: String },

    #[error("Unresolved placeholder <{placeholder}> in component config '{component}.{key}'")]
    UnresolvedPlaceholder {
        component: String,
        key: String,
        placeholder: String,
    },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Create a new InvalidRecord error
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    pub fn missing_version(name: impl Into<String>) -> Self {
        Self::MissingVersion { name: name.into() }
    }

    pub fn missing_caller(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingCaller {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a new InvalidAttribute error
    pub fn invalid_attribute(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRecord { .. } | Self::MissingVersion { .. } => ErrorCategory::Validation,
            Self::InvalidAttribute { .. } | Self::UnresolvedPlaceholder { .. } => {
                ErrorCategory::Validation
            }
            Self::MissingCaller { .. } => ErrorCategory::Precondition,
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Precondition,
    Serialization,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Precondition => write!(f, "precondition"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_version_message() {
        let err = CoreError::missing_version("vrouter");
        assert_eq!(
            err.to_string(),
            "If you specify a url, you also need to specify a version. ONOSApp: vrouter"
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_missing_caller_is_precondition() {
        let err = CoreError::missing_caller("ONOSApp", "olt");
        assert!(err.to_string().contains("explicit caller"));
        assert_eq!(err.category(), ErrorCategory::Precondition);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let core_err: CoreError = json_err.into();

        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert_eq!(core_err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Precondition.to_string(), "precondition");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
    }
}
