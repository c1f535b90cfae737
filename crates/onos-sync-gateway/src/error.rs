use thiserror::Error;

/// Errors talking to a remote controller.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Client setup failed: {0}")]
    Setup(String),
}

impl GatewayError {
    pub fn transport(method: &reqwest::Method, url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            method: method.to_string(),
            url: url.into(),
            source,
        }
    }

    pub fn unexpected_status(
        method: &reqwest::Method,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::UnexpectedStatus {
            method: method.to_string(),
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// HTTP status of the failed call, if the controller answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Url the failing request targeted.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Transport { url, .. }
            | Self::UnexpectedStatus { url, .. }
            | Self::Decode { url, .. } => Some(url),
            Self::Setup(_) => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::UnexpectedStatus { .. } => ErrorCategory::Remote,
            Self::Decode { .. } => ErrorCategory::Decode,
            Self::Setup(_) => ErrorCategory::Configuration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Remote,
    Decode,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Remote => write!(f, "remote"),
            Self::Decode => write!(f, "decode"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_keeps_context() {
        let err = GatewayError::unexpected_status(
            &reqwest::Method::POST,
            "http://onos-url:8181/onos/v1/applications",
            500,
            "internal error",
        );
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.url(), Some("http://onos-url:8181/onos/v1/applications"));
        assert_eq!(err.category(), ErrorCategory::Remote);
        let text = err.to_string();
        assert!(text.contains("POST"));
        assert!(text.contains("internal error"));
    }
}
