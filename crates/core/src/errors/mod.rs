//! Error types for Finnhub market data operations
//!
//! All fallible paths in this crate surface a [`FinnhubError`]. The enum
//! separates caller mistakes (bad arguments, missing credential) from
//! upstream failures (rate limiting, API errors, transport problems) so
//! callers can decide what is retryable and what is terminal.

use thiserror::Error;

/// Errors produced while serving Finnhub market data.
#[derive(Error, Debug)]
pub enum FinnhubError {
    /// The API credential could not be resolved at first use.
    #[error("FINNHUB_API_KEY environment variable is not set")]
    MissingApiKey,

    /// A caller-supplied argument failed validation. Raised before any
    /// outbound request is made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Finnhub rejected the call for exceeding the rate budget (HTTP 429).
    #[error("Rate limited by Finnhub: {endpoint}")]
    RateLimited { endpoint: String },

    /// Finnhub answered with a non-success status other than 429.
    #[error("Finnhub API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    /// The outbound request exceeded the client timeout.
    #[error("Timeout calling Finnhub: {endpoint}")]
    Timeout { endpoint: String },

    /// The response body could not be decoded into the expected shape.
    #[error("Failed to parse Finnhub {endpoint} response: {message}")]
    Parse { endpoint: String, message: String },

    /// Transport-level failure below the HTTP status layer.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl FinnhubError {
    /// Best-effort extraction of the HTTP status carried by this error.
    ///
    /// Transport errors only expose a status when a response actually
    /// arrived; validation and configuration errors never carry one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this failure is a rate-limit rejection (HTTP 429),
    /// regardless of which variant carries it.
    pub fn is_rate_limit(&self) -> bool {
        self.status_code() == Some(429)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_display() {
        let err = FinnhubError::MissingApiKey;
        assert_eq!(
            err.to_string(),
            "FINNHUB_API_KEY environment variable is not set"
        );
    }

    #[test]
    fn test_api_error_display_includes_status_and_message() {
        let err = FinnhubError::Api {
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Finnhub API error: HTTP 500 - Internal Server Error"
        );
    }

    #[test]
    fn test_rate_limited_is_rate_limit() {
        let err = FinnhubError::RateLimited {
            endpoint: "/quote".to_string(),
        };
        assert!(err.is_rate_limit());
        assert_eq!(err.status_code(), Some(429));
    }

    #[test]
    fn test_api_429_classifies_as_rate_limit() {
        let err = FinnhubError::Api {
            status: 429,
            message: "Too Many Requests".to_string(),
        };
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_other_errors_are_not_rate_limits() {
        let api = FinnhubError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!api.is_rate_limit());
        assert_eq!(api.status_code(), Some(500));

        let invalid = FinnhubError::InvalidArgument("bad".to_string());
        assert!(!invalid.is_rate_limit());
        assert_eq!(invalid.status_code(), None);

        let timeout = FinnhubError::Timeout {
            endpoint: "/quote".to_string(),
        };
        assert!(!timeout.is_rate_limit());
        assert_eq!(timeout.status_code(), None);
    }

    #[test]
    fn test_invalid_argument_preserves_message() {
        let err = FinnhubError::InvalidArgument("Count must be between 1 and 100".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid argument: Count must be between 1 and 100"
        );
    }
}
