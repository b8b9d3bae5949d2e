//! Unified error handling for the sync engine.

use orderdeck_core::Platform;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the sync engine.
///
/// Failures are isolated per platform: the orchestrator logs a platform's
/// error with full context and moves on, so one platform's failure never
/// prevents the others from completing their fetch/normalize stages.
/// Throttling (HTTP 429) is handled inside [`crate::throttle`] and never
/// appears here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Token refresh failed; the platform is skipped for this run.
    #[error("credential refresh failed for {platform}: {reason}")]
    AuthRefresh {
        /// Platform whose refresh failed.
        platform: Platform,
        /// What the refresh endpoint reported.
        reason: String,
    },

    /// Non-throttle HTTP error status; the platform's current fetch aborts
    /// and its partial results are discarded. Deliberately not retried so
    /// integration bugs are not masked.
    #[error("request failed: HTTP {status} from {url}: {body}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
        /// Response body, for the log.
        body: String,
    },

    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response decoded but did not carry what the contract requires.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Database failure; fatal for the whole run's insertion step.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Credential document failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_refresh_display() {
        let err = SyncError::AuthRefresh {
            platform: Platform::Ebay,
            reason: "invalid_grant".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "credential refresh failed for ebay: invalid_grant"
        );
    }

    #[test]
    fn test_request_failed_display() {
        let err = SyncError::RequestFailed {
            status: 503,
            url: "https://api.example.com/orders".to_string(),
            body: "upstream unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "request failed: HTTP 503 from https://api.example.com/orders: upstream unavailable"
        );
    }
}
