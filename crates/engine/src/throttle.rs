//! Outbound call wrapper with exponential backoff on throttling.
//!
//! Throttling (HTTP 429) is the one recoverable failure: the wrapper sleeps
//! and retries indefinitely, doubling the delay on every consecutive
//! throttle. Any other non-success status surfaces immediately as
//! [`SyncError::RequestFailed`]; other 4xx/5xx are not blindly retried so
//! integration bugs are not masked.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::SyncError;

/// First delay after a throttling response.
pub const BASE_DELAY: Duration = Duration::from_secs(10);

/// Doubling delay sequence for consecutive throttles.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Backoff {
    /// Start a sequence at [`BASE_DELAY`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_base(BASE_DELAY)
    }

    /// Start a sequence at a custom base delay.
    #[must_use]
    pub const fn with_base(base: Duration) -> Self {
        Self { next: base }
    }

    /// The delay to wait now; doubles the delay returned next time.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2);
        delay
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Build, send, and vet a request, retrying on throttle.
///
/// `build` constructs a fresh request per attempt, so time-sensitive pieces
/// (SigV4 timestamps) are re-stamped on every retry.
///
/// # Errors
///
/// Returns `SyncError::Http` on transport failure and
/// `SyncError::RequestFailed` on any non-throttle error status.
pub async fn send_with_backoff<F>(build: F) -> Result<reqwest::Response, SyncError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut backoff = Backoff::new();
    loop {
        let response = build().send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let delay = backoff.next_delay();
            tracing::warn!(url = %response.url(), delay_secs = delay.as_secs(), "throttled, backing off");
            tokio::time::sleep(delay).await;
            continue;
        }

        if !status.is_success() {
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::RequestFailed {
                status: status.as_u16(),
                url,
                body,
            });
        }

        return Ok(response);
    }
}
