//! Authenticated HTTP session with bounded retry for transient failures.
//!
//! All site traffic for a run goes through one [`HttpSession`]: login, listing
//! pages, quick-view lookups, and binary downloads. The session owns a shared
//! cookie jar so the login cookies apply to every subsequent request, and it
//! retries transient failures (connection errors and a fixed set of 5xx status
//! codes) with exponential backoff before surfacing an error to callers.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::cookie::Jar;
use reqwest::{Client, Method, Response};
use thiserror::Error;
use tracing::{debug, warn};

/// Default maximum retries after the initial attempt.
///
/// A `u8` so CLI surfaces can use it directly; policy code widens it.
pub const DEFAULT_MAX_RETRIES: u8 = 3;

/// Default base delay for exponential backoff.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(300);

/// Default delay cap.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Maximum jitter added to each backoff delay.
const MAX_JITTER: Duration = Duration::from_millis(100);

/// Status codes treated as transient server failures.
const TRANSIENT_STATUS: [u16; 3] = [500, 502, 504];

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 60;

/// Errors surfaced by session requests, after retries are exhausted.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection failure or retriable 5xx that persisted through the retry budget.
    #[error("transient failure requesting {url} after {attempts} attempts: {detail}")]
    Transient {
        /// The URL that kept failing.
        url: String,
        /// Total attempts made, including the initial one.
        attempts: u32,
        /// Last observed failure (status code or transport error).
        detail: String,
    },

    /// Non-success status outside the transient set (4xx, other 5xx).
    #[error("HTTP {status} requesting {url}")]
    Permanent {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// HTTP client construction failed.
    #[error("failed to construct HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl SessionError {
    /// Returns true for transient (post-retry) failures.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Backoff configuration for transient request failures.
///
/// Delay calculation: `min(base_delay * 2^retry, max_delay) + jitter`.
/// With defaults the delays are approximately 0.3s, 0.6s, 1.2s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: u32::from(DEFAULT_MAX_RETRIES),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with explicit settings.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Creates a policy with a custom retry budget and default delays.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Returns the configured retry budget (retries after the initial attempt).
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff delay before retry number `retry` (0-indexed), jitter included.
    fn delay_for(&self, retry: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1_u32 << retry.min(16));
        let capped = exp.min(self.max_delay);
        let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
        capped + Duration::from_millis(jitter_ms)
    }
}

/// Authenticated HTTP session shared by every component of a run.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    policy: RetryPolicy,
}

impl HttpSession {
    /// Creates a session with the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Client`] when client construction fails.
    pub fn new() -> Result<Self, SessionError> {
        Self::with_policy(RetryPolicy::default())
    }

    /// Creates a session with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Client`] when client construction fails.
    pub fn with_policy(policy: RetryPolicy) -> Result<Self, SessionError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .cookie_provider(jar)
            .gzip(true)
            .build()
            .map_err(SessionError::Client)?;
        Ok(Self { client, policy })
    }

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// [`SessionError::Transient`] after the retry budget is exhausted,
    /// [`SessionError::Permanent`] on any other non-success status.
    pub async fn get(&self, url: &str) -> Result<Response, SessionError> {
        self.request(Method::GET, url, None, None).await
    }

    /// Issues a GET request with query parameters.
    ///
    /// # Errors
    ///
    /// Same contract as [`HttpSession::get`].
    pub async fn get_with_query(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Response, SessionError> {
        self.request(Method::GET, url, Some(params), None).await
    }

    /// Issues a POST request with an urlencoded form body.
    ///
    /// # Errors
    ///
    /// Same contract as [`HttpSession::get`].
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<Response, SessionError> {
        self.request(Method::POST, url, None, Some(form)).await
    }

    /// Sends the request, retrying transient failures per the policy.
    ///
    /// The response body is left unconsumed so callers may stream it. Retries
    /// happen before any body is read, so they are invisible to callers.
    async fn request(
        &self,
        method: Method,
        url: &str,
        params: Option<&[(&str, &str)]>,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Response, SessionError> {
        let mut last_failure = String::new();
        let attempts = self.policy.max_retries + 1;

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.policy.delay_for(attempt - 2);
                debug!(url, attempt, ?delay, "retrying after transient failure");
                tokio::time::sleep(delay).await;
            }

            let mut builder = self.client.request(method.clone(), url);
            if let Some(params) = params {
                builder = builder.query(params);
            }
            if let Some(form) = form {
                builder = builder.form(form);
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if response.status().is_success() {
                        return Ok(response);
                    }
                    if TRANSIENT_STATUS.contains(&status) {
                        warn!(url, status, attempt, "transient server failure");
                        last_failure = format!("HTTP {status}");
                        continue;
                    }
                    return Err(SessionError::Permanent {
                        url: url.to_string(),
                        status,
                    });
                }
                Err(error) => {
                    // Connection-level failures (DNS, refused, timeout) are
                    // all retried; the request never reached a status code.
                    warn!(url, %error, attempt, "request failed");
                    last_failure = error.to_string();
                }
            }
        }

        Err(SessionError::Transient {
            url: url.to_string(),
            attempts,
            detail: last_failure,
        })
    }
}
