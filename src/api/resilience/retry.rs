//! Re-authenticating retry policy
//!
//! A CREST call is retried only when the server rejects the session. The
//! session provider is told which session was rejected, and the request
//! factory runs again with whatever session the provider hands out next. No
//! backoff: any other failure is terminal for the call.

use std::future::Future;
use log::{debug, info, warn};

use crate::api::error::CrestError;
use crate::api::models::Session;
use crate::api::session::SessionProvider;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl RetryConfig {
    /// Single attempt, no re-authentication
    pub fn disabled() -> Self {
        Self { max_attempts: 1 }
    }
}

/// Retry policy that re-authenticates once on an expired session
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Run `operation` with the provider's current session, invalidating that
    /// session and re-running when it fails with an auth-class error and
    /// attempts remain.
    ///
    /// A second rejection is returned as is, so an exhausted retry surfaces as
    /// [`CrestError::AuthExpired`].
    pub async fn execute<F, Fut, T>(
        &self,
        label: &str,
        sessions: &dyn SessionProvider,
        operation: F,
    ) -> Result<T, CrestError>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = Result<T, CrestError>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            debug!("{}: attempt {}/{}", label, attempt, max_attempts);

            let session = sessions.session().await?;
            let sent = session.clone();

            match operation(session).await {
                Ok(result) => {
                    if attempt > 1 {
                        info!("{} succeeded after re-authentication (attempt {})", label, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    let kind = error.kind();
                    if !kind.triggers_reauth() || attempt >= max_attempts {
                        warn!("{} failed on attempt {} ({}): {}", label, attempt, kind, error);
                        return Err(error);
                    }

                    warn!("{}: session rejected on attempt {}, re-authenticating", label, attempt);
                    sessions.invalidate(&sent).await;
                    attempt += 1;
                }
            }
        }
    }
}
