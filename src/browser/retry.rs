// Session establishment with retry
//
// The browser endpoint is a co-located sidecar that may still be starting
// when we run, so connection failures are retried with a fixed backoff.
// By default there is no attempt limit; the loop ends on success, on the
// configured limit, or when the cancellation token fires.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::Connector;
use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoff: Duration,
    /// `None` retries until the endpoint answers
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

/// Connect through `connector`, retrying per `policy` until it succeeds
pub async fn establish<C: Connector>(
    connector: &C,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<C::Session, SessionError> {
    let endpoint = connector.endpoint();
    info!("Initializing browser session on {}", endpoint);

    let mut attempts: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled { attempts });
        }
        attempts += 1;

        let err = match connector.connect().await {
            Ok(session) => {
                if attempts > 1 {
                    info!("Browser session established after {} attempts", attempts);
                }
                return Ok(session);
            }
            Err(e) => e,
        };
        error!("Error initializing browser session (attempt {}): {}", attempts, err);

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(SessionError::RetriesExhausted {
                attempts,
                last: Box::new(err),
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("Browser session establishment cancelled");
                return Err(SessionError::Cancelled { attempts });
            }
            _ = tokio::time::sleep(policy.backoff) => {}
        }
    }
}
