//! Short-link resolution: follow a redirect chain hop by hop.
//!
//! Redirects are never delegated to the transport; each hop is an individual
//! HEAD (or GET when HEAD is rejected with 405) so it can be timed and its
//! `Location` validated on its own. The first hop to time out fails the whole
//! resolution; there is no retry.

mod curl_transport;
mod parse;
mod transport;

pub use curl_transport::CurlTransport;
pub use transport::{CancelToken, HopError, HopResponse, HopTransport, Method};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use transport::CancelOnDrop;

/// Maximum number of redirects followed before settling on the current URL.
pub const MAX_HOPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    Timeout,
    Error,
}

impl From<&HopError> for FailureReason {
    fn from(e: &HopError) -> Self {
        match e {
            HopError::Timeout | HopError::Cancelled => FailureReason::Timeout,
            HopError::Transport(_) => FailureReason::Error,
        }
    }
}

/// Either a destination or a failure reason, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolutionOutcome {
    Resolved {
        #[serde(rename = "final")]
        final_url: String,
    },
    Failed {
        reason: FailureReason,
    },
}

impl ResolutionOutcome {
    pub fn final_url(&self) -> Option<&str> {
        match self {
            ResolutionOutcome::Resolved { final_url } => Some(final_url.as_str()),
            ResolutionOutcome::Failed { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            ResolutionOutcome::Resolved { .. } => None,
            ResolutionOutcome::Failed { reason } => Some(*reason),
        }
    }

    fn resolved(url: String) -> Self {
        ResolutionOutcome::Resolved { final_url: url }
    }

    fn failed(url: &str, e: HopError) -> Self {
        let reason = FailureReason::from(&e);
        match reason {
            FailureReason::Timeout => tracing::debug!("resolve {}: {}", url, e),
            FailureReason::Error => tracing::warn!("resolve {}: {}", url, e),
        }
        ResolutionOutcome::Failed { reason }
    }
}

/// Redirect resolver over a pluggable hop transport. Holds no per-call
/// state, so one instance can serve any number of concurrent resolutions.
#[derive(Clone)]
pub struct Resolver {
    transport: Arc<dyn HopTransport>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(CurlTransport::new())
    }
}

impl Resolver {
    pub fn new(transport: impl HopTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Resolve `url` with a fresh cancellation token.
    pub fn resolve(&self, url: &str, hop_timeout: Duration) -> ResolutionOutcome {
        self.resolve_with_cancel(url, hop_timeout, &CancelToken::new())
    }

    /// Resolve `url`; cancelling `cancel` aborts the in-flight hop and
    /// reports a timeout.
    pub fn resolve_with_cancel(
        &self,
        url: &str,
        hop_timeout: Duration,
        cancel: &CancelToken,
    ) -> ResolutionOutcome {
        let mut current = url.to_string();

        for hop in 0..MAX_HOPS {
            let response = match self.send(Method::Head, &current, hop, hop_timeout, cancel) {
                Ok(r) => r,
                Err(e) => return ResolutionOutcome::failed(&current, e),
            };

            let next = if response.is_redirect() {
                next_location(&current, &response)
            } else if response.status == 405 {
                // Some endpoints reject HEAD; GET with the same budget.
                match self.send(Method::Get, &current, hop, hop_timeout, cancel) {
                    Ok(r) => next_location(&current, &r),
                    Err(e) => return ResolutionOutcome::failed(&current, e),
                }
            } else {
                None
            };

            match next {
                Some(next) => current = next,
                None => return ResolutionOutcome::resolved(current),
            }
        }

        tracing::debug!("hop limit {} reached at {}", MAX_HOPS, current);
        ResolutionOutcome::resolved(current)
    }

    /// Run a resolution on the blocking pool. Dropping the returned future
    /// cancels the in-flight transfer.
    pub async fn resolve_async(&self, url: &str, hop_timeout: Duration) -> ResolutionOutcome {
        let token = CancelToken::new();
        let _guard = CancelOnDrop(token.clone());
        let this = self.clone();
        let url = url.to_string();

        match tokio::task::spawn_blocking(move || this.resolve_with_cancel(&url, hop_timeout, &token))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("resolve task join: {}", e);
                ResolutionOutcome::Failed {
                    reason: FailureReason::Error,
                }
            }
        }
    }

    fn send(
        &self,
        method: Method,
        url: &str,
        hop: usize,
        hop_timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<HopResponse, HopError> {
        if cancel.is_cancelled() {
            return Err(HopError::Cancelled);
        }
        let response = self.transport.send(method, url, hop_timeout, cancel)?;
        tracing::debug!(
            "hop {} {} {} -> {} {:?}",
            hop,
            method.as_str(),
            url,
            response.status,
            response.location
        );
        Ok(response)
    }
}

/// Resolve the response's `Location` against the current URL; `None` if
/// missing or unusable.
fn next_location(current: &str, response: &HopResponse) -> Option<String> {
    let location = response.location.as_deref()?;
    let base = Url::parse(current).ok()?;
    base.join(location).ok().map(|u| u.to_string())
}
