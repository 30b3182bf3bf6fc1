//! Transport seam for hop probing: one request, no redirect following.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Head,
    Get,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
        }
    }
}

/// Status line and redirect target of a single hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopResponse {
    pub status: u32,
    /// Raw `Location` header value, if any.
    pub location: Option<String>,
}

impl HopResponse {
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Why a hop did not produce a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HopError {
    /// The per-hop timer fired and the transfer was aborted.
    #[error("hop timed out")]
    Timeout,
    /// The caller cancelled the resolution while the hop was in flight.
    #[error("hop cancelled")]
    Cancelled,
    /// DNS, connect, TLS or protocol failure.
    #[error("transport: {0}")]
    Transport(String),
}

/// Cancellation token owned by one resolution. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancels the token when dropped, so an abandoned resolution also aborts
/// its in-flight transfer.
pub(crate) struct CancelOnDrop(pub(crate) CancelToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Issues one HTTP request without following redirects.
///
/// Implementations must abort the underlying transfer (not just return)
/// when `timeout` elapses or `cancel` fires.
pub trait HopTransport: Send + Sync {
    fn send(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<HopResponse, HopError>;
}
