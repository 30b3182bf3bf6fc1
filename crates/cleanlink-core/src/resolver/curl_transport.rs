//! libcurl-backed hop transport.
//!
//! Each hop gets a fresh `Easy` handle with redirect following disabled. The
//! per-hop timer is libcurl's own `timeout`, so when it fires the transfer
//! and its socket are torn down inside `perform()`; the cancel token is
//! polled from the progress callback and aborts the same way.

use std::str;
use std::time::Duration;

use super::parse::{final_headers_complete, location_header};
use super::transport::{CancelToken, HopError, HopResponse, HopTransport, Method};

const DEFAULT_USER_AGENT: &str = concat!("cleanlink/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct CurlTransport {
    user_agent: String,
}

impl CurlTransport {
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl From<curl::Error> for HopError {
    fn from(e: curl::Error) -> Self {
        if e.is_operation_timedout() {
            HopError::Timeout
        } else if e.is_aborted_by_callback() {
            HopError::Cancelled
        } else {
            HopError::Transport(e.to_string())
        }
    }
}

impl HopTransport for CurlTransport {
    fn send(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<HopResponse, HopError> {
        let mut headers: Vec<String> = Vec::new();
        let mut headers_done = false;

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(false)?;
        match method {
            Method::Head => easy.nobody(true)?,
            Method::Get => easy.get(true)?,
        }
        easy.useragent(&self.user_agent)?;
        easy.timeout(timeout)?;
        easy.progress(true)?;

        let result = {
            let mut transfer = easy.transfer();
            // Abort once the final header block is in; the body is never read.
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                if final_headers_complete(&headers) {
                    headers_done = true;
                    return false;
                }
                true
            })?;
            transfer.write_function(|data| Ok(data.len()))?;
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            transfer.perform()
        };
        match result {
            Ok(()) => {}
            Err(e) if headers_done && e.is_write_error() => {}
            Err(e) => return Err(e.into()),
        }

        let status = easy.response_code()?;
        Ok(HopResponse {
            status,
            location: location_header(&headers),
        })
    }
}
