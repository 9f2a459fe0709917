//! Request guards: body size limit and request timeout.

use std::time::Duration;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::ChainError;
use crate::handler::Handler;
use crate::next::Next;
use crate::web::{Request, ResponseWriter};

/// Guard configuration, usually loaded from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Largest accepted request body in bytes. Default 10 MiB.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Request deadline in seconds. Default 300.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: default_max_body_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SecurityConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn body_limit(&self) -> BodyLimit {
        BodyLimit::new(self.max_body_size)
    }

    pub fn timeout(&self) -> Timeout {
        Timeout::new(self.request_timeout())
    }
}

/// Rejects requests whose body is larger than `max_bytes` with `413`.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit {
    max_bytes: usize,
}

impl BodyLimit {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl Handler for BodyLimit {
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError> {
        let len = req.body().len();
        if len > self.max_bytes {
            return Err(ChainError::http(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body of {len} bytes exceeds limit of {} bytes", self.max_bytes),
            ));
        }
        next.call(cx, w, req)
    }
}

/// Continues with a child context whose deadline is `timeout` from now.
///
/// Nothing is interrupted: downstream handlers see the deadline through
/// the context and stop themselves.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    timeout: Duration,
}

impl Timeout {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Handler for Timeout {
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError> {
        let cx = cx.with_timeout(self.timeout);
        next.call(&cx, w, req)
    }
}
