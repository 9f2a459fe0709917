//! Request and response types at the host boundary.
//!
//! The chain does not parse or route requests; it only hands these values
//! to handlers.

use std::io;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

/// Inbound request as seen by every handler.
pub type Request = http::Request<Bytes>;

/// Output channel a handler writes its response into.
///
/// The status is written at most once: the first [`write_header`] (or the
/// first body write, which implies `200 OK`) commits it, and headers can
/// no longer change afterwards.
///
/// [`write_header`]: ResponseWriter::write_header
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the status. Later calls are ignored.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => {
                tracing::warn!(
                    current = current.as_u16(),
                    ignored = status.as_u16(),
                    "superfluous write_header call"
                );
            }
            None => self.status = Some(status),
        }
    }

    /// Set a header. Returns false (and does nothing) once the status is committed.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> bool {
        if self.is_committed() {
            tracing::warn!(header = %name, "header set after status was written");
            return false;
        }
        self.headers.insert(name, value);
        true
    }

    /// Append to the body, committing `200 OK` if no status was written yet.
    pub fn write_body(&mut self, data: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Finish the response. An uncommitted writer answers `200 OK`.
    pub fn into_response(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(Bytes::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
