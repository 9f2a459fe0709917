use std::time::Instant;

use http::header::{HeaderName, HeaderValue};

use crate::context::Context;
use crate::error::ChainError;
use crate::handler::Handler;
use crate::next::Next;
use crate::web::{Request, ResponseWriter};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs each request inside an `info` span and tags the response with the
/// request id.
///
/// Put it first so its span covers the whole chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl Trace {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for Trace {
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError> {
        let request_id = cx.request_id().to_string();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
        );
        let _enter = span.enter();

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            w.set_header(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }

        let started = Instant::now();
        let result = next.call(cx, w, req);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => {
                let status = w.status().map_or(200, |s| s.as_u16());
                tracing::info!(status, elapsed_ms, "request completed");
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    status = err.status_code().as_u16(),
                    elapsed_ms,
                    "request failed"
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use bytes::Bytes;
    use http::StatusCode;

    #[test]
    fn tags_response_with_request_id() {
        let chain = Chain::new(Trace::new()).append_fn(|_cx, w, _req, _next| {
            w.write_body(b"hi");
            Ok(())
        });

        let cx = Context::new();
        let mut w = ResponseWriter::new();
        chain.serve(&cx, &mut w, &Request::new(Bytes::new()));

        assert_eq!(
            w.headers()[REQUEST_ID_HEADER],
            cx.request_id().to_string().as_str()
        );
        assert_eq!(w.body(), b"hi");
    }

    #[test]
    fn passes_failures_through_unchanged() {
        let chain = Chain::new(Trace::new()).append_fn(|_cx, _w, _req, _next| {
            Err(ChainError::http(StatusCode::NOT_FOUND, "no such thing"))
        });

        let err = chain
            .execute(
                &Context::new(),
                &mut ResponseWriter::new(),
                &Request::new(Bytes::new()),
            )
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "no such thing");
    }
}
