//! Error renderers: turn the failure that reached the top of a chain into a
//! response.

use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;

use crate::error::ChainError;
use crate::web::ResponseWriter;

/// Called once by [`Chain::serve`](crate::chain::Chain::serve) when the chain fails.
pub trait ErrorRenderer: Send + Sync {
    fn render(&self, w: &mut ResponseWriter, err: &ChainError);
}

impl<F> ErrorRenderer for F
where
    F: Fn(&mut ResponseWriter, &ChainError) + Send + Sync,
{
    fn render(&self, w: &mut ResponseWriter, err: &ChainError) {
        self(w, err)
    }
}

/// Default renderer: `500 Internal Server Error`, no body.
pub fn basic_error_renderer(w: &mut ResponseWriter, _err: &ChainError) {
    w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
}

/// Answers with [`ChainError::status_code`], no body.
pub fn status_error_renderer(w: &mut ResponseWriter, err: &ChainError) {
    w.write_header(err.status_code());
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    status: u16,
    message: &'a str,
}

/// Writes `{"error":{"status":..,"message":..}}`.
///
/// Unless `expose_internal` is set, 5xx failures only show the canonical
/// reason phrase so internal error text does not leak to clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorRenderer {
    pub expose_internal: bool,
}

impl JsonErrorRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expose_internal(mut self, expose: bool) -> Self {
        self.expose_internal = expose;
        self
    }
}

impl ErrorRenderer for JsonErrorRenderer {
    fn render(&self, w: &mut ResponseWriter, err: &ChainError) {
        let status = err.status_code();
        let text = err.to_string();
        let message = if status.is_server_error() && !self.expose_internal {
            status.canonical_reason().unwrap_or("internal error")
        } else {
            text.as_str()
        };
        let body = ErrorBody {
            error: ErrorDetail {
                status: status.as_u16(),
                message,
            },
        };

        match serde_json::to_vec(&body) {
            Ok(bytes) => {
                w.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                w.write_header(status);
                w.write_body(&bytes);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to encode error body");
                w.write_header(status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn basic_renderer_sets_500_without_body() {
        for err in [
            ChainError::other("db down"),
            ChainError::http(StatusCode::NOT_FOUND, "missing"),
            ChainError::Canceled,
        ] {
            let mut w = ResponseWriter::new();
            basic_error_renderer(&mut w, &err);
            assert_eq!(w.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
            assert!(w.body().is_empty());
        }
    }

    #[rstest]
    #[case::http(ChainError::http(StatusCode::UNAUTHORIZED, "who"), 401)]
    #[case::canceled(ChainError::Canceled, 499)]
    #[case::deadline(ChainError::DeadlineExceeded, 504)]
    #[case::panic(ChainError::Panic("oops".to_string()), 500)]
    #[case::other(ChainError::other("boom"), 500)]
    fn status_renderer_uses_error_status(#[case] err: ChainError, #[case] expected: u16) {
        let mut w = ResponseWriter::new();
        status_error_renderer(&mut w, &err);
        assert_eq!(w.status().map(|s| s.as_u16()), Some(expected));
        assert!(w.body().is_empty());
    }

    #[test]
    fn closures_are_renderers() {
        let renderer = |w: &mut ResponseWriter, err: &ChainError| {
            w.write_header(StatusCode::BAD_GATEWAY);
            w.write_body(err.to_string().as_bytes());
        };
        let mut w = ResponseWriter::new();
        renderer.render(&mut w, &ChainError::other("upstream"));
        assert_eq!(w.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(w.body(), b"upstream");
    }

    #[test]
    fn json_renderer_shows_client_errors() {
        let mut w = ResponseWriter::new();
        JsonErrorRenderer::new().render(
            &mut w,
            &ChainError::http(StatusCode::PAYLOAD_TOO_LARGE, "body exceeds 16 bytes"),
        );

        assert_eq!(w.status(), Some(StatusCode::PAYLOAD_TOO_LARGE));
        assert_eq!(w.headers()[CONTENT_TYPE], "application/json");
        let v: serde_json::Value = serde_json::from_slice(w.body()).unwrap();
        assert_eq!(v["error"]["status"], 413);
        assert_eq!(v["error"]["message"], "body exceeds 16 bytes");
    }

    #[test]
    fn json_renderer_hides_internal_errors_by_default() {
        let err = ChainError::other("password=hunter2");

        let mut hidden = ResponseWriter::new();
        JsonErrorRenderer::new().render(&mut hidden, &err);
        let v: serde_json::Value = serde_json::from_slice(hidden.body()).unwrap();
        assert_eq!(v["error"]["message"], "Internal Server Error");

        let mut exposed = ResponseWriter::new();
        JsonErrorRenderer::new()
            .expose_internal(true)
            .render(&mut exposed, &err);
        let v: serde_json::Value = serde_json::from_slice(exposed.body()).unwrap();
        assert_eq!(v["error"]["message"], "password=hunter2");
    }
}
