use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::context::Context;
use crate::error::ChainError;
use crate::handler::Handler;
use crate::next::Next;
use crate::web::{Request, ResponseWriter};

/// Converts a panic anywhere after it in the chain into [`ChainError::Panic`].
///
/// The response writer may hold whatever the panicking handler wrote before
/// it panicked.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchPanic;

impl CatchPanic {
    pub fn new() -> Self {
        Self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Handler for CatchPanic {
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError> {
        match catch_unwind(AssertUnwindSafe(|| next.call(cx, w, req))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                tracing::error!(
                    request_id = %cx.request_id(),
                    panic = %message,
                    "handler panicked"
                );
                Err(ChainError::Panic(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use bytes::Bytes;
    use http::StatusCode;

    #[test]
    fn panic_becomes_an_error() {
        let chain = Chain::new(CatchPanic::new())
            .append_fn(|_cx, _w, _req, _next| panic!("index out of range"));

        let err = chain
            .execute(
                &Context::new(),
                &mut ResponseWriter::new(),
                &Request::new(Bytes::new()),
            )
            .unwrap_err();
        assert!(matches!(&err, ChainError::Panic(m) if m == "index out of range"));
    }

    #[test]
    fn formatted_panic_message_is_kept() {
        let chain = Chain::new(CatchPanic::new()).append_fn(|_cx, _w, _req, _next| {
            let id = 7;
            panic!("user {id} vanished")
        });

        let err = chain
            .execute(
                &Context::new(),
                &mut ResponseWriter::new(),
                &Request::new(Bytes::new()),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "handler panicked: user 7 vanished");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn no_panic_means_no_change() {
        let chain = Chain::new(CatchPanic::new()).append_fn(|_cx, w, _req, _next| {
            w.write_header(StatusCode::CREATED);
            Ok(())
        });

        let response = chain.serve_request(Request::new(Bytes::new()));
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
