//! Handler - one unit of a chain
//!
//! A handler either delegates to the rest of the chain through [`Next`],
//! stops (success without calling `next`), or fails.
//!
//! Both struct-style and function-style handlers are supported:
//! - implement [`Handler`] on a type
//! - wrap a function or closure with [`handler_fn`]

use std::sync::Arc;

use crate::context::Context;
use crate::error::ChainError;
use crate::next::Next;
use crate::web::{Request, ResponseWriter};

/// A unit of work in a chain.
///
/// # Example
/// ```ignore
/// struct RequireJson;
///
/// impl Handler for RequireJson {
///     fn handle(
///         &self,
///         cx: &Context,
///         w: &mut ResponseWriter,
///         req: &Request,
///         next: Next<'_>,
///     ) -> Result<(), ChainError> {
///         if req.headers().get(CONTENT_TYPE) != Some(&HeaderValue::from_static("application/json")) {
///             return Err(ChainError::http(StatusCode::UNSUPPORTED_MEDIA_TYPE, "json only"));
///         }
///         next.call(cx, w, req)
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError> {
        (**self).handle(cx, w, req, next)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError> {
        (**self).handle(cx, w, req, next)
    }
}

/// Adapter turning a function into a [`Handler`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn")
            .field("f", &std::any::type_name::<F>())
            .finish()
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&Context, &mut ResponseWriter, &Request, Next<'a>) -> Result<(), ChainError>
        + Send
        + Sync,
{
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError> {
        (self.f)(cx, w, req, next)
    }
}

/// Wrap a function or closure so it can be chained next to struct handlers.
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&Context, &mut ResponseWriter, &Request, Next<'a>) -> Result<(), ChainError>
        + Send
        + Sync,
{
    HandlerFn::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;

    fn teapot(
        _cx: &Context,
        w: &mut ResponseWriter,
        _req: &Request,
        _next: Next<'_>,
    ) -> Result<(), ChainError> {
        w.write_header(StatusCode::IM_A_TEAPOT);
        Ok(())
    }

    #[test]
    fn plain_fn_is_a_handler() {
        let h = handler_fn(teapot);
        let mut w = ResponseWriter::new();
        let req = Request::new(Bytes::new());

        h.handle(&Context::new(), &mut w, &req, Next::empty())
            .unwrap();
        assert_eq!(w.status(), Some(StatusCode::IM_A_TEAPOT));
    }

    #[test]
    fn closure_errors_pass_through_unchanged() {
        let h = handler_fn(|_cx, _w, _req, _next| {
            Err(ChainError::http(StatusCode::FORBIDDEN, "nope"))
        });
        let mut w = ResponseWriter::new();
        let req = Request::new(Bytes::new());

        let err = h
            .handle(&Context::new(), &mut w, &req, Next::empty())
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(!w.is_committed());
    }

    #[test]
    fn shared_and_boxed_handlers_delegate() {
        let shared: Arc<dyn Handler> = Arc::new(handler_fn(teapot));
        let boxed: Box<dyn Handler> = Box::new(handler_fn(teapot));
        let req = Request::new(Bytes::new());

        for h in [&shared as &dyn Handler, &boxed as &dyn Handler] {
            let mut w = ResponseWriter::new();
            h.handle(&Context::new(), &mut w, &req, Next::empty())
                .unwrap();
            assert_eq!(w.status(), Some(StatusCode::IM_A_TEAPOT));
        }
    }
}
