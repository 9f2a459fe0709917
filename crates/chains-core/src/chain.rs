//! Chain - handler composition and the request entry point.
//!
//! # Example
//! ```ignore
//! let chain = Chain::new(Trace::new())
//!     .append(BodyLimit::new(1024))
//!     .append_fn(hello)
//!     .with_error_renderer(JsonErrorRenderer::new());
//!
//! let response = chain.serve_request(request);
//! ```
//!
//! # Per-request flow
//! `Pending → Running(k) → Succeeded | Failed(err)`
//! - `Succeeded`: the cursor ran out, or a handler returned `Ok` without
//!   calling `next`
//! - `Failed`: a handler returned `Err`; upstream handlers still finish
//!   their own code after `next` and may replace or swallow the error
//!
//! Only [`Chain::serve`] turns `Failed` into a response, through the error
//! renderer. `Succeeded` leaves the response as the handlers wrote it.

use std::sync::Arc;

use bytes::Bytes;

use crate::context::Context;
use crate::error::ChainError;
use crate::handler::{Handler, handler_fn};
use crate::next::Next;
use crate::render::{ErrorRenderer, basic_error_renderer};
use crate::web::{Request, ResponseWriter};

/// Ordered handlers plus the renderer used when they fail.
///
/// Cloning is cheap and the clone is independent: appending to one never
/// shows up in the other, including in requests already running on it.
#[derive(Clone)]
pub struct Chain {
    pub(crate) handlers: Arc<Vec<Arc<dyn Handler>>>,
    pub(crate) renderer: Arc<dyn ErrorRenderer>,
}

impl Chain {
    /// New chain seeded with `handler` and [`basic_error_renderer`].
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            handlers: Arc::new(vec![Arc::new(handler) as Arc<dyn Handler>]),
            renderer: Arc::new(basic_error_renderer),
        }
    }

    /// New chain seeded with a function handler.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: for<'a> Fn(&Context, &mut ResponseWriter, &Request, Next<'a>) -> Result<(), ChainError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(handler_fn(f))
    }

    /// Add a handler to the end of the chain.
    pub fn append(mut self, handler: impl Handler + 'static) -> Self {
        self.push(handler);
        self
    }

    /// Add a function handler to the end of the chain.
    pub fn append_fn<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&Context, &mut ResponseWriter, &Request, Next<'a>) -> Result<(), ChainError>
            + Send
            + Sync
            + 'static,
    {
        self.append(handler_fn(f))
    }

    /// In-place version of [`Chain::append`].
    pub fn push(&mut self, handler: impl Handler + 'static) -> &mut Self {
        Arc::make_mut(&mut self.handlers).push(Arc::new(handler));
        self
    }

    /// In-place version of [`Chain::append_fn`].
    pub fn push_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&Context, &mut ResponseWriter, &Request, Next<'a>) -> Result<(), ChainError>
            + Send
            + Sync
            + 'static,
    {
        self.push(handler_fn(f))
    }

    /// Replace the error renderer. Last one set wins.
    pub fn with_error_renderer(mut self, renderer: impl ErrorRenderer + 'static) -> Self {
        self.set_error_renderer(renderer);
        self
    }

    pub fn set_error_renderer(&mut self, renderer: impl ErrorRenderer + 'static) -> &mut Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler in order until one stops or fails.
    pub fn execute(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
    ) -> Result<(), ChainError> {
        Next::new(&self.handlers).call(cx, w, req)
    }

    /// Run the chain and render the failure, if any. Never returns an error.
    pub fn serve(&self, cx: &Context, w: &mut ResponseWriter, req: &Request) {
        if let Err(err) = self.execute(cx, w, req) {
            self.renderer.render(w, &err);
        }
    }

    /// Serve one request with a fresh context and response writer.
    pub fn serve_request(&self, req: Request) -> http::Response<Bytes> {
        let cx = Context::new();
        let mut w = ResponseWriter::new();
        self.serve(&cx, &mut w, &req);
        w.into_response()
    }
}

/// A chain mounted inside another chain runs its own handlers, then hands
/// over to the outer chain. Its renderer is not used: failures go to the
/// outer chain.
impl Handler for Chain {
    fn handle(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
        next: Next<'_>,
    ) -> Result<(), ChainError> {
        Next::nested(&self.handlers, &next).call(cx, w, req)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}
