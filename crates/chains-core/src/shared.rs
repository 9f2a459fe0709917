//! SharedChain - a chain that can grow while it is serving.
//!
//! [`Chain`] needs `&mut` to append, so it cannot change while any request
//! borrows it. `SharedChain` allows appends through `&self`:
//! - the handler list and renderer live behind a `RwLock<Arc<..>>`
//! - every request takes a snapshot under the read lock and releases the
//!   lock before any handler runs
//! - appends copy the list and swap the new `Arc` in
//!
//! A request therefore runs exactly the handlers that were registered when
//! it started.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::chain::Chain;
use crate::context::Context;
use crate::error::ChainError;
use crate::handler::{Handler, handler_fn};
use crate::next::Next;
use crate::render::ErrorRenderer;
use crate::web::{Request, ResponseWriter};

pub struct SharedChain {
    handlers: RwLock<Arc<Vec<Arc<dyn Handler>>>>,
    renderer: RwLock<Arc<dyn ErrorRenderer>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            handlers: RwLock::new(chain.handlers),
            renderer: RwLock::new(chain.renderer),
        }
    }

    pub fn append(&self, handler: impl Handler + 'static) -> &Self {
        let mut handlers = self.handlers.write();
        Arc::make_mut(&mut handlers).push(Arc::new(handler));
        tracing::debug!(handlers = handlers.len(), "handler appended to shared chain");
        self
    }

    pub fn append_fn<F>(&self, f: F) -> &Self
    where
        F: for<'a> Fn(&Context, &mut ResponseWriter, &Request, Next<'a>) -> Result<(), ChainError>
            + Send
            + Sync
            + 'static,
    {
        self.append(handler_fn(f))
    }

    pub fn set_error_renderer(&self, renderer: impl ErrorRenderer + 'static) -> &Self {
        *self.renderer.write() = Arc::new(renderer);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Chain as currently assembled. Later appends do not reach it.
    pub fn snapshot(&self) -> Chain {
        Chain {
            handlers: Arc::clone(&self.handlers.read()),
            renderer: Arc::clone(&self.renderer.read()),
        }
    }

    pub fn execute(
        &self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
    ) -> Result<(), ChainError> {
        self.snapshot().execute(cx, w, req)
    }

    pub fn serve(&self, cx: &Context, w: &mut ResponseWriter, req: &Request) {
        self.snapshot().serve(cx, w, req);
    }

    pub fn serve_request(&self, req: Request) -> http::Response<Bytes> {
        self.snapshot().serve_request(req)
    }
}

impl From<Chain> for SharedChain {
    fn from(chain: Chain) -> Self {
        Self::new(chain)
    }
}

impl std::fmt::Debug for SharedChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedChain")
            .field("handlers", &self.len())
            .finish_non_exhaustive()
    }
}
