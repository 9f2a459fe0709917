//! chains-core
//!
//! Request handler chains: an ordered list of handlers where each one can
//! delegate to the rest of the list, stop early, or fail.
//!
//! # Modules
//! - **handler**: `Handler` trait and the function adapter (`handler_fn`)
//! - **next**: `Next`, the cursor over the handlers still to run
//! - **chain**: `Chain` builder and the `execute` / `serve` entry points
//! - **shared**: `SharedChain`, appendable while serving
//! - **render**: error renderers used by `serve`
//! - **context**: per-request cancellation, deadline and request id
//! - **web**: request type and `ResponseWriter`
//! - **middleware**: ready-made handlers (tracing, guards, panic catching)
//!
//! # Example
//! ```ignore
//! let chain = Chain::new(Trace::new())
//!     .append(CatchPanic::new())
//!     .append_fn(|cx, w, req, next| {
//!         if req.headers().contains_key("x-api-key") {
//!             next.call(cx, w, req)
//!         } else {
//!             Err(ChainError::http(StatusCode::UNAUTHORIZED, "missing api key"))
//!         }
//!     })
//!     .append_fn(hello)
//!     .with_error_renderer(JsonErrorRenderer::new());
//! ```

pub mod chain;
pub mod context;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod next;
pub mod render;
pub mod shared;
pub mod web;

pub use self::chain::Chain;
pub use self::context::{Context, RequestId};
pub use self::error::{BoxError, ChainError};
pub use self::handler::{Handler, HandlerFn, handler_fn};
pub use self::next::Next;
pub use self::render::{
    ErrorRenderer, JsonErrorRenderer, basic_error_renderer, status_error_renderer,
};
pub use self::shared::SharedChain;
pub use self::web::{Request, ResponseWriter};
