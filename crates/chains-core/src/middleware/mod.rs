//! Ready-made handlers.
//!
//! - **Trace**: request span, `x-request-id`, completion/failure logs
//! - **BodyLimit** / **Timeout**: request guards driven by [`SecurityConfig`]
//! - **CatchPanic**: turns a panic downstream into [`ChainError::Panic`]
//! - **check_context**: stops the chain once the context is done

pub mod catch_panic;
pub mod security;
pub mod trace;

pub use self::catch_panic::CatchPanic;
pub use self::security::{BodyLimit, SecurityConfig, Timeout};
pub use self::trace::{REQUEST_ID_HEADER, Trace};

use crate::context::Context;
use crate::error::ChainError;
use crate::next::Next;
use crate::web::{Request, ResponseWriter};

/// Function handler: fails with `Canceled` / `DeadlineExceeded` when the
/// context is done, continues otherwise.
///
/// ```ignore
/// let chain = Chain::new(Timeout::new(limit)).append_fn(check_context).append(work);
/// ```
pub fn check_context(
    cx: &Context,
    w: &mut ResponseWriter,
    req: &Request,
    next: Next<'_>,
) -> Result<(), ChainError> {
    cx.check()?;
    next.call(cx, w, req)
}
