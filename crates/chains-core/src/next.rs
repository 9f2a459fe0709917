//! Next - the cursor over the handlers still to run.
//!
//! A cursor is a position in a shared handler slice. Calling it runs the
//! handler at that position with a cursor one step further, so each handler
//! only ever sees the suffix after itself. Cursors are `Copy`: advancing
//! never touches the cursor a handler was given.
//!
//! A nested chain builds its cursor with an outer cursor attached; once the
//! nested handlers are exhausted the outer chain carries on.

use std::sync::Arc;

use crate::context::Context;
use crate::error::ChainError;
use crate::handler::Handler;
use crate::web::{Request, ResponseWriter};

#[derive(Clone, Copy)]
pub struct Next<'a> {
    handlers: &'a [Arc<dyn Handler>],
    pos: usize,
    outer: Option<&'a Next<'a>>,
}

impl<'a> Next<'a> {
    /// Cursor over all of `handlers`.
    pub fn new(handlers: &'a [Arc<dyn Handler>]) -> Self {
        Self {
            handlers,
            pos: 0,
            outer: None,
        }
    }

    /// Cursor over `handlers` that continues with `outer` when exhausted.
    pub fn nested(handlers: &'a [Arc<dyn Handler>], outer: &'a Next<'a>) -> Self {
        Self {
            handlers,
            pos: 0,
            outer: Some(outer),
        }
    }

    /// Terminal cursor: calling it succeeds immediately.
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Run the rest of the chain.
    ///
    /// Returns whatever the next handler returns, or `Ok(())` when nothing
    /// is left to run.
    pub fn call(
        self,
        cx: &Context,
        w: &mut ResponseWriter,
        req: &Request,
    ) -> Result<(), ChainError> {
        match self.handlers.get(self.pos) {
            Some(handler) => {
                let rest = Next {
                    pos: self.pos + 1,
                    ..self
                };
                handler.handle(cx, w, req, rest)
            }
            None => match self.outer {
                Some(outer) => outer.call(cx, w, req),
                None => Ok(()),
            },
        }
    }

    /// Number of handlers still to run, outer cursors included.
    pub fn remaining(&self) -> usize {
        let own = self.handlers.len().saturating_sub(self.pos);
        own + self.outer.map_or(0, |outer| outer.remaining())
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("pos", &self.pos)
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}
