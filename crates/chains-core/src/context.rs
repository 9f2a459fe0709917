//! Per-request context threaded through every handler.
//!
//! The chain never looks at it. It carries what handlers need to cooperate
//! on a single request:
//! - a request id (ULID, sortable by arrival time)
//! - a cancellation flag, inherited by child contexts
//! - an optional deadline, tightened (never relaxed) by child contexts
//!
//! Cancellation is cooperative: nothing is preempted, handlers call
//! [`Context::check`] where stopping early makes sense.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::ChainError;

/// Identifier of one request, displayed as `req-<ulid>`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(Ulid);

impl RequestId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct CancelState {
    canceled: AtomicBool,
    parent: Option<Arc<CancelState>>,
}

impl CancelState {
    fn is_canceled(&self) -> bool {
        if self.canceled.load(Ordering::Acquire) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.is_canceled())
    }
}

/// Cancellation and deadline state for one request.
///
/// Cloning shares the cancellation flag; [`Context::child`] and the
/// deadline constructors create a new flag linked to this one, so canceling
/// a parent cancels its children but not the other way round.
#[derive(Debug, Clone)]
pub struct Context {
    request_id: RequestId,
    cancel: Arc<CancelState>,
    deadline: Option<Instant>,
}

impl Context {
    /// Root context with a fresh request id and no deadline.
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            cancel: Arc::default(),
            deadline: None,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Derived context that can be canceled on its own.
    pub fn child(&self) -> Self {
        Self {
            request_id: self.request_id,
            cancel: Arc::new(CancelState {
                canceled: AtomicBool::new(false),
                parent: Some(Arc::clone(&self.cancel)),
            }),
            deadline: self.deadline,
        }
    }

    /// Derived context whose deadline is the earlier of `deadline` and ours.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.child();
        child.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        child
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancel.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// True once canceled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Why the context is done, if it is.
    pub fn err(&self) -> Option<ChainError> {
        if self.is_canceled() {
            return Some(ChainError::Canceled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(ChainError::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Err` once the context is done, `Ok(())` otherwise.
    pub fn check(&self) -> Result<(), ChainError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_live() {
        let cx = Context::new();
        assert!(!cx.is_done());
        assert!(cx.check().is_ok());
        assert!(cx.deadline().is_none());
        assert!(cx.remaining().is_none());
        assert!(cx.request_id().to_string().starts_with("req-"));
    }

    #[test]
    fn cancel_reaches_children_but_not_parents() {
        let parent = Context::new();
        let child = parent.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        grandchild.cancel();
        assert!(grandchild.is_canceled());
        assert!(!child.is_canceled());
        assert!(!parent.is_canceled());

        parent.cancel();
        assert!(child.is_canceled());
        assert!(matches!(child.check(), Err(ChainError::Canceled)));
    }

    #[test]
    fn clones_share_the_cancel_flag() {
        let cx = Context::new();
        let clone = cx.clone();
        clone.cancel();
        assert!(cx.is_canceled());
    }

    #[test]
    fn expired_deadline_reports_deadline_exceeded() {
        let cx = Context::new().with_deadline(Instant::now());
        assert!(matches!(cx.err(), Some(ChainError::DeadlineExceeded)));
        assert_eq!(cx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn child_deadline_never_extends_parent() {
        let parent = Context::new().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[test]
    fn children_keep_the_request_id() {
        let cx = Context::new();
        assert_eq!(cx.child().request_id(), cx.request_id());
        assert_eq!(
            cx.with_timeout(Duration::from_secs(1)).request_id(),
            cx.request_id()
        );
    }
}
