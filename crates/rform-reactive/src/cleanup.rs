#![forbid(unsafe_code)]

//! Explicit teardown handles.
//!
//! A [`Cleanup`] is a one-shot teardown closure returned by the effect
//! runtime. It is **not** run on drop: teardown is always an explicit call.
//! A [`CleanupScope`] collects many cleanups and runs them together.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use tracing::warn;

/// One-shot teardown closure.
#[must_use = "a cleanup does nothing unless run"]
pub struct Cleanup {
    f: Option<Box<dyn FnOnce()>>,
}

impl Cleanup {
    /// Wrap a teardown closure.
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self {
            f: Some(Box::new(f)),
        }
    }

    /// A cleanup that does nothing.
    pub fn noop() -> Self {
        Self { f: None }
    }

    /// Whether running this cleanup has any effect.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.f.is_none()
    }

    /// Run the teardown.
    pub fn run(mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleanup")
            .field("noop", &self.is_noop())
            .finish()
    }
}

/// Shared collection of cleanups, run together exactly once per
/// [`run_all`](CleanupScope::run_all).
///
/// Cloning creates a new handle to the same scope. A cleanup that panics is
/// logged and does not stop the remaining ones.
#[derive(Clone, Default)]
pub struct CleanupScope {
    entries: Rc<RefCell<Vec<Cleanup>>>,
}

impl CleanupScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cleanup to the scope. No-op cleanups are discarded.
    pub fn register(&self, cleanup: Cleanup) {
        if !cleanup.is_noop() {
            self.entries.borrow_mut().push(cleanup);
        }
    }

    /// Add a closure as a cleanup.
    pub fn defer(&self, f: impl FnOnce() + 'static) {
        self.register(Cleanup::new(f));
    }

    /// Number of pending cleanups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no cleanups are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Run every pending cleanup in registration order and empty the scope.
    ///
    /// The pending list is taken before anything runs, so a cleanup that
    /// calls back into `run_all` sees an empty scope. Returns the number of
    /// cleanups that panicked.
    pub fn run_all(&self) -> usize {
        let pending = std::mem::take(&mut *self.entries.borrow_mut());
        let mut panicked = 0;
        for cleanup in pending {
            if catch_unwind(AssertUnwindSafe(|| cleanup.run())).is_err() {
                warn!("cleanup panicked during teardown");
                panicked += 1;
            }
        }
        panicked
    }
}

impl std::fmt::Debug for CleanupScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupScope")
            .field("pending", &self.len())
            .finish()
    }
}
