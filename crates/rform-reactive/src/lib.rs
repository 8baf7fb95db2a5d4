#![forbid(unsafe_code)]

//! Reactive primitives for rform.
//!
//! # Role in rform
//! `rform-reactive` is the leaf of the workspace. It has no knowledge of
//! forms or surfaces; `rform-sync` builds observable-bound fields and mounted
//! forms on top of it.
//!
//! # Primary responsibilities
//! - [`Observable`]: shared value cell with ordered, explicit subscriptions.
//! - [`use_state`], [`use_effect`], [`use_interval`]: hook-style effects.
//! - [`TickScheduler`]: host-driven periodic timers.
//! - [`Cleanup`] / [`CleanupScope`]: explicit teardown.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc<RefCell<..>>`). Callbacks are always
//! invoked after internal borrows are released, so subscribers may freely
//! call back into the value they observe.

pub mod cleanup;
pub mod effect;
pub mod observable;
pub mod scheduler;

pub use cleanup::{Cleanup, CleanupScope};
pub use effect::{Dependency, use_effect, use_interval, use_state};
pub use observable::{Observable, ObservableError, SubscriberId};
pub use scheduler::{Scheduler, TickScheduler, TimerId};
