#![forbid(unsafe_code)]

//! Observable value cell with explicit, handle-based subscriptions.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Every [`set`](Observable::set) replaces the
//! value and notifies all current subscribers in registration order. There is
//! no equality check: setting the same value twice notifies twice.
//!
//! Subscribers stay registered until removed with
//! [`unsubscribe`](Observable::unsubscribe). Dropping a [`SubscriberId`] does
//! nothing.
//!
//! # Invariants
//!
//! 1. Each `set` notifies every subscriber registered at the start of the
//!    call exactly once, in registration order, with the value passed.
//! 2. Subscribers added during a notification round are first invoked on the
//!    next `set` (the subscriber list is snapshotted before iterating).
//! 3. `unsubscribe` is idempotent. Unknown ids are a no-op.
//! 4. `version` increments by exactly 1 per `set` / `update`.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Re-entrant `set` | Subscriber sets the same observable | Nested round runs with its own snapshot |
//! | Use after dispose | `try_*` called after [`dispose`](Observable::dispose) | `Err(ObservableError::Disposed)` |
//! | `set` after dispose | Value cell still usable | Value stored, nobody notified |

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

type Callback<T> = Rc<dyn Fn(&T)>;

/// Ids are unique across all observables so that a handle from one
/// observable can never remove a subscriber of another.
static NEXT_SUBSCRIBER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIBER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id (for logging).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Errors from observable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservableError {
    /// The observable was disposed; it no longer tracks subscribers.
    Disposed,
}

impl std::fmt::Display for ObservableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disposed => write!(f, "observable already disposed"),
        }
    }
}

impl std::error::Error for ObservableError {}

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<(SubscriberId, Callback<T>)>,
    disposed: bool,
}

/// A shared value cell with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .field("disposed", &inner.disposed)
            .finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
                disposed: false,
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value and notify every current subscriber.
    pub fn set(&self, value: T) {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value.clone();
            inner.version += 1;
            Self::snapshot(&inner)
        };
        for cb in &callbacks {
            cb(&value);
        }
    }

    /// Modify the value in place, then notify like [`set`](Self::set).
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let (callbacks, value) = {
            let mut inner = self.inner.borrow_mut();
            f(&mut inner.value);
            inner.version += 1;
            (Self::snapshot(&inner), inner.value.clone())
        };
        for cb in &callbacks {
            cb(&value);
        }
    }

    /// Register a subscriber. The same closure may be registered more than
    /// once; each registration is independent.
    ///
    /// On a disposed observable the callback is not stored and the returned
    /// id is inert.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriberId {
        match self.try_subscribe(callback) {
            Ok(id) => id,
            Err(_) => {
                trace!("subscribe on disposed observable ignored");
                SubscriberId::next()
            }
        }
    }

    /// Register a subscriber, failing if the observable was disposed.
    pub fn try_subscribe(
        &self,
        callback: impl Fn(&T) + 'static,
    ) -> Result<SubscriberId, ObservableError> {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return Err(ObservableError::Disposed);
        }
        let id = SubscriberId::next();
        inner.subscribers.push((id, Rc::new(callback)));
        Ok(id)
    }

    /// Remove a subscriber. Returns whether an entry was removed.
    ///
    /// Removing an id twice, or an id that was never registered here, is a
    /// no-op.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.try_unsubscribe(id).unwrap_or(false)
    }

    /// Remove a subscriber, failing if the observable was disposed.
    pub fn try_unsubscribe(&self, id: SubscriberId) -> Result<bool, ObservableError> {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return Err(ObservableError::Disposed);
        }
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        Ok(inner.subscribers.len() != before)
    }

    /// Drop every subscriber and refuse new ones. The value stays readable
    /// and writable.
    pub fn dispose(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.disposed = true;
        inner.subscribers.clear();
    }

    /// Whether [`dispose`](Self::dispose) was called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// Number of `set` / `update` calls so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Whether two handles share the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn snapshot(inner: &ObservableInner<T>) -> Vec<Callback<T>> {
        inner
            .subscribers
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_set_basic() {
        let obs = Observable::new(42);
        assert_eq!(obs.get(), 42);
        assert_eq!(obs.version(), 0);

        obs.set(99);
        assert_eq!(obs.get(), 99);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn same_value_still_notifies() {
        let obs = Observable::new(7);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        obs.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        obs.set(7);
        obs.set(7);
        assert_eq!(count.get(), 2);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn update_mutates_in_place() {
        let obs = Observable::new(vec![1, 2, 3]);
        let last_len = Rc::new(Cell::new(0usize));
        let last_clone = Rc::clone(&last_len);
        obs.subscribe(move |v: &Vec<i32>| last_clone.set(v.len()));

        obs.update(|v| v.push(4));
        assert_eq!(obs.get(), vec![1, 2, 3, 4]);
        assert_eq!(last_len.get(), 4);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ['A', 'B', 'C'] {
            let log = Rc::clone(&log);
            obs.subscribe(move |_| log.borrow_mut().push(tag));
        }

        obs.set(1);
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let id = obs.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        assert!(obs.unsubscribe(id));
        assert!(!obs.unsubscribe(id));
        obs.set(1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn foreign_id_does_not_remove_anything() {
        let a = Observable::new(0);
        let b = Observable::new(0);
        let id_b = b.subscribe(|_| {});
        a.subscribe(|_| {});

        assert!(!a.unsubscribe(id_b));
        assert_eq!(a.subscriber_count(), 1);
        assert_eq!(b.subscriber_count(), 1);
    }

    #[test]
    fn same_closure_twice_is_two_entries() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let cb = {
            let count = Rc::clone(&count);
            move |_: &i32| count.set(count.get() + 1)
        };
        let first = obs.subscribe(cb.clone());
        obs.subscribe(cb);

        obs.set(1);
        assert_eq!(count.get(), 2);

        obs.unsubscribe(first);
        obs.set(2);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn subscriber_added_during_notify_waits_for_next_round() {
        let obs = Observable::new(0);
        let late_calls = Rc::new(Cell::new(0u32));
        let added = Rc::new(Cell::new(false));

        let obs_clone = obs.clone();
        let late_clone = Rc::clone(&late_calls);
        let added_clone = Rc::clone(&added);
        obs.subscribe(move |_| {
            if !added_clone.replace(true) {
                let late = Rc::clone(&late_clone);
                obs_clone.subscribe(move |_| late.set(late.get() + 1));
            }
        });

        obs.set(1);
        assert_eq!(late_calls.get(), 0);
        obs.set(2);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn subscriber_may_unsubscribe_itself() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let own_id = Rc::new(Cell::new(None));

        let obs_clone = obs.clone();
        let count_clone = Rc::clone(&count);
        let id_clone = Rc::clone(&own_id);
        let id = obs.subscribe(move |_| {
            count_clone.set(count_clone.get() + 1);
            if let Some(id) = id_clone.get() {
                obs_clone.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        obs.set(1);
        obs.set(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn reentrant_set_runs_nested_round() {
        let obs = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let obs_clone = obs.clone();
        let seen_clone = Rc::clone(&seen);
        obs.subscribe(move |v| {
            seen_clone.borrow_mut().push(*v);
            if *v == 1 {
                obs_clone.set(2);
            }
        });

        obs.set(1);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(obs.get(), 2);
    }

    #[test]
    fn dispose_drops_subscribers_and_rejects_try_ops() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let id = obs.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        obs.dispose();
        assert!(obs.is_disposed());
        assert_eq!(obs.try_unsubscribe(id), Err(ObservableError::Disposed));
        assert!(!obs.unsubscribe(id));
        assert!(obs.try_subscribe(|_| {}).is_err());

        obs.set(5);
        assert_eq!(obs.get(), 5);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn clone_shares_state() {
        let obs1 = Observable::new(String::from("a"));
        let obs2 = obs1.clone();
        obs2.set("b".to_string());
        assert_eq!(obs1.get(), "b");
        assert!(obs1.ptr_eq(&obs2));
        assert!(!obs1.ptr_eq(&Observable::new(String::new())));
    }

    #[test]
    fn debug_format() {
        let obs = Observable::new(42);
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
    }
}
