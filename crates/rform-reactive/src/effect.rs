#![forbid(unsafe_code)]

//! Hook-style effect runtime on top of [`Observable`].
//!
//! - [`use_state`]: getter/setter pair over a fresh observable. Setting
//!   state only notifies subscribers; nothing is re-rendered.
//! - [`use_effect`]: run a side effect now and again whenever a dependency
//!   changes, with cleanup between runs.
//! - [`use_interval`]: periodic timer with a matching [`Cleanup`].
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Disposed dependency at registration | `dispose()` before `use_effect` | Dependency skipped, logged |
//! | Disposed dependency at cleanup | `dispose()` before cleanup | Error swallowed |
//! | Effect sets its own dependency | Re-entrant re-run | Nested run skipped, logged |

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{trace, warn};

use crate::cleanup::Cleanup;
use crate::observable::{Observable, ObservableError, SubscriberId};
use crate::scheduler::Scheduler;

/// Something an effect can depend on.
///
/// Object safe so that observables of different value types can share one
/// dependency list.
pub trait Dependency {
    /// Register a change callback that ignores the new value.
    fn watch(&self, on_change: Rc<dyn Fn()>) -> Result<SubscriberId, ObservableError>;

    /// Remove a callback registered by [`watch`](Dependency::watch).
    fn unwatch(&self, id: SubscriberId) -> Result<bool, ObservableError>;

    /// Owned handle to the same dependency.
    fn boxed(&self) -> Box<dyn Dependency>;
}

impl<T: Clone + 'static> Dependency for Observable<T> {
    fn watch(&self, on_change: Rc<dyn Fn()>) -> Result<SubscriberId, ObservableError> {
        self.try_subscribe(move |_| on_change())
    }

    fn unwatch(&self, id: SubscriberId) -> Result<bool, ObservableError> {
        self.try_unsubscribe(id)
    }

    fn boxed(&self) -> Box<dyn Dependency> {
        Box::new(self.clone())
    }
}

/// Create a state cell. Returns `(get, set, observable)`.
///
/// The setter is `Observable::set`; it never rebuilds any layout. Bind UI to
/// the returned observable to make state visible.
pub fn use_state<T: Clone + 'static>(
    initial: T,
) -> (impl Fn() -> T, impl Fn(T), Observable<T>) {
    let obs = Observable::new(initial);
    let getter = {
        let obs = obs.clone();
        move || obs.get()
    };
    let setter = {
        let obs = obs.clone();
        move |value: T| obs.set(value)
    };
    (getter, setter, obs)
}

struct EffectSlot<F> {
    effect: F,
    cleanup: Option<Cleanup>,
}

/// Run `effect` immediately and re-run it whenever any of `deps` changes.
///
/// Before each re-run the cleanup returned by the previous run (if any) is
/// executed. The returned [`Cleanup`] runs the last effect cleanup and
/// unsubscribes from every dependency; dependencies disposed in the meantime
/// are ignored.
pub fn use_effect<F>(effect: F, deps: &[&dyn Dependency]) -> Cleanup
where
    F: FnMut() -> Option<Cleanup> + 'static,
{
    let slot = Rc::new(RefCell::new(EffectSlot {
        effect,
        cleanup: None,
    }));
    let active = Rc::new(Cell::new(true));

    let rerun: Rc<dyn Fn()> = {
        let slot = Rc::clone(&slot);
        let active = Rc::clone(&active);
        Rc::new(move || {
            if active.get() {
                run_effect(&slot, &active);
            }
        })
    };

    let mut watched: Vec<(Box<dyn Dependency>, SubscriberId)> = Vec::with_capacity(deps.len());
    for dep in deps {
        match dep.watch(Rc::clone(&rerun)) {
            Ok(id) => watched.push((dep.boxed(), id)),
            Err(err) => warn!(%err, "effect dependency skipped"),
        }
    }

    run_effect(&slot, &active);

    Cleanup::new(move || {
        active.set(false);
        let last = match slot.try_borrow_mut() {
            Ok(mut slot) => slot.cleanup.take(),
            Err(_) => {
                trace!("effect torn down from its own run; its cleanup runs on return");
                None
            }
        };
        if let Some(cleanup) = last {
            cleanup.run();
        }
        for (dep, id) in watched {
            if let Err(err) = dep.unwatch(id) {
                trace!(%err, "ignoring unsubscribe failure during effect cleanup");
            }
        }
    })
}

/// Run the effect once. A run that tore its own effect down has nobody left
/// to hold its cleanup, so that cleanup runs immediately.
fn run_effect<F>(slot: &RefCell<EffectSlot<F>>, active: &Cell<bool>)
where
    F: FnMut() -> Option<Cleanup>,
{
    let returned = {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            warn!("effect re-entered from its own run; nested run skipped");
            return;
        };
        if let Some(previous) = slot.cleanup.take() {
            previous.run();
        }
        let returned = (slot.effect)();
        if active.get() {
            slot.cleanup = returned;
            return;
        }
        returned
    };
    if let Some(cleanup) = returned {
        cleanup.run();
    }
}

/// Fire `callback` every `period` ticks of `scheduler`.
///
/// Registration is immediate and not reactive. The returned cleanup cancels
/// the timer.
pub fn use_interval<S>(scheduler: &S, callback: impl FnMut() + 'static, period: u32) -> Cleanup
where
    S: Scheduler + Clone + 'static,
{
    let id = scheduler.run_interval(period, Box::new(callback));
    let scheduler = scheduler.clone();
    Cleanup::new(move || scheduler.clear_run(id))
}
