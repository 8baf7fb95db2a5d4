#![forbid(unsafe_code)]

//! Periodic timers driven by host ticks.
//!
//! [`Scheduler`] is the timer facility consumed by
//! [`use_interval`](crate::effect::use_interval). [`TickScheduler`] is a
//! deterministic implementation: no threads, no clock. The host calls
//! [`advance`](TickScheduler::advance) from its own loop and every due timer
//! fires synchronously.
//!
//! ```text
//! host loop
//!   → advance(1)      // now += 1, fire timers whose deadline is now
//!   → callbacks run   // may register or clear timers
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

/// Opaque timer id returned by [`Scheduler::run_interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A periodic-timer facility.
pub trait Scheduler {
    /// Fire `callback` every `period` ticks until cleared.
    fn run_interval(&self, period: u32, callback: Box<dyn FnMut()>) -> TimerId;

    /// Cancel a timer. Unknown or already-cleared ids are a no-op.
    fn clear_run(&self, id: TimerId);
}

type TimerCallback = Rc<RefCell<Box<dyn FnMut()>>>;

struct Timer {
    id: TimerId,
    period: u64,
    next_due: u64,
    callback: TimerCallback,
}

#[derive(Default)]
struct SchedulerInner {
    now: u64,
    next_id: u64,
    timers: Vec<Timer>,
}

/// Host-driven scheduler. Cloning yields a handle to the same timer table.
#[derive(Clone, Default)]
pub struct TickScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl TickScheduler {
    /// Create a scheduler at tick 0 with no timers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }

    /// Number of registered timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Advance by one tick.
    pub fn tick(&self) -> usize {
        self.advance(1)
    }

    /// Advance by `ticks`, firing due timers in registration order on every
    /// tick. Returns the number of callback invocations.
    pub fn advance(&self, ticks: u64) -> usize {
        let mut fired = 0;
        for _ in 0..ticks {
            let due: Vec<(TimerId, TimerCallback)> = {
                let mut inner = self.inner.borrow_mut();
                inner.now += 1;
                let now = inner.now;
                inner
                    .timers
                    .iter_mut()
                    .filter(|t| t.next_due == now)
                    .map(|t| {
                        t.next_due = now + t.period;
                        (t.id, Rc::clone(&t.callback))
                    })
                    .collect()
            };
            for (id, callback) in due {
                // A callback earlier in this tick may have cleared this one.
                if !self.is_registered(id) {
                    continue;
                }
                match callback.try_borrow_mut() {
                    Ok(mut f) => {
                        f();
                        fired += 1;
                    }
                    Err(_) => trace!(timer = id.0, "re-entrant timer firing skipped"),
                }
            }
        }
        fired
    }

    fn is_registered(&self, id: TimerId) -> bool {
        self.inner.borrow().timers.iter().any(|t| t.id == id)
    }
}

impl Scheduler for TickScheduler {
    fn run_interval(&self, period: u32, callback: Box<dyn FnMut()>) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = TimerId(inner.next_id);
        let period = u64::from(period.max(1));
        let next_due = inner.now + period;
        inner.timers.push(Timer {
            id,
            period,
            next_due,
            callback: Rc::new(RefCell::new(callback)),
        });
        trace!(timer = id.0, period, "interval registered");
        id
    }

    fn clear_run(&self, id: TimerId) {
        self.inner.borrow_mut().timers.retain(|t| t.id != id);
    }
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TickScheduler")
            .field("now", &inner.now)
            .field("timers", &inner.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, Box<dyn FnMut()>) {
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        (hits, Box::new(move || hits_clone.set(hits_clone.get() + 1)))
    }

    #[test]
    fn fires_every_period() {
        let sched = TickScheduler::new();
        let (hits, cb) = counter();
        sched.run_interval(4, cb);

        sched.advance(3);
        assert_eq!(hits.get(), 0);
        sched.tick();
        assert_eq!(hits.get(), 1);
        sched.advance(8);
        assert_eq!(hits.get(), 3);
        assert_eq!(sched.now(), 12);
    }

    #[test]
    fn zero_period_fires_every_tick() {
        let sched = TickScheduler::new();
        let (hits, cb) = counter();
        sched.run_interval(0, cb);
        assert_eq!(sched.advance(5), 5);
        assert_eq!(hits.get(), 5);
    }

    #[test]
    fn clear_run_stops_timer_and_is_idempotent() {
        let sched = TickScheduler::new();
        let (hits, cb) = counter();
        let id = sched.run_interval(1, cb);
        sched.tick();
        sched.clear_run(id);
        sched.clear_run(id);
        sched.advance(3);
        assert_eq!(hits.get(), 1);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn callback_can_clear_a_later_timer_in_same_tick() {
        let sched = TickScheduler::new();
        let (hits, cb) = counter();
        let victim = Rc::new(Cell::new(None));

        let sched_clone = sched.clone();
        let victim_clone = Rc::clone(&victim);
        sched.run_interval(
            1,
            Box::new(move || {
                if let Some(id) = victim_clone.get() {
                    sched_clone.clear_run(id);
                }
            }),
        );
        victim.set(Some(sched.run_interval(1, cb)));

        sched.tick();
        assert_eq!(hits.get(), 0);
        assert_eq!(sched.pending(), 1);
    }
}
