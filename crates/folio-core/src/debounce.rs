#![forbid(unsafe_code)]

//! Trailing-edge debounce controller.
//!
//! A [`Debouncer`] collapses a burst of triggers into one call of its action,
//! made `wait` after the last trigger with that trigger's arguments.
//!
//! # Usage
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use folio_core::{Debouncer, Duration, TimerQueue};
//!
//! let queue = Rc::new(TimerQueue::manual());
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let s = Rc::clone(&seen);
//! let resize = Debouncer::new(queue.clone(), Duration::from_millis(300), move |w: u32| {
//!     s.borrow_mut().push(w)
//! });
//!
//! resize.trigger(800);
//! queue.advance(Duration::from_millis(100));
//! resize.trigger(640);
//! queue.advance(Duration::from_millis(300));
//! assert_eq!(*seen.borrow(), [640]);
//! ```
//!
//! # Invariants
//!
//! 1. At most one timer is pending per instance; each trigger cancels the
//!    previous one before scheduling its own.
//! 2. For a burst of triggers spaced closer than `wait`, the action runs
//!    exactly once, with the last trigger's arguments.
//! 3. Cancelled triggers have no side effects.
//! 4. A zero `wait` runs the action on the next scheduler tick.
//!
//! # Failure Modes
//!
//! - Instance dropped while a call is pending: the pending call is skipped.
//! - Scheduler that cannot cancel: a generation check still discards the
//!   superseded call.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use web_time::Duration;

use crate::timer::{Scheduler, TimerHandle};

struct DebounceInner<A> {
    action: Box<dyn Fn(A)>,
    wait: Duration,
    scheduler: Rc<dyn Scheduler>,
    pending: Cell<Option<TimerHandle>>,
    generation: Cell<u64>,
}

impl<A> DebounceInner<A> {
    fn fire(&self, generation: u64, args: A) {
        if self.generation.get() != generation {
            return;
        }
        self.pending.set(None);
        #[cfg(feature = "tracing")]
        tracing::debug!(wait = ?self.wait, "debounce fired");
        (self.action)(args);
    }
}

/// Debounce controller. Clones share the same pending timer.
pub struct Debouncer<A: 'static> {
    inner: Rc<DebounceInner<A>>,
}

impl<A: 'static> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> Debouncer<A> {
    /// Create a debouncer that runs `action` `wait` after the last trigger.
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        wait: Duration,
        action: impl Fn(A) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(DebounceInner {
                action: Box::new(action),
                wait,
                scheduler,
                pending: Cell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    /// Record a trigger, replacing any pending call.
    pub fn trigger(&self, args: A) {
        let inner = &self.inner;
        if let Some(previous) = inner.pending.take() {
            inner.scheduler.cancel(previous);
            #[cfg(feature = "tracing")]
            tracing::trace!(timer = previous.id(), "debounce rescheduled");
        }

        let generation = inner.generation.get().wrapping_add(1);
        inner.generation.set(generation);

        let weak: Weak<DebounceInner<A>> = Rc::downgrade(inner);
        let handle = inner.scheduler.schedule(
            inner.wait,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.fire(generation, args);
                }
            }),
        );
        inner.pending.set(Some(handle));
    }

    /// The quiet period before the action runs.
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }

    /// Whether a call is waiting for the quiet period to elapse.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        let pending = self.inner.pending.get();
        pending.is_some()
    }

    /// A closure that triggers this debouncer, for wiring to event sources.
    pub fn as_fn(&self) -> impl Fn(A) + 'static {
        let this = self.clone();
        move |args| this.trigger(args)
    }
}

impl<A: 'static> fmt::Debug for Debouncer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("wait", &self.inner.wait)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Shorthand for [`Debouncer::new`].
pub fn debounce<A: 'static>(
    scheduler: Rc<dyn Scheduler>,
    wait: Duration,
    action: impl Fn(A) + 'static,
) -> Debouncer<A> {
    Debouncer::new(scheduler, wait, action)
}
