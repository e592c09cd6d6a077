#![forbid(unsafe_code)]

//! Rate-limiting throttle controller.
//!
//! A [`Throttle`] lets at most one trigger per `limit` window reach its
//! action. Triggers that arrive while the window is open are **dropped**:
//! they are not queued, not replayed, and do not move the window.
//!
//! Two edges are supported:
//!
//! - [`Edge::Leading`]: the window-opening trigger runs immediately.
//! - [`Edge::Trailing`]: the window-opening trigger runs when the window
//!   closes, with its own arguments. This is the frame-coalescing shape used
//!   for scroll handlers that read live state when they run.
//!
//! # Invariants
//!
//! 1. The action runs at most once per `limit` window.
//! 2. The trigger that opens a window is the first one after the previous
//!    window closed.
//! 3. Dropped triggers have no side effects.
//! 4. Re-entrant triggers from inside the action are dropped.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use web_time::Duration;

use crate::error::TimingError;
use crate::timer::Scheduler;

/// Which end of the window the admitted trigger runs at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Edge {
    /// Run the admitted trigger immediately.
    #[default]
    Leading,
    /// Run the admitted trigger when its window closes.
    Trailing,
}

/// What happened to a single trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleOutcome {
    /// The action ran synchronously (leading edge).
    Fired,
    /// The action will run when the window closes (trailing edge).
    Scheduled,
    /// The window was open; the trigger was discarded.
    Dropped,
}

struct ThrottleInner<A> {
    action: Box<dyn Fn(A)>,
    limit: Duration,
    edge: Edge,
    scheduler: Rc<dyn Scheduler>,
    cooling: Cell<bool>,
}

/// Throttle controller. Clones share the same cooldown window.
pub struct Throttle<A: 'static> {
    inner: Rc<ThrottleInner<A>>,
}

impl<A: 'static> Clone for Throttle<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> Throttle<A> {
    /// Create a leading-edge throttle.
    ///
    /// # Errors
    ///
    /// [`TimingError::InvalidArgument`] if `limit` is zero.
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        limit: Duration,
        action: impl Fn(A) + 'static,
    ) -> Result<Self, TimingError> {
        Self::with_edge(scheduler, limit, Edge::Leading, action)
    }

    /// Create a throttle running on the given edge.
    ///
    /// # Errors
    ///
    /// [`TimingError::InvalidArgument`] if `limit` is zero.
    pub fn with_edge(
        scheduler: Rc<dyn Scheduler>,
        limit: Duration,
        edge: Edge,
        action: impl Fn(A) + 'static,
    ) -> Result<Self, TimingError> {
        if limit.is_zero() {
            return Err(TimingError::invalid("limit", "must be greater than zero"));
        }
        Ok(Self {
            inner: Rc::new(ThrottleInner {
                action: Box::new(action),
                limit,
                edge,
                scheduler,
                cooling: Cell::new(false),
            }),
        })
    }

    /// Offer a trigger to the throttle.
    pub fn trigger(&self, args: A) -> ThrottleOutcome {
        let inner = &self.inner;
        if inner.cooling.get() {
            #[cfg(feature = "tracing")]
            tracing::trace!("throttle dropped trigger");
            return ThrottleOutcome::Dropped;
        }
        inner.cooling.set(true);

        let weak: Weak<ThrottleInner<A>> = Rc::downgrade(inner);
        match inner.edge {
            Edge::Leading => {
                inner.scheduler.schedule(
                    inner.limit,
                    Box::new(move || {
                        if let Some(inner) = weak.upgrade() {
                            inner.cooling.set(false);
                        }
                    }),
                );
                (inner.action)(args);
                ThrottleOutcome::Fired
            }
            Edge::Trailing => {
                inner.scheduler.schedule(
                    inner.limit,
                    Box::new(move || {
                        if let Some(inner) = weak.upgrade() {
                            (inner.action)(args);
                            inner.cooling.set(false);
                        }
                    }),
                );
                ThrottleOutcome::Scheduled
            }
        }
    }

    /// Length of the window opened by an admitted trigger.
    #[must_use]
    pub fn limit(&self) -> Duration {
        self.inner.limit
    }

    /// Where in the window admitted triggers run.
    #[must_use]
    pub fn edge(&self) -> Edge {
        self.inner.edge
    }

    /// Whether a window is open and triggers are being dropped.
    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        self.inner.cooling.get()
    }

    /// A closure that triggers this throttle, for wiring to event sources.
    pub fn as_fn(&self) -> impl Fn(A) + 'static {
        let this = self.clone();
        move |args| {
            this.trigger(args);
        }
    }
}

impl<A: 'static> fmt::Debug for Throttle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("limit", &self.inner.limit)
            .field("edge", &self.inner.edge)
            .field("cooling", &self.inner.cooling.get())
            .finish()
    }
}

/// Shorthand for [`Throttle::new`].
///
/// # Errors
///
/// [`TimingError::InvalidArgument`] if `limit` is zero.
pub fn throttle<A: 'static>(
    scheduler: Rc<dyn Scheduler>,
    limit: Duration,
    action: impl Fn(A) + 'static,
) -> Result<Throttle<A>, TimingError> {
    Throttle::new(scheduler, limit, action)
}
