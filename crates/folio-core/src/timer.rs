#![forbid(unsafe_code)]

//! Single-threaded timer queue and the scheduling seam.
//!
//! [`Scheduler`] is the host-provided `schedule(callback, delay) -> handle` /
//! `cancel(handle)` pair that every deferred primitive in Folio is built on.
//! [`TimerQueue`] is the in-process implementation: a cooperative queue that
//! the host's event loop drains with [`TimerQueue::run_due`].
//!
//! # Invariants
//!
//! 1. Timers run in deadline order; equal deadlines run in scheduling order.
//! 2. A timer runs at most once. Cancelling a fired or unknown handle is a
//!    no-op that returns `false`.
//! 3. Callbacks run with no queue borrow held, so they may schedule or cancel.
//! 4. A timer scheduled from inside a callback never runs in the same
//!    [`run_due`](TimerQueue::run_due) pass, even with a zero delay. Zero-delay
//!    timers therefore run on the *next* tick.
//!
//! # Clocks
//!
//! [`SystemClock`] reads [`web_time::Instant`], which also works on
//! `wasm32-unknown-unknown`. [`ManualClock`] is shared virtual time for
//! deterministic tests and replays; [`TimerQueue::advance`] steps it from one
//! deadline to the next so callbacks observe their exact firing time.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use web_time::{Duration, Instant};

/// Delays longer than this are clamped, mirroring host `setTimeout` limits.
pub const MAX_DELAY: Duration = Duration::from_millis(i32::MAX as u64);

/// Opaque reference to a pending scheduled callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw id, unique per scheduler.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A deferred callback owned by a scheduler until it fires or is cancelled.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Host scheduling primitive.
///
/// Implementations must not run `callback` before `schedule` returns.
pub trait Scheduler {
    /// Schedule `callback` to run once after `delay`.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Cancel a pending callback. Returns `true` if it was still pending.
    fn cancel(&self, handle: TimerHandle) -> bool;
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        (**self).schedule(delay, callback)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        (**self).cancel(handle)
    }
}

/// Source of "now" for a [`TimerQueue`].
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`web_time::Instant`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Shared virtual clock. Clones observe and move the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    /// Create a clock frozen at the current wall-clock instant.
    #[must_use]
    pub fn new() -> Self {
        let origin = Instant::now();
        Self {
            origin,
            now: Rc::new(Cell::new(origin)),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Move time forward to `instant`. Earlier instants are ignored.
    pub fn advance_to(&self, instant: Instant) {
        if instant > self.now.get() {
            self.now.set(instant);
        }
    }

    /// Virtual time elapsed since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.now.get().duration_since(self.origin)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

// ---------------------------------------------------------------------------
// TimerQueue
// ---------------------------------------------------------------------------

struct QueueState {
    next_id: u64,
    entries: BTreeMap<(Instant, u64), TimerCallback>,
    deadlines: AHashMap<u64, Instant>,
}

impl QueueState {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
            deadlines: AHashMap::new(),
        }
    }

    /// Remove the earliest due entry scheduled before `watermark`.
    fn pop_due(&mut self, now: Instant, watermark: u64) -> Option<TimerCallback> {
        let key = self
            .entries
            .keys()
            .take_while(|(deadline, _)| *deadline <= now)
            .find(|(_, id)| *id < watermark)
            .copied()?;
        self.deadlines.remove(&key.1);
        self.entries.remove(&key)
    }
}

/// Cooperative timer queue implementing [`Scheduler`].
///
/// The queue never runs callbacks on its own; the owner calls
/// [`run_due`](Self::run_due) from its event loop (or
/// [`advance`](TimerQueue::advance) under a [`ManualClock`]).
pub struct TimerQueue<C: Clock = SystemClock> {
    clock: C,
    state: RefCell<QueueState>,
}

impl TimerQueue<SystemClock> {
    /// Create a queue driven by the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TimerQueue<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TimerQueue<C> {
    /// Create a queue driven by `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: RefCell::new(QueueState::new()),
        }
    }

    /// The queue's clock.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current instant according to the queue's clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Number of timers waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Whether no timers are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    /// Whether `handle` is still waiting to run.
    #[must_use]
    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.state.borrow().deadlines.contains_key(&handle.0)
    }

    /// Deadline of the earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state
            .borrow()
            .entries
            .keys()
            .next()
            .map(|(deadline, _)| *deadline)
    }

    /// Run every timer that is due now. Returns how many ran.
    ///
    /// Timers scheduled by the callbacks themselves wait for the next call.
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();
        let watermark = self.state.borrow().next_id;
        let mut ran = 0;
        loop {
            // The borrow ends before the callback runs.
            let next = self.state.borrow_mut().pop_due(now, watermark);
            let Some(callback) = next else {
                break;
            };
            callback();
            ran += 1;
        }
        #[cfg(feature = "tracing")]
        if ran > 0 {
            tracing::trace!(ran, pending = self.pending(), "timer queue drained");
        }
        ran
    }
}

impl TimerQueue<ManualClock> {
    /// Create a queue on a fresh [`ManualClock`].
    #[must_use]
    pub fn manual() -> Self {
        Self::with_clock(ManualClock::new())
    }

    /// Virtual time elapsed since the queue's clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Advance virtual time by `by`, running timers at their exact deadlines.
    ///
    /// Timers scheduled during the advance run too if their deadline falls
    /// inside the window. Returns how many timers ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.clock.now() + by;
        let mut ran = 0;
        while let Some(deadline) = self.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock.advance_to(deadline);
            ran += self.run_due();
        }
        self.clock.advance_to(target);
        ran
    }

    /// Run one tick at the current instant.
    ///
    /// Zero-delay timers scheduled by these callbacks wait for the next call.
    pub fn run_pending_ticks(&self) -> usize {
        self.run_due()
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let deadline = self.clock.now() + delay.min(MAX_DELAY);
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.entries.insert((deadline, id), callback);
        state.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut state = self.state.borrow_mut();
        match state.deadlines.remove(&handle.0) {
            Some(deadline) => state.entries.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }
}

impl<C: Clock> fmt::Debug for TimerQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("pending", &self.pending())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> TimerCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let make = move |tag: &'static str| -> TimerCallback {
            let l = Rc::clone(&l);
            Box::new(move || l.borrow_mut().push(tag))
        };
        (log, make)
    }

    #[test]
    fn runs_in_deadline_order() {
        let queue = TimerQueue::manual();
        let (log, cb) = recorder();
        queue.schedule(ms(30), cb("c"));
        queue.schedule(ms(10), cb("a"));
        queue.schedule(ms(20), cb("b"));

        assert_eq!(queue.advance(ms(30)), 3);
        assert_eq!(*log.borrow(), ["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn equal_deadlines_run_in_scheduling_order() {
        let queue = TimerQueue::manual();
        let (log, cb) = recorder();
        queue.schedule(ms(5), cb("first"));
        queue.schedule(ms(5), cb("second"));
        queue.advance(ms(5));
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn nothing_runs_before_deadline() {
        let queue = TimerQueue::manual();
        let (log, cb) = recorder();
        queue.schedule(ms(100), cb("late"));
        assert_eq!(queue.advance(ms(99)), 0);
        assert!(log.borrow().is_empty());
        assert_eq!(queue.advance(ms(1)), 1);
    }

    #[test]
    fn cancel_prevents_run() {
        let queue = TimerQueue::manual();
        let (log, cb) = recorder();
        let handle = queue.schedule(ms(10), cb("never"));
        assert!(queue.is_scheduled(handle));
        assert!(queue.cancel(handle));
        assert!(!queue.is_scheduled(handle));
        queue.advance(ms(50));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let queue = TimerQueue::manual();
        let (_log, cb) = recorder();
        let handle = queue.schedule(ms(1), cb("x"));
        queue.advance(ms(1));
        assert!(!queue.cancel(handle));
        assert!(!queue.cancel(TimerHandle(999)));
    }

    #[test]
    fn zero_delay_waits_for_next_tick() {
        let queue = Rc::new(TimerQueue::manual());
        let log = Rc::new(RefCell::new(Vec::new()));

        let q = Rc::clone(&queue);
        let l = Rc::clone(&log);
        queue.schedule(
            Duration::ZERO,
            Box::new(move || {
                l.borrow_mut().push(1);
                let l2 = Rc::clone(&l);
                q.schedule(Duration::ZERO, Box::new(move || l2.borrow_mut().push(2)));
            }),
        );

        assert_eq!(queue.run_due(), 1);
        assert_eq!(*log.borrow(), [1]);
        assert_eq!(queue.run_due(), 1);
        assert_eq!(*log.borrow(), [1, 2]);
    }

    #[test]
    fn pending_ticks_run_one_generation_per_call() {
        let queue = Rc::new(TimerQueue::manual());
        let ticks = Rc::new(Cell::new(0u32));

        fn reschedule(queue: &Rc<TimerQueue<ManualClock>>, ticks: &Rc<Cell<u32>>) {
            let q = Rc::clone(queue);
            let t = Rc::clone(ticks);
            queue.schedule(
                Duration::ZERO,
                Box::new(move || {
                    t.set(t.get() + 1);
                    reschedule(&q, &t);
                }),
            );
        }
        reschedule(&queue, &ticks);

        assert_eq!(queue.run_pending_ticks(), 1);
        assert_eq!(queue.run_pending_ticks(), 1);
        assert_eq!(ticks.get(), 2);
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.elapsed(), Duration::ZERO);
    }

    #[test]
    fn advance_runs_timers_scheduled_inside_window() {
        let queue = Rc::new(TimerQueue::manual());
        let fired_at = Rc::new(RefCell::new(Vec::new()));

        let q = Rc::clone(&queue);
        let f = Rc::clone(&fired_at);
        queue.schedule(
            ms(10),
            Box::new(move || {
                f.borrow_mut().push(q.elapsed());
                let f2 = Rc::clone(&f);
                let q2 = Rc::clone(&q);
                q.schedule(ms(15), Box::new(move || f2.borrow_mut().push(q2.elapsed())));
            }),
        );

        assert_eq!(queue.advance(ms(100)), 2);
        assert_eq!(*fired_at.borrow(), [ms(10), ms(25)]);
        assert_eq!(queue.elapsed(), ms(100));
    }

    #[test]
    fn callback_can_cancel_sibling() {
        let queue = Rc::new(TimerQueue::manual());
        let (log, cb) = recorder();
        let victim = queue.schedule(ms(20), cb("victim"));
        let q = Rc::clone(&queue);
        queue.schedule(
            ms(10),
            Box::new(move || {
                q.cancel(victim);
            }),
        );
        queue.advance(ms(30));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn next_deadline_tracks_earliest() {
        let queue = TimerQueue::manual();
        assert_eq!(queue.next_deadline(), None);
        let start = queue.now();
        queue.schedule(ms(40), Box::new(|| {}));
        queue.schedule(ms(15), Box::new(|| {}));
        assert_eq!(queue.next_deadline(), Some(start + ms(15)));
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn huge_delay_is_clamped() {
        let queue = TimerQueue::manual();
        let start = queue.now();
        queue.schedule(Duration::from_secs(u64::MAX / 4), Box::new(|| {}));
        assert_eq!(queue.next_deadline(), Some(start + MAX_DELAY));
    }

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(ms(7));
        assert_eq!(other.elapsed(), ms(7));
        other.advance_to(clock.now() - ms(3));
        assert_eq!(clock.elapsed(), ms(7), "clock never moves backwards");
    }

    #[test]
    fn scheduler_through_rc_dyn() {
        let queue = Rc::new(TimerQueue::manual());
        let scheduler: Rc<dyn Scheduler> = queue.clone();
        let (log, cb) = recorder();
        scheduler.schedule(ms(1), cb("dyn"));
        queue.advance(ms(1));
        assert_eq!(*log.borrow(), ["dyn"]);
    }
}
