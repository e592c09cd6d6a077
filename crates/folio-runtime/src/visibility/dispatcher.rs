#![forbid(unsafe_code)]

//! Visibility-triggered one-shot dispatch.
//!
//! A [`OneShotDispatcher`] watches targets through one intersection detector
//! and runs each target's callback the first time the target meets the
//! dispatcher's [`VisibilityOptions`]. The target is then unobserved and
//! retired for good.
//!
//! # State machine (per target, per dispatcher)
//!
//! ```text
//! unobserved ──watch──▶ watching ──visible ≥ threshold──▶ fired
//! ```
//!
//! `fired` is terminal: there is no path back to `watching`.
//!
//! # Invariants
//!
//! 1. A callback runs at most once, synchronously inside the detector
//!    notification that satisfied the condition.
//! 2. Watching an already-watched target keeps the first callback.
//! 3. Watching a fired target is refused.
//! 4. Dispatchers are independent: the same target may be watched by several,
//!    each with its own one-shot guarantee.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Detection unavailable | Factory returned `None` | Callbacks fire at registration, in order |
//! | Callback panics | Host bug | Propagates; the target is already retired |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::{AHashMap, AHashSet};
use folio_core::VisibilityOptions;
use tracing::{debug, info};

use super::detector::{DetectorFactory, IntersectionDetector, IntersectionEntry, Notify, TargetId};

/// Callback run once when its target becomes visible.
pub type OneShotCallback = Box<dyn FnOnce(TargetId)>;

/// Result of [`OneShotDispatcher::watch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The target is now being watched.
    Watching,
    /// The target was already being watched; the new callback was discarded.
    AlreadyWatching,
    /// The target already fired in this dispatcher; the callback was discarded.
    AlreadyFired,
    /// Detection is unavailable; the callback ran immediately.
    FiredImmediately,
}

#[derive(Default)]
struct Registry {
    watching: AHashMap<TargetId, OneShotCallback>,
    fired: AHashSet<TargetId>,
}

struct DispatcherInner {
    label: String,
    options: VisibilityOptions,
    detector: Option<Rc<dyn IntersectionDetector>>,
    registry: RefCell<Registry>,
}

impl DispatcherInner {
    fn on_entries(&self, entries: &[IntersectionEntry]) {
        for entry in entries {
            let hit = folio_core::Intersection {
                ratio: entry.ratio,
                is_intersecting: entry.is_intersecting,
            };
            if !self.options.is_met_by(&hit) {
                continue;
            }
            // Retire before running so the callback cannot observe a watching state.
            let callback = {
                let mut registry = self.registry.borrow_mut();
                let Some(callback) = registry.watching.remove(&entry.target) else {
                    continue;
                };
                registry.fired.insert(entry.target);
                callback
            };
            if let Some(detector) = &self.detector {
                detector.unobserve(entry.target);
            }
            debug!(
                dispatcher = %self.label,
                element = %entry.target,
                ratio = entry.ratio,
                "one-shot fired"
            );
            callback(entry.target);
        }
    }
}

/// One-shot visibility dispatcher. Clones share the same registry.
#[derive(Clone)]
pub struct OneShotDispatcher {
    inner: Rc<DispatcherInner>,
}

impl OneShotDispatcher {
    /// Create a dispatcher whose detector comes from `factory`.
    ///
    /// `label` only appears in logs.
    pub fn new(
        label: impl Into<String>,
        factory: &dyn DetectorFactory,
        options: VisibilityOptions,
    ) -> Self {
        let label = label.into();
        let inner = Rc::new_cyclic(|weak: &Weak<DispatcherInner>| {
            let weak = weak.clone();
            let notify: Notify = Rc::new(move |entries: &[IntersectionEntry]| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_entries(entries);
                }
            });
            let detector = factory.create(options, notify);
            if detector.is_none() {
                info!(
                    dispatcher = %label,
                    "intersection detection unavailable; one-shot callbacks fire on registration"
                );
            }
            DispatcherInner {
                label,
                options,
                detector,
                registry: RefCell::new(Registry::default()),
            }
        });
        Self { inner }
    }

    /// Create a dispatcher and watch every target in `targets` with a shared
    /// callback. Without detection, all callbacks run before this returns.
    pub fn with_targets(
        label: impl Into<String>,
        factory: &dyn DetectorFactory,
        options: VisibilityOptions,
        targets: impl IntoIterator<Item = TargetId>,
        callback: impl Fn(TargetId) + 'static,
    ) -> Self {
        let dispatcher = Self::new(label, factory, options);
        let callback: Rc<dyn Fn(TargetId)> = Rc::new(callback);
        for target in targets {
            let callback = Rc::clone(&callback);
            dispatcher.watch(target, move |t| callback(t));
        }
        dispatcher
    }

    /// Start watching `target`.
    pub fn watch(&self, target: TargetId, callback: impl FnOnce(TargetId) + 'static) -> WatchOutcome {
        let inner = &self.inner;
        {
            let mut registry = inner.registry.borrow_mut();
            if registry.fired.contains(&target) {
                return WatchOutcome::AlreadyFired;
            }
            if registry.watching.contains_key(&target) {
                return WatchOutcome::AlreadyWatching;
            }
            if inner.detector.is_some() {
                registry.watching.insert(target, Box::new(callback));
            } else {
                registry.fired.insert(target);
                drop(registry);
                debug!(
                    dispatcher = %inner.label,
                    element = %target,
                    "one-shot fired without detection"
                );
                callback(target);
                return WatchOutcome::FiredImmediately;
            }
        }
        if let Some(detector) = &inner.detector {
            detector.observe(target);
        }
        WatchOutcome::Watching
    }

    /// Whether detection is unavailable and callbacks fire on registration.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.inner.detector.is_none()
    }

    #[must_use]
    pub fn is_watching(&self, target: TargetId) -> bool {
        self.inner.registry.borrow().watching.contains_key(&target)
    }

    #[must_use]
    pub fn has_fired(&self, target: TargetId) -> bool {
        self.inner.registry.borrow().fired.contains(&target)
    }

    /// Number of targets still waiting to fire.
    #[must_use]
    pub fn watching_count(&self) -> usize {
        self.inner.registry.borrow().watching.len()
    }

    #[must_use]
    pub fn options(&self) -> VisibilityOptions {
        self.inner.options
    }
}

impl fmt::Debug for OneShotDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.borrow();
        f.debug_struct("OneShotDispatcher")
            .field("label", &self.inner.label)
            .field("degraded", &self.inner.detector.is_none())
            .field("watching", &registry.watching.len())
            .field("fired", &registry.fired.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::{NoDetection, ViewportTracker};
    use folio_core::Rect;
    use std::cell::Cell;
    use tracing_test::traced_test;

    fn tracker() -> ViewportTracker {
        ViewportTracker::new(Rect::new(0.0, 0.0, 1000.0, 800.0))
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn(TargetId) + Clone + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move |_| h.set(h.get() + 1))
    }

    const BELOW: Rect = Rect::new(0.0, 2000.0, 100.0, 100.0);
    const ON_SCREEN: Rect = Rect::new(0.0, 100.0, 100.0, 100.0);

    #[test]
    fn fires_once_when_visible() {
        let tracker = tracker();
        let dispatcher =
            OneShotDispatcher::new("reveal", &tracker, VisibilityOptions::with_threshold(0.1).unwrap());
        let (hits, cb) = counter();
        tracker.set_rect(TargetId(1), BELOW);

        assert_eq!(dispatcher.watch(TargetId(1), cb), WatchOutcome::Watching);
        tracker.refresh();
        assert_eq!(hits.get(), 0);

        tracker.set_rect(TargetId(1), ON_SCREEN);
        assert_eq!(hits.get(), 1);
        assert!(dispatcher.has_fired(TargetId(1)));
        assert!(!dispatcher.is_watching(TargetId(1)));
        assert_eq!(tracker.observed_count(), 0, "fired target is unobserved");

        // Leaving and re-entering the viewport does not re-fire.
        tracker.set_rect(TargetId(1), BELOW);
        tracker.set_rect(TargetId(1), ON_SCREEN);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn duplicate_watch_fires_once() {
        let tracker = tracker();
        let dispatcher = OneShotDispatcher::new("dup", &tracker, VisibilityOptions::default());
        let (first, cb1) = counter();
        let (second, cb2) = counter();

        assert_eq!(dispatcher.watch(TargetId(5), cb1), WatchOutcome::Watching);
        assert_eq!(dispatcher.watch(TargetId(5), cb2), WatchOutcome::AlreadyWatching);
        tracker.set_rect(TargetId(5), ON_SCREEN);

        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
        let (third, cb3) = counter();
        assert_eq!(dispatcher.watch(TargetId(5), cb3), WatchOutcome::AlreadyFired);
        tracker.refresh();
        assert_eq!(third.get(), 0);
    }

    #[test]
    fn below_threshold_does_not_fire() {
        let tracker = tracker();
        let dispatcher =
            OneShotDispatcher::new("skills", &tracker, VisibilityOptions::with_threshold(0.3).unwrap());
        let (hits, cb) = counter();
        dispatcher.watch(TargetId(2), cb);

        // 20% visible.
        tracker.set_rect(TargetId(2), Rect::new(0.0, 780.0, 100.0, 100.0));
        assert_eq!(hits.get(), 0);
        // 30% visible.
        tracker.set_rect(TargetId(2), Rect::new(0.0, 770.0, 100.0, 100.0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn independent_dispatchers_share_targets() {
        let tracker = tracker();
        let fade = OneShotDispatcher::new("fade", &tracker, VisibilityOptions::with_threshold(0.1).unwrap());
        let bars = OneShotDispatcher::new("bars", &tracker, VisibilityOptions::with_threshold(0.3).unwrap());
        let (fade_hits, cb1) = counter();
        let (bar_hits, cb2) = counter();
        fade.watch(TargetId(9), cb1);
        bars.watch(TargetId(9), cb2);

        // 20% visible: only the 0.1 dispatcher fires.
        tracker.set_rect(TargetId(9), Rect::new(0.0, 780.0, 100.0, 100.0));
        assert_eq!((fade_hits.get(), bar_hits.get()), (1, 0));
        assert!(bars.is_watching(TargetId(9)));

        tracker.scroll_to(200.0);
        assert_eq!((fade_hits.get(), bar_hits.get()), (1, 1));
    }

    #[test]
    fn callback_may_watch_new_targets() {
        let tracker = tracker();
        let dispatcher = OneShotDispatcher::new("chain", &tracker, VisibilityOptions::default());
        let (hits, cb) = counter();
        tracker.set_rect(TargetId(2), ON_SCREEN);

        let d = dispatcher.clone();
        dispatcher.watch(TargetId(1), move |_| {
            d.watch(TargetId(2), cb);
        });
        tracker.set_rect(TargetId(1), ON_SCREEN);
        assert!(dispatcher.is_watching(TargetId(2)));
        tracker.refresh();
        assert_eq!(hits.get(), 1);
    }

    #[traced_test]
    #[test]
    fn degraded_mode_fires_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&order);
        let dispatcher = OneShotDispatcher::with_targets(
            "fallback",
            &NoDetection,
            VisibilityOptions::default(),
            [TargetId(3), TargetId(1), TargetId(2)],
            move |t| o.borrow_mut().push(t),
        );

        assert!(dispatcher.is_degraded());
        assert_eq!(*order.borrow(), [TargetId(3), TargetId(1), TargetId(2)]);
        assert_eq!(dispatcher.watching_count(), 0);
        assert_eq!(
            dispatcher.watch(TargetId(1), |_| unreachable!()),
            WatchOutcome::AlreadyFired
        );
        assert_eq!(
            dispatcher.watch(TargetId(4), {
                let o = Rc::clone(&order);
                move |t| o.borrow_mut().push(t)
            }),
            WatchOutcome::FiredImmediately
        );
        assert_eq!(order.borrow().len(), 4);
        assert!(logs_contain("intersection detection unavailable"));
    }

    #[test]
    fn dropped_dispatcher_stops_firing() {
        let tracker = tracker();
        let dispatcher = OneShotDispatcher::new("gone", &tracker, VisibilityOptions::default());
        let (hits, cb) = counter();
        dispatcher.watch(TargetId(1), cb);
        drop(dispatcher);
        tracker.set_rect(TargetId(1), ON_SCREEN);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn debug_reports_counts() {
        let tracker = tracker();
        let dispatcher = OneShotDispatcher::new("dbg", &tracker, VisibilityOptions::default());
        dispatcher.watch(TargetId(1), |_| {});
        let debug = format!("{dispatcher:?}");
        assert!(debug.contains("watching: 1"));
        assert!(debug.contains("degraded: false"));
    }
}
