#![forbid(unsafe_code)]

//! Geometric intersection detector.
//!
//! [`ViewportTracker`] is an in-process [`DetectorFactory`] for hosts that
//! know element layout (or for tests). The host pushes element rectangles and
//! the viewport rectangle; the tracker recomputes visibility for every
//! observed target and notifies each detector with the targets whose
//! threshold state changed.
//!
//! # Invariants
//!
//! 1. A newly observed target gets one initial report on the next refresh,
//!    whether or not it is visible.
//! 2. After that, a target is reported only when it crosses its detector's
//!    threshold (in either direction).
//! 3. Notifications run with no tracker borrow held; callbacks may observe,
//!    unobserve, or move rectangles.
//! 4. Detectors are held weakly; dropping the consumer's handle retires it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use folio_core::{Intersection, Rect, VisibilityOptions};

use super::detector::{DetectorFactory, IntersectionDetector, IntersectionEntry, Notify, TargetId};

struct TrackedDetector {
    options: VisibilityOptions,
    notify: Notify,
    /// Observed targets in observe order, with the last reported threshold state.
    targets: RefCell<Vec<(TargetId, Option<bool>)>>,
}

impl TrackedDetector {
    fn collect_changes(
        &self,
        viewport: &Rect,
        rects: &AHashMap<TargetId, Rect>,
    ) -> Vec<IntersectionEntry> {
        let mut entries = Vec::new();
        for (target, last) in self.targets.borrow_mut().iter_mut() {
            let target = *target;
            let hit = rects
                .get(&target)
                .map_or(Intersection::NONE, |rect| self.options.intersect(rect, viewport));
            let met = self.options.is_met_by(&hit);
            if *last != Some(met) {
                *last = Some(met);
                entries.push(IntersectionEntry {
                    target,
                    ratio: hit.ratio,
                    is_intersecting: hit.is_intersecting,
                });
            }
        }
        entries
    }
}

impl IntersectionDetector for TrackedDetector {
    fn observe(&self, target: TargetId) {
        let mut targets = self.targets.borrow_mut();
        if !targets.iter().any(|(t, _)| *t == target) {
            targets.push((target, None));
        }
    }

    fn unobserve(&self, target: TargetId) {
        self.targets.borrow_mut().retain(|(t, _)| *t != target);
    }
}

struct TrackerState {
    viewport: Cell<Rect>,
    rects: RefCell<AHashMap<TargetId, Rect>>,
    detectors: RefCell<Vec<Weak<TrackedDetector>>>,
}

/// Layout-driven detector factory. Clones share the same layout.
#[derive(Clone)]
pub struct ViewportTracker {
    state: Rc<TrackerState>,
}

impl ViewportTracker {
    /// Create a tracker with the given viewport rectangle.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            state: Rc::new(TrackerState {
                viewport: Cell::new(viewport),
                rects: RefCell::new(AHashMap::new()),
                detectors: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.state.viewport.get()
    }

    /// Replace the viewport and deliver any resulting reports.
    pub fn set_viewport(&self, viewport: Rect) -> usize {
        self.state.viewport.set(viewport);
        self.refresh()
    }

    /// Move the viewport vertically to `y` and deliver reports.
    pub fn scroll_to(&self, y: f64) -> usize {
        let mut viewport = self.state.viewport.get();
        viewport.y = y;
        self.set_viewport(viewport)
    }

    /// Set a target's layout rectangle and deliver reports.
    pub fn set_rect(&self, target: TargetId, rect: Rect) -> usize {
        self.state.rects.borrow_mut().insert(target, rect);
        self.refresh()
    }

    /// Forget a target's layout rectangle and deliver reports.
    pub fn remove_rect(&self, target: TargetId) -> usize {
        self.state.rects.borrow_mut().remove(&target);
        self.refresh()
    }

    /// Number of targets observed across live detectors.
    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.live_detectors()
            .iter()
            .map(|d| d.targets.borrow().len())
            .sum()
    }

    /// Recompute visibility and notify detectors. Returns reports delivered.
    pub fn refresh(&self) -> usize {
        let viewport = self.state.viewport.get();
        let mut delivered = 0;
        for detector in self.live_detectors() {
            let entries = detector.collect_changes(&viewport, &self.state.rects.borrow());
            if entries.is_empty() {
                continue;
            }
            delivered += entries.len();
            (detector.notify)(&entries);
        }
        delivered
    }

    fn live_detectors(&self) -> Vec<Rc<TrackedDetector>> {
        let mut detectors = self.state.detectors.borrow_mut();
        detectors.retain(|weak| weak.strong_count() > 0);
        detectors.iter().filter_map(Weak::upgrade).collect()
    }
}

impl DetectorFactory for ViewportTracker {
    fn create(
        &self,
        options: VisibilityOptions,
        notify: Notify,
    ) -> Option<Rc<dyn IntersectionDetector>> {
        let detector = Rc::new(TrackedDetector {
            options,
            notify,
            targets: RefCell::new(Vec::new()),
        });
        self.state
            .detectors
            .borrow_mut()
            .push(Rc::downgrade(&detector));
        Some(detector)
    }
}

impl fmt::Debug for ViewportTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportTracker")
            .field("viewport", &self.viewport())
            .field("rects", &self.state.rects.borrow().len())
            .field("observed", &self.observed_count())
            .finish()
    }
}
