#![forbid(unsafe_code)]

//! Viewport-intersection detection seam.
//!
//! A [`DetectorFactory`] plays the role of the host's observer constructor:
//! it hands out one [`IntersectionDetector`] per consumer, configured with
//! that consumer's [`VisibilityOptions`] and notification callback. A factory
//! that returns `None` signals that detection is unavailable in this host.

use std::fmt;
use std::rc::Rc;

use folio_core::VisibilityOptions;

/// Host-assigned identity of a watched element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One visibility report for one target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEntry {
    pub target: TargetId,
    /// Visible fraction of the target, in `[0, 1]`.
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// Callback receiving a batch of reports.
pub type Notify = Rc<dyn Fn(&[IntersectionEntry])>;

/// A configured detector instance.
pub trait IntersectionDetector {
    /// Start reporting on `target`. Observing twice is a no-op.
    fn observe(&self, target: TargetId);

    /// Stop reporting on `target`. Unknown targets are ignored.
    fn unobserve(&self, target: TargetId);
}

/// Constructs detectors.
pub trait DetectorFactory {
    /// Create a detector, or `None` if detection is unavailable.
    ///
    /// Implementations must not invoke `notify` from inside this call.
    fn create(
        &self,
        options: VisibilityOptions,
        notify: Notify,
    ) -> Option<Rc<dyn IntersectionDetector>>;
}

impl<F: DetectorFactory + ?Sized> DetectorFactory for Rc<F> {
    fn create(
        &self,
        options: VisibilityOptions,
        notify: Notify,
    ) -> Option<Rc<dyn IntersectionDetector>> {
        (**self).create(options, notify)
    }
}

/// Factory for hosts without intersection detection.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDetection;

impl DetectorFactory for NoDetection {
    fn create(&self, _: VisibilityOptions, _: Notify) -> Option<Rc<dyn IntersectionDetector>> {
        None
    }
}
