#![forbid(unsafe_code)]

//! Viewport visibility: detection seam, a geometric detector, and one-shot
//! dispatch.
//!
//! - [`DetectorFactory`] / [`IntersectionDetector`]: what the host provides.
//! - [`ViewportTracker`]: layout-driven detector for hosts that know element
//!   rectangles.
//! - [`NoDetection`]: the factory for hosts without detection; dispatchers
//!   built on it degrade to firing immediately.
//! - [`OneShotDispatcher`]: fire once per target on first visibility.

pub mod detector;
pub mod dispatcher;
pub mod tracker;

pub use detector::{
    DetectorFactory, IntersectionDetector, IntersectionEntry, NoDetection, Notify, TargetId,
};
pub use dispatcher::{OneShotCallback, OneShotDispatcher, WatchOutcome};
pub use tracker::ViewportTracker;
