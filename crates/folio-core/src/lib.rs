#![forbid(unsafe_code)]

//! Timing and geometry primitives for Folio.
//!
//! This crate provides:
//! - [`TimerQueue`] and the [`Scheduler`] seam for single-threaded deferred callbacks
//! - [`Debouncer`] to collapse bursts of triggers into one trailing call
//! - [`Throttle`] to rate-limit a handler to one call per window
//! - [`Rect`], [`RootMargin`] and [`VisibilityOptions`] for viewport-intersection math

pub mod debounce;
pub mod error;
pub mod throttle;
pub mod timer;
pub mod viewport;

pub use debounce::{Debouncer, debounce};
pub use error::TimingError;
pub use throttle::{Edge, Throttle, ThrottleOutcome, throttle};
pub use timer::{Clock, ManualClock, Scheduler, SystemClock, TimerCallback, TimerHandle, TimerQueue};
pub use viewport::{Intersection, Rect, RootMargin, VisibilityOptions, visible_fraction};

pub use web_time::{Duration, Instant};
