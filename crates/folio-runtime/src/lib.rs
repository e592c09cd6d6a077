#![forbid(unsafe_code)]

//! Folio runtime: reactive state, visibility dispatch and the page model.
//!
//! Built on the primitives in `folio-core`:
//! - [`reactive`]: [`Observable`] values the host renders from
//! - [`visibility`]: the detector seam and [`OneShotDispatcher`]
//! - [`page`]: the portfolio page behavior model driven by [`PageEvent`]s
//! - [`config`]: [`PageConfig`] tunables, loadable from TOML/JSON with the
//!   `policy-config` feature

pub mod config;
pub mod page;
pub mod reactive;
pub mod visibility;

pub use config::{ConfigError, PageConfig};
pub use page::{
    Background, DeviceProfile, EffectBudget, Page, PageCommand, PageEvent, PageLayout, SkillBar,
};
pub use reactive::{Observable, Subscription};
pub use visibility::{
    DetectorFactory, IntersectionDetector, IntersectionEntry, NoDetection, OneShotDispatcher,
    TargetId, ViewportTracker, WatchOutcome,
};
