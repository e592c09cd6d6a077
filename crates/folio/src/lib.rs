#![forbid(unsafe_code)]

//! Folio public facade crate.
//!
//! Re-exports the timing primitives from `folio-core` and, with the default
//! `runtime` feature, the page model from `folio-runtime`, plus a
//! [`PageBuilder`] for assembling a [`Page`] with sensible defaults.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use folio_core::{
    Debouncer, Duration, Edge, Instant, Intersection, ManualClock, Rect, RootMargin, Scheduler,
    SystemClock, Throttle, ThrottleOutcome, TimerHandle, TimerQueue, TimingError,
    VisibilityOptions, debounce, throttle,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use folio_runtime::page::{Key, NavbarStyle};
#[cfg(feature = "runtime")]
pub use folio_runtime::{
    Background, ConfigError, DetectorFactory, DeviceProfile, EffectBudget, IntersectionDetector,
    IntersectionEntry, NoDetection, Observable, OneShotDispatcher, Page, PageCommand, PageConfig,
    PageEvent, PageLayout, SkillBar, Subscription, TargetId, ViewportTracker, WatchOutcome,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Folio apps.
#[derive(Debug)]
pub enum Error {
    /// A primitive or page rejected its arguments.
    Timing(TimingError),
    /// Configuration could not be loaded.
    #[cfg(feature = "runtime")]
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timing(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timing(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Config(err) => Some(err),
        }
    }
}

impl From<TimingError> for Error {
    fn from(err: TimingError) -> Self {
        Self::Timing(err)
    }
}

#[cfg(feature = "runtime")]
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for Folio APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Page builder -----------------------------------------------------------

/// Step-by-step [`Page`] construction.
///
/// Defaults: stock [`PageConfig`], a 1280×800 desktop with unknown cores and
/// connection, an empty layout, seed `0`.
#[cfg(feature = "runtime")]
#[derive(Clone, Debug)]
pub struct PageBuilder {
    config: PageConfig,
    device: DeviceProfile,
    viewport_height: f64,
    layout: PageLayout,
    seed: u64,
}

#[cfg(feature = "runtime")]
impl Default for PageBuilder {
    fn default() -> Self {
        Self {
            config: PageConfig::default(),
            device: DeviceProfile::new(1280.0),
            viewport_height: 800.0,
            layout: PageLayout::default(),
            seed: 0,
        }
    }
}

#[cfg(feature = "runtime")]
impl PageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the config from TOML.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the TOML is malformed or fails validation.
    #[cfg(feature = "policy-config")]
    pub fn config_toml(mut self, input: &str) -> Result<Self> {
        self.config = PageConfig::from_toml_str(input)?;
        Ok(self)
    }

    #[must_use]
    pub fn device(mut self, device: DeviceProfile) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn viewport_height(mut self, height: f64) -> Self {
        self.viewport_height = height;
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Seed for the decorative layers.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the page.
    ///
    /// # Errors
    ///
    /// [`Error::Timing`] if the config is invalid.
    pub fn build(
        self,
        scheduler: std::rc::Rc<dyn Scheduler>,
        detection: &dyn DetectorFactory,
    ) -> Result<Page> {
        Ok(Page::new(
            scheduler,
            detection,
            self.config,
            self.device,
            self.viewport_height,
            self.layout,
            self.seed,
        )?)
    }
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Debouncer, Duration, Error, Result, Scheduler, Throttle, TimerQueue, VisibilityOptions,
        debounce, throttle,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{
        DeviceProfile, Observable, OneShotDispatcher, Page, PageBuilder, PageCommand, PageConfig,
        PageEvent, PageLayout, TargetId, ViewportTracker,
    };

    pub use crate::core;
    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use folio_core as core;
#[cfg(feature = "runtime")]
pub use folio_runtime as runtime;
