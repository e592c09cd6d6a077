#![forbid(unsafe_code)]

//! Device capability detection and the effect budget it selects.
//!
//! Detection is a pure function of a [`DeviceProfile`] snapshot so hosts can
//! feed whatever their platform reports and tests can cover every branch.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::config::PageConfig;

/// Network quality class as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectiveConnection {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
}

impl EffectiveConnection {
    /// Whether this connection is slow enough to reduce effects.
    #[must_use]
    pub const fn is_slow(self) -> bool {
        matches!(self, Self::Slow2g | Self::TwoG)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slow2g => "slow-2g",
            Self::TwoG => "2g",
            Self::ThreeG => "3g",
            Self::FourG => "4g",
        }
    }
}

impl fmt::Display for EffectiveConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised connection label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownConnection(pub String);

impl fmt::Display for UnknownConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown effective connection type: {}", self.0)
    }
}

impl std::error::Error for UnknownConnection {}

impl FromStr for EffectiveConnection {
    type Err = UnknownConnection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Ok(Self::Slow2g),
            "2g" => Ok(Self::TwoG),
            "3g" => Ok(Self::ThreeG),
            "4g" => Ok(Self::FourG),
            _ => Err(UnknownConnection(s.to_string())),
        }
    }
}

/// What the host knows about the device at startup.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DeviceProfile {
    /// Viewport width in CSS pixels.
    pub viewport_width: f64,
    /// Logical core count, when the platform exposes it.
    pub hardware_concurrency: Option<u32>,
    /// Connection class, when the platform exposes it.
    pub connection: Option<EffectiveConnection>,
}

impl DeviceProfile {
    #[must_use]
    pub fn new(viewport_width: f64) -> Self {
        Self {
            viewport_width,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cores(mut self, cores: u32) -> Self {
        self.hardware_concurrency = Some(cores);
        self
    }

    #[must_use]
    pub fn with_connection(mut self, connection: EffectiveConnection) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Build a profile from raw host strings; unknown connection labels are
    /// treated as absent.
    #[must_use]
    pub fn from_host(
        viewport_width: f64,
        hardware_concurrency: Option<u32>,
        connection: Option<&str>,
    ) -> Self {
        Self {
            viewport_width,
            hardware_concurrency,
            connection: connection.and_then(|label| label.parse().ok()),
        }
    }
}

/// Whether `width` counts as a mobile viewport.
#[must_use]
pub fn is_mobile_width(width: f64, config: &PageConfig) -> bool {
    width <= f64::from(config.mobile_max_width)
}

/// Decide performance mode for `profile`.
///
/// On when the viewport is mobile, the device reports few cores, or the
/// connection is slow. Missing capabilities never turn it on.
#[must_use]
pub fn detect_performance_mode(profile: &DeviceProfile, config: &PageConfig) -> bool {
    let mobile = is_mobile_width(profile.viewport_width, config);
    let low_end = profile
        .hardware_concurrency
        .is_some_and(|cores| cores <= config.low_end_max_cores);
    let slow = profile.connection.is_some_and(EffectiveConnection::is_slow);
    let enabled = mobile || low_end || slow;
    if enabled {
        info!(mobile, low_end, slow, "performance mode enabled");
    }
    enabled
}

/// How many decorative elements to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct EffectBudget {
    pub raindrops: usize,
    pub particles: usize,
}

impl EffectBudget {
    pub const FULL: Self = Self {
        raindrops: 200,
        particles: 50,
    };

    pub const REDUCED: Self = Self {
        raindrops: 120,
        particles: 30,
    };

    /// Pick the configured budget for the given mode.
    #[must_use]
    pub fn select(performance_mode: bool, config: &PageConfig) -> Self {
        if performance_mode {
            config.reduced_effects
        } else {
            config.full_effects
        }
    }
}
