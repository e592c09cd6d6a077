#![forbid(unsafe_code)]

//! Page timing and threshold configuration.
//!
//! [`PageConfig::default`] reproduces the stock portfolio behavior. With the
//! `policy-config` feature a config can be loaded from TOML or JSON; missing
//! keys keep their defaults and loaded values are validated.
//!
//! # Example (TOML)
//!
//! ```toml
//! resize_debounce_ms = 500
//! reveal_threshold = 0.25
//! reveal_margin = "0px 0px -80px"
//!
//! [reduced_effects]
//! raindrops = 60
//! particles = 10
//! ```

use std::fmt;

use folio_core::{Duration, RootMargin, TimingError, VisibilityOptions};

use crate::page::EffectBudget;

/// Largest raindrop or particle count a budget may ask for.
pub const MAX_EFFECT_COUNT: usize = 10_000;

/// Tunables for [`Page`](crate::page::Page).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct PageConfig {
    /// Quiet period before the rain layer is regenerated after resizing.
    pub resize_debounce_ms: u64,
    /// Quiet period before the mobile background is re-evaluated after resizing.
    pub background_debounce_ms: u64,
    /// Delay before re-evaluating the background after an orientation change.
    pub orientation_delay_ms: u64,
    /// Navbar update window; must be non-zero.
    pub scroll_throttle_ms: u64,
    /// Delay before the page is marked loaded.
    pub loaded_delay_ms: u64,
    /// Scroll offset past which the navbar turns solid.
    pub navbar_solid_after_px: f64,
    pub reveal_threshold: f64,
    /// CSS margin shorthand applied to the viewport for reveal detection.
    pub reveal_margin: String,
    pub skills_threshold: f64,
    /// Widest viewport still treated as mobile.
    pub mobile_max_width: u32,
    /// Highest core count still treated as low-end.
    pub low_end_max_cores: u32,
    pub full_effects: EffectBudget,
    pub reduced_effects: EffectBudget,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 300,
            background_debounce_ms: 250,
            orientation_delay_ms: 100,
            scroll_throttle_ms: 16,
            loaded_delay_ms: 1000,
            navbar_solid_after_px: 100.0,
            reveal_threshold: 0.1,
            reveal_margin: "0px 0px -50px 0px".to_string(),
            skills_threshold: 0.3,
            mobile_max_width: 768,
            low_end_max_cores: 4,
            full_effects: EffectBudget::FULL,
            reduced_effects: EffectBudget::REDUCED,
        }
    }
}

impl PageConfig {
    /// Check every value the page would reject at construction time.
    ///
    /// # Errors
    ///
    /// The first [`TimingError`] found.
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.scroll_throttle_ms == 0 {
            return Err(TimingError::invalid(
                "scroll_throttle_ms",
                "must be greater than zero",
            ));
        }
        if !self.navbar_solid_after_px.is_finite() {
            return Err(TimingError::invalid(
                "navbar_solid_after_px",
                "must be finite",
            ));
        }
        for budget in [&self.full_effects, &self.reduced_effects] {
            if budget.raindrops > MAX_EFFECT_COUNT {
                return Err(TimingError::invalid(
                    "raindrops",
                    format!("must be at most {MAX_EFFECT_COUNT}"),
                ));
            }
            if budget.particles > MAX_EFFECT_COUNT {
                return Err(TimingError::invalid(
                    "particles",
                    format!("must be at most {MAX_EFFECT_COUNT}"),
                ));
            }
        }
        self.reveal_options()?;
        self.skills_options()?;
        Ok(())
    }

    /// Visibility options for reveal-on-scroll elements.
    ///
    /// # Errors
    ///
    /// Bad threshold or unparsable margin.
    pub fn reveal_options(&self) -> Result<VisibilityOptions, TimingError> {
        let margin: RootMargin = self.reveal_margin.parse()?;
        VisibilityOptions::new(self.reveal_threshold, margin)
    }

    /// Visibility options for the skills section.
    ///
    /// # Errors
    ///
    /// Threshold outside `[0, 1]`.
    pub fn skills_options(&self) -> Result<VisibilityOptions, TimingError> {
        VisibilityOptions::with_threshold(self.skills_threshold)
    }

    #[must_use]
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    #[must_use]
    pub fn background_debounce(&self) -> Duration {
        Duration::from_millis(self.background_debounce_ms)
    }

    #[must_use]
    pub fn orientation_delay(&self) -> Duration {
        Duration::from_millis(self.orientation_delay_ms)
    }

    #[must_use]
    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }

    #[must_use]
    pub fn loaded_delay(&self) -> Duration {
        Duration::from_millis(self.loaded_delay_ms)
    }

    /// Parse and validate a TOML config.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Toml`] on malformed input, [`ConfigError::Invalid`] on
    /// values that fail [`validate`](Self::validate).
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] on malformed input, [`ConfigError::Invalid`] on
    /// values that fail [`validate`](Self::validate).
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TomlSer`] if serialization fails.
    #[cfg(feature = "policy-config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSer)
    }
}

/// Errors from loading a [`PageConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// Malformed TOML.
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    /// Config could not be written as TOML.
    #[cfg(feature = "policy-config")]
    TomlSer(toml::ser::Error),
    /// Malformed JSON.
    #[cfg(feature = "policy-config")]
    Json(serde_json::Error),
    /// Decoded but rejected by validation.
    Invalid(TimingError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => write!(f, "invalid TOML config: {e}"),
            #[cfg(feature = "policy-config")]
            Self::TomlSer(e) => write!(f, "cannot serialize config: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => write!(f, "invalid JSON config: {e}"),
            Self::Invalid(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::TomlSer(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

impl From<TimingError> for ConfigError {
    fn from(e: TimingError) -> Self {
        Self::Invalid(e)
    }
}
