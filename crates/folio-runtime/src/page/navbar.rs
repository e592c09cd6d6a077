#![forbid(unsafe_code)]

//! Scroll-dependent navbar appearance.

use crate::reactive::Observable;

/// Navbar appearance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NavbarStyle {
    /// At or near the top of the page.
    #[default]
    Transparent,
    /// Scrolled past the threshold.
    Solid,
}

impl NavbarStyle {
    /// Style for a vertical scroll offset.
    #[must_use]
    pub fn for_offset(offset: f64, solid_after_px: f64) -> Self {
        if offset > solid_after_px {
            Self::Solid
        } else {
            Self::Transparent
        }
    }

    #[must_use]
    pub const fn background_alpha(self) -> f64 {
        match self {
            Self::Transparent => 0.9,
            Self::Solid => 0.95,
        }
    }

    #[must_use]
    pub const fn blur_px(self) -> u32 {
        match self {
            Self::Transparent => 10,
            Self::Solid => 15,
        }
    }

    /// CSS `background` value.
    #[must_use]
    pub fn background_css(self) -> String {
        format!("rgba(10, 10, 10, {})", self.background_alpha())
    }

    /// CSS `backdrop-filter` value.
    #[must_use]
    pub fn backdrop_css(self) -> String {
        format!("blur({}px)", self.blur_px())
    }
}

/// Navbar state driven by scroll position.
#[derive(Clone, Debug)]
pub struct Navbar {
    style: Observable<NavbarStyle>,
    solid_after_px: f64,
}

impl Navbar {
    #[must_use]
    pub fn new(solid_after_px: f64) -> Self {
        Self {
            style: Observable::new(NavbarStyle::default()),
            solid_after_px,
        }
    }

    /// Recompute the style for `offset`.
    pub fn update(&self, offset: f64) {
        self.style
            .set(NavbarStyle::for_offset(offset, self.solid_after_px));
    }

    #[must_use]
    pub fn style(&self) -> NavbarStyle {
        self.style.get()
    }

    #[must_use]
    pub fn observable(&self) -> &Observable<NavbarStyle> {
        &self.style
    }
}
