#![forbid(unsafe_code)]

//! Seeded generators for the decorative rain and particle layers.
//!
//! Every parameter is drawn independently from the supplied RNG, so a fixed
//! seed reproduces the same layer.

use std::fmt;

use rand::Rng;

/// One falling streak in the rain layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaindropSpec {
    /// Horizontal position, percent of container width.
    pub left_pct: f64,
    pub width_px: f64,
    pub height_px: f64,
    pub duration_s: f64,
    pub delay_s: f64,
    /// Horizontal drift applied as a translation.
    pub wind_px: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    pub blur_px: f64,
}

impl RaindropSpec {
    /// Inline CSS for this streak.
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "left: {}%; width: {}px; height: {}px; animation-duration: {}s; \
             animation-delay: {}s; transform: translateX({}px) rotate({}deg); \
             opacity: {}; filter: blur({}px);",
            self.left_pct,
            self.width_px,
            self.height_px,
            self.duration_s,
            self.delay_s,
            self.wind_px,
            self.rotation_deg,
            self.opacity,
            self.blur_px,
        )
    }
}

fn raindrop_left(rng: &mut impl Rng) -> f64 {
    let band: f64 = rng.random();
    if band < 0.4 {
        // Dense centre.
        15.0 + rng.random::<f64>() * 70.0
    } else if band < 0.7 {
        rng.random::<f64>() * 100.0
    } else if rng.random::<f64>() < 0.5 {
        rng.random::<f64>() * 15.0
    } else {
        85.0 + rng.random::<f64>() * 15.0
    }
}

fn raindrop_size(rng: &mut impl Rng) -> (f64, f64) {
    let class: f64 = rng.random();
    let r: f64 = rng.random();
    if class < 0.4 {
        (0.5, 30.0 + r * 20.0)
    } else if class < 0.7 {
        (1.0, 50.0 + r * 25.0)
    } else if class < 0.9 {
        (1.5, 70.0 + r * 30.0)
    } else {
        (2.0, 90.0 + r * 40.0)
    }
}

/// Draw one raindrop.
pub fn raindrop(rng: &mut impl Rng) -> RaindropSpec {
    let left_pct = raindrop_left(rng);
    let base_duration = 2.0 + rng.random::<f64>() * 6.0;
    let speed = 0.6 + rng.random::<f64>() * 0.8;
    let delay_s = rng.random::<f64>() * 12.0;
    let (width_px, height_px) = raindrop_size(rng);
    let wind_px = (rng.random::<f64>() - 0.5) * 0.4 * 150.0;
    let rotation_deg = (rng.random::<f64>() - 0.5) * 15.0;
    // Longer streaks are more visible, up to full base opacity at 60px.
    let opacity = (0.08 + rng.random::<f64>() * 0.12) * (height_px / 60.0).min(1.0);
    let blur_px = 0.2 + rng.random::<f64>() * 0.8;
    RaindropSpec {
        left_pct,
        width_px,
        height_px,
        duration_s: base_duration / speed,
        delay_s,
        wind_px,
        rotation_deg,
        opacity,
        blur_px,
    }
}

/// Draw `count` raindrops.
pub fn raindrops(rng: &mut impl Rng, count: usize) -> Vec<RaindropSpec> {
    (0..count).map(|_| raindrop(rng)).collect()
}

/// The particle palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NeonColor {
    Pink,
    Cyan,
    Violet,
    Green,
}

impl NeonColor {
    pub const ALL: [Self; 4] = [Self::Pink, Self::Cyan, Self::Violet, Self::Green];

    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Pink => "#ff0080",
            Self::Cyan => "#00ffff",
            Self::Violet => "#8a2be2",
            Self::Green => "#00ff41",
        }
    }

    /// Uniformly random palette entry.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for NeonColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

/// One floating dot in the particle layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSpec {
    pub color: NeonColor,
    pub left_pct: f64,
    pub top_pct: f64,
    pub float_duration_s: f64,
    pub opacity: f64,
}

impl ParticleSpec {
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "position: absolute; width: 2px; height: 2px; background: {}; \
             border-radius: 50%; left: {}%; top: {}%; \
             animation: particleFloat {}s linear infinite; opacity: {};",
            self.color, self.left_pct, self.top_pct, self.float_duration_s, self.opacity,
        )
    }
}

/// Draw one particle.
pub fn particle(rng: &mut impl Rng) -> ParticleSpec {
    ParticleSpec {
        color: NeonColor::random(rng),
        left_pct: rng.random::<f64>() * 100.0,
        top_pct: rng.random::<f64>() * 100.0,
        float_duration_s: 5.0 + rng.random::<f64>() * 10.0,
        opacity: 0.3 + rng.random::<f64>() * 0.7,
    }
}

/// Draw `count` particles.
pub fn particles(rng: &mut impl Rng, count: usize) -> Vec<ParticleSpec> {
    (0..count).map(|_| particle(rng)).collect()
}
