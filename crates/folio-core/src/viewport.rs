#![forbid(unsafe_code)]

//! Viewport-intersection geometry.
//!
//! Computes what fraction of a target rectangle lies inside a root
//! rectangle (the viewport) after the root has been grown or shrunk by a
//! [`RootMargin`]. The semantics follow browser intersection observers:
//!
//! - the ratio is `area(target ∩ root) / area(target)`;
//! - edge-adjacent rectangles intersect with zero area;
//! - a zero-area target has ratio `1.0` when it intersects, else `0.0`;
//! - a positive margin grows the root, a negative margin shrinks it.
//!
//! All coordinates are CSS pixels with `y` growing downwards.

use std::fmt;
use std::str::FromStr;

use crate::error::TimingError;

/// Axis-aligned rectangle in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection with `other`, or `None` if they are disjoint.
    ///
    /// Touching edges yield a zero-area rectangle.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// This rectangle grown by `margin` on each side.
    #[must_use]
    pub fn expand(&self, margin: &RootMargin) -> Rect {
        Rect::new(
            self.x - margin.left,
            self.y - margin.top,
            self.width + margin.left + margin.right,
            self.height + margin.top + margin.bottom,
        )
    }
}

/// Per-side adjustment of the root rectangle, in CSS pixels.
///
/// Parses and prints the CSS shorthand (`"10px"`, `"10px 20px"`,
/// `"0px 0px -50px 0px"`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RootMargin {
    /// Added above the root; negative values shrink it.
    pub top: f64,
    /// Added to the right of the root.
    pub right: f64,
    /// Added below the root.
    pub bottom: f64,
    /// Added to the left of the root.
    pub left: f64,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin::new(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    fn validate(&self) -> Result<(), TimingError> {
        let all_finite = [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|v| v.is_finite());
        if all_finite {
            Ok(())
        } else {
            Err(TimingError::invalid("margin", "edges must be finite"))
        }
    }
}

fn parse_px(input: &str, token: &str) -> Result<f64, TimingError> {
    let number = token.strip_suffix("px").unwrap_or(token);
    let value: f64 = number
        .parse()
        .map_err(|_| TimingError::parse(input, format!("'{token}' is not a pixel length")))?;
    if !value.is_finite() {
        return Err(TimingError::parse(input, format!("'{token}' is not finite")));
    }
    Ok(value)
}

impl FromStr for RootMargin {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_whitespace()
            .map(|token| parse_px(s, token))
            .collect::<Result<Vec<_>, _>>()?;
        match values.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self::new(*vertical, *horizontal, *vertical, *horizontal)),
            [top, horizontal, bottom] => Ok(Self::new(*top, *horizontal, *bottom, *horizontal)),
            [top, right, bottom, left] => Ok(Self::new(*top, *right, *bottom, *left)),
            _ => Err(TimingError::parse(s, "expected one to four lengths")),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}px",
            self.top, self.right, self.bottom, self.left
        )
    }
}

/// Result of intersecting a target with the margin-adjusted root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Visible fraction of the target, in `[0, 1]`.
    pub ratio: f64,
    /// Whether the target touches or overlaps the root at all.
    pub is_intersecting: bool,
}

impl Intersection {
    pub const NONE: Intersection = Intersection {
        ratio: 0.0,
        is_intersecting: false,
    };

    /// Intersect `target` with `root` grown by `margin`.
    #[must_use]
    pub fn compute(target: &Rect, root: &Rect, margin: &RootMargin) -> Self {
        let Some(overlap) = target.intersection(&root.expand(margin)) else {
            return Self::NONE;
        };
        let target_area = target.area();
        let ratio = if target_area > 0.0 {
            (overlap.area() / target_area).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            ratio,
            is_intersecting: true,
        }
    }
}

/// Visible fraction of `target` inside `viewport` grown by `margin`.
#[must_use]
pub fn visible_fraction(target: &Rect, viewport: &Rect, margin: &RootMargin) -> f64 {
    Intersection::compute(target, viewport, margin).ratio
}

/// Visibility condition for one-shot dispatch: a threshold fraction plus a
/// root margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityOptions {
    threshold: f64,
    margin: RootMargin,
}

impl VisibilityOptions {
    /// Build options, rejecting thresholds outside `[0, 1]` and non-finite
    /// margins.
    pub fn new(threshold: f64, margin: RootMargin) -> Result<Self, TimingError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(TimingError::invalid(
                "threshold",
                format!("{threshold} is outside [0, 1]"),
            ));
        }
        margin.validate()?;
        Ok(Self { threshold, margin })
    }

    /// Threshold only, zero margin.
    pub fn with_threshold(threshold: f64) -> Result<Self, TimingError> {
        Self::new(threshold, RootMargin::ZERO)
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub const fn margin(&self) -> RootMargin {
        self.margin
    }

    /// Whether `intersection` satisfies the condition.
    ///
    /// A zero threshold still requires the target to intersect.
    #[must_use]
    pub fn is_met_by(&self, intersection: &Intersection) -> bool {
        intersection.is_intersecting && intersection.ratio >= self.threshold
    }

    /// Intersect `target` with `viewport` using these options' margin.
    #[must_use]
    pub fn intersect(&self, target: &Rect, viewport: &Rect) -> Intersection {
        Intersection::compute(target, viewport, &self.margin)
    }
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            margin: RootMargin::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 1000.0, 800.0);

    #[test]
    fn fully_visible_target() {
        let target = Rect::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(visible_fraction(&target, &VIEWPORT, &RootMargin::ZERO), 1.0);
    }

    #[test]
    fn half_visible_target() {
        let target = Rect::new(0.0, 700.0, 100.0, 200.0);
        assert_eq!(visible_fraction(&target, &VIEWPORT, &RootMargin::ZERO), 0.5);
    }

    #[test]
    fn offscreen_target() {
        let target = Rect::new(0.0, 900.0, 100.0, 100.0);
        let hit = Intersection::compute(&target, &VIEWPORT, &RootMargin::ZERO);
        assert_eq!(hit, Intersection::NONE);
    }

    #[test]
    fn edge_adjacent_intersects_with_zero_ratio() {
        let target = Rect::new(0.0, 800.0, 100.0, 100.0);
        let hit = Intersection::compute(&target, &VIEWPORT, &RootMargin::ZERO);
        assert!(hit.is_intersecting);
        assert_eq!(hit.ratio, 0.0);
    }

    #[test]
    fn zero_area_target_inside_is_fully_visible() {
        let target = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(visible_fraction(&target, &VIEWPORT, &RootMargin::ZERO), 1.0);
    }

    #[test]
    fn negative_bottom_margin_shrinks_root() {
        // 40px of the target sits in the bottom 50px band that the margin removes.
        let target = Rect::new(0.0, 760.0, 100.0, 40.0);
        let margin: RootMargin = "0px 0px -50px 0px".parse().unwrap();
        assert_eq!(visible_fraction(&target, &VIEWPORT, &margin), 0.0);
        assert_eq!(visible_fraction(&target, &VIEWPORT, &RootMargin::ZERO), 1.0);
    }

    #[test]
    fn positive_margin_grows_root() {
        let target = Rect::new(0.0, 820.0, 100.0, 20.0);
        let margin = RootMargin::uniform(50.0);
        assert_eq!(visible_fraction(&target, &VIEWPORT, &margin), 1.0);
    }

    #[test]
    fn margin_shorthand_arity() {
        assert_eq!("8px".parse::<RootMargin>().unwrap(), RootMargin::uniform(8.0));
        assert_eq!(
            "1px 2px".parse::<RootMargin>().unwrap(),
            RootMargin::new(1.0, 2.0, 1.0, 2.0)
        );
        assert_eq!(
            "1 2 3".parse::<RootMargin>().unwrap(),
            RootMargin::new(1.0, 2.0, 3.0, 2.0)
        );
        assert_eq!(
            "0px 0px -50px 0px".parse::<RootMargin>().unwrap(),
            RootMargin::new(0.0, 0.0, -50.0, 0.0)
        );
    }

    #[test]
    fn margin_shorthand_rejects_garbage() {
        assert!(matches!(
            "".parse::<RootMargin>(),
            Err(TimingError::Parse { .. })
        ));
        assert!(matches!(
            "1px 2px 3px 4px 5px".parse::<RootMargin>(),
            Err(TimingError::Parse { .. })
        ));
        assert!(matches!(
            "10%".parse::<RootMargin>(),
            Err(TimingError::Parse { .. })
        ));
        assert!("inf".parse::<RootMargin>().is_err());
    }

    #[test]
    fn margin_display_roundtrips() {
        let margin = RootMargin::new(0.0, 0.0, -50.0, 0.0);
        assert_eq!(margin.to_string(), "0px 0px -50px 0px");
        assert_eq!(margin.to_string().parse::<RootMargin>().unwrap(), margin);
    }

    #[test]
    fn options_reject_out_of_range_threshold() {
        assert!(VisibilityOptions::with_threshold(-0.1).is_err());
        assert!(VisibilityOptions::with_threshold(1.5).is_err());
        assert!(VisibilityOptions::with_threshold(f64::NAN).is_err());
        assert!(VisibilityOptions::with_threshold(0.0).is_ok());
        assert!(VisibilityOptions::with_threshold(1.0).is_ok());
    }

    #[test]
    fn options_reject_non_finite_margin() {
        let err = VisibilityOptions::new(0.5, RootMargin::uniform(f64::INFINITY)).unwrap_err();
        assert!(matches!(
            err,
            TimingError::InvalidArgument { name: "margin", .. }
        ));
    }

    #[test]
    fn zero_threshold_requires_intersection() {
        let opts = VisibilityOptions::default();
        assert!(!opts.is_met_by(&Intersection::NONE));
        assert!(opts.is_met_by(&Intersection {
            ratio: 0.0,
            is_intersecting: true
        }));
    }

    #[test]
    fn threshold_is_inclusive() {
        let opts = VisibilityOptions::with_threshold(0.5).unwrap();
        let target = Rect::new(0.0, 700.0, 100.0, 200.0);
        assert!(opts.is_met_by(&opts.intersect(&target, &VIEWPORT)));
    }
}
