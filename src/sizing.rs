//! Display size resolution.
//!
//! Maps an intrinsic image size and a set of optional min/max bounds to
//! the size the image is drawn at. Both edges are scaled by one factor,
//! so the aspect ratio survives up to rounding.
//!
//! The factor is chosen as follows:
//!
//! - the desired scale is 1.0 (the image's own size), capped at 1.0
//!   unless upscaling is allowed;
//! - every `min*` bound raises a lower limit, every `max*` bound lowers
//!   an upper limit;
//! - the desired scale is clamped into `[lower, upper]`, and the lower
//!   limit wins when the two conflict.

use crate::probe::ImageSize;

/// Default edge length used when the intrinsic size is unknown.
pub const DEFAULT_TARGET_EDGE: u32 = 96;

/// Smallest edge, in pixels, applied when no explicit minimum is given.
pub const MIN_EDGE_FLOOR: u32 = 32;

/// Optional bounds on the drawn size, as parsed from `<img>` attributes.
///
/// Bounds are independent; contradictory combinations such as
/// `min_edge > max_edge` are accepted and settled by [`resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeConstraints {
    /// Minimum long edge (`min` / `min-size`).
    pub min_edge: Option<u32>,
    /// Maximum long edge (`max` / `max-size`).
    pub max_edge: Option<u32>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Set by `upscale="true"`.
    pub allow_upscale: bool,
}

impl SizeConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_edge(mut self, px: u32) -> Self {
        self.min_edge = Some(px);
        self
    }

    pub fn with_max_edge(mut self, px: u32) -> Self {
        self.max_edge = Some(px);
        self
    }

    pub fn with_min_width(mut self, px: u32) -> Self {
        self.min_width = Some(px);
        self
    }

    pub fn with_min_height(mut self, px: u32) -> Self {
        self.min_height = Some(px);
        self
    }

    pub fn with_max_width(mut self, px: u32) -> Self {
        self.max_width = Some(px);
        self
    }

    pub fn with_max_height(mut self, px: u32) -> Self {
        self.max_height = Some(px);
        self
    }
}

/// Final drawn size. Both edges are at least 1.
///
/// Only [`resolve`] produces values of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedSize {
    width: u32,
    height: u32,
}

impl ResolvedSize {
    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    /// `(width, height)` as a tuple.
    pub fn dimensions(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Compute the drawn size of an image.
///
/// An unknown (or zero-sized) `intrinsic` is treated as a square of
/// `default_target_edge` pixels. When the intrinsic size is known,
/// `default_target_edge` has no further effect: the desired scale is
/// always the image's own size.
///
/// Without `constraints` only a long-edge floor of [`MIN_EDGE_FLOOR`]
/// applies. With `constraints`, the floor also applies to width and
/// height separately wherever no explicit minimum was given.
///
/// Never fails. Degenerate limits fall back to a scale of 1.0.
///
/// # Examples
///
/// ```
/// use imgcomment::probe::ImageSize;
/// use imgcomment::sizing::{resolve, SizeConstraints};
///
/// let limits = SizeConstraints::new().with_max_edge(320);
/// let size = resolve(Some(ImageSize::new(640, 480)), Some(&limits), 96, false);
/// assert_eq!(size.dimensions(), (320, 240));
/// ```
pub fn resolve(
    intrinsic: Option<ImageSize>,
    constraints: Option<&SizeConstraints>,
    default_target_edge: u32,
    allow_upscale_by_default: bool,
) -> ResolvedSize {
    let working = intrinsic
        .filter(|size| size.is_positive())
        .unwrap_or(ImageSize::new(default_target_edge, default_target_edge));

    let width = f64::from(working.width);
    let height = f64::from(working.height);
    let long_edge = width.max(height);
    let floor = f64::from(MIN_EDGE_FLOOR);

    let mut lower = 0.0_f64;
    let mut upper = if allow_upscale_by_default {
        f64::INFINITY
    } else {
        1.0
    };

    match constraints {
        Some(c) => {
            lower = lower.max(c.min_edge.map_or(floor, f64::from) / long_edge);
            lower = lower.max(c.min_width.map_or(floor, f64::from) / width);
            lower = lower.max(c.min_height.map_or(floor, f64::from) / height);

            if let Some(max) = c.max_edge {
                upper = upper.min(f64::from(max) / long_edge);
            }
            if let Some(max) = c.max_width {
                upper = upper.min(f64::from(max) / width);
            }
            if let Some(max) = c.max_height {
                upper = upper.min(f64::from(max) / height);
            }
        }
        None => lower = lower.max(floor / long_edge),
    }

    // The target edge is the image's own long edge
    let target_edge = long_edge;
    let mut desired = target_edge / long_edge;
    if !allow_upscale_by_default && desired > 1.0 {
        desired = 1.0;
    }

    let mut scale = lower.max(desired.min(upper));
    if !scale.is_finite() || scale <= 0.0 {
        scale = 1.0;
    }

    ResolvedSize {
        width: scale_edge(width, scale),
        height: scale_edge(height, scale),
    }
}

/// Scale one edge, rounding half to even and never going below 1.
fn scale_edge(edge: f64, scale: f64) -> u32 {
    // float-to-int casts saturate, NaN becomes 0
    ((edge * scale).round_ties_even() as u32).max(1)
}
