//! Interpolation rules for keyframe channels and ratio remapping for playback.
//!
//! [`ChannelKind`] picks the blend rule between two keys (component-wise lerp or
//! shortest-arc quaternion slerp). [`Interpolator`] remaps a playback ratio in
//! `[0, 1]` before it reaches the animation target; no interpolator means identity.

pub mod functions;

use std::fmt;

use serde::{Deserialize, Serialize};

use functions::{bezier_ease, lerp_slice, slerp_quat};

/// Blend rule used between two keys of a track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Component-wise linear interpolation (positions, scales, scalar properties).
    Linear,
    /// Spherical interpolation of (x, y, z, w) quaternions along the shortest arc.
    Spherical,
}

impl ChannelKind {
    /// Whether a value of `value_width` floats can use this rule.
    #[inline]
    pub fn supports_width(self, value_width: usize) -> bool {
        match self {
            ChannelKind::Linear => value_width >= 1,
            ChannelKind::Spherical => value_width == 4,
        }
    }

    /// Blend `a` toward `b` by `factor` into `out`. All slices share one width.
    #[inline]
    pub fn blend(self, a: &[f32], b: &[f32], factor: f32, out: &mut [f32]) {
        match self {
            ChannelKind::Linear => lerp_slice(a, b, factor, out),
            ChannelKind::Spherical => {
                let q = slerp_quat(
                    [a[0], a[1], a[2], a[3]],
                    [b[0], b[1], b[2], b[3]],
                    factor,
                );
                out[..4].copy_from_slice(&q);
            }
        }
    }
}

/// Remaps a playback ratio (0 = start state, 1 = stop state).
///
/// Implementations should map 0 to 0 and 1 to 1; anything in between is free
/// (acceleration, overshoot, bounce).
pub trait Interpolator {
    fn map_ratio(&self, ratio: f32) -> f32;
}

impl<F> Interpolator for F
where
    F: Fn(f32) -> f32,
{
    #[inline]
    fn map_ratio(&self, ratio: f32) -> f32 {
        self(ratio)
    }
}

/// Identity mapping.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Linear;

impl Interpolator for Linear {
    #[inline]
    fn map_ratio(&self, ratio: f32) -> f32 {
        ratio
    }
}

/// Quadratic acceleration from rest.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EaseIn;

impl Interpolator for EaseIn {
    #[inline]
    fn map_ratio(&self, ratio: f32) -> f32 {
        ratio * ratio
    }
}

/// Quadratic deceleration to rest.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EaseOut;

impl Interpolator for EaseOut {
    #[inline]
    fn map_ratio(&self, ratio: f32) -> f32 {
        let inv = 1.0 - ratio;
        1.0 - inv * inv
    }
}

/// Accelerate then decelerate (smoothstep).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EaseInOut;

impl Interpolator for EaseInOut {
    #[inline]
    fn map_ratio(&self, ratio: f32) -> f32 {
        ratio * ratio * (3.0 - 2.0 * ratio)
    }
}

/// CSS-style cubic-bezier timing curve through (0,0), (x1,y1), (x2,y2), (1,1).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    pub const EASE_IN_OUT: CubicBezier = CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };

    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl Interpolator for CubicBezier {
    #[inline]
    fn map_ratio(&self, ratio: f32) -> f32 {
        bezier_ease(ratio, self.x1, self.y1, self.x2, self.y2)
    }
}

/// Boxed interpolator slot held by controllers; prints as an opaque marker.
pub(crate) struct BoxedInterpolator(pub(crate) Box<dyn Interpolator>);

impl fmt::Debug for BoxedInterpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interpolator(..)")
    }
}
