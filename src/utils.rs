//! Pure numeric helpers shared by every entity.  No state lives here.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Reference frame length in milliseconds.  Per-frame tuning values
/// (velocities, friction, drift) are expressed against this frame and scaled
/// by `frames(delta_ms)` so the simulation behaves the same at any frame rate.
pub const REFERENCE_FRAME_MS: f64 = 16.0;

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start * (1.0 - t) + end * t
}

/// Uniform draw between `a` and `b`.  The bounds may come in either order,
/// which keeps tables such as "vx between -3 and -6" readable.
pub fn random_range(rng: &mut impl Rng, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi - lo <= f64::EPSILON {
        return lo;
    }
    rng.gen_range(lo..hi)
}

/// Number of reference frames covered by `delta_ms`.
pub fn frames(delta_ms: f64) -> f64 {
    delta_ms / REFERENCE_FRAME_MS
}

/// Clamp an externally supplied timestep: negative, NaN and infinite values
/// collapse to zero.
pub fn sanitize_delta(delta_ms: f64) -> f64 {
    if delta_ms.is_finite() && delta_ms > 0.0 {
        delta_ms
    } else {
        0.0
    }
}

/// Probability that a per-frame event with chance `per_frame` fires at least
/// once while `delta_ms` elapses.
pub fn chance_over(per_frame: f64, delta_ms: f64) -> f64 {
    if delta_ms <= 0.0 {
        return 0.0;
    }
    1.0 - (1.0 - per_frame).powf(frames(delta_ms))
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle used for every collision test.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Square enclosing a circle of `radius * scale` around a center point.
    pub fn around(center: Vec2, radius: f64, scale: f64) -> Self {
        let half = radius * scale;
        Self::new(center.x - half, center.y - half, half * 2.0, half * 2.0)
    }

    /// Shrink by `dx` on the left and right and `dy` on the top and bottom.
    pub fn inset(self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.x + dx,
            self.y + dy,
            self.width - dx * 2.0,
            self.height - dy * 2.0,
        )
    }

    /// Strict overlap: rectangles that only share an edge do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
