//! World-space geometry: points and axis-aligned boxes.
//!
//! The world is a flat few-hundred-metre arena, so plain Euclidean `f64`
//! coordinates are exact enough for every consumer (travel-leg lengths,
//! region containment, radio range checks).

/// A position or velocity in world space, metres / metres-per-second.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ORIGIN: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance to `other`, metres.
    pub fn distance(self, other: Vec3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Unit-ish direction towards `target` scaled by `speed` (m/s).
    ///
    /// Returns `ORIGIN` when already at the target (distance 0).
    pub fn velocity_towards(self, target: Vec3, speed: f64) -> Vec3 {
        let d = self.distance(target);
        if d == 0.0 {
            return Vec3::ORIGIN;
        }
        let k = speed / d;
        Vec3::new(
            k * (target.x - self.x),
            k * (target.y - self.y),
            k * (target.z - self.z),
        )
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

// ── Box3 ──────────────────────────────────────────────────────────────────────

/// An axis-aligned box with inclusive bounds on all three axes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Box3 {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl Box3 {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, z_min: f64, z_max: f64) -> Self {
        Self { x_min, x_max, y_min, y_max, z_min, z_max }
    }

    /// Inclusive containment test on all axes.
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.x_min
            && p.x <= self.x_max
            && p.y >= self.y_min
            && p.y <= self.y_max
            && p.z >= self.z_min
            && p.z <= self.z_max
    }

    /// Centroid of the box.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
            (self.z_min + self.z_max) / 2.0,
        )
    }
}
