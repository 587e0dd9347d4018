//! Play field geometry
//!
//! Field-local coordinates: origin at the top-left corner, y grows downward.
//! Projectiles start below the bottom edge and arc up into the field.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Smallest extent (pixels) a usable field may have on either axis
pub const MIN_FIELD_EXTENT: f64 = 1.0;

/// The bounded area projectiles are thrown across
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Field {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when the field is large enough to spawn into
    pub fn is_usable(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.width > MIN_FIELD_EXTENT
            && self.height > MIN_FIELD_EXTENT
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Per-frame presentation state handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Centre of the projectile
    pub position: DVec2,
    /// Radians
    pub rotation: f64,
    /// 0.0 (invisible) - 1.0 (opaque)
    pub alpha: f64,
}
