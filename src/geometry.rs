// =============================================================================
// GEOMETRY.RS: grid-cell and unit-prism primitives for tiles
//
// Tiles are authored on a fixed pixel grid but their images may cover several
// cells. Gameplay kinds (ground, wall, box …) occupy a prism inside one unit
// cell, expressed in cell units with y pointing up and z pointing toward the
// viewer.
// =============================================================================

use serde::Deserialize;

// =============================================================================
// CELL SPANS
// =============================================================================

/// Number of grid cells an image of `pixel_w × pixel_h` covers.
///
/// Partial cells count as whole cells and every image covers at least one
/// cell, so a 64×160 image on a 16×16 grid spans `(4, 10)` and a 1×1 image
/// spans `(1, 1)`. A zero cell size is treated as one pixel.
#[inline]
pub fn cell_span(pixel_w: u32, pixel_h: u32, cell_w: u32, cell_h: u32) -> (u32, u32) {
    let cw = cell_w.max(1);
    let ch = cell_h.max(1);
    (pixel_w.div_ceil(cw).max(1), pixel_h.div_ceil(ch).max(1))
}

// =============================================================================
// TRIPOINT / CUBOID
// =============================================================================

/// A point in cell space. Missing coordinates deserialise as `0.0`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tripoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Tripoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// An axis-aligned box given by two opposite corners.
///
/// The corners are not required to be ordered; `p1` may hold the larger
/// coordinate on any axis (the angled ground prisms do this on z).
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Cuboid {
    pub p1: Tripoint,
    pub p2: Tripoint,
}

impl Cuboid {
    pub const fn new(p1: Tripoint, p2: Tripoint) -> Self {
        Self { p1, p2 }
    }

    /// Corner with the smallest coordinate on every axis.
    pub fn min(&self) -> Tripoint {
        Tripoint::new(
            self.p1.x.min(self.p2.x),
            self.p1.y.min(self.p2.y),
            self.p1.z.min(self.p2.z),
        )
    }

    /// Corner with the largest coordinate on every axis.
    pub fn max(&self) -> Tripoint {
        Tripoint::new(
            self.p1.x.max(self.p2.x),
            self.p1.y.max(self.p2.y),
            self.p1.z.max(self.p2.z),
        )
    }

    /// Extent along each axis (always non-negative).
    pub fn size(&self) -> Tripoint {
        let (lo, hi) = (self.min(), self.max());
        Tripoint::new(hi.x - lo.x, hi.y - lo.y, hi.z - lo.z)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Tripoint) -> bool {
        let (lo, hi) = (self.min(), self.max());
        (lo.x..=hi.x).contains(&p.x) && (lo.y..=hi.y).contains(&p.y) && (lo.z..=hi.z).contains(&p.z)
    }

    /// True when the box is flat on at least one axis (a floor or a wall face).
    pub fn is_flat(&self) -> bool {
        let s = self.size();
        s.x == 0.0 || s.y == 0.0 || s.z == 0.0
    }
}
