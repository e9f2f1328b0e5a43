//! The fixed world regions.
//!
//! The arena contains five axis-aligned boxes.  A position inside one of
//! them maps to that region; a position inside none is "in transit" and maps
//! to no region at all.  A secondary, coarser set of boxes provides a
//! best-effort region for in-transit positions — used only when the
//! predictor needs a current-region proxy.

use llt_core::{Box3, RegionId, Vec3};

/// Maps world positions to region identifiers.
#[derive(Clone, Debug)]
pub struct RegionMap {
    boxes: [Box3; RegionId::COUNT],
}

impl Default for RegionMap {
    /// The experiment's standard five-region arena.
    fn default() -> Self {
        Self {
            boxes: [
                Box3::new(0.0, 150.0, 0.0, 150.0, 0.0, 100.0),
                Box3::new(50.0, 150.0, 200.0, 350.0, 0.0, 100.0),
                Box3::new(200.0, 300.0, 0.0, 200.0, 0.0, 100.0),
                Box3::new(220.0, 500.0, 300.0, 450.0, 0.0, 100.0),
                Box3::new(350.0, 500.0, 0.0, 250.0, 0.0, 100.0),
            ],
        }
    }
}

impl RegionMap {
    pub fn new(boxes: [Box3; RegionId::COUNT]) -> Self {
        Self { boxes }
    }

    /// The region containing `p`, or `None` when `p` is in transit.
    ///
    /// Boxes are tested in fixed ascending order, so a position inside an
    /// overlap belongs to the lower-numbered region.
    pub fn position_to_region(&self, p: Vec3) -> Option<RegionId> {
        self.boxes
            .iter()
            .position(|b| b.contains(p))
            .map(|i| RegionId(i as u8))
    }

    /// Best-effort region for an in-transit position.
    ///
    /// Uses a coarser partition that pads each region towards its neighbors,
    /// so a node walking between boxes still resolves to the area it is
    /// moving through.  Returns `None` for positions outside even the padded
    /// partition.
    pub fn nearest_region(&self, p: Vec3) -> Option<RegionId> {
        if p.z > 100.0 {
            return None;
        }
        if p.x <= 175.0 && p.y <= 175.0 {
            Some(RegionId(0))
        } else if p.x <= 175.0 && p.y <= 500.0 {
            Some(RegionId(1))
        } else if p.x > 175.0 && p.x <= 325.0 && p.y <= 250.0 {
            Some(RegionId(2))
        } else if p.x > 180.0 && p.x <= 550.0 && p.y > 250.0 && p.y <= 500.0 {
            Some(RegionId(3))
        } else if p.x >= 325.0 && p.x <= 550.0 && p.y > 250.0 && p.y <= 275.0 {
            Some(RegionId(4))
        } else {
            None
        }
    }

    /// Either mapping: the containing region, falling back to the padded one.
    pub fn resolve(&self, p: Vec3) -> Option<RegionId> {
        self.position_to_region(p).or_else(|| self.nearest_region(p))
    }

    /// Centroid of `region` — the point walks aim for.
    pub fn center(&self, region: RegionId) -> Vec3 {
        self.boxes[region.index()].center()
    }
}
