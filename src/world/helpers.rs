use glam::Vec2;

use super::{Sector, SectorGraph, SectorId, Wall};

// ──────────────────────────────────────────────────────────────────────────
//                       SectorGraph – public helpers
// ──────────────────────────────────────────────────────────────────────────
impl SectorGraph {
    /// Even-odd test of `p` against the sector's wall loop. Works for
    /// non-convex polygons; points exactly on an edge may go either way.
    pub fn sector_contains(&self, sector: &Sector, p: Vec2) -> bool {
        let mut inside = false;
        for (_, wall) in self.walls_of(sector) {
            let (a, b) = self.wall_points(wall);
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Find the sector containing `p`.
    ///
    /// The `hint` sector (usually last frame's camera sector) and its
    /// adjoins are tried before falling back to a linear scan.
    pub fn locate_sector(&self, p: Vec2, hint: Option<SectorId>) -> Option<SectorId> {
        if let Some(hint_sec) = hint.and_then(|id| self.sector(id)) {
            if self.sector_contains(hint_sec, p) {
                return hint;
            }
            let near = self
                .walls_of(hint_sec)
                .filter_map(|(_, w)| w.adjoin)
                .find(|&id| {
                    self.sector(id)
                        .is_some_and(|sec| self.sector_contains(sec, p))
                });
            if near.is_some() {
                return near;
            }
        }

        self.sectors
            .iter()
            .position(|sec| self.sector_contains(sec, p))
            .map(|idx| idx as SectorId)
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Wall geometry helpers
// ──────────────────────────────────────────────────────────────────────────

/// Signed side of `p` relative to the directed line `a → b`.
/// Positive = left (sector interior for counter-clockwise loops).
#[inline(always)]
pub fn point_side(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

impl SectorGraph {
    /// True if `eye` sees the interior face of `wall`.
    #[inline]
    pub fn wall_faces(&self, wall: &Wall, eye: Vec2) -> bool {
        let (a, b) = self.wall_points(wall);
        point_side(a, b, eye) > 0.0
    }
}
