use glam::Vec2;

use crate::{
    engine::{
        types::ColumnRange,
        window::{ColumnClip, WindowId, WindowPool},
    },
    world::{SectorId, WallId},
};

/// A projected screen row at the first and last column centre of an entry.
/// Rows are linear in screen x, so any column in between interpolates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RowSpan {
    pub l: f32,
    pub r: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceKind {
    Solid,
    Portal {
        next: SectorId,
        /// Top and bottom of the opening behind the wall.
        open_top: RowSpan,
        open_bottom: RowSpan,
        /// Upper/lower step bands should be drawn.
        steps: bool,
        /// Window the sector behind was entered with, if it was.
        child: Option<WindowId>,
    },
}

/// One resolved segment-buffer entry, everything a column rasteriser needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleWall {
    pub sector: SectorId,
    pub wall: WallId,
    pub depth: u16,
    /// Window this entry must be clipped by.
    pub window: WindowId,
    pub columns: ColumnRange,

    /* view-space endpoints of the visible piece */
    pub p_l: Vec2,
    pub p_r: Vec2,

    /* perspective helpers at the first/last column centre */
    pub inv_z: (f32, f32),
    pub u_over_z: (f32, f32),

    pub ceiling: RowSpan,
    pub floor: RowSpan,
    pub light: f32,
    pub kind: SurfaceKind,
}

impl VisibleWall {
    /// Interpolation factor of column `x` between the first and last column.
    #[inline]
    pub fn frac(&self, x: i32) -> f32 {
        let span = (self.columns.len() as f32 - 1.0).max(1.0);
        ((x - self.columns.x0) as f32 / span).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn row_at(&self, rows: &RowSpan, x: i32) -> f32 {
        let f = self.frac(x);
        rows.l + (rows.r - rows.l) * f
    }

    /// Wall-space u under column `x` (perspective-correct).
    #[inline]
    pub fn u_at(&self, x: i32) -> f32 {
        let f = self.frac(x);
        let iz = self.inv_z.0 + (self.inv_z.1 - self.inv_z.0) * f;
        let uz = self.u_over_z.0 + (self.u_over_z.1 - self.u_over_z.0) * f;
        uz / iz
    }

    #[inline]
    pub fn is_portal(&self) -> bool {
        matches!(self.kind, SurfaceKind::Portal { .. })
    }
}

/// One pushed child traversal frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortalTraversal {
    pub portal: WallId,
    pub from: SectorId,
    pub to: SectorId,
    pub range: ColumnRange,
    pub parent_window: WindowId,
    pub window: WindowId,
    pub depth: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u32,
    pub sectors: usize,
    /// Segments offered to the segment buffer.
    pub segments_projected: usize,
    pub segments_inserted: usize,
    pub segments_occluded: usize,
    pub segments_dropped: usize,
    pub walls_culled: usize,
    pub entries: usize,
    pub pushes: usize,
    pub pops: usize,
    pub max_depth: u16,
    pub portals_closed: usize,
    pub portals_revisited: usize,
    pub windows_dropped: usize,
    pub depth_truncations: usize,
    pub stack_truncations: usize,
    pub budget_truncations: usize,
    /// Some cap cut the view short this frame.
    pub truncated: bool,
}

/// Everything one frame of visibility produced. Owned by `FrameContext` and
/// overwritten by the next frame.
#[derive(Clone, Debug, Default)]
pub struct FrameOutput {
    /// Sector the camera stood in, `None` if it could not be placed.
    pub root: Option<SectorId>,
    /// Front-to-back per sector pass, left-to-right within a pass.
    pub walls: Vec<VisibleWall>,
    pub portals: Vec<PortalTraversal>,
    pub windows: WindowPool,
    pub stats: FrameStats,
}

impl FrameOutput {
    pub(crate) fn clear(&mut self) {
        self.root = None;
        self.walls.clear();
        self.portals.clear();
        self.windows.clear();
        self.stats = FrameStats::default();
    }

    /// Per-column clip bounds of `wall`, from its window.
    pub fn clip_columns<'a>(
        &'a self,
        wall: &'a VisibleWall,
    ) -> impl Iterator<Item = (i32, ColumnClip)> + 'a {
        (wall.columns.x0..wall.columns.x1).map(move |x| (x, self.windows.column(wall.window, x)))
    }

    /// Walls drawn in sector `sector`.
    pub fn walls_in(&self, sector: SectorId) -> impl Iterator<Item = &VisibleWall> + '_ {
        self.walls.iter().filter(move |w| w.sector == sector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> VisibleWall {
        VisibleWall {
            sector: 0,
            wall: 0,
            depth: 0,
            window: 0,
            columns: ColumnRange::new(10, 21),
            p_l: Vec2::new(-1.0, 2.0),
            p_r: Vec2::new(1.0, 4.0),
            inv_z: (0.5, 0.25),
            u_over_z: (0.0, 0.5),
            ceiling: RowSpan { l: 0.0, r: 10.0 },
            floor: RowSpan { l: 100.0, r: 90.0 },
            light: 1.0,
            kind: SurfaceKind::Solid,
        }
    }

    #[test]
    fn rows_interpolate_across_columns() {
        let w = wall();
        assert_eq!(w.row_at(&w.ceiling, 10), 0.0);
        assert_eq!(w.row_at(&w.ceiling, 15), 5.0);
        assert_eq!(w.row_at(&w.floor, 20), 90.0);
        // clamped outside
        assert_eq!(w.row_at(&w.floor, 30), 90.0);
    }

    #[test]
    fn u_is_perspective_correct() {
        let w = wall();
        assert_eq!(w.u_at(10), 0.0);
        assert!((w.u_at(20) - 2.0).abs() < 1e-6);
        // halfway in screen space is not halfway along the wall
        assert!((w.u_at(15) - 0.25 / 0.375).abs() < 1e-6);
    }
}
