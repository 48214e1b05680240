//! Candidate visible intervals and the geometric in-front predicate.
//!
//! A [`Segment`] is one wall after back-face culling, near-plane clipping and
//! projection. It remembers its view-space endpoints (camera at the origin,
//! `y` = depth) ordered left → right on screen, so any screen x inside its
//! span can be mapped back to an exact point on the wall.

use glam::Vec2;

use crate::{
    engine::types::{ColumnRange, Viewer},
    world::{SectorId, WallId},
};

/// |side distance| below which an endpoint counts as lying on a line.
pub const SIDE_EPSILON: f32 = 1e-4;

/// Tolerance on the segment parameter when deciding that two segments cross.
const CROSS_EPSILON: f32 = 1e-5;

/// World-space vertical opening behind a portal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aperture {
    pub top: f32,
    pub bottom: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentKind {
    /// Opaque: solid wall or a portal whose opening is closed.
    Solid,
    /// Portal into `next` with a non-empty world opening.
    Portal { next: SectorId, aperture: Aperture },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub wall: WallId,
    pub sector: SectorId,
    pub kind: SegmentKind,

    /* view space, near-clipped, left → right on screen */
    pub p_l: Vec2,
    pub p_r: Vec2,
    /// Unit normal pointing to the camera side of the supporting line.
    pub normal: Vec2,

    /* screen-space extent */
    pub sx_l: f32,
    pub sx_r: f32,
    pub columns: ColumnRange,

    /* distance along the wall from its first vertex, in map units */
    pub u_l: f32,
    pub u_r: f32,
}

impl Segment {
    /// Build a segment from view-space endpoints that are already in front of
    /// the near plane. `u_a`/`u_b` are the wall-space distances of `a`/`b`.
    ///
    /// Returns `None` for degenerate input: a zero-length wall, one seen
    /// exactly edge-on, or a projection that covers no column centre.
    #[allow(clippy::too_many_arguments)]
    pub fn from_view(
        wall: WallId,
        sector: SectorId,
        kind: SegmentKind,
        a: Vec2,
        b: Vec2,
        u_a: f32,
        u_b: f32,
        view: &Viewer,
    ) -> Option<Segment> {
        if a.y <= 0.0 || b.y <= 0.0 {
            return None;
        }
        let sx_a = view.project_x(a);
        let sx_b = view.project_x(b);

        let (p_l, p_r, sx_l, sx_r, u_l, u_r) = if sx_a <= sx_b {
            (a, b, sx_a, sx_b, u_a, u_b)
        } else {
            (b, a, sx_b, sx_a, u_b, u_a)
        };

        if !(sx_r - sx_l).is_finite() || sx_r - sx_l <= f32::EPSILON {
            return None;
        }

        let mut normal = (p_r - p_l).perp().try_normalize()?;
        if normal.dot(-p_l) < 0.0 {
            normal = -normal;
        }

        let columns = ColumnRange::new(first_column(sx_l), first_column(sx_r));
        if columns.is_empty() {
            return None;
        }

        Some(Segment {
            wall,
            sector,
            kind,
            p_l,
            p_r,
            normal,
            sx_l,
            sx_r,
            columns,
            u_l,
            u_r,
        })
    }

    #[inline]
    pub fn is_portal(&self) -> bool {
        matches!(self.kind, SegmentKind::Portal { .. })
    }

    /// Screen-space interpolation factor of `sx`, clamped to the span.
    #[inline]
    fn frac(&self, sx: f32) -> f32 {
        ((sx - self.sx_l) / (self.sx_r - self.sx_l)).clamp(0.0, 1.0)
    }

    /// 1/depth of the wall under screen x (linear in screen space).
    #[inline]
    pub fn inv_z_at(&self, sx: f32) -> f32 {
        let f = self.frac(sx);
        (1.0 / self.p_l.y) * (1.0 - f) + (1.0 / self.p_r.y) * f
    }

    /// Wall-space u divided by depth under screen x.
    #[inline]
    pub fn u_over_z_at(&self, sx: f32) -> f32 {
        let f = self.frac(sx);
        (self.u_l / self.p_l.y) * (1.0 - f) + (self.u_r / self.p_r.y) * f
    }

    /// Exact view-space point on the wall under screen x.
    pub fn point_at(&self, sx: f32) -> Vec2 {
        let f = self.frac(sx);
        let inv_z = self.inv_z_at(sx);
        let t = f * (1.0 / self.p_r.y) / inv_z;
        self.p_l.lerp(self.p_r, t)
    }

    /// Screen x of the point `p_l + t (p_r - p_l)`.
    fn screen_x_of_param(&self, t: f32) -> f32 {
        let p = self.p_l.lerp(self.p_r, t);
        let slope_l = self.p_l.x / self.p_l.y;
        let slope_r = self.p_r.x / self.p_r.y;
        let denom = slope_r - slope_l;
        if denom.abs() <= f32::EPSILON {
            return self.sx_l;
        }
        let f = (p.x / p.y - slope_l) / denom;
        self.sx_l + f * (self.sx_r - self.sx_l)
    }

    /// Signed distance of `p` from this segment's supporting line, snapped to
    /// zero inside `SIDE_EPSILON`. Positive = camera side.
    #[inline]
    fn side(&self, p: Vec2) -> f32 {
        let d = self.normal.dot(p - self.p_l);
        if d.abs() < SIDE_EPSILON { 0.0 } else { d }
    }
}

/// First column whose centre lies at or right of screen x `sx`.
#[inline]
pub fn first_column(sx: f32) -> i32 {
    let c = (sx - 0.5).ceil();
    c.clamp(i32::MIN as f32 / 2.0, i32::MAX as f32 / 2.0) as i32
}

/// Where `other`'s endpoints fall relative to `line`.
#[derive(Clone, Copy, PartialEq, Debug)]
enum Placement {
    CameraSide,
    FarSide,
    Straddles,
    OnLine,
}

fn placement(line: &Segment, other: &Segment) -> Placement {
    let s0 = line.side(other.p_l);
    let s1 = line.side(other.p_r);
    if s0 == 0.0 && s1 == 0.0 {
        Placement::OnLine
    } else if s0 >= 0.0 && s1 >= 0.0 {
        Placement::CameraSide
    } else if s0 <= 0.0 && s1 <= 0.0 {
        Placement::FarSide
    } else {
        Placement::Straddles
    }
}

/// True if `a` is nearer to the camera than `b` across `overlap`.
///
/// Plane tests first: a segment lying wholly on the camera side of the
/// other's supporting line is in front. When neither test is conclusive
/// (crossing, collinear or numerically touching segments) the depths under
/// the overlap's middle column decide, and an exact tie goes to `b`.
pub fn in_front(a: &Segment, b: &Segment, overlap: ColumnRange) -> bool {
    match placement(a, b) {
        Placement::CameraSide => return false,
        Placement::FarSide => return true,
        Placement::Straddles | Placement::OnLine => {}
    }
    match placement(b, a) {
        Placement::CameraSide => return true,
        Placement::FarSide => return false,
        Placement::Straddles | Placement::OnLine => {}
    }

    let mid = (overlap.x0 + overlap.x1) as f32 * 0.5;
    a.inv_z_at(mid) > b.inv_z_at(mid)
}

/// Column at which `a` and `b` cross, if that happens strictly inside
/// `within`. Splitting there lets each side be resolved on its own.
pub fn crossing_column(a: &Segment, b: &Segment, within: ColumnRange) -> Option<i32> {
    let da = a.p_r - a.p_l;
    let db = b.p_r - b.p_l;
    let denom = da.perp_dot(db);
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let w = b.p_l - a.p_l;
    let t = w.perp_dot(db) / denom;
    let s = w.perp_dot(da) / denom;
    let range = -CROSS_EPSILON..=1.0 + CROSS_EPSILON;
    if !range.contains(&t) || !range.contains(&s) {
        return None;
    }
    let col = first_column(a.screen_x_of_param(t.clamp(0.0, 1.0)));
    (within.x0 < col && col < within.x1).then_some(col)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::vec2;

    pub(crate) fn viewer() -> Viewer {
        Viewer {
            focal: 100.0,
            eye_z: 4.0,
            half_w: 100.0,
            half_h: 50.0,
        }
    }

    pub(crate) fn seg(wall: WallId, a: Vec2, b: Vec2) -> Segment {
        let len = (b - a).length();
        Segment::from_view(wall, 0, SegmentKind::Solid, a, b, 0.0, len, &viewer()).unwrap()
    }

    #[test]
    fn endpoints_are_ordered_left_to_right() {
        let s = seg(1, vec2(5.0, 10.0), vec2(-5.0, 10.0));
        assert!(s.sx_l < s.sx_r);
        assert_eq!(s.p_l, vec2(-5.0, 10.0));
        assert_eq!(s.columns, ColumnRange::new(50, 150));
        // normal faces the camera at the origin
        assert!(s.normal.dot(-s.p_l) > 0.0);
    }

    #[test]
    fn degenerate_projection_is_rejected() {
        let v = viewer();
        // seen edge-on: both ends on the same screen column
        assert!(
            Segment::from_view(0, 0, SegmentKind::Solid, vec2(1.0, 10.0), vec2(2.0, 20.0), 0.0, 1.0, &v)
                .is_none()
        );
        // behind the camera
        assert!(
            Segment::from_view(0, 0, SegmentKind::Solid, vec2(1.0, -1.0), vec2(2.0, 5.0), 0.0, 1.0, &v)
                .is_none()
        );
    }

    #[test]
    fn point_at_recovers_exact_positions() {
        // oblique wall: depth changes across the span
        let s = seg(1, vec2(-5.0, 5.0), vec2(5.0, 15.0));
        let mid = s.point_at(100.0); // screen centre → lateral 0
        assert!(mid.x.abs() < 1e-4);
        assert!((mid.y - 10.0).abs() < 1e-3);
        assert!((s.point_at(s.sx_l) - s.p_l).length() < 1e-4);
        assert!((s.point_at(s.sx_r) - s.p_r).length() < 1e-4);
        assert!((1.0 / s.inv_z_at(100.0) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn nearer_parallel_wall_wins_both_ways() {
        let near = seg(1, vec2(-2.0, 5.0), vec2(2.0, 5.0));
        let far = seg(2, vec2(-10.0, 20.0), vec2(10.0, 20.0));
        let overlap = near.columns.intersect(&far.columns);
        assert!(in_front(&near, &far, overlap));
        assert!(!in_front(&far, &near, overlap));
    }

    #[test]
    fn supporting_line_orders_receding_wall() {
        // `a` recedes past `b`'s depth, but `b` lies wholly behind `a`'s line
        let a = seg(1, vec2(-1.0, 2.0), vec2(6.0, 30.0));
        let b = seg(2, vec2(-6.0, 12.0), vec2(-3.0, 12.0));
        let overlap = a.columns.intersect(&b.columns);
        assert!(!overlap.is_empty());
        assert!(in_front(&a, &b, overlap));
        assert!(!in_front(&b, &a, overlap));
    }

    #[test]
    fn collinear_tie_keeps_the_existing_segment() {
        let a = seg(1, vec2(-4.0, 10.0), vec2(2.0, 10.0));
        let b = seg(2, vec2(-2.0, 10.0), vec2(4.0, 10.0));
        let overlap = a.columns.intersect(&b.columns);
        assert!(!in_front(&a, &b, overlap));
        assert!(!in_front(&b, &a, overlap));
    }

    #[test]
    fn crossing_segments_split_at_intersection() {
        // an X centred straight ahead at depth 10
        let a = seg(1, vec2(-5.0, 5.0), vec2(5.0, 15.0));
        let b = seg(2, vec2(-5.0, 15.0), vec2(5.0, 5.0));
        let overlap = a.columns.intersect(&b.columns);
        assert_eq!(crossing_column(&a, &b, overlap), Some(100));
        // left of the crossing `a` is nearer, right of it `b`
        assert!(in_front(&a, &b, ColumnRange::new(overlap.x0, 100)));
        assert!(in_front(&b, &a, ColumnRange::new(100, overlap.x1)));
    }

    #[test]
    fn disjoint_lines_do_not_cross() {
        let a = seg(1, vec2(-2.0, 5.0), vec2(2.0, 5.0));
        let b = seg(2, vec2(-10.0, 20.0), vec2(10.0, 20.0));
        assert_eq!(crossing_column(&a, &b, b.columns), None);
    }
}
