use crate::{
    engine::{
        segment::{Aperture, Segment, SegmentKind},
        types::{Screen, Viewer},
    },
    world::{Camera, Sector, SectorFlags, SectorGraph, WallId},
};

/// Vertical opening between `front` and the sector behind a portal.
///
/// The opening is the overlap of both sectors' floor-to-ceiling spans. Two
/// exterior sectors share the sky and two pits share the void, which widens
/// the opening past the taller ceiling / deeper floor by `margin`.
/// Returns `None` when nothing can be seen through.
pub fn portal_aperture(front: &Sector, back: &Sector, margin: f32) -> Option<Aperture> {
    let both = |f: SectorFlags| front.flags.contains(f) && back.flags.contains(f);

    let top = if both(SectorFlags::EXTERIOR) {
        front.ceil_h.max(back.ceil_h) + margin
    } else {
        front.ceil_h.min(back.ceil_h)
    };
    let bottom = if both(SectorFlags::PIT) {
        front.floor_h.min(back.floor_h) - margin
    } else {
        front.floor_h.max(back.floor_h)
    };

    (top > bottom).then_some(Aperture { top, bottom })
}

/// Turn one wall into a screen [`Segment`], or `None` if it cannot be seen:
/// back-facing, behind the near plane, outside the horizontal frustum or
/// degenerate after projection.
///
/// Portals whose opening is closed come back as [`SegmentKind::Solid`].
pub fn project_wall(
    graph: &SectorGraph,
    wall_id: WallId,
    cam: &Camera,
    screen: &Screen,
    view: &Viewer,
    margin: f32,
) -> Option<Segment> {
    let wall = graph.wall(wall_id)?;
    if !graph.wall_faces(wall, cam.pos().truncate()) {
        return None;
    }

    // World endpoints → view space
    let (v0, v1) = graph.wall_points(wall);
    let mut p0 = cam.to_view(v0);
    let mut p1 = cam.to_view(v1);

    // Near-plane clip (track wall parameter t0,t1)
    let mut t0 = 0.0;
    let mut t1 = 1.0;
    if !clip_near(&mut p0, &mut p1, &mut t0, &mut t1, cam) {
        return None;
    }

    let kind = match wall.adjoin {
        Some(next) => {
            let front = graph.sector(wall.sector)?;
            let back = graph.sector(next)?;
            match portal_aperture(front, back, margin) {
                Some(aperture) => SegmentKind::Portal { next, aperture },
                None => SegmentKind::Solid,
            }
        }
        None => SegmentKind::Solid,
    };

    let wall_len = (v1 - v0).length();
    let mut seg = Segment::from_view(
        wall_id,
        wall.sector,
        kind,
        p0,
        p1,
        t0 * wall_len,
        t1 * wall_len,
        view,
    )?;

    // completely off-screen?
    seg.columns = seg.columns.intersect(&screen.columns());
    if seg.columns.is_empty() {
        return None;
    }
    Some(seg)
}

/// Clip a segment to the near plane. Returns false if completely behind.
fn clip_near(
    p0: &mut glam::Vec2,
    p1: &mut glam::Vec2,
    t0: &mut f32,
    t1: &mut f32,
    cam: &Camera,
) -> bool {
    let near = cam.near();
    if p0.y <= near && p1.y <= near {
        return false;
    }
    if p0.y < near {
        let t = (near - p0.y) / (p1.y - p0.y);
        *p0 += (*p1 - *p0) * t;
        p0.y = near;
        *t0 = t;
    }
    if p1.y < near {
        let t = (near - p1.y) / (p0.y - p1.y);
        *p1 += (*p0 - *p1) * t;
        p1.y = near;
        *t1 = 1.0 - t;
    }
    true
}
