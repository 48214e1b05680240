//! Small hand-built maps used by the tools and the test-suite.
//!
//! All rooms are 10×10 map units with the floor at 0 and the ceiling at 8
//! unless noted otherwise; sector 0 always contains the point (5, 5).

use glam::{Vec2, vec2};

use super::{SectorFlags, SectorGraph, SectorGraphBuilder};

pub const NAMES: [&str; 6] = ["room", "two_rooms", "closed_step", "loop", "occluder", "sky"];

pub fn by_name(name: &str) -> Option<SectorGraph> {
    Some(match name {
        "room" => single_room(),
        "two_rooms" => two_rooms(),
        "closed_step" => closed_step(),
        "loop" => loop_rooms(),
        "occluder" => half_occluder(),
        "sky" => sky_court(),
        _ => return None,
    })
}

fn square(x: f32) -> [Vec2; 4] {
    [
        vec2(x, 0.0),
        vec2(x + 10.0, 0.0),
        vec2(x + 10.0, 10.0),
        vec2(x, 10.0),
    ]
}

fn finish(b: SectorGraphBuilder) -> SectorGraph {
    b.build().expect("built-in demo map is valid")
}

/// One closed room, no portals.
pub fn single_room() -> SectorGraph {
    let mut b = SectorGraphBuilder::new("room");
    b.add_sector(&square(0.0), 0.0, 8.0);
    finish(b)
}

/// Two rooms side by side, joined through the whole east wall of room 0.
pub fn two_rooms() -> SectorGraph {
    let mut b = SectorGraphBuilder::new("two_rooms");
    b.add_sector(&square(0.0), 0.0, 8.0);
    b.add_sector(&square(10.0), 0.0, 8.0);
    b.connect_shared_walls();
    finish(b)
}

/// Like [`two_rooms`] but the far room sits entirely below room 0's floor,
/// so the portal has no vertical opening.
pub fn closed_step() -> SectorGraph {
    let mut b = SectorGraphBuilder::new("closed_step");
    b.add_sector(&square(0.0), 0.0, 8.0);
    b.add_sector(&square(10.0), -10.0, -2.0);
    b.connect_shared_walls();
    finish(b)
}

/// Three rooms in a row; the east wall of the last one adjoins the west wall
/// of the first, so looking east loops back forever.
pub fn loop_rooms() -> SectorGraph {
    let mut b = SectorGraphBuilder::new("loop");
    let a = b.add_sector(&square(0.0), 0.0, 8.0);
    b.add_sector(&square(10.0), 0.0, 8.0);
    let c = b.add_sector(&square(20.0), 0.0, 8.0);
    b.connect_shared_walls();
    b.link(c, 1, a, 3).expect("loop walls exist");
    finish(b)
}

/// Room 0 has an east side split at z = 5: the lower half is solid, the upper
/// half opens into room 1, whose far wall is therefore partly hidden.
pub fn half_occluder() -> SectorGraph {
    let mut b = SectorGraphBuilder::new("occluder");
    b.add_sector(
        &[
            vec2(0.0, 0.0),
            vec2(10.0, 0.0),
            vec2(10.0, 5.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
        ],
        0.0,
        8.0,
    );
    b.add_sector(
        &[
            vec2(10.0, 5.0),
            vec2(20.0, 5.0),
            vec2(20.0, 10.0),
            vec2(10.0, 10.0),
        ],
        0.0,
        8.0,
    );
    b.connect_shared_walls();
    finish(b)
}

/// An indoor room opening onto an exterior court that opens onto a second,
/// taller exterior court. The two courts share the sky.
pub fn sky_court() -> SectorGraph {
    let mut b = SectorGraphBuilder::new("sky");
    let room = b.add_sector(&square(0.0), 0.0, 8.0);
    let court = b.add_sector(&square(10.0), 0.0, 12.0);
    let far = b.add_sector(&square(20.0), 1.0, 20.0);
    b.connect_shared_walls();
    b.set_flags(court, SectorFlags::EXTERIOR)
        .set_flags(far, SectorFlags::EXTERIOR)
        .set_light(room, 0.6)
        .set_light(court, 0.9);
    finish(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_demo_builds() {
        for name in NAMES {
            let g = by_name(name).unwrap();
            assert!(g.validate().is_ok(), "{name}");
            assert_eq!(g.locate_sector(vec2(5.0, 5.0), None), Some(0), "{name}");
        }
        assert!(by_name("nope").is_none());
    }

    #[test]
    fn loop_closes_back_on_the_first_room() {
        let g = loop_rooms();
        assert_eq!(g.portal_count(), 6);
        let c_east = &g.walls[g.sectors[2].first_wall as usize + 1];
        assert_eq!(c_east.adjoin, Some(0));
    }
}
