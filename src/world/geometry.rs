use std::ops::Range;

use bitflags::bitflags;
use glam::Vec2;

pub type SectorId = u32;
pub type WallId = u32;
pub type VertexId = u32;

/// Read-only sector graph consumed by the visibility core.
///
/// Every array is indexed by the matching id type. Sectors own contiguous
/// vertex and wall ranges; the `adjoin`/`mirror` pair on a wall is a
/// back-reference into another sector, never an ownership edge.
#[derive(Clone, Debug, Default)]
pub struct SectorGraph {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub walls: Vec<Wall>,
    pub sectors: Vec<Sector>,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub pos: Vec2, // (x, z) in map units
}

/*----------------------------- walls --------------------------------*/

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wall {
    pub sector: SectorId,
    pub v0: VertexId,
    pub v1: VertexId,
    /// Sector on the far side, `None` for a solid wall.
    pub adjoin: Option<SectorId>,
    /// The matching wall inside `adjoin`.
    pub mirror: Option<WallId>,
}

impl Wall {
    #[inline]
    pub fn is_portal(&self) -> bool {
        self.adjoin.is_some()
    }
}

/*---------------------------- sectors -------------------------------*/

bitflags! {
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectorFlags: u32 {
        /// Open sky above; adjoining exterior sectors share an unbounded top.
        const EXTERIOR      = 0x0001;
        /// Bottomless floor; adjoining pits share an unbounded bottom.
        const PIT           = 0x0002;
        /// Step bands on walls leading into this sector are not drawn.
        const NO_WALL_DRAW  = 0x0004;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sector {
    pub first_vertex: VertexId,
    pub vertex_count: u32,
    pub first_wall: WallId,
    pub wall_count: u32,
    pub floor_h: f32,
    pub ceil_h: f32,
    pub light: f32, // 0.0 = black, 1.0 = full bright
    pub flags: SectorFlags,
}

impl Sector {
    #[inline]
    pub fn vertex_range(&self) -> Range<VertexId> {
        self.first_vertex..self.first_vertex.saturating_add(self.vertex_count)
    }

    #[inline]
    pub fn wall_range(&self) -> Range<WallId> {
        self.first_wall..self.first_wall.saturating_add(self.wall_count)
    }
}

impl SectorGraph {
    #[inline]
    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(id as usize)
    }

    #[inline]
    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(id as usize)
    }

    /// World-space endpoints of `wall` (v0, v1).
    #[inline]
    pub fn wall_points(&self, wall: &Wall) -> (Vec2, Vec2) {
        (
            self.vertices[wall.v0 as usize].pos,
            self.vertices[wall.v1 as usize].pos,
        )
    }

    /// Walls owned by `sector`, paired with their ids.
    pub fn walls_of(&self, sector: &Sector) -> impl Iterator<Item = (WallId, &Wall)> {
        let range = sector.wall_range();
        self.walls[range.start as usize..range.end as usize]
            .iter()
            .enumerate()
            .map(move |(i, w)| (range.start + i as WallId, w))
    }

    pub fn portal_count(&self) -> usize {
        self.walls.iter().filter(|w| w.is_portal()).count()
    }
}
