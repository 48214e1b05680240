//! On-disk records of a sector graph, encoded with **bincode 2**.
//!
//! Indices are plain `u32`; a negative `adjoin`/`mirror` marks a solid wall.

use bincode::{Decode, Encode};
use glam::vec2;

use crate::world::{Sector, SectorFlags, SectorGraph, Vertex, Wall};

use super::MapFileError;

#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct RawVertex {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct RawWall {
    pub sector: u32,
    pub v0: u32,
    pub v1: u32,
    pub adjoin: i32,
    pub mirror: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct RawSector {
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub first_wall: u32,
    pub wall_count: u32,
    pub floor_h: f32,
    pub ceil_h: f32,
    pub light: f32,
    pub flags: u32,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct RawMap {
    pub name: String,
    pub vertices: Vec<RawVertex>,
    pub sectors: Vec<RawSector>,
    pub walls: Vec<RawWall>,
}

fn to_index(id: Option<u32>) -> i32 {
    id.map_or(-1, |v| v as i32)
}

fn from_index(raw: i32) -> Option<u32> {
    (raw >= 0).then_some(raw as u32)
}

impl From<&SectorGraph> for RawMap {
    fn from(g: &SectorGraph) -> Self {
        Self {
            name: g.name.clone(),
            vertices: g
                .vertices
                .iter()
                .map(|v| RawVertex {
                    x: v.pos.x,
                    y: v.pos.y,
                })
                .collect(),
            sectors: g
                .sectors
                .iter()
                .map(|s| RawSector {
                    first_vertex: s.first_vertex,
                    vertex_count: s.vertex_count,
                    first_wall: s.first_wall,
                    wall_count: s.wall_count,
                    floor_h: s.floor_h,
                    ceil_h: s.ceil_h,
                    light: s.light,
                    flags: s.flags.bits(),
                })
                .collect(),
            walls: g
                .walls
                .iter()
                .map(|w| RawWall {
                    sector: w.sector,
                    v0: w.v0,
                    v1: w.v1,
                    adjoin: to_index(w.adjoin),
                    mirror: to_index(w.mirror),
                })
                .collect(),
        }
    }
}

impl RawMap {
    /// Convert to a validated [`SectorGraph`].
    pub fn into_graph(self) -> Result<SectorGraph, MapFileError> {
        let sectors = self
            .sectors
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let flags = SectorFlags::from_bits(s.flags).ok_or(MapFileError::BadFlags {
                    sector: i as u32,
                    bits: s.flags,
                })?;
                Ok(Sector {
                    first_vertex: s.first_vertex,
                    vertex_count: s.vertex_count,
                    first_wall: s.first_wall,
                    wall_count: s.wall_count,
                    floor_h: s.floor_h,
                    ceil_h: s.ceil_h,
                    light: s.light,
                    flags,
                })
            })
            .collect::<Result<_, MapFileError>>()?;

        let graph = SectorGraph {
            name: self.name,
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex { pos: vec2(v.x, v.y) })
                .collect(),
            walls: self
                .walls
                .iter()
                .map(|w| Wall {
                    sector: w.sector,
                    v0: w.v0,
                    v1: w.v1,
                    adjoin: from_index(w.adjoin),
                    mirror: from_index(w.mirror),
                })
                .collect(),
            sectors,
        };
        graph.validate()?;
        Ok(graph)
    }
}
