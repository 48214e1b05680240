//! Programmatic construction and validation of a [`SectorGraph`].
//!
//! Sectors are added as counter-clockwise polygons; one wall is generated per
//! polygon edge (`points[i] → points[i + 1]`). Portals are then formed either
//! explicitly with [`SectorGraphBuilder::link`] (needed for non-Euclidean
//! loops) or automatically for walls that share both endpoints.

use glam::Vec2;
use thiserror::Error;

use super::{Sector, SectorFlags, SectorGraph, SectorId, Vertex, VertexId, Wall, WallId};

/// Squared distance under which two vertices count as coincident.
const WELD_EPSILON_SQ: f32 = 1e-6;

/// Structural problems found while validating a sector graph.
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("graph has no sectors")]
    Empty,

    #[error("sector {sector} has {count} vertices, need at least 3")]
    TooFewVertices { sector: SectorId, count: u32 },

    #[error("sector {sector} vertex/wall range exceeds graph arrays")]
    SectorRangeOutOfBounds { sector: SectorId },

    #[error("wall {wall} belongs to sector {claimed} but lies in sector {owner}'s range")]
    WallOwnerMismatch {
        wall: WallId,
        claimed: SectorId,
        owner: SectorId,
    },

    #[error("wall {wall} references vertex {vertex} outside sector {sector}")]
    VertexOutsideSector {
        wall: WallId,
        vertex: VertexId,
        sector: SectorId,
    },

    #[error("wall {wall} adjoins missing sector {adjoin}")]
    AdjoinOutOfRange { wall: WallId, adjoin: SectorId },

    #[error("wall {wall} has mirror {mirror} but no adjoin")]
    MirrorWithoutAdjoin { wall: WallId, mirror: WallId },

    #[error("wall {wall} mirror {mirror} does not point back")]
    MirrorMismatch { wall: WallId, mirror: WallId },

    #[error("sector {sector} floor {floor} above ceiling {ceil}")]
    InvertedHeights { sector: SectorId, floor: f32, ceil: f32 },

    #[error("sector {0} has a non-finite height")]
    NonFiniteHeight(SectorId),

    #[error("sector {sector} has no wall #{local}")]
    NoSuchWall { sector: SectorId, local: u32 },
}

#[derive(Default)]
pub struct SectorGraphBuilder {
    graph: SectorGraph,
}

impl SectorGraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph: SectorGraph {
                name: name.into(),
                ..SectorGraph::default()
            },
        }
    }

    /// Append a sector whose outline is the counter-clockwise loop `points`.
    pub fn add_sector(&mut self, points: &[Vec2], floor_h: f32, ceil_h: f32) -> SectorId {
        let g = &mut self.graph;
        let id = g.sectors.len() as SectorId;
        let first_vertex = g.vertices.len() as VertexId;
        let first_wall = g.walls.len() as WallId;
        let n = points.len() as u32;

        g.vertices.extend(points.iter().map(|&pos| Vertex { pos }));
        for i in 0..n {
            g.walls.push(Wall {
                sector: id,
                v0: first_vertex + i,
                v1: first_vertex + (i + 1) % n.max(1),
                adjoin: None,
                mirror: None,
            });
        }
        g.sectors.push(Sector {
            first_vertex,
            vertex_count: n,
            first_wall,
            wall_count: n,
            floor_h,
            ceil_h,
            light: 1.0,
            flags: SectorFlags::empty(),
        });
        id
    }

    pub fn set_flags(&mut self, sector: SectorId, flags: SectorFlags) -> &mut Self {
        if let Some(sec) = self.graph.sectors.get_mut(sector as usize) {
            sec.flags = flags;
        }
        self
    }

    pub fn set_light(&mut self, sector: SectorId, light: f32) -> &mut Self {
        if let Some(sec) = self.graph.sectors.get_mut(sector as usize) {
            sec.light = light.clamp(0.0, 1.0);
        }
        self
    }

    /// Global id of the `local`-th wall of `sector`.
    pub fn wall_id(&self, sector: SectorId, local: u32) -> Result<WallId, GraphError> {
        self.graph
            .sectors
            .get(sector as usize)
            .filter(|sec| local < sec.wall_count)
            .map(|sec| sec.first_wall + local)
            .ok_or(GraphError::NoSuchWall { sector, local })
    }

    /// Join wall `local_a` of `a` and wall `local_b` of `b` into a portal pair.
    ///
    /// The walls do not have to coincide, which is how looping (mirror)
    /// layouts are expressed.
    pub fn link(
        &mut self,
        a: SectorId,
        local_a: u32,
        b: SectorId,
        local_b: u32,
    ) -> Result<&mut Self, GraphError> {
        let wa = self.wall_id(a, local_a)?;
        let wb = self.wall_id(b, local_b)?;
        let walls = &mut self.graph.walls;
        walls[wa as usize].adjoin = Some(b);
        walls[wa as usize].mirror = Some(wb);
        walls[wb as usize].adjoin = Some(a);
        walls[wb as usize].mirror = Some(wa);
        Ok(self)
    }

    /// Link every pair of walls in different sectors that run between the
    /// same two points in opposite directions. Returns the number of pairs.
    pub fn connect_shared_walls(&mut self) -> usize {
        let g = &mut self.graph;
        let mut linked = 0;
        for i in 0..g.walls.len() {
            if g.walls[i].adjoin.is_some() {
                continue;
            }
            let (a0, a1) = (
                g.vertices[g.walls[i].v0 as usize].pos,
                g.vertices[g.walls[i].v1 as usize].pos,
            );
            for j in (i + 1)..g.walls.len() {
                let other = g.walls[j];
                if other.adjoin.is_some() || other.sector == g.walls[i].sector {
                    continue;
                }
                let (b0, b1) = (
                    g.vertices[other.v0 as usize].pos,
                    g.vertices[other.v1 as usize].pos,
                );
                if a0.distance_squared(b1) < WELD_EPSILON_SQ
                    && a1.distance_squared(b0) < WELD_EPSILON_SQ
                {
                    let sector_i = g.walls[i].sector;
                    g.walls[i].adjoin = Some(other.sector);
                    g.walls[i].mirror = Some(j as WallId);
                    g.walls[j].adjoin = Some(sector_i);
                    g.walls[j].mirror = Some(i as WallId);
                    linked += 1;
                    break;
                }
            }
        }
        linked
    }

    pub fn build(self) -> Result<SectorGraph, GraphError> {
        self.graph.validate()?;
        Ok(self.graph)
    }
}

/*====================================================================*/
/*                            Validation                               */
/*====================================================================*/

impl SectorGraph {
    /// Check every structural invariant the traversal relies on.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.sectors.is_empty() {
            return Err(GraphError::Empty);
        }

        for (sid, sec) in self.sectors.iter().enumerate() {
            let sector = sid as SectorId;
            if sec.vertex_count < 3 {
                return Err(GraphError::TooFewVertices {
                    sector,
                    count: sec.vertex_count,
                });
            }
            let in_bounds = |first: u32, count: u32, len: usize| {
                first.checked_add(count).is_some_and(|end| end as usize <= len)
            };
            if !in_bounds(sec.first_vertex, sec.vertex_count, self.vertices.len())
                || !in_bounds(sec.first_wall, sec.wall_count, self.walls.len())
            {
                return Err(GraphError::SectorRangeOutOfBounds { sector });
            }
            let vr = sec.vertex_range();
            let wr = sec.wall_range();
            if !sec.floor_h.is_finite() || !sec.ceil_h.is_finite() {
                return Err(GraphError::NonFiniteHeight(sector));
            }
            if sec.floor_h > sec.ceil_h {
                return Err(GraphError::InvertedHeights {
                    sector,
                    floor: sec.floor_h,
                    ceil: sec.ceil_h,
                });
            }

            for wall_id in wr {
                let wall = &self.walls[wall_id as usize];
                if wall.sector != sector {
                    return Err(GraphError::WallOwnerMismatch {
                        wall: wall_id,
                        claimed: wall.sector,
                        owner: sector,
                    });
                }
                for v in [wall.v0, wall.v1] {
                    if !vr.contains(&v) {
                        return Err(GraphError::VertexOutsideSector {
                            wall: wall_id,
                            vertex: v,
                            sector,
                        });
                    }
                }
                self.validate_portal(wall_id, wall)?;
            }
        }
        Ok(())
    }

    fn validate_portal(&self, wall_id: WallId, wall: &Wall) -> Result<(), GraphError> {
        match (wall.adjoin, wall.mirror) {
            (None, None) => Ok(()),
            (None, Some(mirror)) => Err(GraphError::MirrorWithoutAdjoin {
                wall: wall_id,
                mirror,
            }),
            (Some(adjoin), _) if adjoin as usize >= self.sectors.len() => {
                Err(GraphError::AdjoinOutOfRange {
                    wall: wall_id,
                    adjoin,
                })
            }
            (Some(_), None) => Ok(()),
            (Some(adjoin), Some(mirror)) => {
                let back = self.walls.get(mirror as usize);
                let ok = back.is_some_and(|m| {
                    m.sector == adjoin && m.adjoin == Some(wall.sector) && m.mirror == Some(wall_id)
                });
                if ok {
                    Ok(())
                } else {
                    Err(GraphError::MirrorMismatch {
                        wall: wall_id,
                        mirror,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    fn square(x: f32) -> [Vec2; 4] {
        [
            vec2(x, 0.0),
            vec2(x + 10.0, 0.0),
            vec2(x + 10.0, 10.0),
            vec2(x, 10.0),
        ]
    }

    #[test]
    fn shared_edges_become_portal_pairs() {
        let mut b = SectorGraphBuilder::new("pair");
        let a = b.add_sector(&square(0.0), 0.0, 8.0);
        let c = b.add_sector(&square(10.0), 0.0, 8.0);
        assert_eq!(b.connect_shared_walls(), 1);
        let g = b.build().unwrap();

        let east = &g.walls[g.sectors[a as usize].first_wall as usize + 1];
        assert_eq!(east.adjoin, Some(c));
        let mirror = &g.walls[east.mirror.unwrap() as usize];
        assert_eq!(mirror.adjoin, Some(a));
        assert_eq!(g.portal_count(), 2);
    }

    #[test]
    fn empty_graph_is_rejected() {
        assert_eq!(SectorGraphBuilder::new("none").build().unwrap_err(), GraphError::Empty);
    }

    #[test]
    fn inverted_heights_are_rejected() {
        let mut b = SectorGraphBuilder::new("bad");
        b.add_sector(&square(0.0), 8.0, 0.0);
        assert!(matches!(
            b.build(),
            Err(GraphError::InvertedHeights { sector: 0, .. })
        ));
    }

    #[test]
    fn degenerate_sector_is_rejected() {
        let mut b = SectorGraphBuilder::new("line");
        b.add_sector(&[vec2(0.0, 0.0), vec2(1.0, 0.0)], 0.0, 1.0);
        assert!(matches!(
            b.build(),
            Err(GraphError::TooFewVertices { count: 2, .. })
        ));
    }

    #[test]
    fn one_sided_mirror_is_rejected() {
        let mut b = SectorGraphBuilder::new("broken");
        b.add_sector(&square(0.0), 0.0, 8.0);
        b.add_sector(&square(10.0), 0.0, 8.0);
        b.connect_shared_walls();
        let mut g = b.build().unwrap();
        let m = g.walls[1].mirror.unwrap();
        g.walls[m as usize].mirror = None;
        g.walls[m as usize].adjoin = None;
        assert_eq!(
            g.validate(),
            Err(GraphError::MirrorMismatch { wall: 1, mirror: m })
        );
    }

    #[test]
    fn link_reports_missing_wall() {
        let mut b = SectorGraphBuilder::new("x");
        let a = b.add_sector(&square(0.0), 0.0, 8.0);
        assert!(matches!(
            b.link(a, 9, a, 0),
            Err(GraphError::NoSuchWall { local: 9, .. })
        ));
    }
}
