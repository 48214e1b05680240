mod builder;
mod camera;
pub mod demo;
mod geometry;
mod helpers;

pub use geometry::{
    Sector, SectorFlags, SectorGraph, SectorId, Vertex, VertexId, Wall, WallId,
};

pub use builder::{GraphError, SectorGraphBuilder};
pub use camera::Camera;
pub use helpers::point_side;
