//! Portal-traversal visibility for 2D sector maps.
//!
//! Given a [`world::SectorGraph`] and a [`world::Camera`], an
//! [`engine::FrameContext`] walks the graph through open portals and
//! produces the visible wall entries of one frame, front to back, each with
//! per-column clip bounds for a column rasteriser.

pub mod config;
pub mod engine;
pub mod mapfile;
pub mod renderer;
pub mod world;
