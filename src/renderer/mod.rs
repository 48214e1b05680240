//! Rendering abstraction layer.
//!
//! *The visibility core never touches a pixel buffer directly.*
//! It produces a [`FrameOutput`] (visible walls, front-to-back, each with a
//! clip window) and hands it to a type that implements [`Renderer`].
//!
//! * Backends only need per-wall drawing; [`RendererExt::draw_visible`]
//!   walks the frame so call-sites stay short.
//! * Texture mapping is not done here: [`software::Software`] shades flat.

use crate::engine::{FrameOutput, VisibleWall, WindowPool};

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

/// A renderer that owns an internal scratch buffer for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
/// Software callers typically forward it to their window-manager;
/// GPU back-ends can ignore the slice because they never allocate it.
pub trait Renderer {
    /// (Re)allocate internal scratch for the requested resolution and clear it.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Rasterise one visible wall entry: ceiling, wall (or portal step
    /// bands) and floor, clipped per column by `windows`.
    fn draw_wall(&mut self, wall: &VisibleWall, windows: &WindowPool);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    ///
    /// * `submit(&[Rgba], w, h)` is run exactly once per frame.
    /// * Software caller passes `|fb, w, h| window.update_with_buffer(fb, w, h)`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

/// Convenience blanket-impl with a one-liner `draw_visible` adaptor.
pub trait RendererExt: Renderer {
    fn draw_visible<F>(&mut self, width: usize, height: usize, frame: &FrameOutput, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        self.begin_frame(width, height);
        for wall in &frame.walls {
            self.draw_wall(wall, &frame.windows);
        }
        self.end_frame(submit);
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}

pub mod software;
