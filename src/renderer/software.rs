//! ---------------------------------------------------------------------------
//! Flat-shaded software (CPU) column renderer
//!
//! * Fills a `Vec<u32>` frame-buffer in **0x00RRGGBB** format.
//! * Every visible wall entry owns its columns inside its window, so entries
//!   can be drawn in any order and no Z-buffer is needed.
//! ---------------------------------------------------------------------------

use crate::{
    engine::{ColumnClip, SurfaceKind, VisibleWall, WindowPool},
    renderer::{Renderer, Rgba},
};

const CLEAR: Rgba = 0x20_20_20;
const CEILING: Rgba = 0x50_58_70;
const FLOOR: Rgba = 0x58_48_38;
const STEP: Rgba = 0x90_90_80;

/// Base wall colours, picked by wall id.
const PALETTE: [Rgba; 8] = [
    0xB0_60_50, 0x60_A0_60, 0x50_70_B0, 0xB0_A0_50, 0x90_60_B0, 0x50_A0_A0, 0xC0_80_40,
    0x80_80_80,
];

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

#[derive(Default)]
pub struct Software {
    scratch: Vec<Rgba>,
    width: usize,
    height: usize,
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize) {
        // (re)allocate if resolution changed
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
        }
        self.scratch.fill(CLEAR);
    }

    fn draw_wall(&mut self, wall: &VisibleWall, windows: &WindowPool) {
        let base = PALETTE[wall.wall as usize % PALETTE.len()];

        for x in wall.columns.x0..wall.columns.x1 {
            if x < 0 || x as usize >= self.width {
                continue;
            }
            let clip = windows.column(wall.window, x);
            if !clip.is_open() {
                continue;
            }

            let f = wall.frac(x);
            let inv_z = wall.inv_z.0 + (wall.inv_z.1 - wall.inv_z.0) * f;
            let k = wall.light * fog(inv_z);
            let ceil = wall.row_at(&wall.ceiling, x);
            let floor = wall.row_at(&wall.floor, x);

            self.fill(x, band(f32::MIN, ceil, clip), shade(CEILING, wall.light));
            self.fill(x, band(floor, f32::MAX, clip), shade(FLOOR, wall.light));

            match wall.kind {
                SurfaceKind::Solid => self.fill(x, band(ceil, floor, clip), shade(base, k)),
                SurfaceKind::Portal {
                    open_top,
                    open_bottom,
                    steps,
                    ..
                } => {
                    if steps {
                        let top = wall.row_at(&open_top, x);
                        let bottom = wall.row_at(&open_bottom, x);
                        self.fill(x, band(ceil, top, clip), shade(STEP, k));
                        self.fill(x, band(bottom, floor, clip), shade(STEP, k));
                    }
                }
            }
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }
}

/*──────────────────────── column rendering ───────────────────────────*/

impl Software {
    /// Paint rows `[span.top, span.bottom)` of column `x`.
    fn fill(&mut self, x: i32, span: ColumnClip, color: Rgba) {
        let top = span.top.max(0) as usize;
        let bottom = (span.bottom.max(0) as usize).min(self.height);
        let col = x as usize;
        for y in top..bottom {
            self.scratch[y * self.width + col] = color;
        }
    }
}

/// Rows between projected screen rows `top` and `bottom`, inside `clip`.
#[inline]
fn band(top: f32, bottom: f32, clip: ColumnClip) -> ColumnClip {
    ColumnClip::from_rows(top, bottom).intersect(&clip)
}

/// Distance fade: 1.0 close up, 0.25 far away.
#[inline]
fn fog(inv_z: f32) -> f32 {
    (0.25 + inv_z * 4.0).min(1.0)
}

#[inline]
fn shade(rgb: Rgba, k: f32) -> Rgba {
    let k = k.clamp(0.0, 1.0);
    let ch = |shift: u32| ((((rgb >> shift) & 0xFF) as f32 * k) as u32) << shift;
    ch(16) | ch(8) | ch(0)
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{FrameContext, Screen},
        renderer::RendererExt,
        world::{Camera, demo},
    };
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    fn render(name: &str, x: f32, y: f32) -> Vec<Rgba> {
        let g = demo::by_name(name).unwrap();
        let cam = Camera::new(Vec3::new(x, y, 4.0), 0.0, FRAC_PI_2);
        let mut ctx = FrameContext::default();
        let frame = ctx.run(&g, &cam, 0, &Screen::new(64, 40));

        let mut sw = Software::default();
        let mut fb = Vec::new();
        sw.draw_visible(64, 40, frame, |buf, w, h| {
            assert_eq!((w, h), (64, 40));
            fb = buf.to_vec();
        });
        fb
    }

    #[test]
    fn closed_room_covers_every_pixel() {
        let fb = render("room", 3.0, 5.0);
        assert_eq!(fb.len(), 64 * 40);
        assert!(fb.iter().all(|&px| px != CLEAR), "background left visible");
    }

    #[test]
    fn ceiling_above_floor_below() {
        let fb = render("room", 3.0, 5.0);
        let light = demo::single_room().sectors[0].light;
        assert_eq!(fb[32], shade(CEILING, light));
        assert_eq!(fb[39 * 64 + 32], shade(FLOOR, light));
    }

    #[test]
    fn room_behind_portal_is_drawn() {
        let g = demo::two_rooms();
        let cam = Camera::new(Vec3::new(5.0, 5.0, 4.0), 0.0, FRAC_PI_2);
        let mut ctx = FrameContext::default();
        let frame = ctx.run(&g, &cam, 0, &Screen::new(64, 40));

        let mut sw = Software::default();
        let mut fb = Vec::new();
        sw.draw_visible(64, 40, frame, |buf, _, _| fb = buf.to_vec());
        assert!(fb.iter().all(|&px| px != CLEAR));

        // the far east wall of room 1 fills the middle of the screen
        let far = frame.walls.iter().find(|w| w.wall == 5).unwrap();
        assert!(far.columns.contains(32));
        let k = far.light * fog(far.inv_z.0 + (far.inv_z.1 - far.inv_z.0) * far.frac(32));
        assert_eq!(fb[20 * 64 + 32], shade(PALETTE[5], k));
    }

    #[test]
    fn shading_scales_channels() {
        assert_eq!(shade(0x80_40_20, 0.5), 0x40_20_10);
        assert_eq!(shade(0xFF_FF_FF, 2.0), 0xFF_FF_FF);
    }
}
