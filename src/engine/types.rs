use std::fmt;

use crate::world::Camera;

/// Constants that depend on the *frame-buffer*, not on the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Screen {
    pub w: usize,
    pub h: usize,
    pub half_w: f32, // pre-derived for speed
    pub half_h: f32, // pre-derived for speed
}

impl Screen {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            half_w: w as f32 * 0.5,
            half_h: h as f32 * 0.5,
        }
    }

    #[inline]
    pub fn columns(&self) -> ColumnRange {
        ColumnRange::new(0, self.w as i32)
    }
}

/// Camera state reused by every sector pass of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewer {
    pub focal: f32,
    pub eye_z: f32, // absolute eye height
    pub half_w: f32,
    pub half_h: f32,
}

impl Viewer {
    /// Viewer for `cam` standing on a floor at height `floor_h`.
    pub fn new(cam: &Camera, screen: &Screen, floor_h: f32) -> Self {
        Self {
            focal: cam.screen_scale(screen.w),
            eye_z: floor_h + cam.pos().z,
            half_w: screen.half_w,
            half_h: screen.half_h,
        }
    }

    /// Screen x of a view-space point (`p.y` must be positive).
    #[inline(always)]
    pub fn project_x(&self, p: glam::Vec2) -> f32 {
        self.half_w + p.x * self.focal / p.y
    }

    /// Screen row of world height `h` at inverse depth `inv_z`.
    #[inline(always)]
    pub fn row(&self, h: f32, inv_z: f32) -> f32 {
        self.half_h - (h - self.eye_z) * self.focal * inv_z
    }
}

/// Half-open range of screen columns `[x0, x1)`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ColumnRange {
    pub x0: i32,
    pub x1: i32,
}

impl ColumnRange {
    #[inline]
    pub const fn new(x0: i32, x1: i32) -> Self {
        Self { x0, x1 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.x1 - self.x0).max(0) as usize
    }

    #[inline]
    pub fn contains(&self, x: i32) -> bool {
        self.x0 <= x && x < self.x1
    }

    #[inline]
    pub fn overlaps(&self, other: &ColumnRange) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }

    /// `other` lies entirely inside `self`.
    #[inline]
    pub fn covers(&self, other: &ColumnRange) -> bool {
        self.x0 <= other.x0 && other.x1 <= self.x1
    }

    #[inline]
    pub fn intersect(&self, other: &ColumnRange) -> ColumnRange {
        ColumnRange::new(self.x0.max(other.x0), self.x1.min(other.x1))
    }
}

impl fmt::Debug for ColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.x0, self.x1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_set_operations() {
        let a = ColumnRange::new(0, 10);
        let b = ColumnRange::new(5, 15);
        assert!(a.overlaps(&b));
        assert_eq!(a.intersect(&b), ColumnRange::new(5, 10));
        assert!(!a.overlaps(&ColumnRange::new(10, 12)));
        assert!(a.intersect(&ColumnRange::new(10, 12)).is_empty());
        assert!(a.covers(&ColumnRange::new(2, 10)));
        assert_eq!(ColumnRange::new(4, 2).len(), 0);
    }

    #[test]
    fn row_projection_centres_eye_height() {
        let v = Viewer {
            focal: 100.0,
            eye_z: 4.0,
            half_w: 50.0,
            half_h: 40.0,
        };
        assert_eq!(v.row(4.0, 0.5), 40.0);
        assert_eq!(v.row(8.0, 0.1), 0.0);
        assert_eq!(v.project_x(glam::vec2(1.0, 2.0)), 100.0);
    }
}
