//! Per-column vertical windows, narrowed as traversal descends through
//! portals.
//!
//! Every window of a frame lives in one [`WindowPool`]: a flat run of
//! [`ColumnClip`]s per window, addressed by [`WindowId`]. Windows are never
//! modified once allocated, so a child can always be compared with its
//! parent after the fact.

use crate::engine::types::{ColumnRange, Screen};

pub type WindowId = u32;

/// Open pixel rows `[top, bottom)` of one screen column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColumnClip {
    pub top: i32,
    pub bottom: i32,
}

impl ColumnClip {
    pub const CLOSED: ColumnClip = ColumnClip { top: 0, bottom: 0 };

    #[inline]
    pub fn full(h: usize) -> Self {
        Self {
            top: 0,
            bottom: h as i32,
        }
    }

    /// Rows whose centres lie between the projected screen rows `top` and
    /// `bottom`.
    #[inline]
    pub fn from_rows(top: f32, bottom: f32) -> Self {
        let row = |y: f32| (y - 0.5).ceil().clamp(i32::MIN as f32 / 2.0, i32::MAX as f32 / 2.0) as i32;
        Self {
            top: row(top),
            bottom: row(bottom),
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.top < self.bottom
    }

    #[inline]
    pub fn height(&self) -> usize {
        (self.bottom - self.top).max(0) as usize
    }

    #[inline]
    pub fn intersect(&self, other: &ColumnClip) -> ColumnClip {
        ColumnClip {
            top: self.top.max(other.top),
            bottom: self.bottom.min(other.bottom),
        }
    }

    /// `self` is open only where `outer` is.
    #[inline]
    pub fn within(&self, outer: &ColumnClip) -> bool {
        !self.is_open() || (self.top >= outer.top && self.bottom <= outer.bottom)
    }
}

#[derive(Clone, Copy, Debug)]
struct WindowSpan {
    range: ColumnRange,
    offset: usize,
}

/// Result of narrowing a window through a portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Narrowed {
    Open(WindowId),
    /// Nothing of the opening is visible inside the parent.
    Closed,
    /// The pool's column budget is spent.
    Exhausted,
}

#[derive(Clone, Debug, Default)]
pub struct WindowPool {
    spans: Vec<WindowSpan>,
    clips: Vec<ColumnClip>,
    max_columns: usize,
}

impl WindowPool {
    pub fn new(max_columns: usize) -> Self {
        Self {
            spans: Vec::new(),
            clips: Vec::new(),
            max_columns,
        }
    }

    pub fn clear(&mut self) {
        self.spans.clear();
        self.clips.clear();
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total columns allocated this frame.
    pub fn columns_used(&self) -> usize {
        self.clips.len()
    }

    /// Fully open window covering the whole screen.
    pub fn root(&mut self, screen: &Screen) -> WindowId {
        let offset = self.clips.len();
        self.clips
            .extend(std::iter::repeat_n(ColumnClip::full(screen.h), screen.w));
        self.push_span(screen.columns(), offset)
    }

    #[inline]
    pub fn range(&self, id: WindowId) -> ColumnRange {
        self.spans
            .get(id as usize)
            .map_or(ColumnRange::default(), |s| s.range)
    }

    /// Clips of window `id`, one per column of its range.
    pub fn columns(&self, id: WindowId) -> &[ColumnClip] {
        match self.spans.get(id as usize) {
            Some(s) => &self.clips[s.offset..s.offset + s.range.len()],
            None => &[],
        }
    }

    /// Clip of screen column `x` in window `id`; closed outside its range.
    #[inline]
    pub fn column(&self, id: WindowId, x: i32) -> ColumnClip {
        match self.spans.get(id as usize) {
            Some(s) if s.range.contains(x) => self.clips[s.offset + (x - s.range.x0) as usize],
            _ => ColumnClip::CLOSED,
        }
    }

    /// Derive a child window from `parent` over `range`: every column is the
    /// parent's clip intersected with `opening(x)`. Closed columns at either
    /// end are trimmed off.
    pub fn narrow(
        &mut self,
        parent: WindowId,
        range: ColumnRange,
        opening: impl Fn(i32) -> ColumnClip,
    ) -> Narrowed {
        let Some(&WindowSpan {
            range: p_range,
            offset: p_off,
        }) = self.spans.get(parent as usize)
        else {
            return Narrowed::Closed;
        };
        let range = range.intersect(&p_range);
        if range.is_empty() {
            return Narrowed::Closed;
        }
        let start = self.clips.len();
        if start + range.len() > self.max_columns {
            return Narrowed::Exhausted;
        }

        for x in range.x0..range.x1 {
            let outer = self.clips[p_off + (x - p_range.x0) as usize];
            self.clips.push(outer.intersect(&opening(x)));
        }

        let fresh = &self.clips[start..];
        let Some(lead) = fresh.iter().position(ColumnClip::is_open) else {
            self.clips.truncate(start);
            return Narrowed::Closed;
        };
        let trail = fresh.iter().rev().take_while(|c| !c.is_open()).count();
        let keep = ColumnRange::new(range.x0 + lead as i32, range.x1 - trail as i32);

        self.clips.truncate(self.clips.len() - trail);
        self.clips.drain(start..start + lead);
        Narrowed::Open(self.push_span(keep, start))
    }

    /// `child` lies inside `parent` in both directions.
    pub fn is_subset(&self, child: WindowId, parent: WindowId) -> bool {
        let c = self.range(child);
        if !self.range(parent).covers(&c) {
            return false;
        }
        (c.x0..c.x1).all(|x| self.column(child, x).within(&self.column(parent, x)))
    }

    fn push_span(&mut self, range: ColumnRange, offset: usize) -> WindowId {
        self.spans.push(WindowSpan { range, offset });
        (self.spans.len() - 1) as WindowId
    }
}
