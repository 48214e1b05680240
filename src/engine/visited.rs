//! Per-frame record of portal column ranges already traversed.
//!
//! Records are stamped with the frame they were last written in, so starting
//! a new frame is a counter bump rather than a sweep over every portal.

use smallvec::SmallVec;

use crate::{engine::types::ColumnRange, world::WallId};

#[derive(Clone, Debug, Default)]
struct VisitRecord {
    frame: u32,
    ranges: SmallVec<[ColumnRange; 4]>,
}

#[derive(Clone, Debug)]
pub struct PortalVisits {
    frame: u32,
    records: Vec<VisitRecord>,
    max_ranges: usize,
    /// Times a full record had to widen a range to fit a new one.
    pub widened: usize,
}

impl PortalVisits {
    pub fn new(max_ranges: usize) -> Self {
        Self {
            frame: 0,
            records: Vec::new(),
            max_ranges: max_ranges.max(1),
            widened: 0,
        }
    }

    /// Start a new frame for a graph with `wall_count` walls. Everything
    /// marked before is forgotten.
    pub fn begin_frame(&mut self, wall_count: usize) {
        self.frame = self.frame.wrapping_add(1);
        if self.frame == 0 {
            // stamps from 2^32 frames ago would look current
            for r in &mut self.records {
                r.frame = 0;
            }
            self.frame = 1;
        }
        if self.records.len() < wall_count {
            self.records.resize_with(wall_count, VisitRecord::default);
        }
        self.widened = 0;
    }

    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// True if any column of `range` was already traversed through `portal`
    /// this frame.
    pub fn is_visited(&self, portal: WallId, range: ColumnRange) -> bool {
        self.records
            .get(portal as usize)
            .filter(|r| r.frame == self.frame)
            .is_some_and(|r| r.ranges.iter().any(|v| v.overlaps(&range)))
    }

    /// Record `range` as traversed through `portal`, merging it with every
    /// range it overlaps or touches.
    pub fn mark_visited(&mut self, portal: WallId, range: ColumnRange) {
        if range.is_empty() {
            return;
        }
        let frame = self.frame;
        let Some(rec) = self.records.get_mut(portal as usize) else {
            return;
        };
        if rec.frame != frame {
            rec.frame = frame;
            rec.ranges.clear();
        }

        let mut merged = range;
        rec.ranges.retain(|r| {
            if r.x0 <= merged.x1 && merged.x0 <= r.x1 {
                merged = ColumnRange::new(merged.x0.min(r.x0), merged.x1.max(r.x1));
                false
            } else {
                true
            }
        });
        let at = rec.ranges.partition_point(|r| r.x0 < merged.x0);
        rec.ranges.insert(at, merged);

        if rec.ranges.len() > self.max_ranges {
            // close the narrowest gap
            let i = (1..rec.ranges.len())
                .min_by_key(|&i| rec.ranges[i].x0 - rec.ranges[i - 1].x1)
                .unwrap_or(1);
            rec.ranges[i - 1].x1 = rec.ranges[i].x1;
            rec.ranges.remove(i);
            self.widened += 1;
        }
    }

    /// Ranges recorded for `portal` this frame, in column order.
    pub fn ranges(&self, portal: WallId) -> &[ColumnRange] {
        match self.records.get(portal as usize) {
            Some(r) if r.frame == self.frame => r.ranges.as_slice(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visits() -> PortalVisits {
        let mut v = PortalVisits::new(4);
        v.begin_frame(8);
        v
    }

    #[test]
    fn overlap_counts_as_visited() {
        let mut v = visits();
        assert!(!v.is_visited(3, ColumnRange::new(0, 10)));
        v.mark_visited(3, ColumnRange::new(10, 20));
        assert!(v.is_visited(3, ColumnRange::new(15, 40)));
        assert!(v.is_visited(3, ColumnRange::new(12, 13)));
        assert!(!v.is_visited(3, ColumnRange::new(20, 30)));
        assert!(!v.is_visited(2, ColumnRange::new(10, 20)));
    }

    #[test]
    fn touching_ranges_merge() {
        let mut v = visits();
        v.mark_visited(1, ColumnRange::new(30, 40));
        v.mark_visited(1, ColumnRange::new(0, 10));
        v.mark_visited(1, ColumnRange::new(10, 30));
        assert_eq!(v.ranges(1), &[ColumnRange::new(0, 40)]);
    }

    #[test]
    fn new_frame_forgets_marks() {
        let mut v = visits();
        v.mark_visited(0, ColumnRange::new(0, 10));
        v.begin_frame(8);
        assert!(!v.is_visited(0, ColumnRange::new(0, 10)));
        assert!(v.ranges(0).is_empty());
    }

    #[test]
    fn full_record_closes_narrowest_gap() {
        let mut v = visits();
        for x in [0, 10, 20, 40] {
            v.mark_visited(5, ColumnRange::new(x, x + 5));
        }
        v.mark_visited(5, ColumnRange::new(60, 65));
        assert_eq!(v.widened, 1);
        assert_eq!(
            v.ranges(5),
            &[
                ColumnRange::new(0, 15),
                ColumnRange::new(20, 25),
                ColumnRange::new(40, 45),
                ColumnRange::new(60, 65),
            ]
        );
        // widening only ever adds coverage
        assert!(v.is_visited(5, ColumnRange::new(6, 8)));
    }

    #[test]
    fn unknown_portal_is_ignored() {
        let mut v = visits();
        v.mark_visited(99, ColumnRange::new(0, 10));
        assert!(!v.is_visited(99, ColumnRange::new(0, 10)));
    }
}
