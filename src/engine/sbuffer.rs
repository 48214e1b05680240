//! Segment buffer ("s-buffer"): an ordered partition of a column domain into
//! nearest-surface intervals.
//!
//! Entries live in an index arena linked by `prev`/`next`, so splitting and
//! merging are O(1) splices. The list always covers the domain exactly once;
//! columns nothing has claimed yet belong to a void entry (`NO_SEGMENT`).

use smallvec::SmallVec;

use crate::engine::{
    segment::{Segment, crossing_column, in_front},
    types::ColumnRange,
};

const NIL: u32 = u32::MAX;
const NO_SEGMENT: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct Entry {
    range: ColumnRange,
    seg: u32,
    prev: u32,
    next: u32,
}

/// What happened to one inserted segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Won at least one column.
    Inserted,
    /// Hidden behind what is already there.
    Occluded,
    /// No column inside the domain.
    Rejected,
    /// Would overflow the entry or segment pool; buffer left untouched.
    Dropped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub inserted: usize,
    pub occluded: usize,
    pub rejected: usize,
    pub dropped: usize,
    pub splits: usize,
    pub merges: usize,
}

impl BufferStats {
    pub fn accumulate(&mut self, other: &BufferStats) {
        self.inserted += other.inserted;
        self.occluded += other.occluded;
        self.rejected += other.rejected;
        self.dropped += other.dropped;
        self.splits += other.splits;
        self.merges += other.merges;
    }
}

/// One resolved interval, as handed to portal discovery and rasterisation.
#[derive(Clone, Copy, Debug)]
pub struct BufferEntry<'a> {
    pub range: ColumnRange,
    /// `None` where no wall covers the columns.
    pub segment: Option<&'a Segment>,
}

/// A planned rewrite of one existing entry.
#[derive(Clone, Copy, Debug)]
struct Piece {
    entry: u32,
    range: ColumnRange,
    seg: u32,
}

pub struct SegmentBuffer {
    entries: Vec<Entry>,
    free: Vec<u32>,
    head: u32,
    live: usize,
    segs: Vec<Segment>,
    domain: ColumnRange,
    max_entries: usize,
    max_segments: usize,
    plan: Vec<Piece>,
    stats: BufferStats,
}

impl SegmentBuffer {
    pub fn new(max_entries: usize, max_segments: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_entries),
            free: Vec::new(),
            head: NIL,
            live: 0,
            segs: Vec::with_capacity(max_segments),
            domain: ColumnRange::default(),
            max_entries: max_entries.max(1),
            max_segments,
            plan: Vec::new(),
            stats: BufferStats::default(),
        }
    }

    /// Forget every entry and start a new partition of `domain` with a
    /// single void entry. Storage is kept.
    pub fn reset(&mut self, domain: ColumnRange) {
        self.entries.clear();
        self.free.clear();
        self.segs.clear();
        self.stats = BufferStats::default();
        self.domain = domain;
        self.head = NIL;
        self.live = 0;
        if !domain.is_empty() {
            self.head = self.alloc(Entry {
                range: domain,
                seg: NO_SEGMENT,
                prev: NIL,
                next: NIL,
            });
        }
    }

    #[inline]
    pub fn domain(&self) -> ColumnRange {
        self.domain
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }

    /// Insert a candidate wall segment. Wherever it overlaps an existing
    /// entry the nearer of the two keeps the columns; a crossing pair is
    /// split at the crossing column first.
    pub fn insert(&mut self, seg: Segment) -> InsertOutcome {
        let span = seg.columns.intersect(&self.domain);
        if span.is_empty() {
            self.stats.rejected += 1;
            return InsertOutcome::Rejected;
        }

        let new_idx = self.segs.len() as u32;
        let touched = self.plan_insert(&seg, span, new_idx);
        if self.plan.is_empty() {
            self.stats.occluded += 1;
            return InsertOutcome::Occluded;
        }

        let extra = self.plan.len() - touched;
        if self.segs.len() >= self.max_segments || self.live + extra > self.max_entries {
            self.plan.clear();
            self.stats.dropped += 1;
            return InsertOutcome::Dropped;
        }

        self.segs.push(seg);
        self.apply_plan();
        self.stats.inserted += 1;
        InsertOutcome::Inserted
    }

    /// Fill `self.plan` with the rewritten pieces of every entry the new
    /// segment wins columns from. Returns the number of distinct entries
    /// touched; untouched entries are left out of the plan.
    fn plan_insert(&mut self, seg: &Segment, span: ColumnRange, new_idx: u32) -> usize {
        self.plan.clear();
        let mut touched = 0;

        let mut cur = self.head;
        while cur != NIL {
            let idx = cur;
            let e = self.entries[idx as usize];
            if e.range.x0 >= span.x1 {
                break;
            }
            cur = e.next;
            let contested = e.range.intersect(&span);
            if contested.is_empty() {
                continue;
            }

            // which parts of the contested range does the new segment win?
            let mut wins: SmallVec<[(ColumnRange, bool); 2]> = SmallVec::new();
            match self.segs.get(e.seg as usize) {
                None => wins.push((contested, true)),
                Some(old) => match crossing_column(seg, old, contested) {
                    Some(x) => {
                        for part in [
                            ColumnRange::new(contested.x0, x),
                            ColumnRange::new(x, contested.x1),
                        ] {
                            wins.push((part, in_front(seg, old, part)));
                        }
                    }
                    None => wins.push((contested, in_front(seg, old, contested))),
                },
            }
            if wins.iter().all(|&(_, won)| !won) {
                continue;
            }

            // left remainder, contested parts, right remainder
            let start = self.plan.len();
            let left = ColumnRange::new(e.range.x0, contested.x0);
            let right = ColumnRange::new(contested.x1, e.range.x1);
            push_piece(&mut self.plan, start, idx, left, e.seg);
            for (part, won) in wins {
                push_piece(&mut self.plan, start, idx, part, if won { new_idx } else { e.seg });
            }
            push_piece(&mut self.plan, start, idx, right, e.seg);
            touched += 1;
        }
        touched
    }

    fn apply_plan(&mut self) {
        let plan = std::mem::take(&mut self.plan);
        let mut first_touched = NIL;
        let mut last_written = NIL;

        let mut i = 0;
        while i < plan.len() {
            let entry = plan[i].entry;
            let e = &mut self.entries[entry as usize];
            e.range = plan[i].range;
            e.seg = plan[i].seg;
            if first_touched == NIL {
                first_touched = entry;
            }
            let mut after = entry;
            i += 1;
            while i < plan.len() && plan[i].entry == entry {
                after = self.insert_after(
                    after,
                    Entry {
                        range: plan[i].range,
                        seg: plan[i].seg,
                        prev: NIL,
                        next: NIL,
                    },
                );
                self.stats.splits += 1;
                i += 1;
            }
            last_written = after;
        }

        self.plan = plan;
        self.plan.clear();

        // the new segment may now own several neighbouring entries
        let from = match self.entries[first_touched as usize].prev {
            NIL => first_touched,
            p => p,
        };
        let to = self.entries[last_written as usize].next;
        self.coalesce(from, to, |a, b| a.seg == b.seg);
    }

    /// Merge consecutive entries that show the same source wall. Returns the
    /// number of merges performed; a second call returns 0.
    pub fn merge_adjacent(&mut self) -> usize {
        let segs = std::mem::take(&mut self.segs);
        let wall_of = |e: &Entry| segs.get(e.seg as usize).map(|s| s.wall);
        let merged = self.coalesce(self.head, NIL, |a, b| wall_of(a) == wall_of(b));
        self.segs = segs;
        merged
    }

    /// Walk from `from` up to (not including) `to`, folding each entry into
    /// its predecessor while `same` holds.
    fn coalesce(&mut self, from: u32, to: u32, same: impl Fn(&Entry, &Entry) -> bool) -> usize {
        let mut merged = 0;
        let mut cur = from;
        while cur != NIL && cur != to {
            let next = self.entries[cur as usize].next;
            if next == NIL || next == to {
                break;
            }
            let (a, b) = (self.entries[cur as usize], self.entries[next as usize]);
            if a.range.x1 == b.range.x0 && same(&a, &b) {
                self.entries[cur as usize].range.x1 = b.range.x1;
                self.unlink(next);
                merged += 1;
            } else {
                cur = next;
            }
        }
        self.stats.merges += merged;
        merged
    }

    /// Resolved intervals in column order.
    pub fn entries(&self) -> impl Iterator<Item = BufferEntry<'_>> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            if cur == NIL {
                return None;
            }
            let e = &self.entries[cur as usize];
            cur = e.next;
            Some(BufferEntry {
                range: e.range,
                segment: self.segs.get(e.seg as usize),
            })
        })
    }

    /*──────────────────────── arena plumbing ───────────────────────*/

    fn alloc(&mut self, entry: Entry) -> u32 {
        self.live += 1;
        match self.free.pop() {
            Some(idx) => {
                self.entries[idx as usize] = entry;
                idx
            }
            None => {
                self.entries.push(entry);
                (self.entries.len() - 1) as u32
            }
        }
    }

    fn insert_after(&mut self, at: u32, mut entry: Entry) -> u32 {
        let next = self.entries[at as usize].next;
        entry.prev = at;
        entry.next = next;
        let idx = self.alloc(entry);
        self.entries[at as usize].next = idx;
        if next != NIL {
            self.entries[next as usize].prev = idx;
        }
        idx
    }

    fn unlink(&mut self, idx: u32) {
        let Entry { prev, next, .. } = self.entries[idx as usize];
        if prev != NIL {
            self.entries[prev as usize].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.entries[next as usize].prev = prev;
        }
        self.free.push(idx);
        self.live -= 1;
    }
}

/// Append a piece of entry `entry`, folding it into the previous piece of
/// the same entry (from `start` on) when both keep the same owner.
fn push_piece(plan: &mut Vec<Piece>, start: usize, entry: u32, range: ColumnRange, seg: u32) {
    if range.is_empty() {
        return;
    }
    if let Some(last) = plan[start..].last_mut() {
        if last.seg == seg && last.range.x1 == range.x0 {
            last.range.x1 = range.x1;
            return;
        }
    }
    plan.push(Piece { entry, range, seg });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::segment::tests::seg;
    use glam::vec2;

    fn buffer() -> SegmentBuffer {
        let mut b = SegmentBuffer::new(64, 64);
        b.reset(ColumnRange::new(0, 200));
        b
    }

    fn layout(b: &SegmentBuffer) -> Vec<(ColumnRange, Option<u32>)> {
        b.entries()
            .map(|e| (e.range, e.segment.map(|s| s.wall)))
            .collect()
    }

    fn assert_partition(b: &SegmentBuffer) {
        let mut x = b.domain().x0;
        for e in b.entries() {
            assert_eq!(e.range.x0, x, "gap or overlap at {x}");
            assert!(!e.range.is_empty());
            x = e.range.x1;
        }
        assert_eq!(x, b.domain().x1);
    }

    #[test]
    fn empty_buffer_is_one_void_entry() {
        let b = buffer();
        assert_eq!(layout(&b), vec![(ColumnRange::new(0, 200), None)]);
    }

    #[test]
    fn disjoint_segments_land_in_column_order() {
        let mut b = buffer();
        // [150, 200) then [0, 50)
        assert_eq!(
            b.insert(seg(2, vec2(5.0, 10.0), vec2(10.0, 10.0))),
            InsertOutcome::Inserted
        );
        assert_eq!(
            b.insert(seg(1, vec2(-10.0, 10.0), vec2(-5.0, 10.0))),
            InsertOutcome::Inserted
        );
        assert_partition(&b);
        assert_eq!(
            layout(&b),
            vec![
                (ColumnRange::new(0, 50), Some(1)),
                (ColumnRange::new(50, 150), None),
                (ColumnRange::new(150, 200), Some(2)),
            ]
        );
    }

    #[test]
    fn nearer_segment_wins_in_either_order() {
        // far covers [0, 100), near covers [50, 150)
        let far = seg(1, vec2(-10.0, 10.0), vec2(0.0, 10.0));
        let near = seg(2, vec2(-2.5, 5.0), vec2(2.5, 5.0));
        let expect = vec![
            (ColumnRange::new(0, 50), Some(1)),
            (ColumnRange::new(50, 150), Some(2)),
            (ColumnRange::new(150, 200), None),
        ];

        let mut b = buffer();
        b.insert(far);
        b.insert(near);
        assert_partition(&b);
        assert_eq!(layout(&b), expect);

        let mut b = buffer();
        b.insert(near);
        assert_eq!(b.insert(far), InsertOutcome::Inserted);
        assert_partition(&b);
        assert_eq!(layout(&b), expect);
    }

    #[test]
    fn fully_hidden_segment_is_occluded() {
        let mut b = buffer();
        b.insert(seg(1, vec2(-10.0, 10.0), vec2(10.0, 10.0)));
        let hidden = seg(2, vec2(-5.0, 20.0), vec2(5.0, 20.0));
        assert_eq!(b.insert(hidden), InsertOutcome::Occluded);
        assert_eq!(layout(&b), vec![(ColumnRange::new(0, 200), Some(1))]);
        assert_eq!(b.stats().occluded, 1);
    }

    #[test]
    fn near_segment_splits_far_one_in_three() {
        let mut b = buffer();
        b.insert(seg(1, vec2(-10.0, 10.0), vec2(10.0, 10.0)));
        b.insert(seg(2, vec2(-1.0, 5.0), vec2(1.0, 5.0)));
        assert_partition(&b);
        assert_eq!(
            layout(&b),
            vec![
                (ColumnRange::new(0, 80), Some(1)),
                (ColumnRange::new(80, 120), Some(2)),
                (ColumnRange::new(120, 200), Some(1)),
            ]
        );
    }

    #[test]
    fn crossing_segments_share_the_overlap() {
        let mut b = buffer();
        b.insert(seg(1, vec2(-5.0, 5.0), vec2(5.0, 15.0)));
        b.insert(seg(2, vec2(-5.0, 15.0), vec2(5.0, 5.0)));
        assert_partition(&b);
        assert_eq!(
            layout(&b),
            vec![
                (ColumnRange::new(0, 100), Some(1)),
                (ColumnRange::new(100, 200), Some(2)),
            ]
        );
    }

    #[test]
    fn out_of_domain_segment_is_rejected() {
        let mut b = SegmentBuffer::new(64, 64);
        b.reset(ColumnRange::new(0, 40));
        let s = seg(1, vec2(5.0, 10.0), vec2(10.0, 10.0));
        assert_eq!(b.insert(s), InsertOutcome::Rejected);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn merge_joins_same_wall_and_is_idempotent() {
        let mut b = buffer();
        // two pieces of one wall either side of a nearer occluder, then the
        // occluder's columns are reclaimed by a second, nearer piece of wall 1
        b.insert(seg(1, vec2(-10.0, 10.0), vec2(10.0, 10.0)));
        b.insert(seg(2, vec2(-1.0, 5.0), vec2(1.0, 5.0)));
        b.insert(seg(1, vec2(-1.0, 4.0), vec2(1.0, 4.0)));
        assert_eq!(b.len(), 3);

        let merged = b.merge_adjacent();
        assert_eq!(merged, 2);
        let once = layout(&b);
        assert_eq!(once, vec![(ColumnRange::new(0, 200), Some(1))]);
        assert_eq!(b.merge_adjacent(), 0);
        assert_eq!(layout(&b), once);
        assert_partition(&b);
    }

    #[test]
    fn entry_capacity_drops_newest_segment() {
        let mut b = SegmentBuffer::new(3, 64);
        b.reset(ColumnRange::new(0, 200));
        b.insert(seg(1, vec2(-10.0, 10.0), vec2(10.0, 10.0)));
        b.insert(seg(2, vec2(-1.0, 5.0), vec2(1.0, 5.0)));
        assert_eq!(b.len(), 3);
        let before = layout(&b);

        // would split wall 1's left piece again
        let s = seg(3, vec2(-6.0, 5.0), vec2(-4.0, 5.0));
        assert_eq!(b.insert(s), InsertOutcome::Dropped);
        assert_eq!(layout(&b), before);
        assert_partition(&b);
        assert_eq!(b.stats().dropped, 1);
    }

    #[test]
    fn segment_capacity_drops_newest_segment() {
        let mut b = SegmentBuffer::new(64, 1);
        b.reset(ColumnRange::new(0, 200));
        b.insert(seg(1, vec2(-10.0, 10.0), vec2(0.0, 10.0)));
        let s = seg(2, vec2(0.0, 10.0), vec2(10.0, 10.0));
        assert_eq!(b.insert(s), InsertOutcome::Dropped);
        assert_eq!(b.entries().filter(|e| e.segment.is_some()).count(), 1);
    }

    #[test]
    fn reset_reuses_storage() {
        let mut b = buffer();
        b.insert(seg(1, vec2(-10.0, 10.0), vec2(10.0, 10.0)));
        b.insert(seg(2, vec2(-1.0, 5.0), vec2(1.0, 5.0)));
        b.reset(ColumnRange::new(10, 20));
        assert_eq!(layout(&b), vec![(ColumnRange::new(10, 20), None)]);
        assert_eq!(*b.stats(), BufferStats::default());
    }
}
