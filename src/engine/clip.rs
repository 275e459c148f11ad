//! Screen-column occlusion: the sorted list of column ranges already
//! covered by solid walls.
//!
//! Traversal is front to back, so a range that is covered here can never be
//! seen again this frame. Two sentinels (one left of column 0, one right of
//! the last column) keep every scan in bounds.

use smallvec::SmallVec;

/// Inclusive run of screen columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipRange {
    pub first: i32,
    pub last: i32,
}

/// Column runs a clip call left visible, left to right.
pub type Visible = SmallVec<[ClipRange; 4]>;

#[derive(Debug)]
pub struct SolidSegs {
    ranges: SmallVec<[ClipRange; 32]>,
    width: i32,
}

impl SolidSegs {
    pub fn new(width: i32) -> Self {
        let mut s = Self {
            ranges: SmallVec::new(),
            width,
        };
        s.clear(width);
        s
    }

    /// Open every column of a `width`-wide view.
    pub fn clear(&mut self, width: i32) {
        self.width = width;
        self.ranges.clear();
        self.ranges.push(ClipRange {
            first: -0x7fff_ffff,
            last: -1,
        });
        self.ranges.push(ClipRange {
            first: width,
            last: 0x7fff_ffff,
        });
    }

    #[inline(always)]
    pub fn ranges(&self) -> &[ClipRange] {
        &self.ranges
    }

    /// Every column is covered; nothing further can be seen.
    pub fn is_full(&self) -> bool {
        self.ranges.len() == 1
    }

    /// First range that ends at or right of `x - 1`.
    #[inline]
    fn start_for(&self, x: i32) -> usize {
        self.ranges.partition_point(|r| r.last < x - 1)
    }

    /// A solid wall covers `first..=last`: return the parts that were still
    /// open and mark the whole run covered.
    pub fn clip_solid(&mut self, first: i32, last: i32) -> Visible {
        let mut out = Visible::new();
        let start = self.start_for(first);

        if first < self.ranges[start].first {
            if last < self.ranges[start].first - 1 {
                // Entirely in a gap: new range.
                out.push(ClipRange { first, last });
                self.ranges.insert(start, ClipRange { first, last });
                return out;
            }
            out.push(ClipRange {
                first,
                last: self.ranges[start].first - 1,
            });
            self.ranges[start].first = first;
        }

        if last <= self.ranges[start].last {
            return out;
        }

        let mut next = start;
        while last >= self.ranges[next + 1].first - 1 {
            out.push(ClipRange {
                first: self.ranges[next].last + 1,
                last: self.ranges[next + 1].first - 1,
            });
            next += 1;
            if last <= self.ranges[next].last {
                // Swallowed up to the end of an existing range.
                self.ranges[start].last = self.ranges[next].last;
                self.ranges.drain(start + 1..=next);
                return out;
            }
        }

        out.push(ClipRange {
            first: self.ranges[next].last + 1,
            last,
        });
        self.ranges[start].last = last;
        self.ranges.drain(start + 1..=next);
        out
    }

    /// A see-through wall covers `first..=last`: return the open parts but
    /// leave the occlusion state alone.
    pub fn clip_pass(&self, first: i32, last: i32) -> Visible {
        let mut out = Visible::new();
        let mut start = self.start_for(first);

        if first < self.ranges[start].first {
            if last < self.ranges[start].first - 1 {
                out.push(ClipRange { first, last });
                return out;
            }
            out.push(ClipRange {
                first,
                last: self.ranges[start].first - 1,
            });
        }

        if last <= self.ranges[start].last {
            return out;
        }

        while last >= self.ranges[start + 1].first - 1 {
            out.push(ClipRange {
                first: self.ranges[start].last + 1,
                last: self.ranges[start + 1].first - 1,
            });
            start += 1;
            if last <= self.ranges[start].last {
                return out;
            }
        }

        out.push(ClipRange {
            first: self.ranges[start].last + 1,
            last,
        });
        out
    }

    /// `first..=last` lies inside a single covered range.
    pub fn covers(&self, first: i32, last: i32) -> bool {
        let start = self.ranges.partition_point(|r| r.last < last);
        let r = &self.ranges[start.min(self.ranges.len() - 1)];
        first >= r.first && last <= r.last
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.width
    }
}

/*──────────────────────────────── Tests ──────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;

    fn r(first: i32, last: i32) -> ClipRange {
        ClipRange { first, last }
    }

    #[test]
    fn solid_walls_merge() {
        let mut s = SolidSegs::new(320);
        assert_eq!(s.clip_solid(10, 20).as_slice(), &[r(10, 20)]);
        assert_eq!(s.clip_solid(40, 50).as_slice(), &[r(40, 50)]);
        // Spans both: only the gaps come back.
        assert_eq!(
            s.clip_solid(5, 60).as_slice(),
            &[r(5, 9), r(21, 39), r(51, 60)]
        );
        assert_eq!(s.ranges().len(), 3);
        assert!(s.covers(5, 60));
        assert!(!s.covers(5, 61));
        assert!(s.clip_solid(30, 40).is_empty());
    }

    #[test]
    fn adjacent_runs_join() {
        let mut s = SolidSegs::new(320);
        s.clip_solid(0, 99);
        s.clip_solid(100, 199);
        assert_eq!(s.ranges()[0], r(-0x7fff_ffff, 199));
        s.clip_solid(200, 319);
        assert!(s.is_full());
    }

    #[test]
    fn pass_walls_do_not_occlude() {
        let mut s = SolidSegs::new(320);
        s.clip_solid(100, 200);
        assert_eq!(s.clip_pass(50, 250).as_slice(), &[r(50, 99), r(201, 250)]);
        assert_eq!(s.clip_pass(50, 250).as_slice(), &[r(50, 99), r(201, 250)]);
        assert!(s.clip_pass(120, 180).is_empty());
        assert_eq!(s.ranges().len(), 3);
    }

    #[test]
    fn clear_reopens_every_column() {
        let mut s = SolidSegs::new(320);
        s.clip_solid(0, 319);
        s.clear(640);
        assert_eq!(s.ranges(), &[r(-0x7fff_ffff, -1), r(640, 0x7fff_ffff)]);
        assert_eq!(s.width(), 640);
    }
}
