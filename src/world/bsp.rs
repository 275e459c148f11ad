use crate::math::{FRACBITS, Fixed, fixed_mul};

use super::{Level, Node, SectorId, SubsectorId};
use super::geometry::NodeChild;

pub const CHILD_MASK: u32 = 0x7FFF_FFFF;

pub const SUBSECTOR_BIT: u32 = 0x8000_0000;

/// Things that make a level unusable for the refresh.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level has no subsectors")]
    NoSubsectors,

    #[error("node {node} references missing child {child:#x}")]
    BadChild { node: u32, child: NodeChild },

    #[error("node {node} is reachable from itself")]
    Cycle { node: u32 },

    #[error("subsector {subsector} seg range {first}+{count} exceeds {total} segs")]
    BadSegRange {
        subsector: u32,
        first: u32,
        count: u32,
        total: usize,
    },

    #[error("{what} {index} references missing sector {sector}")]
    BadSector {
        what: &'static str,
        index: u32,
        sector: SectorId,
    },

    #[error("{what} {index} references missing {target} {id}")]
    Dangling {
        what: &'static str,
        index: u32,
        target: &'static str,
        id: u32,
    },
}

// ──────────────────────────────────────────────────────────────────────────
//                       Level – public helpers
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    /// Child reference the traversal starts from: the last node emitted by
    /// the node builder, or subsector 0 when the map has no nodes at all.
    #[inline(always)]
    pub fn bsp_root(&self) -> NodeChild {
        match self.nodes.len() {
            0 => SUBSECTOR_BIT,
            n => (n - 1) as NodeChild,
        }
    }

    /// Walk the BSP and return the subsector id containing `(x, y)`.
    pub fn locate_subsector(&self, x: Fixed, y: Fixed) -> SubsectorId {
        let mut child = self.bsp_root();
        // Bounded by node count so a malformed tree cannot spin forever.
        for _ in 0..=self.nodes.len() {
            if child & SUBSECTOR_BIT != 0 {
                return child & CHILD_MASK;
            }
            let node = &self.nodes[child as usize];
            child = node.child[node.point_side(x, y)];
        }
        0
    }

    /// Sector under `(x, y)`.
    pub fn sector_at(&self, x: Fixed, y: Fixed) -> SectorId {
        let ss = self.locate_subsector(x, y) as usize;
        self.subsectors.get(ss).map(|s| s.sector).unwrap_or(0)
    }

    /// Check every cross reference the refresh relies on.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.subsectors.is_empty() {
            return Err(LevelError::NoSubsectors);
        }

        let sector_ok = |s: SectorId| (s as usize) < self.sectors.len();

        for (i, sd) in self.sidedefs.iter().enumerate() {
            if !sector_ok(sd.sector) {
                return Err(LevelError::BadSector {
                    what: "sidedef",
                    index: i as u32,
                    sector: sd.sector,
                });
            }
        }

        for (i, ld) in self.linedefs.iter().enumerate() {
            for v in [ld.v1, ld.v2] {
                if v as usize >= self.vertices.len() {
                    return Err(dangling("linedef", i, "vertex", v));
                }
            }
            for sd in [ld.right_sidedef, ld.left_sidedef].into_iter().flatten() {
                if sd as usize >= self.sidedefs.len() {
                    return Err(dangling("linedef", i, "sidedef", sd));
                }
            }
            if ld.right_sidedef.is_none() {
                return Err(dangling("linedef", i, "sidedef", u32::MAX));
            }
        }

        for (i, seg) in self.segs.iter().enumerate() {
            for v in [seg.v1, seg.v2] {
                if v as usize >= self.vertices.len() {
                    return Err(dangling("seg", i, "vertex", v));
                }
            }
            if seg.linedef as usize >= self.linedefs.len() {
                return Err(dangling("seg", i, "linedef", seg.linedef));
            }
        }

        for (i, ss) in self.subsectors.iter().enumerate() {
            let end = ss.first_seg as usize + ss.seg_count as usize;
            if end > self.segs.len() {
                return Err(LevelError::BadSegRange {
                    subsector: i as u32,
                    first: ss.first_seg,
                    count: ss.seg_count,
                    total: self.segs.len(),
                });
            }
            if !sector_ok(ss.sector) {
                return Err(LevelError::BadSector {
                    what: "subsector",
                    index: i as u32,
                    sector: ss.sector,
                });
            }
        }

        for (i, sec) in self.sectors.iter().enumerate() {
            if let Some(hs) = sec.heightsec {
                if !sector_ok(hs) {
                    return Err(LevelError::BadSector {
                        what: "sector heightsec",
                        index: i as u32,
                        sector: hs,
                    });
                }
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            for &child in &node.child {
                let ok = if child & SUBSECTOR_BIT != 0 {
                    ((child & CHILD_MASK) as usize) < self.subsectors.len()
                } else {
                    (child as usize) < self.nodes.len()
                };
                if !ok {
                    return Err(LevelError::BadChild {
                        node: i as u32,
                        child,
                    });
                }
            }
        }

        self.check_acyclic()
    }

    /// Iterative DFS from the root; a node met twice means a cycle (or a
    /// shared subtree, which a node builder never produces either).
    fn check_acyclic(&self) -> Result<(), LevelError> {
        if self.nodes.is_empty() {
            return Ok(());
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.bsp_root()];
        while let Some(child) = stack.pop() {
            if child & SUBSECTOR_BIT != 0 {
                continue;
            }
            let idx = child as usize;
            if seen[idx] {
                return Err(LevelError::Cycle { node: child });
            }
            seen[idx] = true;
            stack.extend_from_slice(&self.nodes[idx].child);
        }
        Ok(())
    }
}

fn dangling(what: &'static str, index: usize, target: &'static str, id: u32) -> LevelError {
    LevelError::Dangling {
        what,
        index: index as u32,
        target,
        id,
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Node geometry helpers
// ──────────────────────────────────────────────────────────────────────────
impl Node {
    /// 0 = *front* of splitter, 1 = *back*.
    ///
    /// Axis-aligned partitions are decided with plain comparisons, so a point
    /// exactly on such a line lands on the side the line direction dictates.
    /// Otherwise opposite sign bits decide cheaply and the remaining cases
    /// compare the two cross-product halves, where a tie counts as back.
    #[inline]
    pub fn point_side(&self, x: Fixed, y: Fixed) -> usize {
        if self.dx == 0 {
            return if x <= self.x {
                (self.dy > 0) as usize
            } else {
                (self.dy < 0) as usize
            };
        }
        if self.dy == 0 {
            return if y <= self.y {
                (self.dx < 0) as usize
            } else {
                (self.dx > 0) as usize
            };
        }

        let dx = x.wrapping_sub(self.x);
        let dy = y.wrapping_sub(self.y);

        // Try to quickly decide by looking at sign bits.
        if (self.dy ^ self.dx ^ dx ^ dy) < 0 {
            return ((self.dy ^ dx) < 0) as usize; // (left is negative)
        }
        let left = fixed_mul(self.dy >> FRACBITS, dx);
        let right = fixed_mul(dy, self.dx >> FRACBITS);
        (right >= left) as usize
    }
}
