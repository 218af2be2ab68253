//! Block min/max accelerator for the excess searches.
//!
//! [`BitIndex::fwd_search_scan`](crate::bits::BitIndex::fwd_search_scan) and
//! its backward twin are the reference behavior: plain linear scans over the
//! excess profile, O(n) in the worst case. This structure is the drop-in
//! replacement installed by
//! [`BitIndex::with_search_index`](crate::bits::BitIndex::with_search_index):
//! the profile is cut into fixed-size blocks and each block records its
//! minimum and maximum excess. Because excess moves in steps of one, a block
//! whose [min, max] band covers the target excess must contain a match, and
//! any other block can be skipped whole.
//!
//! The summaries are a flat list rather than the heap-shaped tree the
//! Sadakane structure builds on top of them; the interface and results are
//! the same, so a tree-guided upgrade can slot in behind it later.

/// Positions summarized per block.
pub const DEFAULT_BLOCK: usize = 64;

#[derive(Clone, Debug)]
pub struct RangeMinMax {
    block: usize,
    min: Vec<isize>,
    max: Vec<isize>,
}

impl RangeMinMax {
    pub(crate) fn build(excess: &[isize], block: usize) -> Self {
        assert!(block > 0, "block size must be positive");
        let mut min = Vec::with_capacity(excess.len().div_ceil(block));
        let mut max = Vec::with_capacity(min.capacity());
        for chunk in excess.chunks(block) {
            let mut lo = chunk[0];
            let mut hi = chunk[0];
            for &e in &chunk[1..] {
                lo = lo.min(e);
                hi = hi.max(e);
            }
            min.push(lo);
            max.push(hi);
        }
        Self { block, min, max }
    }

    /// Nearest `j > i` with `excess[j] == excess[i] + d`.
    pub(crate) fn fwd_search(&self, excess: &[isize], i: usize, d: isize) -> Option<usize> {
        let target = excess[i] + d;

        // Tail of the block holding i.
        let tail_end = (((i / self.block) + 1) * self.block).min(excess.len());
        for j in i + 1..tail_end {
            if excess[j] == target {
                return Some(j);
            }
        }

        // Whole blocks after it, skipping those whose band misses the target.
        for b in (i / self.block) + 1..self.min.len() {
            if self.min[b] <= target && target <= self.max[b] {
                let start = b * self.block;
                let end = (start + self.block).min(excess.len());
                for j in start..end {
                    if excess[j] == target {
                        return Some(j);
                    }
                }
            }
        }
        None
    }

    /// Nearest `j < i` with `excess[j] == excess[i] + d`; `-1` is the virtual
    /// start of the sequence with excess 0.
    pub(crate) fn bwd_search(&self, excess: &[isize], i: usize, d: isize) -> Option<isize> {
        let target = excess[i] + d;

        // Head of the block holding i.
        let head = (i / self.block) * self.block;
        for j in (head..i).rev() {
            if excess[j] == target {
                return Some(j as isize);
            }
        }

        // Whole blocks before it.
        for b in (0..i / self.block).rev() {
            if self.min[b] <= target && target <= self.max[b] {
                let start = b * self.block;
                let end = (start + self.block).min(excess.len());
                for j in (start..end).rev() {
                    if excess[j] == target {
                        return Some(j as isize);
                    }
                }
            }
        }

        if target == 0 {
            Some(-1)
        } else {
            None
        }
    }
}
