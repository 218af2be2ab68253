//! Rank/select/excess index over a balanced-parenthesis bit sequence.
//!
//! Convention (shared with the SDSL family of structures): 1 = '(' (open),
//! 0 = ')' (close). Every node of the encoded tree is one matched pair of
//! positions and the root is the outermost pair, so a tree of n nodes costs
//! 2n bits plus the caches below.
//!
//! All caches are dense arrays filled in O(n) at construction: prefix ranks
//! for both bit values, their select inverses, the excess profile
//! (`2*rank1(i) - i - 1`, which equals the tree depth at that point of the
//! encoding), and the open<->close match table built with one stack scan.
//! Every query after construction is a cache lookup except
//! [`fwd_search`](BitIndex::fwd_search) / [`bwd_search`](BitIndex::bwd_search),
//! which scan linearly unless a [`RangeMinMax`] accelerator is installed.

use bitvec::prelude::*;
use log::debug;

use crate::error::{Result, TreeError};
use crate::rmm::RangeMinMax;

/// Backing storage for a balanced-parenthesis sequence.
pub type BitSeq = BitVec<u64, Lsb0>;

/// Immutable rank/select/excess index over a validated sequence.
#[derive(Clone, Debug)]
pub struct BitIndex {
    bits: BitSeq,
    rank0: Vec<usize>,
    rank1: Vec<usize>,
    select0: Vec<usize>,
    select1: Vec<usize>,
    excess: Vec<isize>,
    matched: Vec<usize>,
    search: Option<RangeMinMax>,
}

impl BitIndex {
    /// Builds the index, rejecting sequences that are not well-formed.
    ///
    /// Well-formed means: non-empty, even length, no prefix with more closes
    /// than opens, and equally many opens and closes overall. Everything
    /// downstream assumes this, so it is checked here once and never again.
    pub fn new(bits: BitSeq) -> Result<Self> {
        let len = bits.len();
        if len == 0 {
            return Err(TreeError::MalformedSequence {
                reason: "empty sequence".into(),
            });
        }
        if len % 2 != 0 {
            return Err(TreeError::MalformedSequence {
                reason: format!("odd length {len}"),
            });
        }

        let n = len / 2;
        let mut rank0 = Vec::with_capacity(len);
        let mut rank1 = Vec::with_capacity(len);
        let mut select0 = vec![0usize; n + 1];
        let mut select1 = vec![0usize; n + 1];
        let mut excess = Vec::with_capacity(len);
        let mut matched = vec![0usize; len];
        let mut stack = Vec::with_capacity(n);
        let (mut r0, mut r1) = (0usize, 0usize);

        for i in 0..len {
            if bits[i] {
                r1 += 1;
                if r1 > n {
                    return Err(TreeError::MalformedSequence {
                        reason: format!("more than {n} opening parentheses"),
                    });
                }
                select1[r1] = i;
                stack.push(i);
            } else {
                r0 += 1;
                select0[r0] = i;
                let Some(open) = stack.pop() else {
                    return Err(TreeError::MalformedSequence {
                        reason: format!("closing parenthesis at position {i} has no match"),
                    });
                };
                matched[open] = i;
                matched[i] = open;
            }
            rank0.push(r0);
            rank1.push(r1);
            excess.push(2 * r1 as isize - i as isize - 1);
        }
        if !stack.is_empty() {
            return Err(TreeError::MalformedSequence {
                reason: format!("{} unmatched opening parentheses", stack.len()),
            });
        }

        debug!("indexed parenthesis sequence: {len} positions, {n} nodes");
        Ok(Self {
            bits,
            rank0,
            rank1,
            select0,
            select1,
            excess,
            matched,
            search: None,
        })
    }

    /// Installs the block min/max accelerator for the excess searches.
    ///
    /// Results are identical to the plain linear scans; only the scan cost
    /// changes. See [`RangeMinMax`].
    pub fn with_search_index(mut self) -> Self {
        self.search = Some(RangeMinMax::build(&self.excess, crate::rmm::DEFAULT_BLOCK));
        self
    }

    pub fn has_search_index(&self) -> bool {
        self.search.is_some()
    }

    /// Length of the sequence (twice the node count).
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.bits.len() / 2
    }

    pub fn bits(&self) -> &BitSeq {
        &self.bits
    }

    /// Bit at position `i`; true is an open parenthesis.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.len(), "position {i} out of range 0..{}", self.len());
        self.bits[i]
    }

    /// Number of occurrences of `bit` in positions `[0, i]`.
    #[inline]
    pub fn rank(&self, bit: bool, i: usize) -> usize {
        assert!(i < self.len(), "position {i} out of range 0..{}", self.len());
        if bit {
            self.rank1[i]
        } else {
            self.rank0[i]
        }
    }

    /// Position of the k-th occurrence of `bit`, 1-based.
    #[inline]
    pub fn select(&self, bit: bool, k: usize) -> usize {
        let n = self.num_nodes();
        assert!(k >= 1 && k <= n, "select rank {k} out of range 1..={n}");
        if bit {
            self.select1[k]
        } else {
            self.select0[k]
        }
    }

    /// `rank1(i) - rank0(i)`; equals the tree depth at position `i`.
    #[inline]
    pub fn excess(&self, i: usize) -> isize {
        assert!(i < self.len(), "position {i} out of range 0..{}", self.len());
        self.excess[i]
    }

    /// Opening position of the pair containing `i` (identity for opens).
    #[inline]
    pub fn open(&self, i: usize) -> usize {
        if self.get(i) {
            i
        } else {
            self.matched[i]
        }
    }

    /// Closing position of the pair containing `i` (identity for closes).
    #[inline]
    pub fn close(&self, i: usize) -> usize {
        if self.get(i) {
            self.matched[i]
        } else {
            i
        }
    }

    /// Opening position of the smallest pair strictly containing `i`, or
    /// `None` when `i` belongs to the root pair.
    ///
    /// Found by searching backwards for the nearest position whose excess is
    /// two below the current one (one below, when starting from a close) and
    /// stepping one position right.
    pub fn enclose(&self, i: usize) -> Option<usize> {
        let d = if self.get(i) { -2 } else { -1 };
        self.bwd_search(i, d).map(|j| (j + 1) as usize)
    }

    /// Nearest position after `i` whose excess is `excess(i) + d`.
    pub fn fwd_search(&self, i: usize, d: isize) -> Option<usize> {
        match &self.search {
            Some(rmm) => rmm.fwd_search(&self.excess, i, d),
            None => self.fwd_search_scan(i, d),
        }
    }

    /// Nearest position before `i` whose excess is `excess(i) + d`.
    ///
    /// Position `-1` stands for the virtual start of the sequence with
    /// excess 0, the same convention the Sadakane-style structures use; it is
    /// what makes `enclose` of a depth-one node land on the root pair.
    pub fn bwd_search(&self, i: usize, d: isize) -> Option<isize> {
        match &self.search {
            Some(rmm) => rmm.bwd_search(&self.excess, i, d),
            None => self.bwd_search_scan(i, d),
        }
    }

    /// Reference linear scan behind [`fwd_search`](Self::fwd_search).
    pub fn fwd_search_scan(&self, i: usize, d: isize) -> Option<usize> {
        let target = self.excess(i) + d;
        (i + 1..self.len()).find(|&j| self.excess[j] == target)
    }

    /// Reference linear scan behind [`bwd_search`](Self::bwd_search).
    pub fn bwd_search_scan(&self, i: usize, d: isize) -> Option<isize> {
        let target = self.excess(i) + d;
        for j in (0..i).rev() {
            if self.excess[j] == target {
                return Some(j as isize);
            }
        }
        if target == 0 {
            Some(-1)
        } else {
            None
        }
    }
}
