//! Succinct phylogenetic tree over a balanced-parenthesis index.
//!
//! A node is addressed three ways: by an absolute bit position (its open or
//! close index — navigation accepts either and normalizes), by its 1-based
//! preorder rank, or by its 1-based postorder rank. Per-node names and
//! branch lengths live in parallel arrays indexed by `preorder rank - 1`;
//! coordinate arrays produced by [`layout`] are indexed by postorder rank.

use log::debug;

use crate::bits::{BitIndex, BitSeq};
use crate::error::{Result, TreeError};

pub mod layout;
pub mod view;

/// Immutable tree: topology in a [`BitIndex`], attributes in parallel arrays.
#[derive(Clone, Debug)]
pub struct BpTree {
    index: BitIndex,
    names: Vec<Option<String>>,
    lengths: Vec<Option<f64>>,
    num_leaves: usize,
}

impl BpTree {
    /// Builds a tree with no name/length attributes.
    pub fn new(bits: BitSeq) -> Result<Self> {
        let n = bits.len() / 2;
        Self::with_attributes(bits, vec![None; n], vec![None; n])
    }

    /// Builds a tree with parallel attribute arrays indexed by
    /// `preorder rank - 1`. The root's length entry is never read.
    pub fn with_attributes(
        bits: BitSeq,
        names: Vec<Option<String>>,
        lengths: Vec<Option<f64>>,
    ) -> Result<Self> {
        let index = BitIndex::new(bits)?.with_search_index();
        let n = index.num_nodes();
        if names.len() != n {
            return Err(TreeError::AttributeLength {
                expected: n,
                got: names.len(),
            });
        }
        if lengths.len() != n {
            return Err(TreeError::AttributeLength {
                expected: n,
                got: lengths.len(),
            });
        }
        let num_leaves = (0..index.len())
            .filter(|&i| index.get(i) && !index.get(i + 1))
            .count();
        debug!("built tree: {n} nodes, {num_leaves} leaves");
        Ok(Self {
            index,
            names,
            lengths,
            num_leaves,
        })
    }

    pub fn index(&self) -> &BitIndex {
        &self.index
    }

    pub fn num_nodes(&self) -> usize {
        self.index.num_nodes()
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Opening position of the root, always 0.
    pub fn root(&self) -> usize {
        0
    }

    #[inline]
    pub fn rank(&self, bit: bool, i: usize) -> usize {
        self.index.rank(bit, i)
    }

    #[inline]
    pub fn select(&self, bit: bool, k: usize) -> usize {
        self.index.select(bit, k)
    }

    #[inline]
    pub fn excess(&self, i: usize) -> isize {
        self.index.excess(i)
    }

    /// Depth of the node at position `i`; the root pair has depth 1.
    #[inline]
    pub fn depth(&self, i: usize) -> isize {
        self.index.excess(i)
    }

    #[inline]
    pub fn open(&self, i: usize) -> usize {
        self.index.open(i)
    }

    #[inline]
    pub fn close(&self, i: usize) -> usize {
        self.index.close(i)
    }

    #[inline]
    pub fn enclose(&self, i: usize) -> Option<usize> {
        self.index.enclose(i)
    }

    #[inline]
    pub fn fwd_search(&self, i: usize, d: isize) -> Option<usize> {
        self.index.fwd_search(i, d)
    }

    #[inline]
    pub fn bwd_search(&self, i: usize, d: isize) -> Option<isize> {
        self.index.bwd_search(i, d)
    }

    /// Opening position of the parent, or `None` for the root.
    pub fn parent(&self, i: usize) -> Option<usize> {
        if self.index.open(i) == 0 {
            None
        } else {
            self.index.enclose(i)
        }
    }

    /// True iff `i` is an open bit immediately followed by a close bit.
    #[inline]
    pub fn is_leaf(&self, i: usize) -> bool {
        self.index.get(i) && !self.index.get(i + 1)
    }

    /// Opening position of the first child, or `None` for a leaf.
    pub fn first_child(&self, i: usize) -> Option<usize> {
        let open = self.index.open(i);
        if self.is_leaf(open) {
            None
        } else {
            Some(open + 1)
        }
    }

    /// Opening position of the last child, or `None` for a leaf.
    pub fn last_child(&self, i: usize) -> Option<usize> {
        let open = self.index.open(i);
        if self.is_leaf(open) {
            None
        } else {
            Some(self.index.open(self.index.close(open) - 1))
        }
    }

    /// Opening position of the next sibling, or `None` for a last child.
    pub fn next_sibling(&self, i: usize) -> Option<usize> {
        let after = self.index.close(i) + 1;
        if after < self.index.len() && self.index.get(after) {
            Some(after)
        } else {
            None
        }
    }

    /// Opening position of the previous sibling, or `None` for a first child.
    pub fn prev_sibling(&self, i: usize) -> Option<usize> {
        let open = self.index.open(i);
        if open > 0 && !self.index.get(open - 1) {
            Some(self.index.open(open - 1))
        } else {
            None
        }
    }

    /// 1-based preorder rank of the node at position `i`.
    #[inline]
    pub fn preorder(&self, i: usize) -> usize {
        self.index.rank(true, self.index.open(i))
    }

    /// Opening position of the node with preorder rank `k`.
    #[inline]
    pub fn preorder_select(&self, k: usize) -> usize {
        self.index.select(true, k)
    }

    /// 1-based postorder rank of the node at position `i`.
    #[inline]
    pub fn postorder(&self, i: usize) -> usize {
        self.index.rank(false, self.index.close(i))
    }

    /// Closing position of the node with postorder rank `k`.
    #[inline]
    pub fn postorder_select(&self, k: usize) -> usize {
        self.index.select(false, k)
    }

    /// Postorder ranks in traversal order (children before parents).
    pub fn postorder_ranks(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.num_nodes()
    }

    /// Preorder ranks in traversal order (parents before children).
    pub fn preorder_ranks(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.num_nodes()
    }

    /// Name of the node at position `i`, if one was supplied.
    pub fn name(&self, i: usize) -> Option<&str> {
        self.names[self.preorder(i) - 1].as_deref()
    }

    /// Branch length of the node at position `i`, if one was supplied.
    /// The root's value is meaningless by convention.
    pub fn length(&self, i: usize) -> Option<f64> {
        self.lengths[self.preorder(i) - 1]
    }

    /// Opening positions of the children of `i`, left to right.
    pub fn children(&self, i: usize) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(i),
        }
    }

    /// Opening positions of all leaves, left to right.
    pub fn tips(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.index.len()).filter(move |&i| self.is_leaf(i))
    }

    /// Number of leaves in the clade rooted at `i` (1 for a leaf).
    pub fn num_tips(&self, i: usize) -> usize {
        let open = self.index.open(i);
        let close = self.index.close(open);
        (open..close).filter(|&j| self.is_leaf(j)).count()
    }

    /// Opening position of the first tip carrying `name`, if any.
    pub fn tip_named(&self, name: &str) -> Option<usize> {
        self.tips().find(|&i| self.name(i) == Some(name))
    }
}

/// Iterator over a node's children, via repeated sibling hops.
pub struct Children<'a> {
    tree: &'a BpTree,
    next: Option<usize>,
}

impl Iterator for Children<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}
