//! Shearable view over an immutable tree.
//!
//! The view keeps the full tree untouched and maintains a "current" tree
//! beside it: either the full tree or a reduction to a kept set of tips plus
//! every ancestor on a path from them to the root. Callers keep addressing
//! nodes by their **full-tree postorder rank** no matter which tree is
//! active; the view translates in and out of the reduced rank space through
//! two dense mapping tables. Each [`shear`](TreeView::shear) replaces the
//! reduction wholesale — reductions never compose.

use std::collections::HashSet;

use log::debug;

use crate::bits::BitSeq;
use crate::error::{Result, TreeError};
use crate::tree::BpTree;

#[derive(Clone, Debug)]
pub struct TreeView {
    full: BpTree,
    sheared: Option<BpTree>,
    /// Active postorder rank -> full postorder rank; slot 0 unused.
    view_to_full: Vec<usize>,
    /// Full postorder rank -> active postorder rank; `None` once pruned.
    full_to_view: Vec<Option<usize>>,
}

impl TreeView {
    pub fn new(full: BpTree) -> Self {
        let n = full.num_nodes();
        Self {
            full,
            sheared: None,
            view_to_full: identity_forward(n),
            full_to_view: identity_backward(n),
        }
    }

    /// The tree queries run against: the reduction if one is active,
    /// otherwise the full tree.
    pub fn active_tree(&self) -> &BpTree {
        self.sheared.as_ref().unwrap_or(&self.full)
    }

    pub fn full_tree(&self) -> &BpTree {
        &self.full
    }

    pub fn is_sheared(&self) -> bool {
        self.sheared.is_some()
    }

    /// Active -> full postorder rank table; identity when unsheared.
    pub fn view_to_full(&self) -> &[usize] {
        &self.view_to_full
    }

    /// Full -> active postorder rank table; identity when unsheared.
    pub fn full_to_view(&self) -> &[Option<usize>] {
        &self.full_to_view
    }

    /// Full postorder rank of the root, present in every reduction.
    pub fn root(&self) -> usize {
        self.full.num_nodes()
    }

    /// Active-tree postorder traversal, yielded as full-tree ranks.
    ///
    /// Shearing preserves relative order, so this is just the forward
    /// mapping table read off in order.
    pub fn postorder_keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.view_to_full[1..].iter().copied()
    }

    /// Active-tree preorder traversal, yielded as full-tree ranks.
    pub fn preorder_keys(&self) -> impl Iterator<Item = usize> + '_ {
        let tree = self.active_tree();
        tree.preorder_ranks().map(move |p| {
            self.view_to_full[tree.postorder(tree.preorder_select(p))]
        })
    }

    /// Reduces the current tree to the tips named in `keep` plus all their
    /// ancestors, rebuilding both mapping tables from scratch against the
    /// full tree. Fails without touching the view when no tip matches.
    pub fn shear(&mut self, keep: &HashSet<String>) -> Result<()> {
        let full = &self.full;
        let n = full.num_nodes();

        // Mark every node on a root-to-kept-tip path, by postorder rank.
        let mut marked = vec![false; n + 1];
        let mut matched_tips = 0usize;
        for tip in full.tips() {
            match full.name(tip) {
                Some(name) if keep.contains(name) => {}
                _ => continue,
            }
            matched_tips += 1;
            let mut node = tip;
            loop {
                let rank = full.postorder(node);
                if marked[rank] {
                    break;
                }
                marked[rank] = true;
                match full.parent(node) {
                    Some(parent) => node = parent,
                    None => break,
                }
            }
        }
        if matched_tips == 0 {
            return Err(TreeError::NoMatchingTips);
        }

        // Rebuild the sequence over the marked nodes in original relative
        // order, pulling names/lengths along in (new) preorder order.
        let mut bits = BitSeq::with_capacity(full.index().len());
        let mut names = Vec::new();
        let mut lengths = Vec::new();
        for i in 0..full.index().len() {
            if !marked[full.postorder(i)] {
                continue;
            }
            let open = full.index().get(i);
            bits.push(open);
            if open {
                let attr = full.preorder(i) - 1;
                names.push(full.names[attr].clone());
                lengths.push(full.lengths[attr]);
            }
        }
        // Re-validates the balanced-parenthesis invariant on the reduction.
        let sheared = BpTree::with_attributes(bits, names, lengths)?;

        let mut view_to_full = vec![0usize];
        let mut full_to_view = vec![None; n + 1];
        for rank in 1..=n {
            if marked[rank] {
                full_to_view[rank] = Some(view_to_full.len());
                view_to_full.push(rank);
            }
        }

        debug!(
            "sheared tree to {} of {n} nodes ({matched_tips} matched tips)",
            sheared.num_nodes()
        );
        self.sheared = Some(sheared);
        self.view_to_full = view_to_full;
        self.full_to_view = full_to_view;
        Ok(())
    }

    /// Drops the reduction and resets both tables to the identity.
    pub fn unshear(&mut self) {
        let n = self.full.num_nodes();
        self.sheared = None;
        self.view_to_full = identity_forward(n);
        self.full_to_view = identity_backward(n);
    }

    /// Active-tree rank for a full-tree rank, or the pruned-node error.
    fn to_view(&self, node: usize) -> Result<usize> {
        assert!(
            node >= 1 && node <= self.full.num_nodes(),
            "postorder rank {node} out of range 1..={}",
            self.full.num_nodes()
        );
        self.full_to_view[node].ok_or(TreeError::NodeNotInActiveTree { node })
    }

    /// Closing position of `node` in the full tree, after a presence check.
    fn full_position(&self, node: usize) -> Result<usize> {
        self.to_view(node)?;
        Ok(self.full.postorder_select(node))
    }

    /// First child in the active tree, as a full-tree rank.
    pub fn first_child(&self, node: usize) -> Result<Option<usize>> {
        self.translated(node, BpTree::first_child)
    }

    /// Last child in the active tree, as a full-tree rank.
    pub fn last_child(&self, node: usize) -> Result<Option<usize>> {
        self.translated(node, BpTree::last_child)
    }

    /// Next sibling in the active tree, as a full-tree rank.
    pub fn next_sibling(&self, node: usize) -> Result<Option<usize>> {
        self.translated(node, BpTree::next_sibling)
    }

    /// Previous sibling in the active tree, as a full-tree rank.
    pub fn prev_sibling(&self, node: usize) -> Result<Option<usize>> {
        self.translated(node, BpTree::prev_sibling)
    }

    /// Children in the active tree, as full-tree ranks.
    pub fn children(&self, node: usize) -> Result<Vec<usize>> {
        let rank = self.to_view(node)?;
        let tree = self.active_tree();
        let position = tree.postorder_select(rank);
        Ok(tree
            .children(position)
            .map(|child| self.view_to_full[tree.postorder(child)])
            .collect())
    }

    /// Number of kept tips in the clade of `node`, counted in the active
    /// tree — pruned tips no longer contribute.
    pub fn num_tips(&self, node: usize) -> Result<usize> {
        let rank = self.to_view(node)?;
        let tree = self.active_tree();
        Ok(tree.num_tips(tree.postorder_select(rank)))
    }

    /// Name lookup; shear-invariant, so it reads the full tree.
    pub fn name(&self, node: usize) -> Result<Option<&str>> {
        let position = self.full_position(node)?;
        Ok(self.full.name(position))
    }

    /// Branch length lookup; shear-invariant.
    pub fn length(&self, node: usize) -> Result<Option<f64>> {
        let position = self.full_position(node)?;
        Ok(self.full.length(position))
    }

    /// Leaf test; shear-invariant (kept internal nodes keep >= 1 child).
    pub fn is_leaf(&self, node: usize) -> Result<bool> {
        let position = self.full_position(node)?;
        Ok(self.full.is_leaf(self.full.open(position)))
    }

    /// Parent as a full-tree rank; shear-invariant because every ancestor of
    /// a retained node is retained.
    pub fn parent(&self, node: usize) -> Result<Option<usize>> {
        let position = self.full_position(node)?;
        Ok(self.full.parent(position).map(|p| self.full.postorder(p)))
    }

    /// Depth bookkeeping; shear-invariant.
    pub fn depth(&self, node: usize) -> Result<isize> {
        let position = self.full_position(node)?;
        Ok(self.full.depth(self.full.open(position)))
    }

    fn translated(
        &self,
        node: usize,
        op: impl Fn(&BpTree, usize) -> Option<usize>,
    ) -> Result<Option<usize>> {
        let rank = self.to_view(node)?;
        let tree = self.active_tree();
        let position = tree.postorder_select(rank);
        Ok(op(tree, position).map(|result| self.view_to_full[tree.postorder(result)]))
    }
}

fn identity_forward(n: usize) -> Vec<usize> {
    (0..=n).collect()
}

fn identity_backward(n: usize) -> Vec<Option<usize>> {
    let mut table: Vec<Option<usize>> = (0..=n).map(Some).collect();
    table[0] = None;
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::testutil::example_tree;

    fn keep(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    // Full-tree postorder ranks of the example:
    // 1="1", 2="2", 3="3", 4="4", 5="internal", 6="6", 7=root.

    #[test]
    fn starts_as_the_identity_view() {
        let view = TreeView::new(example_tree());
        assert!(!view.is_sheared());
        assert_eq!(view.root(), 7);
        assert_eq!(view.view_to_full(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(view.num_tips(5).unwrap(), 3);
        assert_eq!(view.first_child(5).unwrap(), Some(1));
        assert_eq!(view.next_sibling(5).unwrap(), Some(6));
    }

    #[test]
    fn shear_keeps_tips_and_their_ancestors() {
        let mut view = TreeView::new(example_tree());
        view.shear(&keep(&["1", "6"])).unwrap();

        assert!(view.is_sheared());
        assert_eq!(view.active_tree().num_nodes(), 4);
        assert_eq!(view.active_tree().num_leaves(), 2);
        assert_eq!(view.view_to_full(), &[0, 1, 5, 6, 7]);
        assert_eq!(
            view.full_to_view(),
            &[None, Some(1), None, None, None, Some(2), Some(3), Some(4)]
        );

        // The ancestor keeps its identity but loses the pruned tips.
        assert_eq!(view.name(5).unwrap(), Some("internal"));
        assert_eq!(view.num_tips(5).unwrap(), 1);
        assert_eq!(view.first_child(5).unwrap(), Some(1));
        assert_eq!(view.last_child(5).unwrap(), Some(1));
        assert_eq!(view.children(view.root()).unwrap(), vec![5, 6]);
    }

    #[test]
    fn pruned_nodes_are_an_explicit_error() {
        let mut view = TreeView::new(example_tree());
        view.shear(&keep(&["1", "6"])).unwrap();

        for node in [2, 3, 4] {
            assert_eq!(
                view.num_tips(node).unwrap_err(),
                TreeError::NodeNotInActiveTree { node }
            );
            assert_eq!(
                view.name(node).unwrap_err(),
                TreeError::NodeNotInActiveTree { node }
            );
        }
    }

    #[test]
    fn shear_with_no_matching_tip_fails_and_preserves_the_view() {
        let mut view = TreeView::new(example_tree());
        view.shear(&keep(&["1"])).unwrap();
        assert_eq!(view.shear(&keep(&["nope"])), Err(TreeError::NoMatchingTips));
        // The failed call left the previous reduction in place.
        assert_eq!(view.view_to_full(), &[0, 1, 5, 7]);
        // Internal node names do not count as tips.
        assert_eq!(
            view.shear(&keep(&["internal"])),
            Err(TreeError::NoMatchingTips)
        );
    }

    #[test]
    fn shear_replaces_rather_than_composes() {
        let mut view = TreeView::new(example_tree());
        view.shear(&keep(&["1"])).unwrap();
        assert!(view.num_tips(2).is_err());
        // "2" was pruned by the previous shear but comes back because every
        // shear starts from the full tree.
        view.shear(&keep(&["2"])).unwrap();
        assert_eq!(view.view_to_full(), &[0, 2, 4, 5, 7]);
        assert_eq!(view.num_tips(2).unwrap(), 1);
    }

    #[test]
    fn unshear_restores_the_identity() {
        let mut view = TreeView::new(example_tree());
        let before_forward = view.view_to_full().to_vec();
        let before_backward = view.full_to_view().to_vec();

        view.shear(&keep(&["3"])).unwrap();
        view.shear(&keep(&["1", "6"])).unwrap();
        view.unshear();

        assert!(!view.is_sheared());
        assert_eq!(view.view_to_full(), before_forward);
        assert_eq!(view.full_to_view(), before_backward);
        assert_eq!(view.num_tips(5).unwrap(), 3);
    }

    #[test]
    fn traversals_walk_the_active_tree_in_full_keys() {
        let mut view = TreeView::new(example_tree());
        assert_eq!(
            view.postorder_keys().collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5, 6, 7]
        );
        assert_eq!(
            view.preorder_keys().collect::<Vec<_>>(),
            vec![7, 5, 1, 4, 2, 3, 6]
        );

        view.shear(&keep(&["1", "6"])).unwrap();
        assert_eq!(view.postorder_keys().collect::<Vec<_>>(), vec![1, 5, 6, 7]);
        assert_eq!(view.preorder_keys().collect::<Vec<_>>(), vec![7, 5, 1, 6]);
    }

    #[test]
    fn mapping_tables_are_mutual_inverses() {
        let mut view = TreeView::new(example_tree());
        view.shear(&keep(&["2", "3"])).unwrap();
        for (reduced, &full) in view.view_to_full().iter().enumerate().skip(1) {
            assert_eq!(view.full_to_view()[full], Some(reduced));
        }
        for (full, reduced) in view.full_to_view().iter().enumerate() {
            if let Some(reduced) = reduced {
                assert_eq!(view.view_to_full()[*reduced], full);
            }
        }
    }

    #[test]
    fn sibling_hops_skip_pruned_siblings() {
        let mut view = TreeView::new(example_tree());
        // Keep "2" and "6": "internal" keeps only child "4", which keeps
        // only child "2".
        view.shear(&keep(&["2", "6"])).unwrap();
        assert_eq!(view.next_sibling(4).unwrap(), None);
        assert_eq!(view.prev_sibling(4).unwrap(), None);
        assert_eq!(view.children(5).unwrap(), vec![4]);
        assert_eq!(view.parent(2).unwrap(), Some(4));
        assert_eq!(view.is_leaf(2).unwrap(), true);
        assert_eq!(view.is_leaf(4).unwrap(), false);
        assert_eq!(view.depth(2).unwrap(), 4);
        assert_eq!(view.length(4).unwrap(), Some(3.0));
    }
}
