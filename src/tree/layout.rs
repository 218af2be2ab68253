//! Drawing coordinates computed from topology and branch lengths.
//!
//! Every layout is a pure function of (tree, parameters): no state survives
//! a call, and identical inputs give bit-identical output arrays. All
//! per-node arrays are indexed by 1-based postorder rank with slot 0 unused,
//! matching the addressing the rest of the crate hands out.

use crate::tree::BpTree;

mod circular;
mod rectangular;
mod unrooted;

pub(super) const DEFAULT_BRANCH_LENGTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Rectangular,
    Circular,
    Unrooted,
}

/// How branch lengths feed the layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchLengthPolicy {
    /// Use stored lengths, falling back to 1.0 where none was supplied.
    #[default]
    Actual,
    /// Ignore stored lengths; every branch counts as 1.0.
    Uniform,
}

impl BranchLengthPolicy {
    /// Branch length for the node at position `i` under this policy.
    /// Never fails: missing lengths fall back to the default.
    pub fn resolve(self, tree: &BpTree, i: usize) -> f64 {
        match self {
            BranchLengthPolicy::Uniform => DEFAULT_BRANCH_LENGTH,
            BranchLengthPolicy::Actual => tree.length(i).unwrap_or(DEFAULT_BRANCH_LENGTH),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub width: f64,
    pub height: f64,
    pub branch_lengths: BranchLengthPolicy,
    /// Angle of the first tip in the circular layout, radians.
    pub start_angle: f64,
    /// Rotations tried when fitting the unrooted layout; a heuristic knob,
    /// not a constant anything downstream may rely on.
    pub rotation_trials: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
            branch_lengths: BranchLengthPolicy::Actual,
            start_angle: 0.0,
            rotation_trials: 60,
        }
    }
}

/// Node coordinates on a left-to-right rectangular drawing, root at (0, 0).
#[derive(Debug, Clone, PartialEq)]
pub struct RectangularLayout {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Connector between the outermost child branches of an internal node,
/// drawn at the node's own radius around the root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

/// Node coordinates on a circular drawing centered on the root.
///
/// Radius changes discontinuously at the node boundary while the angle stays
/// fixed along the connecting edge, so every non-root node carries a start
/// point at its parent's radius and an end point at its own.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularLayout {
    pub x0: Vec<f64>,
    pub y0: Vec<f64>,
    pub x1: Vec<f64>,
    pub y1: Vec<f64>,
    pub angle: Vec<f64>,
    /// `Some` exactly for non-root internal nodes.
    pub arcs: Vec<Option<Arc>>,
}

/// Node edge endpoints on an unrooted (equal-angle) drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrootedLayout {
    pub x0: Vec<f64>,
    pub y0: Vec<f64>,
    pub x1: Vec<f64>,
    pub y1: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeLayout {
    Rectangular(RectangularLayout),
    Circular(CircularLayout),
    Unrooted(UnrootedLayout),
}

impl TreeLayout {
    /// Computes coordinates for `tree` with the requested algorithm.
    pub fn from_tree(tree: &BpTree, kind: LayoutKind, params: &LayoutParams) -> Self {
        match kind {
            LayoutKind::Rectangular => Self::Rectangular(rectangular::build(tree, params)),
            LayoutKind::Circular => Self::Circular(circular::build(tree, params)),
            LayoutKind::Unrooted => Self::Unrooted(unrooted::build(tree, params)),
        }
    }
}

/// Leaf-count-weighted subtree sizes by postorder rank, shared by the
/// layouts that apportion angles.
fn tip_counts(tree: &BpTree) -> Vec<usize> {
    let mut counts = vec![0usize; tree.num_nodes() + 1];
    for rank in tree.postorder_ranks() {
        let position = tree.postorder_select(rank);
        let open = tree.open(position);
        counts[rank] = if tree.is_leaf(open) {
            1
        } else {
            tree.children(open)
                .map(|child| counts[tree.postorder(child)])
                .sum()
        };
    }
    counts
}
