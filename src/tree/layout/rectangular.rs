use log::warn;

use super::{LayoutParams, RectangularLayout};
use crate::tree::BpTree;

/// Classic left-to-right phylogram.
///
/// One postorder pass hands each leaf the next slot on the y axis and gives
/// every internal node the mean of its children's y. One preorder pass
/// accumulates x from branch lengths. The result is scaled to the target
/// box and shifted so the root sits at exactly (0, 0).
pub(super) fn build(tree: &BpTree, params: &LayoutParams) -> RectangularLayout {
    let n = tree.num_nodes();
    let tips = tree.num_leaves();
    if tips < 2 {
        warn!("rectangular layout of a {tips}-tip tree collapses to a single line");
    }
    let spacing = params.height / tips.saturating_sub(1).max(1) as f64;

    let mut x = vec![0.0f64; n + 1];
    let mut y = vec![0.0f64; n + 1];

    let mut next_tip = 0usize;
    for rank in tree.postorder_ranks() {
        let open = tree.open(tree.postorder_select(rank));
        if tree.is_leaf(open) {
            y[rank] = next_tip as f64 * spacing;
            next_tip += 1;
        } else {
            let mut sum = 0.0;
            let mut count = 0usize;
            for child in tree.children(open) {
                sum += y[tree.postorder(child)];
                count += 1;
            }
            // count >= 1: internal nodes always have a child.
            y[rank] = sum / count as f64;
        }
    }

    let mut max_x = 0.0f64;
    for pre in tree.preorder_ranks().skip(1) {
        let position = tree.preorder_select(pre);
        let Some(parent) = tree.parent(position) else {
            continue;
        };
        let rank = tree.postorder(position);
        x[rank] = x[tree.postorder(parent)] + params.branch_lengths.resolve(tree, position);
        max_x = max_x.max(x[rank]);
    }

    if max_x > 0.0 {
        let scale = params.width / max_x;
        for value in &mut x[1..] {
            *value *= scale;
        }
    }

    // The root's x is already 0; re-center y on it.
    let root_y = y[n];
    for value in &mut y[1..] {
        *value -= root_y;
    }

    RectangularLayout { x, y }
}

#[cfg(test)]
mod tests {
    use super::super::{BranchLengthPolicy, LayoutParams};
    use super::*;
    use crate::tree::testutil::example_tree;

    fn params(width: f64, height: f64) -> LayoutParams {
        LayoutParams {
            width,
            height,
            branch_lengths: BranchLengthPolicy::Uniform,
            ..LayoutParams::default()
        }
    }

    #[test]
    fn root_lands_exactly_on_the_origin() {
        let tree = example_tree();
        let layout = build(&tree, &params(100.0, 90.0));
        let root = tree.num_nodes();
        assert_eq!(layout.x[root], 0.0);
        assert_eq!(layout.y[root], 0.0);
    }

    #[test]
    fn leaf_rows_are_whole_spacing_steps_apart() {
        let tree = example_tree();
        let height = 90.0;
        let spacing = height / 3.0;
        let layout = build(&tree, &params(100.0, height));

        // Leaves in postorder: "1", "2", "3", "6" at ranks 1, 2, 3, 6.
        let rows: Vec<f64> = [1, 2, 3, 6].iter().map(|&r| layout.y[r]).collect();
        for pair in rows.windows(2) {
            let steps = (pair[1] - pair[0]) / spacing;
            assert!(
                (steps - steps.round()).abs() < 1e-9,
                "rows {pair:?} are not whole steps apart"
            );
        }
        // Successive leaves sit exactly one row apart.
        assert_eq!(rows[1] - rows[0], spacing);
        assert_eq!(rows[3] - rows[2], spacing);
    }

    #[test]
    fn internal_rows_average_their_children() {
        let tree = example_tree();
        let layout = build(&tree, &params(100.0, 90.0));
        // "4" (rank 4) spans "2" (2) and "3" (3); "internal" (5) spans
        // "1" (1) and "4"; the root (7) spans "internal" and "6" (6).
        assert_eq!(layout.y[4], (layout.y[2] + layout.y[3]) / 2.0);
        assert_eq!(layout.y[5], (layout.y[1] + layout.y[4]) / 2.0);
        assert_eq!(layout.y[7], (layout.y[5] + layout.y[6]) / 2.0);
    }

    #[test]
    fn deepest_tip_reaches_the_target_width() {
        let tree = example_tree();
        let layout = build(&tree, &params(120.0, 90.0));
        let deepest = layout.x[1..]
            .iter()
            .fold(0.0f64, |best, &value| best.max(value));
        assert!((deepest - 120.0).abs() < 1e-9);
        // Uniform lengths: tips "2"/"3" sit three branches from the root.
        assert_eq!(layout.x[2], 120.0);
        assert_eq!(layout.x[6], 40.0);
    }

    #[test]
    fn actual_lengths_change_the_x_axis_only() {
        let tree = example_tree();
        let uniform = build(&tree, &params(100.0, 90.0));
        let actual = build(
            &tree,
            &LayoutParams {
                width: 100.0,
                height: 90.0,
                ..LayoutParams::default()
            },
        );
        assert_eq!(uniform.y, actual.y);
        assert_ne!(uniform.x, actual.x);
    }
}
