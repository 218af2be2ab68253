use std::f64::consts::TAU;

use itertools::Itertools;

use super::{Arc, CircularLayout, LayoutParams};
use crate::tree::BpTree;

/// Fan drawing centered on the root.
///
/// Angles are assigned the way the rectangular layout assigns rows: leaves
/// step around the circle, internal nodes take the mean of their children.
/// Radii accumulate branch lengths from the root the way the rectangular
/// layout accumulates x, then scale so the fan fits the target box.
pub(super) fn build(tree: &BpTree, params: &LayoutParams) -> CircularLayout {
    let n = tree.num_nodes();
    let tips = tree.num_leaves();
    let step = TAU / tips as f64;

    let mut angle = vec![0.0f64; n + 1];
    let mut radius = vec![0.0f64; n + 1];

    let mut next_tip = 0usize;
    for rank in tree.postorder_ranks() {
        let open = tree.open(tree.postorder_select(rank));
        if tree.is_leaf(open) {
            angle[rank] = params.start_angle + next_tip as f64 * step;
            next_tip += 1;
        } else {
            let mut sum = 0.0;
            let mut count = 0usize;
            for child in tree.children(open) {
                sum += angle[tree.postorder(child)];
                count += 1;
            }
            angle[rank] = sum / count as f64;
        }
    }

    let mut max_radius = 0.0f64;
    for pre in tree.preorder_ranks().skip(1) {
        let position = tree.preorder_select(pre);
        let Some(parent) = tree.parent(position) else {
            continue;
        };
        let rank = tree.postorder(position);
        radius[rank] =
            radius[tree.postorder(parent)] + params.branch_lengths.resolve(tree, position);
        max_radius = max_radius.max(radius[rank]);
    }
    if max_radius > 0.0 {
        let scale = params.width.min(params.height) / (2.0 * max_radius);
        for value in &mut radius[1..] {
            *value *= scale;
        }
    }

    let mut x0 = vec![0.0f64; n + 1];
    let mut y0 = vec![0.0f64; n + 1];
    let mut x1 = vec![0.0f64; n + 1];
    let mut y1 = vec![0.0f64; n + 1];
    let mut arcs: Vec<Option<Arc>> = vec![None; n + 1];

    for rank in tree.postorder_ranks() {
        let open = tree.open(tree.postorder_select(rank));
        let Some(parent) = tree.parent(open) else {
            continue;
        };
        // The edge runs at the node's own angle from the parent's radius to
        // the node's, so radius jumps at the boundary while angle holds.
        let parent_radius = radius[tree.postorder(parent)];
        let (sin, cos) = angle[rank].sin_cos();
        x0[rank] = parent_radius * cos;
        y0[rank] = parent_radius * sin;
        x1[rank] = radius[rank] * cos;
        y1[rank] = radius[rank] * sin;

        if !tree.is_leaf(open) {
            let bounds = tree
                .children(open)
                .map(|child| angle[tree.postorder(child)])
                .minmax()
                .into_option();
            if let Some((start_angle, end_angle)) = bounds {
                arcs[rank] = Some(Arc {
                    radius: radius[rank],
                    start_angle,
                    end_angle,
                });
            }
        }
    }

    CircularLayout {
        x0,
        y0,
        x1,
        y1,
        angle,
        arcs,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{BranchLengthPolicy, LayoutKind, LayoutParams, TreeLayout};
    use super::*;
    use crate::tree::testutil::example_tree;

    fn params() -> LayoutParams {
        LayoutParams {
            width: 200.0,
            height: 200.0,
            branch_lengths: BranchLengthPolicy::Uniform,
            ..LayoutParams::default()
        }
    }

    #[test]
    fn leaf_angles_step_evenly_and_internals_average() {
        let tree = example_tree();
        let layout = build(&tree, &params());
        let step = TAU / 4.0;

        // Leaves in postorder: ranks 1, 2, 3, 6.
        assert_eq!(layout.angle[1], 0.0);
        assert_eq!(layout.angle[2], step);
        assert_eq!(layout.angle[3], 2.0 * step);
        assert_eq!(layout.angle[6], 3.0 * step);
        assert_eq!(layout.angle[4], (layout.angle[2] + layout.angle[3]) / 2.0);
        assert_eq!(layout.angle[5], (layout.angle[1] + layout.angle[4]) / 2.0);
    }

    #[test]
    fn start_angle_rotates_the_whole_fan() {
        let tree = example_tree();
        let turned = LayoutParams {
            start_angle: 1.0,
            ..params()
        };
        let base = build(&tree, &params());
        let rotated = build(&tree, &turned);
        for rank in tree.postorder_ranks() {
            assert!((rotated.angle[rank] - base.angle[rank] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn edges_hold_their_angle_while_radius_jumps() {
        let tree = example_tree();
        let layout = build(&tree, &params());
        for rank in 1..tree.num_nodes() {
            let start = (layout.x0[rank], layout.y0[rank]);
            let end = (layout.x1[rank], layout.y1[rank]);
            let start_r = (start.0 * start.0 + start.1 * start.1).sqrt();
            let end_r = (end.0 * end.0 + end.1 * end.1).sqrt();
            assert!(end_r > start_r - 1e-9, "edge of rank {rank} points inward");
            // Both endpoints lie on the node's own ray.
            let expected = layout.angle[rank];
            if start_r > 1e-9 {
                let got = start.1.atan2(start.0);
                assert!((angle_diff(got, expected)).abs() < 1e-9);
            }
            let got = end.1.atan2(end.0);
            assert!((angle_diff(got, expected)).abs() < 1e-9);
        }
    }

    fn angle_diff(a: f64, b: f64) -> f64 {
        let mut d = a - b;
        while d > std::f64::consts::PI {
            d -= TAU;
        }
        while d < -std::f64::consts::PI {
            d += TAU;
        }
        d
    }

    #[test]
    fn fan_fits_the_target_box() {
        let tree = example_tree();
        let layout = build(&tree, &params());
        let limit = 100.0 + 1e-9;
        for rank in tree.postorder_ranks() {
            let r = (layout.x1[rank].powi(2) + layout.y1[rank].powi(2)).sqrt();
            assert!(r <= limit, "rank {rank} leaves the 200x200 box");
        }
    }

    #[test]
    fn arcs_cover_non_root_internal_nodes_only() {
        let tree = example_tree();
        let layout = build(&tree, &params());
        // Internal non-root nodes of the example: "4" (4), "internal" (5).
        for rank in tree.postorder_ranks() {
            assert_eq!(layout.arcs[rank].is_some(), rank == 4 || rank == 5);
        }
        let arc = layout.arcs[4].expect("arc on an internal node");
        assert_eq!(arc.start_angle, layout.angle[2]);
        assert_eq!(arc.end_angle, layout.angle[3]);
        let own_radius = (layout.x1[4].powi(2) + layout.y1[4].powi(2)).sqrt();
        assert!((arc.radius - own_radius).abs() < 1e-9);
    }

    #[test]
    fn dispatcher_routes_to_the_circular_build() {
        let tree = example_tree();
        let via_dispatch = TreeLayout::from_tree(&tree, LayoutKind::Circular, &params());
        assert_eq!(via_dispatch, TreeLayout::Circular(build(&tree, &params())));
    }
}
