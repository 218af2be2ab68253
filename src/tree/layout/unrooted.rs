use std::f64::consts::{PI, TAU};

use itertools::Itertools;

use super::{tip_counts, LayoutParams, UnrootedLayout};
use crate::tree::BpTree;

const MIN_EXTENT: f64 = 1e-9;

/// Equal-angle heuristic: every leaf owns a fixed slice of the circle and
/// each subtree fans out inside the wedge its tip count buys it.
///
/// The shape a given tree produces depends on how branch lengths are
/// distributed, so it will not fit a fixed box at every orientation. A small
/// discrete search over global rotations (evenly spaced across half a turn;
/// a full turn repeats the same boxes mirrored) keeps whichever orientation
/// admits the largest scale, and the final coordinates are produced once
/// more at that winner. This is an approximation, not an exact equal-daylight
/// layout.
pub(super) fn build(tree: &BpTree, params: &LayoutParams) -> UnrootedLayout {
    let n = tree.num_nodes();
    let slice = TAU / tree.num_leaves() as f64;
    let counts = tip_counts(tree);

    let trials = params.rotation_trials.max(1);
    let mut best_rotation = 0.0f64;
    let mut best_scale = f64::NEG_INFINITY;
    for trial in 0..trials {
        let rotation = trial as f64 * PI / trials as f64;
        let (x, y) = place(tree, &counts, slice, rotation, params);
        let scale = fitting_scale(&x, &y, params);
        if scale > best_scale {
            best_scale = scale;
            best_rotation = rotation;
        }
    }

    let (mut x, mut y) = place(tree, &counts, slice, best_rotation, params);
    let scale = fitting_scale(&x, &y, params);
    let (cx, cy) = bounds_center(&x, &y);
    for rank in 1..=n {
        x[rank] = (x[rank] - cx) * scale;
        y[rank] = (y[rank] - cy) * scale;
    }

    // Edge start points are the parent's final position; the root's edge
    // degenerates to its own point.
    let mut x0 = vec![0.0f64; n + 1];
    let mut y0 = vec![0.0f64; n + 1];
    for rank in tree.postorder_ranks() {
        let open = tree.open(tree.postorder_select(rank));
        match tree.parent(open) {
            Some(parent) => {
                let parent_rank = tree.postorder(parent);
                x0[rank] = x[parent_rank];
                y0[rank] = y[parent_rank];
            }
            None => {
                x0[rank] = x[rank];
                y0[rank] = y[rank];
            }
        }
    }

    UnrootedLayout {
        x0,
        y0,
        x1: x,
        y1: y,
    }
}

/// One reverse-postorder placement pass at a fixed global rotation.
///
/// Visiting parents before children lets every node step from its parent's
/// position along the bisector of its own wedge; a per-node cursor tracks
/// how much of the parent's wedge earlier-placed siblings already consumed.
fn place(
    tree: &BpTree,
    counts: &[usize],
    slice: f64,
    rotation: f64,
    params: &LayoutParams,
) -> (Vec<f64>, Vec<f64>) {
    let n = tree.num_nodes();
    let mut x = vec![0.0f64; n + 1];
    let mut y = vec![0.0f64; n + 1];
    let mut cursor = vec![0.0f64; n + 1];
    cursor[n] = rotation - counts[n] as f64 * slice / 2.0;

    for rank in (1..n).rev() {
        let open = tree.open(tree.postorder_select(rank));
        let Some(parent) = tree.parent(open) else {
            continue;
        };
        let parent_rank = tree.postorder(parent);
        let span = counts[rank] as f64 * slice;
        let wedge_start = cursor[parent_rank];
        let direction = wedge_start + span / 2.0;
        cursor[parent_rank] = wedge_start + span;
        cursor[rank] = wedge_start;

        let length = params.branch_lengths.resolve(tree, open);
        x[rank] = x[parent_rank] + length * direction.cos();
        y[rank] = y[parent_rank] + length * direction.sin();
    }

    (x, y)
}

fn fitting_scale(x: &[f64], y: &[f64], params: &LayoutParams) -> f64 {
    let (width, height) = bounds_extent(x, y);
    (params.width / width.max(MIN_EXTENT)).min(params.height / height.max(MIN_EXTENT))
}

fn bounds_extent(x: &[f64], y: &[f64]) -> (f64, f64) {
    let (min_x, max_x) = x[1..].iter().copied().minmax().into_option().unwrap_or((0.0, 0.0));
    let (min_y, max_y) = y[1..].iter().copied().minmax().into_option().unwrap_or((0.0, 0.0));
    (max_x - min_x, max_y - min_y)
}

fn bounds_center(x: &[f64], y: &[f64]) -> (f64, f64) {
    let (min_x, max_x) = x[1..].iter().copied().minmax().into_option().unwrap_or((0.0, 0.0));
    let (min_y, max_y) = y[1..].iter().copied().minmax().into_option().unwrap_or((0.0, 0.0));
    ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}
