//! Canonical corner ordering for quadrilaterals.
//!
//! Detection and hand-placed points both deliver corners in arbitrary
//! order; rectification needs them as TL, TR, BR, BL. The tie-break is
//! purely geometric with no randomness: split into a left and a right
//! pair by x, then sort each pair by y.

use crate::types::{OrderedQuad, Point, Quad};

/// Order four arbitrary corner points canonically (TL, TR, BR, BL).
///
/// Pure and total for non-degenerate input. Idempotent, and invariant
/// under any permutation of the same four points.
#[must_use = "returns the canonically ordered quad"]
pub fn order_corners(quad: Quad) -> OrderedQuad {
    let mut by_x = *quad.points();
    by_x.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut left = [by_x[0], by_x[1]];
    let mut right = [by_x[2], by_x[3]];
    left.sort_by(|a, b| a.y.total_cmp(&b.y));
    right.sort_by(|a, b| a.y.total_cmp(&b.y));

    OrderedQuad::from_canonical([left[0], right[0], right[1], left[1]])
}
