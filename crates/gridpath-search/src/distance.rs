use gridpath_core::Point;

/// Cost of one orthogonal step.
pub const ORTHOGONAL_COST: i32 = 10;
/// Cost of one diagonal step, 10·√2 rounded.
pub const DIAGONAL_COST: i32 = 14;

/// Octile distance between two points on the 14:10 metric.
///
/// Used both as the exact edge cost between adjacent cells and as the
/// heuristic to the target, which keeps the heuristic consistent.
#[inline]
pub fn octile(a: Point, b: Point) -> i32 {
    let (dx, dy) = a.abs_diff(b);
    DIAGONAL_COST * dx.min(dy) + ORTHOGONAL_COST * (dx - dy).abs()
}

/// Total octile cost of walking `points` in order.
pub fn walk_cost(points: &[Point]) -> i32 {
    points.windows(2).map(|w| octile(w[0], w[1])).sum()
}
