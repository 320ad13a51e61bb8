//! Center of gravity for a set of touch points.

use super::Point;

/// Polygons whose area is below this fraction of their bounding square are
/// treated as degenerate (collinear, or self-intersecting with the lobes
/// cancelling out).
const MIN_AREA_RATIO: f64 = 1e-2;

/// Anchor point for a multi-touch gesture.
///
/// One point is its own centroid and two points use their midpoint. Three or
/// more points are treated as a polygon in contact order and the
/// area-weighted centroid is returned:
///
/// ```text
/// A  = 1/2 * Σ (x_i * y_{i+1} - x_{i+1} * y_i)
/// Cx = 1/(6A) * Σ (x_i + x_{i+1}) * (x_i * y_{i+1} - x_{i+1} * y_i)
/// Cy = 1/(6A) * Σ (y_i + y_{i+1}) * (x_i * y_{i+1} - x_{i+1} * y_i)
/// ```
///
/// Polygons with an area that is tiny next to their extent fall back to the
/// arithmetic mean, as does any result outside the points' bounding box.
/// Returns `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    match points {
        [] => None,
        [p] => Some(*p),
        [a, b] => Some(Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)),
        _ => Some(polygon_centroid(points).unwrap_or_else(|| mean(points))),
    }
}

fn polygon_centroid(points: &[Point]) -> Option<Point> {
    // relative to the first point to keep the cross products small
    let origin = points[0];
    let (mut min_x, mut min_y) = (origin.x, origin.y);
    let (mut max_x, mut max_y) = (origin.x, origin.y);
    let mut area2 = 0.0;
    let mut moment_x = 0.0;
    let mut moment_y = 0.0;

    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let (px, py) = (p.x - origin.x, p.y - origin.y);
        let (qx, qy) = (q.x - origin.x, q.y - origin.y);
        let cross = px * qy - qx * py;
        area2 += cross;
        moment_x += (px + qx) * cross;
        moment_y += (py + qy) * cross;

        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let area = area2 / 2.0;
    let extent = (max_x - min_x).max(max_y - min_y);
    if area.abs() < MIN_AREA_RATIO * extent * extent || area.abs() < f64::MIN_POSITIVE {
        return None;
    }

    let c = Point::new(
        origin.x + moment_x / (6.0 * area),
        origin.y + moment_y / (6.0 * area),
    );
    let inside = (min_x..=max_x).contains(&c.x) && (min_y..=max_y).contains(&c.y);
    inside.then_some(c)
}

fn mean(points: &[Point]) -> Point {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}
