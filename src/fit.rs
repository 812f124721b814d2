use crate::config::{PathMode, TraceConfig};
use crate::contour::Contour;
use crate::document::{PathSegment, Point, SubPath};

/// Tolerance for collapsing pixel staircase steps. One-pixel jaggies
/// deviate sqrt(2)/2 from their chord while a corner of a 2-pixel feature
/// protrudes sqrt(2), so 0.8 collapses the former and keeps the latter.
const STAIRCASE_EPSILON: f64 = 0.8;

/// Floor for the curve-fit error tolerance so sub-pixel noise never forces
/// endless subdivision.
const MIN_FIT_TOLERANCE: f64 = 0.5;

const MAX_SPLIT_DEPTH: usize = 16;

/// Convert one closed contour into a closed sub-path per the configured
/// mode and thresholds.
pub fn fit_contour(contour: &Contour, config: &TraceConfig) -> SubPath {
    let raw: Vec<Point> = contour
        .iter()
        .map(|&(x, y)| Point::new(f64::from(x), f64::from(y)))
        .collect();

    let mut points = remove_collinear(&raw);
    if config.length_threshold > 0.0 {
        points = rdp_closed(&points, config.length_threshold.min(STAIRCASE_EPSILON));
        // Polygon mode applies the full tolerance between pinned corners.
        // Spline mode keeps the dense polyline; the curve fit needs the
        // intermediate vertices to measure its error against.
        if config.mode == PathMode::Polygon && config.length_threshold > STAIRCASE_EPSILON {
            let corners = detect_corners(&points, f64::from(config.corner_threshold));
            points = if corners.len() >= 2 {
                refine_between_corners(&points, &corners, config.length_threshold)
            } else {
                rdp_closed(&points, config.length_threshold)
            };
        }
    }

    match config.mode {
        PathMode::Polygon => polygon_subpath(&points),
        PathMode::Spline => spline_subpath(&points, config),
    }
}

/// Drop vertices that sit exactly on the line through their neighbors.
/// Never reduces a loop below 3 vertices.
fn remove_collinear(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n <= 3 {
        return points.to_vec();
    }
    let mut kept = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        let cross = (cur.x - prev.x) * (next.y - prev.y) - (cur.y - prev.y) * (next.x - prev.x);
        if cross.abs() > f64::EPSILON {
            kept.push(cur);
        }
    }
    if kept.len() < 3 {
        return points.to_vec();
    }
    kept
}

/// Ramer-Douglas-Peucker on a closed loop, anchored at the two
/// farthest-apart vertices so the result is independent of where the walk
/// happened to start. Guarantees at least 3 output vertices.
fn rdp_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, 0);
    let b = farthest_from(points, a);
    let (a, b) = (a.min(b), a.max(b));

    let mut out = Vec::new();
    rdp_open(points, a, b, epsilon, &mut out);
    out.pop();
    let wrap: Vec<usize> = (b..n).chain(0..=a).collect();
    let mut second = Vec::new();
    rdp_open_indices(points, &wrap, epsilon, &mut second);
    second.pop();
    out.extend(second);

    let mut result: Vec<Point> = out.into_iter().map(|i| points[i]).collect();
    if result.len() < 3 {
        // Everything collapsed onto the anchor chord; revive the vertex
        // farthest from it to keep the loop two-dimensional. Ascending ring
        // order preserves the loop's winding.
        let worst = (0..n)
            .filter(|&i| i != a && i != b)
            .max_by(|&i, &j| {
                perpendicular_distance(points[i], points[a], points[b])
                    .partial_cmp(&perpendicular_distance(points[j], points[a], points[b]))
                    .expect("finite distances")
            })
            .unwrap_or(a);
        let mut indices = vec![a, worst, b];
        indices.sort_unstable();
        indices.dedup();
        if indices.len() < 3 {
            return points.to_vec();
        }
        result = indices.into_iter().map(|i| points[i]).collect();
    }
    result
}

fn farthest_from(points: &[Point], origin: usize) -> usize {
    let mut best = origin;
    let mut best_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(&points[origin]);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// RDP over the index range `[from, to]` of the ring; emits kept indices
/// including both endpoints.
fn rdp_open(points: &[Point], from: usize, to: usize, epsilon: f64, out: &mut Vec<usize>) {
    let indices: Vec<usize> = (from..=to).collect();
    rdp_open_indices(points, &indices, epsilon, out);
}

fn rdp_open_indices(points: &[Point], indices: &[usize], epsilon: f64, out: &mut Vec<usize>) {
    if indices.len() <= 2 {
        out.extend_from_slice(indices);
        return;
    }
    let first = indices[0];
    let last = indices[indices.len() - 1];
    let mut worst = 0usize;
    let mut worst_dist = -1.0;
    for (k, &i) in indices.iter().enumerate().skip(1).take(indices.len() - 2) {
        let d = perpendicular_distance(points[i], points[first], points[last]);
        if d > worst_dist {
            worst_dist = d;
            worst = k;
        }
    }
    if worst_dist > epsilon {
        rdp_open_indices(points, &indices[..=worst], epsilon, out);
        out.pop();
        rdp_open_indices(points, &indices[worst..], epsilon, out);
    } else {
        out.push(first);
        out.push(last);
    }
}

fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let len = a.distance(&b);
    if len < f64::EPSILON {
        return p.distance(&a);
    }
    ((b.x - a.x) * (a.y - p.y) - (a.x - p.x) * (b.y - a.y)).abs() / len
}

/// Indices of vertices whose turn deviates from straight by more than
/// `corner_threshold` degrees.
fn detect_corners(points: &[Point], corner_threshold: f64) -> Vec<usize> {
    let n = points.len();
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            turn_angle(prev, points[i], next) > corner_threshold
        })
        .collect()
}

/// Deviation from straight-ahead at `cur`, in degrees.
fn turn_angle(prev: Point, cur: Point, next: Point) -> f64 {
    let v1 = (cur.x - prev.x, cur.y - prev.y);
    let v2 = (next.x - cur.x, next.y - cur.y);
    let n1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let n2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if n1 < f64::EPSILON || n2 < f64::EPSILON {
        return 0.0;
    }
    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Re-simplify each run between consecutive corners with the full
/// tolerance. Corners are pinned, so a genuine corner never disappears no
/// matter how large the tolerance.
fn refine_between_corners(points: &[Point], corners: &[usize], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    let mut refined = Vec::new();
    for (k, &start) in corners.iter().enumerate() {
        let end = corners[(k + 1) % corners.len()];
        let indices: Vec<usize> = if start < end {
            (start..=end).collect()
        } else {
            (start..n).chain(0..=end).collect()
        };
        let mut kept = Vec::new();
        rdp_open_indices(points, &indices, epsilon, &mut kept);
        kept.pop();
        refined.extend(kept.into_iter().map(|i| points[i]));
    }
    if refined.len() < 3 {
        return points.to_vec();
    }
    refined
}

fn polygon_subpath(points: &[Point]) -> SubPath {
    SubPath {
        start: points[0],
        segments: points[1..]
            .iter()
            .map(|&to| PathSegment::Line { to })
            .collect(),
    }
}

/// Fit smooth curve sections between corners. Cornerless loops split at
/// their vertical extremes so a closed blob becomes at least two arcs.
fn spline_subpath(points: &[Point], config: &TraceConfig) -> SubPath {
    let corners = detect_corners(points, f64::from(config.corner_threshold));
    let splits = if corners.len() >= 2 {
        corners
    } else {
        extremal_splits(points, &corners)
    };

    let tolerance = config.length_threshold.max(MIN_FIT_TOLERANCE);
    let mut segments = Vec::new();
    for (k, &start) in splits.iter().enumerate() {
        let end = splits[(k + 1) % splits.len()];
        let section = cyclic_section(points, start, end);
        for piece in splice_sections(&section, f64::from(config.splice_threshold)) {
            fit_section(
                &piece,
                tolerance,
                config.max_iterations,
                MAX_SPLIT_DEPTH,
                &mut segments,
            );
        }
    }

    SubPath {
        start: points[splits[0]],
        segments,
    }
}

/// Two split points for a loop with fewer than two corners: the topmost
/// and bottommost vertices (plus the lone corner when there is one).
fn extremal_splits(points: &[Point], corners: &[usize]) -> Vec<usize> {
    let mut top = 0usize;
    let mut bottom = 0usize;
    for (i, p) in points.iter().enumerate() {
        if (p.y, p.x) < (points[top].y, points[top].x) {
            top = i;
        }
        if (p.y, p.x) > (points[bottom].y, points[bottom].x) {
            bottom = i;
        }
    }
    let mut splits: Vec<usize> = corners.iter().copied().chain([top, bottom]).collect();
    splits.sort_unstable();
    splits.dedup();
    if splits.len() < 2 {
        // Fully degenerate loop; halve it arbitrarily but deterministically.
        splits = vec![0, points.len() / 2];
        splits.dedup();
    }
    splits
}

/// The vertices from index `start` to `end` walking forward around the
/// ring, inclusive of both; `start == end` yields the full cycle.
fn cyclic_section(points: &[Point], start: usize, end: usize) -> Vec<Point> {
    let n = points.len();
    let mut section = vec![points[start]];
    let mut i = (start + 1) % n;
    loop {
        section.push(points[i]);
        if i == end {
            break;
        }
        i = (i + 1) % n;
    }
    section
}

/// Split a section where accumulated turning exceeds the splice budget, so
/// one cubic never has to bend through more than `splice_threshold`
/// degrees.
fn splice_sections(section: &[Point], splice_threshold: f64) -> Vec<Vec<Point>> {
    if section.len() <= 2 {
        return vec![section.to_vec()];
    }
    let mut pieces = Vec::new();
    let mut current = vec![section[0], section[1]];
    let mut accumulated = 0.0;
    for i in 1..section.len() - 1 {
        accumulated += turn_angle(section[i - 1], section[i], section[i + 1]);
        if accumulated > splice_threshold {
            pieces.push(std::mem::take(&mut current));
            let anchor = *pieces.last().and_then(|p: &Vec<Point>| p.last()).expect("non-empty piece");
            current = vec![anchor];
            accumulated = 0.0;
        }
        current.push(section[i + 1]);
    }
    if current.len() >= 2 {
        pieces.push(current);
    }
    pieces
}

/// Least-squares cubic fit of one open section, subdividing at the worst
/// point when the error stays above tolerance.
fn fit_section(
    section: &[Point],
    tolerance: f64,
    max_iterations: usize,
    depth: usize,
    out: &mut Vec<PathSegment>,
) {
    if section.len() < 2 {
        return;
    }
    if section.len() == 2 {
        out.push(PathSegment::Line { to: section[1] });
        return;
    }

    let t0 = unit_tangent(section[0], section[1]);
    let t1 = unit_tangent(section[section.len() - 1], section[section.len() - 2]);
    let mut params = chord_length_params(section);

    let mut best: Option<([Point; 4], f64, usize)> = None;
    for _ in 0..max_iterations.max(1) {
        let bezier = generate_bezier(section, &params, t0, t1);
        let (error, worst) = max_fit_error(section, &bezier, &params);
        if best.as_ref().is_none_or(|(_, e, _)| error < *e) {
            best = Some((bezier, error, worst));
        }
        if error <= tolerance {
            break;
        }
        reparameterize(section, &bezier, &mut params);
    }

    let (bezier, error, worst) = best.expect("at least one fit attempt");
    if error <= tolerance || depth == 0 {
        out.push(PathSegment::Cubic {
            c1: bezier[1],
            c2: bezier[2],
            to: bezier[3],
        });
        return;
    }

    let split = worst.clamp(1, section.len() - 2);
    fit_section(&section[..=split], tolerance, max_iterations, depth - 1, out);
    fit_section(&section[split..], tolerance, max_iterations, depth - 1, out);
}

fn unit_tangent(from: Point, toward: Point) -> Point {
    let dx = toward.x - from.x;
    let dy = toward.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        Point::new(0.0, 0.0)
    } else {
        Point::new(dx / len, dy / len)
    }
}

fn chord_length_params(section: &[Point]) -> Vec<f64> {
    let mut params = vec![0.0];
    for pair in section.windows(2) {
        let last = *params.last().expect("seeded");
        params.push(last + pair[0].distance(&pair[1]));
    }
    let total = *params.last().expect("seeded");
    if total > f64::EPSILON {
        for u in params.iter_mut() {
            *u /= total;
        }
    }
    params
}

/// Schneider-style least squares for the two handle lengths, with the
/// Wu/Barsky third-of-chord fallback when the system degenerates.
fn generate_bezier(section: &[Point], params: &[f64], t0: Point, t1: Point) -> [Point; 4] {
    let first = section[0];
    let last = section[section.len() - 1];

    let mut c = [[0.0f64; 2]; 2];
    let mut x = [0.0f64; 2];
    for (p, &u) in section.iter().zip(params) {
        let b0 = (1.0 - u).powi(3);
        let b1 = 3.0 * u * (1.0 - u).powi(2);
        let b2 = 3.0 * u * u * (1.0 - u);
        let b3 = u.powi(3);
        let a0 = Point::new(t0.x * b1, t0.y * b1);
        let a1 = Point::new(t1.x * b2, t1.y * b2);
        c[0][0] += a0.x * a0.x + a0.y * a0.y;
        c[0][1] += a0.x * a1.x + a0.y * a1.y;
        c[1][1] += a1.x * a1.x + a1.y * a1.y;
        let base_x = first.x * (b0 + b1) + last.x * (b2 + b3);
        let base_y = first.y * (b0 + b1) + last.y * (b2 + b3);
        let residual = Point::new(p.x - base_x, p.y - base_y);
        x[0] += a0.x * residual.x + a0.y * residual.y;
        x[1] += a1.x * residual.x + a1.y * residual.y;
    }
    c[1][0] = c[0][1];

    let det = c[0][0] * c[1][1] - c[0][1] * c[1][0];
    let chord = first.distance(&last);
    let (mut alpha0, mut alpha1) = if det.abs() > f64::EPSILON {
        (
            (x[0] * c[1][1] - x[1] * c[0][1]) / det,
            (c[0][0] * x[1] - c[1][0] * x[0]) / det,
        )
    } else {
        (chord / 3.0, chord / 3.0)
    };
    let limit = chord.max(f64::EPSILON);
    if alpha0 <= f64::EPSILON || !alpha0.is_finite() || alpha0 > 4.0 * limit {
        alpha0 = chord / 3.0;
    }
    if alpha1 <= f64::EPSILON || !alpha1.is_finite() || alpha1 > 4.0 * limit {
        alpha1 = chord / 3.0;
    }

    [
        first,
        Point::new(first.x + t0.x * alpha0, first.y + t0.y * alpha0),
        Point::new(last.x + t1.x * alpha1, last.y + t1.y * alpha1),
        last,
    ]
}

fn bezier_point(b: &[Point; 4], u: f64) -> Point {
    let v = 1.0 - u;
    let b0 = v * v * v;
    let b1 = 3.0 * u * v * v;
    let b2 = 3.0 * u * u * v;
    let b3 = u * u * u;
    Point::new(
        b[0].x * b0 + b[1].x * b1 + b[2].x * b2 + b[3].x * b3,
        b[0].y * b0 + b[1].y * b1 + b[2].y * b2 + b[3].y * b3,
    )
}

fn max_fit_error(section: &[Point], bezier: &[Point; 4], params: &[f64]) -> (f64, usize) {
    let mut worst = section.len() / 2;
    let mut worst_dist = 0.0;
    for i in 1..section.len() - 1 {
        let d = section[i].distance(&bezier_point(bezier, params[i]));
        if d > worst_dist {
            worst_dist = d;
            worst = i;
        }
    }
    (worst_dist, worst)
}

/// One Newton-Raphson step per interior parameter toward the closest point
/// on the current curve.
fn reparameterize(section: &[Point], bezier: &[Point; 4], params: &mut [f64]) {
    for i in 1..section.len() - 1 {
        let u = params[i];
        let q = bezier_point(bezier, u);
        let q1 = bezier_derivative(bezier, u);
        let q2 = bezier_second_derivative(bezier, u);
        let diff = Point::new(q.x - section[i].x, q.y - section[i].y);
        let numerator = diff.x * q1.x + diff.y * q1.y;
        let denominator = q1.x * q1.x + q1.y * q1.y + diff.x * q2.x + diff.y * q2.y;
        if denominator.abs() > f64::EPSILON {
            params[i] = (u - numerator / denominator).clamp(0.0, 1.0);
        }
    }
    // Parameters must stay monotone for the fit to remain meaningful.
    for i in 1..params.len() {
        if params[i] < params[i - 1] {
            params[i] = params[i - 1];
        }
    }
}

fn bezier_derivative(b: &[Point; 4], u: f64) -> Point {
    let v = 1.0 - u;
    Point::new(
        3.0 * v * v * (b[1].x - b[0].x)
            + 6.0 * v * u * (b[2].x - b[1].x)
            + 3.0 * u * u * (b[3].x - b[2].x),
        3.0 * v * v * (b[1].y - b[0].y)
            + 6.0 * v * u * (b[2].y - b[1].y)
            + 3.0 * u * u * (b[3].y - b[2].y),
    )
}

fn bezier_second_derivative(b: &[Point; 4], u: f64) -> Point {
    let v = 1.0 - u;
    Point::new(
        6.0 * v * (b[2].x - 2.0 * b[1].x + b[0].x) + 6.0 * u * (b[3].x - 2.0 * b[2].x + b[1].x),
        6.0 * v * (b[2].y - 2.0 * b[1].y + b[0].y) + 6.0 * u * (b[3].y - 2.0 * b[2].y + b[1].y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_contour() -> Contour {
        // 2x2 pixel block perimeter with midpoints, as the tracer emits it.
        vec![
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 2),
            (2, 2),
            (2, 1),
            (2, 0),
            (1, 0),
        ]
    }

    fn staircase_contour() -> Contour {
        // A right triangle whose hypotenuse is a unit staircase.
        vec![
            (0, 0),
            (0, 6),
            (6, 6),
            (6, 5),
            (5, 5),
            (5, 4),
            (4, 4),
            (4, 3),
            (3, 3),
            (3, 2),
            (2, 2),
            (2, 1),
            (1, 1),
            (1, 0),
        ]
    }

    fn config(mode: PathMode) -> TraceConfig {
        TraceConfig::default().with_mode(mode)
    }

    fn subpath_vertex_count(sub: &SubPath) -> usize {
        sub.segments.len() + 1
    }

    mod simplification {
        use super::*;

        #[test]
        fn square_keeps_its_four_corners() {
            let sub = fit_contour(&square_contour(), &config(PathMode::Polygon));
            assert_eq!(subpath_vertex_count(&sub), 4);
            for segment in &sub.segments {
                assert!(matches!(segment, PathSegment::Line { .. }));
            }
        }

        #[test]
        fn staircase_collapses_to_triangle() {
            let sub = fit_contour(&staircase_contour(), &config(PathMode::Polygon));
            // The 6 jaggy steps must fold into one hypotenuse.
            assert!(subpath_vertex_count(&sub) <= 4);
        }

        #[test]
        fn zero_length_threshold_only_drops_collinear() {
            let cfg = config(PathMode::Polygon).with_length_threshold(0.0);
            let sub = fit_contour(&staircase_contour(), &cfg);
            // Collinear removal keeps every jag corner: 14 points, none
            // collinear except the long edges' midpoints (already absent).
            assert_eq!(subpath_vertex_count(&sub), 14);
        }

        #[test]
        fn never_fewer_than_three_vertices() {
            let cfg = config(PathMode::Polygon).with_length_threshold(100.0);
            let sub = fit_contour(&square_contour(), &cfg);
            assert!(subpath_vertex_count(&sub) >= 3);
        }

        #[test]
        fn rdp_deviation_bounded_by_epsilon() {
            let raw: Vec<Point> = staircase_contour()
                .iter()
                .map(|&(x, y)| Point::new(f64::from(x), f64::from(y)))
                .collect();
            let epsilon = 0.75;
            let simplified = rdp_closed(&raw, epsilon);
            for p in &raw {
                let mut best = f64::INFINITY;
                let n = simplified.len();
                for i in 0..n {
                    let d = perpendicular_distance(*p, simplified[i], simplified[(i + 1) % n]);
                    best = best.min(d);
                }
                assert!(best <= epsilon, "point {p:?} deviates {best}");
            }
        }
    }

    mod corners {
        use super::*;

        #[test]
        fn square_has_four_corners() {
            let points = vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 2.0),
                Point::new(2.0, 2.0),
                Point::new(2.0, 0.0),
            ];
            assert_eq!(detect_corners(&points, 60.0).len(), 4);
        }

        #[test]
        fn threshold_180_detects_nothing() {
            let points = vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 2.0),
                Point::new(2.0, 2.0),
                Point::new(2.0, 0.0),
            ];
            assert!(detect_corners(&points, 180.0).is_empty());
        }

        #[test]
        fn shallow_turns_are_not_corners() {
            let points: Vec<Point> = (0..16)
                .map(|i| {
                    let angle = f64::from(i) * std::f64::consts::TAU / 16.0;
                    Point::new(10.0 * angle.cos(), 10.0 * angle.sin())
                })
                .collect();
            // A regular 16-gon turns 22.5 degrees per vertex.
            assert!(detect_corners(&points, 60.0).is_empty());
            assert_eq!(detect_corners(&points, 20.0).len(), 16);
        }
    }

    mod spline {
        use super::*;

        fn circle(radius: f64, steps: usize) -> Vec<Point> {
            (0..steps)
                .map(|i| {
                    let angle = (i as f64) * std::f64::consts::TAU / (steps as f64);
                    Point::new(
                        radius * angle.cos() + radius + 1.0,
                        radius * angle.sin() + radius + 1.0,
                    )
                })
                .collect()
        }

        #[test]
        fn closed_loop_ends_where_it_starts() {
            let points = circle(10.0, 32);
            let sub = spline_subpath(&points, &config(PathMode::Spline));
            let last = sub.segments.last().expect("segments present").end();
            assert!(last.distance(&sub.start) < 1e-9);
        }

        #[test]
        fn cornerless_loop_splits_at_least_twice() {
            let points = circle(10.0, 32);
            let sub = spline_subpath(&points, &config(PathMode::Spline));
            assert!(sub.segments.len() >= 2);
        }

        #[test]
        fn smooth_arc_fits_with_cubics() {
            let points = circle(12.0, 48);
            let sub = spline_subpath(&points, &config(PathMode::Spline));
            assert!(
                sub.segments
                    .iter()
                    .any(|s| matches!(s, PathSegment::Cubic { .. }))
            );
        }

        #[test]
        fn corners_stay_segment_boundaries() {
            let sub = fit_contour(&square_contour(), &config(PathMode::Spline));
            // Every corner of the square must be an endpoint of some
            // segment, not smoothed away.
            let mut endpoints: Vec<Point> = sub.segments.iter().map(|s| s.end()).collect();
            endpoints.push(sub.start);
            for corner in [(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)] {
                assert!(
                    endpoints
                        .iter()
                        .any(|p| p.distance(&Point::new(corner.0, corner.1)) < 1e-9),
                    "corner {corner:?} lost"
                );
            }
        }

        #[test]
        fn lower_splice_threshold_never_yields_fewer_pieces() {
            let points = circle(10.0, 40);
            let loose = spline_subpath(
                &points,
                &config(PathMode::Spline).with_splice_threshold(170),
            );
            let tight =
                spline_subpath(&points, &config(PathMode::Spline).with_splice_threshold(10));
            assert!(tight.segments.len() >= loose.segments.len());
        }

        #[test]
        fn two_point_sections_become_lines() {
            let mut out = Vec::new();
            fit_section(
                &[Point::new(0.0, 0.0), Point::new(3.0, 4.0)],
                0.5,
                10,
                4,
                &mut out,
            );
            assert_eq!(
                out,
                vec![PathSegment::Line {
                    to: Point::new(3.0, 4.0)
                }]
            );
        }

        #[test]
        fn fit_error_is_within_tolerance_for_gentle_curves() {
            let section: Vec<Point> = (0..=10)
                .map(|i| {
                    let x = f64::from(i);
                    Point::new(x, 0.05 * x * (10.0 - x))
                })
                .collect();
            let mut out = Vec::new();
            fit_section(&section, 0.5, 10, 4, &mut out);
            assert_eq!(out.len(), 1, "gentle parabola should fit in one cubic");
        }
    }
}
