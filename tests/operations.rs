//! End-to-end checks of every operation against a pointwise oracle.
//!
//! For each case we probe a grid of points over the joint bounding box.
//! Wherever a probe is clearly away from all boundaries, membership in the
//! combined output (by winding) must agree with combining the memberships
//! in the two inputs pointwise.

use kurbo::{Affine, BezPath, Circle, CubicBez, ParamCurveNearest as _, Point, Rect, Shape as _};
use pathcombine::{combine, FillRule, PathOp};

const OPS: [PathOp; 5] = [
    PathOp::Union,
    PathOp::Intersection,
    PathOp::Difference,
    PathOp::ReverseDifference,
    PathOp::Xor,
];

const FILLS: [FillRule; 2] = [FillRule::EvenOdd, FillRule::NonZero];

fn inside(fill: FillRule, winding: i32) -> bool {
    match fill {
        FillRule::EvenOdd => winding % 2 != 0,
        FillRule::NonZero => winding != 0,
    }
}

fn pointwise(op: PathOp, in_a: bool, in_b: bool) -> bool {
    match op {
        PathOp::Union => in_a || in_b,
        PathOp::Intersection => in_a && in_b,
        PathOp::Difference => in_a && !in_b,
        PathOp::ReverseDifference => in_b && !in_a,
        PathOp::Xor => in_a != in_b,
    }
}

fn dist_to_path(path: &BezPath, p: Point) -> f64 {
    path.segments()
        .map(|seg| seg.nearest(p, 1e-9).distance_sq.sqrt())
        .fold(f64::INFINITY, f64::min)
}

fn check_op(a: &BezPath, b: &BezPath, fill: FillRule, op: PathOp) {
    let out = combine(a, b, fill, op).unwrap();
    assert!(out.closable, "{op:?}/{fill:?} got stuck");

    let bbox = a
        .bounding_box()
        .union(b.bounding_box())
        .inflate(0.5, 0.5);
    let margin = 1e-3 * bbox.width().max(bbox.height());
    let n = 23;
    for i in 0..n {
        for j in 0..n {
            let p = Point::new(
                bbox.x0 + bbox.width() * (i as f64 + 0.5) / n as f64,
                bbox.y0 + bbox.height() * (j as f64 + 0.5) / n as f64,
            );
            if dist_to_path(a, p) < margin
                || dist_to_path(b, p) < margin
                || dist_to_path(&out.path, p) < margin
            {
                continue;
            }
            let want = pointwise(op, inside(fill, a.winding(p)), inside(fill, b.winding(p)));
            let got = out.path.winding(p) != 0;
            assert_eq!(
                want, got,
                "{op:?}/{fill:?} disagrees with the oracle at {p:?}"
            );
        }
    }
}

fn check_all(a: &BezPath, b: &BezPath) {
    for fill in FILLS {
        for op in OPS {
            check_op(a, b, fill, op);
        }
    }
}

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
    Rect::new(x0, y0, x1, y1).to_path(1e-9)
}

fn contours(path: &BezPath) -> usize {
    path.elements()
        .iter()
        .filter(|el| matches!(el, kurbo::PathEl::MoveTo(_)))
        .count()
}

#[test]
fn disjoint_squares() {
    let a = square(0.0, 0.0, 1.0, 1.0);
    let b = square(2.0, 0.0, 3.0, 1.0);
    check_all(&a, &b);

    let union = combine(&a, &b, FillRule::NonZero, PathOp::Union).unwrap();
    assert_eq!(contours(&union.path), 2);
    let isect = combine(&a, &b, FillRule::NonZero, PathOp::Intersection).unwrap();
    assert!(isect.path.elements().is_empty());
}

#[test]
fn overlapping_squares() {
    let a = square(0.0, 0.0, 2.0, 2.0);
    let b = square(1.0, 1.0, 3.0, 3.0);
    check_all(&a, &b);

    // One merged outline, no interior seam.
    let union = combine(&a, &b, FillRule::NonZero, PathOp::Union).unwrap();
    assert_eq!(contours(&union.path), 1);
}

#[test]
fn nested_squares() {
    let a = square(0.0, 0.0, 3.0, 3.0);
    let b = square(1.0, 1.0, 2.0, 2.0);
    check_all(&a, &b);

    let union = combine(&a, &b, FillRule::NonZero, PathOp::Union).unwrap();
    assert_eq!(contours(&union.path), 1);
    let isect = combine(&a, &b, FillRule::NonZero, PathOp::Intersection).unwrap();
    assert_eq!(contours(&isect.path), 1);
    // The difference is an annulus: outer boundary plus a hole.
    let diff = combine(&a, &b, FillRule::NonZero, PathOp::Difference).unwrap();
    assert_eq!(contours(&diff.path), 2);
}

#[test]
fn abutting_squares() {
    check_all(&square(0.0, 0.0, 1.0, 1.0), &square(1.0, 0.0, 2.0, 1.0));
}

#[test]
fn partially_shared_edge() {
    check_all(&square(0.0, 0.0, 1.0, 3.0), &square(1.0, 1.0, 2.0, 2.0));
}

#[test]
fn identical_inputs() {
    let a = square(0.0, 0.0, 2.0, 2.0);
    check_all(&a, &a);
    // The self-canceling ops come out exactly empty, not just thin.
    for fill in FILLS {
        let xor = combine(&a, &a, fill, PathOp::Xor).unwrap();
        assert!(xor.path.elements().is_empty(), "{fill:?} xor left debris");
        let diff = combine(&a, &a, fill, PathOp::Difference).unwrap();
        assert!(diff.path.elements().is_empty(), "{fill:?} diff left debris");
    }
}

#[test]
fn overlapping_circles() {
    let a = Circle::new((0.0, 0.0), 1.0).to_path(1e-6);
    let b = Circle::new((1.0, 0.0), 1.0).to_path(1e-6);
    check_all(&a, &b);
}

#[test]
fn tangent_circles() {
    // External tangency: a single shared boundary point where the two
    // boundaries have parallel tangents, so the angular order there comes
    // down to the curvature tie-break.
    let a = Circle::new((0.0, 0.0), 1.0).to_path(1e-6);
    let b = Circle::new((2.0, 0.0), 1.0).to_path(1e-6);
    check_all(&a, &b);

    let isect = combine(&a, &b, FillRule::NonZero, PathOp::Intersection).unwrap();
    assert!(isect.path.elements().is_empty());
}

/// The region between the parabola `y = s * x^2` and the line `y = 2 s`,
/// over `x` in `[-1, 1]`.
fn parabola_blob(s: f64) -> BezPath {
    let mut p = BezPath::new();
    p.move_to((-1.0, s));
    p.quad_to((0.0, -s), (1.0, s));
    p.line_to((1.0, 2.0 * s));
    p.line_to((-1.0, 2.0 * s));
    p.close_path();
    p
}

#[test]
fn tangent_parabolas() {
    // Two blobs meeting at the origin with horizontal tangents, mid-curve
    // on both quads: the ring there orders purely by the curvature
    // tie-break, with its two edge pairs straddling the angle wrap.
    let a = parabola_blob(1.0);
    let b = parabola_blob(-1.0);
    check_all(&a, &b);

    let union = combine(&a, &b, FillRule::NonZero, PathOp::Union).unwrap();
    assert!(union.closable);
    assert!((union.path.area().abs() - 20.0 / 3.0).abs() < 1e-6);
    let isect = combine(&a, &b, FillRule::NonZero, PathOp::Intersection).unwrap();
    assert!(isect.path.area().abs() < 1e-6);
}

#[test]
fn nearly_tangent_parabolas() {
    // Tilting one blob by a sub-tolerance rotation about the touch point
    // leaves the tangent directions tied; the order must still come from
    // the curvatures, not from which angle happens to be bigger.
    let a = parabola_blob(1.0);
    for delta in [1e-8, 1e-7, 3e-7, -3e-7] {
        let b = Affine::rotate(delta) * parabola_blob(-1.0);
        check_all(&a, &b);
        let union = combine(&a, &b, FillRule::NonZero, PathOp::Union).unwrap();
        assert!(union.closable, "stuck at delta = {delta}");
        assert!(
            (union.path.area().abs() - 20.0 / 3.0).abs() < 1e-3,
            "wrong union area at delta = {delta}"
        );
    }
}

#[test]
fn diagonally_tangent_circles() {
    // External tangency away from the arc seams, so both meeting edges are
    // genuinely curved and their angles are close without being equal.
    let (dx, dy) = (2.0 * 0.3_f64.cos(), 2.0 * 0.3_f64.sin());
    let a = Circle::new((0.0, 0.0), 1.0).to_path(1e-9);
    let b = Circle::new((dx, dy), 1.0).to_path(1e-9);
    check_all(&a, &b);

    let union = combine(&a, &b, FillRule::NonZero, PathOp::Union).unwrap();
    assert!(union.closable);
    assert!((union.path.area().abs() - 2.0 * std::f64::consts::PI).abs() < 1e-3);
    let isect = combine(&a, &b, FillRule::NonZero, PathOp::Intersection).unwrap();
    assert!(isect.path.area().abs() < 1e-3);
}

#[test]
fn three_way_shared_edge() {
    // A's square, an identical square in B, and a second B square stacked
    // on top: the edge y = 1 is shared by three contours at once.
    let a = square(0.0, 0.0, 1.0, 1.0);
    let mut b = square(0.0, 0.0, 1.0, 1.0);
    b.extend(square(0.0, 1.0, 1.0, 2.0));
    check_all(&a, &b);

    let union = combine(&a, &b, FillRule::NonZero, PathOp::Union).unwrap();
    assert!(union.closable);
    assert_eq!(contours(&union.path), 1);
    assert!((union.path.area().abs() - 2.0).abs() < 1e-9);
}

#[test]
fn swapped_operands() {
    // Union, intersection, and xor are order-independent; the differences
    // trade places. Checking both orders against the same oracle covers all
    // of it.
    let a = square(0.0, 0.0, 2.0, 2.0);
    let b = Circle::new((2.5, 1.0), 1.5).to_path(1e-6);
    check_all(&a, &b);
    check_all(&b, &a);
}

#[test]
fn union_minus_intersection_is_xor() {
    let a = square(0.0, 0.0, 2.0, 2.0);
    let b = Circle::new((2.0, 1.0), 1.2).to_path(1e-6);
    for fill in FILLS {
        let union = combine(&a, &b, fill, PathOp::Union).unwrap();
        let isect = combine(&a, &b, fill, PathOp::Intersection).unwrap();
        let xor = combine(&a, &b, fill, PathOp::Xor).unwrap();

        let bbox = a.bounding_box().union(b.bounding_box()).inflate(0.5, 0.5);
        let margin = 1e-3 * bbox.width().max(bbox.height());
        let n = 23;
        for i in 0..n {
            for j in 0..n {
                let p = Point::new(
                    bbox.x0 + bbox.width() * (i as f64 + 0.5) / n as f64,
                    bbox.y0 + bbox.height() * (j as f64 + 0.5) / n as f64,
                );
                if dist_to_path(&union.path, p) < margin
                    || dist_to_path(&isect.path, p) < margin
                    || dist_to_path(&xor.path, p) < margin
                {
                    continue;
                }
                let in_xor = xor.path.winding(p) != 0;
                let in_union = union.path.winding(p) != 0;
                let in_isect = isect.path.winding(p) != 0;
                assert_eq!(
                    in_xor,
                    in_union && !in_isect,
                    "{fill:?} xor disagrees with union minus intersection at {p:?}"
                );
            }
        }
    }
}

#[test]
fn circle_and_square() {
    let a = Circle::new((1.0, 1.0), 1.2).to_path(1e-6);
    check_all(&a, &square(0.0, 0.0, 2.0, 2.0));
}

#[test]
fn disjoint_circle_inside_square() {
    let a = square(-2.0, -2.0, 2.0, 2.0);
    let b = Circle::new((0.0, 0.0), 1.0).to_path(1e-6);
    check_all(&a, &b);
}

#[test]
fn bowtie_simplifies() {
    // A self-intersecting quadrilateral; the two fill rules see the same
    // two triangles here, and combining with an empty path simplifies it.
    let mut bowtie = BezPath::new();
    bowtie.move_to((0.0, 0.0));
    bowtie.line_to((2.0, 2.0));
    bowtie.line_to((2.0, 0.0));
    bowtie.line_to((0.0, 2.0));
    bowtie.close_path();
    check_all(&bowtie, &BezPath::new());
    check_all(&bowtie, &square(0.5, 0.5, 1.5, 1.5));
}

#[test]
fn curved_edges_cross() {
    // Two blobby shapes bounded by a cubic and a line each.
    let mut a = BezPath::new();
    a.move_to((0.0, 0.0));
    a.curve_to((1.0, -1.5), (2.0, 1.5), (3.0, 0.0));
    a.line_to((1.5, 2.0));
    a.close_path();
    let mut b = BezPath::new();
    b.move_to((0.0, 0.5));
    b.curve_to((1.0, 2.0), (2.0, -2.0), (3.0, 0.5));
    b.line_to((1.5, -1.5));
    b.close_path();
    check_all(&a, &b);
}

#[test]
fn quad_edge_against_square() {
    let mut a = BezPath::new();
    a.move_to((0.0, 1.0));
    a.quad_to((1.5, -1.0), (3.0, 1.0));
    a.line_to((1.5, 2.5));
    a.close_path();
    check_all(&a, &square(1.0, 0.0, 2.0, 2.0));
}

#[test]
fn shared_curved_edge() {
    // Two regions bounded by the same cubic, one on each side: their union
    // merges the curve away, their intersection is empty.
    let spine = CubicBez::new((0.0, 0.0), (1.0, 1.0), (2.0, -1.0), (3.0, 0.0));
    let mut a = BezPath::new();
    a.move_to(spine.p0);
    a.curve_to(spine.p1, spine.p2, spine.p3);
    a.line_to((1.5, 2.0));
    a.close_path();
    let mut b = BezPath::new();
    b.move_to(spine.p0);
    b.curve_to(spine.p1, spine.p2, spine.p3);
    b.line_to((1.5, -2.0));
    b.close_path();
    check_all(&a, &b);

    let isect = combine(&a, &b, FillRule::NonZero, PathOp::Intersection).unwrap();
    assert!(isect.path.elements().is_empty());
}

#[test]
fn multi_contour_operands() {
    let mut a = square(0.0, 0.0, 1.0, 1.0);
    a.extend(square(2.0, 0.0, 3.0, 1.0));
    let b = square(0.5, -0.5, 2.5, 0.5);
    check_all(&a, &b);
}

#[test]
fn corner_touching_squares() {
    // Checkerboard corner contact at (1, 1).
    check_all(&square(0.0, 0.0, 1.0, 1.0), &square(1.0, 1.0, 2.0, 2.0));
}

#[test]
fn zero_width_sliver_vanishes() {
    let mut sliver = BezPath::new();
    sliver.move_to((0.0, 0.0));
    sliver.line_to((0.0, 2.0));
    sliver.line_to((0.0, 0.0));
    sliver.close_path();
    let out = combine(
        &sliver,
        &BezPath::new(),
        FillRule::NonZero,
        PathOp::Union,
    )
    .unwrap();
    assert!(out.path.elements().is_empty());

    // A sliver doesn't disturb the other operand either.
    let b = square(-1.0, 0.5, 1.0, 1.5);
    let out = combine(&sliver, &b, FillRule::NonZero, PathOp::Union).unwrap();
    assert!(out.closable);
    assert!((out.path.area() - 2.0).abs() < 1e-6);
}
