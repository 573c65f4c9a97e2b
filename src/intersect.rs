//! Pairwise intersection of the segments in an arena.
//!
//! Lines get closed forms; anything involving a genuine curve goes through
//! bounding-box subdivision with a Newton polish at the end. Overlapping
//! (shared-geometry) pairs are detected before any root-finding, because
//! grinding a subdivision search against two copies of the same curve
//! produces a smear of meaningless candidates.

use arrayvec::ArrayVec;
use kurbo::{
    CubicBez, ParamCurve as _, ParamCurveExtrema as _, ParamCurveNearest as _, PathSeg, Point,
    Rect,
};

use crate::curve;
use crate::num::CheapOrderedFloat;
use crate::segments::{SegIdx, Segments, SpanRef};
use crate::Epsilons;

/// Cubic Bézier curves intersect in at most nine points; more candidates
/// than that means the pair couldn't be resolved.
const MAX_HITS: usize = 9;

const MAX_DEPTH: u32 = 48;

/// A sub-range of one segment that runs along a sub-range of another.
#[derive(Clone, Debug)]
pub struct Overlap {
    /// First segment.
    pub a: SegIdx,
    /// Second segment.
    pub b: SegIdx,
    /// Parameter range on `a`, increasing.
    pub a_range: (f64, f64),
    /// Matching parameter range on `b`: `b_range.0` is the point
    /// `a_range.0` lands on, so a decreasing range means the overlap runs
    /// the two segments in opposite directions.
    pub b_range: (f64, f64),
}

impl Overlap {
    /// Do the two segments run the same way along the overlap?
    pub fn parallel(&self) -> bool {
        self.b_range.1 >= self.b_range.0
    }
}

/// Intersect every pair of segments, subdividing both sides of every
/// crossing and wiring up the mutual cross-references.
///
/// All subdivision points (including the endpoints of detected overlaps)
/// are inserted here, after every pair has been examined; nothing later in
/// the pipeline moves a span, so the references stay valid. The overlaps
/// themselves are returned for the coincidence pass to merge.
pub fn subdivide_all(segs: &mut Segments, eps: &Epsilons) -> Vec<Overlap> {
    let mut hits: Vec<(SegIdx, f64, SegIdx, f64)> = Vec::new();
    let mut overlaps: Vec<Overlap> = Vec::new();

    for i in 0..segs.len() {
        for j in (i + 1)..segs.len() {
            let (si, sj) = (SegIdx(i), SegIdx(j));
            if let Some(overlap) = check_overlap(segs, si, sj, eps) {
                overlaps.push(overlap);
                continue;
            }
            let mut pair = pair_hits(&segs[si], &segs[sj], eps);
            if segs.adjacent_in_contour(si, sj) {
                drop_shared_endpoint_hits(segs, si, sj, &mut pair, eps);
            }
            for &(ta, tb) in &pair {
                hits.push((si, ta, sj, tb));
            }
        }
    }

    for &(sa, ta, sb, tb) in &hits {
        segs.add_boundary(sa, ta, eps);
        segs.add_boundary(sb, tb, eps);
    }
    for o in &overlaps {
        segs.add_boundary(o.a, o.a_range.0, eps);
        segs.add_boundary(o.a, o.a_range.1, eps);
        segs.add_boundary(o.b, o.b_range.0.min(o.b_range.1), eps);
        segs.add_boundary(o.b, o.b_range.0.max(o.b_range.1), eps);
    }

    for &(sa, ta, sb, tb) in &hits {
        let ra = SpanRef {
            seg: sa,
            span: segs.boundary_at(sa, ta),
        };
        let rb = SpanRef {
            seg: sb,
            span: segs.boundary_at(sb, tb),
        };
        if segs.span(ra).other.is_none() {
            segs.span_mut(ra).other = Some(rb);
        }
        if segs.span(rb).other.is_none() {
            segs.span_mut(rb).other = Some(ra);
        }
    }

    overlaps
}

/// All crossings of one pair, as `(t on a, t on b)`.
///
/// An empty result can also mean the pair was too tangled to resolve (more
/// candidates than two cubics can honestly cross); such pairs are left out
/// of the intersection graph entirely.
pub fn pair_hits(a: &PathSeg, b: &PathSeg, eps: &Epsilons) -> ArrayVec<(f64, f64), MAX_HITS> {
    let mut out = ArrayVec::new();
    let mut candidates = match (a, b) {
        (PathSeg::Line(la), PathSeg::Line(lb)) => line_line(la, lb),
        (PathSeg::Line(la), _) => line_curve(la, b, false),
        (_, PathSeg::Line(lb)) => line_curve(lb, a, true),
        _ => curve_curve(&curve::to_cubic(a), &curve::to_cubic(b), eps),
    };
    candidates.sort_by_key(|&(ta, _)| CheapOrderedFloat::from(ta));
    for (ta, tb) in candidates {
        let p = a.eval(ta);
        let q = b.eval(tb);
        if (p - q).hypot() > eps.point * 4.0 {
            continue;
        }
        // Roots closer than the parametric tolerance merge; the earlier one
        // wins.
        if out
            .iter()
            .any(|&(ua, ub): &(f64, f64)| (ua - ta).abs() < 1e-6 && (ub - tb).abs() < 1e-6)
        {
            continue;
        }
        if out.is_full() {
            // Past the degree bound: not a resolvable pair.
            out.clear();
            return out;
        }
        out.push((ta, tb));
    }
    out
}

fn line_line(a: &kurbo::Line, b: &kurbo::Line) -> Vec<(f64, f64)> {
    let da = a.p1 - a.p0;
    let db = b.p1 - b.p0;
    let denom = da.cross(db);
    let scale = da.hypot() * db.hypot();
    if denom.abs() <= 1e-12 * scale.max(1e-12) {
        // Parallel: a collinear overlap is someone else's business.
        return Vec::new();
    }
    let w = b.p0 - a.p0;
    let ta = w.cross(db) / denom;
    let tb = w.cross(da) / denom;
    let slop = 1e-9;
    if (-slop..=1.0 + slop).contains(&ta) && (-slop..=1.0 + slop).contains(&tb) {
        vec![(ta.clamp(0.0, 1.0), tb.clamp(0.0, 1.0))]
    } else {
        Vec::new()
    }
}

/// Crossings of a line and a curve; `swapped` flips the output pairs so the
/// caller's (a, b) order survives.
fn line_curve(line: &kurbo::Line, seg: &PathSeg, swapped: bool) -> Vec<(f64, f64)> {
    let dl = line.p1 - line.p0;
    let len2 = dl.hypot2();
    if len2 == 0.0 {
        return Vec::new();
    }
    let normal = kurbo::Vec2::new(-dl.y, dl.x);
    let mut out = Vec::new();
    for t in curve::line_hits(seg, line.p0, normal) {
        let s = (seg.eval(t) - line.p0).dot(dl) / len2;
        let slop = 1e-9;
        if (-slop..=1.0 + slop).contains(&s) {
            let s = s.clamp(0.0, 1.0);
            out.push(if swapped { (t, s) } else { (s, t) });
        }
    }
    out
}

fn curve_curve(a: &CubicBez, b: &CubicBez, eps: &Epsilons) -> Vec<(f64, f64)> {
    let mut raw = Vec::new();
    split_search(a, b, (0.0, 1.0), (0.0, 1.0), 0, eps, &mut raw);

    // The subdivision bottoms out on little boxes; polish each candidate
    // and collapse the converged duplicates.
    let mut out: Vec<(f64, f64)> = Vec::new();
    raw.sort_by_key(|&(ta, _)| CheapOrderedFloat::from(ta));
    for (ta, tb) in raw {
        let (ta, tb) = polish(a, b, ta, tb);
        if !out
            .iter()
            .any(|&(ua, ub)| (ua - ta).abs() < 1e-6 && (ub - tb).abs() < 1e-6)
        {
            out.push((ta, tb));
        }
    }
    out
}

fn boxes_apart(ra: &Rect, rb: &Rect, pad: f64) -> bool {
    ra.x0 > rb.x1 + pad || rb.x0 > ra.x1 + pad || ra.y0 > rb.y1 + pad || rb.y0 > ra.y1 + pad
}

fn split_search(
    a: &CubicBez,
    b: &CubicBez,
    (a0, a1): (f64, f64),
    (b0, b1): (f64, f64),
    depth: u32,
    eps: &Epsilons,
    out: &mut Vec<(f64, f64)>,
) {
    // Way past the degree bound: bail out before the smear gets expensive.
    if out.len() > 4 * MAX_HITS {
        return;
    }
    let ca = a.subsegment(a0..a1);
    let cb = b.subsegment(b0..b1);
    let ra = ca.bounding_box();
    let rb = cb.bounding_box();
    if boxes_apart(&ra, &rb, eps.point * 0.5) {
        return;
    }
    let size_a = ra.width().max(ra.height());
    let size_b = rb.width().max(rb.height());
    let tiny = eps.point * 0.5;
    if depth >= MAX_DEPTH || (size_a <= tiny && size_b <= tiny) {
        out.push(((a0 + a1) / 2.0, (b0 + b1) / 2.0));
        return;
    }
    // Split whichever side is bigger.
    if size_a >= size_b {
        let am = (a0 + a1) / 2.0;
        split_search(a, b, (a0, am), (b0, b1), depth + 1, eps, out);
        split_search(a, b, (am, a1), (b0, b1), depth + 1, eps, out);
    } else {
        let bm = (b0 + b1) / 2.0;
        split_search(a, b, (a0, a1), (b0, bm), depth + 1, eps, out);
        split_search(a, b, (a0, a1), (bm, b1), depth + 1, eps, out);
    }
}

/// A couple of 2-d Newton steps on `a(ta) - b(tb) = 0`.
fn polish(a: &CubicBez, b: &CubicBez, mut ta: f64, mut tb: f64) -> (f64, f64) {
    for _ in 0..3 {
        let f = a.eval(ta) - b.eval(tb);
        let da = curve::deriv(&PathSeg::Cubic(*a), ta);
        let db = curve::deriv(&PathSeg::Cubic(*b), tb);
        let det = -da.cross(db);
        if det.abs() < 1e-18 {
            break;
        }
        // Cramer on [da, -db] [dta, dtb]^T = -f.
        let dta = (-f.x * -db.y - -db.x * -f.y) / det;
        let dtb = (da.x * -f.y - -f.x * da.y) / det;
        ta = (ta + dta).clamp(0.0, 1.0);
        tb = (tb + dtb).clamp(0.0, 1.0);
    }
    (ta, tb)
}

/// Does a sub-range of `a` run along `b`? Detected from endpoint
/// projections and a few interior probes, which is robust for the cases
/// that matter: identical geometry, split copies of one curve, collinear
/// line runs.
fn check_overlap(segs: &Segments, a: SegIdx, b: SegIdx, eps: &Epsilons) -> Option<Overlap> {
    let sa = &segs[a];
    let sb = &segs[b];
    let tol = eps.point * 2.0;

    // Anchor pairs (t on a, t on b) where an endpoint of one segment lies
    // on the other.
    let mut anchors: Vec<(f64, f64)> = Vec::new();
    for ta in [0.0, 1.0] {
        let p = sa.eval(ta);
        let (tb, d2) = nearest_t(sb, p);
        if d2.sqrt() <= tol {
            anchors.push((ta, tb));
        }
    }
    for tb in [0.0, 1.0] {
        let p = sb.eval(tb);
        let (ta, d2) = nearest_t(sa, p);
        if d2.sqrt() <= tol {
            anchors.push((ta, tb));
        }
    }
    if anchors.len() < 2 {
        return None;
    }
    let lo = anchors
        .iter()
        .copied()
        .min_by_key(|&(ta, _)| CheapOrderedFloat::from(ta))?;
    let hi = anchors
        .iter()
        .copied()
        .max_by_key(|&(ta, _)| CheapOrderedFloat::from(ta))?;
    if hi.0 - lo.0 < 1e-6 {
        // The "overlap" is a single shared point, which the regular
        // intersection machinery handles better.
        return None;
    }
    // A shared endpoint plus a stray projection shouldn't count as running
    // together; make sure a real stretch of `a` hugs `b`.
    let (p_lo, p_hi) = (sa.eval(lo.0), sa.eval(hi.0));
    if (p_lo - p_hi).hypot() <= tol {
        return None;
    }
    for k in 1..=5 {
        let ta = lo.0 + (hi.0 - lo.0) * (k as f64) / 6.0;
        let p = sa.eval(ta);
        let (_, d2) = nearest_t(sb, p);
        if d2.sqrt() > tol {
            return None;
        }
    }
    Some(Overlap {
        a,
        b,
        a_range: (lo.0, hi.0),
        b_range: (lo.1, hi.1),
    })
}

fn nearest_t(seg: &PathSeg, p: Point) -> (f64, f64) {
    let n = seg.nearest(p, 1e-9);
    (n.t, n.distance_sq)
}

/// Neighbors in a contour meet at their shared corner on purpose; only a
/// genuine re-crossing away from that corner counts.
fn drop_shared_endpoint_hits(
    segs: &Segments,
    a: SegIdx,
    b: SegIdx,
    hits: &mut ArrayVec<(f64, f64), MAX_HITS>,
    eps: &Epsilons,
) {
    let mut shared: ArrayVec<Point, 2> = ArrayVec::new();
    if segs.contour_next(a) == b {
        shared.push(segs[a].eval(1.0));
    }
    if segs.contour_next(b) == a {
        shared.push(segs[b].eval(1.0));
    }
    hits.retain(|&mut (ta, _)| {
        let p = segs[a].eval(ta);
        !shared.iter().any(|s| (p - *s).hypot() <= eps.point * 2.0)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::Operand;
    use kurbo::{BezPath, Line, QuadBez, Shape as _};

    fn eps() -> Epsilons {
        Epsilons::for_scale(10.0)
    }

    fn seg_line(x0: f64, y0: f64, x1: f64, y1: f64) -> PathSeg {
        PathSeg::Line(Line::new((x0, y0), (x1, y1)))
    }

    #[test]
    fn crossing_lines() {
        let a = seg_line(0.0, 0.0, 2.0, 2.0);
        let b = seg_line(0.0, 2.0, 2.0, 0.0);
        let hits = pair_hits(&a, &b, &eps());
        assert_eq!(hits.len(), 1);
        assert!((hits[0].0 - 0.5).abs() < 1e-9);
        assert!((hits[0].1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn missing_lines() {
        let a = seg_line(0.0, 0.0, 1.0, 0.0);
        let b = seg_line(0.0, 1.0, 1.0, 1.0);
        assert!(pair_hits(&a, &b, &eps()).is_empty());
    }

    #[test]
    fn line_meets_quad() {
        let a = seg_line(0.0, 1.0, 2.0, 1.0);
        // A parabola dipping below y = 1 between its ends.
        let b = PathSeg::Quad(QuadBez::new((0.0, 0.0), (1.0, 4.0), (2.0, 0.0)));
        let hits = pair_hits(&a, &b, &eps());
        assert_eq!(hits.len(), 2);
        for (s, t) in hits {
            let p = a.eval(s);
            let q = b.eval(t);
            assert!((p - q).hypot() < 1e-6);
        }
    }

    #[test]
    fn cubics_cross_once() {
        let a = PathSeg::Cubic(CubicBez::new(
            (0.0, 0.0),
            (0.5, 0.5),
            (1.5, 1.5),
            (2.0, 2.0),
        ));
        let b = PathSeg::Cubic(CubicBez::new(
            (0.0, 2.0),
            (0.5, 1.5),
            (1.5, 0.5),
            (2.0, 0.0),
        ));
        let hits = pair_hits(&a, &b, &eps());
        assert_eq!(hits.len(), 1);
        let (s, t) = hits[0];
        assert!((a.eval(s) - b.eval(t)).hypot() < 1e-6);
    }

    #[test]
    fn collinear_lines_overlap() {
        let e = eps();
        let mut segs = Segments::default();
        let mut p1 = BezPath::new();
        p1.move_to((0.0, 0.0));
        p1.line_to((2.0, 0.0));
        p1.line_to((1.0, 1.0));
        p1.close_path();
        let mut p2 = BezPath::new();
        p2.move_to((1.0, 0.0));
        p2.line_to((3.0, 0.0));
        p2.line_to((2.0, -1.0));
        p2.close_path();
        segs.add_path(&p1, Operand::A, &e).unwrap();
        segs.add_path(&p2, Operand::B, &e).unwrap();
        let overlap = check_overlap(&segs, SegIdx(0), SegIdx(3), &e).unwrap();
        // a runs (0,0)->(2,0); b runs (1,0)->(3,0): they share x in [1, 2].
        assert!((overlap.a_range.0 - 0.5).abs() < 1e-6);
        assert!((overlap.a_range.1 - 1.0).abs() < 1e-6);
        assert!((overlap.b_range.0 - 0.0).abs() < 1e-6);
        assert!((overlap.b_range.1 - 0.5).abs() < 1e-6);
        assert!(overlap.parallel());
    }

    #[test]
    fn identical_curves_overlap_fully() {
        let e = eps();
        let mut segs = Segments::default();
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.curve_to((1.0, 1.0), (2.0, -1.0), (3.0, 0.0));
        p.line_to((1.5, 2.0));
        p.close_path();
        segs.add_path(&p, Operand::A, &e).unwrap();
        segs.add_path(&p, Operand::B, &e).unwrap();
        let overlap = check_overlap(&segs, SegIdx(0), SegIdx(3), &e).unwrap();
        assert!((overlap.a_range.0 - 0.0).abs() < 1e-6);
        assert!((overlap.a_range.1 - 1.0).abs() < 1e-6);
        assert!(overlap.parallel());
    }

    #[test]
    fn contour_corners_are_exempt() {
        let e = eps();
        let mut segs = Segments::default();
        segs.add_path(&Rect::new(0.0, 0.0, 1.0, 1.0).to_path(1e-9), Operand::A, &e)
            .unwrap();
        let overlaps = subdivide_all(&mut segs, &e);
        assert!(overlaps.is_empty());
        for idx in segs.indices() {
            assert_eq!(segs.piece_count(idx), 1, "{idx:?} got subdivided");
        }
    }

    #[test]
    fn crossing_squares_subdivide() {
        let e = eps();
        let mut segs = Segments::default();
        segs.add_path(&Rect::new(0.0, 0.0, 2.0, 2.0).to_path(1e-9), Operand::A, &e)
            .unwrap();
        segs.add_path(&Rect::new(1.0, 1.0, 3.0, 3.0).to_path(1e-9), Operand::B, &e)
            .unwrap();
        subdivide_all(&mut segs, &e);
        let subdivided: Vec<SegIdx> = segs
            .indices()
            .filter(|&s| segs.piece_count(s) == 2)
            .collect();
        assert_eq!(subdivided.len(), 4);
        // The two crossing points carry mutual references.
        let mut with_other = 0;
        for r in segs.piece_refs() {
            if let Some(o) = segs.span(r).other {
                with_other += 1;
                assert_eq!(segs.span(o).other, Some(r));
            }
        }
        assert_eq!(with_other, 4);
        segs.check_invariants();
    }
}
