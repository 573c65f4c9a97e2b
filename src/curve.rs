//! Evaluation helpers for path segments.
//!
//! Segments are plain `kurbo::PathSeg`s; everything here is a free function
//! so that lines, quadratics and cubics can be handled uniformly without
//! giving up their tags.

use arrayvec::ArrayVec;
use kurbo::common::solve_cubic;
use kurbo::{CubicBez, ParamCurve as _, PathSeg, Point, Vec2};

/// Which end of a segment, in increasing-parameter order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegEnd {
    /// The `t = 0` end.
    Start,
    /// The `t = 1` end.
    End,
}

impl SegEnd {
    pub fn t(self) -> f64 {
        match self {
            SegEnd::Start => 0.0,
            SegEnd::End => 1.0,
        }
    }

    pub fn opposite(self) -> SegEnd {
        match self {
            SegEnd::Start => SegEnd::End,
            SegEnd::End => SegEnd::Start,
        }
    }
}

/// First derivative at `t`.
pub fn deriv(seg: &PathSeg, t: f64) -> Vec2 {
    match seg {
        PathSeg::Line(l) => l.p1 - l.p0,
        PathSeg::Quad(q) => {
            let d0 = (q.p1 - q.p0) * 2.0;
            let d1 = (q.p2 - q.p1) * 2.0;
            d0.lerp(d1, t)
        }
        PathSeg::Cubic(c) => {
            let d0 = (c.p1 - c.p0) * 3.0;
            let d1 = (c.p2 - c.p1) * 3.0;
            let d2 = (c.p3 - c.p2) * 3.0;
            d0.lerp(d1, t).lerp(d1.lerp(d2, t), t)
        }
    }
}

/// Second derivative at `t`. Constant for quadratics, zero for lines.
pub fn second_deriv(seg: &PathSeg, t: f64) -> Vec2 {
    match seg {
        PathSeg::Line(_) => Vec2::ZERO,
        PathSeg::Quad(q) => (q.p2.to_vec2() - q.p1.to_vec2() * 2.0 + q.p0.to_vec2()) * 2.0,
        PathSeg::Cubic(c) => {
            let a = c.p2.to_vec2() - c.p1.to_vec2() * 2.0 + c.p0.to_vec2();
            let b = c.p3.to_vec2() - c.p2.to_vec2() * 2.0 + c.p1.to_vec2();
            a.lerp(b, t) * 6.0
        }
    }
}

/// The direction pointing from the given end into the rest of the segment.
///
/// If the derivative vanishes at the end (a retracted control point), we fall
/// back to sampling a point a little inside the domain. Fully degenerate
/// segments never get this far; they're dropped during path building.
pub fn outward_dir(seg: &PathSeg, end: SegEnd) -> Vec2 {
    let d = deriv(seg, end.t());
    let sign = match end {
        SegEnd::Start => 1.0,
        SegEnd::End => -1.0,
    };
    if d.hypot2() > 1e-24 {
        return d * sign;
    }
    let t_in = match end {
        SegEnd::Start => 1e-3,
        SegEnd::End => 1.0 - 1e-3,
    };
    seg.eval(t_in) - seg.eval(end.t())
}

/// Signed curvature of the walk that leaves the segment's given end and
/// heads into it.
///
/// The sign follows `Vec2::cross` of the first and second derivatives, so a
/// walk curving towards increasing `y` after heading towards increasing `x`
/// is positive. Leaving from the `t = 1` end reverses the traversal, which
/// flips the sign.
pub fn outward_curvature(seg: &PathSeg, end: SegEnd) -> f64 {
    let t = end.t();
    let d1 = deriv(seg, t);
    let d2 = second_deriv(seg, t);
    let len2 = d1.hypot2();
    if len2 < 1e-24 {
        return 0.0;
    }
    let kappa = d1.cross(d2) / (len2 * len2.sqrt());
    match end {
        SegEnd::Start => kappa,
        SegEnd::End => -kappa,
    }
}

/// Is this segment too small to matter: every control point within `eps` of
/// the first one?
pub fn is_degenerate(seg: &PathSeg, eps: f64) -> bool {
    let close = |p: Point, q: Point| (p - q).hypot() <= eps;
    match seg {
        PathSeg::Line(l) => close(l.p0, l.p1),
        PathSeg::Quad(q) => close(q.p0, q.p1) && close(q.p0, q.p2),
        PathSeg::Cubic(c) => close(c.p0, c.p1) && close(c.p0, c.p2) && close(c.p0, c.p3),
    }
}

/// Degree-elevate to a cubic. Elevation leaves the parameterization
/// unchanged, so parameters found on the cubic are valid on the original.
pub fn to_cubic(seg: &PathSeg) -> CubicBez {
    match seg {
        PathSeg::Line(l) => {
            let d = (l.p1 - l.p0) / 3.0;
            CubicBez::new(l.p0, l.p0 + d, l.p0 + d * 2.0, l.p1)
        }
        PathSeg::Quad(q) => q.raise(),
        PathSeg::Cubic(c) => *c,
    }
}

/// Control values of the segment's coordinates projected onto `normal`,
/// relative to `origin`. The number of values matches the segment degree
/// plus one.
fn normal_ordinates(seg: &PathSeg, origin: Point, normal: Vec2) -> ArrayVec<f64, 4> {
    let proj = |p: Point| normal.dot(p - origin);
    let mut vals = ArrayVec::new();
    match seg {
        PathSeg::Line(l) => {
            vals.push(proj(l.p0));
            vals.push(proj(l.p1));
        }
        PathSeg::Quad(q) => {
            vals.push(proj(q.p0));
            vals.push(proj(q.p1));
            vals.push(proj(q.p2));
        }
        PathSeg::Cubic(c) => {
            vals.push(proj(c.p0));
            vals.push(proj(c.p1));
            vals.push(proj(c.p2));
            vals.push(proj(c.p3));
        }
    }
    vals
}

/// Parameters in `[0, 1]` where the segment crosses the line through
/// `origin` with the given `normal`.
pub fn line_hits(seg: &PathSeg, origin: Point, normal: Vec2) -> ArrayVec<f64, 3> {
    let vals = normal_ordinates(seg, origin, normal);
    let (c0, c1, c2, c3) = match vals.as_slice() {
        [b0, b1] => (*b0, *b1 - *b0, 0.0, 0.0),
        [b0, b1, b2] => (*b0, 2.0 * (*b1 - *b0), *b0 - 2.0 * *b1 + *b2, 0.0),
        [b0, b1, b2, b3] => (
            *b0,
            3.0 * (*b1 - *b0),
            3.0 * (*b2 - 2.0 * *b1 + *b0),
            *b3 - 3.0 * *b2 + 3.0 * *b1 - *b0,
        ),
        _ => unreachable!(),
    };
    let mut out = ArrayVec::new();
    for t in solve_poly_in_unit_interval(c0, c1, c2, c3) {
        if (-1e-9..=1.0 + 1e-9).contains(&t) && !out.iter().any(|s: &f64| (s - t).abs() < 1e-12) {
            out.push(t.clamp(0.0, 1.0));
        }
    }
    out
}

/// Parameters in `[0, 1]` where the segment crosses the vertical line at `x`.
pub fn vertical_line_hits(seg: &PathSeg, x: f64) -> ArrayVec<f64, 3> {
    line_hits(seg, Point::new(x, 0.0), Vec2::new(1.0, 0.0))
}

/// Parameters in `[0, 1]` where the segment crosses the horizontal line at `y`.
pub fn horizontal_line_hits(seg: &PathSeg, y: f64) -> ArrayVec<f64, 3> {
    line_hits(seg, Point::new(0.0, y), Vec2::new(0.0, 1.0))
}

// Tries to solve a cubic, but only looks for accurate solutions in the interval [0.0, 1.0].
//
// This doesn't actually filter out solutions outside that interval, it only
// makes some tweaks for better numerical stability inside it.
fn solve_poly_in_unit_interval(c0: f64, c1: f64, c2: f64, c3: f64) -> ArrayVec<f64, 3> {
    // Since we're only interested in small values of t, we can ignore c3 if it's
    // much smaller than the other coefficients.
    //
    // To explain where the 1e7 comes from, suppose we take a threshold of T.
    // By zeroing out c3, we're introducing error of order 1/T by modifying the
    // cubic. (For our applications, we care less about numerical stability of
    // the roots and more about the *value* at the roots being about zero.)
    // On the other hand, if c2 / c3 is of order T, when we use it to find roots
    // we'll have a relative error of about 1e-15, and so an absolute error of
    // about T * 1e-15 (because that's how accurate f64s are). Balancing out these
    // sources of error suggests we take T around 1e7.
    let mut new_c3 = c3;
    let mut new_c2 = c2;
    if c3.abs() < c2.abs().max(c1.abs()).max(c0.abs()) / 1e7 {
        new_c3 = 0.0;
        if c2.abs() < c1.abs().max(c0.abs()) / 1e7 {
            new_c2 = 0.0;
        }
    }
    let mut roots = solve_cubic(c0, c1, new_c2, new_c3);

    // Do a few Newton steps to increase accuracy. Also, we do this with the
    // original parameters, which helps reduce the error that we may have
    // introduced.
    for x in &mut roots {
        let mut val = c3 * *x * *x * *x + c2 * *x * *x + c1 * *x + c0;
        let mut deriv = 3.0 * c3 * *x * *x + 2.0 * c2 * *x + c1;
        for _ in 0..3 {
            if val.abs() <= 1e-14 || deriv == 0.0 {
                break;
            }

            let step = val / deriv;
            // Truncate the step size, because of an annoying case. If the original
            // equation was (x - 1)^2 + eps * x^3, we'll perturb it and find that
            // perfect double-root at x = 1. But when we add back in eps * x^3, the
            // Newton step will be giant (independent of eps). We should restrict
            // it to more like sqrt(eps).
            //
            // Is there a more principled way to handle this?
            let step = step.abs().min(val.abs().sqrt()).copysign(step);
            *x -= step;

            val = c3 * *x * *x * *x + c2 * *x * *x + c1 * *x + c0;
            deriv = 3.0 * c3 * *x * *x + 2.0 * c2 * *x + c1;
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Line, QuadBez};

    #[test]
    fn vertical_hits_on_a_line() {
        let seg = PathSeg::Line(Line::new((0.0, 0.0), (2.0, 2.0)));
        let hits = vertical_line_hits(&seg, 1.0);
        assert_eq!(hits.len(), 1);
        assert!((hits[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn vertical_hits_on_a_cubic() {
        let seg = PathSeg::Cubic(CubicBez::new(
            (0.0, 0.0),
            (2.0 / 3.0, 1.0),
            (4.0 / 3.0, -1.0),
            (2.0, 0.0),
        ));
        let hits = vertical_line_hits(&seg, 0.5);
        assert_eq!(hits.len(), 1);
        assert!((seg.eval(hits[0]).x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn outward_dirs_oppose_along_a_line() {
        let seg = PathSeg::Line(Line::new((0.0, 0.0), (1.0, 2.0)));
        let a = outward_dir(&seg, SegEnd::Start);
        let b = outward_dir(&seg, SegEnd::End);
        assert!(a.x > 0.0 && a.y > 0.0);
        assert!((a + b).hypot() < 1e-12);
    }

    #[test]
    fn outward_dir_with_retracted_control_point() {
        let seg = PathSeg::Cubic(CubicBez::new(
            (0.0, 0.0),
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
        ));
        let d = outward_dir(&seg, SegEnd::Start);
        assert!(d.hypot() > 0.0);
        assert!(d.x > 0.0);
    }

    #[test]
    fn curvature_sign_flips_with_direction() {
        let seg = PathSeg::Quad(QuadBez::new((0.0, 0.0), (1.0, 0.0), (1.0, 1.0)));
        assert!(outward_curvature(&seg, SegEnd::Start) > 0.0);
        assert!(outward_curvature(&seg, SegEnd::End) < 0.0);
    }

    #[test]
    fn degenerate_detection() {
        let tiny = PathSeg::Line(Line::new((0.0, 0.0), (1e-9, 0.0)));
        assert!(is_degenerate(&tiny, 1e-6));
        let real = PathSeg::Line(Line::new((0.0, 0.0), (1.0, 0.0)));
        assert!(!is_degenerate(&real, 1e-6));
    }
}
