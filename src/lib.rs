#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod angle;
mod coincide;
mod curve;
mod geom;
mod intersect;
mod num;
mod segments;
mod trace;
mod vertex;
mod winding;

#[cfg(feature = "debug-svg")]
mod dump;

use kurbo::Shape;

use segments::{Operand, Segments};
use winding::WindingNumber;

/// A fill rule tells us how to decide whether a point is "inside" a path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
}

impl FillRule {
    fn inside(self, winding: i32) -> bool {
        match self {
            FillRule::EvenOdd => winding % 2 != 0,
            FillRule::NonZero => winding != 0,
        }
    }
}

/// Binary operations between the regions filled by two paths.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PathOp {
    /// A point is in the union if it is in either region.
    Union,
    /// A point is in the intersection if it is in both regions.
    Intersection,
    /// A point is in the difference if it is in the first region but not the second.
    Difference,
    /// A point is in the reverse difference if it is in the second region but not the first.
    ReverseDifference,
    /// A point is in the exclusive-or if it is in one region or the other, but not both.
    Xor,
}

impl PathOp {
    /// Is a point with this winding state inside the combined region?
    fn contains(self, fill_rule: FillRule, w: WindingNumber) -> bool {
        let in_a = fill_rule.inside(w.a);
        let in_b = fill_rule.inside(w.b);
        match self {
            PathOp::Union => in_a || in_b,
            PathOp::Intersection => in_a && in_b,
            PathOp::Difference => in_a && !in_b,
            PathOp::ReverseDifference => in_b && !in_a,
            PathOp::Xor => in_a != in_b,
        }
    }
}

/// The input paths were faulty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// At least one of the inputs was infinite.
    Infinity,
    /// At least one of the inputs had a NaN.
    NaN,
    /// One of the inputs had a drawing command before any move.
    Malformed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Infinity => write!(f, "one of the inputs was infinite"),
            Error::NaN => write!(f, "one of the inputs had a NaN"),
            Error::Malformed => write!(f, "one of the inputs drew before moving"),
        }
    }
}

impl std::error::Error for Error {}

/// Working tolerances, derived from the coordinate magnitude of the inputs.
#[derive(Clone, Copy, Debug)]
pub struct Epsilons {
    /// Distance below which two points count as the same point.
    pub point: f64,
    /// Parameter distance below which two subdivision points of one segment
    /// merge outright.
    pub param: f64,
    /// Angle difference (in radians) below which two directions out of a
    /// point are tied.
    pub angle: f64,
    /// Curvature difference (relative) below which two tied directions stay
    /// tied.
    pub curvature: f64,
}

impl Epsilons {
    /// Tolerances for inputs whose coordinates are at most `scale` in
    /// absolute value.
    pub fn for_scale(scale: f64) -> Epsilons {
        // TODO: we did some analysis for error bounds in the case of polylines.
        // Think more about what makes sense for curves.
        let point = (scale * (f64::EPSILON * 64.0)).max(1e-6);
        Epsilons {
            point,
            param: 1e-9,
            angle: 1e-6,
            curvature: 1e-6,
        }
    }
}

/// The result of combining two paths.
#[derive(Clone, Debug)]
pub struct Combined {
    /// The boundary of the combined region.
    ///
    /// Every contour is closed, and oriented so that the region keeps the
    /// winding convention of the inputs: a point inside the region has
    /// non-zero winding, holes are wound the other way.
    pub path: kurbo::BezPath,
    /// Whether every output contour made it back to its starting point.
    ///
    /// When this is false, the inputs defeated the tolerance handling
    /// somewhere (typically a cluster of near-tangent crossings); the path
    /// is still closed and usable, but its geometry is suspect near the
    /// trouble spot.
    pub closable: bool,
}

/// Computes a boolean operation between the regions filled by two paths.
///
/// Open contours are closed with a straight line first, as if by
/// `close_path`. The two inputs may each self-intersect and overlap each
/// other arbitrarily; the output boundary is simple wherever the inputs
/// allow it, with shared-edge runs appearing exactly once.
pub fn combine(
    path_a: &kurbo::BezPath,
    path_b: &kurbo::BezPath,
    fill_rule: FillRule,
    op: PathOp,
) -> Result<Combined, Error> {
    // Check the coordinates up front: NaN does not reliably survive a trip
    // through a bounding box, because IEEE min and max drop it.
    if path_a.is_nan() || path_b.is_nan() {
        return Err(Error::NaN);
    }
    if !path_a.is_finite() || !path_b.is_finite() {
        return Err(Error::Infinity);
    }

    // Find the extremal values, to figure out how much precision we can support.
    let bbox = path_a.bounding_box().union(path_b.bounding_box());
    let scale = bbox
        .min_x()
        .abs()
        .max(bbox.min_y().abs())
        .max(bbox.max_x().abs())
        .max(bbox.max_y().abs());
    let eps = Epsilons::for_scale(scale);
    debug_assert!(eps.point.is_finite());

    let mut segs = Segments::default();
    segs.add_path(path_a, Operand::A, &eps)?;
    segs.add_path(path_b, Operand::B, &eps)?;

    let overlaps = intersect::subdivide_all(&mut segs, &eps);
    coincide::merge_coincident(&mut segs, &overlaps, &eps);
    #[cfg(debug_assertions)]
    segs.check_invariants();

    let verts = vertex::Vertices::build(&segs, &eps);
    winding::assign(&mut segs, &verts, &eps);

    #[cfg(feature = "debug-svg")]
    {
        svg::save("out.svg", &dump::arena_svg(&segs, &verts)).unwrap();
    }

    let inside = |w: WindingNumber| op.contains(fill_rule, w);
    let (path, closable) = trace::trace(&mut segs, &verts, &inside, &eps);
    Ok(Combined { path, closable })
}
