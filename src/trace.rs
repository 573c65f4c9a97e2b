//! Extraction of the output contours.
//!
//! A piece of curve belongs on the output boundary exactly when the
//! "inside" predicate disagrees about its two sides. Tracing starts from
//! the topmost untraced boundary piece, walks with the output's inside on
//! the travel right, and picks each continuation by rotating around the
//! shared vertex to the nearest unconsumed boundary edge. Pieces are
//! consumed as they are emitted, so every boundary piece appears in the
//! output exactly once.

use kurbo::{BezPath, CubicBez, Line, ParamCurve as _, PathSeg, Point, QuadBez, Shape as _};

use crate::angle::RingEdge;
use crate::curve::SegEnd;
use crate::geom;
use crate::segments::{Segments, SpanRef};
use crate::vertex::{VertexIdx, Vertices};
use crate::winding::WindingNumber;
use crate::Epsilons;

/// Walking direction along a piece, relative to its parameterization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dir {
    Forward,
    Backward,
}

impl Dir {
    /// The end of the piece the walk arrives at.
    fn front(self) -> SegEnd {
        match self {
            Dir::Forward => SegEnd::End,
            Dir::Backward => SegEnd::Start,
        }
    }

    /// The end of the piece the walk departs from.
    fn rear(self) -> SegEnd {
        self.front().opposite()
    }
}

/// Trace every contour of the region where `pred` holds.
///
/// The returned flag is false if some contour got stuck before returning
/// to its starting point; the path is still emitted (and closed), but its
/// geometry is suspect.
pub fn trace<F: Fn(WindingNumber) -> bool>(
    segs: &mut Segments,
    verts: &Vertices,
    pred: &F,
    eps: &Epsilons,
) -> (BezPath, bool) {
    // Seed order: topmost first, ties going left, then arena order. This
    // keeps the output deterministic and starts outer contours before the
    // holes they contain.
    let mut order: Vec<SpanRef> = segs.piece_refs().collect();
    order.sort_by_key(|&r| {
        let (v0, v1) = verts.piece_vertices(r);
        let p = geom::Point::from_kurbo(verts.pos(v0)).min(geom::Point::from_kurbo(verts.pos(v1)));
        (p, r.seg, r.span)
    });

    let mut path = BezPath::new();
    let mut closable = true;
    for seed in order {
        if segs.span(seed).done || !active(segs, pred, seed) {
            continue;
        }
        closable &= trace_contour(segs, verts, pred, seed, &mut path, eps);
    }
    (path, closable)
}

/// Does the predicate flip across this piece?
fn active<F: Fn(WindingNumber) -> bool>(segs: &Segments, pred: &F, r: SpanRef) -> bool {
    match segs.span(r).windings {
        Some(w) => pred(w.left) != pred(w.right),
        None => false,
    }
}

/// Walk one contour starting from `seed`, appending it to `path`. Returns
/// whether the walk made it back to its starting vertex.
fn trace_contour<F: Fn(WindingNumber) -> bool>(
    segs: &mut Segments,
    verts: &Vertices,
    pred: &F,
    seed: SpanRef,
    path: &mut BezPath,
    eps: &Epsilons,
) -> bool {
    let w = segs.span(seed).windings.unwrap();
    let mut dir = if pred(w.right) {
        Dir::Forward
    } else {
        Dir::Backward
    };
    let mut cur = seed;
    let start = verts.piece_end(seed, dir.rear());

    let mut out = ContourWriter::new(path);
    loop {
        segs.span_mut(cur).done = true;
        if let Some(seg) = oriented_piece(segs, verts, cur, dir, eps) {
            out.push(seg);
        }
        let v = verts.piece_end(cur, dir.front());
        if v == start {
            out.close();
            return true;
        }
        match departure(segs, verts, pred, v, cur, dir) {
            Some((next, next_dir)) => {
                cur = next;
                dir = next_dir;
            }
            None => {
                // Nowhere to go: emit what we have as a (geometrically
                // open) closed contour and report the failure.
                out.close();
                return false;
            }
        }
    }
}

/// Choose the edge to leave `v` along, having arrived on `arrived`.
///
/// Rotating from the arrival edge towards the travel-right sector, inactive
/// edges are buried in uniform territory and get skipped; the continuation
/// is the first unconsumed edge where the predicate flips and the region
/// sits on its own travel right. Consumed edges are passed over too: at a
/// pinch the near lobe may already be walked, and the far one still closes
/// the contour. A ring with nothing left to walk means the trace is stuck.
fn departure<F: Fn(WindingNumber) -> bool>(
    segs: &Segments,
    verts: &Vertices,
    pred: &F,
    v: VertexIdx,
    arrived: SpanRef,
    dir: Dir,
) -> Option<(SpanRef, Dir)> {
    let ring = verts.ring(v);
    if !ring.sortable {
        // The angular order here is unreliable; take any remaining boundary
        // edge that keeps the inside on the travel right, and let the
        // closing check judge the result.
        let e = ring.edges.iter().find(|e| {
            e.piece != arrived
                && !segs.span(e.piece).done
                && active(segs, pred, e.piece)
                && inside_on_right(segs, pred, e)
        })?;
        return Some(depart_along(e));
    }

    let pos = verts.ring_position(v, arrived, dir.front())?;
    let n = ring.edges.len();
    for k in 1..n {
        let e = &ring.edges[(pos + n - k) % n];
        if !active(segs, pred, e.piece)
            || segs.span(e.piece).done
            || !inside_on_right(segs, pred, e)
        {
            continue;
        }
        return Some(depart_along(e));
    }
    None
}

fn depart_along(e: &RingEdge) -> (SpanRef, Dir) {
    if e.outgoing() {
        (e.piece, Dir::Forward)
    } else {
        (e.piece, Dir::Backward)
    }
}

/// Would departing along `e` put the region on the walk's right?
fn inside_on_right<F: Fn(WindingNumber) -> bool>(segs: &Segments, pred: &F, e: &RingEdge) -> bool {
    let w = segs.span(e.piece).windings.unwrap();
    if e.outgoing() {
        pred(w.right)
    } else {
        pred(w.left)
    }
}

/// The curve of a piece, endpoints snapped to their vertex positions,
/// oriented along the walk. `None` for pieces too small to matter: both
/// ends on one vertex and no real excursion away from it.
fn oriented_piece(
    segs: &Segments,
    verts: &Vertices,
    r: SpanRef,
    dir: Dir,
    eps: &Epsilons,
) -> Option<PathSeg> {
    let (v0, v1) = verts.piece_vertices(r);
    let curve = segs.piece_curve(r);
    if v0 == v1 {
        let bbox = curve.bounding_box();
        if bbox.width().max(bbox.height()) <= eps.point * 2.0 {
            return None;
        }
    }
    let snapped = snap_ends(curve, verts.pos(v0), verts.pos(v1));
    Some(match dir {
        Dir::Forward => snapped,
        Dir::Backward => snapped.reverse(),
    })
}

fn snap_ends(seg: PathSeg, p0: Point, p1: Point) -> PathSeg {
    match seg {
        PathSeg::Line(_) => PathSeg::Line(Line::new(p0, p1)),
        PathSeg::Quad(q) => PathSeg::Quad(QuadBez::new(p0, q.p1, p1)),
        PathSeg::Cubic(c) => PathSeg::Cubic(CubicBez::new(p0, c.p1, c.p2, p1)),
    }
}

/// Accumulates one contour, deferring the `move_to` until the first piece
/// so that fully-degenerate contours leave no trace.
struct ContourWriter<'a> {
    path: &'a mut BezPath,
    begun: bool,
}

impl<'a> ContourWriter<'a> {
    fn new(path: &'a mut BezPath) -> Self {
        ContourWriter { path, begun: false }
    }

    fn push(&mut self, seg: PathSeg) {
        if !self.begun {
            self.path.move_to(seg.start());
            self.begun = true;
        }
        match seg {
            PathSeg::Line(l) => self.path.line_to(l.p1),
            PathSeg::Quad(q) => self.path.quad_to(q.p1, q.p2),
            PathSeg::Cubic(c) => self.path.curve_to(c.p1, c.p2, c.p3),
        }
    }

    fn close(&mut self) {
        if self.begun {
            self.path.close_path();
        }
    }
}
