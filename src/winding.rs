//! Winding sums: how many times each input path wraps around each side of
//! every piece of curve.
//!
//! Pieces get their sums in frontier order (topmost first, ties going left).
//! A piece whose shared endpoint already has a resolved neighbor takes its
//! sums from walking around that point; everything else falls back to an
//! axis-aligned ray cast. Either way the sums are derived, never guessed,
//! and once written they are final.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use kurbo::{ParamCurve as _, Vec2};

use crate::curve::{self, SegEnd};
use crate::geom;
use crate::segments::{SegIdx, Segments, SpanRef};
use crate::vertex::{VertexIdx, Vertices};
use crate::Epsilons;

/// We support boolean operations, so a "winding number" for us is two winding
/// numbers, one for each input path.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct WindingNumber {
    /// The winding number of the first path.
    pub a: i32,
    /// The winding number of the second path.
    pub b: i32,
}

impl WindingNumber {
    /// Zero on both paths.
    pub const ZERO: WindingNumber = WindingNumber { a: 0, b: 0 };
}

impl std::fmt::Debug for WindingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}a + {}b", self.a, self.b)
    }
}

impl std::ops::Add for WindingNumber {
    type Output = WindingNumber;

    fn add(self, rhs: WindingNumber) -> WindingNumber {
        WindingNumber {
            a: self.a + rhs.a,
            b: self.b + rhs.b,
        }
    }
}

impl std::ops::AddAssign for WindingNumber {
    fn add_assign(&mut self, rhs: WindingNumber) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for WindingNumber {
    type Output = WindingNumber;

    fn sub(self, rhs: WindingNumber) -> WindingNumber {
        WindingNumber {
            a: self.a - rhs.a,
            b: self.b - rhs.b,
        }
    }
}

impl std::ops::Neg for WindingNumber {
    type Output = WindingNumber;

    fn neg(self) -> WindingNumber {
        WindingNumber {
            a: -self.a,
            b: -self.b,
        }
    }
}

/// For a piece of curve, we store two winding numbers (one on each side).
///
/// For plain pieces, the winding numbers on the two sides differ by one on
/// the owning path. Once we merge overlapping pieces, they can differ by
/// more, on both paths at once.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct SpanWindings {
    /// Walk the piece in increasing `t`. This is the winding number of the
    /// area just to your left.
    pub left: WindingNumber,
    /// Walk the piece in increasing `t`. This is the winding number of the
    /// area just to your right.
    pub right: WindingNumber,
}

impl std::fmt::Debug for SpanWindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} | {:?}", self.left, self.right)
    }
}

/// How many times a cast ray gets re-aimed before we accept a suspicious
/// answer.
const RAY_RETRIES: usize = 4;

/// Assign winding sums to every piece with a nonzero crossing contribution.
///
/// Whole-ring walks spread each resolved piece's sums to its neighborhood,
/// so the expensive ray only runs once per connected group (plus once per
/// unsortable point that nothing else reaches).
pub fn assign(segs: &mut Segments, verts: &Vertices, eps: &Epsilons) {
    let mut frontier: BinaryHeap<Reverse<(geom::Point, SegIdx, usize)>> = BinaryHeap::new();
    for r in segs.piece_refs().collect::<Vec<_>>() {
        if segs.span(r).delta == WindingNumber::ZERO {
            continue;
        }
        let (v0, v1) = verts.piece_vertices(r);
        let p = geom::Point::from_kurbo(verts.pos(v0)).min(geom::Point::from_kurbo(verts.pos(v1)));
        frontier.push(Reverse((p, r.seg, r.span)));
    }

    let mut ring_done = vec![false; verts.len()];
    while let Some(Reverse((_, seg, span))) = frontier.pop() {
        let r = SpanRef { seg, span };
        if segs.span(r).windings.is_some() {
            continue;
        }
        let w = ray_windings(segs, r, eps);
        set_windings(segs, r, w);

        // Flood outward from the fresh assignment through every sortable
        // ring it touches.
        let (v0, v1) = verts.piece_vertices(r);
        let mut queue: VecDeque<VertexIdx> = VecDeque::new();
        queue.push_back(v0);
        queue.push_back(v1);
        while let Some(v) = queue.pop_front() {
            if ring_done[v.0] {
                continue;
            }
            let newly = propagate_ring(segs, verts, v);
            if newly.is_empty() && !fully_assigned(segs, verts, v) {
                // Leave the ring for later; another flood may anchor it.
                continue;
            }
            ring_done[v.0] = true;
            queue.extend(newly);
        }
    }
}

fn fully_assigned(segs: &Segments, verts: &Vertices, v: VertexIdx) -> bool {
    verts
        .ring(v)
        .edges
        .iter()
        .all(|e| segs.span(e.piece).windings.is_some())
}

fn set_windings(segs: &mut Segments, r: SpanRef, w: SpanWindings) {
    let span = segs.span_mut(r);
    debug_assert!(span.windings.is_none(), "rewriting windings of {r:?}");
    debug_assert_eq!(w.right - w.left, span.delta, "windings disagree with delta");
    span.windings = Some(w);
}

/// Walk once around a sortable ring, deriving sums for every edge from one
/// already-assigned anchor. Returns the far vertices of newly assigned
/// pieces, empty if there was no anchor (or the ring can't be walked).
fn propagate_ring(segs: &mut Segments, verts: &Vertices, v: VertexIdx) -> Vec<VertexIdx> {
    let ring = verts.ring(v);
    if !ring.sortable || ring.edges.is_empty() {
        return Vec::new();
    }
    let Some(anchor) = ring
        .edges
        .iter()
        .position(|e| segs.span(e.piece).windings.is_some())
    else {
        return Vec::new();
    };

    let n = ring.edges.len();
    let anchor_w = segs.span(ring.edges[anchor].piece).windings.unwrap();
    // The sector just past an edge, walking in increasing angle: for a piece
    // leaving the point, that's its right side; for one arriving, its left.
    let mut sector = if ring.edges[anchor].outgoing() {
        anchor_w.right
    } else {
        anchor_w.left
    };

    let mut new_far = Vec::new();
    for k in 1..=n {
        let e = &ring.edges[(anchor + k) % n];
        let delta = segs.span(e.piece).delta;
        let next = if e.outgoing() {
            sector + delta
        } else {
            sector - delta
        };
        let cand = if e.outgoing() {
            SpanWindings {
                left: sector,
                right: next,
            }
        } else {
            SpanWindings {
                left: next,
                right: sector,
            }
        };
        match segs.span(e.piece).windings {
            None => {
                set_windings(segs, e.piece, cand);
                new_far.push(verts.piece_end(e.piece, e.end.opposite()));
            }
            #[allow(unused_variables)]
            Some(w) => {
                #[cfg(feature = "slow-asserts")]
                assert_eq!(w, cand, "ring at {v:?} disagrees about {:?}", e.piece);
            }
        }
        sector = next;
    }
    new_far
}

/// Derive a piece's winding sums by shooting an axis-aligned ray from its
/// midpoint and counting signed crossings.
///
/// The ray runs perpendicular-ish to the piece: upward when the local
/// tangent is more horizontal, rightward otherwise. Crossings that graze a
/// subdivision point or run tangent to the ray can't be counted reliably,
/// so those casts are retried with a nudged origin; after [`RAY_RETRIES`]
/// attempts the suspicious count is accepted as-is.
fn ray_windings(segs: &Segments, r: SpanRef, eps: &Epsilons) -> SpanWindings {
    let range = segs.piece_range(r);
    let tmid = (range.start + range.end) / 2.0;
    let m = segs[r.seg].eval(tmid);
    let d = curve::deriv(&segs[r.seg], tmid);
    // Ray direction, pointing away from the piece's side we'll attribute to.
    let u = if d.x.abs() >= d.y.abs() {
        Vec2::new(0.0, -1.0)
    } else {
        Vec2::new(1.0, 0.0)
    };

    for attempt in 0..=RAY_RETRIES {
        let accept_suspicious = attempt == RAY_RETRIES;
        // Nudges shift the ray along the piece, perpendicular to `u`; the
        // last attempt goes back to the midpoint and takes what it finds.
        let nudge = if accept_suspicious {
            Vec2::ZERO
        } else {
            let k = attempt.div_ceil(2) as f64 * 32.0;
            let sign = if attempt % 2 == 0 { 1.0 } else { -1.0 };
            Vec2::new(-u.y, u.x) * (k * sign * eps.point)
        };
        if let Some(w) = cast_ray(segs, r, tmid, m + nudge, u, d, accept_suspicious, eps) {
            return w;
        }
    }
    unreachable!("the final ray cast accepts whatever it sees")
}

/// One ray cast. Returns `None` if a crossing was too suspicious to count
/// and `accept_suspicious` wasn't set.
#[allow(clippy::too_many_arguments)]
fn cast_ray(
    segs: &Segments,
    r: SpanRef,
    tmid: f64,
    origin: kurbo::Point,
    u: Vec2,
    d: Vec2,
    accept_suspicious: bool,
    eps: &Epsilons,
) -> Option<SpanWindings> {
    let normal = Vec2::new(-u.y, u.x);

    // Find where our own piece crosses the ray's support line; crossings are
    // counted from there, so that the answer is the winding just on the
    // `u` side of the piece even when the origin was nudged.
    let own_hits = curve::line_hits(&segs[r.seg], origin, normal);
    let range = segs.piece_range(r);
    let own = own_hits
        .iter()
        .copied()
        .filter(|t| (range.start - 1e-6..=range.end + 1e-6).contains(t))
        .min_by_key(|t| crate::num::CheapOrderedFloat::from((t - tmid).abs()));
    let (own_t, own_q) = match own {
        Some(t) => (t, segs[r.seg].eval(t)),
        // The last attempt is unperturbed, so its support line runs through
        // the midpoint itself.
        None if accept_suspicious => (tmid, origin),
        None => return None,
    };

    let mut w = WindingNumber::ZERO;
    for seg in segs.indices() {
        for t in curve::line_hits(&segs[seg], origin, normal) {
            let q = segs[seg].eval(t);
            if seg == r.seg && (t - own_t).abs() <= 1e-9 {
                continue;
            }
            let beyond = (q - own_q).dot(u);
            if beyond <= 0.0 {
                continue;
            }
            let spans = segs.spans(seg);
            let piece = spans.partition_point(|s| s.t <= t).saturating_sub(1);
            let piece = piece.min(spans.len() - 2);
            let delta = spans[piece].delta;
            if delta == WindingNumber::ZERO {
                continue;
            }
            let dq = curve::deriv(&segs[seg], t);
            if !accept_suspicious {
                if u.cross(dq).abs() <= 1e-9 * dq.hypot() {
                    return None;
                }
                if beyond <= eps.point {
                    return None;
                }
                let near_boundary = spans
                    .iter()
                    .any(|s| (segs[seg].eval(s.t) - q).hypot() <= eps.point);
                if near_boundary {
                    return None;
                }
            }
            w += if u.cross(dq) > 0.0 { delta } else { -delta };
        }
    }

    // `w` is the winding on the `u` side of our piece. Which walk side is
    // that: the side `u` points into.
    let delta = segs.span(r).delta;
    Some(if u.dot(Vec2::new(d.y, -d.x)) > 0.0 {
        SpanWindings {
            left: w,
            right: w + delta,
        }
    } else {
        SpanWindings {
            left: w - delta,
            right: w,
        }
    })
}
