//! Ordering of the directions leaving a shared point.
//!
//! When several pieces of curve meet at a point, the winding sweep and the
//! tracer both need them arranged the way a walk around the point would meet
//! them. Directions sort by tangent angle; ties (tangential meetings) fall
//! back to curvature, and then to the identity of the piece, which keeps the
//! order stable between runs.

use crate::curve::SegEnd;
use crate::num::CheapOrderedFloat;
use crate::segments::SpanRef;
use crate::Epsilons;

/// One direction out of a shared point: a piece of curve by one of its ends.
#[derive(Clone, Debug)]
pub struct RingEdge {
    /// The piece.
    pub piece: SpanRef,
    /// Which end of the piece touches the shared point.
    pub end: SegEnd,
    /// Angle of the outward tangent, in `(-pi, pi]`.
    pub theta: f64,
    /// Signed curvature of the outward walk.
    pub kappa: f64,
}

impl RingEdge {
    /// Does the piece leave the shared point (as opposed to arrive at it)
    /// when walked in increasing `t`?
    pub fn outgoing(&self) -> bool {
        self.end == SegEnd::Start
    }
}

/// Sort the edges of one ring into walk-around order.
///
/// Edges whose angles tie within tolerance form a cluster; a cluster is a
/// tangential meeting, and the walk meets its members in order of how hard
/// they bend counterclockwise, so within a cluster curvature decides. A
/// cluster may straddle the wrap at ±pi; it still counts as one meeting.
///
/// Returns `false` if two distinct edges are indistinguishable by both angle
/// and curvature: the caller must not rely on the order between those two,
/// and resolves the point by other means.
pub fn sort_ring(edges: &mut [RingEdge], eps: &Epsilons) -> bool {
    edges.sort_by_key(|e| {
        (
            CheapOrderedFloat::from(e.theta),
            CheapOrderedFloat::from(e.kappa),
            e.piece,
            e.end == SegEnd::End,
        )
    });
    let n = edges.len();
    if n < 2 {
        return true;
    }

    // Rotate so no cluster straddles the ends of the slice: start at an edge
    // separated from its cyclic predecessor by more than the tolerance.
    let start =
        (0..n).find(|&i| !close_angles(edges[i].theta, edges[(i + n - 1) % n].theta, eps));
    let Some(start) = start else {
        // Every cyclic neighbor pair ties: the whole ring is one tangential
        // cluster, and only curvature can order it.
        edges.sort_by_key(kappa_key);
        return curvatures_distinct(edges, eps);
    };
    edges.rotate_left(start);

    let mut sortable = true;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && close_angles(edges[j].theta, edges[j - 1].theta, eps) {
            j += 1;
        }
        if j - i > 1 {
            edges[i..j].sort_by_key(kappa_key);
            sortable &= curvatures_distinct(&edges[i..j], eps);
        }
        i = j;
    }
    sortable
}

fn kappa_key(e: &RingEdge) -> (CheapOrderedFloat, SpanRef, bool) {
    (
        CheapOrderedFloat::from(e.kappa),
        e.piece,
        e.end == SegEnd::End,
    )
}

fn curvatures_distinct(cluster: &[RingEdge], eps: &Epsilons) -> bool {
    cluster
        .windows(2)
        .all(|w| !close_curvatures(w[0].kappa, w[1].kappa, eps))
}

/// Distance between two directions, around the circle.
fn close_angles(a: f64, b: f64, eps: &Epsilons) -> bool {
    let d = (a - b).abs();
    d.min(std::f64::consts::TAU - d) <= eps.angle
}

fn close_curvatures(a: f64, b: f64, eps: &Epsilons) -> bool {
    (a - b).abs() <= eps.curvature * (1.0 + a.abs().max(b.abs()))
}
