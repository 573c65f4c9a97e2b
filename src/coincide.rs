//! Merging of coincident pieces.
//!
//! After subdivision, an overlap between two segments covers a whole number
//! of pieces on each side, and the covered pieces correspond one-to-one.
//! Tracing wants each stretch of shared geometry to appear once, so the
//! winding contribution of one piece of each pair is folded into the other
//! and the emptied piece drops out of every later pass.

use kurbo::ParamCurve as _;

use crate::intersect::Overlap;
use crate::segments::{SegIdx, Segments, Span, SpanRef};
use crate::winding::WindingNumber;
use crate::Epsilons;

/// Fold the winding contributions of overlapping pieces together.
///
/// For every piece pair covered by an overlap, the second piece's delta
/// moves onto the first (negated when the pieces run in opposite
/// directions), the pieces get linked into one coincidence cycle through
/// their `coincident` fields, and the emptied piece is marked done. A piece
/// whose merged delta cancels to zero separates identical windings and is
/// marked done too.
pub fn merge_coincident(segs: &mut Segments, overlaps: &[Overlap], eps: &Epsilons) {
    for o in overlaps {
        let first = segs.boundary_at(o.a, o.a_range.0);
        let last = segs.boundary_at(o.a, o.a_range.1);
        for span in first..last {
            let ra = SpanRef { seg: o.a, span };
            let m = segs.piece_midpoint(ra);
            let tb = nearest_param(segs, o.b, m);
            let rb = SpanRef {
                seg: o.b,
                span: piece_containing(segs, o.b, tb),
            };
            debug_assert!(
                (m - segs[o.b].eval(tb)).hypot() <= eps.point * 8.0,
                "overlap pieces drifted apart: {ra:?} vs {rb:?}"
            );
            merge_pair(segs, ra, rb, o.parallel());
        }
    }
}

/// Fold `rb`'s contribution into `ra` (or the other way around, if `ra` was
/// already emptied by an earlier overlap).
fn merge_pair(segs: &mut Segments, ra: SpanRef, rb: SpanRef, parallel: bool) {
    let canceled = |s: &Span| s.done && s.delta == WindingNumber::ZERO;
    let (keep, fold) = if !canceled(segs.span(ra)) {
        (ra, rb)
    } else if !canceled(segs.span(rb)) {
        (rb, ra)
    } else {
        // Three-way coincidence: both already folded into some third piece.
        return;
    };
    if canceled(segs.span(fold)) {
        // Already merged elsewhere; nothing left to move.
        return;
    }

    let moved = segs.span(fold).delta;
    let moved = if parallel { moved } else { -moved };
    // Splice the two pieces' coincidence cycles into one, treating an
    // unlinked piece as a cycle of itself. A stretch of boundary shared
    // three or more ways ends up as one cycle through all of its pieces.
    let after_keep = segs.span(keep).coincident.unwrap_or(keep);
    let after_fold = segs.span(fold).coincident.unwrap_or(fold);
    {
        let f = segs.span_mut(fold);
        f.delta = WindingNumber::ZERO;
        f.done = true;
        f.coincident = Some(after_keep);
    }
    let k = segs.span_mut(keep);
    k.delta += moved;
    k.coincident = Some(after_fold);
    if k.delta == WindingNumber::ZERO {
        // Equal windings on both sides: the piece separates nothing.
        k.done = true;
    }
}

fn nearest_param(segs: &Segments, idx: SegIdx, p: kurbo::Point) -> f64 {
    kurbo::ParamCurveNearest::nearest(&segs[idx], p, 1e-9).t
}

/// The index of the piece whose parameter range contains `t`.
fn piece_containing(segs: &Segments, idx: SegIdx, t: f64) -> usize {
    let spans = segs.spans(idx);
    let pos = spans.partition_point(|s| s.t <= t);
    pos.saturating_sub(1).min(spans.len() - 2)
}
