//! The segment arena: every input curve piece, its contour neighbors, and
//! its subdivision into spans.

use kurbo::{BezPath, ParamCurve as _, PathEl, PathSeg, Point, Rect, Shape as _};

use crate::curve;
use crate::winding::{SpanWindings, WindingNumber};
use crate::{Epsilons, Error};

/// An index into our segment arena.
///
/// Throughout this library, we assign identities to segments, so that we may
/// consider segments as different even if they have the same start- and end-points.
///
/// This index is used to identify a segment, whose data can be retrieved by looking
/// it up in [`Segments`]. (Of course, this index-as-identifier breaks down if there are
/// multiple `Segments` in flight. Just be careful not to mix them up.)
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct SegIdx(pub usize);

impl std::fmt::Debug for SegIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s_{}", self.0)
    }
}

/// Which input path a contour came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// The first path.
    A,
    /// The second path.
    B,
}

impl Operand {
    /// The crossing contribution of a plain segment of this operand.
    pub fn winding_delta(self) -> WindingNumber {
        match self {
            Operand::A => WindingNumber { a: 1, b: 0 },
            Operand::B => WindingNumber { a: 0, b: 1 },
        }
    }
}

/// A span and its owning segment, addressing one subdivision point in the
/// arena (and the piece of curve from there to the next subdivision point).
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct SpanRef {
    /// The owning segment.
    pub seg: SegIdx,
    /// The index into the segment's span list.
    pub span: usize,
}

impl std::fmt::Debug for SpanRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.seg, self.span)
    }
}

/// One subdivision point of a segment.
///
/// A span at parameter `t` owns the half-open piece of curve from `t` up to
/// the next span's parameter. The last span of every segment sits at `t = 1`
/// and owns the empty suffix; it exists so that every piece has a span at
/// both of its ends.
#[derive(Clone, Debug)]
pub struct Span {
    /// Subdivision parameter, in `[0, 1]`.
    pub t: f64,
    /// The span at the same point on a segment that intersects ours here.
    ///
    /// When three or more segments pass through one point, this keeps the
    /// first-recorded partner; the full incidence set is recovered from the
    /// vertex ring.
    pub other: Option<SpanRef>,
    /// The next span in this piece's coincidence cluster.
    ///
    /// Coincidence merging links every group of mutually overlapping pieces
    /// into one cycle; following the links from any member visits the whole
    /// cluster and comes back.
    pub coincident: Option<SpanRef>,
    /// Crossing contribution of this piece: winding just right of the walk
    /// minus winding just left of it. Coincidence merging adjusts this, and
    /// can cancel it entirely.
    pub delta: WindingNumber,
    /// Winding sums on both sides of this piece; `None` until the winding
    /// sweep reaches it. Once set, it is never rewritten.
    pub windings: Option<SpanWindings>,
    /// Whether this piece has been consumed (emitted to the output, or
    /// canceled by coincidence merging).
    pub done: bool,
}

impl Span {
    fn new(t: f64, delta: WindingNumber, done: bool) -> Self {
        Span {
            t,
            other: None,
            coincident: None,
            delta,
            windings: None,
            done,
        }
    }
}

/// An arena of curve segments, split into contours.
///
/// Segments are indexed by [`SegIdx`] and can be retrieved by indexing (i.e. with square brackets).
#[derive(Debug, Clone, Default)]
pub struct Segments {
    segs: Vec<PathSeg>,
    operand: Vec<Operand>,
    contour_prev: Vec<SegIdx>,
    contour_next: Vec<SegIdx>,
    spans: Vec<Vec<Span>>,
}

impl std::ops::Index<SegIdx> for Segments {
    type Output = PathSeg;

    fn index(&self, index: SegIdx) -> &Self::Output {
        &self.segs[index.0]
    }
}

impl Segments {
    /// The number of segments in this arena.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.segs.len()
    }

    /// Iterate over all indices that can be used to index into this arena.
    pub fn indices(&self) -> impl Iterator<Item = SegIdx> {
        (0..self.segs.len()).map(SegIdx)
    }

    /// Which input path does this segment belong to?
    pub fn operand(&self, idx: SegIdx) -> Operand {
        self.operand[idx.0]
    }

    /// The segment following `idx` in its contour. Contours are always
    /// closed, so this wraps around.
    pub fn contour_next(&self, idx: SegIdx) -> SegIdx {
        self.contour_next[idx.0]
    }

    /// The segment preceding `idx` in its contour.
    pub fn contour_prev(&self, idx: SegIdx) -> SegIdx {
        self.contour_prev[idx.0]
    }

    /// Are the two segments neighbors in the same contour?
    pub fn adjacent_in_contour(&self, i: SegIdx, j: SegIdx) -> bool {
        self.contour_next[i.0] == j || self.contour_next[j.0] == i
    }

    /// The spans of a segment, ordered by `t`.
    pub fn spans(&self, idx: SegIdx) -> &[Span] {
        &self.spans[idx.0]
    }

    /// Mutable access to one span.
    pub fn span_mut(&mut self, r: SpanRef) -> &mut Span {
        &mut self.spans[r.seg.0][r.span]
    }

    /// Shared access to one span.
    pub fn span(&self, r: SpanRef) -> &Span {
        &self.spans[r.seg.0][r.span]
    }

    /// The number of pieces of a segment (one less than the number of spans).
    pub fn piece_count(&self, idx: SegIdx) -> usize {
        self.spans[idx.0].len() - 1
    }

    /// All pieces in the arena, in (segment, span) order.
    pub fn piece_refs(&self) -> impl Iterator<Item = SpanRef> + '_ {
        self.indices().flat_map(move |seg| {
            (0..self.piece_count(seg)).map(move |span| SpanRef { seg, span })
        })
    }

    /// The parameter range of a piece.
    pub fn piece_range(&self, r: SpanRef) -> std::ops::Range<f64> {
        self.spans[r.seg.0][r.span].t..self.spans[r.seg.0][r.span + 1].t
    }

    /// The curve of a piece, as a segment of its own.
    pub fn piece_curve(&self, r: SpanRef) -> PathSeg {
        self[r.seg].subsegment(self.piece_range(r))
    }

    /// The point in the middle of a piece.
    pub fn piece_midpoint(&self, r: SpanRef) -> Point {
        let range = self.piece_range(r);
        self[r.seg].eval((range.start + range.end) / 2.0)
    }

    /// The endpoints of a piece, in increasing-`t` order.
    pub fn piece_endpoints(&self, r: SpanRef) -> (Point, Point) {
        let range = self.piece_range(r);
        (self[r.seg].eval(range.start), self[r.seg].eval(range.end))
    }

    /// Add all contours of a path to the arena.
    ///
    /// Every contour is closed, whether or not the path closed it: a
    /// trailing gap gets an implicit closing line. Segments smaller than the
    /// point tolerance are dropped. A drawing command before any move is an
    /// error.
    pub fn add_path(&mut self, path: &BezPath, operand: Operand, eps: &Epsilons) -> Result<(), Error> {
        let mut start: Option<Point> = None;
        let mut cur = Point::ZERO;
        let mut contour_begin = self.segs.len();

        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    self.close_contour(contour_begin, start, cur, operand, eps);
                    contour_begin = self.segs.len();
                    start = Some(p);
                    cur = p;
                }
                PathEl::LineTo(p) => {
                    if start.is_none() {
                        return Err(Error::Malformed);
                    }
                    self.push_seg(PathSeg::Line(kurbo::Line::new(cur, p)), operand, eps);
                    cur = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    if start.is_none() {
                        return Err(Error::Malformed);
                    }
                    self.push_seg(PathSeg::Quad(kurbo::QuadBez::new(cur, p1, p2)), operand, eps);
                    cur = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    if start.is_none() {
                        return Err(Error::Malformed);
                    }
                    self.push_seg(
                        PathSeg::Cubic(kurbo::CubicBez::new(cur, p1, p2, p3)),
                        operand,
                        eps,
                    );
                    cur = p3;
                }
                PathEl::ClosePath => {
                    if let Some(s) = start {
                        self.close_contour(contour_begin, Some(s), cur, operand, eps);
                        contour_begin = self.segs.len();
                        cur = s;
                        // A further drawing command without a fresh move
                        // starts a new contour from the same point.
                    }
                }
            }
        }
        self.close_contour(contour_begin, start, cur, operand, eps);
        Ok(())
    }

    fn push_seg(&mut self, seg: PathSeg, operand: Operand, eps: &Epsilons) {
        if curve::is_degenerate(&seg, eps.point) {
            return;
        }
        let idx = self.segs.len();
        self.segs.push(seg);
        self.operand.push(operand);
        // Provisional links; fixed up when the contour is closed.
        self.contour_prev.push(SegIdx(idx.saturating_sub(1)));
        self.contour_next.push(SegIdx(idx + 1));
        self.spans.push(vec![
            Span::new(0.0, operand.winding_delta(), false),
            Span::new(1.0, WindingNumber::ZERO, true),
        ]);
    }

    /// Close off the contour whose segments start at arena index
    /// `contour_begin`, adding a closing line if there's a gap.
    fn close_contour(
        &mut self,
        contour_begin: usize,
        start: Option<Point>,
        cur: Point,
        operand: Operand,
        eps: &Epsilons,
    ) {
        let Some(start) = start else {
            return;
        };
        if (cur - start).hypot() > eps.point {
            self.push_seg(PathSeg::Line(kurbo::Line::new(cur, start)), operand, eps);
        }
        let contour_end = self.segs.len();
        if contour_begin < contour_end {
            self.contour_prev[contour_begin] = SegIdx(contour_end - 1);
            self.contour_next[contour_end - 1] = SegIdx(contour_begin);
        }
    }

    /// Insert a subdivision point at `t`, returning the index of its span.
    ///
    /// Parameters within tolerance of an existing subdivision point merge
    /// into it (the earlier point wins); this keeps the span list strictly
    /// increasing. The new piece inherits the split piece's bookkeeping.
    pub fn add_boundary(&mut self, idx: SegIdx, t: f64, eps: &Epsilons) -> usize {
        let spans = &mut self.spans[idx.0];
        let pos = spans.partition_point(|s| s.t < t);
        // pos is the first span with s.t >= t; the candidates for merging
        // are pos and pos - 1.
        if pos < spans.len() && close_params(&self.segs[idx.0], spans[pos].t, t, eps) {
            return pos;
        }
        if pos > 0 && close_params(&self.segs[idx.0], spans[pos - 1].t, t, eps) {
            return pos - 1;
        }
        debug_assert!(pos > 0 && pos < spans.len(), "t={t} escapes [0, 1]");
        let mut span = Span::new(t, spans[pos - 1].delta, spans[pos - 1].done);
        span.windings = spans[pos - 1].windings;
        spans.insert(pos, span);
        pos
    }

    /// The span index of the existing subdivision point nearest to `t`.
    pub fn boundary_at(&self, idx: SegIdx, t: f64) -> usize {
        let spans = &self.spans[idx.0];
        let pos = spans.partition_point(|s| s.t < t);
        if pos == 0 {
            return 0;
        }
        if pos == spans.len() {
            return spans.len() - 1;
        }
        if (spans[pos].t - t).abs() <= (t - spans[pos - 1].t).abs() {
            pos
        } else {
            pos - 1
        }
    }

    /// The tight bounding box of everything in the arena, or `None` if it's
    /// empty.
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut rect: Option<Rect> = None;
        for seg in &self.segs {
            let b = seg.bounding_box();
            rect = Some(rect.map_or(b, |r| r.union(b)));
        }
        rect
    }

    /// Check internal invariants, panicking on violations.
    ///
    /// The cheap checks always run; the quadratic ones only with the
    /// `slow-asserts` feature.
    pub fn check_invariants(&self) {
        for idx in self.indices() {
            let spans = &self.spans[idx.0];
            assert!(spans.len() >= 2);
            assert_eq!(spans[0].t, 0.0);
            assert_eq!(spans[spans.len() - 1].t, 1.0);
            for w in spans.windows(2) {
                assert!(w[0].t < w[1].t);
            }
            assert_eq!(self.contour_next[self.contour_prev[idx.0].0], idx);
            assert_eq!(self.contour_prev[self.contour_next[idx.0].0], idx);
            assert_eq!(self.operand[idx.0], self.operand[self.contour_next[idx.0].0]);
        }

        #[cfg(feature = "slow-asserts")]
        {
            let total = self.piece_refs().count();
            for r in self.piece_refs().collect::<Vec<_>>() {
                if let Some(other) = self.span(r).other {
                    let (p, _) = self.piece_endpoints(r);
                    let q = self[other.seg].eval(self.span(other).t);
                    assert!((p - q).hypot() < 1e-3, "far-apart partners {r:?} {other:?}");
                }
                if let Some(first) = self.span(r).coincident {
                    let mut cur = first;
                    let mut steps = 1;
                    while cur != r {
                        let next = self.span(cur).coincident;
                        assert!(next.is_some(), "coincidence cycle breaks at {cur:?}");
                        cur = next.unwrap();
                        steps += 1;
                        assert!(steps <= total, "coincidence links do not cycle at {r:?}");
                    }
                }
            }
        }
    }
}

/// Are two parameters on `seg` close enough to be the same subdivision
/// point? Either parametrically, or because the curve maps them to nearly
/// the same place.
fn close_params(seg: &PathSeg, s: f64, t: f64, eps: &Epsilons) -> bool {
    if (s - t).abs() <= eps.param {
        return true;
    }
    (s - t).abs() < 0.5 && (seg.eval(s) - seg.eval(t)).hypot() <= eps.point * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape as _;

    fn eps() -> Epsilons {
        Epsilons::for_scale(10.0)
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
        Rect::new(x0, y0, x1, y1).to_path(1e-9)
    }

    #[test]
    fn square_becomes_a_four_cycle() {
        let mut segs = Segments::default();
        segs.add_path(&square(0.0, 0.0, 1.0, 1.0), Operand::A, &eps())
            .unwrap();
        assert_eq!(segs.len(), 4);
        let mut idx = SegIdx(0);
        for _ in 0..4 {
            idx = segs.contour_next(idx);
        }
        assert_eq!(idx, SegIdx(0));
        segs.check_invariants();
    }

    #[test]
    fn open_contour_gets_closed() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0, 0.0));
        path.line_to((1.0, 1.0));
        let mut segs = Segments::default();
        segs.add_path(&path, Operand::B, &eps()).unwrap();
        assert_eq!(segs.len(), 3);
        let (_, end) = segs.piece_endpoints(SpanRef { seg: SegIdx(2), span: 0 });
        assert!((end - Point::new(0.0, 0.0)).hypot() < 1e-12);
        segs.check_invariants();
    }

    #[test]
    fn drawing_before_move_is_malformed() {
        let path = BezPath::from_vec(vec![PathEl::LineTo(Point::new(1.0, 1.0))]);
        let mut segs = Segments::default();
        assert!(matches!(
            segs.add_path(&path, Operand::A, &eps()),
            Err(Error::Malformed)
        ));
    }

    #[test]
    fn boundaries_stay_sorted_and_merge() {
        let mut segs = Segments::default();
        segs.add_path(&square(0.0, 0.0, 4.0, 4.0), Operand::A, &eps())
            .unwrap();
        let idx = SegIdx(0);
        segs.add_boundary(idx, 0.5, &eps());
        segs.add_boundary(idx, 0.25, &eps());
        // Within parametric tolerance of an existing boundary: merges.
        let merged = segs.add_boundary(idx, 0.5 + 1e-12, &eps());
        assert_eq!(segs.spans(idx).len(), 4);
        assert_eq!(merged, 2);
        assert_eq!(segs.boundary_at(idx, 0.26), 1);
        segs.check_invariants();
    }

    #[test]
    fn degenerate_segments_are_dropped() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((1e-9, 0.0));
        path.line_to((1.0, 0.0));
        path.line_to((1.0, 1.0));
        path.close_path();
        let mut segs = Segments::default();
        segs.add_path(&path, Operand::A, &eps()).unwrap();
        assert_eq!(segs.len(), 3);
        segs.check_invariants();
    }
}
