//! Shared vertices: subdivision points clustered by position, and the rings
//! of directions around them.
//!
//! Subdivision points that land within tolerance of one another (the two
//! halves of an intersection, contour corners, overlap endpoints) are the
//! same place as far as the topology is concerned. Clustering them up front
//! means the rest of the pipeline compares vertex identities instead of
//! re-deriving "is this the same point" from coordinates.

use kurbo::Point;

use crate::angle::{sort_ring, RingEdge};
use crate::curve::{self, SegEnd};
use crate::segments::{SegIdx, Segments, SpanRef};
use crate::winding::WindingNumber;
use crate::Epsilons;

/// An index into the vertex set.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct VertexIdx(pub usize);

impl std::fmt::Debug for VertexIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v_{}", self.0)
    }
}

/// The directions out of one vertex, in walk-around order.
#[derive(Clone, Debug, Default)]
pub struct Ring {
    /// The edges, sorted by angle when `sortable`.
    pub edges: Vec<RingEdge>,
    /// Whether the angular order is trustworthy. When two edges leave with
    /// the same angle and curvature, it isn't, and consumers fall back to
    /// cruder tools.
    pub sortable: bool,
}

/// All shared vertices of an arrangement.
#[derive(Clone, Debug)]
pub struct Vertices {
    pos: Vec<Point>,
    /// Parallel to the arena's span lists: the vertex of every subdivision
    /// point.
    vertex_of: Vec<Vec<VertexIdx>>,
    rings: Vec<Ring>,
}

impl Vertices {
    /// Cluster every subdivision point in the arena and build the rings.
    ///
    /// Canceled pieces (zero crossing contribution) take no part in rings;
    /// they are invisible to the topology.
    pub fn build(segs: &Segments, eps: &Epsilons) -> Self {
        // Sort all subdivision points by position, then sweep a window over
        // them: a point joins the cluster of the first earlier point within
        // tolerance, so the cluster's canonical position is the smallest
        // (y, x) member seen.
        let mut boundary_points: Vec<(crate::geom::Point, SegIdx, usize)> = Vec::new();
        for seg in segs.indices() {
            for (span_idx, span) in segs.spans(seg).iter().enumerate() {
                let p = kurbo::ParamCurve::eval(&segs[seg], span.t);
                boundary_points.push((crate::geom::Point::from_kurbo(p), seg, span_idx));
            }
        }
        boundary_points.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

        let mut pos: Vec<Point> = Vec::new();
        let mut vertex_of: Vec<Vec<VertexIdx>> = segs
            .indices()
            .map(|seg| vec![VertexIdx(usize::MAX); segs.spans(seg).len()])
            .collect();
        // Clusters whose canonical position is within the window height of
        // the current sweep position.
        let mut active: Vec<VertexIdx> = Vec::new();
        for (p, seg, span_idx) in boundary_points {
            active.retain(|v| pos[v.0].y >= p.y - eps.point);
            let found = active
                .iter()
                .copied()
                .find(|v| p.to_kurbo().distance(pos[v.0]) <= eps.point);
            let v = match found {
                Some(v) => v,
                None => {
                    let v = VertexIdx(pos.len());
                    pos.push(p.to_kurbo());
                    active.push(v);
                    v
                }
            };
            vertex_of[seg.0][span_idx] = v;
        }

        let mut rings: Vec<Ring> = vec![Ring::default(); pos.len()];
        for r in segs.piece_refs() {
            if segs.span(r).delta == WindingNumber::ZERO {
                continue;
            }
            let piece = segs.piece_curve(r);
            for end in [SegEnd::Start, SegEnd::End] {
                let v = match end {
                    SegEnd::Start => vertex_of[r.seg.0][r.span],
                    SegEnd::End => vertex_of[r.seg.0][r.span + 1],
                };
                let dir = curve::outward_dir(&piece, end);
                rings[v.0].edges.push(RingEdge {
                    piece: r,
                    end,
                    theta: dir.atan2(),
                    kappa: curve::outward_curvature(&piece, end),
                });
            }
        }
        for ring in &mut rings {
            ring.sortable = sort_ring(&mut ring.edges, eps);
        }

        Vertices {
            pos,
            vertex_of,
            rings,
        }
    }

    /// The number of vertices.
    pub fn len(&self) -> usize {
        self.pos.len()
    }

    /// The canonical position of a vertex.
    pub fn pos(&self, v: VertexIdx) -> Point {
        self.pos[v.0]
    }

    /// The vertex at a subdivision point.
    pub fn at(&self, r: SpanRef) -> VertexIdx {
        self.vertex_of[r.seg.0][r.span]
    }

    /// The vertices at the two ends of a piece, in increasing-`t` order.
    pub fn piece_vertices(&self, r: SpanRef) -> (VertexIdx, VertexIdx) {
        (
            self.vertex_of[r.seg.0][r.span],
            self.vertex_of[r.seg.0][r.span + 1],
        )
    }

    /// The vertex at the given end of a piece.
    pub fn piece_end(&self, r: SpanRef, end: SegEnd) -> VertexIdx {
        match end {
            SegEnd::Start => self.vertex_of[r.seg.0][r.span],
            SegEnd::End => self.vertex_of[r.seg.0][r.span + 1],
        }
    }

    /// The ring of a vertex.
    pub fn ring(&self, v: VertexIdx) -> &Ring {
        &self.rings[v.0]
    }

    /// Where in the (sorted) ring of `v` the given edge sits.
    pub fn ring_position(&self, v: VertexIdx, piece: SpanRef, end: SegEnd) -> Option<usize> {
        self.rings[v.0]
            .edges
            .iter()
            .position(|e| e.piece == piece && e.end == end)
    }
}
