//! Debug rendering of the segment arena.

use kurbo::{ParamCurve as _, PathSeg};
use svg::node::element::path::Data;
use svg::Document;

use crate::segments::{Operand, Segments};
use crate::vertex::Vertices;

/// Render every piece of the arena (color-coded by operand, with the
/// shared vertices marked) so a failing case can be eyeballed.
pub fn arena_svg(segs: &Segments, verts: &Vertices) -> Document {
    let bbox = segs.bounding_box().unwrap_or(kurbo::Rect::ZERO);
    let pad = 0.05 * bbox.width().max(bbox.height()).max(1.0);
    let stroke = pad / 10.0;
    let mut doc = Document::new().set(
        "viewBox",
        (
            bbox.x0 - pad,
            bbox.y0 - pad,
            bbox.width() + 2.0 * pad,
            bbox.height() + 2.0 * pad,
        ),
    );

    for r in segs.piece_refs() {
        let curve = segs.piece_curve(r);
        let mut data = Data::new().move_to((curve.start().x, curve.start().y));
        data = match curve {
            PathSeg::Line(l) => data.line_to((l.p1.x, l.p1.y)),
            PathSeg::Quad(q) => data.quadratic_curve_to((q.p1.x, q.p1.y, q.p2.x, q.p2.y)),
            PathSeg::Cubic(c) => {
                data.cubic_curve_to((c.p1.x, c.p1.y, c.p2.x, c.p2.y, c.p3.x, c.p3.y))
            }
        };
        let color = match (segs.operand(r.seg), segs.span(r).done) {
            (_, true) => "gray",
            (Operand::A, _) => "red",
            (Operand::B, _) => "blue",
        };
        let path = svg::node::element::Path::new()
            .set("stroke", color)
            .set("stroke-width", stroke)
            .set("fill", "none")
            .set("d", data);
        doc = doc.add(path);
    }

    for v in 0..verts.len() {
        let p = verts.pos(crate::vertex::VertexIdx(v));
        let c = svg::node::element::Circle::new()
            .set("cx", p.x)
            .set("cy", p.y)
            .set("r", stroke * 1.5)
            .set("fill", "black");
        doc = doc.add(c);
    }

    doc
}
