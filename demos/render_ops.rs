use std::path::PathBuf;

use clap::{Args, Parser};
use kurbo::{BezPath, Circle, Ellipse, PathEl, Rect, Shape as _};
use svg::node::element::path::Data;
use svg::Document;

use pathcombine::{combine, FillRule, PathOp};

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Example {
    Squares,
    Circles,
    Blobs,
}

#[derive(Parser)]
struct Cli {
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    input: Input,

    #[arg(long)]
    non_zero: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// A file with two lines of SVG path data, one operand per line.
    input: Option<PathBuf>,

    #[arg(long)]
    example: Option<Example>,
}

fn get_paths(input: &Input) -> anyhow::Result<(BezPath, BezPath)> {
    match (&input.input, &input.example) {
        (Some(path), None) => {
            let input = std::fs::read_to_string(path)?;
            let mut lines = input.lines();
            let a = BezPath::from_svg(lines.next().unwrap_or(""))?;
            let b = BezPath::from_svg(lines.next().unwrap_or(""))?;
            Ok((a, b))
        }
        (None, Some(example)) => match example {
            Example::Squares => {
                let mut a = Rect::new(0.0, 0.0, 10.0, 10.0).to_path(1e-9);
                a.extend(Rect::new(12.0, 0.0, 16.0, 10.0).to_path(1e-9));
                let b = Rect::new(5.0, 5.0, 15.0, 15.0).to_path(1e-9);
                Ok((a, b))
            }
            Example::Circles => {
                let mut a = BezPath::new();
                for i in 0..3 {
                    a.extend(Circle::new((4.0 * i as f64, 0.0), 2.5).to_path(1e-9));
                }
                let b = Circle::new((4.0, 2.0), 3.5).to_path(1e-9);
                Ok((a, b))
            }
            Example::Blobs => {
                let a = Circle::new((5.0, 5.0), 4.5).to_path(1e-9);
                let b = Ellipse::new((8.0, 5.0), (5.5, 2.5), 0.6).to_path(1e-9);
                Ok((a, b))
            }
        },
        _ => unreachable!(),
    }
}

pub fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let (shape_a, shape_b) = get_paths(&args.input)?;
    let fill = if args.non_zero {
        FillRule::NonZero
    } else {
        FillRule::EvenOdd
    };

    let bbox = shape_a.bounding_box().union(shape_b.bounding_box());
    let pad = 1.0 + bbox.size().max_side() / 20.0;
    let one_width = bbox.width() + 2.0 * pad;
    let one_height = bbox.height() + 2.0 * pad;
    let stroke_width = bbox.size().max_side() / 512.0;
    let mut document = Document::new().set(
        "viewBox",
        (
            bbox.x0 - pad,
            bbox.y0 - pad,
            one_width * 3.0,
            one_height * 2.0,
        ),
    );

    // Draw the inputs in the first cell.
    for shape in [&shape_a, &shape_b] {
        let path = svg::node::element::Path::new()
            .set("stroke", "black")
            .set("stroke-width", stroke_width)
            .set("stroke-linecap", "round")
            .set("stroke-linejoin", "round")
            .set("opacity", 0.2)
            .set("fill", "none")
            .set("d", bez_data(shape, 0.0, 0.0));
        document = document.add(path);
    }

    let ops = [
        (PathOp::Union, one_width, 0.0, "#0A9396"),
        (PathOp::Intersection, one_width * 2.0, 0.0, "#EE9B00"),
        (PathOp::Xor, 0.0, one_height, "#94D2BD"),
        (PathOp::Difference, one_width, one_height, "#CA6702"),
        (PathOp::ReverseDifference, one_width * 2.0, one_height, "#9B2226"),
    ];
    for (op, x_off, y_off, color) in ops {
        let out = combine(&shape_a, &shape_b, fill, op)?;
        if !out.closable {
            eprintln!("warning: {op:?} left an open contour");
        }
        let path = svg::node::element::Path::new()
            .set("stroke", "black")
            .set("stroke-width", stroke_width)
            .set("stroke-linecap", "round")
            .set("stroke-linejoin", "round")
            .set("fill", color)
            .set("d", bez_data(&out.path, x_off, y_off));
        document = document.add(path);
    }

    svg::save(&args.output, &document)?;

    Ok(())
}

fn bez_data(path: &BezPath, x_off: f64, y_off: f64) -> Data {
    let mut data = Data::new();
    for el in path.elements() {
        data = match *el {
            PathEl::MoveTo(p) => data.move_to((p.x + x_off, p.y + y_off)),
            PathEl::LineTo(p) => data.line_to((p.x + x_off, p.y + y_off)),
            PathEl::QuadTo(p1, p2) => data.quadratic_curve_to((
                p1.x + x_off,
                p1.y + y_off,
                p2.x + x_off,
                p2.y + y_off,
            )),
            PathEl::CurveTo(p1, p2, p3) => data.cubic_curve_to((
                p1.x + x_off,
                p1.y + y_off,
                p2.x + x_off,
                p2.y + y_off,
                p3.x + x_off,
                p3.y + y_off,
            )),
            PathEl::ClosePath => data.close(),
        };
    }
    data
}
