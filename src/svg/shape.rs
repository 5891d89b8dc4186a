use crate::svg::ElementKind;
use crate::{Error, Result};
use kurbo::Point;
use std::fmt::Write as _;

/// Expand a shape primitive into path data.
///
/// Returns `None` for `<path>`, whose data needs no expansion. The produced
/// strings go through the regular `d` parser, so shapes and paths share one
/// downstream pipeline.
pub fn shape_to_path_data(kind: &ElementKind) -> Result<Option<String>> {
    Ok(match kind {
        ElementKind::Path { .. } => None,
        ElementKind::Rect { x, y, width, height, rx, ry } => {
            Some(rect_data(*x, *y, *width, *height, *rx, *ry))
        }
        ElementKind::Circle { cx, cy, r } => Some(ellipse_data(*cx, *cy, *r, *r)),
        ElementKind::Ellipse { cx, cy, rx, ry } => {
            // Either radius falls back to the other; a plain circle needs
            // only one of them.
            let rx_val = rx.or(*ry).unwrap_or(0.0);
            let ry_val = ry.or(*rx).unwrap_or(0.0);
            Some(ellipse_data(*cx, *cy, rx_val, ry_val))
        }
        ElementKind::Line { x1, y1, x2, y2 } => {
            Some(format!("M {x1} {y1} L {x2} {y2}"))
        }
        ElementKind::Polyline { points } => Some(poly_data(points, false)?),
        ElementKind::Polygon { points } => Some(poly_data(points, true)?),
    })
}

fn rect_data(x: f64, y: f64, w: f64, h: f64, rx: Option<f64>, ry: Option<f64>) -> String {
    // Absent and zero radii differ: a lone `rx` also rounds the y axis.
    let rx = rx.or(ry).unwrap_or(0.0).min(w / 2.0);
    let ry = ry.or(rx_nonzero(rx)).unwrap_or(0.0).min(h / 2.0);

    // A zero radius on either axis disables rounding altogether.
    if rx == 0.0 || ry == 0.0 {
        return format!("M {x} {y} h {w} v {h} h {} v {} z", -w, -h);
    }

    let mut d = String::new();
    write!(d, "M {} {}", x + rx, y).unwrap();
    write!(d, " h {}", w - 2.0 * rx).unwrap();
    write!(d, " a {rx} {ry} 0 0 1 {rx} {ry}").unwrap();
    write!(d, " v {}", h - 2.0 * ry).unwrap();
    write!(d, " a {rx} {ry} 0 0 1 {} {ry}", -rx).unwrap();
    write!(d, " h {}", -(w - 2.0 * rx)).unwrap();
    write!(d, " a {rx} {ry} 0 0 1 {} {}", -rx, -ry).unwrap();
    write!(d, " v {}", -(h - 2.0 * ry)).unwrap();
    write!(d, " a {rx} {ry} 0 0 1 {rx} {}", -ry).unwrap();
    d.push_str(" z");
    d
}

fn rx_nonzero(rx: f64) -> Option<f64> {
    (rx != 0.0).then_some(rx)
}

fn ellipse_data(cx: f64, cy: f64, rx: f64, ry: f64) -> String {
    // Two half arcs around the center.
    format!(
        "M {} {cy} a {rx} {ry} 0 1 0 {} 0 a {rx} {ry} 0 1 0 {} 0 z",
        cx - rx,
        2.0 * rx,
        -2.0 * rx,
    )
}

fn poly_data(points: &str, close: bool) -> Result<String> {
    let points = parse_points(points)?;
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let prefix = if i == 0 { "M" } else { " L" };
        write!(d, "{prefix} {} {}", p.x, p.y).unwrap();
    }
    if close && !d.is_empty() {
        d.push_str(" z");
    }
    Ok(d)
}

fn parse_points(input: &str) -> Result<Vec<Point>> {
    let numbers = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| Error::MalformedSvg(format!("bad point list number `{s}`")))
        })
        .collect::<Result<Vec<_>>>()?;

    // A trailing unpaired coordinate is dropped, as renderers do.
    Ok(numbers.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::path::{format_path, parse_path, PathCommand};

    fn assert_paths_close(a: &[PathCommand], b: &[PathCommand]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            let close = match (x, y) {
                (PathCommand::Close, PathCommand::Close) => true,
                (PathCommand::MoveTo(p), PathCommand::MoveTo(q))
                | (PathCommand::LineTo(p), PathCommand::LineTo(q)) => {
                    (*p - *q).hypot() < 1e-6
                }
                (PathCommand::QuadTo(c, p), PathCommand::QuadTo(d, q)) => {
                    (*c - *d).hypot() < 1e-6 && (*p - *q).hypot() < 1e-6
                }
                (PathCommand::CubicTo(c1, c2, p), PathCommand::CubicTo(d1, d2, q)) => {
                    (*c1 - *d1).hypot() < 1e-6
                        && (*c2 - *d2).hypot() < 1e-6
                        && (*p - *q).hypot() < 1e-6
                }
                _ => false,
            };
            assert!(close, "{x:?} != {y:?}");
        }
    }

    #[test]
    fn plain_rect_is_four_sides() {
        let d = rect_data(0.0, 0.0, 100.0, 50.0, None, None);
        let commands = parse_path(&d).unwrap();
        assert_eq!(commands.len(), 6); // move + 4 lines + close
        assert!(matches!(commands[0], PathCommand::MoveTo(p) if p.x == 0.0 && p.y == 0.0));
    }

    #[test]
    fn rounded_rect_mixes_lines_and_arcs() {
        let d = rect_data(0.0, 0.0, 100.0, 100.0, Some(10.0), Some(20.0));
        let commands = parse_path(&d).unwrap();
        let curves = commands
            .iter()
            .filter(|c| matches!(c, PathCommand::CubicTo(..)))
            .count();
        let lines = commands
            .iter()
            .filter(|c| matches!(c, PathCommand::LineTo(..)))
            .count();
        // Four ≤90° corner arcs of one cubic each, four straight sides.
        assert_eq!(curves, 4);
        assert_eq!(lines, 4);
    }

    #[test]
    fn lone_rx_rounds_both_axes() {
        let with_rx = rect_data(0.0, 0.0, 100.0, 100.0, Some(10.0), None);
        let both = rect_data(0.0, 0.0, 100.0, 100.0, Some(10.0), Some(10.0));
        assert_eq!(with_rx, both);
    }

    #[test]
    fn circle_is_two_half_arcs() {
        let d = ellipse_data(50.0, 50.0, 25.0, 25.0);
        let commands = parse_path(&d).unwrap();
        assert!(matches!(commands[0], PathCommand::MoveTo(p) if p.x == 25.0 && p.y == 50.0));
        assert!(matches!(commands.last(), Some(PathCommand::Close)));
        // Two half arcs, two cubics each.
        let curves = commands
            .iter()
            .filter(|c| matches!(c, PathCommand::CubicTo(..)))
            .count();
        assert_eq!(curves, 4);
    }

    #[test]
    fn polygon_closes_polyline_does_not() {
        let polygon = poly_data("0,0 10,0 10,10", true).unwrap();
        let polyline = poly_data("0,0 10,0 10,10", false).unwrap();
        assert!(matches!(parse_path(&polygon).unwrap().last(), Some(PathCommand::Close)));
        assert!(!parse_path(&polyline)
            .unwrap()
            .iter()
            .any(|c| matches!(c, PathCommand::Close)));
    }

    #[test]
    fn shape_paths_survive_reparsing() {
        // Shape expansions, formatted and re-parsed, stay the same path.
        for d in [
            rect_data(5.0, 5.0, 80.0, 40.0, Some(8.0), None),
            ellipse_data(50.0, 50.0, 30.0, 20.0),
            poly_data("0,0 40,0 40,40 0,40", true).unwrap(),
        ] {
            let commands = parse_path(&d).unwrap();
            let reparsed = parse_path(&format_path(&commands)).unwrap();
            assert_paths_close(&commands, &reparsed);
        }
    }
}
