use crate::{Error, Result};
use kurbo::{Affine, Point};
use std::fmt::Write as _;

/// An absolute path command.
///
/// Relative commands, shorthands and arcs are resolved at parse time;
/// quadratics survive parsing and are rewritten by the glyph builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Close,
}

impl PathCommand {
    pub fn transformed(self, affine: Affine) -> Self {
        match self {
            Self::MoveTo(p) => Self::MoveTo(affine * p),
            Self::LineTo(p) => Self::LineTo(affine * p),
            Self::QuadTo(c, p) => Self::QuadTo(affine * c, affine * p),
            Self::CubicTo(c1, c2, p) => Self::CubicTo(affine * c1, affine * c2, affine * p),
            Self::Close => Self::Close,
        }
    }
}

/// Parse a path `d` attribute into absolute commands.
///
/// Supports `M L H V C S Q T A Z` in absolute and relative form, implicit
/// command repetition (including `M`'s line continuation), and converts
/// elliptical arcs into cubic segments. Any other command letter is an
/// [`Error::UnsupportedPath`].
pub fn parse_path(d: &str) -> Result<Vec<PathCommand>> {
    let mut commands = Vec::new();
    let mut scanner = Scanner::new(d);

    let mut cmd: Option<char> = None;
    let mut cur = Point::ZERO;
    let mut start = Point::ZERO;
    let mut last_cubic_c2: Option<Point> = None;
    let mut last_quad_c: Option<Point> = None;

    loop {
        let c = match scanner.next_command()? {
            Some(c) => {
                cmd = Some(c);
                c
            }
            None if scanner.at_end() => break,
            // A number with no preceding command repeats the previous one;
            // a repeated `M` continues as a line.
            None => match cmd {
                Some('M') => {
                    cmd = Some('L');
                    'L'
                }
                Some('m') => {
                    cmd = Some('l');
                    'l'
                }
                Some(c) => c,
                None => {
                    return Err(Error::MalformedSvg(
                        "path data does not start with a command".into(),
                    ))
                }
            },
        };

        let rel = c.is_ascii_lowercase();
        let base = if rel { cur } else { Point::ZERO };

        match c.to_ascii_uppercase() {
            'M' => {
                let p = base + scanner.point()?.to_vec2();
                commands.push(PathCommand::MoveTo(p));
                cur = p;
                start = p;
                last_cubic_c2 = None;
                last_quad_c = None;
            }
            'L' => {
                let p = base + scanner.point()?.to_vec2();
                commands.push(PathCommand::LineTo(p));
                cur = p;
                last_cubic_c2 = None;
                last_quad_c = None;
            }
            'H' => {
                let x = scanner.number()?;
                let p = Point::new(if rel { cur.x + x } else { x }, cur.y);
                commands.push(PathCommand::LineTo(p));
                cur = p;
                last_cubic_c2 = None;
                last_quad_c = None;
            }
            'V' => {
                let y = scanner.number()?;
                let p = Point::new(cur.x, if rel { cur.y + y } else { y });
                commands.push(PathCommand::LineTo(p));
                cur = p;
                last_cubic_c2 = None;
                last_quad_c = None;
            }
            'C' => {
                let c1 = base + scanner.point()?.to_vec2();
                let c2 = base + scanner.point()?.to_vec2();
                let p = base + scanner.point()?.to_vec2();
                commands.push(PathCommand::CubicTo(c1, c2, p));
                cur = p;
                last_cubic_c2 = Some(c2);
                last_quad_c = None;
            }
            'S' => {
                let c1 = match last_cubic_c2 {
                    Some(prev) => Point::new(2.0 * cur.x - prev.x, 2.0 * cur.y - prev.y),
                    None => cur,
                };
                let c2 = base + scanner.point()?.to_vec2();
                let p = base + scanner.point()?.to_vec2();
                commands.push(PathCommand::CubicTo(c1, c2, p));
                cur = p;
                last_cubic_c2 = Some(c2);
                last_quad_c = None;
            }
            'Q' => {
                let c = base + scanner.point()?.to_vec2();
                let p = base + scanner.point()?.to_vec2();
                commands.push(PathCommand::QuadTo(c, p));
                cur = p;
                last_quad_c = Some(c);
                last_cubic_c2 = None;
            }
            'T' => {
                let c = match last_quad_c {
                    Some(prev) => Point::new(2.0 * cur.x - prev.x, 2.0 * cur.y - prev.y),
                    None => cur,
                };
                let p = base + scanner.point()?.to_vec2();
                commands.push(PathCommand::QuadTo(c, p));
                cur = p;
                last_quad_c = Some(c);
                last_cubic_c2 = None;
            }
            'A' => {
                let rx = scanner.number()?;
                let ry = scanner.number()?;
                let rotation = scanner.number()?;
                let large_arc = scanner.flag()?;
                let sweep = scanner.flag()?;
                let p = base + scanner.point()?.to_vec2();
                arc_to_cubics(&mut commands, cur, rx, ry, rotation, large_arc, sweep, p);
                cur = p;
                last_cubic_c2 = None;
                last_quad_c = None;
            }
            'Z' => {
                commands.push(PathCommand::Close);
                cur = start;
                last_cubic_c2 = None;
                last_quad_c = None;
            }
            _ => return Err(Error::UnsupportedPath(c)),
        }
    }

    Ok(commands)
}

/// Format commands back into an absolute-form `d` string.
pub fn format_path(commands: &[PathCommand]) -> String {
    let mut d = String::new();
    for command in commands {
        if !d.is_empty() {
            d.push(' ');
        }
        match command {
            PathCommand::MoveTo(p) => {
                write!(d, "M {} {}", p.x, p.y).unwrap();
            }
            PathCommand::LineTo(p) => {
                write!(d, "L {} {}", p.x, p.y).unwrap();
            }
            PathCommand::QuadTo(c, p) => {
                write!(d, "Q {} {} {} {}", c.x, c.y, p.x, p.y).unwrap();
            }
            PathCommand::CubicTo(c1, c2, p) => {
                write!(d, "C {} {} {} {} {} {}", c1.x, c1.y, c2.x, c2.y, p.x, p.y)
                    .unwrap();
            }
            PathCommand::Close => d.push('Z'),
        }
    }
    d
}

/// Convert an elliptical arc into cubic segments of at most 90° each.
///
/// Center parameterization per the SVG 1.1 implementation notes.
#[allow(clippy::too_many_arguments)]
fn arc_to_cubics(
    out: &mut Vec<PathCommand>,
    from: Point,
    rx: f64,
    ry: f64,
    x_axis_rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
    to: Point,
) {
    use std::f64::consts::PI;

    let mut rx = rx.abs();
    let mut ry = ry.abs();
    if rx == 0.0 || ry == 0.0 || from == to {
        out.push(PathCommand::LineTo(to));
        return;
    }

    let phi = x_axis_rotation_deg.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // Step 1: compute (x1', y1').
    let dx2 = (from.x - to.x) / 2.0;
    let dy2 = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    // Step 2: ensure the radii can span the endpoints.
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    // Step 3: compute the transformed center.
    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let x1p2 = x1p * x1p;
    let y1p2 = y1p * y1p;
    let num = rx2 * ry2 - rx2 * y1p2 - ry2 * x1p2;
    let den = rx2 * y1p2 + ry2 * x1p2;
    let mut coef = 0.0;
    if den != 0.0 {
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        coef = sign * (num / den).max(0.0).sqrt();
    }
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * (-ry * x1p / rx);

    // Step 4: map the center back.
    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    // Step 5: compute the sweep angles.
    fn angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
        let dot = ux * vx + uy * vy;
        let det = ux * vy - uy * vx;
        det.atan2(dot)
    }

    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let mut theta = angle(1.0, 0.0, ux, uy);
    let mut dtheta = angle(ux, uy, vx, vy);

    if !sweep && dtheta > 0.0 {
        dtheta -= 2.0 * PI;
    } else if sweep && dtheta < 0.0 {
        dtheta += 2.0 * PI;
    }

    let segments = (dtheta.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
    let delta = dtheta / segments as f64;

    for _ in 0..segments {
        out.push(arc_segment_to_cubic(cx, cy, rx, ry, sin_phi, cos_phi, theta, delta));
        theta += delta;
    }
}

fn arc_segment_to_cubic(
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    sin_phi: f64,
    cos_phi: f64,
    theta: f64,
    delta: f64,
) -> PathCommand {
    let k = (4.0 / 3.0) * (delta / 4.0).tan();

    let (s1, c1) = theta.sin_cos();
    let (s2, c2) = (theta + delta).sin_cos();

    // Unit-circle control points, then ellipse → rotate → translate.
    let map = |x: f64, y: f64| {
        let x = rx * x;
        let y = ry * y;
        Point::new(cx + cos_phi * x - sin_phi * y, cy + sin_phi * x + cos_phi * y)
    };

    PathCommand::CubicTo(
        map(c1 - k * s1, s1 + k * c1),
        map(c2 + k * s2, s2 - k * c2),
        map(c2, s2),
    )
}

/// A cursor over path data.
struct Scanner<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { bytes: input.as_bytes(), i: 0 }
    }

    fn skip_ws(&mut self) {
        while let Some(&b) = self.bytes.get(self.i) {
            if matches!(b, b' ' | b'\n' | b'\r' | b'\t' | b',') {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.i >= self.bytes.len()
    }

    /// The next command letter, or `None` before a number or at the end.
    fn next_command(&mut self) -> Result<Option<char>> {
        self.skip_ws();
        match self.bytes.get(self.i) {
            Some(&b) if b.is_ascii_alphabetic() => {
                self.i += 1;
                Ok(Some(b as char))
            }
            _ => Ok(None),
        }
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_ws();
        let start = self.i;
        let mut has_digit = false;

        if matches!(self.bytes.get(self.i), Some(b'+' | b'-')) {
            self.i += 1;
        }
        while matches!(self.bytes.get(self.i), Some(b) if b.is_ascii_digit()) {
            self.i += 1;
            has_digit = true;
        }
        if matches!(self.bytes.get(self.i), Some(b'.')) {
            self.i += 1;
            while matches!(self.bytes.get(self.i), Some(b) if b.is_ascii_digit()) {
                self.i += 1;
                has_digit = true;
            }
        }
        if has_digit && matches!(self.bytes.get(self.i), Some(b'e' | b'E')) {
            self.i += 1;
            if matches!(self.bytes.get(self.i), Some(b'+' | b'-')) {
                self.i += 1;
            }
            while matches!(self.bytes.get(self.i), Some(b) if b.is_ascii_digit()) {
                self.i += 1;
            }
        }

        if !has_digit {
            return Err(Error::MalformedSvg(format!(
                "expected a number at byte {start} of path data"
            )));
        }

        // The scanner only accepted ASCII, so this cannot fail.
        let s = std::str::from_utf8(&self.bytes[start..self.i]).unwrap();
        s.parse::<f64>()
            .map_err(|_| Error::MalformedSvg(format!("bad number `{s}`")))
    }

    fn point(&mut self) -> Result<Point> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Point::new(x, y))
    }

    /// An arc flag: a bare `0` or `1`, possibly unseparated from what
    /// follows.
    fn flag(&mut self) -> Result<bool> {
        self.skip_ws();
        match self.bytes.get(self.i) {
            Some(b'0') => {
                self.i += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.i += 1;
                Ok(true)
            }
            _ => Err(Error::MalformedSvg("bad arc flag in path data".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn absolute_commands() {
        let commands = parse_path("M 10 20 L 30 40 Z").unwrap();
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo(pt(10.0, 20.0)),
                PathCommand::LineTo(pt(30.0, 40.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn relative_commands_resolve_to_absolute() {
        let commands = parse_path("m 10 10 l 5 0 v 5 h -5 z").unwrap();
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo(pt(10.0, 10.0)),
                PathCommand::LineTo(pt(15.0, 10.0)),
                PathCommand::LineTo(pt(15.0, 15.0)),
                PathCommand::LineTo(pt(10.0, 15.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn implicit_repeats_become_independent_commands() {
        // One `l` with two pairs produces two segments.
        let commands = parse_path("M0 0 l 1,0 1,0").unwrap();
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo(pt(0.0, 0.0)),
                PathCommand::LineTo(pt(1.0, 0.0)),
                PathCommand::LineTo(pt(2.0, 0.0)),
            ]
        );

        // Extra pairs after a move continue as lines.
        let commands = parse_path("M 0 0 10 0 10 10").unwrap();
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo(pt(0.0, 0.0)),
                PathCommand::LineTo(pt(10.0, 0.0)),
                PathCommand::LineTo(pt(10.0, 10.0)),
            ]
        );
    }

    #[test]
    fn smooth_cubic_reflects_the_control_point() {
        let commands = parse_path("M 0 0 C 0 10 10 10 10 0 S 20 -10 20 0").unwrap();
        match commands[2] {
            PathCommand::CubicTo(c1, _, p) => {
                assert_eq!(c1, pt(10.0, -10.0));
                assert_eq!(p, pt(20.0, 0.0));
            }
            _ => panic!("expected a cubic"),
        }
    }

    #[test]
    fn quadratics_are_preserved() {
        let commands = parse_path("M 0 0 Q 5 10 10 0 T 20 0").unwrap();
        assert_eq!(commands[1], PathCommand::QuadTo(pt(5.0, 10.0), pt(10.0, 0.0)));
        // T reflects the previous control point.
        assert_eq!(commands[2], PathCommand::QuadTo(pt(15.0, -10.0), pt(20.0, 0.0)));
    }

    #[test]
    fn arcs_become_cubics() {
        let commands = parse_path("M 0 0 A 10 10 0 0 1 20 0").unwrap();
        assert!(commands[1..]
            .iter()
            .all(|c| matches!(c, PathCommand::CubicTo(..))));
        // A half circle splits into two ≤90° segments.
        assert_eq!(commands.len(), 3);
        match commands[2] {
            PathCommand::CubicTo(_, _, p) => {
                assert!((p - pt(20.0, 0.0)).hypot() < 1e-9);
            }
            _ => panic!("expected a cubic"),
        }
    }

    #[test]
    fn compressed_arc_flags() {
        // Flags may run together with the following coordinates.
        let commands = parse_path("M0 0a5 5 0 0110 0").unwrap();
        assert!(commands.len() > 1);
    }

    #[test]
    fn unsupported_command_is_rejected() {
        assert!(matches!(parse_path("M 0 0 B 1 2"), Err(Error::UnsupportedPath('B'))));
    }

    #[test]
    fn malformed_number_is_rejected() {
        assert!(matches!(parse_path("M 0 0 L 5 ,"), Err(Error::MalformedSvg(_))));
    }

    #[test]
    fn format_then_parse_is_identity() {
        let commands = parse_path("M 0 0 Q 5 10 10 0 C 12 5 18 5 20 0 L 30 0 Z").unwrap();
        let reparsed = parse_path(&format_path(&commands)).unwrap();
        assert_eq!(commands, reparsed);
    }
}
