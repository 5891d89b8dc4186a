use crate::{Error, Result};
use kurbo::Affine;

/// Parse a `transform` attribute into an affine matrix.
///
/// Transform functions compose left to right, in SVG source order.
pub fn parse_transform(input: &str) -> Result<Affine> {
    let malformed = || Error::MalformedSvg(format!("bad transform `{input}`"));

    let mut out = Affine::IDENTITY;
    let mut s = input.trim();

    while !s.is_empty() {
        let open = s.find('(').ok_or_else(malformed)?;
        let name = s[..open].trim();
        let close = s[open + 1..].find(')').ok_or_else(malformed)?;
        let args = parse_number_list(&s[open + 1..open + 1 + close])?;

        let matrix = match (name, args.as_slice()) {
            ("translate", &[tx]) => Affine::translate((tx, 0.0)),
            ("translate", &[tx, ty]) => Affine::translate((tx, ty)),
            ("scale", &[factor]) => Affine::scale(factor),
            ("scale", &[sx, sy]) => Affine::scale_non_uniform(sx, sy),
            ("rotate", &[deg]) => Affine::rotate(deg.to_radians()),
            ("rotate", &[deg, cx, cy]) => {
                Affine::translate((cx, cy))
                    * Affine::rotate(deg.to_radians())
                    * Affine::translate((-cx, -cy))
            }
            ("skewX", &[deg]) => Affine::skew(deg.to_radians().tan(), 0.0),
            ("skewY", &[deg]) => Affine::skew(0.0, deg.to_radians().tan()),
            ("matrix", &[a, b, c, d, e, f]) => Affine::new([a, b, c, d, e, f]),
            _ => return Err(malformed()),
        };

        out = out * matrix;
        s = s[open + 1 + close + 1..].trim_start();
    }

    Ok(out)
}

fn parse_number_list(input: &str) -> Result<Vec<f64>> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| Error::MalformedSvg(format!("bad number `{s}`")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn assert_close(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn translate_and_scale() {
        let affine = parse_transform("translate(10, 20) scale(2)").unwrap();
        assert_close(affine * Point::new(1.0, 1.0), Point::new(12.0, 22.0));
    }

    #[test]
    fn rotate_about_center() {
        let affine = parse_transform("rotate(90 10 10)").unwrap();
        assert_close(affine * Point::new(20.0, 10.0), Point::new(10.0, 20.0));
    }

    #[test]
    fn matrix_entries_are_column_major() {
        let affine = parse_transform("matrix(1 0 0 1 5 -3)").unwrap();
        assert_close(affine * Point::new(0.0, 0.0), Point::new(5.0, -3.0));
    }

    #[test]
    fn composition_is_source_order() {
        // translate then scale is not scale then translate.
        let a = parse_transform("translate(10,0) scale(2)").unwrap();
        let b = parse_transform("scale(2) translate(10,0)").unwrap();
        assert_close(a * Point::new(1.0, 0.0), Point::new(12.0, 0.0));
        assert_close(b * Point::new(1.0, 0.0), Point::new(22.0, 0.0));
    }

    #[test]
    fn unknown_function_is_rejected() {
        assert!(parse_transform("frobnicate(1 2)").is_err());
        assert!(parse_transform("scale(nope)").is_err());
    }
}
