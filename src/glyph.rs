use crate::cff::charstring::PenCommand;
use crate::svg::path::{parse_path, PathCommand};
use crate::svg::shape::shape_to_path_data;
use crate::svg::SvgDocument;
use crate::{IconInput, Options, Result};
use kurbo::{Affine, Point, Rect};
use log::warn;

/// A named icon glyph with outlines ready for CharString encoding.
pub struct Glyph {
    pub name: String,
    pub unicode: u32,
    pub outlines: Vec<Vec<PathCommand>>,
    pub advance_width: u16,
    pub bbox: Option<Rect>,
}

impl Glyph {
    /// Build a glyph from an icon's SVG source.
    ///
    /// Leaves are converted to absolute outlines with their composed
    /// transforms applied, quadratics are rewritten as cubics, and the
    /// result is normalized into the em square unless the caller declared
    /// the icons pre-aligned.
    pub fn build(icon: &IconInput, options: &Options) -> Result<Self> {
        let doc = SvgDocument::parse(&icon.svg)?;

        let mut outlines = Vec::new();
        for (element, affine) in doc.leaves()? {
            if options.ignore_shapes && element.kind.is_shape() {
                continue;
            }

            let commands = match &element.kind {
                crate::svg::ElementKind::Path { d } => parse_path(d)?,
                kind => match shape_to_path_data(kind)? {
                    Some(d) => parse_path(&d)?,
                    None => continue,
                },
            };

            let outline: Vec<_> =
                commands.into_iter().map(|c| c.transformed(affine)).collect();
            if !outline.is_empty() {
                outlines.push(outline);
            }
        }

        let mut glyph = Glyph {
            name: icon.name.clone(),
            unicode: icon.code_point,
            outlines,
            advance_width: options.units_per_em,
            bbox: None,
        };

        glyph.convert_quadratics();
        if options.normalize {
            glyph.normalize(f64::from(options.units_per_em));
        }
        glyph.bbox = glyph.tight_bbox();

        if glyph.is_empty() {
            warn!("icon `{}` has no contours; emitting an empty glyph", glyph.name);
        }

        Ok(glyph)
    }

    /// Whether the glyph has zero contours.
    pub fn is_empty(&self) -> bool {
        !self
            .outlines
            .iter()
            .flatten()
            .any(|c| matches!(c, PathCommand::MoveTo(_)))
    }

    /// The glyph as pen movements in integer font units.
    ///
    /// `Close` markers vanish here: CFF contours close implicitly, so a
    /// straight segment leading back to the contour start is elided rather
    /// than encoded.
    pub fn pen_commands(&self) -> Vec<PenCommand> {
        let round = |p: Point| (p.x.round() as i32, p.y.round() as i32);

        let mut commands = Vec::new();
        let mut contour_start = (0, 0);
        for outline in &self.outlines {
            for command in outline {
                match *command {
                    PathCommand::MoveTo(p) => {
                        let (x, y) = round(p);
                        commands.push(PenCommand::MoveTo { x, y });
                        contour_start = (x, y);
                    }
                    PathCommand::LineTo(p) => {
                        let (x, y) = round(p);
                        commands.push(PenCommand::LineTo { x, y });
                    }
                    PathCommand::CubicTo(c1, c2, p) => {
                        let (x1, y1) = round(c1);
                        let (x2, y2) = round(c2);
                        let (x, y) = round(p);
                        commands.push(PenCommand::CurveTo { x1, y1, x2, y2, x, y });
                    }
                    // Quadratics were rewritten during building.
                    PathCommand::QuadTo(c, p) => {
                        let anchor = commands
                            .last()
                            .map(pen_position)
                            .unwrap_or(Point::ZERO);
                        let (c1, c2, p) = quad_to_cubic(anchor, c, p);
                        let (x1, y1) = round(c1);
                        let (x2, y2) = round(c2);
                        let (x, y) = round(p);
                        commands.push(PenCommand::CurveTo { x1, y1, x2, y2, x, y });
                    }
                    PathCommand::Close => {
                        let (sx, sy) = contour_start;
                        if let Some(&PenCommand::LineTo { x, y }) = commands.last() {
                            if (x, y) == (sx, sy) {
                                commands.pop();
                            }
                        }
                    }
                }
            }
        }
        commands
    }

    /// Rewrite every quadratic as the equivalent cubic.
    fn convert_quadratics(&mut self) {
        for outline in &mut self.outlines {
            let mut anchor = Point::ZERO;
            let mut start = Point::ZERO;
            for command in outline.iter_mut() {
                match *command {
                    PathCommand::MoveTo(p) => {
                        anchor = p;
                        start = p;
                    }
                    PathCommand::LineTo(p) => anchor = p,
                    PathCommand::CubicTo(_, _, p) => anchor = p,
                    PathCommand::QuadTo(c, p) => {
                        let (c1, c2, p) = quad_to_cubic(anchor, c, p);
                        *command = PathCommand::CubicTo(c1, c2, p);
                        anchor = p;
                    }
                    PathCommand::Close => anchor = start,
                }
            }
        }
    }

    /// Scale and translate the glyph into the em square.
    ///
    /// SVG's y axis grows downward, the font's upward; the uniform scale is
    /// negated in y and the glyph is centered with its baseline at y = 0.
    fn normalize(&mut self, em: f64) {
        let Some(bbox) = self.tight_bbox() else { return };
        let extent = bbox.width().max(bbox.height());
        if extent <= 0.0 {
            return;
        }

        let scale = em / extent;
        let pad_x = (em - bbox.width() * scale) / 2.0;
        let pad_y = (em - bbox.height() * scale) / 2.0;
        let affine = Affine::translate((pad_x, em - pad_y))
            * Affine::scale_non_uniform(scale, -scale)
            * Affine::translate((-bbox.x0, -bbox.y0));

        for outline in &mut self.outlines {
            for command in outline.iter_mut() {
                *command = command.transformed(affine);
            }
        }
    }

    /// The tight bounding box across all outlines, `None` when empty.
    fn tight_bbox(&self) -> Option<Rect> {
        use kurbo::Shape;

        let mut path = kurbo::BezPath::new();
        for command in self.outlines.iter().flatten() {
            match *command {
                PathCommand::MoveTo(p) => path.move_to(p),
                PathCommand::LineTo(p) => path.line_to(p),
                PathCommand::QuadTo(c, p) => path.quad_to(c, p),
                PathCommand::CubicTo(c1, c2, p) => path.curve_to(c1, c2, p),
                PathCommand::Close => path.close_path(),
            }
        }

        if path.elements().iter().all(|e| matches!(e, kurbo::PathEl::MoveTo(_))) {
            return None;
        }

        Some(path.bounding_box())
    }
}

/// The standard quadratic → cubic control rewrite.
fn quad_to_cubic(from: Point, c: Point, to: Point) -> (Point, Point, Point) {
    let c1 = Point::new(from.x + 2.0 / 3.0 * (c.x - from.x), from.y + 2.0 / 3.0 * (c.y - from.y));
    let c2 = Point::new(to.x + 2.0 / 3.0 * (c.x - to.x), to.y + 2.0 / 3.0 * (c.y - to.y));
    (c1, c2, to)
}

fn pen_position(command: &PenCommand) -> Point {
    match *command {
        PenCommand::MoveTo { x, y }
        | PenCommand::LineTo { x, y }
        | PenCommand::CurveTo { x, y, .. } => Point::new(f64::from(x), f64::from(y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Options {
        Options {
            font_name: "test".into(),
            normalize: true,
            ignore_shapes: false,
            units_per_em: 1000,
        }
    }

    fn icon(svg: &str) -> IconInput {
        IconInput { name: "icon".into(), svg: svg.into(), code_point: 0xE000 }
    }

    #[test]
    fn quad_to_cubic_matches_the_exact_rewrite() {
        let (c1, c2, p) =
            quad_to_cubic(Point::new(0.0, 0.0), Point::new(3.0, 6.0), Point::new(6.0, 0.0));
        assert_eq!(c1, Point::new(2.0, 4.0));
        assert_eq!(c2, Point::new(4.0, 4.0));
        assert_eq!(p, Point::new(6.0, 0.0));
    }

    #[test]
    fn square_normalizes_to_em_bounds() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <path d="M 0 0 L 100 0 L 100 100 L 0 100 Z"/>
        </svg>"#;
        let glyph = Glyph::build(&icon(svg), &options()).unwrap();

        let bbox = glyph.bbox.unwrap();
        assert!((bbox.x0 - 0.0).abs() < 1e-6);
        assert!((bbox.y0 - 0.0).abs() < 1e-6);
        assert!((bbox.x1 - 1000.0).abs() < 1e-6);
        assert!((bbox.y1 - 1000.0).abs() < 1e-6);
        assert_eq!(glyph.advance_width, 1000);
    }

    #[test]
    fn narrow_glyphs_are_centered() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <path d="M 0 0 L 50 0 L 50 100 L 0 100 Z"/>
        </svg>"#;
        let glyph = Glyph::build(&icon(svg), &options()).unwrap();

        let bbox = glyph.bbox.unwrap();
        assert!((bbox.x0 - 250.0).abs() < 1e-6);
        assert!((bbox.x1 - 750.0).abs() < 1e-6);
        assert!((bbox.y0 - 0.0).abs() < 1e-6);
        assert!((bbox.y1 - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn normalization_flips_the_y_axis() {
        // The top edge in SVG space must end up at the top of the em.
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <path d="M 0 0 L 100 0 L 100 100 L 0 100 Z"/>
        </svg>"#;
        let glyph = Glyph::build(&icon(svg), &options()).unwrap();

        // SVG (0,0) is the square's top-left corner; in font space it must
        // map to y = em.
        let first = &glyph.outlines[0][0];
        match first {
            PathCommand::MoveTo(p) => assert!((p.y - 1000.0).abs() < 1e-6),
            _ => panic!("expected a move"),
        }
    }

    #[test]
    fn ignore_shapes_drops_primitives() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <rect width="100" height="100"/>
        </svg>"#;
        let mut opts = options();
        opts.ignore_shapes = true;
        let glyph = Glyph::build(&icon(svg), &opts).unwrap();
        assert!(glyph.is_empty());

        opts.ignore_shapes = false;
        let glyph = Glyph::build(&icon(svg), &opts).unwrap();
        assert!(!glyph.is_empty());
    }

    #[test]
    fn square_pen_commands_are_move_and_three_lines() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <path d="M 0 0 L 100 0 L 100 100 L 0 100 Z"/>
        </svg>"#;
        let glyph = Glyph::build(&icon(svg), &options()).unwrap();
        let pen = glyph.pen_commands();

        assert_eq!(pen.len(), 4);
        assert!(matches!(pen[0], PenCommand::MoveTo { .. }));
        assert!(pen[1..].iter().all(|c| matches!(c, PenCommand::LineTo { .. })));
    }

    #[test]
    fn quadratics_become_cubics_during_building() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <path d="M 0 0 Q 50 100 100 0"/>
        </svg>"#;
        let glyph = Glyph::build(&icon(svg), &options()).unwrap();
        assert!(glyph
            .outlines
            .iter()
            .flatten()
            .all(|c| !matches!(c, PathCommand::QuadTo(..))));
    }
}
