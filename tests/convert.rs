use iconforge::{compile, Error, IconInput, Options};

fn icon(name: &str, code_point: u32, svg: &str) -> IconInput {
    IconInput { name: name.into(), svg: svg.into(), code_point }
}

fn options() -> Options {
    Options { ignore_shapes: false, ..Options::default() }
}

/// Sum the file as big-endian u32s, zero-padded.
fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    for chunk in data.chunks(4) {
        let mut bytes = [0; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(bytes));
    }
    sum
}

/// An outline sink that counts what the font rasterizer would see.
#[derive(Default)]
struct Counter {
    moves: usize,
    lines: usize,
    curves: usize,
    closes: usize,
}

impl ttf_parser::OutlineBuilder for Counter {
    fn move_to(&mut self, _: f32, _: f32) {
        self.moves += 1;
    }
    fn line_to(&mut self, _: f32, _: f32) {
        self.lines += 1;
    }
    fn quad_to(&mut self, _: f32, _: f32, _: f32, _: f32) {
        panic!("CFF2 outlines never contain quadratics");
    }
    fn curve_to(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {
        self.curves += 1;
    }
    fn close(&mut self) {
        self.closes += 1;
    }
}

const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
    <rect x="0" y="0" width="100" height="100"/>
</svg>"#;

#[test]
fn empty_input_produces_a_small_valid_font() {
    let font = compile(&[], &options()).unwrap();

    assert!(font.data.len() < 1024);
    assert_eq!(&font.data[0..4], b"OTTO");
    // The whole-file checksum must settle at the OpenType magic.
    assert_eq!(checksum(&font.data), 0xB1B0AFBA);
    assert!(font.code_points.is_empty());

    // The table directory must still carry the CFF2 table.
    let num_tables = u16::from_be_bytes([font.data[4], font.data[5]]) as usize;
    assert_eq!(num_tables, 9);
    let tags: Vec<&[u8]> =
        (0..num_tables).map(|i| &font.data[12 + i * 16..12 + i * 16 + 4]).collect();
    assert!(tags.contains(&&b"CFF2"[..]));
}

#[test]
fn single_square_fills_the_em() {
    let font =
        compile(&[icon("square", 0xE000, SQUARE)], &options()).unwrap();
    assert_eq!(checksum(&font.data), 0xB1B0AFBA);

    let face = ttf_parser::Face::parse(&font.data, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), 1);

    let id = face.glyph_index(char::from_u32(0xE000).unwrap()).unwrap();
    assert_eq!(id.0, 0);
    assert_eq!(face.glyph_hor_advance(id), Some(1000));

    let mut counter = Counter::default();
    let bbox = face.outline_glyph(id, &mut counter).unwrap();
    assert_eq!((bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max), (0, 0, 1000, 1000));

    // One move, three explicit sides, implicit close.
    assert_eq!(counter.moves, 1);
    assert_eq!(counter.lines, 3);
    assert_eq!(counter.curves, 0);
    assert_eq!(counter.closes, 1);
}

#[test]
fn rounded_corners_become_curves() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <rect x="0" y="0" width="100" height="100" rx="10" ry="20"/>
    </svg>"#;
    let font = compile(&[icon("card", 0xE000, svg)], &options()).unwrap();

    let face = ttf_parser::Face::parse(&font.data, 0).unwrap();
    let id = face.glyph_index(char::from_u32(0xE000).unwrap()).unwrap();

    let mut counter = Counter::default();
    face.outline_glyph(id, &mut counter).unwrap();

    // Four corner arcs of one cubic each, four straight sides.
    assert_eq!(counter.curves, 4);
    assert_eq!(counter.lines, 4);
}

#[test]
fn ignore_shapes_drops_rect_outlines() {
    let font = compile(
        &[icon("square", 0xE000, SQUARE)],
        &Options::default(), // ignore_shapes defaults to true
    )
    .unwrap();

    let face = ttf_parser::Face::parse(&font.data, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), 1);

    let id = face.glyph_index(char::from_u32(0xE000).unwrap()).unwrap();
    let mut counter = Counter::default();
    assert!(face.outline_glyph(id, &mut counter).is_none());
}

#[test]
fn duplicate_icon_names_are_fatal() {
    let result = compile(
        &[icon("square", 0xE000, SQUARE), icon("square", 0xE001, SQUARE)],
        &options(),
    );
    assert!(matches!(result, Err(Error::DuplicateIconName(name)) if name == "square"));
}

#[test]
fn icons_map_in_input_order() {
    let circle = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <circle cx="50" cy="50" r="40"/>
    </svg>"#;
    let font = compile(
        &[icon("a", 0xE000, SQUARE), icon("b", 0xE001, circle)],
        &options(),
    )
    .unwrap();

    assert_eq!(
        font.code_points,
        vec![("a".to_string(), 0xE000), ("b".to_string(), 0xE001)]
    );

    let face = ttf_parser::Face::parse(&font.data, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), 2);
    assert_eq!(face.glyph_index(char::from_u32(0xE000).unwrap()).unwrap().0, 0);
    assert_eq!(face.glyph_index(char::from_u32(0xE001).unwrap()).unwrap().0, 1);
    assert_eq!(face.glyph_index('x'), None);

    // The circle outline is all curves.
    let id = face.glyph_index(char::from_u32(0xE001).unwrap()).unwrap();
    let mut counter = Counter::default();
    face.outline_glyph(id, &mut counter).unwrap();
    assert_eq!(counter.curves, 4);
    assert_eq!(counter.lines, 0);
}

#[test]
fn pre_aligned_icons_skip_normalization() {
    // Already in font coordinates: a 200-unit square at the baseline.
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <path d="M 0 0 L 200 0 L 200 200 L 0 200 Z"/>
    </svg>"#;
    let font = compile(
        &[icon("square", 0xE000, svg)],
        &Options { normalize: false, ignore_shapes: false, ..Options::default() },
    )
    .unwrap();

    let face = ttf_parser::Face::parse(&font.data, 0).unwrap();
    let id = face.glyph_index(char::from_u32(0xE000).unwrap()).unwrap();
    let bbox = face.glyph_bounding_box(id).unwrap();
    assert_eq!((bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max), (0, 0, 200, 200));
}

#[test]
fn group_transforms_reach_the_outlines() {
    // A half-size square inside a scale(2) group fills the em exactly like
    // the plain square does.
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <g transform="scale(2)">
            <path d="M 0 0 L 50 0 L 50 50 L 0 50 Z"/>
        </g>
    </svg>"#;
    let font = compile(&[icon("square", 0xE000, svg)], &options()).unwrap();

    let face = ttf_parser::Face::parse(&font.data, 0).unwrap();
    let id = face.glyph_index(char::from_u32(0xE000).unwrap()).unwrap();
    let bbox = face.glyph_bounding_box(id).unwrap();
    assert_eq!((bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max), (0, 0, 1000, 1000));
}

#[test]
fn malformed_svg_is_fatal() {
    let result = compile(&[icon("broken", 0xE000, "<svg><path")], &options());
    assert!(matches!(result, Err(Error::MalformedSvg(_))));

    let result = compile(
        &[icon("broken", 0xE000, r#"<svg><rect width="wide" height="2"/></svg>"#)],
        &options(),
    );
    assert!(matches!(result, Err(Error::MalformedSvg(_))));
}

#[test]
fn unsupported_path_command_is_fatal() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <path d="M 0 0 R 1 2"/>
    </svg>"#;
    let result = compile(&[icon("weird", 0xE000, svg)], &options());
    assert!(matches!(result, Err(Error::UnsupportedPath('R'))));
}
