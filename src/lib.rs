/*!
Compiles a set of SVG icons into an OpenType font with CFF2 outlines.

Each icon becomes one glyph: its SVG document is parsed, shape primitives
are expanded to paths, transforms are pushed down onto leaves, outlines are
normalized into the em square and encoded as CFF2 CharStrings. The glyphs
are then wrapped into a complete sfnt with the mandatory metric, naming and
character-mapping tables.

```no_run
use iconforge::{compile, IconInput, Options};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let icons = vec![IconInput {
    name: "square".into(),
    svg: std::fs::read_to_string("icons/square.svg")?,
    code_point: 0xE000,
}];

let font = compile(&icons, &Options::default())?;
std::fs::write("icons.otf", &font.data)?;
# Ok(())
# }
```
*/

#![deny(unsafe_code)]

pub mod cff;
pub mod classfile;
mod cmap;
mod glyph;
mod head;
mod hhea;
mod hmtx;
mod maxp;
mod name;
mod os2;
mod post;
mod read;
pub mod svg;
mod write;

use crate::glyph::Glyph;
use crate::write::Writer;
use kurbo::Rect;
use std::collections::HashSet;
use std::fmt::{self, Debug, Display, Formatter};
use thiserror::Error;

/// One icon to compile into a glyph.
#[derive(Debug, Clone)]
pub struct IconInput {
    /// The icon identifier, typically the source file stem.
    pub name: String,
    /// The UTF-8 SVG document.
    pub svg: String,
    /// The code point the host assigned to this icon.
    pub code_point: u32,
}

/// Compilation options.
#[derive(Debug, Clone)]
pub struct Options {
    /// The font family name.
    pub font_name: String,
    /// Normalize every glyph into the em square. Disable when the icons are
    /// already aligned in font coordinates.
    pub normalize: bool,
    /// Drop shape primitives instead of expanding them to paths.
    pub ignore_shapes: bool,
    /// The size of the em square.
    pub units_per_em: u16,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            font_name: "iconforge".into(),
            normalize: true,
            ignore_shapes: true,
            units_per_em: 1000,
        }
    }
}

/// A compiled icon font.
pub struct Font {
    /// The OpenType file.
    pub data: Vec<u8>,
    /// `(name, code point)` per icon, in input order.
    pub code_points: Vec<(String, u32)>,
}

/// Compile icons into an OpenType font.
///
/// Glyph id `i` is icon `i`; no `.notdef` is synthesized, so an empty input
/// produces a font with an empty CharStrings INDEX. The call is
/// all-or-nothing: on error nothing partial is returned.
pub fn compile(icons: &[IconInput], options: &Options) -> Result<Font> {
    if icons.len() > usize::from(u16::MAX) {
        return Err(Error::OffsetOverflow);
    }

    let mut seen = HashSet::new();
    for icon in icons {
        if !seen.insert(icon.name.as_str()) {
            return Err(Error::DuplicateIconName(icon.name.clone()));
        }
    }

    let glyphs = icons
        .iter()
        .map(|icon| Glyph::build(icon, options))
        .collect::<Result<Vec<_>>>()?;

    let mut ctx = Context { glyphs, options, tables: vec![] };

    cff::build(&mut ctx)?;
    cmap::build(&mut ctx)?;
    head::build(&mut ctx)?;
    hhea::build(&mut ctx)?;
    hmtx::build(&mut ctx)?;
    maxp::build(&mut ctx)?;
    name::build(&mut ctx)?;
    os2::build(&mut ctx)?;
    post::build(&mut ctx)?;

    let code_points =
        icons.iter().map(|i| (i.name.clone(), i.code_point)).collect();

    Ok(Font { data: construct(ctx), code_points })
}

/// Assemble the table directory and the tables into an sfnt.
fn construct(mut ctx: Context) -> Vec<u8> {
    let mut w = Writer::new();

    // OpenType with CFF outlines.
    w.write::<u32>(0x4F54544F);

    // Tables shall be sorted by tag.
    ctx.tables.sort_by_key(|&(tag, _)| tag);

    let count = ctx.tables.len() as u16;
    let entry_selector = count.checked_ilog2().unwrap_or(0) as u16;
    let search_range = 2u16.pow(u32::from(entry_selector)) * 16;
    let range_shift = count * 16 - search_range;
    w.write(count);
    w.write(search_range);
    w.write(entry_selector);
    w.write(range_shift);

    // The checksum adjustment in the head table is written at the end,
    // after checksumming the whole font.
    let mut checksum_adjustment_offset = None;

    let mut offset = 12 + ctx.tables.len() * 16;
    for (tag, data) in &ctx.tables {
        if *tag == Tag::HEAD {
            checksum_adjustment_offset = Some(offset + 8);
        }

        let len = data.len();
        w.write::<[u8; 4]>(tag.0);
        w.write::<u32>(checksum(data));
        w.write::<u32>(offset as u32);
        w.write::<u32>(len as u32);

        // Account for the padding to the next 4-byte boundary.
        offset += len;
        while offset % 4 != 0 {
            offset += 1;
        }
    }

    for (_, data) in &ctx.tables {
        w.extend(data);
        w.align(4);
    }

    let mut data = w.finish();
    if let Some(i) = checksum_adjustment_offset {
        let sum = checksum(&data);
        let val = 0xB1B0AFBA_u32.wrapping_sub(sum);
        data[i..i + 4].copy_from_slice(&val.to_be_bytes());
    }

    data
}

/// Sum the data as big-endian u32s, treating it as zero-padded to a
/// multiple of four.
fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    for chunk in data.chunks(4) {
        let mut bytes = [0; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(bytes));
    }
    sum
}

/// Compilation context the table builders write into.
pub(crate) struct Context<'a> {
    pub(crate) glyphs: Vec<Glyph>,
    pub(crate) options: &'a Options,
    pub(crate) tables: Vec<(Tag, Vec<u8>)>,
}

impl Context<'_> {
    /// Push a built table.
    pub(crate) fn push(&mut self, tag: Tag, table: Vec<u8>) {
        debug_assert!(
            !self.tables.iter().any(|&(prev, _)| prev == tag),
            "duplicate {tag} table"
        );
        self.tables.push((tag, table));
    }

    pub(crate) fn num_glyphs(&self) -> u16 {
        self.glyphs.len() as u16
    }

    pub(crate) fn units_per_em(&self) -> u16 {
        self.options.units_per_em
    }

    /// Ascender at the top of the em, descender at the baseline: icons are
    /// normalized into `0..em`.
    pub(crate) fn ascender(&self) -> i16 {
        self.options.units_per_em as i16
    }

    pub(crate) fn descender(&self) -> i16 {
        0
    }

    /// The union of all glyph bounding boxes.
    pub(crate) fn global_bbox(&self) -> Option<Rect> {
        self.glyphs
            .iter()
            .filter_map(|g| g.bbox)
            .reduce(|a, b| a.union(b))
    }

    /// `(code point, glyph id)` pairs, sorted by code point.
    pub(crate) fn mappings(&self) -> Vec<(u32, u16)> {
        let mut mappings: Vec<_> = self
            .glyphs
            .iter()
            .enumerate()
            .map(|(gid, glyph)| (glyph.unicode, gid as u16))
            .collect();
        mappings.sort();
        mappings
    }
}

/// A 4-byte table tag.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub(crate) struct Tag(pub [u8; 4]);

impl Tag {
    pub const CFF2: Self = Self(*b"CFF2");
    pub const CMAP: Self = Self(*b"cmap");
    pub const HEAD: Self = Self(*b"head");
    pub const HHEA: Self = Self(*b"hhea");
    pub const HMTX: Self = Self(*b"hmtx");
    pub const MAXP: Self = Self(*b"maxp");
    pub const NAME: Self = Self(*b"name");
    pub const OS2: Self = Self(*b"OS/2");
    pub const POST: Self = Self(*b"post");
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(std::str::from_utf8(&self.0).unwrap_or("..."))
    }
}

/// The result type for everything.
pub type Result<T> = std::result::Result<T, Error>;

/// Compilation failure.
#[derive(Debug, Error)]
pub enum Error {
    /// The SVG was not well-formed, or a numeric attribute was unparseable.
    #[error("malformed svg: {0}")]
    MalformedSvg(String),
    /// A path used a command outside the supported set.
    #[error("unsupported path command `{0}`")]
    UnsupportedPath(char),
    /// An offset exceeded the encodable range.
    #[error("an offset exceeded the encodable range")]
    OffsetOverflow,
    /// Two icons mapped to the same identifier.
    #[error("duplicate icon name `{0}`")]
    DuplicateIconName(String),
    /// Font data passed to a decoder was malformed.
    #[error("malformed font data")]
    MalformedFont,
    /// The font relies on a feature outside the implemented subset.
    #[error("unimplemented feature in font")]
    Unimplemented,
}
