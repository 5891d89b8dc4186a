//! The `CFF2` table: an owned object model, the offset convergence pass and
//! the binary encoder, plus a decoder for existing tables.

pub(crate) mod argstack;
pub mod charstring;
pub mod dict;
pub mod index;
pub mod number;
pub mod operator;

use crate::cff::charstring::Compiler;
use crate::cff::dict::{operators, Dict};
use crate::cff::index::Index;
use crate::cff::number::{IntegerNumber, Number};
use crate::cff::operator::Operator;
use crate::read::Reader;
use crate::write::Writer;
use crate::Error::{MalformedFont, OffsetOverflow};
use crate::{Context, Error, Result, Tag};

/// `majorVersion`, `minorVersion`, `headerSize`, `topDictLength`.
const HEADER_SIZE: usize = 5;

/// Build the `CFF2` table from the context's glyphs.
pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let char_strings = Index(
        ctx.glyphs
            .iter()
            .map(|g| Compiler::compile(&g.pen_commands()))
            .collect::<Result<_>>()?,
    );

    let mut table = Table::build(char_strings);
    table.recalculate_offsets()?;
    ctx.push(Tag::CFF2, table.write()?);
    Ok(())
}

/// An in-memory CFF2 table.
///
/// A table is built once, then mutated only by [`recalculate_offsets`], then
/// encoded. The builder emits exactly one Font DICT with an empty Private
/// DICT; the richer fields (`vstore`, `fd_select`, local subrs) are only
/// populated by the decode path and are never re-emitted.
///
/// [`recalculate_offsets`]: Table::recalculate_offsets
pub struct Table {
    pub top_dict: Dict,
    pub global_subrs: Index,
    pub char_strings: Index,
    pub font_dicts: Vec<Dict>,
    pub private_dicts: Vec<Dict>,
    pub local_subrs: Vec<Option<Index>>,
    pub vstore: Option<Vec<u8>>,
    pub fd_select: Option<FdSelect>,
}

impl Table {
    /// Create a table for the given CharStrings.
    ///
    /// The offset slots start out 1-byte wide; call
    /// [`Table::recalculate_offsets`] before encoding.
    pub fn build(char_strings: Index) -> Self {
        let mut top_dict = Dict::new();
        top_dict.set(operators::CHAR_STRINGS, vec![Number::zero()]);
        top_dict.set(operators::FD_ARRAY, vec![Number::zero()]);

        let mut font_dict = Dict::new();
        font_dict.set(operators::PRIVATE, vec![Number::zero(), Number::zero()]);

        Self {
            top_dict,
            global_subrs: Index::new(),
            char_strings,
            font_dicts: vec![font_dict],
            private_dicts: vec![Dict::new()],
            local_subrs: vec![None],
            vstore: None,
            fd_select: None,
        }
    }

    /// Drive every offset operand to a fixed point.
    ///
    /// Each pass recomputes the layout from current sizes and re-encodes the
    /// offset operands at no less than their current width. A pass that
    /// widens nothing leaves every size unchanged, so the offsets it wrote
    /// are final. Widths never shrink and cap at 5 bytes, which bounds the
    /// iteration count.
    ///
    /// Returns the number of passes taken.
    pub fn recalculate_offsets(&mut self) -> Result<usize> {
        let mut iterations = 0;
        loop {
            iterations += 1;
            let mut widened = false;

            let char_strings_offset =
                HEADER_SIZE + self.top_dict.size() + self.global_subrs.size();
            let fd_array_offset = char_strings_offset + self.char_strings.size();
            let fd_array_size = self.encode_font_dicts().size();

            widened |= install_offsets(
                &mut self.top_dict,
                operators::CHAR_STRINGS,
                &[char_strings_offset],
            )?;
            widened |= install_offsets(
                &mut self.top_dict,
                operators::FD_ARRAY,
                &[fd_array_offset],
            )?;

            // Private DICTs follow the Font DICT INDEX, local subrs follow
            // the Private DICTs.
            let mut private_offset = fd_array_offset + fd_array_size;
            let private_total: usize = self.private_dicts.iter().map(|d| d.size()).sum();
            let mut subrs_offset = private_offset + private_total;

            for i in 0..self.font_dicts.len() {
                let private_size = self.private_dicts[i].size();
                widened |= install_offsets(
                    &mut self.font_dicts[i],
                    operators::PRIVATE,
                    &[private_size, private_offset],
                )?;

                if let Some(subrs) = &self.local_subrs[i] {
                    // Local subrs offsets are relative to their Private DICT.
                    let relative = subrs_offset - private_offset;
                    widened |= install_offsets(
                        &mut self.private_dicts[i],
                        operators::SUBRS,
                        &[relative],
                    )?;
                    subrs_offset += subrs.size();
                }

                private_offset += private_size;
            }

            if !widened {
                return Ok(iterations);
            }
        }
    }

    /// The encoded byte length of the whole table.
    pub fn size(&self) -> usize {
        HEADER_SIZE
            + self.top_dict.size()
            + self.global_subrs.size()
            + self.char_strings.size()
            + self.encode_font_dicts().size()
            + self.private_dicts.iter().map(|d| d.size()).sum::<usize>()
            + self
                .local_subrs
                .iter()
                .flatten()
                .map(|s| s.size())
                .sum::<usize>()
    }

    /// Encode the table. Offsets must already have converged.
    pub fn write(&self) -> Result<Vec<u8>> {
        let top_dict_length =
            u16::try_from(self.top_dict.size()).map_err(|_| OffsetOverflow)?;

        let mut w = Writer::with_capacity(self.size());
        w.write::<u8>(2);
        w.write::<u8>(0);
        w.write::<u8>(HEADER_SIZE as u8);
        w.write::<u16>(top_dict_length);

        self.top_dict.write(&mut w);
        self.global_subrs.write(&mut w);
        self.char_strings.write(&mut w);
        self.encode_font_dicts().write(&mut w);
        for private in &self.private_dicts {
            private.write(&mut w);
        }
        for subrs in self.local_subrs.iter().flatten() {
            subrs.write(&mut w);
        }

        Ok(w.finish())
    }

    /// Parse a CFF2 table.
    ///
    /// The VariationStore is retained as opaque bytes and FDSelect inputs
    /// are accepted in formats 0 and 3; neither survives a re-encode.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);

        let major = r.read::<u8>().ok_or(MalformedFont)?;
        if major != 2 {
            return Err(Error::Unimplemented);
        }
        r.skip::<u8>(); // minor
        let header_size = r.read::<u8>().ok_or(MalformedFont)? as usize;
        let top_dict_length = r.read::<u16>().ok_or(MalformedFont)? as usize;

        r.jump(header_size);
        let top_dict_data = r.read_bytes(top_dict_length).ok_or(MalformedFont)?;
        let top_dict = Dict::parse(top_dict_data).ok_or(MalformedFont)?;
        let global_subrs = Index::parse(&mut r).ok_or(MalformedFont)?;

        let char_strings_offset = dict_offset(&top_dict, operators::CHAR_STRINGS)
            .ok_or(MalformedFont)?;
        let char_strings = {
            let mut r = Reader::new_at(data, char_strings_offset);
            Index::parse(&mut r).ok_or(MalformedFont)?
        };

        let vstore = match dict_offset(&top_dict, operators::VSTORE) {
            Some(offset) => {
                let mut r = Reader::new_at(data, offset);
                let length = r.read::<u16>().ok_or(MalformedFont)? as usize;
                Some(r.read_bytes(length).ok_or(MalformedFont)?.to_vec())
            }
            None => None,
        };

        let fd_array_offset =
            dict_offset(&top_dict, operators::FD_ARRAY).ok_or(MalformedFont)?;
        let fd_array = {
            let mut r = Reader::new_at(data, fd_array_offset);
            Index::parse(&mut r).ok_or(MalformedFont)?
        };

        let mut font_dicts = Vec::with_capacity(fd_array.len());
        let mut private_dicts = Vec::with_capacity(fd_array.len());
        let mut local_subrs = Vec::with_capacity(fd_array.len());

        for font_dict_data in fd_array.iter() {
            let font_dict = Dict::parse(font_dict_data).ok_or(MalformedFont)?;

            let (private_dict, subrs) = match font_dict.get(operators::PRIVATE) {
                Some([size, offset]) => {
                    let size = size.as_u32().ok_or(MalformedFont)? as usize;
                    let offset = offset.as_u32().ok_or(MalformedFont)? as usize;
                    let private_data =
                        data.get(offset..offset + size).ok_or(MalformedFont)?;
                    let private_dict = Dict::parse(private_data).ok_or(MalformedFont)?;

                    let subrs = match dict_offset(&private_dict, operators::SUBRS) {
                        Some(relative) => {
                            let mut r = Reader::new_at(data, offset + relative);
                            Some(Index::parse(&mut r).ok_or(MalformedFont)?)
                        }
                        None => None,
                    };

                    (private_dict, subrs)
                }
                _ => (Dict::new(), None),
            };

            font_dicts.push(font_dict);
            private_dicts.push(private_dict);
            local_subrs.push(subrs);
        }

        let fd_select = match dict_offset(&top_dict, operators::FD_SELECT) {
            Some(offset) => {
                let mut r = Reader::new_at(data, offset);
                Some(FdSelect::parse(&mut r, char_strings.len())?)
            }
            None => None,
        };

        Ok(Self {
            top_dict,
            global_subrs,
            char_strings,
            font_dicts,
            private_dicts,
            local_subrs,
            vstore,
            fd_select,
        })
    }

    fn encode_font_dicts(&self) -> Index {
        Index(
            self.font_dicts
                .iter()
                .map(|dict| {
                    let mut w = Writer::new();
                    dict.write(&mut w);
                    w.finish()
                })
                .collect(),
        )
    }
}

/// Re-encode the integer operands of `operator` with new values, never
/// narrower than they currently are. Returns whether any operand widened.
fn install_offsets(dict: &mut Dict, operator: Operator, values: &[usize]) -> Result<bool> {
    let old = dict.integer_operands(operator).ok_or(OffsetOverflow)?;
    let mut widened = false;

    let operands = values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let value = i32::try_from(value).map_err(|_| OffsetOverflow)?;
            let floor = old.get(i).map(|n| n.len()).unwrap_or(1);
            let number = IntegerNumber::from_i32_with_min_len(value, floor);
            widened |= number.len() > floor;
            Ok(Number::Integer(number))
        })
        .collect::<Result<Vec<_>>>()?;

    dict.set(operator, operands);
    Ok(widened)
}

fn dict_offset(dict: &Dict, operator: Operator) -> Option<usize> {
    match dict.get(operator) {
        Some([offset]) => usize::try_from(offset.as_u32()?).ok(),
        _ => None,
    }
}

/// A parsed FDSelect mapping glyph ids to Font DICT indices.
pub enum FdSelect {
    Format0(Vec<u8>),
    Format3 { ranges: Vec<(u16, u8)>, sentinel: u16 },
}

impl FdSelect {
    fn parse(r: &mut Reader<'_>, num_glyphs: usize) -> Result<Self> {
        let format = r.read::<u8>().ok_or(MalformedFont)?;
        match format {
            0 => {
                let data = r.read_bytes(num_glyphs).ok_or(MalformedFont)?;
                Ok(Self::Format0(data.to_vec()))
            }
            3 => {
                let count = r.read::<u16>().ok_or(MalformedFont)? as usize;
                let mut ranges = Vec::with_capacity(count);
                for _ in 0..count {
                    let first = r.read::<u16>().ok_or(MalformedFont)?;
                    let fd = r.read::<u8>().ok_or(MalformedFont)?;
                    ranges.push((first, fd));
                }
                let sentinel = r.read::<u16>().ok_or(MalformedFont)?;
                Ok(Self::Format3 { ranges, sentinel })
            }
            _ => Err(Error::Unimplemented),
        }
    }

    pub fn font_dict_index(&self, glyph_id: u16) -> Option<u8> {
        match self {
            Self::Format0(indices) => indices.get(glyph_id as usize).copied(),
            Self::Format3 { ranges, sentinel } => {
                if glyph_id >= *sentinel {
                    return None;
                }
                let position = ranges
                    .partition_point(|&(first, _)| first <= glyph_id)
                    .checked_sub(1)?;
                Some(ranges[position].1)
            }
        }
    }
}
