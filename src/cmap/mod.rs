mod subtable12;
mod subtable4;

use crate::write::Writer;
use crate::{Context, Result, Tag};

struct EncodingRecord {
    platform_id: u16,
    encoding_id: u16,
    subtable_offset: u32,
}

/// Build the character map.
///
/// A format 4 subtable covers the BMP under the (0,3) and (3,1) records and
/// a format 12 subtable covers the full repertoire under (3,10); the two
/// Unicode records share the format 4 data.
pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let mappings = ctx.mappings();
    let runs = group_runs(&mappings);

    let fmt4 = subtable4::write(&runs)?;
    let fmt12 = subtable12::write(&runs);

    // version + numTables, then one record per encoding.
    let fmt4_offset = 2 * 2 + 3 * 8;
    let fmt12_offset = fmt4_offset + fmt4.len() as u32;
    let records = [
        EncodingRecord { platform_id: 0, encoding_id: 3, subtable_offset: fmt4_offset },
        EncodingRecord { platform_id: 3, encoding_id: 1, subtable_offset: fmt4_offset },
        EncodingRecord { platform_id: 3, encoding_id: 10, subtable_offset: fmt12_offset },
    ];

    let mut w = Writer::new();
    w.write::<u16>(0); // version
    w.write::<u16>(records.len() as u16);
    for record in &records {
        w.write::<u16>(record.platform_id);
        w.write::<u16>(record.encoding_id);
        w.write::<u32>(record.subtable_offset);
    }
    w.extend(&fmt4);
    w.extend(&fmt12);

    ctx.push(Tag::CMAP, w.finish());
    Ok(())
}

/// A run of consecutive code points mapping to consecutive glyph ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MappingRun {
    pub start_code: u32,
    pub end_code: u32,
    pub start_glyph_id: u16,
}

/// Collapse sorted `(code point, glyph id)` pairs into runs.
fn group_runs(mappings: &[(u32, u16)]) -> Vec<MappingRun> {
    let mut runs: Vec<MappingRun> = Vec::new();

    for &(code, gid) in mappings {
        if let Some(run) = runs.last_mut() {
            let span = run.end_code - run.start_code + 1;
            if code == run.end_code + 1 && u32::from(gid) == u32::from(run.start_glyph_id) + span
            {
                run.end_code = code;
                continue;
            }
        }
        runs.push(MappingRun { start_code: code, end_code: code, start_glyph_id: gid });
    }

    runs
}
