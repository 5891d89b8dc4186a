use crate::cmap::MappingRun;
use crate::write::Writer;
use crate::{Error, Result};

/// Write a format 4 subtable from the mapping runs.
///
/// Only BMP code points participate; every run becomes one segment with an
/// `idDelta` and no glyph id array, and the required `0xFFFF` sentinel
/// segment closes the list.
pub(crate) fn write(runs: &[MappingRun]) -> Result<Vec<u8>> {
    let mut segments = Vec::new();
    for run in runs {
        if run.start_code > 0xFFFE {
            continue;
        }

        // Runs reaching past the BMP are clipped; format 12 carries the rest.
        let start = run.start_code as u16;
        let end = run.end_code.min(0xFFFE) as u16;
        let id_delta = (run.start_glyph_id as i32 - run.start_code as i32) as u16;
        segments.push((start, end, id_delta));
    }

    // Sentinel: maps 0xFFFF to glyph 0 via delta 1 (mod 65536).
    segments.push((0xFFFF, 0xFFFF, 1));

    let seg_count = segments.len() as u16;
    let entry_selector = seg_count.ilog2() as u16;
    let search_range = 2 * 2u16.pow(u32::from(entry_selector));
    let range_shift = 2 * seg_count - search_range;
    let length = u16::try_from(16 + 8 * u32::from(seg_count))
        .map_err(|_| Error::OffsetOverflow)?;

    let mut w = Writer::new();
    w.write::<u16>(4); // format
    w.write::<u16>(length);
    w.write::<u16>(0); // language
    w.write::<u16>(seg_count * 2);
    w.write::<u16>(search_range);
    w.write::<u16>(entry_selector);
    w.write::<u16>(range_shift);

    for &(_, end, _) in &segments {
        w.write::<u16>(end);
    }
    w.write::<u16>(0); // reservedPad
    for &(start, _, _) in &segments {
        w.write::<u16>(start);
    }
    for &(_, _, id_delta) in &segments {
        w.write::<u16>(id_delta);
    }
    for _ in &segments {
        w.write::<u16>(0); // idRangeOffset
    }

    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_map_back_to_glyph_ids() {
        let runs = [
            MappingRun { start_code: 0xE000, end_code: 0xE002, start_glyph_id: 0 },
            MappingRun { start_code: 0xE010, end_code: 0xE010, start_glyph_id: 3 },
        ];
        let data = write(&runs).unwrap();

        let read_u16 = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
        assert_eq!(read_u16(0), 4);
        assert_eq!(read_u16(2) as usize, data.len());
        let seg_count = read_u16(6) / 2;
        assert_eq!(seg_count, 3); // two runs + sentinel

        // endCode[0], startCode[0], idDelta[0] recover glyph 0 for U+E000.
        let end0 = read_u16(14);
        let start0 = read_u16(14 + 2 * seg_count as usize + 2);
        let delta0 = read_u16(14 + 4 * seg_count as usize + 2);
        assert_eq!((start0, end0), (0xE000, 0xE002));
        assert_eq!(start0.wrapping_add(delta0), 0);

        // The sentinel closes the table.
        assert_eq!(read_u16(14 + 2 * (seg_count as usize - 1)), 0xFFFF);
    }
}
