use crate::cmap::MappingRun;
use crate::write::Writer;

/// Write a format 12 subtable: one sequential map group per mapping run.
pub(crate) fn write(runs: &[MappingRun]) -> Vec<u8> {
    // format + reserved + length + language + numGroups, then
    // (startCharCode, endCharCode, startGlyphID) per group.
    let length = 16 + 12 * runs.len() as u32;

    let mut w = Writer::new();
    w.write::<u16>(12); // format
    w.write::<u16>(0); // reserved
    w.write::<u32>(length);
    w.write::<u32>(0); // language
    w.write::<u32>(runs.len() as u32);

    for run in runs {
        w.write::<u32>(run.start_code);
        w.write::<u32>(run.end_code);
        w.write::<u32>(u32::from(run.start_glyph_id));
    }

    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_mirror_the_runs() {
        let runs = [
            MappingRun { start_code: 0xE000, end_code: 0xE004, start_glyph_id: 0 },
            MappingRun { start_code: 0x1F600, end_code: 0x1F600, start_glyph_id: 5 },
        ];
        let data = write(&runs);

        let read_u32 =
            |i: usize| u32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        assert_eq!(read_u32(4) as usize, data.len());
        assert_eq!(read_u32(12), 2); // numGroups
        assert_eq!(read_u32(16), 0xE000);
        assert_eq!(read_u32(20), 0xE004);
        assert_eq!(read_u32(24), 0);
        assert_eq!(read_u32(28), 0x1F600);
    }
}
