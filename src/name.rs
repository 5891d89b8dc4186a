use crate::write::Writer;
use crate::{Context, Result, Tag};
use std::collections::HashMap;

const WINDOWS_PLATFORM: u16 = 3;
const UNICODE_BMP_ENCODING: u16 = 1;
const EN_US: u16 = 0x0409;

/// Build the naming table: version 0, Windows Unicode records for the
/// family, style, unique, full, version and PostScript names.
pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let family = ctx.options.font_name.as_str();
    let postscript: String = family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    // (name id, value), already in record sort order.
    let names = [
        (1, family.to_owned()),
        (2, "Regular".to_owned()),
        (3, format!("{family}-Regular")),
        (4, family.to_owned()),
        (5, "Version 1.0".to_owned()),
        (6, format!("{postscript}-Regular")),
    ];

    let mut storage = Vec::new();
    let mut deduplicator: HashMap<Vec<u8>, u16> = HashMap::new();
    let mut records = Vec::new();

    for (name_id, value) in &names {
        let encoded: Vec<u8> =
            value.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect();
        let length = encoded.len() as u16;
        let offset = *deduplicator.entry(encoded.clone()).or_insert_with(|| {
            let offset = storage.len() as u16;
            storage.extend(&encoded);
            offset
        });
        records.push((*name_id, length, offset));
    }

    let count = records.len() as u16;
    let mut w = Writer::new();
    w.write::<u16>(0); // version
    w.write::<u16>(count);
    w.write::<u16>(6 + count * 12); // storage offset

    for (name_id, length, offset) in records {
        w.write::<u16>(WINDOWS_PLATFORM);
        w.write::<u16>(UNICODE_BMP_ENCODING);
        w.write::<u16>(EN_US);
        w.write::<u16>(name_id);
        w.write::<u16>(length);
        w.write::<u16>(offset);
    }

    w.extend(&storage);

    ctx.push(Tag::NAME, w.finish());
    Ok(())
}
