use crate::write::Writer;
use crate::{Context, Result, Tag};

/// Build the font header table.
///
/// `checkSumAdjustment` is written as zero here; the sfnt assembler patches
/// it after checksumming the whole file.
pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let bbox = ctx.global_bbox();
    let (x_min, y_min, x_max, y_max) = match bbox {
        Some(r) => (
            r.x0.floor() as i16,
            r.y0.floor() as i16,
            r.x1.ceil() as i16,
            r.y1.ceil() as i16,
        ),
        None => (0, 0, 0, 0),
    };

    let mut w = Writer::new();
    w.write::<u32>(0x00010000); // version
    w.write::<u32>(0x00010000); // fontRevision
    w.write::<u32>(0); // checkSumAdjustment
    w.write::<u32>(0x5F0F3CF5); // magicNumber
    w.write::<u16>(0b11); // flags: baseline and sidebearing conventions
    w.write::<u16>(ctx.units_per_em());
    w.write::<i64>(0); // created
    w.write::<i64>(0); // modified
    w.write::<i16>(x_min);
    w.write::<i16>(y_min);
    w.write::<i16>(x_max);
    w.write::<i16>(y_max);
    w.write::<u16>(0); // macStyle
    w.write::<u16>(8); // lowestRecPPEM
    w.write::<i16>(2); // fontDirectionHint
    w.write::<i16>(0); // indexToLocFormat
    w.write::<i16>(0); // glyphDataFormat

    ctx.push(Tag::HEAD, w.finish());
    Ok(())
}
