use crate::write::Writer;
use crate::{Context, Result, Tag};

pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let advance = ctx.units_per_em() as i32;
    let mut min_lsb = i16::MAX;
    let mut min_rsb = i16::MAX;
    let mut x_max_extent = i16::MIN;

    for glyph in &ctx.glyphs {
        let Some(bbox) = glyph.bbox else { continue };
        let lsb = bbox.x0.floor() as i16;
        let x_max = bbox.x1.ceil() as i16;
        min_lsb = min_lsb.min(lsb);
        min_rsb = min_rsb.min((advance - i32::from(x_max)) as i16);
        x_max_extent = x_max_extent.max(x_max);
    }

    if min_lsb == i16::MAX {
        min_lsb = 0;
        min_rsb = 0;
        x_max_extent = 0;
    }

    let mut w = Writer::new();
    w.write::<u32>(0x00010000); // version
    w.write::<i16>(ctx.ascender());
    w.write::<i16>(ctx.descender());
    w.write::<i16>(0); // lineGap
    w.write::<u16>(ctx.units_per_em()); // advanceWidthMax
    w.write::<i16>(min_lsb);
    w.write::<i16>(min_rsb);
    w.write::<i16>(x_max_extent);
    w.write::<i16>(1); // caretSlopeRise
    w.write::<i16>(0); // caretSlopeRun
    w.write::<i16>(0); // caretOffset
    w.write::<[u8; 8]>([0; 8]); // reserved
    w.write::<i16>(0); // metricDataFormat
    w.write::<u16>(ctx.num_glyphs()); // numberOfHMetrics

    ctx.push(Tag::HHEA, w.finish());
    Ok(())
}
