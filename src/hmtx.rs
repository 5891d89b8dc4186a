//! The `hmtx` table carries one advance and left side bearing per glyph.
//! Icon glyphs share a single advance, but the trailing-run optimization of
//! the format is not worth its bookkeeping here, so every glyph gets a full
//! long metric.

use crate::write::Writer;
use crate::{Context, Result, Tag};

pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let mut w = Writer::new();

    for glyph in &ctx.glyphs {
        let lsb = glyph.bbox.map(|b| b.x0.floor() as i16).unwrap_or(0);
        w.write::<u16>(glyph.advance_width);
        w.write::<i16>(lsb);
    }

    ctx.push(Tag::HMTX, w.finish());
    Ok(())
}
