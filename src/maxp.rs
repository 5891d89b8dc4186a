use crate::write::Writer;
use crate::{Context, Result, Tag};

pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let mut w = Writer::new();
    // Version 0.5: CFF outlines carry no TrueType working storage fields.
    w.write::<u32>(0x00005000);
    w.write::<u16>(ctx.num_glyphs());

    ctx.push(Tag::MAXP, w.finish());
    Ok(())
}
