use crate::write::Writer;
use crate::{Context, Result, Tag};

pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let em = i32::from(ctx.units_per_em());

    let mut w = Writer::new();
    // Version 3.0: no glyph names; PDF and web consumers don't need them
    // for PUA-mapped icons.
    w.write::<u32>(0x00030000);
    w.write::<u32>(0); // italicAngle
    w.write::<i16>((-em / 10) as i16); // underlinePosition
    w.write::<i16>((em / 20) as i16); // underlineThickness
    w.write::<u32>(1); // isFixedPitch: every icon advances one em
    w.write::<u32>(0); // minMemType42
    w.write::<u32>(0); // maxMemType42
    w.write::<u32>(0); // minMemType1
    w.write::<u32>(0); // maxMemType1

    ctx.push(Tag::POST, w.finish());
    Ok(())
}
