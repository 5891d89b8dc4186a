use crate::write::Writer;
use crate::{Context, Result, Tag};

const FS_SELECTION_REGULAR: u16 = 0x0040;
/// Bit 60 of the Unicode range fields: Private Use Area.
const UNICODE_RANGE2_PUA: u32 = 1 << 28;

pub(crate) fn build(ctx: &mut Context) -> Result<()> {
    let em = i32::from(ctx.units_per_em());
    let scaled = |per_mille: i32| (em * per_mille / 1000) as i16;

    let mappings = ctx.mappings();
    let first = mappings.first().map(|&(cp, _)| cp).unwrap_or(0xFFFF);
    let last = mappings.last().map(|&(cp, _)| cp).unwrap_or(0xFFFF);
    let in_pua = mappings.iter().any(|&(cp, _)| (0xE000..=0xF8FF).contains(&cp));

    let mut w = Writer::new();
    w.write::<u16>(4); // version
    w.write::<i16>(em as i16); // xAvgCharWidth
    w.write::<u16>(400); // usWeightClass
    w.write::<u16>(5); // usWidthClass
    w.write::<u16>(0); // fsType
    w.write::<i16>(scaled(650)); // ySubscriptXSize
    w.write::<i16>(scaled(600)); // ySubscriptYSize
    w.write::<i16>(0); // ySubscriptXOffset
    w.write::<i16>(scaled(75)); // ySubscriptYOffset
    w.write::<i16>(scaled(650)); // ySuperscriptXSize
    w.write::<i16>(scaled(600)); // ySuperscriptYSize
    w.write::<i16>(0); // ySuperscriptXOffset
    w.write::<i16>(scaled(350)); // ySuperscriptYOffset
    w.write::<i16>(scaled(50)); // yStrikeoutSize
    w.write::<i16>(scaled(250)); // yStrikeoutPosition
    w.write::<i16>(0); // sFamilyClass
    w.write::<[u8; 10]>([0; 10]); // panose
    w.write::<u32>(0); // ulUnicodeRange1
    w.write::<u32>(if in_pua { UNICODE_RANGE2_PUA } else { 0 });
    w.write::<u32>(0); // ulUnicodeRange3
    w.write::<u32>(0); // ulUnicodeRange4
    w.write::<[u8; 4]>(*b"NONE"); // achVendID
    w.write::<u16>(FS_SELECTION_REGULAR);
    w.write::<u16>(first.min(0xFFFF) as u16); // usFirstCharIndex
    w.write::<u16>(last.min(0xFFFF) as u16); // usLastCharIndex
    w.write::<i16>(ctx.ascender()); // sTypoAscender
    w.write::<i16>(ctx.descender()); // sTypoDescender
    w.write::<i16>(0); // sTypoLineGap
    w.write::<u16>(ctx.units_per_em()); // usWinAscent
    w.write::<u16>(0); // usWinDescent
    w.write::<u32>(0); // ulCodePageRange1
    w.write::<u32>(0); // ulCodePageRange2
    w.write::<i16>(0); // sxHeight
    w.write::<i16>(scaled(700)); // sCapHeight
    w.write::<u16>(0); // usDefaultChar
    w.write::<u16>(0x20); // usBreakChar
    w.write::<u16>(0); // usMaxContext

    ctx.push(Tag::OS2, w.finish());
    Ok(())
}
