use crate::read::Reader;
use std::fmt::{Debug, Formatter};

const FLOAT_STACK_LEN: usize = 64;
const END_OF_FLOAT_FLAG: u8 = 0xf;

/// An integer operand together with its encoded form.
///
/// The encoded width is significant: offsets in the top DICT are stored as
/// such operands, and the offset convergence loop reasons about their widths.
#[derive(Clone, Copy)]
pub struct IntegerNumber {
    bytes: [u8; 5],
    len: u8,
    value: i32,
}

impl Debug for IntegerNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl IntegerNumber {
    /// Encode an integer with the narrowest representation that holds it.
    pub fn from_i32(value: i32) -> Self {
        if (-107..=107).contains(&value) {
            let b0 = (value + 139) as u8;
            Self::from_raw([b0, 0, 0, 0, 0], 1, value)
        } else if (108..=1131).contains(&value) {
            let t = value - 108;
            Self::from_raw([(t / 256 + 247) as u8, (t % 256) as u8, 0, 0, 0], 2, value)
        } else if (-1131..=-108).contains(&value) {
            let t = -value - 108;
            Self::from_raw([(t / 256 + 251) as u8, (t % 256) as u8, 0, 0, 0], 2, value)
        } else if (-32768..=32767).contains(&value) {
            let b = (value as i16).to_be_bytes();
            Self::from_raw([28, b[0], b[1], 0, 0], 3, value)
        } else {
            Self::from_i32_as_int5(value)
        }
    }

    /// Encode an integer with the full 5-byte representation.
    pub fn from_i32_as_int5(value: i32) -> Self {
        let b = value.to_be_bytes();
        Self::from_raw([29, b[0], b[1], b[2], b[3]], 5, value)
    }

    /// Encode an integer minimally, but no narrower than `min_len` bytes.
    ///
    /// Valid widths are 1, 2, 3 and 5. A value in the ±107 range has no
    /// 2-byte form, so a floor of 2 lands on the 3-byte form; a floor of 4
    /// rounds up to 5.
    pub fn from_i32_with_min_len(value: i32, min_len: usize) -> Self {
        let minimal = Self::from_i32(value);
        if minimal.len() >= min_len {
            return minimal;
        }

        if min_len <= 3 && (-32768..=32767).contains(&value) {
            Self::from_i16_as_int3(value)
        } else {
            Self::from_i32_as_int5(value)
        }
    }

    fn from_i16_as_int3(value: i32) -> Self {
        debug_assert!((-32768..=32767).contains(&value));
        let b = (value as i16).to_be_bytes();
        Self::from_raw([28, b[0], b[1], 0, 0], 3, value)
    }

    fn from_raw(bytes: [u8; 5], len: u8, value: i32) -> Self {
        Self { bytes, len, value }
    }

    pub fn parse(r: &mut Reader<'_>) -> Option<Self> {
        let b0 = r.read::<u8>()?;
        match b0 {
            28 => {
                let n = i32::from(r.read::<i16>()?);
                Some(Self::from_i16_as_int3(n))
            }
            29 => Some(Self::from_i32_as_int5(r.read::<i32>()?)),
            32..=246 => {
                let n = i32::from(b0) - 139;
                Some(Self::from_raw([b0, 0, 0, 0, 0], 1, n))
            }
            247..=250 => {
                let b1 = i32::from(r.read::<u8>()?);
                let n = (i32::from(b0) - 247) * 256 + b1 + 108;
                Some(Self::from_raw([b0, b1 as u8, 0, 0, 0], 2, n))
            }
            251..=254 => {
                let b1 = i32::from(r.read::<u8>()?);
                let n = -(i32::from(b0) - 251) * 256 - b1 - 108;
                Some(Self::from_raw([b0, b1 as u8, 0, 0, 0], 2, n))
            }
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        self.value
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }
}

/// A nibble-encoded real number. Only produced by the decode path; the
/// builder never emits reals.
#[derive(Clone)]
pub struct RealNumber {
    bytes: Vec<u8>,
    value: f64,
}

impl Debug for RealNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl RealNumber {
    pub fn parse(r: &mut Reader<'_>) -> Option<Self> {
        let start = r.clone();
        let begin = r.offset();

        let mut data = [0u8; FLOAT_STACK_LEN];
        let mut idx = 0;

        // Skip the 30 prefix.
        r.read::<u8>()?;

        loop {
            let b: u8 = r.read()?;
            let nibble1 = b >> 4;
            let nibble2 = b & 15;

            if nibble1 == END_OF_FLOAT_FLAG {
                break;
            }

            idx = parse_float_nibble(nibble1, idx, &mut data)?;

            if nibble2 == END_OF_FLOAT_FLAG {
                break;
            }

            idx = parse_float_nibble(nibble2, idx, &mut data)?;
        }

        let s = core::str::from_utf8(&data[..idx]).ok()?;
        let value = s.parse().ok()?;
        let len = r.offset() - begin;

        let mut start = start;
        Some(RealNumber { bytes: start.read_bytes(len)?.to_vec(), value })
    }

    pub fn as_f64(&self) -> f64 {
        self.value
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A 16.16 fixed-point number, the `255` operand form of CharStrings.
///
/// Decode-only: the builder rounds to integer units and never emits fixed
/// operands.
#[derive(Clone, Copy)]
pub struct FixedNumber(i32);

impl Debug for FixedNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

impl FixedNumber {
    pub fn parse(r: &mut Reader<'_>) -> Option<Self> {
        let b0 = r.read::<u8>()?;
        if b0 != 255 {
            return None;
        }
        Some(Self(r.read::<i32>()?))
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 65536.0
    }
}

/// A CFF operand: an integer, real, or 16.16 fixed number.
#[derive(Clone)]
pub enum Number {
    Integer(IntegerNumber),
    Real(RealNumber),
    Fixed(FixedNumber),
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::zero()
    }
}

impl Number {
    pub fn from_i32(value: i32) -> Self {
        Number::Integer(IntegerNumber::from_i32(value))
    }

    pub fn zero() -> Self {
        Number::Integer(IntegerNumber::from_i32(0))
    }

    /// Parse a number as it appears in a DICT.
    pub fn parse_dict_number(r: &mut Reader<'_>) -> Option<Self> {
        match r.peek::<u8>()? {
            30 => Some(Number::Real(RealNumber::parse(r)?)),
            _ => Some(Number::Integer(IntegerNumber::parse(r)?)),
        }
    }

    /// Parse a number as it appears in a CharString.
    pub fn parse_charstring_number(r: &mut Reader<'_>) -> Option<Self> {
        match r.peek::<u8>()? {
            255 => Some(Number::Fixed(FixedNumber::parse(r)?)),
            _ => Some(Number::Integer(IntegerNumber::parse(r)?)),
        }
    }

    /// The operand's encoded form.
    ///
    /// Fixed operands are CharString-only and never stored in a DICT, so
    /// they have no DICT encoding.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Number::Integer(n) => n.as_bytes(),
            Number::Real(n) => n.as_bytes(),
            Number::Fixed(_) => &[],
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(n) => n.as_i32() as f64,
            Number::Real(n) => n.as_f64(),
            Number::Fixed(n) => n.as_f64(),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Number::Integer(n) => Some(n.as_i32()),
            Number::Real(n) => {
                let v = n.as_f64();
                (v.fract() == 0.0).then_some(v as i32)
            }
            Number::Fixed(n) => {
                let v = n.as_f64();
                (v.fract() == 0.0).then_some(v as i32)
            }
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        u32::try_from(self.as_i32()?).ok()
    }
}

fn parse_float_nibble(nibble: u8, mut idx: usize, data: &mut [u8]) -> Option<usize> {
    if idx == FLOAT_STACK_LEN {
        return None;
    }

    match nibble {
        0..=9 => {
            data[idx] = b'0' + nibble;
        }
        10 => {
            data[idx] = b'.';
        }
        11 => {
            data[idx] = b'E';
        }
        12 => {
            if idx + 1 == FLOAT_STACK_LEN {
                return None;
            }

            data[idx] = b'E';
            idx += 1;
            data[idx] = b'-';
        }
        14 => {
            data[idx] = b'-';
        }
        _ => {
            return None;
        }
    }

    idx += 1;
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(nums: &[i32], expected_len: usize) {
        for &num in nums {
            let integer = IntegerNumber::from_i32(num);
            let mut r = Reader::new(integer.as_bytes());
            let reparsed = IntegerNumber::parse(&mut r).unwrap();
            assert_eq!(integer.len(), expected_len);
            assert_eq!(reparsed.as_bytes().len(), expected_len);
            assert_eq!(reparsed.as_i32(), num);
        }
    }

    #[test]
    fn size1_roundtrip() {
        roundtrip(&[0, 1, -1, 93, 107, -107], 1);
    }

    #[test]
    fn size2_roundtrip() {
        roundtrip(&[108, -108, 255, -255, 349, -349, 845, -845, 1131, -1131], 2);
    }

    #[test]
    fn size3_roundtrip() {
        roundtrip(&[1132, -1132, 2450, -2450, 4096, -4096, 32767, -32768], 3);
    }

    #[test]
    fn size5_roundtrip() {
        roundtrip(&[32768, -32769, i32::MAX, i32::MIN], 5);
    }

    #[test]
    fn min_len_floor() {
        // A floored operand never narrows, and still round-trips.
        let n = IntegerNumber::from_i32_with_min_len(64, 3);
        assert_eq!(n.len(), 3);
        let mut r = Reader::new(n.as_bytes());
        assert_eq!(IntegerNumber::parse(&mut r).unwrap().as_i32(), 64);

        let n = IntegerNumber::from_i32_with_min_len(64, 5);
        assert_eq!(n.len(), 5);
        let mut r = Reader::new(n.as_bytes());
        assert_eq!(IntegerNumber::parse(&mut r).unwrap().as_i32(), 64);

        // Already wide enough: stays minimal.
        let n = IntegerNumber::from_i32_with_min_len(70000, 3);
        assert_eq!(n.len(), 5);
    }

    #[test]
    fn parse_float() {
        let num = [0x1E, 0xE2, 0x49, 0x32, 0xA1, 0x2C, 0x2F];
        let mut r = Reader::new(&num);
        let real = RealNumber::parse(&mut r).unwrap();
        assert_eq!(-249.3212, real.as_f64());
    }

    #[test]
    fn fixed_decodes_fractions() {
        // 1.5 in 16.16: 0x00018000.
        let bytes = [255, 0x00, 0x01, 0x80, 0x00];
        let mut r = Reader::new(&bytes);
        let fixed = FixedNumber::parse(&mut r).unwrap();
        assert_eq!(fixed.as_f64(), 1.5);
    }
}
