use crate::cff::number::{IntegerNumber, Number};
use crate::cff::operator::{Operator, TWO_BYTE_OPERATOR_MARK};
use crate::read::Reader;
use crate::write::Writer;

/// One DICT entry: its operands followed by the operator.
#[derive(Clone, Debug)]
pub struct DictEntry {
    pub operands: Vec<Number>,
    pub operator: Operator,
}

impl DictEntry {
    pub fn size(&self) -> usize {
        let operands: usize = self.operands.iter().map(|n| n.as_bytes().len()).sum();
        operands + self.operator.len()
    }
}

/// An owned DICT: an ordered sequence of entries.
#[derive(Clone, Debug, Default)]
pub struct Dict(pub Vec<DictEntry>);

impl Dict {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// The encoded byte length of the DICT.
    pub fn size(&self) -> usize {
        self.0.iter().map(|e| e.size()).sum()
    }

    /// Replace the operands of `operator`, appending the entry if absent.
    pub fn set(&mut self, operator: Operator, operands: Vec<Number>) {
        match self.0.iter_mut().find(|e| e.operator == operator) {
            Some(entry) => entry.operands = operands,
            None => self.0.push(DictEntry { operands, operator }),
        }
    }

    pub fn get(&self, operator: Operator) -> Option<&[Number]> {
        self.0
            .iter()
            .find(|e| e.operator == operator)
            .map(|e| e.operands.as_slice())
    }

    /// The operands of `operator` as integer operands.
    ///
    /// Offset slots in a built DICT are always integer-encoded; this is the
    /// accessor the convergence loop uses to inspect current widths.
    pub fn integer_operands(&self, operator: Operator) -> Option<Vec<IntegerNumber>> {
        self.get(operator)?
            .iter()
            .map(|n| match n {
                Number::Integer(int) => Some(*int),
                _ => None,
            })
            .collect()
    }

    pub fn write(&self, w: &mut Writer) {
        for entry in &self.0 {
            for operand in &entry.operands {
                w.extend(operand.as_bytes());
            }
            w.extend(entry.operator.as_bytes());
        }
    }

    /// Parse a DICT from raw bytes.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut entries = Vec::new();
        let mut operands = Vec::new();
        let mut r = Reader::new(data);

        while !r.at_end() {
            let b = r.peek::<u8>()?;
            if is_dict_one_byte_op(b) {
                let b = r.read::<u8>()?;
                let operator = if b == TWO_BYTE_OPERATOR_MARK {
                    Operator::from_two_byte(r.read::<u8>()?)
                } else {
                    Operator::from_one_byte(b)
                };
                entries.push(DictEntry { operands: std::mem::take(&mut operands), operator });
            } else {
                operands.push(Number::parse_dict_number(&mut r)?);
            }
        }

        // Trailing operands without an operator are malformed.
        if !operands.is_empty() {
            return None;
        }

        Some(Self(entries))
    }
}

fn is_dict_one_byte_op(b: u8) -> bool {
    match b {
        0..=27 => true,
        28..=30 => false,  // numbers
        31 => true,        // reserved
        32..=254 => false, // numbers
        255 => true,       // reserved
    }
}

/// The DICT operators used by a CFF2 table.
pub mod operators {
    use crate::cff::operator::Operator;

    // Top DICT.
    pub const CHAR_STRINGS: Operator = Operator::from_one_byte(17);
    pub const VSTORE: Operator = Operator::from_one_byte(24);
    pub const FONT_MATRIX: Operator = Operator::from_two_byte(7);
    pub const FD_ARRAY: Operator = Operator::from_two_byte(36);
    pub const FD_SELECT: Operator = Operator::from_two_byte(37);

    // Font DICT.
    pub const PRIVATE: Operator = Operator::from_one_byte(18);

    // Private DICT.
    pub const SUBRS: Operator = Operator::from_one_byte(19);
}

#[cfg(test)]
mod tests {
    use super::operators::*;
    use super::*;

    #[test]
    fn build_and_reparse() {
        let mut dict = Dict::new();
        dict.set(CHAR_STRINGS, vec![Number::from_i32(1234)]);
        dict.set(FD_ARRAY, vec![Number::from_i32(70_000)]);
        dict.set(PRIVATE, vec![Number::from_i32(0), Number::from_i32(56)]);

        let mut w = Writer::new();
        dict.write(&mut w);
        let bytes = w.finish();
        assert_eq!(bytes.len(), dict.size());

        let reparsed = Dict::parse(&bytes).unwrap();
        assert_eq!(reparsed.0.len(), 3);
        assert_eq!(reparsed.get(CHAR_STRINGS).unwrap()[0].as_i32(), Some(1234));
        assert_eq!(reparsed.get(FD_ARRAY).unwrap()[0].as_i32(), Some(70_000));
        let private = reparsed.get(PRIVATE).unwrap();
        assert_eq!(private[0].as_i32(), Some(0));
        assert_eq!(private[1].as_i32(), Some(56));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut dict = Dict::new();
        dict.set(CHAR_STRINGS, vec![Number::from_i32(10)]);
        dict.set(FD_ARRAY, vec![Number::from_i32(20)]);
        dict.set(CHAR_STRINGS, vec![Number::from_i32(99)]);

        assert_eq!(dict.0.len(), 2);
        assert_eq!(dict.0[0].operator, CHAR_STRINGS);
        assert_eq!(dict.get(CHAR_STRINGS).unwrap()[0].as_i32(), Some(99));
    }

    #[test]
    fn trailing_operands_are_rejected() {
        // A lone number with no operator following it.
        assert!(Dict::parse(&[139]).is_none());
    }
}
