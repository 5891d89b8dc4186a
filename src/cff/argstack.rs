use crate::cff::number::Number;
use crate::Error::MalformedFont;
use crate::Result;

// CFF2 raises the Type 2 operand limit to 513.
const MAX_OPERANDS_LEN: usize = 513;

pub struct ArgumentsStack {
    pub data: Vec<Number>,
}

impl ArgumentsStack {
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn push(&mut self, n: Number) -> Result<()> {
        if self.len() == MAX_OPERANDS_LEN {
            Err(MalformedFont)
        } else {
            self.data.push(n);
            Ok(())
        }
    }

    #[inline]
    pub fn pop_all(&mut self) -> Vec<Number> {
        std::mem::take(&mut self.data)
    }
}
