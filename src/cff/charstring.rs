use crate::cff::argstack::ArgumentsStack;
use crate::cff::number::{IntegerNumber, Number};
use crate::read::Reader;
use crate::write::Writer;
use crate::Error::{MalformedFont, OffsetOverflow};
use crate::{Error, Result};

/// A pen movement in integer font units, with absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenCommand {
    MoveTo { x: i32, y: i32 },
    LineTo { x: i32, y: i32 },
    CurveTo { x1: i32, y1: i32, x2: i32, y2: i32, x: i32, y: i32 },
}

mod operators {
    pub const RLINETO: u8 = 5;
    pub const RRCURVETO: u8 = 8;
    pub const RMOVETO: u8 = 21;
}

/// Compiles pen commands into a CFF2 CharString.
///
/// Only `rmoveto`, `rlineto` and `rrcurveto` are emitted, one operator per
/// segment; coordinates become deltas from the running pen position.
/// Contours close implicitly, so no closing segment is ever written.
pub struct Compiler {
    pen: (i32, i32),
    w: Writer,
}

impl Compiler {
    pub fn new() -> Self {
        Self { pen: (0, 0), w: Writer::new() }
    }

    pub fn compile(commands: &[PenCommand]) -> Result<Vec<u8>> {
        let mut compiler = Self::new();
        for command in commands {
            compiler.push(*command)?;
        }
        Ok(compiler.finish())
    }

    pub fn push(&mut self, command: PenCommand) -> Result<()> {
        match command {
            PenCommand::MoveTo { x, y } => {
                self.delta(x, y)?;
                self.w.write::<u8>(operators::RMOVETO);
                self.pen = (x, y);
            }
            PenCommand::LineTo { x, y } => {
                self.delta(x, y)?;
                self.w.write::<u8>(operators::RLINETO);
                self.pen = (x, y);
            }
            PenCommand::CurveTo { x1, y1, x2, y2, x, y } => {
                self.delta(x1, y1)?;
                self.operand(x2 - x1)?;
                self.operand(y2 - y1)?;
                self.operand(x - x2)?;
                self.operand(y - y2)?;
                self.w.write::<u8>(operators::RRCURVETO);
                self.pen = (x, y);
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Vec<u8> {
        self.w.finish()
    }

    fn delta(&mut self, x: i32, y: i32) -> Result<()> {
        self.operand(x - self.pen.0)?;
        self.operand(y - self.pen.1)
    }

    fn operand(&mut self, value: i32) -> Result<()> {
        // Integer operands end at the 3-byte int16 form; the font's
        // coordinate space is i16-bounded anyway, so a wider delta means the
        // glyph cannot be represented.
        if !(-32768..=32767).contains(&value) {
            return Err(OffsetOverflow);
        }
        self.w.extend(IntegerNumber::from_i32(value).as_bytes());
        Ok(())
    }
}

/// Decompiles a CFF2 CharString back into pen commands.
pub struct Decompiler {
    stack: ArgumentsStack,
    pen: (f64, f64),
    commands: Vec<PenCommand>,
}

impl Decompiler {
    pub fn new() -> Self {
        Self { stack: ArgumentsStack::new(), pen: (0.0, 0.0), commands: vec![] }
    }

    pub fn decompile(charstring: &[u8]) -> Result<Vec<PenCommand>> {
        let mut decompiler = Self::new();
        let mut r = Reader::new(charstring);

        while !r.at_end() {
            // Peek instead of read: parsing a number needs the prefix byte.
            let op = r.peek::<u8>().ok_or(MalformedFont)?;

            if matches!(op, 28 | 32..=255) {
                let number =
                    Number::parse_charstring_number(&mut r).ok_or(MalformedFont)?;
                decompiler.stack.push(number)?;
                continue;
            }

            let op = r.read::<u8>().ok_or(MalformedFont)?;
            match op {
                operators::RMOVETO => decompiler.move_to()?,
                operators::RLINETO => decompiler.line_to()?,
                operators::RRCURVETO => decompiler.curve_to()?,
                _ => return Err(Error::Unimplemented),
            }
        }

        Ok(decompiler.commands)
    }

    fn move_to(&mut self) -> Result<()> {
        let args = self.stack.pop_all();
        if args.len() != 2 {
            return Err(MalformedFont);
        }

        self.pen.0 += args[0].as_f64();
        self.pen.1 += args[1].as_f64();
        self.commands.push(PenCommand::MoveTo {
            x: self.pen.0.round() as i32,
            y: self.pen.1.round() as i32,
        });
        Ok(())
    }

    fn line_to(&mut self) -> Result<()> {
        let args = self.stack.pop_all();
        if args.is_empty() || args.len() % 2 != 0 {
            return Err(MalformedFont);
        }

        for pair in args.chunks(2) {
            self.pen.0 += pair[0].as_f64();
            self.pen.1 += pair[1].as_f64();
            self.commands.push(PenCommand::LineTo {
                x: self.pen.0.round() as i32,
                y: self.pen.1.round() as i32,
            });
        }
        Ok(())
    }

    fn curve_to(&mut self) -> Result<()> {
        let args = self.stack.pop_all();
        if args.is_empty() || args.len() % 6 != 0 {
            return Err(MalformedFont);
        }

        for sextet in args.chunks(6) {
            let x1 = self.pen.0 + sextet[0].as_f64();
            let y1 = self.pen.1 + sextet[1].as_f64();
            let x2 = x1 + sextet[2].as_f64();
            let y2 = y1 + sextet[3].as_f64();
            let x = x2 + sextet[4].as_f64();
            let y = y2 + sextet[5].as_f64();
            self.pen = (x, y);
            self.commands.push(PenCommand::CurveTo {
                x1: x1.round() as i32,
                y1: y1.round() as i32,
                x2: x2.round() as i32,
                y2: y2.round() as i32,
                x: x.round() as i32,
                y: y.round() as i32,
            });
        }
        Ok(())
    }
}
