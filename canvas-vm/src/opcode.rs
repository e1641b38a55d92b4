//! # Bytecode
//!
//! One opcode byte followed by a variable-length operand. There is no
//! header, version tag or length prefix: the end of the buffer is the end
//! of the program. Opcode values and operand layouts are fixed so that
//! previously compiled programs and dumps stay readable.
//!
//! | Opcode          | Byte | Operand                          |
//! |-----------------|------|----------------------------------|
//! | READ            | 0x00 |                                  |
//! | WRITE           | 0x01 |                                  |
//! | DUP             | 0x02 |                                  |
//! | INTEGER_LITERAL | 0x10 | 4 bytes, little-endian i32       |
//! | COLOR_LITERAL   | 0x11 | 4 bytes, see [`Color::to_operand`] |
//! | STRING_LITERAL  | 0x12 | 1 length byte + N ASCII bytes    |
//! | FILL .. WRITE_TEXT | 0x20-0x23 |                         |
//! | RGB .. LAB      | 0x30-0x33 | (not implemented)           |
//! | GET_PIXEL .. GET_RAND | 0x40-0x44 |                       |

use crate::color::Color;
use crate::error::{self, Result};
use std::fmt::{self, Write as _};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Variables and stack
    Read = 0x00,
    Write = 0x01,
    Dup = 0x02,

    // Literals
    IntegerLiteral = 0x10,
    ColorLiteral = 0x11,
    StringLiteral = 0x12,

    // Drawing
    Fill = 0x20,
    SetPixel = 0x21,
    SetRect = 0x22,
    WriteText = 0x23,

    // Colour spaces
    Rgb = 0x30,
    Cmyk = 0x31,
    Hsv = 0x32,
    Lab = 0x33,

    // Queries
    GetPixel = 0x40,
    GetNoise = 0x41,
    GetWidth = 0x42,
    GetHeight = 0x43,
    GetRand = 0x44,
}

/// Built-in function names and the opcode each call compiles to
const FUNCTIONS: &[(&str, Opcode)] = &[
    ("fill", Opcode::Fill),
    ("setpixel", Opcode::SetPixel),
    ("setrect", Opcode::SetRect),
    ("write", Opcode::WriteText),
    ("rgb", Opcode::Rgb),
    ("cmyk", Opcode::Cmyk),
    ("hsv", Opcode::Hsv),
    ("lab", Opcode::Lab),
    ("getpixel", Opcode::GetPixel),
    ("getnoise", Opcode::GetNoise),
    ("getwidth", Opcode::GetWidth),
    ("getheight", Opcode::GetHeight),
    ("getrand", Opcode::GetRand),
];

impl Opcode {
    /// Convert raw byte to opcode
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Opcode::Read),
            0x01 => Some(Opcode::Write),
            0x02 => Some(Opcode::Dup),

            0x10 => Some(Opcode::IntegerLiteral),
            0x11 => Some(Opcode::ColorLiteral),
            0x12 => Some(Opcode::StringLiteral),

            0x20 => Some(Opcode::Fill),
            0x21 => Some(Opcode::SetPixel),
            0x22 => Some(Opcode::SetRect),
            0x23 => Some(Opcode::WriteText),

            0x30 => Some(Opcode::Rgb),
            0x31 => Some(Opcode::Cmyk),
            0x32 => Some(Opcode::Hsv),
            0x33 => Some(Opcode::Lab),

            0x40 => Some(Opcode::GetPixel),
            0x41 => Some(Opcode::GetNoise),
            0x42 => Some(Opcode::GetWidth),
            0x43 => Some(Opcode::GetHeight),
            0x44 => Some(Opcode::GetRand),

            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Look up a built-in function, ignoring case
    pub fn from_function_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        FUNCTIONS
            .iter()
            .find(|(fname, _)| *fname == lower)
            .map(|(_, op)| *op)
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Dup => "DUP",
            Opcode::IntegerLiteral => "INTEGER_LITERAL",
            Opcode::ColorLiteral => "COLOR_LITERAL",
            Opcode::StringLiteral => "STRING_LITERAL",
            Opcode::Fill => "FILL",
            Opcode::SetPixel => "SET_PIXEL",
            Opcode::SetRect => "SET_RECT",
            Opcode::WriteText => "WRITE_TEXT",
            Opcode::Rgb => "RGB",
            Opcode::Cmyk => "CMYK",
            Opcode::Hsv => "HSV",
            Opcode::Lab => "LAB",
            Opcode::GetPixel => "GET_PIXEL",
            Opcode::GetNoise => "GET_NOISE",
            Opcode::GetWidth => "GET_WIDTH",
            Opcode::GetHeight => "GET_HEIGHT",
            Opcode::GetRand => "GET_RAND",
        }
    }

    /// The colour-space conversions are accepted by the compiler but have
    /// no runtime semantics.
    pub fn is_implemented(self) -> bool {
        !matches!(self, Opcode::Rgb | Opcode::Cmyk | Opcode::Hsv | Opcode::Lab)
    }

    /// Operand length given the bytes that follow the opcode.
    ///
    /// `None` when the length itself cannot be read (a STRING_LITERAL with
    /// no length byte).
    pub fn operand_len(self, rest: &[u8]) -> Option<usize> {
        match self {
            Opcode::IntegerLiteral | Opcode::ColorLiteral => Some(4),
            Opcode::StringLiteral => rest.first().map(|len| 1 + *len as usize),
            _ => Some(0),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Opcode without operand
    Op(Opcode),
    Integer(i32),
    Color(Color),
    String(Vec<u8>),
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Op(op) => *op,
            Instruction::Integer(_) => Opcode::IntegerLiteral,
            Instruction::Color(_) => Opcode::ColorLiteral,
            Instruction::String(_) => Opcode::StringLiteral,
        }
    }

    /// Append the encoded instruction to `out`
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode().as_u8());
        match self {
            Instruction::Op(_) => {}
            Instruction::Integer(i) => out.extend_from_slice(&i.to_le_bytes()),
            Instruction::Color(c) => out.extend_from_slice(&c.to_operand()),
            Instruction::String(bytes) => {
                out.push(bytes.len() as u8);
                out.extend_from_slice(bytes);
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Op(op) => write!(f, "{}", op),
            Instruction::Integer(i) => write!(f, "INTEGER_LITERAL {}", i),
            Instruction::Color(c) => write!(f, "COLOR_LITERAL #{:08x}", c.to_argb()),
            Instruction::String(bytes) => {
                write!(f, "STRING_LITERAL \"{}\"", String::from_utf8_lossy(bytes))
            }
        }
    }
}

/// Decode the instruction at `position`, returning it with the cursor of
/// the next instruction. Never reads past the end of `bytecode`.
pub fn decode_at(bytecode: &[u8], position: usize) -> Result<(Instruction, usize)> {
    let byte = *bytecode
        .get(position)
        .ok_or_else(|| error::truncated_bytecode(position, 1, 0))?;
    let opcode = Opcode::from_u8(byte).ok_or_else(|| error::invalid_opcode(byte, position))?;

    let rest = &bytecode[position + 1..];
    let len = opcode
        .operand_len(rest)
        .ok_or_else(|| error::truncated_bytecode(position, 1, rest.len()))?;
    if rest.len() < len {
        return Err(error::truncated_bytecode(position, len, rest.len()));
    }
    let operand = &rest[..len];

    let instruction = match opcode {
        Opcode::IntegerLiteral => {
            Instruction::Integer(i32::from_le_bytes([operand[0], operand[1], operand[2], operand[3]]))
        }
        Opcode::ColorLiteral => {
            Instruction::Color(Color::from_operand([operand[0], operand[1], operand[2], operand[3]]))
        }
        Opcode::StringLiteral => Instruction::String(operand[1..].to_vec()),
        op => Instruction::Op(op),
    };

    Ok((instruction, position + 1 + len))
}

/// Decode a whole buffer
pub fn decode(bytecode: &[u8]) -> Result<Vec<(usize, Instruction)>> {
    let mut out = Vec::new();
    let mut position = 0;
    while position < bytecode.len() {
        let (instruction, next) = decode_at(bytecode, position)?;
        out.push((position, instruction));
        position = next;
    }
    Ok(out)
}

/// One line per instruction: byte offset, mnemonic, operand. Decoding stops
/// at the first malformed instruction, which is shown as an error line.
pub fn disassemble(bytecode: &[u8]) -> String {
    let mut out = String::new();
    let mut position = 0;
    while position < bytecode.len() {
        match decode_at(bytecode, position) {
            Ok((instruction, next)) => {
                let _ = writeln!(out, "{:04} {}", position, instruction);
                position = next;
            }
            Err(e) => {
                let _ = writeln!(out, "{:04} <{}: {}>", position, e.kind(), e.message());
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_byte_round_trip() {
        for byte in 0..=u8::MAX {
            if let Some(op) = Opcode::from_u8(byte) {
                assert_eq!(op.as_u8(), byte);
            }
        }
        assert_eq!(Opcode::from_u8(0x03), None);
        assert_eq!(Opcode::from_u8(0xFF), None);
    }

    #[test]
    fn test_function_table() {
        assert_eq!(Opcode::from_function_name("fill"), Some(Opcode::Fill));
        assert_eq!(Opcode::from_function_name("SetPixel"), Some(Opcode::SetPixel));
        assert_eq!(Opcode::from_function_name("WRITE"), Some(Opcode::WriteText));
        assert_eq!(Opcode::from_function_name("getrand"), Some(Opcode::GetRand));
        assert_eq!(Opcode::from_function_name("blur"), None);
        assert_eq!(Opcode::from_function_name("read"), None);
    }

    #[test]
    fn test_unimplemented_set() {
        for op in [Opcode::Rgb, Opcode::Cmyk, Opcode::Hsv, Opcode::Lab] {
            assert!(!op.is_implemented());
        }
        assert!(Opcode::Fill.is_implemented());
    }

    #[test]
    fn test_operand_len() {
        assert_eq!(Opcode::IntegerLiteral.operand_len(&[]), Some(4));
        assert_eq!(Opcode::StringLiteral.operand_len(&[3, b'a']), Some(4));
        assert_eq!(Opcode::StringLiteral.operand_len(&[]), None);
        assert_eq!(Opcode::Fill.operand_len(&[]), Some(0));
    }

    #[test]
    fn test_decode_literals() {
        let mut buf = Vec::new();
        Instruction::Integer(-2).encode(&mut buf);
        Instruction::Color(Color::rgb(0, 255, 0)).encode(&mut buf);
        Instruction::String(b"hi".to_vec()).encode(&mut buf);
        Instruction::Op(Opcode::Fill).encode(&mut buf);

        assert_eq!(&buf[..5], &[0x10, 0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&buf[5..10], &[0x11, 0x00, 0xFF, 0x00, 0xFF]);
        assert_eq!(&buf[10..14], &[0x12, 2, b'h', b'i']);

        let decoded = decode(&buf).unwrap();
        let positions: Vec<usize> = decoded.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0, 5, 10, 14]);
        assert_eq!(decoded[1].1, Instruction::Color(Color::rgb(0, 255, 0)));
        assert_eq!(decoded[3].1, Instruction::Op(Opcode::Fill));
    }

    #[test]
    fn test_decode_errors() {
        let err = decode_at(&[0x99], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOpcode);

        let err = decode_at(&[0x10, 1, 2], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedBytecode);

        let err = decode_at(&[0x12], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedBytecode);

        let err = decode_at(&[0x12, 5, b'a'], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedBytecode);
    }

    #[test]
    fn test_disassemble() {
        let buf = [0x10, 10, 0, 0, 0, 0x11, 0xFF, 0x00, 0x00, 0xFF, 0x20, 0x77];
        let text = disassemble(&buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "0000 INTEGER_LITERAL 10");
        assert_eq!(lines[1], "0005 COLOR_LITERAL #ffff0000");
        assert_eq!(lines[2], "0010 FILL");
        assert!(lines[3].starts_with("0011 <InvalidOpcode"));
    }
}
