//! Instruction decoding for the dialVM interpreter.
//!
//! An [`Instruction`] is a decoded view over a slice of the Module's code
//! section: an opcode plus whatever fixed-width operand follows it.

use crate::error::{DialError, DialResult};
use crate::op_code::{OpCode, OperandSize};

/// A decoded operand value. Only the variant matching the opcode's
/// declared [`OperandSize`] is ever populated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    None,
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    I32(i32),
    F32(f32),
    /// `CALL`/`CALL_NATIVE`/`CALL_METHOD`: a u16 index plus a u8 count.
    IndexAndCount(u16, u8),
}

/// A single fetched and decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    /// Offset of the opcode byte within the code section.
    pub pc: usize,
    /// The opcode itself.
    pub opcode: OpCode,
    /// The decoded operand, if any.
    pub operand: Operand,
    /// Offset of the byte immediately following this instruction.
    pub next_pc: usize,
}

impl Instruction {
    /// Decodes the instruction at `pc` in `code`.
    pub fn decode(code: &[u8], pc: usize) -> DialResult<Self> {
        if pc >= code.len() {
            return Err(DialError::truncated("instruction fetch past end of code"));
        }

        let raw_opcode = code[pc];
        let opcode = OpCode::from_u8(raw_opcode)
            .ok_or(DialError::UnknownOpcode { opcode: raw_opcode })?;

        let operand_start = pc + 1;
        let size = opcode.operand_size();
        let operand_end = operand_start + size.byte_len();

        if operand_end > code.len() {
            return Err(DialError::truncated(format!(
                "opcode {} missing operand bytes",
                opcode.mnemonic()
            )));
        }

        let operand = match size {
            OperandSize::None => Operand::None,
            OperandSize::U8 => {
                let byte = code[operand_start];
                if matches!(opcode, OpCode::PushI8) {
                    Operand::I8(byte as i8)
                } else {
                    Operand::U8(byte)
                }
            }
            OperandSize::U16 => {
                let bytes = [code[operand_start], code[operand_start + 1]];
                if matches!(opcode, OpCode::PushI16) {
                    Operand::I16(i16::from_le_bytes(bytes))
                } else {
                    Operand::U16(u16::from_le_bytes(bytes))
                }
            }
            OperandSize::I32 => {
                let bytes = [
                    code[operand_start],
                    code[operand_start + 1],
                    code[operand_start + 2],
                    code[operand_start + 3],
                ];
                if matches!(opcode, OpCode::PushF32) {
                    Operand::F32(f32::from_le_bytes(bytes))
                } else {
                    Operand::I32(i32::from_le_bytes(bytes))
                }
            }
            OperandSize::U16AndU8 => {
                let index = u16::from_le_bytes([code[operand_start], code[operand_start + 1]]);
                let count = code[operand_start + 2];
                Operand::IndexAndCount(index, count)
            }
        };

        Ok(Instruction {
            pc,
            opcode,
            operand,
            next_pc: operand_end,
        })
    }
}

impl Operand {
    pub fn as_i32(self) -> Option<i32> {
        match self {
            Operand::I32(v) => Some(v),
            Operand::I16(v) => Some(v as i32),
            Operand::I8(v) => Some(v as i32),
            Operand::U16(v) => Some(v as i32),
            Operand::U8(v) => Some(v as i32),
            _ => None,
        }
    }

    pub fn as_u16(self) -> Option<u16> {
        match self {
            Operand::U16(v) => Some(v),
            Operand::U8(v) => Some(v as u16),
            _ => None,
        }
    }

    pub fn as_u8(self) -> Option<u8> {
        match self {
            Operand::U8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(self) -> Option<f32> {
        match self {
            Operand::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_index_and_count(self) -> Option<(u16, u8)> {
        match self {
            Operand::IndexAndCount(i, c) => Some((i, c)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_push_i32() {
        let code = [OpCode::PushI32.to_u8(), 0x0A, 0, 0, 0];
        let ins = Instruction::decode(&code, 0).unwrap();
        assert_eq!(ins.operand.as_i32(), Some(10));
        assert_eq!(ins.next_pc, 5);
    }

    #[test]
    fn decodes_call_index_and_count() {
        let code = [OpCode::Call.to_u8(), 0x02, 0x00, 0x03];
        let ins = Instruction::decode(&code, 0).unwrap();
        assert_eq!(ins.operand.as_index_and_count(), Some((2, 3)));
        assert_eq!(ins.next_pc, 4);
    }

    #[test]
    fn truncated_operand_errors() {
        let code = [OpCode::PushI32.to_u8(), 0x00];
        assert!(Instruction::decode(&code, 0).is_err());
    }

    #[test]
    fn unknown_opcode_errors() {
        let code = [0xAA];
        assert!(matches!(
            Instruction::decode(&code, 0),
            Err(DialError::UnknownOpcode { opcode: 0xAA })
        ));
    }
}
