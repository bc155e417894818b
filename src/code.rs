//! The bytecode instruction set: opcodes, operand encoding/decoding, and disassembly support.

use crate::with_try_from_u8;

/// A flat bytecode instruction stream. Opcodes are one byte; operands are fixed-width,
/// big-endian, and immediately follow their opcode.
pub type Instructions = Vec<u8>;

static_assertions::assert_eq_size!(OpCode, u8);

with_try_from_u8! {
    /// A one-byte operation code.
    #[repr(u8)]
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
    pub enum OpCode {
        OpConstant = 0,
        OpAdd,
        OpSub,
        OpMul,
        OpDiv,
        OpPop,
        OpTrue,
        OpFalse,
        OpEqual,
        OpNotEqual,
        OpGreaterThan,
        OpMinus,
        OpBang,
        OpJumpNotTruthy,
        OpJump,
        OpNull,
        OpSetGlobal,
        OpGetGlobal,
        OpSetLocal,
        OpGetLocal,
        OpGetBuiltin,
        OpClosure,
        OpGetFree,
        OpCurrentClosure,
        OpArray,
        OpHash,
        OpIndex,
        OpCall,
        OpReturnValue,
        OpReturn,
    }
}

/// Describes an opcode's name (for disassembly) and the byte width of each of its operands.
pub struct Definition {
    pub name: &'static str,
    pub operand_widths: &'static [usize],
}

/// Looks up the [Definition] for an opcode. Every variant of [OpCode] has one; this is total.
pub fn lookup(op: OpCode) -> Definition {
    use OpCode::*;
    let (name, operand_widths): (&'static str, &'static [usize]) = match op {
        OpConstant => ("OpConstant", &[2]),
        OpAdd => ("OpAdd", &[]),
        OpSub => ("OpSub", &[]),
        OpMul => ("OpMul", &[]),
        OpDiv => ("OpDiv", &[]),
        OpPop => ("OpPop", &[]),
        OpTrue => ("OpTrue", &[]),
        OpFalse => ("OpFalse", &[]),
        OpEqual => ("OpEqual", &[]),
        OpNotEqual => ("OpNotEqual", &[]),
        OpGreaterThan => ("OpGreaterThan", &[]),
        OpMinus => ("OpMinus", &[]),
        OpBang => ("OpBang", &[]),
        OpJumpNotTruthy => ("OpJumpNotTruthy", &[2]),
        OpJump => ("OpJump", &[2]),
        OpNull => ("OpNull", &[]),
        OpSetGlobal => ("OpSetGlobal", &[2]),
        OpGetGlobal => ("OpGetGlobal", &[2]),
        OpSetLocal => ("OpSetLocal", &[1]),
        OpGetLocal => ("OpGetLocal", &[1]),
        OpGetBuiltin => ("OpGetBuiltin", &[1]),
        OpClosure => ("OpClosure", &[2, 1]),
        OpGetFree => ("OpGetFree", &[1]),
        OpCurrentClosure => ("OpCurrentClosure", &[]),
        OpArray => ("OpArray", &[2]),
        OpHash => ("OpHash", &[2]),
        OpIndex => ("OpIndex", &[]),
        OpCall => ("OpCall", &[1]),
        OpReturnValue => ("OpReturnValue", &[]),
        OpReturn => ("OpReturn", &[]),
    };
    Definition {
        name,
        operand_widths,
    }
}

/// Encodes an opcode and its operands into a freshly allocated instruction.
///
/// # Panics
///
/// Panics if the number of operands given doesn't match the opcode's [Definition], or if an
/// operand doesn't fit in its declared width.
pub fn make(op: OpCode, operands: &[usize]) -> Instructions {
    let def = lookup(op);
    assert_eq!(
        def.operand_widths.len(),
        operands.len(),
        "wrong operand count for {}",
        def.name
    );

    let mut instruction = vec![op as u8];
    for (&operand, &width) in operands.iter().zip(def.operand_widths) {
        match width {
            2 => {
                let value = u16::try_from(operand).expect("operand exceeds 16 bits");
                instruction.extend_from_slice(&value.to_be_bytes());
            }
            1 => {
                let value = u8::try_from(operand).expect("operand exceeds 8 bits");
                instruction.push(value);
            }
            other => panic!("unsupported operand width {other}"),
        }
    }
    instruction
}

/// Decodes the operands following an opcode, given its [Definition]. Returns the decoded
/// operands and the total number of bytes consumed.
pub fn read_operands(def: &Definition, ins: &[u8]) -> (Vec<usize>, usize) {
    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;

    for &width in def.operand_widths {
        match width {
            2 => {
                operands.push(read_u16(ins, offset) as usize);
                offset += 2;
            }
            1 => {
                operands.push(read_u8(ins, offset) as usize);
                offset += 1;
            }
            other => panic!("unsupported operand width {other}"),
        }
    }

    (operands, offset)
}

pub fn read_u16(ins: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([ins[offset], ins[offset + 1]])
}

pub fn read_u8(ins: &[u8], offset: usize) -> u8 {
    ins[offset]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn make_encodes_operands_big_endian() {
        let instruction = make(OpCode::OpConstant, &[65534]);
        assert_eq!(vec![OpCode::OpConstant as u8, 255, 254], instruction);

        let instruction = make(OpCode::OpGetLocal, &[255]);
        assert_eq!(vec![OpCode::OpGetLocal as u8, 255], instruction);

        let instruction = make(OpCode::OpAdd, &[]);
        assert_eq!(vec![OpCode::OpAdd as u8], instruction);

        let instruction = make(OpCode::OpClosure, &[65535, 255]);
        assert_eq!(
            vec![OpCode::OpClosure as u8, 255, 255, 255],
            instruction
        );
    }

    #[test]
    fn read_operands_roundtrips_make() {
        let cases: Vec<(OpCode, Vec<usize>)> = vec![
            (OpCode::OpConstant, vec![65535]),
            (OpCode::OpGetLocal, vec![255]),
            (OpCode::OpClosure, vec![65535, 255]),
            (OpCode::OpAdd, vec![]),
        ];

        for (op, operands) in cases {
            let instruction = make(op, &operands);
            let def = lookup(op);
            let (decoded, consumed) = read_operands(&def, &instruction[1..]);
            assert_eq!(operands, decoded);
            assert_eq!(
                def.operand_widths.iter().sum::<usize>(),
                consumed
            );
        }
    }

    #[test]
    fn opcode_try_from_u8_rejects_unknown_bytes() {
        use std::convert::TryFrom;
        assert!(OpCode::try_from(OpCode::OpReturn as u8).is_ok());
        assert!(OpCode::try_from(250u8).is_err());
    }
}
