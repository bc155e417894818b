//! Disassembles an [Instructions] stream into a human-readable listing, for the `print_code`
//! feature and for debugging compiler output by hand.

use std::fmt::Write;

use crate::code::{self, Instructions, OpCode};

/// Renders every instruction in `ins`, one per line, as `NNNN OpName operand1 operand2`.
pub fn disassemble(ins: &Instructions) -> String {
    let mut out = String::new();
    let mut offset = 0;

    while offset < ins.len() {
        let _ = write!(out, "{:04} ", offset);

        let op = match OpCode::try_from(ins[offset]) {
            Ok(op) => op,
            Err(_) => {
                let _ = writeln!(out, "ERROR: unknown opcode {}", ins[offset]);
                offset += 1;
                continue;
            }
        };

        let def = code::lookup(op);
        let (operands, width) = code::read_operands(&def, &ins[offset + 1..]);
        let _ = writeln!(out, "{}", format_instruction(&def, &operands));

        offset += 1 + width;
    }

    out
}

fn format_instruction(def: &code::Definition, operands: &[usize]) -> String {
    match operands.len() {
        0 => def.name.to_string(),
        1 => format!("{} {}", def.name, operands[0]),
        2 => format!("{} {} {}", def.name, operands[0], operands[1]),
        width => format!("ERROR: unhandled operand count {width} for {}", def.name),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::code::make;

    #[test]
    fn disassembles_a_mixed_instruction_stream() {
        let instructions: Instructions = [
            make(OpCode::OpAdd, &[]),
            make(OpCode::OpGetLocal, &[1]),
            make(OpCode::OpConstant, &[2]),
            make(OpCode::OpConstant, &[65535]),
            make(OpCode::OpClosure, &[65535, 255]),
        ]
        .concat();

        let expected = "0000 OpAdd\n\
                         0001 OpGetLocal 1\n\
                         0003 OpConstant 2\n\
                         0006 OpConstant 65535\n\
                         0009 OpClosure 65535 255\n";

        assert_eq!(expected, disassemble(&instructions));
    }
}
