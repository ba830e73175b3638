//! SH-4 disassembly text production (§4.7).
//!
//! Unlike the 68K disassembler, SH-4 code fragments embedded in resources
//! are short and rarely contain data interleaved with code, so this is a
//! plain two-pass disassembler: pass one decodes every instruction
//! linearly and collects branch targets; pass two renders each line,
//! attaching a label comment to any address a branch in pass one landed
//! on. There is no alternate-branch re-decode fixed point the way 68K's
//! disassembler has, since SH-4's fixed 16-bit instruction width makes
//! misaligned decoding impossible.

use std::collections::BTreeSet;

use rsrc_errors::Error;

use crate::{decode_instruction, FloatPrecision, Instruction};

/// One disassembled SH-4 instruction.
#[derive(Debug, Clone)]
pub struct DisassembledLine {
    /// Address of this instruction.
    pub address: u32,
    /// Rendered pseudo-Intel-order text.
    pub text: String,
    /// `true` if some earlier instruction branches here.
    pub is_branch_target: bool,
}

/// Disassemble a linear run of SH-4 code starting at `start_addr`.
pub fn disassemble(bytes: &[u8], start_addr: u32, precision: FloatPrecision) -> Result<Vec<DisassembledLine>, Error> {
    let mut instructions = Vec::new();
    let mut targets = BTreeSet::new();

    let mut offset = 0;
    while offset + 2 <= bytes.len() {
        let addr = start_addr.wrapping_add(offset as u32);
        let word = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);

        let instruction = decode_instruction(word, addr, precision)?;
        if let Some(target) = branch_target(&instruction) {
            targets.insert(target);
        }

        instructions.push((addr, instruction));
        offset += 2;
    }

    Ok(instructions
        .into_iter()
        .map(|(address, instruction)| DisassembledLine {
            address,
            text: render(&instruction),
            is_branch_target: targets.contains(&address),
        })
        .collect())
}

fn branch_target(instruction: &Instruction) -> Option<u32> {
    match *instruction {
        Instruction::BranchAlways { target } | Instruction::BranchSubroutine { target } | Instruction::BranchTrue { target } | Instruction::BranchFalse { target } => {
            Some(target)
        }
        _ => None,
    }
}

fn render(instruction: &Instruction) -> String {
    match *instruction {
        Instruction::Nop => "nop".to_string(),
        Instruction::ReturnFromSubroutine => "rts".to_string(),
        Instruction::MovRegister { src, dst } => format!("mov\tr{dst}, r{src}"),
        Instruction::MovImmediate { imm, dst } => format!("mov\tr{dst}, #{imm}"),
        Instruction::MovLongPcRelative { disp, dst } => format!("mov.l\tr{dst}, @(pc, {})", disp as u32 * 4),
        Instruction::Add { src, dst } => format!("add\tr{dst}, r{src}"),
        Instruction::AddImmediate { imm, dst } => format!("add\tr{dst}, #{imm}"),
        Instruction::Sub { src, dst } => format!("sub\tr{dst}, r{src}"),
        Instruction::CompareEqual { lhs, rhs } => format!("cmp/eq\tr{lhs}, r{rhs}"),
        Instruction::BranchAlways { target } => format!("bra\t${target:08X}"),
        Instruction::BranchSubroutine { target } => format!("bsr\t${target:08X}"),
        Instruction::BranchTrue { target } => format!("bt\t${target:08X}"),
        Instruction::BranchFalse { target } => format!("bf\t${target:08X}"),
        Instruction::Jump { reg } => format!("jmp\t@r{reg}"),
        Instruction::JumpSubroutine { reg } => format!("jsr\t@r{reg}"),
        Instruction::FloatMoveDouble { src, dst } => format!("fmov.d\tr{dst}, r{src}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_nop_rts() {
        let bytes = [0x00, 0x09, 0x00, 0x0B];
        let lines = disassemble(&bytes, 0x1000, FloatPrecision::SingleOnly).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "nop");
        assert_eq!(lines[1].text, "rts");
    }

    #[test]
    fn test_branch_target_marked() {
        // bra +0 (target = pc+4, past the delay slot) ; nop (delay slot) ; nop (target)
        let bytes = [0xA0, 0x00, 0x00, 0x09, 0x00, 0x09];
        let lines = disassemble(&bytes, 0x2000, FloatPrecision::SingleOnly).unwrap();

        assert!(!lines[1].is_branch_target);
        assert!(lines[2].is_branch_target);
    }
}
