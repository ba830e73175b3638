//! Disassembly text production (§4.5).
//!
//! Walks a code region linearly, decoding one instruction at a time via
//! [`crate::decode::decode_instruction`] and rendering it to text. Branch
//! and subroutine-call targets are collected as we go; any target that
//! falls inside the already-disassembled range but wasn't reached by the
//! linear walk (a forward branch into what looked like inline data, or a
//! `dc.w` table entry later jumped to) triggers a second decode pass
//! starting at that address, repeated to a fixed point. This mirrors how
//! MacsBug and other classic disassemblers recover code that a naive
//! single pass would mis-decode as data.
//!
//! MacsBug commonly left an inline Pascal string naming a routine right
//! after its final `rts`/`jmp (a0)`; when one is found it's attached as a
//! comment and its bytes are excluded from further decoding.

use std::collections::{BTreeMap, BTreeSet};

use rsrc_errors::Error;
use rsrc_io::Reader;

use crate::decode::{decode_instruction, BinaryOp, Instruction, MulDivOp, ShiftCount, ShiftOp, UnaryOp};
use crate::ea::{EffectiveAddress, IndexRegister, Size};

/// One disassembled instruction or inline data/string span.
#[derive(Debug, Clone)]
pub struct DisassembledLine {
    /// Absolute address of this line.
    pub address: u32,
    /// Length in bytes.
    pub length: u32,
    /// Rendered mnemonic and operands (or a `dc.b "..."` for an inline
    /// MacsBug name).
    pub text: String,
    /// Branch/call/jump target, if any, for the caller to track.
    pub target: Option<u32>,
}

/// Disassemble `bytes` (a view of memory starting at `start_addr`),
/// optionally annotating branch targets with `labels` and marking known
/// jump-table entries at the addresses in `jump_table`.
pub fn disassemble(
    bytes: &[u8],
    start_addr: u32,
    labels: Option<&BTreeMap<u32, String>>,
    jump_table: Option<&[u32]>,
) -> Result<Vec<DisassembledLine>, Error> {
    let end_addr = start_addr.wrapping_add(bytes.len() as u32);
    let mut lines: BTreeMap<u32, DisassembledLine> = BTreeMap::new();
    let mut pending: BTreeSet<u32> = BTreeSet::new();
    let mut visited: BTreeSet<u32> = BTreeSet::new();

    pending.insert(start_addr);
    if let Some(table) = jump_table {
        pending.extend(table.iter().copied().filter(|&a| a >= start_addr && a < end_addr));
    }

    while let Some(addr) = pending.iter().next().copied() {
        pending.remove(&addr);
        if visited.contains(&addr) || addr < start_addr || addr >= end_addr {
            continue;
        }

        let mut cursor = addr;
        let mut expect_macsbug_name = false;
        loop {
            if visited.contains(&cursor) || cursor < start_addr || cursor >= end_addr {
                break;
            }

            let offset = (cursor - start_addr) as usize;

            if expect_macsbug_name {
                expect_macsbug_name = false;
                if let Some((name, consumed)) = detect_macsbug_name(&bytes[offset..]) {
                    lines.insert(
                        cursor,
                        DisassembledLine { address: cursor, length: consumed as u32, text: format!("dc.b\t\"{name}\"\t; MacsBug name"), target: None },
                    );
                    visited.insert(cursor);
                    cursor = cursor.wrapping_add(consumed as u32);
                    continue;
                }
            }

            let mut reader = Reader::new(&bytes[offset..]);
            let instruction = match decode_instruction(&mut reader, cursor) {
                Ok(instr) => instr,
                Err(_) => {
                    lines.insert(
                        cursor,
                        DisassembledLine {
                            address: cursor,
                            length: 2,
                            text: format!("dc.w\t${:04X}", u16::from_be_bytes([bytes[offset], bytes.get(offset + 1).copied().unwrap_or(0)])),
                            target: None,
                        },
                    );
                    visited.insert(cursor);
                    cursor = cursor.wrapping_add(2);
                    continue;
                }
            };

            let length = reader.position() as u32;
            let target = branch_target(&instruction);
            let text = render(&instruction, labels);
            let falls_through = !matches!(
                instruction,
                Instruction::Return
                    | Instruction::ReturnFromException
                    | Instruction::ReturnAndDeallocate { .. }
                    | Instruction::Jump { .. }
                    | Instruction::Branch { condition: crate::decode::Condition::True, is_subroutine: false, .. }
            );

            lines.insert(cursor, DisassembledLine { address: cursor, length, text, target });
            visited.insert(cursor);

            if let Some(target) = target {
                if !visited.contains(&target) {
                    pending.insert(target);
                }
            }

            cursor = cursor.wrapping_add(length);

            if !falls_through {
                expect_macsbug_name = true;
            }
        }
    }

    Ok(lines.into_values().collect())
}

fn branch_target(instruction: &Instruction) -> Option<u32> {
    match *instruction {
        Instruction::Branch { target, .. } => Some(target),
        Instruction::DbraCc { target, .. } => Some(target),
        _ => None,
    }
}

/// A MacsBug inline name is a Pascal-style length byte (1-31, a typical
/// Toolbox routine-name length) followed by that many printable ASCII
/// bytes, padded to an even address.
fn detect_macsbug_name(bytes: &[u8]) -> Option<(String, usize)> {
    let len = *bytes.first()? as usize;
    if !(1..=31).contains(&len) || bytes.len() < 1 + len {
        return None;
    }

    let candidate = &bytes[1..1 + len];
    if !candidate.iter().all(|&b| (0x20..0x7F).contains(&b)) {
        return None;
    }

    let name = String::from_utf8_lossy(candidate).into_owned();
    let consumed = if (1 + len) % 2 == 0 { 1 + len } else { 2 + len };

    Some((name, consumed))
}

fn render(instruction: &Instruction, labels: Option<&BTreeMap<u32, String>>) -> String {
    let label_or_hex = |addr: u32| -> String {
        labels.and_then(|l| l.get(&addr)).cloned().unwrap_or_else(|| format!("${addr:08X}"))
    };

    match *instruction {
        Instruction::Move { size, src, dst } => {
            format!("move{}\t{}, {}", size_suffix(size), render_ea(&src), render_ea(&dst))
        }
        Instruction::Movem { size, to_memory, register_mask, ea } => {
            let regs = render_register_mask(register_mask);
            if to_memory {
                format!("movem{}\t{regs}, {}", size_suffix(size), render_ea(&ea))
            } else {
                format!("movem{}\t{}, {regs}", size_suffix(size), render_ea(&ea))
            }
        }
        Instruction::Moveq { data, dst_reg } => format!("moveq\t#{data}, d{dst_reg}"),
        Instruction::Lea { src, dst_reg } => format!("lea\t{}, a{dst_reg}", render_ea(&src)),
        Instruction::Pea { src } => format!("pea\t{}", render_ea(&src)),
        Instruction::Unary { op, size, ea } => format!("{}{}\t{}", unary_mnemonic(op), size_suffix(size), render_ea(&ea)),
        Instruction::Binary { op, size, operands } => {
            format!("{}{}\t{}, {}", binary_mnemonic(op), size_suffix(size), render_ea(&operands.src), render_ea(&operands.dst))
        }
        Instruction::Immediate { op, size, imm, dst } => {
            format!("{}i{}\t#${imm:X}, {}", binary_mnemonic(op), size_suffix(size), render_ea(&dst))
        }
        Instruction::Quick { is_add, size, data, dst } => {
            format!("{}q{}\t#{data}, {}", if is_add { "add" } else { "sub" }, size_suffix(size), render_ea(&dst))
        }
        Instruction::Shift { op, size, left, count, ea } => {
            let dir = if left { "l" } else { "r" };
            let count_text = match count {
                ShiftCount::Immediate(n) => format!("#{n}"),
                ShiftCount::Register(r) => format!("d{r}"),
            };
            let ea_text = ea.as_ref().map(render_ea).unwrap_or_default();
            format!("{}{dir}{}\t{count_text}, {ea_text}", shift_mnemonic(op), size_suffix(size))
        }
        Instruction::MulDiv { op, src, dst_reg } => format!("{}\t{}, d{dst_reg}", muldiv_mnemonic(op), render_ea(&src)),
        Instruction::Exchange { mode, reg_x, reg_y } => match mode {
            crate::decode::ExchangeMode::DataData => format!("exg\td{reg_x}, d{reg_y}"),
            crate::decode::ExchangeMode::AddrAddr => format!("exg\ta{reg_x}, a{reg_y}"),
            crate::decode::ExchangeMode::DataAddr => format!("exg\td{reg_x}, a{reg_y}"),
        },
        Instruction::Branch { condition, is_subroutine, target } => {
            let mnemonic = if is_subroutine { "bsr".to_string() } else { format!("b{}", condition.mnemonic()) };
            format!("{mnemonic}\t{}", label_or_hex(target))
        }
        Instruction::DbraCc { condition, reg, target } => format!("db{}\td{reg}, {}", condition.mnemonic(), label_or_hex(target)),
        Instruction::SetCc { condition, ea } => format!("s{}\t{}", condition.mnemonic(), render_ea(&ea)),
        Instruction::Jump { ea } => format!("jmp\t{}", render_ea(&ea)),
        Instruction::JumpSubroutine { ea } => format!("jsr\t{}", render_ea(&ea)),
        Instruction::Return => "rts".to_string(),
        Instruction::ReturnFromException => "rte".to_string(),
        Instruction::ReturnAndDeallocate { imm } => format!("rtd\t#{imm}"),
        Instruction::Link { reg, displacement } => format!("link\ta{reg}, #{displacement}"),
        Instruction::Unlink { reg } => format!("unlk\ta{reg}"),
        Instruction::Nop => "nop".to_string(),
        Instruction::Reset => "reset".to_string(),
        Instruction::Stop { imm } => format!("stop\t#${imm:04X}"),
        Instruction::Trap { vector } => format!("trap\t#{vector}"),
        Instruction::TrapOnOverflow => "trapv".to_string(),
        Instruction::ATrap { word } => match crate::traps::trap_name(word) {
            Some(name) => format!("{name}"),
            None => format!("dc.w\t${word:04X}\t; A-line"),
        },
        Instruction::FLine { word } => format!("dc.w\t${word:04X}\t; F-line"),
        Instruction::MoveStatus { to_sr, from_sr, ea } => {
            if to_sr {
                format!("move\t{}, sr", render_ea(&ea))
            } else if from_sr {
                format!("move\tsr, {}", render_ea(&ea))
            } else {
                unreachable!("MoveStatus always sets exactly one direction")
            }
        }
    }
}

fn render_register_mask(mask: u16) -> String {
    let mut parts = Vec::new();
    for i in 0..8 {
        if mask & (1 << i) != 0 {
            parts.push(format!("d{i}"));
        }
    }
    for i in 0..8 {
        if mask & (1 << (8 + i)) != 0 {
            parts.push(format!("a{i}"));
        }
    }
    parts.join("/")
}

fn size_suffix(size: Size) -> &'static str {
    match size {
        Size::Byte => ".b",
        Size::Word => ".w",
        Size::Long => ".l",
    }
}

fn unary_mnemonic(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Clear => "clr",
        UnaryOp::Negate => "neg",
        UnaryOp::Not => "not",
        UnaryOp::Test => "tst",
        UnaryOp::Swap => "swap",
        UnaryOp::Extend => "ext",
    }
}

fn binary_mnemonic(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Cmp => "cmp",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Eor => "eor",
    }
}

fn shift_mnemonic(op: ShiftOp) -> &'static str {
    match op {
        ShiftOp::Arithmetic => "as",
        ShiftOp::Logical => "ls",
        ShiftOp::Rotate => "ro",
        ShiftOp::RotateExtend => "rox",
    }
}

fn muldiv_mnemonic(op: MulDivOp) -> &'static str {
    match op {
        MulDivOp::MulUnsigned => "mulu",
        MulDivOp::MulSigned => "muls",
        MulDivOp::DivUnsigned => "divu",
        MulDivOp::DivSigned => "divs",
    }
}

fn render_index(index: &IndexRegister) -> String {
    let reg = if index.is_address_register { "a" } else { "d" };
    let size = if index.is_long { ".l" } else { ".w" };
    format!("{reg}{}{size}", index.register)
}

/// Render an effective address to assembler-style text, with a
/// Pascal/C-string heuristic comment for absolute data references (§4.5):
/// if the target looks like a counted or NUL-terminated printable string,
/// note it inline.
fn render_ea(ea: &EffectiveAddress) -> String {
    match *ea {
        EffectiveAddress::DataRegister(r) => format!("d{r}"),
        EffectiveAddress::AddressRegister(r) => format!("a{r}"),
        EffectiveAddress::Indirect(r) => format!("(a{r})"),
        EffectiveAddress::PostIncrement(r) => format!("(a{r})+"),
        EffectiveAddress::PreDecrement(r) => format!("-(a{r})"),
        EffectiveAddress::IndirectDisplacement(r, disp) => format!("({disp}, a{r})"),
        EffectiveAddress::IndirectIndexed(r, disp, index) => format!("({disp}, a{r}, {})", render_index(&index)),
        EffectiveAddress::AbsoluteShort(value) => format!("(${value:04X}).w"),
        EffectiveAddress::AbsoluteLong(value) => format!("(${value:08X}).l"),
        EffectiveAddress::PcDisplacement(base, disp) => format!("({disp}, pc)\t; ${:08X}", (base as i64 + disp as i64) as u32),
        EffectiveAddress::PcIndexed(base, disp, index) => format!("({disp}, pc, {})\t; ~${base:08X}", render_index(&index)),
        EffectiveAddress::Immediate(value) => format!("#${value:X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_nop_rts() {
        let bytes = [0x4E, 0x71, 0x4E, 0x75];
        let lines = disassemble(&bytes, 0x1000, None, None).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "nop");
        assert_eq!(lines[1].text, "rts");
    }

    #[test]
    fn test_disassemble_branch_then_stop() {
        // bra.s +2 ; nop ; rts  -- branch skips over the nop.
        let bytes = [0x60, 0x02, 0x4E, 0x71, 0x4E, 0x75];
        let lines = disassemble(&bytes, 0x1000, None, None).unwrap();

        let branch = lines.iter().find(|l| l.address == 0x1000).unwrap();
        assert_eq!(branch.target, Some(0x1004));
    }

    #[test]
    fn test_detect_macsbug_name() {
        let bytes = [0x05, b'H', b'e', b'l', b'l', b'o', 0x00];
        let (name, consumed) = detect_macsbug_name(&bytes).unwrap();

        assert_eq!(name, "Hello");
        assert_eq!(consumed, 6);
    }

    #[test]
    fn test_unknown_opcode_becomes_dcw() {
        let bytes = [0x01, 0x23];
        let lines = disassemble(&bytes, 0x2000, None, None).unwrap();

        assert_eq!(lines.len(), 1);
        assert!(lines[0].text.starts_with("dc.w"));
    }
}
