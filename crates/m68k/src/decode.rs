//! 68K instruction decoding (§4.5).
//!
//! Covers the instruction families needed to disassemble and execute real
//! decompressor code: data movement (`move`, `movea`, `movem`, `movq`,
//! `lea`, `pea`, `clr`), arithmetic (`add`/`sub`/`cmp`/`neg` and their
//! quick/immediate forms, `mulu`/`muls`/`divu`/`divs`), logic
//! (`and`/`or`/`eor`/`not` and immediate forms), shifts/rotates, branches
//! (`bra`/`bsr`/`bcc`/`dbcc`/`scc`), subroutine linkage (`jmp`/`jsr`/`rts`/
//! `rte`/`rtd`/`link`/`unlk`), and the handful of privileged/trap
//! instructions the dispatcher's syscall handler intercepts (`trap`,
//! A-line, F-line, `reset`).
//!
//! Reserved or unrecognized bit patterns decode to
//! [`rsrc_errors::Error::UnknownOpcode`] rather than panicking; the caller
//! (disassembler or emulator) decides what to do with that.

use rsrc_errors::Error;
use rsrc_io::Reader;

use crate::ea::{EffectiveAddress, Size};

/// Condition codes used by `bcc`/`dbcc`/`scc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Always true (`bra`/`t`).
    True,
    /// Always false (used only by `dbcc`/`scc`, never `bcc`).
    False,
    /// Higher (unsigned).
    Hi,
    /// Lower or same (unsigned).
    Ls,
    /// Carry clear.
    Cc,
    /// Carry set.
    Cs,
    /// Not equal.
    Ne,
    /// Equal.
    Eq,
    /// Overflow clear.
    Vc,
    /// Overflow set.
    Vs,
    /// Plus.
    Pl,
    /// Minus.
    Mi,
    /// Greater or equal.
    Ge,
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// Less or equal.
    Le,
}

impl Condition {
    fn decode(bits: u8) -> Self {
        match bits {
            0 => Condition::True,
            1 => Condition::False,
            2 => Condition::Hi,
            3 => Condition::Ls,
            4 => Condition::Cc,
            5 => Condition::Cs,
            6 => Condition::Ne,
            7 => Condition::Eq,
            8 => Condition::Vc,
            9 => Condition::Vs,
            10 => Condition::Pl,
            11 => Condition::Mi,
            12 => Condition::Ge,
            13 => Condition::Lt,
            14 => Condition::Gt,
            15 => Condition::Le,
            _ => unreachable!("condition is a 4-bit field"),
        }
    }

    /// Three-letter mnemonic suffix (`"eq"`, `"ne"`, ...).
    pub fn mnemonic(self) -> &'static str {
        match self {
            Condition::True => "t",
            Condition::False => "f",
            Condition::Hi => "hi",
            Condition::Ls => "ls",
            Condition::Cc => "cc",
            Condition::Cs => "cs",
            Condition::Ne => "ne",
            Condition::Eq => "eq",
            Condition::Vc => "vc",
            Condition::Vs => "vs",
            Condition::Pl => "pl",
            Condition::Mi => "mi",
            Condition::Ge => "ge",
            Condition::Lt => "lt",
            Condition::Gt => "gt",
            Condition::Le => "le",
        }
    }
}

/// A decoded binary operation's two operands: `op <src>, <dst>` or the
/// single-operand family sharing the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOperands {
    /// Source operand.
    pub src: EffectiveAddress,
    /// Destination operand.
    pub dst: EffectiveAddress,
}

/// A decoded 68K instruction, independent of its mnemonic rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `move`/`movea` of `size` from `src` to `dst`.
    Move { size: Size, src: EffectiveAddress, dst: EffectiveAddress },
    /// `movem` register-list to/from memory; `to_memory` is false for
    /// memory-to-register.
    Movem { size: Size, to_memory: bool, register_mask: u16, ea: EffectiveAddress },
    /// `moveq #imm, Dn`.
    Moveq { data: i8, dst_reg: u8 },
    /// `lea <ea>, An`.
    Lea { src: EffectiveAddress, dst_reg: u8 },
    /// `pea <ea>`.
    Pea { src: EffectiveAddress },
    /// `clr`/`neg`/`not`/`tst`/`nbcd`/`swap`/`ext`-style single operand op.
    Unary { op: UnaryOp, size: Size, ea: EffectiveAddress },
    /// `add`/`sub`/`cmp`/`and`/`or`/`eor` family, register direction
    /// encoded by whether `dst` is a data register in the mnemonic's own
    /// bit (folded into operand order here).
    Binary { op: BinaryOp, size: Size, operands: BinaryOperands },
    /// `addi`/`subi`/`andi`/`ori`/`eori`/`cmpi` immediate-to-ea forms.
    Immediate { op: BinaryOp, size: Size, imm: u32, dst: EffectiveAddress },
    /// `addq`/`subq #imm, <ea>`.
    Quick { is_add: bool, size: Size, data: u8, dst: EffectiveAddress },
    /// Shift/rotate family.
    Shift { op: ShiftOp, size: Size, left: bool, count: ShiftCount, ea: Option<EffectiveAddress> },
    /// `muls`/`mulu`/`divs`/`divu` Dn, <ea>.
    MulDiv { op: MulDivOp, src: EffectiveAddress, dst_reg: u8 },
    /// `exg Dx, Dy` or address/data register variants.
    Exchange { mode: ExchangeMode, reg_x: u8, reg_y: u8 },
    /// `bra`/`bsr`/`bcc disp`, `disp` already resolved to an absolute target.
    Branch { condition: Condition, is_subroutine: bool, target: u32 },
    /// `dbcc Dn, disp`.
    DbraCc { condition: Condition, reg: u8, target: u32 },
    /// `scc <ea>`.
    SetCc { condition: Condition, ea: EffectiveAddress },
    /// `jmp <ea>`.
    Jump { ea: EffectiveAddress },
    /// `jsr <ea>`.
    JumpSubroutine { ea: EffectiveAddress },
    /// `rts`.
    Return,
    /// `rte`.
    ReturnFromException,
    /// `rtd #imm`.
    ReturnAndDeallocate { imm: i16 },
    /// `link An, #imm`.
    Link { reg: u8, displacement: i16 },
    /// `unlk An`.
    Unlink { reg: u8 },
    /// `nop`.
    Nop,
    /// `reset`.
    Reset,
    /// `stop #imm`.
    Stop { imm: u16 },
    /// `trap #n`.
    Trap { vector: u8 },
    /// `trapv`.
    TrapOnOverflow,
    /// A-line (Toolbox trap) word, raw 16-bit payload.
    ATrap { word: u16 },
    /// F-line (coprocessor) word, raw 16-bit payload.
    FLine { word: u16 },
    /// `move <ea>, sr/ccr` or `move sr/ccr, <ea>`.
    MoveStatus { to_sr: bool, from_sr: bool, ea: EffectiveAddress },
}

/// Unary operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `clr`.
    Clear,
    /// `neg`.
    Negate,
    /// `not`.
    Not,
    /// `tst`.
    Test,
    /// `swap` (word-size only, operates on a data register).
    Swap,
    /// `ext` (sign-extend byte-to-word or word-to-long).
    Extend,
}

/// Binary operation kinds shared by the register and immediate forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `add`.
    Add,
    /// `sub`.
    Sub,
    /// `cmp`.
    Cmp,
    /// `and`.
    And,
    /// `or`.
    Or,
    /// `eor`.
    Eor,
}

/// Shift/rotate operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    /// Arithmetic shift.
    Arithmetic,
    /// Logical shift.
    Logical,
    /// Rotate.
    Rotate,
    /// Rotate through extend.
    RotateExtend,
}

/// How many bits a shift/rotate moves by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftCount {
    /// An immediate count 1-8.
    Immediate(u8),
    /// The low 6 bits of a data register.
    Register(u8),
}

/// `mulu`/`muls`/`divu`/`divs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulDivOp {
    /// `mulu`.
    MulUnsigned,
    /// `muls`.
    MulSigned,
    /// `divu`.
    DivUnsigned,
    /// `divs`.
    DivSigned,
}

/// `exg` register-pair kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeMode {
    /// Two data registers.
    DataData,
    /// Two address registers.
    AddrAddr,
    /// One data, one address register.
    DataAddr,
}

fn size_field_move(bits: u16) -> Option<Size> {
    match (bits >> 12) & 0b11 {
        0b01 => Some(Size::Byte),
        0b11 => Some(Size::Word),
        0b10 => Some(Size::Long),
        _ => None,
    }
}

fn size_field_standard(bits: u16) -> Option<Size> {
    match (bits >> 6) & 0b11 {
        0b00 => Some(Size::Byte),
        0b01 => Some(Size::Word),
        0b10 => Some(Size::Long),
        _ => None,
    }
}

/// Decode a single instruction from `reader`, which must be positioned at
/// the instruction's address (`addr`, also used to resolve PC-relative
/// operands and branch targets).
pub fn decode_instruction(reader: &mut Reader<'_>, addr: u32) -> Result<Instruction, Error> {
    let start = reader.position();
    let word = reader.get_u16be().map_err(|_| Error::OutOfRange(addr as usize, 2, 0))?;

    let decoded = decode_word(reader, addr, word)?;
    let _ = start;

    Ok(decoded)
}

fn decode_word(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    match word >> 12 {
        0x0 => decode_group0(reader, addr, word),
        0x1 | 0x2 | 0x3 => decode_move(reader, addr, word),
        0x4 => decode_group4(reader, addr, word),
        0x5 => decode_group5(reader, addr, word),
        0x6 => decode_branch(reader, addr, word),
        0x7 => decode_moveq(word),
        0x8 => decode_or_div(reader, addr, word),
        0x9 => decode_addsub(reader, addr, word, BinaryOp::Sub),
        0xA => Ok(Instruction::ATrap { word }),
        0xB => decode_cmp_eor(reader, addr, word),
        0xC => decode_and_mul_exg(reader, addr, word),
        0xD => decode_addsub(reader, addr, word, BinaryOp::Add),
        0xE => decode_shift(reader, addr, word),
        0xF => Ok(Instruction::FLine { word }),
        _ => unreachable!("4-bit group selector"),
    }
}

fn ea_mode_reg(word: u16) -> (u8, u8) {
    (((word >> 3) & 0b111) as u8, (word & 0b111) as u8)
}

fn decode_group0(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let (mode, reg) = ea_mode_reg(word);

    // `movep` and bit-manipulation instructions with a register-specified
    // bit number share this space; this decoder supports the immediate
    // (`#imm`) bit/logical-immediate forms only.
    if (word & 0b1111_0000_0000_0000) == 0 && (word & 0b1_0000_0000) == 0 {
        let op = match (word >> 9) & 0b111 {
            0b000 => Some(BinaryOp::Or),
            0b001 => Some(BinaryOp::And),
            0b010 => Some(BinaryOp::Sub),
            0b011 => Some(BinaryOp::Add),
            0b101 => Some(BinaryOp::Eor),
            0b110 => Some(BinaryOp::Cmp),
            _ => None,
        };

        if let Some(op) = op {
            let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
            let imm = read_immediate(reader, addr, size)?;
            let dst = EffectiveAddress::decode(reader, addr, mode, reg, size)?;

            return Ok(Instruction::Immediate { op, size, imm, dst });
        }
    }

    Err(Error::UnknownOpcode(word as u32, addr as usize))
}

fn read_immediate(reader: &mut Reader<'_>, addr: u32, size: Size) -> Result<u32, Error> {
    let err = |_| Error::OutOfRange(addr as usize, size.bytes() as usize, 0);

    match size {
        Size::Byte => Ok(reader.get_u16be().map_err(err)? as u32 & 0xFF),
        Size::Word => Ok(reader.get_u16be().map_err(err)? as u32),
        Size::Long => Ok(reader.get_u32be().map_err(err)?),
    }
}

fn decode_move(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let size = size_field_move(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
    let (src_mode, src_reg) = ea_mode_reg(word);
    let dst_reg = ((word >> 9) & 0b111) as u8;
    let dst_mode = ((word >> 6) & 0b111) as u8;

    let src = EffectiveAddress::decode(reader, addr, src_mode, src_reg, size)?;
    let dst = EffectiveAddress::decode(reader, addr, dst_mode, dst_reg, size)?;

    Ok(Instruction::Move { size, src, dst })
}

fn decode_group4(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let (mode, reg) = ea_mode_reg(word);

    if word == 0x4E70 {
        return Ok(Instruction::Reset);
    }
    if word == 0x4E71 {
        return Ok(Instruction::Nop);
    }
    if word == 0x4E73 {
        return Ok(Instruction::ReturnFromException);
    }
    if word == 0x4E75 {
        return Ok(Instruction::Return);
    }
    if word == 0x4E76 {
        return Ok(Instruction::TrapOnOverflow);
    }
    if word & 0xFFF0 == 0x4E60 {
        return Ok(Instruction::Unlink { reg: (word & 0b111) as u8 });
    }
    if word & 0xFFF8 == 0x4E50 {
        let disp = reader.get_i16be().map_err(|_| Error::OutOfRange(addr as usize, 2, 0))?;
        return Ok(Instruction::Link { reg: (word & 0b111) as u8, displacement: disp });
    }
    if word & 0xFFF0 == 0x4E40 {
        return Ok(Instruction::Trap { vector: (word & 0b1111) as u8 });
    }
    if word == 0x4E72 {
        let imm = reader.get_u16be().map_err(|_| Error::OutOfRange(addr as usize, 2, 0))?;
        return Ok(Instruction::Stop { imm });
    }
    if word & 0xFFF8 == 0x4E74 {
        let disp = reader.get_i16be().map_err(|_| Error::OutOfRange(addr as usize, 2, 0))?;
        return Ok(Instruction::ReturnAndDeallocate { imm: disp });
    }
    if word & 0xFF00 == 0x4800 && (word & 0b1100_0000) == 0b0100_0000 {
        // `swap`/`pea`/`ext` family at 0x48xx, distinguished by mode bits.
        if mode == 0 && (word & 0x00C0) == 0x0040 {
            return Ok(Instruction::Unary { op: UnaryOp::Swap, size: Size::Word, ea: EffectiveAddress::DataRegister(reg) });
        }
    }
    if word & 0xFFC0 == 0x4840 {
        return Ok(Instruction::Pea { src: EffectiveAddress::decode(reader, addr, mode, reg, Size::Long)? });
    }
    if word & 0xFFB8 == 0x4880 {
        let size = if word & 0x0040 != 0 { Size::Long } else { Size::Word };
        return Ok(Instruction::Unary { op: UnaryOp::Extend, size, ea: EffectiveAddress::DataRegister(reg) });
    }
    if word & 0xFF80 == 0x4880 || word & 0xFF80 == 0x48C0 {
        let to_memory = word & 0x0400 == 0;
        let size = if word & 0x0040 != 0 { Size::Long } else { Size::Word };
        let mask = reader.get_u16be().map_err(|_| Error::OutOfRange(addr as usize, 2, 0))?;
        let ea = EffectiveAddress::decode(reader, addr, mode, reg, size)?;
        return Ok(Instruction::Movem { size, to_memory, register_mask: mask, ea });
    }
    if word & 0xFF00 == 0x4000 {
        let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
        return Ok(Instruction::Unary { op: UnaryOp::Negate, size, ea: EffectiveAddress::decode(reader, addr, mode, reg, size)? });
    }
    if word & 0xFF00 == 0x4200 {
        let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
        return Ok(Instruction::Unary { op: UnaryOp::Clear, size, ea: EffectiveAddress::decode(reader, addr, mode, reg, size)? });
    }
    if word & 0xFF00 == 0x4600 {
        let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
        return Ok(Instruction::Unary { op: UnaryOp::Not, size, ea: EffectiveAddress::decode(reader, addr, mode, reg, size)? });
    }
    if word & 0xFF00 == 0x4A00 {
        let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
        return Ok(Instruction::Unary { op: UnaryOp::Test, size, ea: EffectiveAddress::decode(reader, addr, mode, reg, size)? });
    }
    if word & 0xFFC0 == 0x41C0 {
        return Ok(Instruction::Lea { src: EffectiveAddress::decode(reader, addr, mode, reg, Size::Long)?, dst_reg: ((word >> 9) & 0b111) as u8 });
    }
    if word & 0xF1C0 == 0x40C0 {
        // `move sr, <ea>` and `move ccr, <ea>`.
        let ea = EffectiveAddress::decode(reader, addr, mode, reg, Size::Word)?;
        return Ok(Instruction::MoveStatus { to_sr: false, from_sr: true, ea });
    }
    if word & 0xF1C0 == 0x46C0 {
        let ea = EffectiveAddress::decode(reader, addr, mode, reg, Size::Word)?;
        return Ok(Instruction::MoveStatus { to_sr: true, from_sr: false, ea });
    }
    if word & 0xFFC0 == 0x4EC0 {
        return Ok(Instruction::Jump { ea: EffectiveAddress::decode(reader, addr, mode, reg, Size::Long)? });
    }
    if word & 0xFFC0 == 0x4E80 {
        return Ok(Instruction::JumpSubroutine { ea: EffectiveAddress::decode(reader, addr, mode, reg, Size::Long)? });
    }

    Err(Error::UnknownOpcode(word as u32, addr as usize))
}

fn decode_group5(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let (mode, reg) = ea_mode_reg(word);
    let data_bits = (word >> 9) & 0b111;
    let data = if data_bits == 0 { 8u8 } else { data_bits as u8 };

    if (word & 0b1100_0000) == 0b1100_0000 {
        let condition = Condition::decode(((word >> 8) & 0b1111) as u8);

        if mode == 1 {
            let disp = reader.get_i16be().map_err(|_| Error::OutOfRange(addr as usize, 2, 0))?;
            return Ok(Instruction::DbraCc { condition, reg, target: (addr as i64 + 2 + disp as i64) as u32 });
        }

        let ea = EffectiveAddress::decode(reader, addr, mode, reg, Size::Byte)?;
        return Ok(Instruction::SetCc { condition, ea });
    }

    let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
    let is_add = word & 0x0100 == 0;
    let ea = EffectiveAddress::decode(reader, addr, mode, reg, size)?;

    Ok(Instruction::Quick { is_add, size, data, dst: ea })
}

fn decode_branch(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let condition = Condition::decode(((word >> 8) & 0b1111) as u8);
    let is_subroutine = condition == Condition::False;
    let short_disp = (word & 0xFF) as i8;

    let disp: i32 = if short_disp == 0 {
        reader.get_i16be().map_err(|_| Error::OutOfRange(addr as usize, 2, 0))? as i32
    } else if short_disp == -1 {
        reader.get_u32be().map_err(|_| Error::OutOfRange(addr as usize, 4, 0))? as i32
    } else {
        short_disp as i32
    };

    let target = (addr as i64 + 2 + disp as i64) as u32;

    Ok(Instruction::Branch {
        condition: if is_subroutine { Condition::True } else { condition },
        is_subroutine,
        target,
    })
}

fn decode_moveq(word: u16) -> Result<Instruction, Error> {
    if word & 0x0100 != 0 {
        return Err(Error::UnknownOpcode(word as u32, 0));
    }

    Ok(Instruction::Moveq { data: (word & 0xFF) as i8, dst_reg: ((word >> 9) & 0b111) as u8 })
}

fn decode_or_div(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let (mode, reg) = ea_mode_reg(word);
    let opmode = (word >> 6) & 0b111;
    let reg_no = ((word >> 9) & 0b111) as u8;

    if opmode == 0b011 {
        let src = EffectiveAddress::decode(reader, addr, mode, reg, Size::Word)?;
        return Ok(Instruction::MulDiv { op: MulDivOp::DivUnsigned, src, dst_reg: reg_no });
    }
    if opmode == 0b111 {
        let src = EffectiveAddress::decode(reader, addr, mode, reg, Size::Word)?;
        return Ok(Instruction::MulDiv { op: MulDivOp::DivSigned, src, dst_reg: reg_no });
    }

    let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
    let ea = EffectiveAddress::decode(reader, addr, mode, reg, size)?;
    let reg_ea = EffectiveAddress::DataRegister(reg_no);

    if word & 0x0100 == 0 {
        Ok(Instruction::Binary { op: BinaryOp::Or, size, operands: BinaryOperands { src: ea, dst: reg_ea } })
    } else {
        Ok(Instruction::Binary { op: BinaryOp::Or, size, operands: BinaryOperands { src: reg_ea, dst: ea } })
    }
}

fn decode_cmp_eor(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let (mode, reg) = ea_mode_reg(word);
    let opmode = (word >> 6) & 0b111;
    let reg_no = ((word >> 9) & 0b111) as u8;

    if opmode == 0b011 || opmode == 0b111 {
        let size = if opmode == 0b011 { Size::Word } else { Size::Long };
        let ea = EffectiveAddress::decode(reader, addr, mode, reg, size)?;
        return Ok(Instruction::Binary {
            op: BinaryOp::Cmp,
            size,
            operands: BinaryOperands { src: ea, dst: EffectiveAddress::AddressRegister(reg_no) },
        });
    }

    let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
    let ea = EffectiveAddress::decode(reader, addr, mode, reg, size)?;

    if word & 0x0100 == 0 {
        Ok(Instruction::Binary {
            op: BinaryOp::Cmp,
            size,
            operands: BinaryOperands { src: ea, dst: EffectiveAddress::DataRegister(reg_no) },
        })
    } else {
        Ok(Instruction::Binary {
            op: BinaryOp::Eor,
            size,
            operands: BinaryOperands { src: EffectiveAddress::DataRegister(reg_no), dst: ea },
        })
    }
}

fn decode_and_mul_exg(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let (mode, reg) = ea_mode_reg(word);
    let opmode = (word >> 6) & 0b111;
    let reg_no = ((word >> 9) & 0b111) as u8;

    if opmode == 0b011 {
        let src = EffectiveAddress::decode(reader, addr, mode, reg, Size::Word)?;
        return Ok(Instruction::MulDiv { op: MulDivOp::MulUnsigned, src, dst_reg: reg_no });
    }
    if opmode == 0b111 {
        let src = EffectiveAddress::decode(reader, addr, mode, reg, Size::Word)?;
        return Ok(Instruction::MulDiv { op: MulDivOp::MulSigned, src, dst_reg: reg_no });
    }
    if word & 0xF1F8 == 0xC140 {
        return Ok(Instruction::Exchange { mode: ExchangeMode::DataData, reg_x: reg_no, reg_y: reg });
    }
    if word & 0xF1F8 == 0xC148 {
        return Ok(Instruction::Exchange { mode: ExchangeMode::AddrAddr, reg_x: reg_no, reg_y: reg });
    }
    if word & 0xF1F8 == 0xC188 {
        return Ok(Instruction::Exchange { mode: ExchangeMode::DataAddr, reg_x: reg_no, reg_y: reg });
    }

    let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
    let ea = EffectiveAddress::decode(reader, addr, mode, reg, size)?;
    let reg_ea = EffectiveAddress::DataRegister(reg_no);

    if word & 0x0100 == 0 {
        Ok(Instruction::Binary { op: BinaryOp::And, size, operands: BinaryOperands { src: ea, dst: reg_ea } })
    } else {
        Ok(Instruction::Binary { op: BinaryOp::And, size, operands: BinaryOperands { src: reg_ea, dst: ea } })
    }
}

fn decode_addsub(reader: &mut Reader<'_>, addr: u32, word: u16, op: BinaryOp) -> Result<Instruction, Error> {
    let (mode, reg) = ea_mode_reg(word);
    let opmode = (word >> 6) & 0b111;
    let reg_no = ((word >> 9) & 0b111) as u8;

    if opmode == 0b011 || opmode == 0b111 {
        let size = if opmode == 0b011 { Size::Word } else { Size::Long };
        let ea = EffectiveAddress::decode(reader, addr, mode, reg, size)?;
        return Ok(Instruction::Binary {
            op,
            size,
            operands: BinaryOperands { src: ea, dst: EffectiveAddress::AddressRegister(reg_no) },
        });
    }

    let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
    let ea = EffectiveAddress::decode(reader, addr, mode, reg, size)?;
    let reg_ea = EffectiveAddress::DataRegister(reg_no);

    if word & 0x0100 == 0 {
        Ok(Instruction::Binary { op, size, operands: BinaryOperands { src: ea, dst: reg_ea } })
    } else {
        Ok(Instruction::Binary { op, size, operands: BinaryOperands { src: reg_ea, dst: ea } })
    }
}

fn decode_shift(reader: &mut Reader<'_>, addr: u32, word: u16) -> Result<Instruction, Error> {
    let (mode, reg) = ea_mode_reg(word);

    if (word & 0b1100_0000) == 0b1100_0000 {
        // Memory-operand shift, always word-size, always by one bit.
        let op = match (word >> 9) & 0b11 {
            0b00 => ShiftOp::Arithmetic,
            0b01 => ShiftOp::Logical,
            0b10 => ShiftOp::Rotate,
            _ => ShiftOp::RotateExtend,
        };
        let left = word & 0x0100 != 0;
        let ea = EffectiveAddress::decode(reader, addr, mode, reg, Size::Word)?;

        return Ok(Instruction::Shift { op, size: Size::Word, left, count: ShiftCount::Immediate(1), ea: Some(ea) });
    }

    let size = size_field_standard(word).ok_or(Error::UnknownOpcode(word as u32, addr as usize))?;
    let op = match (word >> 3) & 0b11 {
        0b00 => ShiftOp::Arithmetic,
        0b01 => ShiftOp::Logical,
        0b10 => ShiftOp::Rotate,
        _ => ShiftOp::RotateExtend,
    };
    let left = word & 0x0100 != 0;
    let is_register_count = word & 0x0020 != 0;
    let count_field = ((word >> 9) & 0b111) as u8;
    let count =
        if is_register_count { ShiftCount::Register(count_field) } else { ShiftCount::Immediate(if count_field == 0 { 8 } else { count_field }) };

    Ok(Instruction::Shift { op, size, left, count, ea: Some(EffectiveAddress::DataRegister(reg)) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nop() {
        let mut reader = Reader::new(&[0x4E, 0x71]);
        assert_eq!(decode_instruction(&mut reader, 0x1000).unwrap(), Instruction::Nop);
    }

    #[test]
    fn test_decode_rts() {
        let mut reader = Reader::new(&[0x4E, 0x75]);
        assert_eq!(decode_instruction(&mut reader, 0x1000).unwrap(), Instruction::Return);
    }

    #[test]
    fn test_decode_reset() {
        let mut reader = Reader::new(&[0x4E, 0x70]);
        assert_eq!(decode_instruction(&mut reader, 0x1000).unwrap(), Instruction::Reset);
    }

    #[test]
    fn test_decode_moveq() {
        let mut reader = Reader::new(&[0x70, 0x2A]);
        assert_eq!(decode_instruction(&mut reader, 0x1000).unwrap(), Instruction::Moveq { data: 42, dst_reg: 0 });
    }

    #[test]
    fn test_decode_move_word_dn_to_dn() {
        // move.w d1, d0
        let mut reader = Reader::new(&[0x30, 0x01]);
        let instr = decode_instruction(&mut reader, 0x1000).unwrap();

        assert_eq!(
            instr,
            Instruction::Move { size: Size::Word, src: EffectiveAddress::DataRegister(1), dst: EffectiveAddress::DataRegister(0) }
        );
    }

    #[test]
    fn test_decode_short_branch() {
        // bra.s +4
        let mut reader = Reader::new(&[0x60, 0x04]);
        let instr = decode_instruction(&mut reader, 0x1000).unwrap();

        assert_eq!(instr, Instruction::Branch { condition: Condition::True, is_subroutine: false, target: 0x1006 });
    }

    #[test]
    fn test_decode_dbra() {
        // dbf d0, -2 (tight infinite loop relative to itself)
        let mut reader = Reader::new(&[0x51, 0xC8, 0xFF, 0xFE]);
        let instr = decode_instruction(&mut reader, 0x2000).unwrap();

        assert_eq!(instr, Instruction::DbraCc { condition: Condition::False, reg: 0, target: 0x2000 });
    }

    #[test]
    fn test_decode_trap() {
        let mut reader = Reader::new(&[0x4E, 0x41]);
        assert_eq!(decode_instruction(&mut reader, 0x1000).unwrap(), Instruction::Trap { vector: 1 });
    }

    #[test]
    fn test_decode_unknown_opcode() {
        let mut reader = Reader::new(&[0xFF, 0xFF]);
        assert_eq!(decode_instruction(&mut reader, 0x1000).unwrap(), Instruction::FLine { word: 0xFFFF });
    }
}
