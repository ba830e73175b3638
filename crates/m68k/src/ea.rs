//! Effective-address mode+register decoding (§4.5).
//!
//! Mode 7 sub-selects by `Xn` among absolute-short, absolute-long,
//! PC-relative, PC-with-index, and immediate, per the documented 68K
//! encoding. Only the "brief" extension word format is supported for
//! indexed modes; the "full" extension format (with its own displacement
//! words) is rare outside 68020+ code and is reported as an unsupported
//! opcode rather than guessed at.

use rsrc_errors::Error;
use rsrc_io::Reader;

/// Operand size, as selected by an instruction's size field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// 8 bits.
    Byte,
    /// 16 bits.
    Word,
    /// 32 bits.
    Long,
}

impl Size {
    /// Size in bytes.
    pub fn bytes(self) -> u32 {
        match self {
            Size::Byte => 1,
            Size::Word => 2,
            Size::Long => 4,
        }
    }
}

/// A decoded brief-format index register reference: `(An, Dn/An, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRegister {
    /// Register number 0-7.
    pub register: u8,
    /// Whether the index register is an address register (`true`) or data
    /// register (`false`).
    pub is_address_register: bool,
    /// Whether the index value is sign-extended from a word or used as-is
    /// as a long.
    pub is_long: bool,
}

/// A decoded effective address, independent of how it's ultimately
/// read/written (that's the emulator's job; the disassembler only needs the
/// decoded shape and its `Display`-style rendering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveAddress {
    /// `Dn`.
    DataRegister(u8),
    /// `An`.
    AddressRegister(u8),
    /// `(An)`.
    Indirect(u8),
    /// `(An)+`.
    PostIncrement(u8),
    /// `-(An)`.
    PreDecrement(u8),
    /// `(d16, An)`.
    IndirectDisplacement(u8, i16),
    /// `(d8, An, Xn)`.
    IndirectIndexed(u8, i8, IndexRegister),
    /// `(xxx).W`.
    AbsoluteShort(u16),
    /// `(xxx).L`.
    AbsoluteLong(u32),
    /// `(d16, PC)`, resolved to an absolute address at decode time.
    PcDisplacement(u32, i16),
    /// `(d8, PC, Xn)`, resolved to a base address at decode time.
    PcIndexed(u32, i8, IndexRegister),
    /// `#imm`.
    Immediate(u32),
}

impl EffectiveAddress {
    /// Decode a mode+register effective address, consuming any extension
    /// words it requires from `reader`. `instr_pc` is the address of the
    /// opcode word itself; PC-relative modes use the address of their own
    /// extension word, computed from the reader's current position.
    pub fn decode(
        reader: &mut Reader<'_>,
        base_addr: u32,
        mode: u8,
        register: u8,
        size: Size,
    ) -> Result<Self, Error> {
        match mode {
            0 => Ok(EffectiveAddress::DataRegister(register)),
            1 => Ok(EffectiveAddress::AddressRegister(register)),
            2 => Ok(EffectiveAddress::Indirect(register)),
            3 => Ok(EffectiveAddress::PostIncrement(register)),
            4 => Ok(EffectiveAddress::PreDecrement(register)),
            5 => {
                let disp = reader.get_i16be().map_err(map_range(reader, base_addr))?;
                Ok(EffectiveAddress::IndirectDisplacement(register, disp))
            }
            6 => {
                let ext = reader.get_u16be().map_err(map_range(reader, base_addr))?;
                let (disp8, index) = decode_brief_extension(ext)?;
                Ok(EffectiveAddress::IndirectIndexed(register, disp8, index))
            }
            7 => match register {
                0 => {
                    let value = reader.get_u16be().map_err(map_range(reader, base_addr))?;
                    Ok(EffectiveAddress::AbsoluteShort(value))
                }
                1 => {
                    let value = reader.get_u32be().map_err(map_range(reader, base_addr))?;
                    Ok(EffectiveAddress::AbsoluteLong(value))
                }
                2 => {
                    // The reader is positioned at the start of the
                    // instruction (offset 0 == `base_addr`), so the
                    // extension word's own address is `base_addr + position`.
                    let ext_addr = base_addr.wrapping_add(reader.position() as u32);
                    let disp = reader.get_i16be().map_err(map_range(reader, base_addr))?;
                    Ok(EffectiveAddress::PcDisplacement(ext_addr, disp))
                }
                3 => {
                    let ext_addr = base_addr.wrapping_add(reader.position() as u32);
                    let ext = reader.get_u16be().map_err(map_range(reader, base_addr))?;
                    let (disp8, index) = decode_brief_extension(ext)?;
                    Ok(EffectiveAddress::PcIndexed(ext_addr, disp8, index))
                }
                4 => match size {
                    Size::Byte => {
                        let value = reader.get_u16be().map_err(map_range(reader, base_addr))?;
                        Ok(EffectiveAddress::Immediate(value as u32 & 0xFF))
                    }
                    Size::Word => {
                        let value = reader.get_u16be().map_err(map_range(reader, base_addr))?;
                        Ok(EffectiveAddress::Immediate(value as u32))
                    }
                    Size::Long => {
                        let value = reader.get_u32be().map_err(map_range(reader, base_addr))?;
                        Ok(EffectiveAddress::Immediate(value))
                    }
                },
                _ => Err(Error::UnknownOpcode(0, base_addr as usize)),
            },
            _ => unreachable!("mode is a 3-bit field"),
        }
    }
}

fn decode_brief_extension(ext: u16) -> Result<(i8, IndexRegister), Error> {
    let disp8 = (ext & 0xFF) as i8;
    let index = IndexRegister {
        register: ((ext >> 12) & 0b111) as u8,
        is_address_register: ext & 0x8000 != 0,
        is_long: ext & 0x0800 != 0,
    };

    if ext & 0x0100 != 0 {
        // Bit 8 set selects the "full" extension word format, which this
        // decoder doesn't support.
        return Err(Error::UnsupportedFormat("68K full extension word addressing".into()));
    }

    Ok((disp8, index))
}

fn map_range(_reader: &Reader<'_>, base_addr: u32) -> impl Fn(rsrc_io::OutOfRange) -> Error {
    move |_| Error::OutOfRange(base_addr as usize, 2, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_register_direct() {
        let mut reader = Reader::new(&[]);
        let ea = EffectiveAddress::decode(&mut reader, 0, 0, 3, Size::Long).unwrap();

        assert_eq!(ea, EffectiveAddress::DataRegister(3));
    }

    #[test]
    fn test_decode_indirect_displacement() {
        let mut reader = Reader::new(&[0x00, 0x10]);
        let ea = EffectiveAddress::decode(&mut reader, 0x1000, 5, 2, Size::Word).unwrap();

        assert_eq!(ea, EffectiveAddress::IndirectDisplacement(2, 0x10));
    }

    #[test]
    fn test_decode_absolute_short() {
        let mut reader = Reader::new(&[0x12, 0x34]);
        let ea = EffectiveAddress::decode(&mut reader, 0x1000, 7, 0, Size::Word).unwrap();

        assert_eq!(ea, EffectiveAddress::AbsoluteShort(0x1234));
    }

    #[test]
    fn test_decode_immediate_long() {
        let mut reader = Reader::new(&[0x00, 0x00, 0x00, 0x2A]);
        let ea = EffectiveAddress::decode(&mut reader, 0x1000, 7, 4, Size::Long).unwrap();

        assert_eq!(ea, EffectiveAddress::Immediate(42));
    }

    #[test]
    fn test_full_extension_rejected() {
        let mut reader = Reader::new(&[0x01, 0x00]);
        let result = EffectiveAddress::decode(&mut reader, 0x1000, 6, 0, Size::Word);

        assert!(result.is_err());
    }
}
