//! A-line (Toolbox) trap name table (§4.5, §4.6).
//!
//! Classic Mac OS routed calls into the Toolbox and OS through the
//! unimplemented-instruction A-line mechanism: the low 16 bits of the
//! trap word select a routine, with bit 11 distinguishing OS traps
//! (`_GetHandleSize`) from Toolbox traps (`_OffsetRect`), and bit 10 of
//! Toolbox traps marking an auto-pop (no return value on the stack).
//!
//! This table covers the traps a decompressor or resource disassembly is
//! actually likely to reference; it is not the complete several-thousand
//! entry Inside Macintosh trap dictionary.

/// Decode an A-line trap word into its conventional name, if known.
pub fn trap_name(word: u16) -> Option<&'static str> {
    if word & 0x0800 == 0 {
        os_trap_name(word & 0x00FF)
    } else {
        toolbox_trap_name(word & 0x03FF)
    }
}

fn os_trap_name(number: u16) -> Option<&'static str> {
    Some(match number {
        0x00 => "_Open",
        0x01 => "_Close",
        0x02 => "_Read",
        0x03 => "_Write",
        0x09 => "_GetFPos",
        0x0A => "_SetFPos",
        0x0C => "_Allocate",
        0x0D => "_GetEOF",
        0x0E => "_SetEOF",
        0x20 => "_GetTrapAddress",
        0x21 => "_SetTrapAddress",
        0x25 => "_NewHandle",
        0x26 => "_DisposeHandle",
        0x27 => "_SetHandleSize",
        0x28 => "_GetHandleSize",
        0x29 => "_NewPtr",
        0x2A => "_DisposePtr",
        0x2B => "_SetPtrSize",
        0x2C => "_GetPtrSize",
        0x2F => "_HandleZone",
        0x30 => "_ReallocHandle",
        0x31 => "_RecoverHandle",
        0x38 => "_HLock",
        0x39 => "_HUnlock",
        0x3A => "_HPurge",
        0x3B => "_HNoPurge",
        0x41 => "_MaxApplZone",
        0x48 => "_InitZone",
        0x65 => "_UprocDispatch",
        _ => return None,
    })
}

fn toolbox_trap_name(number: u16) -> Option<&'static str> {
    Some(match number {
        0x001E => "_SetRect",
        0x001F => "_OffsetRect",
        0x0020 => "_InsetRect",
        0x0021 => "_SectRect",
        0x0022 => "_UnionRect",
        0x0023 => "_Pt2Rect",
        0x0024 => "_PtInRect",
        0x0025 => "_EqualRect",
        0x0026 => "_EmptyRect",
        0x0031 => "_NewRgn",
        0x0032 => "_DisposeRgn",
        0x0033 => "_OpenRgn",
        0x0034 => "_CloseRgn",
        0x0035 => "_CopyRgn",
        0x0038 => "_OffsetRgn",
        0x003A => "_SectRgn",
        0x003B => "_UnionRgn",
        0x003D => "_EqualRgn",
        0x003E => "_EmptyRgn",
        0x0040 => "_StdBits",
        0x0041 => "_CopyBits",
        0x0060 => "_InitGraf",
        0x0062 => "_HidePen",
        0x0063 => "_ShowPen",
        0x0065 => "_MoveTo",
        0x0066 => "_Move",
        0x0067 => "_LineTo",
        0x0068 => "_Line",
        0x006F => "_PaintRect",
        0x0070 => "_FrameOval",
        0x0098 => "_SndPlay",
        0x00A9 => "_PackBits",
        0x00AA => "_UnpackBits",
        0x00A0 => "_SndDoCommand",
        0x00A1 => "_SndDoImmediate",
        0x00A2 => "_SndNewChannel",
        0x00A3 => "_SndDisposeChannel",
        0x0198 => "_PPCToolBox",
        0x01E0 => "_HFSDispatch",
        0x022A => "_SCSIDispatch",
        0x0260 => "_ScriptUtil",
        0x0262 => "_SlotManager",
        0x0285 => "_ShutDown",
        _ => return None,
    })
}

/// Decode an HFS dispatch selector (the low word of the stack-based
/// selector argument to `_HFSDispatch`). Representative subset.
pub fn hfs_dispatch_selector_name(selector: u16) -> Option<&'static str> {
    Some(match selector {
        0x0001 => "HOpen",
        0x0002 => "HOpenRF",
        0x0007 => "HGetVInfo",
        0x0009 => "HCreate",
        0x000C => "HGetFileInfo",
        0x0011 => "HRename",
        0x0014 => "HOpenDF",
        _ => return None,
    })
}

/// Decode a SCSI Manager dispatch selector. Representative subset.
pub fn scsi_dispatch_selector_name(selector: u16) -> Option<&'static str> {
    Some(match selector {
        0x0000 => "SCSIReset",
        0x0001 => "SCSIGet",
        0x0002 => "SCSISelect",
        0x0003 => "SCSICmd",
        0x0004 => "SCSIComplete",
        _ => return None,
    })
}

/// Decode a PACK selector (`_Pack0` through `_Pack7` all share one trap
/// number, further dispatched by a selector word on the stack).
pub fn pack_selector_name(pack_number: u8, selector: u16) -> Option<&'static str> {
    match pack_number {
        0 => Some("List Manager"),
        3 => match selector {
            0 => Some("FP68K"),
            _ => None,
        },
        4 => Some("International Utilities"),
        6 => Some("International Utilities (script)"),
        7 => Some("Binary-Decimal Conversion"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_trap() {
        assert_eq!(trap_name(0xA029), Some("_NewPtr"));
    }

    #[test]
    fn test_toolbox_trap() {
        assert_eq!(trap_name(0xA8A9), Some("_PackBits"));
    }

    #[test]
    fn test_unknown_trap() {
        assert_eq!(trap_name(0xA1FF), None);
    }
}
