//! Low-memory global address-to-name table (§4.5, §4.6).
//!
//! Classic 68K Mac OS kept a fixed set of OS state variables at fixed
//! absolute addresses in the first few KB of RAM (`CurrentA5`, `Ticks`,
//! `ScrnBase`, ...). Decompressor code and trap-table disassembly
//! occasionally reference these directly instead of through an
//! accessor trap; resolving the address to its conventional name makes
//! the disassembly readable. Representative subset, not the complete
//! low-memory map.

/// Resolve a low-memory global address to its conventional name, if it
/// falls exactly on a known global.
pub fn lowmem_global_name(address: u32) -> Option<&'static str> {
    Some(match address {
        0x0000_0010 => "Ticks",
        0x0000_0028 => "ScrVRes",
        0x0000_002A => "ScrHRes",
        0x0000_0106 => "ApplLimit",
        0x0000_0108 => "SonyVars",
        0x0000_010C => "CurPitch",
        0x0000_0110 => "CurStackBase",
        0x0000_0130 => "MemTop",
        0x0000_0134 => "BufPtr",
        0x0000_0140 => "HeapEnd",
        0x0000_0144 => "TheZone",
        0x0000_0174 => "MinStack",
        0x0000_0176 => "DefltStack",
        0x0000_0904 => "ScrnBase",
        0x0000_0910 => "MainDevice",
        0x0000_0912 => "DeviceList",
        0x0000_0934 => "RowBits",
        0x0000_0936 => "ColLines",
        0x0000_0CFC => "CurrentA5",
        0x0000_0D6C => "ROMBase",
        0x0000_0D70 => "RAMBase",
        0x0000_0DB0 => "CurJTOffset",
        0x0000_0DDE => "ROM85",
        0x0000_0F6A => "SysZone",
        0x0000_0F8A => "ApplZone",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_global() {
        assert_eq!(lowmem_global_name(0x0CFC), Some("CurrentA5"));
    }

    #[test]
    fn test_unknown_global() {
        assert_eq!(lowmem_global_name(0xDEAD_BEEF), None);
    }
}
