//! `rsrc-pef` parses the Preferred Executable Format (PEF) container used
//! by PowerPC `ncmp` decompressors (§4.7).
//!
//! A PEF file is a 40-byte container header (magic `Joy!peff`), a table of
//! section headers, and the sections themselves. The loader section (kind
//! 4) carries import/export bookkeeping; this crate resolves just enough
//! of it to find a named exported symbol's transition vector (code
//! address + TOC address), which is how a `ncmp` resource's entry point is
//! invoked.
//!
//! Non-goals: relocation of imported symbols from other shared libraries,
//! and running `main`/`init`/`term` container-level entry points — a
//! `ncmp` decompressor is invoked directly through its exported transition
//! vector, never through the container's own startup sequence.

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]

use rsrc_errors::Error;
use rsrc_io::Reader;

const CONTAINER_MAGIC: &[u8; 8] = b"Joy!peff";
const LOADER_SECTION_KIND: u8 = 4;

/// One entry in the PEF section header table (§4.7).
#[derive(Debug, Clone, Copy)]
pub struct SectionHeader {
    /// Offset into the section-name string table, or -1 if unnamed.
    pub name_offset: i32,
    /// Preferred address for a `code`/`data` section with relocatable
    /// addressing disabled.
    pub default_address: u32,
    /// Size once loaded and any pattern-expansion applied.
    pub total_size: u32,
    /// Size of the writable part of the loaded image (`data`/`bss` split).
    pub unpacked_size: u32,
    /// Size of this section's bytes within the container file.
    pub packed_size: u32,
    /// Byte offset of this section's bytes within the container file.
    pub container_offset: u32,
    /// Section kind: 0 code, 1 unpacked data, 2 pattern-initialized data,
    /// 3 constant, 4 loader, 5 debug, 6 executable-data, 7 exception.
    pub section_kind: u8,
    /// Sharing attribute among processes.
    pub share_kind: u8,
    /// `log2` of the required alignment.
    pub alignment: u8,
}

/// The loader section's fixed header fields (§4.7): entry-point indices
/// and the location of the exported-symbol hash table. Import library and
/// relocation bookkeeping beyond the export table is out of scope.
#[derive(Debug, Clone, Copy)]
pub struct LoaderHeader {
    /// Index of the section containing `main`, or -1 if none.
    pub main_section: i32,
    /// Offset of `main` within its section.
    pub main_offset: u32,
    /// Index of the section containing the static initializer, or -1.
    pub init_section: i32,
    /// Offset of the initializer within its section.
    pub init_offset: u32,
    /// Index of the section containing the static terminator, or -1.
    pub term_section: i32,
    /// Offset of the terminator within its section.
    pub term_offset: u32,
    /// Number of imported shared libraries.
    pub imported_library_count: u32,
    /// Total imported symbol count across all libraries.
    pub total_imported_symbol_count: u32,
    /// Byte offset (within the loader section) of the loader string table.
    pub loader_strings_offset: u32,
    /// Byte offset (within the loader section) of the export hash table.
    pub export_hash_offset: u32,
    /// `log2` of the number of hash-chain buckets.
    pub export_hash_table_power: u32,
    /// Number of exported symbols.
    pub exported_symbol_count: u32,
}

/// A resolved exported symbol: its transition vector (code address, TOC
/// address) as found in the section named by `section_index`.
#[derive(Debug, Clone, Copy)]
pub struct ExportedSymbol {
    /// Section the symbol's transition vector lives in.
    pub section_index: i16,
    /// Offset of the transition vector within that section.
    pub offset: u32,
}

/// A parsed PEF container: section table plus, if present, the loader
/// section's header and export table.
#[derive(Debug)]
pub struct Container<'a> {
    bytes: &'a [u8],
    /// Section headers in file order.
    pub sections: Vec<SectionHeader>,
    /// The loader section's header, if a loader section (kind 4) exists.
    pub loader: Option<LoaderHeader>,
    exports: Vec<(String, ExportedSymbol)>,
}

impl<'a> Container<'a> {
    /// Parse a PEF container from `bytes`.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(bytes);

        let magic = reader.get_bytes(8).map_err(|_| Error::MalformedContainer("PEF header truncated".into()))?;
        if magic != CONTAINER_MAGIC {
            return Err(Error::MalformedContainer("missing 'Joy!peff' magic".into()));
        }

        let _architecture = reader.get_bytes(4).map_err(to_malformed)?;
        let _format_version = reader.get_u32be().map_err(to_malformed)?;
        let _timestamp = reader.get_u32be().map_err(to_malformed)?;
        let _old_def_version = reader.get_u32be().map_err(to_malformed)?;
        let _old_imp_version = reader.get_u32be().map_err(to_malformed)?;
        let _current_version = reader.get_u32be().map_err(to_malformed)?;
        let section_count = reader.get_u16be().map_err(to_malformed)?;
        let _instantiated_section_count = reader.get_u16be().map_err(to_malformed)?;
        let _reserved = reader.get_u32be().map_err(to_malformed)?;

        let mut sections = Vec::with_capacity(section_count as usize);
        for _ in 0..section_count {
            sections.push(SectionHeader {
                name_offset: reader.get_u32be().map_err(to_malformed)? as i32,
                default_address: reader.get_u32be().map_err(to_malformed)?,
                total_size: reader.get_u32be().map_err(to_malformed)?,
                unpacked_size: reader.get_u32be().map_err(to_malformed)?,
                packed_size: reader.get_u32be().map_err(to_malformed)?,
                container_offset: reader.get_u32be().map_err(to_malformed)?,
                section_kind: reader.get_u8().map_err(to_malformed)?,
                share_kind: reader.get_u8().map_err(to_malformed)?,
                alignment: reader.get_u8().map_err(to_malformed)?,
            });
            let _reserved_byte = reader.get_u8().map_err(to_malformed)?;
        }

        let loader_index = sections.iter().position(|s| s.section_kind == LOADER_SECTION_KIND);

        let (loader, exports) = match loader_index {
            Some(index) => {
                let section = sections[index];
                let start = section.container_offset as usize;
                let end = start + section.packed_size as usize;
                let section_bytes = bytes.get(start..end).ok_or_else(|| Error::MalformedContainer("loader section out of range".into()))?;
                let header = parse_loader_header(section_bytes)?;
                let exports = parse_exports(section_bytes, &header)?;
                (Some(header), exports)
            }
            None => (None, Vec::new()),
        };

        Ok(Self { bytes, sections, loader, exports })
    }

    /// The raw bytes of `section`, sliced out of the container.
    pub fn section_bytes(&self, section: &SectionHeader) -> Result<&'a [u8], Error> {
        let start = section.container_offset as usize;
        let end = start + section.packed_size as usize;
        self.bytes.get(start..end).ok_or_else(|| Error::MalformedContainer("section bytes out of range".into()))
    }

    /// Resolve an exported symbol's transition vector by name, returning
    /// `(code_address, toc_address)` computed against the section's
    /// `default_address`.
    pub fn resolve_export(&self, name: &str) -> Result<(u32, u32), Error> {
        let (_, symbol) =
            self.exports.iter().find(|(n, _)| n == name).ok_or_else(|| Error::NotFound(format!("PEF export '{name}'")))?;

        let section = self
            .sections
            .get(symbol.section_index as usize)
            .ok_or_else(|| Error::MalformedContainer(format!("export '{name}' references out-of-range section")))?;

        // The transition vector itself is a pair of longs (code, TOC) at
        // `offset` within the section.
        let bytes = self.section_bytes(section)?;
        let tv = bytes.get(symbol.offset as usize..symbol.offset as usize + 8).ok_or_else(|| {
            Error::MalformedContainer(format!("export '{name}' transition vector out of range"))
        })?;

        let code = u32::from_be_bytes(tv[0..4].try_into().unwrap());
        let toc = u32::from_be_bytes(tv[4..8].try_into().unwrap());

        Ok((code, toc))
    }

    /// All exported symbol names, in hash-table order.
    pub fn exported_names(&self) -> impl Iterator<Item = &str> {
        self.exports.iter().map(|(name, _)| name.as_str())
    }
}

fn to_malformed(_: rsrc_io::OutOfRange) -> Error {
    Error::MalformedContainer("PEF header truncated".into())
}

fn parse_loader_header(bytes: &[u8]) -> Result<LoaderHeader, Error> {
    let mut reader = Reader::new(bytes);

    let main_section = reader.get_u32be().map_err(to_malformed)? as i32;
    let main_offset = reader.get_u32be().map_err(to_malformed)?;
    let init_section = reader.get_u32be().map_err(to_malformed)? as i32;
    let init_offset = reader.get_u32be().map_err(to_malformed)?;
    let term_section = reader.get_u32be().map_err(to_malformed)? as i32;
    let term_offset = reader.get_u32be().map_err(to_malformed)?;
    let imported_library_count = reader.get_u32be().map_err(to_malformed)?;
    let total_imported_symbol_count = reader.get_u32be().map_err(to_malformed)?;
    let _reloc_section_count = reader.get_u32be().map_err(to_malformed)?;
    let _reloc_instr_offset = reader.get_u32be().map_err(to_malformed)?;
    let loader_strings_offset = reader.get_u32be().map_err(to_malformed)?;
    let export_hash_offset = reader.get_u32be().map_err(to_malformed)?;
    let export_hash_table_power = reader.get_u32be().map_err(to_malformed)?;
    let exported_symbol_count = reader.get_u32be().map_err(to_malformed)?;

    Ok(LoaderHeader {
        main_section,
        main_offset,
        init_section,
        init_offset,
        term_section,
        term_offset,
        imported_library_count,
        total_imported_symbol_count,
        loader_strings_offset,
        export_hash_offset,
        export_hash_table_power,
        exported_symbol_count,
    })
}

/// Walk the export hash table's chain entries linearly (skipping actual
/// hash-bucket indexing, since we only need "find the symbol named X" and
/// there are at most a few dozen exports in a `ncmp` resource) to recover
/// every `(name, symbol)` pair.
fn parse_exports(section_bytes: &[u8], header: &LoaderHeader) -> Result<Vec<(String, ExportedSymbol)>, Error> {
    let bucket_count = 1usize << header.export_hash_table_power;
    let hash_slots_size = bucket_count * 4;
    let chain_offset = header.export_hash_offset as usize + hash_slots_size;

    let mut reader = Reader::new(section_bytes);
    reader.go_to(chain_offset).map_err(|_| Error::MalformedContainer("export hash chain out of range".into()))?;

    let mut exports = Vec::with_capacity(header.exported_symbol_count as usize);

    for _ in 0..header.exported_symbol_count {
        let class_and_name = reader.get_u32be().map_err(to_malformed)?;
        let section_index = reader.get_u16be().map_err(to_malformed)? as i16;
        let offset = reader.get_u32be().map_err(to_malformed)?;

        let name_offset = class_and_name & 0x00FF_FFFF;
        let name = read_loader_string(section_bytes, header.loader_strings_offset as usize + name_offset as usize)?;

        exports.push((name, ExportedSymbol { section_index, offset }));
    }

    Ok(exports)
}

fn read_loader_string(section_bytes: &[u8], start: usize) -> Result<String, Error> {
    let end = section_bytes[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::MalformedContainer("unterminated loader string".into()))?;

    Ok(String::from_utf8_lossy(&section_bytes[start..start + end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_minimal_pef() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(CONTAINER_MAGIC);
        bytes.extend_from_slice(b"pwpc");
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes()); // section_count = 0
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes
    }

    #[test]
    fn test_parse_minimal_container() {
        let bytes = build_minimal_pef();
        let container = Container::parse(&bytes).unwrap();

        assert!(container.sections.is_empty());
        assert!(container.loader.is_none());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = build_minimal_pef();
        bytes[0] = b'X';

        assert!(Container::parse(&bytes).is_err());
    }

    #[test]
    fn test_header_too_short() {
        let bytes = vec![0u8; 10];
        assert!(Container::parse(&bytes).is_err());
    }
}
