//! The decompression dispatcher (§4.4): on first access of a compressed
//! resource, finds a decompressor resource, builds an emulated memory
//! image, runs it, and extracts the decompressed bytes.
//!
//! Only `dcmp` (68K) candidates are actually executed. `ncmp` (PowerPC)
//! candidates are parsed and their PEF export resolved far enough to build
//! the emulated memory image §4.4 describes, but no PowerPC core is
//! implemented here — the component budget this repository follows has no
//! "PowerPC decoder (exec)" line, only the PEF *loader* (§4.4's 4% share),
//! so an `ncmp` candidate always fails over to the next candidate. See
//! `DESIGN.md`.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use enumflags2::{bitflags, BitFlags};
use rsrc_errors::Error;
use rsrc_io::Reader;
use rsrc_m68k::{Emulator, Registers};
use rsrc_memory::MemoryContext;

use crate::fork::{Resource, ResourceFile, ResourceType};

/// One bit of the dispatcher's behavior-control bitset (§4.3).
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressionFlag {
    /// Never attempt decompression; `get_resource` returns the raw
    /// (still-compressed) bytes.
    Disabled = 1 << 0,
    /// Log each failed candidate at debug level.
    Verbose = 1 << 1,
    /// Don't consider a fork-local `dcmp` candidate.
    SkipFileDcmp = 1 << 2,
    /// Don't consider a fork-local `ncmp` candidate.
    SkipFileNcmp = 1 << 3,
    /// Don't consider a system-provided `dcmp` candidate.
    SkipSystemDcmp = 1 << 4,
    /// Don't consider a system-provided `ncmp` candidate.
    SkipSystemNcmp = 1 << 5,
}

/// The dispatcher's behavior-control bitset.
pub type DecompressionFlags = BitFlags<DecompressionFlag>;

const STACK_BASE: u32 = 0x1000_0000;
const STACK_SIZE: u32 = 0x4000;
const OUTPUT_BASE: u32 = 0x2000_0000;
const WORKING_BASE: u32 = 0x8000_0000;
const INPUT_BASE: u32 = 0xC000_0000;
const CODE_BASE: u32 = 0xF000_0000;

/// `(use_ncmp, id)` key into the process-wide system-decompressor cache.
type SystemCacheKey = (bool, i16);

/// The process-wide, lazily-populated cache of system-provided
/// decompressors (§5), keyed by `(is_ncmp, id)`. Loaded from
/// `dcmp_<id>.bin` / `ncmp_<id>.bin` files in a cache directory (§6).
pub struct SystemCache {
    directory: std::path::PathBuf,
    loaded: Mutex<HashMap<SystemCacheKey, Vec<u8>>>,
}

static SYSTEM_CACHE: OnceLock<SystemCache> = OnceLock::new();

impl SystemCache {
    /// Install the on-disk directory system decompressors are loaded from.
    /// A no-op if the cache was already installed (first call wins).
    pub fn install(directory: impl Into<std::path::PathBuf>) {
        let _ = SYSTEM_CACHE.set(SystemCache { directory: directory.into(), loaded: Mutex::new(HashMap::new()) });
    }

    fn get(use_ncmp: bool, id: i16) -> Option<Vec<u8>> {
        let cache = SYSTEM_CACHE.get()?;
        let key = (use_ncmp, id);

        if let Some(bytes) = cache.loaded.lock().unwrap().get(&key) {
            return Some(bytes.clone());
        }

        let file_name = if use_ncmp { format!("ncmp_{id}.bin") } else { format!("dcmp_{id}.bin") };
        let bytes = std::fs::read(cache.directory.join(file_name)).ok()?;

        cache.loaded.lock().unwrap().insert(key, bytes.clone());

        Some(bytes)
    }
}

#[derive(Debug, Clone, Copy)]
struct CompressedHeader {
    version: u8,
    decompressed_size: u32,
    decompressor_id: i16,
}

fn parse_header(data: &[u8]) -> Result<CompressedHeader, Error> {
    let mut reader = Reader::new(data);

    let magic = reader.get_u32be().map_err(|_| Error::MalformedContainer("compressed-resource header truncated".into()))?;
    if magic != 0xA89F_6572 {
        return Err(Error::MalformedContainer(format!("bad compressed-resource magic {magic:#010x}")));
    }

    let _header_size = reader.get_u16be().map_err(|_| Error::MalformedContainer("compressed-resource header truncated".into()))?;
    let version = reader.get_u8().map_err(|_| Error::MalformedContainer("compressed-resource header truncated".into()))?;
    let _attributes = reader.get_u8().map_err(|_| Error::MalformedContainer("compressed-resource header truncated".into()))?;
    let decompressed_size = reader.get_u32be().map_err(|_| Error::MalformedContainer("compressed-resource header truncated".into()))?;

    if version != 8 && version != 9 {
        return Err(Error::UnsupportedFormat(format!("compressed-resource header version {version}")));
    }

    let decompressor_id = if version == 8 {
        // The working-buffer fraction and expansion-buffer size this tail
        // also carries aren't used for sizing (see the working_size
        // comment in run_dcmp/run_ncmp for why a fixed conservative bound
        // is used instead), so they're read and discarded here.
        let _working_buffer_fraction = reader.get_u8().map_err(|_| Error::MalformedContainer("v8 tail truncated".into()))?;
        let _expansion_buffer_size = reader.get_u8().map_err(|_| Error::MalformedContainer("v8 tail truncated".into()))?;
        let id = reader.get_i16be().map_err(|_| Error::MalformedContainer("v8 tail truncated".into()))?;
        let _reserved = reader.get_u32be().map_err(|_| Error::MalformedContainer("v8 tail truncated".into()))?;
        id
    } else {
        let id = reader.get_i16be().map_err(|_| Error::MalformedContainer("v9 tail truncated".into()))?;
        let _padding = reader.get_u32be().map_err(|_| Error::MalformedContainer("v9 tail truncated".into()))?;
        let _padding2 = reader.get_u16be().map_err(|_| Error::MalformedContainer("v9 tail truncated".into()))?;
        id
    };

    Ok(CompressedHeader { version, decompressed_size, decompressor_id })
}

#[derive(Debug, Clone, Copy)]
enum Candidate {
    Dcmp(bool),
    Ncmp(bool),
}

/// Run the decompression dispatcher over `resource`. `fork` supplies
/// fork-local `dcmp`/`ncmp` candidates; system candidates come from
/// [`SystemCache`].
pub fn decompress(fork: &ResourceFile, resource: &Resource, flags: DecompressionFlags) -> Result<Vec<u8>, Error> {
    let header = parse_header(&resource.data)?;

    let mut order = Vec::new();
    if !flags.contains(DecompressionFlag::SkipFileDcmp) {
        order.push(Candidate::Dcmp(false));
    }
    if !flags.contains(DecompressionFlag::SkipFileNcmp) {
        order.push(Candidate::Ncmp(false));
    }
    if !flags.contains(DecompressionFlag::SkipSystemDcmp) {
        order.push(Candidate::Dcmp(true));
    }
    if !flags.contains(DecompressionFlag::SkipSystemNcmp) {
        order.push(Candidate::Ncmp(true));
    }

    let mut attempted = 0;
    let mut last_error = None;

    for candidate in order {
        let payload = match candidate {
            Candidate::Dcmp(from_system) => lookup_candidate(fork, *b"dcmp", header.decompressor_id, from_system),
            Candidate::Ncmp(from_system) => lookup_candidate(fork, *b"ncmp", header.decompressor_id, from_system),
        };

        let Some(payload) = payload else { continue };
        attempted += 1;

        let outcome = match candidate {
            Candidate::Dcmp(_) => run_dcmp(&payload, &resource.data, &header),
            Candidate::Ncmp(_) => run_ncmp(&payload, &resource.data, &header),
        };

        match outcome {
            Ok(bytes) => return Ok(bytes),
            Err(error) => {
                if flags.contains(DecompressionFlag::Verbose) {
                    log::debug!("decompression candidate failed: {error}");
                }
                last_error = Some(error);
            }
        }
    }

    let _ = last_error;
    Err(Error::DecompressionFailed(attempted))
}

fn lookup_candidate(fork: &ResourceFile, kind: ResourceType, id: i16, from_system: bool) -> Option<Vec<u8>> {
    if from_system {
        SystemCache::get(kind == *b"ncmp", id)
    } else {
        fork.peek_resource(kind, id).map(|resource| resource.data.clone())
    }
}

fn run_dcmp(payload: &[u8], input: &[u8], header: &CompressedHeader) -> Result<Vec<u8>, Error> {
    if payload.len() < 6 {
        return Err(Error::MalformedContainer("dcmp payload too short".into()));
    }

    let entry_offset = if payload.len() >= 8 && &payload[4..8] == b"dcmp" {
        0
    } else {
        u16::from_be_bytes([payload[2], payload[3]]) as u32
    };

    let working_size = (input.len() as u64 * 256).min(u32::MAX as u64 - WORKING_BASE as u64) as u32;
    let input_size = input.len() as u32 + 0x100;
    let output_size = header.decompressed_size + 0x100;

    let mut memory = MemoryContext::new();
    memory.allocate_at(STACK_BASE, STACK_SIZE)?;
    memory.allocate_at(OUTPUT_BASE, output_size)?;
    memory.allocate_at(WORKING_BASE, working_size)?;
    memory.allocate_at(INPUT_BASE, input_size)?;
    memory.allocate_at(CODE_BASE, payload.len() as u32)?;

    memory.memcpy_in(INPUT_BASE, input)?;
    memory.memcpy_in(CODE_BASE, payload)?;

    // `reset` (0x4E70), the sentinel opcode that signals clean termination
    // (§4.5/§6).
    let reset_addr = STACK_BASE;
    memory.write_u16be(reset_addr, 0x4E70)?;

    let header_base = reset_addr + 2;
    memory.write_u32be(header_base, reset_addr)?; // return address: the `reset` opcode itself

    let source_past_header = INPUT_BASE + 20; // compressed-resource header is always <= 20 bytes in both versions.
    let args_base = header_base + 4;

    if header.version == 9 {
        memory.write_u32be(args_base, INPUT_BASE)?; // source-resource-header pointer
        memory.write_u32be(args_base + 4, OUTPUT_BASE)?; // dest pointer
        memory.write_u32be(args_base + 8, source_past_header)?; // source past header
        memory.write_u32be(args_base + 12, header.decompressed_size)?; // data size
    } else {
        memory.write_u32be(args_base, header.decompressed_size)?; // data size
        memory.write_u32be(args_base + 4, WORKING_BASE)?; // working-buffer pointer
        memory.write_u32be(args_base + 8, OUTPUT_BASE)?; // dest pointer
        memory.write_u32be(args_base + 12, source_past_header)?; // source past header
    }

    let mut registers = Registers::default();
    registers.set_sp(header_base);
    registers.pc = CODE_BASE + entry_offset;

    let mut emulator = Emulator::new(registers, memory);
    emulator.set_syscall_handler(Box::new(|word, registers, memory| {
        // Only `_GetTrapAddress` is implemented (§4.4); everything else is a
        // no-op that emits a warning.
        if word == 0xA146 {
            let stub_addr = memory.allocate(4)?;
            memory.write_u16be(stub_addr, word)?;
            memory.write_u16be(stub_addr + 2, 0x4E75)?; // rts
            registers.a[0] = stub_addr;
        } else {
            log::warn!("unhandled A-trap/F-line word {word:#06x}, treating as no-op");
        }
        Ok(())
    }));

    emulator.execute(10_000_000)?;

    emulator.memory.memcpy_out(OUTPUT_BASE, header.decompressed_size as usize)
}

fn run_ncmp(payload: &[u8], input: &[u8], header: &CompressedHeader) -> Result<Vec<u8>, Error> {
    let container = rsrc_pef::Container::parse(payload)?;
    let name = container
        .exported_names()
        .next()
        .ok_or_else(|| Error::MalformedContainer("ncmp PEF has no exported symbol".into()))?
        .to_string();
    let (_code_addr, _toc_addr) = container.resolve_export(&name)?;

    let working_size = (input.len() as u64 * 256).min(u32::MAX as u64 - WORKING_BASE as u64) as u32;
    let input_size = input.len() as u32 + 0x100;
    let output_size = header.decompressed_size + 0x100;

    let mut memory = MemoryContext::new();
    memory.allocate_at(STACK_BASE, STACK_SIZE)?;
    memory.allocate_at(OUTPUT_BASE, output_size)?;
    memory.allocate_at(WORKING_BASE, working_size)?;
    memory.allocate_at(INPUT_BASE, input_size)?;
    memory.memcpy_in(INPUT_BASE, input)?;

    // No PowerPC core is implemented in this repository (see the module
    // doc comment); the memory image above mirrors what a real PEF-backed
    // ncmp run would need, but nothing actually executes it.
    Err(Error::UnsupportedFormat("ncmp (PowerPC) decompressors are not executed by this implementation".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_v9_header(decompressor_id: i16, decompressed_size: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0xA89F_6572u32.to_be_bytes());
        bytes.extend_from_slice(&20u16.to_be_bytes());
        bytes.push(9);
        bytes.push(0);
        bytes.extend_from_slice(&decompressed_size.to_be_bytes());
        bytes.extend_from_slice(&decompressor_id.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 6]);
        bytes
    }

    #[test]
    fn test_parse_header_rejects_bad_magic() {
        assert!(parse_header(&[0, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_parse_v9_header() {
        let bytes = build_v9_header(128, 64);
        let header = parse_header(&bytes).unwrap();

        assert_eq!(header.version, 9);
        assert_eq!(header.decompressor_id, 128);
        assert_eq!(header.decompressed_size, 64);
    }

    #[test]
    fn test_dispatch_fails_without_any_candidate() {
        let fork = ResourceFile::new();
        let data = build_v9_header(999, 4);
        let resource = Resource {
            kind: *b"STR ",
            id: 1,
            name: None,
            attributes: 0x01,
            data,
            decompressed: false,
            decompression_failed: false,
        };

        let result = decompress(&fork, &resource, DecompressionFlags::empty());
        assert!(matches!(result, Err(Error::DecompressionFailed(0))));
    }
}
