//! `rsrc-m68k` decodes, disassembles, and emulates the subset of the
//! Motorola 68000 instruction set that classic Mac OS resource
//! decompressors (`dcmp`/`cdev`-style code resources) and educational
//! code-resource inspection need (§4.5).
//!
//! - [`decode`] turns raw bytes into an [`decode::Instruction`] tree.
//! - [`ea`] decodes the addressing-mode+register pairs operands share.
//! - [`disasm`] renders a code region to assembler-style text.
//! - [`emulate`] executes decoded instructions against a
//!   [`rsrc_memory::MemoryContext`], for running an embedded decompressor.
//! - [`traps`] and [`lowmem`] name the A-line traps and low-memory
//!   globals disassembly commonly references.

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]

pub mod decode;
pub mod disasm;
pub mod ea;
pub mod emulate;
pub mod lowmem;
pub mod registers;
pub mod traps;

pub use decode::{decode_instruction, Instruction};
pub use disasm::disassemble;
pub use ea::{EffectiveAddress, Size};
pub use emulate::{Emulator, TERMINATE_ADDRESS};
pub use registers::{ConditionCodes, Registers};
