//! `rsrc-io` provides endian-aware binary reader/writer primitives over
//! borrowed byte slices, plus the filesystem abstraction used to open a
//! classic Mac resource fork from a path.
//!
//! The reader is a stateful cursor ([`Reader`]) built on top of `nom`'s
//! endian-aware number parsers; it never silently truncates a read past the
//! end of its backing slice, instead failing with `OutOfRange`.

#![deny(unused)]
#![deny(warnings)]
#![deny(clippy::all)]

mod combinators;
mod endianness;
mod fs;
mod reader;
mod write;

pub use endianness::*;
pub use fs::*;
pub use reader::*;
pub use write::*;

/// Input type consumed by the low-level `nom`-based parsers.
pub type Input<'a> = &'a [u8];

/// Result type returned by the low-level `nom`-based parsers.
pub type Result<'a, O, E> = nom::IResult<Input<'a>, O, E>;
