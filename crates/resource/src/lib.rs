//! Parses classic Mac OS resource forks, decompresses their payloads, and
//! decodes the resource types that carry graphics, sound, text, and code.

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

pub mod dispatch;
pub mod fork;
pub mod mac_roman;
pub mod quickdraw;
pub mod sound;
pub mod soundmusicsys;
pub mod tune;
pub mod types;

pub use dispatch::{DecompressionFlag, DecompressionFlags, SystemCache};
pub use fork::{Resource, ResourceFile, ResourceKey, ResourceType};
