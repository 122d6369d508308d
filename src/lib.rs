// SPDX-License-Identifier: MIT
//! # Shader Container
//!
//! Reads, edits and writes the two-table shader container used to ship
//! compiled shaders per game profile. Each container holds a vertex table
//! and a pixel table of named blobs; this crate can duplicate an existing
//! profile entry under a new name or append a brand-new entry to both
//! tables.
//!
//! ## Format Specification
//!
//! ```text
//! Header (24 bytes, little-endian):
//! - 0x00 i32 vertex entry count (N)
//! - 0x04 i64 vertex table start (always 0x18 when written)
//! - 0x0C i32 pixel entry count (M)
//! - 0x10 i64 pixel table start
//!
//! Tables (entry headers, contiguous):
//! - N vertex entries, then M pixel entries
//! - each: null-terminated name, i32 blob size, i64 absolute blob offset
//!
//! Payloads:
//! - vertex blobs in table order, then pixel blobs in table order
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::io::Cursor;
//! use shader_container::{ContainerCodec, ShaderContainer, TableMutator};
//!
//! let codec = ContainerCodec::new();
//! let bytes = codec.encode_to_vec(&ShaderContainer::empty()).unwrap();
//!
//! let mut container = codec.decode(Cursor::new(bytes)).unwrap();
//! TableMutator::new()
//!     .append_to_both(&mut container, "profile_b", Cursor::new(vec![1u8]), Cursor::new(vec![2u8]))
//!     .unwrap();
//!
//! let out = codec.encode_to_vec(&container).unwrap();
//! assert_eq!(codec.decode_slice(&out).unwrap().vertex.len(), 1);
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod container;
pub mod format;
pub mod mutator;
pub mod reader;
pub mod writer;

// Re-export main types
pub use codec::{decode, encode, ContainerCodec, ContainerLayout};
pub use config::{Config, ConfigError, LogFormat};
pub use container::{ContainerError, ShaderContainer, ShaderEntry, ShaderTable, TableRole};
pub use format::{ContainerHeader, Endian, EntryHeader, HEADER_SIZE, PLACEHOLDER};
pub use mutator::TableMutator;
pub use reader::{BinaryReader, ReadError, ReadMode};
pub use writer::{BinaryWriter, WriteError};
