// SPDX-License-Identifier: MIT
//! Shader container format specification
//!
//! Defines the fixed header and entry-header records of the two-table
//! shader container, along with the byte order marker shared by the
//! reader and the writer.

use std::io::{Read, Seek, Write};

use crate::reader::{BinaryReader, ReadError};
use crate::writer::{BinaryWriter, WriteError};

/// Header size in bytes
pub const HEADER_SIZE: u64 = 0x18;

/// Absolute offset of the `vertexTableStart` header field
pub const VERTEX_TABLE_START_OFFSET: u64 = 0x04;

/// Absolute offset of the `pixelTableStart` header field
pub const PIXEL_TABLE_START_OFFSET: u64 = 0x10;

/// Sentinel written where a forward offset is backpatched later
pub const PLACEHOLDER: u64 = 0xdead_beef_dead_beef;

/// Smallest possible entry header: empty name terminator, size and offset
pub const MIN_ENTRY_HEADER_SIZE: u64 = 1 + 4 + 8;

/// Byte order of a fixed-width value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Container header (24 bytes, little-endian)
///
/// ```text
/// 0x00 i32 vertex entry count
/// 0x04 i64 vertex table start
/// 0x0C i32 pixel entry count
/// 0x10 i64 pixel table start
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub vertex_count: i32,
    pub vertex_table_start: i64,
    pub pixel_count: i32,
    pub pixel_table_start: i64,
}

impl ContainerHeader {
    /// Read the four header fields at the reader's current position
    pub fn read_from<R: Read + Seek>(reader: &mut BinaryReader<R>) -> Result<Self, ReadError> {
        Ok(Self {
            vertex_count: reader.read_i32(Endian::Little)?,
            vertex_table_start: reader.read_i64(Endian::Little)?,
            pixel_count: reader.read_i32(Endian::Little)?,
            pixel_table_start: reader.read_i64(Endian::Little)?,
        })
    }

    /// Write the four header fields at the writer's current position
    pub fn write_to<W: Write + Seek>(&self, writer: &mut BinaryWriter<W>) -> Result<(), WriteError> {
        writer.write_i32(self.vertex_count, Endian::Little)?;
        writer.write_i64(self.vertex_table_start, Endian::Little)?;
        writer.write_i32(self.pixel_count, Endian::Little)?;
        writer.write_i64(self.pixel_table_start, Endian::Little)?;
        Ok(())
    }

    /// Check that counts and table starts are non-negative
    pub fn validate(&self) -> Result<(), String> {
        if self.vertex_count < 0 {
            return Err(format!("Negative vertex entry count: {}", self.vertex_count));
        }
        if self.pixel_count < 0 {
            return Err(format!("Negative pixel entry count: {}", self.pixel_count));
        }
        if self.vertex_table_start < 0 {
            return Err(format!(
                "Negative vertex table start: {}",
                self.vertex_table_start
            ));
        }
        if self.pixel_table_start < 0 {
            return Err(format!(
                "Negative pixel table start: {}",
                self.pixel_table_start
            ));
        }
        Ok(())
    }
}

/// One entry header inside a table: `cstring name; i32 size; i64 offset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub name: String,
    pub size: i32,
    pub offset: i64,
}

impl EntryHeader {
    pub fn read_from<R: Read + Seek>(reader: &mut BinaryReader<R>) -> Result<Self, ReadError> {
        let name = reader.read_null_terminated_string()?;
        let size = reader.read_i32(Endian::Little)?;
        let offset = reader.read_i64(Endian::Little)?;
        Ok(Self { name, size, offset })
    }

    /// Size and offset as unsigned values, rejecting negatives
    pub fn location(&self) -> Result<(u64, u64), String> {
        let size = u64::try_from(self.size)
            .map_err(|_| format!("Negative blob size {} for entry {:?}", self.size, self.name))?;
        let offset = u64::try_from(self.offset).map_err(|_| {
            format!(
                "Negative blob offset {} for entry {:?}",
                self.offset, self.name
            )
        })?;
        Ok((size, offset))
    }
}
