// SPDX-License-Identifier: MIT
//! Container decode and encode
//!
//! Decoding walks each table's entry headers and, for every entry, jumps to
//! the payload offset, reads the blob and returns to the table. Encoding is
//! two-phase: headers are written with placeholder offsets whose positions
//! are queued, then each payload is written and its placeholder backpatched.

use std::collections::VecDeque;
use std::io::{Cursor, Read, Seek, Write};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::container::{ContainerError, ShaderContainer, ShaderEntry, ShaderTable, TableRole};
use crate::format::{
    ContainerHeader, Endian, EntryHeader, HEADER_SIZE, MIN_ENTRY_HEADER_SIZE,
    PIXEL_TABLE_START_OFFSET, PLACEHOLDER,
};
use crate::reader::{BinaryReader, ReadMode};
use crate::writer::BinaryWriter;

/// Largest value the format's `i32` size and count fields can hold
pub const MAX_FIELD_VALUE: u64 = i32::MAX as u64;

/// Header and entry headers of a container, without payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerLayout {
    pub header: ContainerHeader,
    pub vertex: Vec<EntryHeader>,
    pub pixel: Vec<EntryHeader>,
    /// Total length of the container in bytes
    pub length: u64,
}

impl ContainerLayout {
    pub fn entries(&self, role: TableRole) -> &[EntryHeader] {
        match role {
            TableRole::Vertex => &self.vertex,
            TableRole::Pixel => &self.pixel,
        }
    }
}

/// Decoder and encoder for shader containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerCodec {
    read_mode: ReadMode,
    max_payload_size: u64,
}

impl ContainerCodec {
    /// Strict codec accepting any payload the format can describe
    pub fn new() -> Self {
        Self {
            read_mode: ReadMode::Strict,
            max_payload_size: MAX_FIELD_VALUE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_read_mode(config.read_mode)
            .with_max_payload_size(config.max_payload_size)
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    pub fn with_max_payload_size(mut self, max_payload_size: u64) -> Self {
        self.max_payload_size = max_payload_size.min(MAX_FIELD_VALUE);
        self
    }

    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    pub fn max_payload_size(&self) -> u64 {
        self.max_payload_size
    }

    /// Decode a container from the start of `source`
    pub fn decode<R: Read + Seek>(&self, source: R) -> Result<ShaderContainer, ContainerError> {
        let mut reader = BinaryReader::with_mode(source, self.read_mode)?;
        reader.set_position(0)?;
        let header = self.read_header(&mut reader)?;

        let vertex = self.decode_table(
            &mut reader,
            TableRole::Vertex,
            header.vertex_count,
            header.vertex_table_start,
        )?;
        let pixel = self.decode_table(
            &mut reader,
            TableRole::Pixel,
            header.pixel_count,
            header.pixel_table_start,
        )?;

        info!(
            vertex_entries = vertex.len(),
            pixel_entries = pixel.len(),
            "Decoded shader container"
        );
        Ok(ShaderContainer::new(vertex, pixel))
    }

    pub fn decode_slice(&self, data: &[u8]) -> Result<ShaderContainer, ContainerError> {
        self.decode(Cursor::new(data))
    }

    /// Read the header and entry headers without loading any payload
    pub fn scan<R: Read + Seek>(&self, source: R) -> Result<ContainerLayout, ContainerError> {
        let mut reader = BinaryReader::with_mode(source, self.read_mode)?;
        reader.set_position(0)?;
        let header = self.read_header(&mut reader)?;

        let mut tables = [Vec::new(), Vec::new()];
        for (slot, (role, count, start)) in tables.iter_mut().zip([
            (TableRole::Vertex, header.vertex_count, header.vertex_table_start),
            (TableRole::Pixel, header.pixel_count, header.pixel_table_start),
        ]) {
            let count = self.table_len(&mut reader, role, count, start)?;
            if count > 0 {
                reader.set_position(start as u64)?;
            }
            for _ in 0..count {
                let entry = EntryHeader::read_from(&mut reader)?;
                entry.location().map_err(ContainerError::Malformed)?;
                slot.push(entry);
            }
        }

        let [vertex, pixel] = tables;
        Ok(ContainerLayout {
            header,
            vertex,
            pixel,
            length: reader.length(),
        })
    }

    /// Encode `container` into `sink`
    ///
    /// Offsets in the format are absolute, so `sink` must be positioned at
    /// the start of an empty stream. Returns the sink once flushed.
    pub fn encode<W: Write + Seek>(
        &self,
        container: &ShaderContainer,
        sink: W,
    ) -> Result<W, ContainerError> {
        let mut writer = BinaryWriter::new(sink);
        let start = writer.position()?;
        if start != 0 {
            return Err(ContainerError::Malformed(format!(
                "Encode must start at offset 0, sink is at {start}"
            )));
        }

        let header = ContainerHeader {
            vertex_count: count_field(&container.vertex)?,
            vertex_table_start: HEADER_SIZE as i64,
            pixel_count: count_field(&container.pixel)?,
            pixel_table_start: PLACEHOLDER as i64,
        };
        header.write_to(&mut writer)?;

        // Phase one: entry headers, queueing each placeholder position.
        let mut placeholders = VecDeque::with_capacity(container.entry_count());
        write_table_headers(&mut writer, &container.vertex, &mut placeholders)?;

        let pixel_table_start = writer.position()?;
        writer.backpatch_i64(
            PIXEL_TABLE_START_OFFSET,
            pixel_table_start as i64,
            Endian::Little,
        )?;

        write_table_headers(&mut writer, &container.pixel, &mut placeholders)?;

        // Phase two: payloads in the same order the placeholders were queued.
        for table in [&container.vertex, &container.pixel] {
            for entry in table {
                let payload_start = writer.position()?;
                let placeholder = placeholders.pop_front().ok_or_else(|| {
                    ContainerError::Malformed(format!(
                        "No offset placeholder left for {} entry {:?}",
                        table.role(),
                        entry.name()
                    ))
                })?;
                writer.backpatch_i64(placeholder, payload_start as i64, Endian::Little)?;
                writer.write_bytes(entry.payload())?;
                debug!(
                    role = %table.role(),
                    name = entry.name(),
                    offset = payload_start,
                    size = entry.size(),
                    "Wrote payload"
                );
            }
        }
        debug_assert!(placeholders.is_empty());

        writer.flush()?;
        info!(
            vertex_entries = container.vertex.len(),
            pixel_entries = container.pixel.len(),
            pixel_table_start,
            "Encoded shader container"
        );
        Ok(writer.into_inner())
    }

    pub fn encode_to_vec(&self, container: &ShaderContainer) -> Result<Vec<u8>, ContainerError> {
        Ok(self
            .encode(container, Cursor::new(Vec::new()))?
            .into_inner())
    }

    fn read_header<R: Read + Seek>(
        &self,
        reader: &mut BinaryReader<R>,
    ) -> Result<ContainerHeader, ContainerError> {
        let header = ContainerHeader::read_from(reader)?;
        header.validate().map_err(ContainerError::Malformed)?;
        debug!(?header, "Read container header");
        Ok(header)
    }

    /// Entry count of a table, checked against the bytes that could hold it
    fn table_len<R: Read + Seek>(
        &self,
        reader: &mut BinaryReader<R>,
        role: TableRole,
        count: i32,
        start: i64,
    ) -> Result<usize, ContainerError> {
        let count = count as u64;
        let available = reader.length().saturating_sub(start as u64);
        let fits = available / MIN_ENTRY_HEADER_SIZE;
        if count <= fits {
            return Ok(count as usize);
        }
        match self.read_mode {
            ReadMode::Strict => Err(ContainerError::Malformed(format!(
                "{role} table declares {count} entries but only {available} bytes follow its start"
            ))),
            ReadMode::Lenient => {
                warn!(
                    %role,
                    declared = count,
                    kept = fits,
                    "Table count exceeds input, truncating"
                );
                Ok(fits as usize)
            }
        }
    }

    fn decode_table<R: Read + Seek>(
        &self,
        reader: &mut BinaryReader<R>,
        role: TableRole,
        count: i32,
        start: i64,
    ) -> Result<ShaderTable, ContainerError> {
        let count = self.table_len(reader, role, count, start)?;
        if count == 0 {
            return Ok(ShaderTable::new(role));
        }
        reader.set_position(start as u64)?;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let header = EntryHeader::read_from(reader)?;
            let (size, offset) = header.location().map_err(ContainerError::Malformed)?;
            if size > self.max_payload_size {
                return Err(ContainerError::TooLarge {
                    what: format!("{role} entry {:?}", header.name),
                    size,
                    max: self.max_payload_size,
                });
            }

            // Payloads live outside the table; jump there and come back.
            let table_cursor = reader.position()?;
            reader.set_position(offset)?;
            let payload = reader.read_bytes(size as usize)?;
            reader.set_position(table_cursor)?;

            debug!(%role, name = %header.name, size, offset, "Read entry");
            entries.push(ShaderEntry::new(header.name, Bytes::from(payload)));
        }

        Ok(ShaderTable::from_entries(role, entries))
    }
}

impl Default for ContainerCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode with the default strict codec
pub fn decode<R: Read + Seek>(source: R) -> Result<ShaderContainer, ContainerError> {
    ContainerCodec::new().decode(source)
}

/// Encode with the default codec
pub fn encode<W: Write + Seek>(container: &ShaderContainer, sink: W) -> Result<W, ContainerError> {
    ContainerCodec::new().encode(container, sink)
}

fn count_field(table: &ShaderTable) -> Result<i32, ContainerError> {
    i32::try_from(table.len()).map_err(|_| ContainerError::TooLarge {
        what: format!("{} table", table.role()),
        size: table.len() as u64,
        max: MAX_FIELD_VALUE,
    })
}

fn write_table_headers<W: Write + Seek>(
    writer: &mut BinaryWriter<W>,
    table: &ShaderTable,
    placeholders: &mut VecDeque<u64>,
) -> Result<(), ContainerError> {
    for entry in table {
        let size = i32::try_from(entry.size()).map_err(|_| ContainerError::TooLarge {
            what: format!("{} entry {:?}", table.role(), entry.name()),
            size: entry.size() as u64,
            max: MAX_FIELD_VALUE,
        })?;
        writer.write_null_terminated_string(entry.name())?;
        writer.write_i32(size, Endian::Little)?;
        placeholders.push_back(writer.position()?);
        writer.write_u64(PLACEHOLDER, Endian::Little)?;
    }
    Ok(())
}
