// SPDX-License-Identifier: MIT
//! In-memory model of a shader container
//!
//! A container holds two ordered tables, one per shader role. Entries own a
//! reference-counted payload so that a duplicated entry shares its bytes
//! with the entry it was copied from.

use std::fmt;

use bytes::Bytes;

use crate::reader::ReadError;
use crate::writer::WriteError;

/// Errors raised while decoding, encoding or mutating a container
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Malformed container: {0}")]
    Malformed(String),

    #[error("{what} too large: {size} > {max}")]
    TooLarge { what: String, size: u64, max: u64 },

    #[error("No entry named {name:?} in the {role} table")]
    SourceEntryNotFound { role: TableRole, name: String },

    #[error("The {role} table already received an entry in this run")]
    SlotAlreadyFilled { role: TableRole },
}

/// Which shader stage a table holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRole {
    Vertex,
    Pixel,
}

impl TableRole {
    /// Roles in file order
    pub fn all() -> &'static [TableRole] {
        &[TableRole::Vertex, TableRole::Pixel]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableRole::Vertex => "vertex",
            TableRole::Pixel => "pixel",
        }
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named compiled shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderEntry {
    name: String,
    payload: Bytes,
}

impl ShaderEntry {
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// True when both entries point at the same payload buffer
    pub fn shares_payload_with(&self, other: &ShaderEntry) -> bool {
        self.payload.as_ptr() == other.payload.as_ptr() && self.payload.len() == other.payload.len()
    }
}

/// Ordered entries of one role
///
/// Tracks how many entries came from the decoded file so that at most one
/// entry can be appended per run. Equality ignores that bookkeeping.
#[derive(Debug, Clone)]
pub struct ShaderTable {
    role: TableRole,
    entries: Vec<ShaderEntry>,
    decoded_len: usize,
}

impl ShaderTable {
    /// Create an empty table
    pub fn new(role: TableRole) -> Self {
        Self::from_entries(role, Vec::new())
    }

    /// Create a table whose entries all count as pre-existing
    pub fn from_entries(role: TableRole, entries: Vec<ShaderEntry>) -> Self {
        let decoded_len = entries.len();
        Self {
            role,
            entries,
            decoded_len,
        }
    }

    pub fn role(&self) -> TableRole {
        self.role
    }

    pub fn entries(&self) -> &[ShaderEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShaderEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries the table had when it was loaded
    pub fn decoded_len(&self) -> usize {
        self.decoded_len
    }

    /// The entry appended in this run, if any
    pub fn appended(&self) -> Option<&ShaderEntry> {
        self.entries.get(self.decoded_len)
    }

    /// First entry with the given name, in table order
    pub fn find(&self, name: &str) -> Option<&ShaderEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Place `entry` in the single trailing slot reserved for this run
    pub(crate) fn fill_reserved_slot(&mut self, entry: ShaderEntry) -> Result<(), ContainerError> {
        if self.appended().is_some() {
            return Err(ContainerError::SlotAlreadyFilled { role: self.role });
        }
        self.entries.push(entry);
        Ok(())
    }
}

impl PartialEq for ShaderTable {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.entries == other.entries
    }
}

impl Eq for ShaderTable {}

impl<'a> IntoIterator for &'a ShaderTable {
    type Item = &'a ShaderEntry;
    type IntoIter = std::slice::Iter<'a, ShaderEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The vertex and pixel tables of one container file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderContainer {
    pub vertex: ShaderTable,
    pub pixel: ShaderTable,
}

impl ShaderContainer {
    pub fn new(vertex: ShaderTable, pixel: ShaderTable) -> Self {
        Self { vertex, pixel }
    }

    /// A container with two empty tables
    pub fn empty() -> Self {
        Self::new(
            ShaderTable::new(TableRole::Vertex),
            ShaderTable::new(TableRole::Pixel),
        )
    }

    pub fn table(&self, role: TableRole) -> &ShaderTable {
        match role {
            TableRole::Vertex => &self.vertex,
            TableRole::Pixel => &self.pixel,
        }
    }

    pub fn table_mut(&mut self, role: TableRole) -> &mut ShaderTable {
        match role {
            TableRole::Vertex => &mut self.vertex,
            TableRole::Pixel => &mut self.pixel,
        }
    }

    /// Total entries across both tables
    pub fn entry_count(&self) -> usize {
        self.vertex.len() + self.pixel.len()
    }
}

impl Default for ShaderContainer {
    fn default() -> Self {
        Self::empty()
    }
}
