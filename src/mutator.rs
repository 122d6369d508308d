// SPDX-License-Identifier: MIT
//! Table mutations: duplicate an entry or append a new one
//!
//! Mutations only ever fill a table's single trailing slot. Existing entries
//! are never removed or reordered.

use std::io::Read;

use bytes::Bytes;
use tracing::info;

use crate::codec::MAX_FIELD_VALUE;
use crate::config::Config;
use crate::container::{ContainerError, ShaderContainer, ShaderEntry, ShaderTable};
use crate::writer::check_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMutator {
    max_payload_size: u64,
}

impl TableMutator {
    pub fn new() -> Self {
        Self {
            max_payload_size: MAX_FIELD_VALUE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new().with_max_payload_size(config.max_payload_size)
    }

    pub fn with_max_payload_size(mut self, max_payload_size: u64) -> Self {
        self.max_payload_size = max_payload_size.min(MAX_FIELD_VALUE);
        self
    }

    /// Append a copy of the first entry named `source_name`, renamed to `new_name`
    ///
    /// The new entry shares the source entry's payload buffer.
    pub fn duplicate(
        &self,
        table: &mut ShaderTable,
        source_name: &str,
        new_name: &str,
    ) -> Result<(), ContainerError> {
        check_name(new_name)?;
        let payload = table
            .find(source_name)
            .map(|entry| entry.payload().clone())
            .ok_or_else(|| ContainerError::SourceEntryNotFound {
                role: table.role(),
                name: source_name.to_string(),
            })?;

        let size = payload.len();
        table.fill_reserved_slot(ShaderEntry::new(new_name, payload))?;
        info!(
            role = %table.role(),
            source = source_name,
            name = new_name,
            size,
            "Duplicated entry"
        );
        Ok(())
    }

    /// Append a new entry whose payload is everything `source` yields
    pub fn append<R: Read>(
        &self,
        table: &mut ShaderTable,
        name: &str,
        source: R,
    ) -> Result<(), ContainerError> {
        check_name(name)?;
        if table.appended().is_some() {
            return Err(ContainerError::SlotAlreadyFilled { role: table.role() });
        }

        let mut payload = Vec::new();
        source
            .take(self.max_payload_size + 1)
            .read_to_end(&mut payload)?;
        if payload.len() as u64 > self.max_payload_size {
            return Err(ContainerError::TooLarge {
                what: format!("{} payload for {:?}", table.role(), name),
                size: payload.len() as u64,
                max: self.max_payload_size,
            });
        }

        let size = payload.len();
        table.fill_reserved_slot(ShaderEntry::new(name, Bytes::from(payload)))?;
        info!(role = %table.role(), name, size, "Appended entry");
        Ok(())
    }

    /// Duplicate `source_name` into `new_name` in the vertex table, then the pixel table
    ///
    /// Both tables must contain the source entry.
    pub fn duplicate_in_both(
        &self,
        container: &mut ShaderContainer,
        source_name: &str,
        new_name: &str,
    ) -> Result<(), ContainerError> {
        self.duplicate(&mut container.vertex, source_name, new_name)?;
        self.duplicate(&mut container.pixel, source_name, new_name)
    }

    /// Append `name` to both tables; the pixel source is read first
    pub fn append_to_both<P: Read, V: Read>(
        &self,
        container: &mut ShaderContainer,
        name: &str,
        pixel_source: P,
        vertex_source: V,
    ) -> Result<(), ContainerError> {
        self.append(&mut container.pixel, name, pixel_source)?;
        self.append(&mut container.vertex, name, vertex_source)
    }
}

impl Default for TableMutator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::TableRole;
    use std::io::Cursor;

    fn container() -> ShaderContainer {
        ShaderContainer::new(
            ShaderTable::from_entries(
                TableRole::Vertex,
                vec![
                    ShaderEntry::new("p1", vec![0xaau8, 0xbb]),
                    ShaderEntry::new("p1", vec![0x00u8]),
                ],
            ),
            ShaderTable::from_entries(TableRole::Pixel, vec![ShaderEntry::new("p1", vec![0xccu8])]),
        )
    }

    #[test]
    fn test_duplicate_shares_first_match() {
        let mut container = container();
        TableMutator::new()
            .duplicate(&mut container.vertex, "p1", "p2")
            .unwrap();

        let entries = container.vertex.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].name(), "p2");
        assert!(entries[2].shares_payload_with(&entries[0]));
        assert!(!entries[2].shares_payload_with(&entries[1]));
    }

    #[test]
    fn test_duplicate_missing_source() {
        let mut container = container();
        let err = TableMutator::new()
            .duplicate(&mut container.pixel, "p9", "p2")
            .unwrap_err();
        assert!(matches!(
            err,
            ContainerError::SourceEntryNotFound {
                role: TableRole::Pixel,
                ..
            }
        ));
        assert_eq!(container.pixel.len(), 1);
    }

    #[test]
    fn test_duplicate_in_both_stops_on_missing_pixel_source() {
        let mut container = container();
        container.pixel = ShaderTable::from_entries(
            TableRole::Pixel,
            vec![ShaderEntry::new("other", vec![1u8])],
        );
        let err = TableMutator::new()
            .duplicate_in_both(&mut container, "p1", "p2")
            .unwrap_err();
        assert!(matches!(
            err,
            ContainerError::SourceEntryNotFound {
                role: TableRole::Pixel,
                ..
            }
        ));
    }

    #[test]
    fn test_append_reads_whole_source() {
        let mut container = container();
        TableMutator::new()
            .append_to_both(
                &mut container,
                "p3",
                Cursor::new(vec![1u8, 2, 3]),
                Cursor::new(vec![4u8]),
            )
            .unwrap();

        assert_eq!(container.pixel.len(), 2);
        assert_eq!(container.vertex.len(), 3);
        assert_eq!(&container.pixel.appended().unwrap().payload()[..], &[1, 2, 3]);
        assert_eq!(&container.vertex.appended().unwrap().payload()[..], &[4]);
        assert_eq!(container.vertex.entries()[0].name(), "p1");
    }

    #[test]
    fn test_append_empty_source() {
        let mut table = ShaderTable::new(TableRole::Vertex);
        TableMutator::new()
            .append(&mut table, "empty", std::io::empty())
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].size(), 0);
    }

    #[test]
    fn test_second_mutation_rejected() {
        let mut container = container();
        let mutator = TableMutator::new();
        mutator.duplicate(&mut container.pixel, "p1", "p2").unwrap();
        let err = mutator
            .append(&mut container.pixel, "p3", Cursor::new(vec![1u8]))
            .unwrap_err();
        assert!(matches!(err, ContainerError::SlotAlreadyFilled { .. }));
    }

    #[test]
    fn test_append_payload_limit() {
        let mut table = ShaderTable::new(TableRole::Pixel);
        let err = TableMutator::new()
            .with_max_payload_size(4)
            .append(&mut table, "big", Cursor::new(vec![0u8; 5]))
            .unwrap_err();
        assert!(matches!(err, ContainerError::TooLarge { max: 4, .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_new_name_must_be_encodable() {
        let mut container = container();
        let err = TableMutator::new()
            .duplicate(&mut container.vertex, "p1", "\u{4e2d}")
            .unwrap_err();
        assert!(matches!(err, ContainerError::Write(_)));
        assert_eq!(container.vertex.len(), 2);
    }
}
