// SPDX-License-Identifier: MIT
//! Seekable binary writer
//!
//! Mirrors `BinaryReader`. Seeking backward and writing overwrites bytes in
//! place, which is what makes placeholder backpatching work.

use std::io::{Seek, SeekFrom, Write};

use crate::format::Endian;

/// Errors that can occur during writing
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Name {name:?} contains {character:?}, which has no single-byte encoding")]
    UnencodableName { name: String, character: char },
}

/// Check that every character of `name` is written as exactly one non-zero byte
pub fn check_name(name: &str) -> Result<(), WriteError> {
    match name.chars().find(|&c| c == '\0' || u32::from(c) > 0xff) {
        Some(character) => Err(WriteError::UnencodableName {
            name: name.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

macro_rules! write_fixed {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Write a `", stringify!($ty), "` in the given byte order")]
            pub fn $name(&mut self, value: $ty, endian: Endian) -> Result<(), WriteError> {
                let bytes = match endian {
                    Endian::Little => value.to_le_bytes(),
                    Endian::Big => value.to_be_bytes(),
                };
                self.inner.write_all(&bytes)?;
                Ok(())
            }
        )*
    };
}

/// Binary writer over a growable, seekable byte sink
pub struct BinaryWriter<W: Write> {
    inner: W,
}

impl<W: Write + Seek> BinaryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Current absolute position
    pub fn position(&mut self) -> Result<u64, WriteError> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute position; later writes overwrite in place
    pub fn set_position(&mut self, position: u64) -> Result<(), WriteError> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    write_fixed! {
        write_u16 => u16,
        write_i16 => i16,
        write_u32 => u32,
        write_i32 => i32,
        write_u64 => u64,
        write_i64 => i64,
        write_f32 => f32,
        write_f64 => f64,
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), WriteError> {
        self.inner.write_all(&[value])?;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), WriteError> {
        self.write_u8(value as u8)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Write one byte per character followed by a zero byte
    ///
    /// Characters outside `U+0001..=U+00FF` are rejected before anything
    /// is written.
    pub fn write_null_terminated_string(&mut self, text: &str) -> Result<(), WriteError> {
        check_name(text)?;
        let mut bytes: Vec<u8> = text.chars().map(|c| u32::from(c) as u8).collect();
        bytes.push(0);
        self.write_bytes(&bytes)
    }

    /// Base-128 unsigned varint
    pub fn write_var_u32(&mut self, value: u32) -> Result<(), WriteError> {
        self.write_var_u64(u64::from(value))
    }

    /// Base-128 signed varint; negative values take the full 10 bytes
    pub fn write_var_i64(&mut self, value: i64) -> Result<(), WriteError> {
        self.write_var_u64(value as u64)
    }

    /// Overwrite the `i64` at `at`, then return to the current position
    pub fn backpatch_i64(&mut self, at: u64, value: i64, endian: Endian) -> Result<(), WriteError> {
        let resume = self.position()?;
        self.set_position(at)?;
        self.write_i64(value, endian)?;
        self.set_position(resume)
    }

    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_var_u64(&mut self, mut value: u64) -> Result<(), WriteError> {
        let mut buf = [0u8; 10];
        let mut len = 0;
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                buf[len] = byte;
                len += 1;
                break;
            }
            buf[len] = byte | 0x80;
            len += 1;
        }
        self.write_bytes(&buf[..len])
    }
}
