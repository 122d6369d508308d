// SPDX-License-Identifier: MIT
//! Random-access binary reader
//!
//! `BinaryReader` decodes fixed-width integers, null-terminated strings,
//! base-128 varints and raw byte runs from any `Read + Seek` source. The
//! position can be moved freely, which the codec relies on to jump to a
//! payload and come back to the table it was scanning.

use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

use crate::format::Endian;

/// Errors that can occur during reading
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of input at {position}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        position: u64,
        needed: u64,
        available: u64,
    },

    #[error("Seek to {position} is beyond the end of input ({length} bytes)")]
    SeekOutOfRange { position: u64, length: u64 },

    #[error("Variable-length integer at {position} exceeds {max_bytes} bytes")]
    VarIntTooLong { position: u64, max_bytes: usize },
}

/// How the reader treats input that ends early
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Short reads and seeks past the end are errors
    #[default]
    Strict,
    /// Short reads yield whatever was available, zero-filled to the requested length
    Lenient,
}

impl FromStr for ReadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("Unknown read mode: {other}")),
        }
    }
}

macro_rules! read_fixed {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` in the given byte order")]
            pub fn $name(&mut self, endian: Endian) -> Result<$ty, ReadError> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                self.fill(&mut buf)?;
                Ok(match endian {
                    Endian::Little => <$ty>::from_le_bytes(buf),
                    Endian::Big => <$ty>::from_be_bytes(buf),
                })
            }
        )*
    };
}

/// Binary reader over a finite, seekable byte source
pub struct BinaryReader<R> {
    inner: R,
    length: u64,
    mode: ReadMode,
}

impl<R: Read + Seek> BinaryReader<R> {
    /// Create a strict reader
    pub fn new(inner: R) -> Result<Self, ReadError> {
        Self::with_mode(inner, ReadMode::Strict)
    }

    /// Create a reader with an explicit truncation policy
    ///
    /// The source keeps its current position; the length is measured once.
    pub fn with_mode(mut inner: R, mode: ReadMode) -> Result<Self, ReadError> {
        let start = inner.stream_position()?;
        let length = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            length,
            mode,
        })
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Total length of the source in bytes
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Current absolute position
    pub fn position(&mut self) -> Result<u64, ReadError> {
        Ok(self.inner.stream_position()?)
    }

    /// Bytes between the current position and the end of the source
    pub fn remaining(&mut self) -> Result<u64, ReadError> {
        Ok(self.length.saturating_sub(self.position()?))
    }

    /// Seek to an absolute position
    ///
    /// This is a pure seek: nothing is read or discarded besides the
    /// source's own buffering, so jumping away and back is always safe.
    pub fn set_position(&mut self, position: u64) -> Result<(), ReadError> {
        if self.mode == ReadMode::Strict && position > self.length {
            return Err(ReadError::SeekOutOfRange {
                position,
                length: self.length,
            });
        }
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    read_fixed! {
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_f32 => f32,
        read_f64 => f64,
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadError> {
        Ok(self.read_u8()? as i8)
    }

    /// Read single-byte characters up to a zero byte
    ///
    /// Each byte maps to the character with the same code point, so any
    /// byte sequence decodes and names written by `BinaryWriter` round-trip.
    pub fn read_null_terminated_string(&mut self) -> Result<String, ReadError> {
        let mut text = String::new();
        loop {
            let mut byte = [0u8; 1];
            if self.read_available(&mut byte)? == 0 {
                match self.mode {
                    ReadMode::Strict => {
                        return Err(ReadError::UnexpectedEof {
                            position: self.position()?,
                            needed: 1,
                            available: 0,
                        })
                    }
                    ReadMode::Lenient => {
                        warn!(len = text.len(), "Unterminated string at end of input");
                        return Ok(text);
                    }
                }
            }
            if byte[0] == 0 {
                return Ok(text);
            }
            text.push(char::from(byte[0]));
        }
    }

    /// Read exactly `count` bytes
    ///
    /// Partial reads from the source are retried until satisfied or the
    /// source is exhausted. In lenient mode a missing tail is zero-filled.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, ReadError> {
        let mut buf = Vec::with_capacity(count.min(self.length as usize));
        (&mut self.inner).take(count as u64).read_to_end(&mut buf)?;
        if buf.len() < count {
            self.short_read(count as u64, buf.len() as u64)?;
            buf.resize(count, 0);
        }
        Ok(buf)
    }

    /// Read everything from the current position to the end of the source
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, ReadError> {
        let mut buf = Vec::new();
        self.inner.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Base-128 unsigned varint, at most 5 bytes
    pub fn read_var_u32(&mut self) -> Result<u32, ReadError> {
        const MAX_BYTES: usize = 5;
        let start = self.position()?;
        let mut result = 0u32;
        for index in 0..MAX_BYTES {
            let byte = self.read_u8()?;
            result |= u32::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(ReadError::VarIntTooLong {
            position: start,
            max_bytes: MAX_BYTES,
        })
    }

    /// Base-128 signed varint (two's complement), at most 10 bytes
    pub fn read_var_i64(&mut self) -> Result<i64, ReadError> {
        const MAX_BYTES: usize = 10;
        let start = self.position()?;
        let mut result = 0u64;
        for index in 0..MAX_BYTES {
            let byte = self.read_u8()?;
            result |= u64::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result as i64);
            }
        }
        Err(ReadError::VarIntTooLong {
            position: start,
            max_bytes: MAX_BYTES,
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely, zero-filling the tail in lenient mode
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        let read = self.read_available(buf)?;
        if read < buf.len() {
            buf[read..].fill(0);
            self.short_read(buf.len() as u64, read as u64)?;
        }
        Ok(())
    }

    /// Read into `buf` until it is full or the source returns nothing
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let mut total = 0;
        while total < buf.len() {
            match self.inner.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }

    fn short_read(&mut self, needed: u64, available: u64) -> Result<(), ReadError> {
        let position = self.position()?.saturating_sub(available);
        match self.mode {
            ReadMode::Strict => Err(ReadError::UnexpectedEof {
                position,
                needed,
                available,
            }),
            ReadMode::Lenient => {
                warn!(position, needed, available, "Short read, zero-filling the rest");
                Ok(())
            }
        }
    }
}

/// Source that hands out one byte per `read` and is interrupted once
#[cfg(test)]
pub(crate) struct TrickleSource {
    inner: std::io::Cursor<Vec<u8>>,
    interrupted: bool,
}

#[cfg(test)]
impl TrickleSource {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: std::io::Cursor::new(bytes),
            interrupted: false,
        }
    }
}

#[cfg(test)]
impl Read for TrickleSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.interrupted {
            self.interrupted = true;
            return Err(ErrorKind::Interrupted.into());
        }
        let len = buf.len().min(1);
        self.inner.read(&mut buf[..len])
    }
}

#[cfg(test)]
impl Seek for TrickleSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}
