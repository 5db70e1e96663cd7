//! Byte cursor with Bitcoin compact-size integers
//!
//! Shared by the PSBT map walker and the transaction parser. Short reads
//! report the offset they started at so callers can surface it.

use bytes::BufMut;

/// A read ran past the end of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
    /// Offset the read started at
    pub offset: usize,
    /// Bytes the read needed
    pub expected: usize,
    /// Bytes that were left
    pub actual: usize,
}

/// Failure reading a compact-size integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactError {
    /// Buffer ended
    Short(ShortRead),
    /// Value encoded wider than necessary
    NonCanonical {
        /// Offset of the prefix byte
        offset: usize,
    },
}

impl From<ShortRead> for CompactError {
    fn from(short: ShortRead) -> Self {
        CompactError::Short(short)
    }
}

/// Forward-only reader over a borrowed buffer
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Start at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether everything has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrow the next `n` bytes
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ShortRead> {
        let left = self.remaining();
        if n > left {
            return Err(ShortRead {
                offset: self.pos,
                expected: n,
                actual: left,
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ShortRead> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8, ShortRead> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian u32
    pub fn read_u32_le(&mut self) -> Result<u32, ShortRead> {
        self.take_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian u64
    pub fn read_u64_le(&mut self) -> Result<u64, ShortRead> {
        self.take_array().map(u64::from_le_bytes)
    }

    /// Read a 32-byte hash
    pub fn read_hash(&mut self) -> Result<[u8; 32], ShortRead> {
        self.take_array()
    }

    /// Read a compact-size integer, rejecting non-minimal encodings
    pub fn read_compact_size(&mut self) -> Result<u64, CompactError> {
        let start = self.pos;
        let prefix = self.read_u8()?;
        let (value, min) = match prefix {
            0xfd => (u64::from(u16::from_le_bytes(self.take_array()?)), 0xfd),
            0xfe => (u64::from(u32::from_le_bytes(self.take_array()?)), 0x1_0000),
            0xff => (u64::from_le_bytes(self.take_array()?), 0x1_0000_0000),
            n => return Ok(u64::from(n)),
        };
        if value < min {
            return Err(CompactError::NonCanonical { offset: start });
        }
        Ok(value)
    }
}

/// Encoded width of `value` as a compact-size integer
pub fn compact_size_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Append `value` as a compact-size integer
#[allow(clippy::cast_possible_truncation)]
pub fn write_compact_size<B: BufMut>(buf: &mut B, value: u64) {
    match compact_size_len(value) {
        1 => buf.put_u8(value as u8),
        3 => {
            buf.put_u8(0xfd);
            buf.put_u16_le(value as u16);
        }
        5 => {
            buf.put_u8(0xfe);
            buf.put_u32_le(value as u32);
        }
        _ => {
            buf.put_u8(0xff);
            buf.put_u64_le(value);
        }
    }
}
