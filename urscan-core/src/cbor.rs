//! The small slice of CBOR (RFC 8949) that UR payloads use
//!
//! Only definite-length unsigned integers, byte strings, arrays and tags
//! appear in fragment bodies and PSBT envelopes, so only those are read and
//! written here.

use bytes::BufMut;

/// Unsigned integer
pub const MAJOR_UINT: u8 = 0;
/// Byte string
pub const MAJOR_BYTES: u8 = 2;
/// Array
pub const MAJOR_ARRAY: u8 = 4;
/// Semantic tag
pub const MAJOR_TAG: u8 = 6;

/// Low-level failures, mapped to pipeline errors by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CborError {
    /// Input ends before the item does
    Truncated {
        /// Bytes needed from the item start.
        expected: usize,
        /// Bytes available from the item start.
        actual: usize,
    },
    /// Additional-info value 28..=31 (reserved or indefinite length)
    UnsupportedLength(u8),
    /// Item has a different major type than requested
    UnexpectedType(u8),
}

/// Item header: major type, argument, and the initial byte it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    /// Major type (top three bits)
    pub major: u8,
    /// Argument: length, count, tag number or integer value
    pub value: u64,
    /// The raw initial byte
    pub initial: u8,
}

/// Forward-only reader over a borrowed buffer
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset into the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CborError> {
        let left = self.data.len() - self.pos;
        if n > left {
            return Err(CborError::Truncated {
                expected: n,
                actual: left,
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read one item header
    pub fn read_head(&mut self) -> Result<Head, CborError> {
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let info = initial & 0x1f;
        let width = match info {
            0..=23 => 0,
            24 => 1,
            25 => 2,
            26 => 4,
            27 => 8,
            _ => return Err(CborError::UnsupportedLength(initial)),
        };
        let value = if width == 0 {
            u64::from(info)
        } else {
            self.take(width)?
                .iter()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
        };
        Ok(Head {
            major,
            value,
            initial,
        })
    }

    fn expect(&mut self, major: u8) -> Result<u64, CborError> {
        let head = self.read_head()?;
        if head.major != major {
            return Err(CborError::UnexpectedType(head.initial));
        }
        Ok(head.value)
    }

    /// Read an unsigned integer
    pub fn read_uint(&mut self) -> Result<u64, CborError> {
        self.expect(MAJOR_UINT)
    }

    /// Read an array header, returning the item count
    pub fn read_array_len(&mut self) -> Result<u64, CborError> {
        self.expect(MAJOR_ARRAY)
    }

    /// Read a byte string, borrowing its contents
    pub fn read_bytes(&mut self) -> Result<&'a [u8], CborError> {
        let len = self.expect(MAJOR_BYTES)?;
        let left = self.data.len() - self.pos;
        let len = usize::try_from(len).map_err(|_| CborError::Truncated {
            expected: usize::MAX,
            actual: left,
        })?;
        self.take(len)
    }

    /// Skip any semantic tags in front of the next item
    pub fn skip_tags(&mut self) -> Result<(), CborError> {
        while self.pos < self.data.len() && self.data[self.pos] >> 5 == MAJOR_TAG {
            self.read_head()?;
        }
        Ok(())
    }
}

/// Write an item header using the shortest argument encoding
#[allow(clippy::cast_possible_truncation)]
pub fn write_head<B: BufMut>(buf: &mut B, major: u8, value: u64) {
    let major = major << 5;
    if value < 24 {
        buf.put_u8(major | value as u8);
    } else if value <= u64::from(u8::MAX) {
        buf.put_u8(major | 24);
        buf.put_u8(value as u8);
    } else if value <= u64::from(u16::MAX) {
        buf.put_u8(major | 25);
        buf.put_u16(value as u16);
    } else if value <= u64::from(u32::MAX) {
        buf.put_u8(major | 26);
        buf.put_u32(value as u32);
    } else {
        buf.put_u8(major | 27);
        buf.put_u64(value);
    }
}

/// Write an unsigned integer
pub fn write_uint<B: BufMut>(buf: &mut B, value: u64) {
    write_head(buf, MAJOR_UINT, value);
}

/// Write an array header
pub fn write_array_len<B: BufMut>(buf: &mut B, len: u64) {
    write_head(buf, MAJOR_ARRAY, len);
}

/// Write a byte string
pub fn write_bytes<B: BufMut>(buf: &mut B, data: &[u8]) {
    write_head(buf, MAJOR_BYTES, data.len() as u64);
    buf.put_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_head_widths() {
        let cases: [(u64, &str); 5] = [
            (10, "0a"),
            (24, "1818"),
            (332, "19014c"),
            (1_925_131_959, "1a72bf2eb7"),
            (1 << 40, "1b0000010000000000"),
        ];
        for (value, expected) in cases {
            let mut buf = Vec::new();
            write_uint(&mut buf, value);
            assert_eq!(hex::encode(&buf), expected);
            assert_eq!(Reader::new(&buf).read_uint().unwrap(), value);
        }
    }

    #[test]
    fn test_read_bytes_and_array() {
        let mut buf = Vec::new();
        write_array_len(&mut buf, 2);
        write_uint(&mut buf, 7);
        write_bytes(&mut buf, b"abc");

        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_array_len().unwrap(), 2);
        assert_eq!(reader.read_uint().unwrap(), 7);
        assert_eq!(reader.read_bytes().unwrap(), b"abc");
        assert!(reader.remaining().is_empty());
    }

    #[test]
    fn test_truncated_bytes() {
        let data = [0x45, b'a', b'b'];
        let err = Reader::new(&data).read_bytes().unwrap_err();
        assert_eq!(
            err,
            CborError::Truncated {
                expected: 5,
                actual: 2
            }
        );
    }

    #[test]
    fn test_indefinite_length_rejected() {
        let data = [0x5f, 0x41, 0x00, 0xff];
        assert_eq!(
            Reader::new(&data).read_bytes(),
            Err(CborError::UnsupportedLength(0x5f))
        );
    }

    #[test]
    fn test_wrong_major_type() {
        let data = [0x83, 0x01, 0x02, 0x03];
        assert_eq!(
            Reader::new(&data).read_uint(),
            Err(CborError::UnexpectedType(0x83))
        );
    }

    #[test]
    fn test_skip_tags() {
        let data = [0xd9, 0x01, 0x30, 0x42, 0xaa, 0xbb];
        let mut reader = Reader::new(&data);
        reader.skip_tags().unwrap();
        assert_eq!(reader.read_bytes().unwrap(), &[0xaa, 0xbb]);
    }
}
