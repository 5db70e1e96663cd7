//! Outer envelope of a reconstructed payload
//!
//! A `crypto-psbt` message is a single CBOR byte string, optionally behind
//! one or more semantic tags. Some encoders skip the envelope and send the
//! bare document, which is passed through unchanged.

use crate::cbor::{CborError, Reader, MAJOR_BYTES};
use crate::constants::PSBT_MAGIC;
use crate::error::ScanError;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// How a payload is packaged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// CBOR byte string with a `header_len` byte prefix (tags included)
    Wrapped {
        /// Bytes in front of the body.
        header_len: usize,
        /// Declared body length.
        body_len: usize,
    },
    /// Document magic at offset zero, no envelope
    Bare,
    /// Neither of the above
    Unrecognized,
}

fn envelope_error(err: CborError) -> ScanError {
    match err {
        CborError::Truncated { expected, actual } => {
            ScanError::EnvelopeTruncated { expected, actual }
        }
        CborError::UnsupportedLength(initial) => ScanError::EnvelopeLength(initial),
        CborError::UnexpectedType(initial) => ScanError::EnvelopeType(initial),
    }
}

/// Strip the envelope and return the inner byte string.
///
/// Every definite length width (immediate, 1, 2, 4 and 8 byte) is accepted.
/// Indefinite and reserved widths are `EnvelopeLength`; anything that is not
/// a byte string is `EnvelopeType`. Bytes after the string are ignored.
pub fn unwrap(payload: &[u8]) -> Result<&[u8], ScanError> {
    if payload.starts_with(PSBT_MAGIC) {
        #[cfg(feature = "logging")]
        trace!("Payload is a bare document");
        return Ok(payload);
    }

    let mut reader = Reader::new(payload);
    reader.skip_tags().map_err(envelope_error)?;

    let initial = *reader
        .remaining()
        .first()
        .ok_or(ScanError::EnvelopeTruncated {
            expected: 1,
            actual: 0,
        })?;
    if initial >> 5 != MAJOR_BYTES {
        return Err(ScanError::EnvelopeType(initial));
    }

    let body = reader.read_bytes().map_err(envelope_error)?;

    #[cfg(feature = "logging")]
    {
        let trailing = reader.remaining().len();
        debug!(
            "Unwrapped {} byte envelope body ({} trailing bytes)",
            body.len(),
            trailing
        );
    }

    Ok(body)
}

/// Classify a payload without failing
pub fn shape(payload: &[u8]) -> PayloadShape {
    if payload.starts_with(PSBT_MAGIC) {
        return PayloadShape::Bare;
    }
    let Ok(body) = unwrap(payload) else {
        return PayloadShape::Unrecognized;
    };

    let mut reader = Reader::new(payload);
    if reader.skip_tags().is_err() || reader.read_head().is_err() {
        return PayloadShape::Unrecognized;
    }
    PayloadShape::Wrapped {
        header_len: reader.position(),
        body_len: body.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbor::write_bytes;
    use alloc::vec;
    use alloc::vec::Vec;

    fn document(len: usize) -> Vec<u8> {
        let mut doc = PSBT_MAGIC.to_vec();
        doc.resize(len, 0xab);
        doc
    }

    #[test]
    fn test_every_length_width() {
        for len in [5usize, 23, 24, 255, 256, 65_535, 65_536] {
            let doc = document(len);
            let mut payload = Vec::new();
            write_bytes(&mut payload, &doc);
            assert_eq!(unwrap(&payload).unwrap(), &doc[..], "length {}", len);
        }
    }

    #[test]
    fn test_eight_byte_length() {
        let doc = document(40);
        let mut payload = vec![0x5b, 0, 0, 0, 0, 0, 0, 0, 40];
        payload.extend_from_slice(&doc);
        assert_eq!(unwrap(&payload).unwrap(), &doc[..]);
    }

    #[test]
    fn test_known_header() {
        let mut payload = vec![0x59, 0x01, 0x49];
        payload.extend_from_slice(&document(329));
        assert_eq!(unwrap(&payload).unwrap().len(), 329);
        assert_eq!(
            shape(&payload),
            PayloadShape::Wrapped {
                header_len: 3,
                body_len: 329
            }
        );
    }

    #[test]
    fn test_tags_skipped() {
        let doc = document(10);
        let mut payload = vec![0xd9, 0x01, 0xf6];
        write_bytes(&mut payload, &doc);
        assert_eq!(unwrap(&payload).unwrap(), &doc[..]);
    }

    #[test]
    fn test_bare_document_passes_through() {
        let doc = document(12);
        assert_eq!(unwrap(&doc).unwrap(), &doc[..]);
        assert_eq!(shape(&doc), PayloadShape::Bare);
    }

    #[test]
    fn test_rejects_other_types() {
        assert_eq!(unwrap(&[0x83, 1, 2, 3]), Err(ScanError::EnvelopeType(0x83)));
        assert_eq!(unwrap(&[0x64, b'a', b'b', b'c', b'd']), Err(ScanError::EnvelopeType(0x64)));
        assert_eq!(shape(&[0x83, 1, 2, 3]), PayloadShape::Unrecognized);
    }

    #[test]
    fn test_rejects_unsupported_widths() {
        for initial in [0x5cu8, 0x5d, 0x5e, 0x5f] {
            assert_eq!(unwrap(&[initial, 0]), Err(ScanError::EnvelopeLength(initial)));
        }
    }

    #[test]
    fn test_truncated() {
        assert_eq!(
            unwrap(&[0x59, 0x01]),
            Err(ScanError::EnvelopeTruncated {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            unwrap(&[0x45, 1, 2]),
            Err(ScanError::EnvelopeTruncated {
                expected: 5,
                actual: 2
            })
        );
        assert!(matches!(unwrap(&[]), Err(ScanError::EnvelopeTruncated { .. })));
    }
}
