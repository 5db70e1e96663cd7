//! Fragment codec: one UR token in, one structured fragment out
//!
//! A multipart token has the layout
//!
//! ```text
//! ur:<type>/<seq>-<len>/<bytewords>
//! ```
//!
//! where the bytewords decode (after their CRC-32 is checked) to a CBOR array
//! `[seq, len, message_len, checksum, data]`. A token without the `seq-len`
//! component is a single-part UR carrying the whole message.

use crate::bytewords::{self, Style};
use crate::cbor::{self, CborError, Reader};
use crate::constants::{
    FRAGMENT_FIELD_COUNT, MAX_FRAGMENT_COUNT, MAX_FRAGMENT_LENGTH, MAX_MESSAGE_LENGTH,
    MAX_SEQUENCE_NUMBER, UR_SCHEME,
};
use crate::error::ScanError;
use crate::fountain::choose_fragments;
use crate::types::MessageInfo;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use bytes::{Bytes, BytesMut};

/// One decoded multipart token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Lower-cased UR type, e.g. `crypto-psbt`
    pub ur_type: String,

    /// 1-based sequence number; above `seq_len` the fragment is mixed
    pub seq_num: u32,

    /// Number of pure blocks in the message
    pub seq_len: u32,

    /// Length of the reassembled message
    pub message_len: usize,

    /// CRC-32 of the reassembled message
    pub checksum: u32,

    /// Block bytes, or the XOR of several blocks for mixed fragments
    pub data: Bytes,
}

/// Any UR token: single-part or one fragment of a multipart transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrPart {
    /// Whole message in one token
    Single {
        /// Lower-cased UR type
        ur_type: String,
        /// The message bytes
        message: Bytes,
    },
    /// One fragment of a fountain-coded transfer
    Multi(Fragment),
}

impl Fragment {
    /// A pure fragment carries exactly one block
    pub fn is_pure(&self) -> bool {
        self.seq_num <= self.seq_len
    }

    /// The attributes every fragment of this message must share
    pub fn message_info(&self) -> MessageInfo {
        MessageInfo {
            total: self.seq_len,
            message_len: self.message_len,
            checksum: self.checksum,
            fragment_len: self.data.len(),
        }
    }

    /// Zero-based indexes of the blocks mixed into this fragment
    pub fn indexes(&self) -> Vec<usize> {
        choose_fragments(self.seq_num, self.seq_len as usize, self.checksum)
    }

    /// CBOR body of this fragment
    pub fn to_cbor(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.data.len() + 24);
        cbor::write_array_len(&mut buf, FRAGMENT_FIELD_COUNT);
        cbor::write_uint(&mut buf, u64::from(self.seq_num));
        cbor::write_uint(&mut buf, u64::from(self.seq_len));
        cbor::write_uint(&mut buf, self.message_len as u64);
        cbor::write_uint(&mut buf, u64::from(self.checksum));
        cbor::write_bytes(&mut buf, &self.data);
        buf.freeze()
    }

    /// Render as a lower-case UR token
    pub fn encode(&self) -> String {
        format!(
            "{}:{}/{}-{}/{}",
            UR_SCHEME,
            self.ur_type,
            self.seq_num,
            self.seq_len,
            bytewords::encode(&self.to_cbor(), Style::Minimal)
        )
    }

    /// Parse a CBOR fragment body
    pub fn from_cbor(ur_type: &str, body: &[u8]) -> Result<Self, ScanError> {
        let mut reader = Reader::new(body);
        let truncated = |reader: &Reader<'_>, err: CborError| match err {
            CborError::Truncated { expected, .. } => ScanError::FragmentTooShort {
                expected: reader.position() + expected,
                actual: body.len(),
            },
            CborError::UnsupportedLength(b) => {
                ScanError::InvalidFragment(format!("unsupported length prefix {:#04x}", b))
            }
            CborError::UnexpectedType(b) => {
                ScanError::InvalidFragment(format!("unexpected item {:#04x}", b))
            }
        };

        let count = reader
            .read_array_len()
            .map_err(|e| truncated(&reader, e))?;
        if count != FRAGMENT_FIELD_COUNT {
            return Err(ScanError::InvalidFragment(format!(
                "expected {} fields, got {}",
                FRAGMENT_FIELD_COUNT, count
            )));
        }

        let seq_num = reader.read_uint().map_err(|e| truncated(&reader, e))?;
        let seq_len = reader.read_uint().map_err(|e| truncated(&reader, e))?;
        let message_len = reader.read_uint().map_err(|e| truncated(&reader, e))?;
        let checksum = reader.read_uint().map_err(|e| truncated(&reader, e))?;
        let data = reader.read_bytes().map_err(|e| truncated(&reader, e))?;

        if !reader.remaining().is_empty() {
            return Err(ScanError::InvalidFragment(format!(
                "{} trailing bytes",
                reader.remaining().len()
            )));
        }

        let (seq_num, seq_len) = validate_sequence(seq_num, seq_len)?;
        let checksum = u32::try_from(checksum)
            .map_err(|_| ScanError::InvalidFragment(format!("checksum {} exceeds 32 bits", checksum)))?;
        let message_len = usize::try_from(message_len)
            .ok()
            .filter(|&len| len > 0 && len <= MAX_MESSAGE_LENGTH)
            .ok_or_else(|| ScanError::InvalidFragment(format!("message length {}", message_len)))?;
        if data.is_empty() || data.len() > MAX_FRAGMENT_LENGTH {
            return Err(ScanError::InvalidFragment(format!(
                "fragment length {}",
                data.len()
            )));
        }
        if (seq_len as usize).saturating_mul(data.len()) < message_len {
            return Err(ScanError::InvalidFragment(format!(
                "{} blocks of {} bytes cannot hold {} bytes",
                seq_len,
                data.len(),
                message_len
            )));
        }

        Ok(Self {
            ur_type: ur_type.to_string(),
            seq_num,
            seq_len,
            message_len,
            checksum,
            data: Bytes::copy_from_slice(data),
        })
    }
}

fn validate_sequence(seq: u64, total: u64) -> Result<(u32, u32), ScanError> {
    let in_range = seq >= 1
        && total >= 1
        && seq <= u64::from(MAX_SEQUENCE_NUMBER)
        && total <= u64::from(MAX_FRAGMENT_COUNT);
    if !in_range {
        return Err(ScanError::InvalidSequence { seq, total });
    }
    Ok((seq as u32, total as u32))
}

fn validate_type(ur_type: &str) -> Result<(), ScanError> {
    let valid = !ur_type.is_empty()
        && ur_type
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(ScanError::InvalidType(ur_type.to_string()))
    }
}

fn parse_sequence(component: &str) -> Result<(u32, u32), ScanError> {
    let (seq, total) = component
        .split_once('-')
        .ok_or_else(|| ScanError::InvalidPath(format!("bad sequence component {:?}", component)))?;
    let parse = |s: &str| {
        s.bytes()
            .all(|b| b.is_ascii_digit())
            .then(|| s.parse::<u64>().ok())
            .flatten()
            .ok_or_else(|| ScanError::InvalidPath(format!("bad sequence component {:?}", component)))
    };
    validate_sequence(parse(seq)?, parse(total)?)
}

/// Decode any UR token, single-part or multipart
pub fn decode_part(text: &str) -> Result<UrPart, ScanError> {
    let lower = text.trim().to_ascii_lowercase();

    let (scheme, rest) = lower
        .split_once(':')
        .ok_or_else(|| ScanError::InvalidScheme(lower.chars().take(16).collect()))?;
    if scheme != UR_SCHEME {
        return Err(ScanError::InvalidScheme(scheme.to_string()));
    }

    let components: Vec<&str> = rest.split('/').collect();
    match components.as_slice() {
        [ur_type, words] => {
            validate_type(ur_type)?;
            let message = bytewords::decode(words, Style::Minimal)?;
            Ok(UrPart::Single {
                ur_type: ur_type.to_string(),
                message: Bytes::from(message),
            })
        }
        [ur_type, sequence, words] => {
            validate_type(ur_type)?;
            let (seq_num, seq_len) = parse_sequence(sequence)?;
            let body = bytewords::decode(words, Style::Minimal)?;
            let fragment = Fragment::from_cbor(ur_type, &body)?;
            if (fragment.seq_num, fragment.seq_len) != (seq_num, seq_len) {
                return Err(ScanError::SequenceMismatch {
                    path: (seq_num, seq_len),
                    body: (fragment.seq_num, fragment.seq_len),
                });
            }
            Ok(UrPart::Multi(fragment))
        }
        _ => Err(ScanError::InvalidPath(format!(
            "expected 2 or 3 path components, got {}",
            components.len()
        ))),
    }
}

/// Decode one multipart token into a fragment
pub fn decode(text: &str) -> Result<Fragment, ScanError> {
    match decode_part(text)? {
        UrPart::Multi(fragment) => Ok(fragment),
        UrPart::Single { .. } => Err(ScanError::InvalidPath(
            "single-part UR where a fragment was expected".to_string(),
        )),
    }
}

/// Render a whole message as a single-part UR token
pub fn encode_single(ur_type: &str, message: &[u8]) -> String {
    format!(
        "{}:{}/{}",
        UR_SCHEME,
        ur_type,
        bytewords::encode(message, Style::Minimal)
    )
}
