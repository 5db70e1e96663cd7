//! Error types for fragment reassembly and PSBT extraction

use crate::types::Section;
use alloc::string::String;

/// Errors that can occur anywhere along the scan pipeline
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Token does not start with the `ur:` scheme
    #[cfg_attr(feature = "std", error("Invalid scheme: expected ur:, got {0:?}"))]
    InvalidScheme(String),

    /// UR type contains characters outside `[a-z0-9-]`
    #[cfg_attr(feature = "std", error("Invalid UR type: {0:?}"))]
    InvalidType(String),

    /// Path components are missing or malformed
    #[cfg_attr(feature = "std", error("Invalid UR path: {0}"))]
    InvalidPath(String),

    /// Sequence number or count is zero or out of range
    #[cfg_attr(feature = "std", error("Invalid sequence {seq}-{total}"))]
    InvalidSequence {
        /// The sequence number found.
        seq: u64,
        /// The sequence count found.
        total: u64,
    },

    /// Sequence in the path disagrees with the one in the fragment body
    #[cfg_attr(feature = "std", error("Sequence mismatch: path says {path:?}, body says {body:?}"))]
    SequenceMismatch {
        /// `(seq, total)` from the textual path.
        path: (u32, u32),
        /// `(seq, total)` from the CBOR body.
        body: (u32, u32),
    },

    /// Character pair that is not a byteword
    #[cfg_attr(feature = "std", error("Invalid byteword at position {0}"))]
    InvalidByteword(usize),

    /// CRC-32 appended to the bytewords payload does not match
    #[cfg_attr(feature = "std", error("Bytewords checksum mismatch: expected {expected:08x}, got {actual:08x}"))]
    BytewordsChecksum {
        /// The checksum carried by the token.
        expected: u32,
        /// The checksum calculated over the decoded body.
        actual: u32,
    },

    /// Fragment body is not the expected CBOR structure
    #[cfg_attr(feature = "std", error("Invalid fragment body: {0}"))]
    InvalidFragment(String),

    /// Decoded payload is too short to hold the fragment header
    #[cfg_attr(feature = "std", error("Fragment too short: expected at least {expected} bytes, got {actual}"))]
    FragmentTooShort {
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually found.
        actual: usize,
    },

    /// Fragment belongs to a different transfer than the one accumulating
    #[cfg_attr(feature = "std", error("Foreign fragment: {field} is {actual}, transfer has {expected}"))]
    ForeignMessage {
        /// Which message attribute differed.
        field: &'static str,
        /// The value established by the transfer.
        expected: u64,
        /// The value carried by the fragment.
        actual: u64,
    },

    /// Fragment carries a different UR type than the one accumulating
    #[cfg_attr(feature = "std", error("Foreign fragment: type {actual:?}, transfer has {expected:?}"))]
    ForeignType {
        /// The UR type established by the transfer.
        expected: String,
        /// The UR type carried by the fragment.
        actual: String,
    },

    /// Reassembled message does not match its checksum
    #[cfg_attr(feature = "std", error("Message checksum mismatch: expected {expected:08x}, got {actual:08x}"))]
    ChecksumMismatch {
        /// The checksum every fragment announced.
        expected: u32,
        /// The checksum of the reassembled bytes.
        actual: u32,
    },

    /// Zero padding after the end of the message holds data
    #[cfg_attr(feature = "std", error("Non-zero padding at message offset {0}"))]
    NonZeroPadding(usize),

    /// A fully reduced mixed fragment left a non-zero residue
    #[cfg_attr(feature = "std", error("Inconsistent mixed fragment {0}"))]
    InconsistentFragment(u32),

    /// Envelope does not start with a byte string header
    #[cfg_attr(feature = "std", error("Envelope is not a byte string: initial byte {0:#04x}"))]
    EnvelopeType(u8),

    /// Byte string length prefix uses an unsupported encoding
    #[cfg_attr(feature = "std", error("Unsupported envelope length prefix {0:#04x}"))]
    EnvelopeLength(u8),

    /// Envelope declares more bytes than it carries
    #[cfg_attr(feature = "std", error("Truncated envelope: expected {expected} bytes, got {actual}"))]
    EnvelopeTruncated {
        /// The number of bytes declared.
        expected: usize,
        /// The number of bytes present.
        actual: usize,
    },

    /// No PSBT magic bytes in the payload
    #[cfg_attr(feature = "std", error("PSBT magic bytes not found in payload"))]
    MagicNotFound,

    /// Document ends in the middle of a field
    #[cfg_attr(feature = "std", error("Incomplete document at offset {offset}: need {expected} bytes, {actual} left"))]
    IncompleteDocument {
        /// Offset of the field being read.
        offset: usize,
        /// The number of bytes the field needs.
        expected: usize,
        /// The number of bytes left in the document.
        actual: usize,
    },

    /// Same key appears twice in one map
    #[cfg_attr(feature = "std", error("Duplicate key {key} in {section} at offset {offset}"))]
    DuplicateKey {
        /// Map the key was found in.
        section: Section,
        /// Hex of the full key (type + key data).
        key: String,
        /// Offset of the second occurrence.
        offset: usize,
    },

    /// Key has key data where none is allowed, or lacks required key data
    #[cfg_attr(feature = "std", error("Malformed key type {key_type:#04x} in {section} at offset {offset}: {reason}"))]
    MalformedKey {
        /// Map the key was found in.
        section: Section,
        /// The offending key type.
        key_type: u64,
        /// Offset of the key.
        offset: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Key or value length uses a wider compact-size encoding than needed
    #[cfg_attr(feature = "std", error("Non-canonical length in {section} at offset {offset}"))]
    NonCanonicalLength {
        /// Map the length was found in.
        section: Section,
        /// Offset of the length prefix.
        offset: usize,
    },

    /// Embedded unsigned transaction is missing or malformed
    #[cfg_attr(feature = "std", error("Invalid transaction: {0}"))]
    InvalidTransaction(String),

    /// Encoder asked for an impossible fragmentation
    #[cfg_attr(feature = "std", error("Invalid encoder parameters: {0}"))]
    InvalidEncoderParams(String),
}

/// Coarse classification of [`ScanError`] used by callers deciding whether to
/// keep scanning or give up on a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed fragment token
    Decode,
    /// Fragment of another transfer
    ForeignMessage,
    /// Reassembled data failed its integrity check
    Corruption,
    /// Payload is not the expected envelope
    Envelope,
    /// Payload carries no PSBT
    NotFound,
    /// Document truncated mid-field
    IncompleteDocument,
    /// Repeated key in one map
    DuplicateKey,
    /// Key data present where forbidden or missing where required, or a
    /// non-minimal length prefix
    MalformedKey,
    /// Unsigned transaction missing or unparsable
    InvalidTransaction,
    /// Encoder misuse
    Encode,
}

impl ScanError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::InvalidScheme(_)
            | ScanError::InvalidType(_)
            | ScanError::InvalidPath(_)
            | ScanError::InvalidSequence { .. }
            | ScanError::SequenceMismatch { .. }
            | ScanError::InvalidByteword(_)
            | ScanError::BytewordsChecksum { .. }
            | ScanError::InvalidFragment(_)
            | ScanError::FragmentTooShort { .. } => ErrorKind::Decode,
            ScanError::ForeignMessage { .. } | ScanError::ForeignType { .. } => {
                ErrorKind::ForeignMessage
            }
            ScanError::ChecksumMismatch { .. }
            | ScanError::NonZeroPadding(_)
            | ScanError::InconsistentFragment(_) => ErrorKind::Corruption,
            ScanError::EnvelopeType(_)
            | ScanError::EnvelopeLength(_)
            | ScanError::EnvelopeTruncated { .. } => ErrorKind::Envelope,
            ScanError::MagicNotFound => ErrorKind::NotFound,
            ScanError::IncompleteDocument { .. } => ErrorKind::IncompleteDocument,
            ScanError::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            ScanError::MalformedKey { .. } | ScanError::NonCanonicalLength { .. } => {
                ErrorKind::MalformedKey
            }
            ScanError::InvalidTransaction(_) => ErrorKind::InvalidTransaction,
            ScanError::InvalidEncoderParams(_) => ErrorKind::Encode,
        }
    }

    /// Whether scanning can continue after this error without resetting
    ///
    /// Bad tokens and stray fragments of other transfers are routine capture
    /// noise. Everything else ends the transfer.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Decode | ErrorKind::ForeignMessage)
    }
}
