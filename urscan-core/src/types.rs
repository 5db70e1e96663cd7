//! Shared value types

use crate::constants::TXID_SIZE;
use core::fmt;
use serde::{Deserialize, Serialize, Serializer};

/// Attributes every fragment of one message agrees on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Number of pure blocks the message is split into
    pub total: u32,

    /// Length of the reassembled message in bytes
    pub message_len: usize,

    /// CRC-32 of the reassembled message
    pub checksum: u32,

    /// Length of each block (the last one is zero padded)
    pub fragment_len: usize,
}

impl MessageInfo {
    /// Total padded length of all blocks
    pub fn padded_len(&self) -> usize {
        self.total as usize * self.fragment_len
    }
}

/// Which key-value map of a PSBT a field lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    /// The global map
    Global,
    /// The map of input N
    Input(usize),
    /// The map of output N
    Output(usize),
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Global => write!(f, "global map"),
            Section::Input(i) => write!(f, "input {}", i),
            Section::Output(i) => write!(f, "output {}", i),
        }
    }
}

/// Transaction identifier: double SHA-256 of the legacy serialization.
///
/// Bytes are kept in hash output order; `Display` renders them reversed, the
/// way block explorers and wallets show txids.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Txid([u8; TXID_SIZE]);

impl Txid {
    /// Wrap raw hash bytes (hash output order)
    pub const fn from_bytes(bytes: [u8; TXID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes (hash output order)
    pub fn as_bytes(&self) -> &[u8; TXID_SIZE] {
        &self.0
    }

    /// Bytes in display order
    pub fn to_display_bytes(&self) -> [u8; TXID_SIZE] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", self)
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
