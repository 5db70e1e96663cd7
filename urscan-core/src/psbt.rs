//! BIP-174 partially signed transaction parser
//!
//! A PSBT is the magic `psbt\xff` followed by key-value maps: one global
//! map, then one map per input and one per output of the unsigned
//! transaction. Every map ends with a zero-length key.
//!
//! ```text
//! map   := pair* 0x00
//! pair  := keylen:compact key:[keylen] valuelen:compact value:[valuelen]
//! key   := keytype:compact keydata
//! ```
//!
//! Parsing is read-only over one buffer; entries are zero-copy slices of it.

use crate::compact::{CompactError, Cursor, ShortRead};
use crate::constants::{key_type, PSBT_MAGIC, PSBT_VERSION_0};
use crate::error::ScanError;
use crate::tx::Transaction;
use crate::types::{Section, Txid};
use alloc::format;
use alloc::vec::Vec;
use bytes::Bytes;
use hashbrown::HashSet;

#[cfg(feature = "logging")]
use tracing::debug;

/// One key-value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Key type
    pub key_type: u64,
    /// Key bytes after the type (may be empty)
    pub key_data: Bytes,
    /// Value bytes
    pub value: Bytes,
    /// Offset of the pair in the document
    pub offset: usize,
}

impl KeyValue {
    /// Whether the key is the type alone
    pub fn is_type_only(&self) -> bool {
        self.key_data.is_empty()
    }
}

/// One key-value map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsbtMap {
    /// Where the map sits in the document
    pub section: Section,
    /// Pairs in document order
    pub entries: Vec<KeyValue>,
}

impl PsbtMap {
    /// The type-only entry of `key_type`, if present
    pub fn get(&self, key_type: u64) -> Option<&KeyValue> {
        self.entries
            .iter()
            .find(|kv| kv.key_type == key_type && kv.is_type_only())
    }

    /// Every entry of `key_type`
    pub fn all(&self, key_type: u64) -> impl Iterator<Item = &KeyValue> {
        self.entries.iter().filter(move |kv| kv.key_type == key_type)
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no pairs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a key type may, must, or must not carry key data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyRule {
    TypeOnly,
    Keyed,
    Any,
}

fn key_rule(section: Section, kt: u64) -> KeyRule {
    use key_type::*;
    match section {
        Section::Global => match kt {
            GLOBAL_UNSIGNED_TX | GLOBAL_VERSION => KeyRule::TypeOnly,
            GLOBAL_XPUB | PROPRIETARY => KeyRule::Keyed,
            _ => KeyRule::Any,
        },
        Section::Input(_) => match kt {
            IN_NON_WITNESS_UTXO | IN_WITNESS_UTXO | IN_SIGHASH_TYPE | IN_REDEEM_SCRIPT
            | IN_WITNESS_SCRIPT | IN_FINAL_SCRIPTSIG | IN_FINAL_SCRIPTWITNESS | IN_TAP_KEY_SIG
            | IN_TAP_INTERNAL_KEY | IN_TAP_MERKLE_ROOT => KeyRule::TypeOnly,
            IN_PARTIAL_SIG | IN_BIP32_DERIVATION | IN_RIPEMD160 | IN_SHA256 | IN_HASH160
            | IN_HASH256 | IN_TAP_SCRIPT_SIG | IN_TAP_LEAF_SCRIPT | IN_TAP_BIP32_DERIVATION
            | PROPRIETARY => KeyRule::Keyed,
            _ => KeyRule::Any,
        },
        Section::Output(_) => match kt {
            OUT_REDEEM_SCRIPT | OUT_WITNESS_SCRIPT | OUT_TAP_INTERNAL_KEY | OUT_TAP_TREE => {
                KeyRule::TypeOnly
            }
            OUT_BIP32_DERIVATION | OUT_TAP_BIP32_DERIVATION | PROPRIETARY => KeyRule::Keyed,
            _ => KeyRule::Any,
        },
    }
}

/// A parsed PSBT (version 0)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Psbt {
    /// Global map
    pub global: PsbtMap,
    /// Input maps, one per transaction input
    pub inputs: Vec<PsbtMap>,
    /// Output maps, one per transaction output
    pub outputs: Vec<PsbtMap>,
    /// The unsigned transaction from the global map
    pub unsigned_tx: Transaction,
    /// Declared PSBT version (0 when absent)
    pub version: u32,
    /// Bytes of the document consumed by the maps, magic included
    pub len: usize,
}

fn incomplete(err: ShortRead) -> ScanError {
    ScanError::IncompleteDocument {
        offset: err.offset,
        expected: err.expected,
        actual: err.actual,
    }
}

fn read_len(cursor: &mut Cursor<'_>, section: Section) -> Result<usize, ScanError> {
    let value = cursor.read_compact_size().map_err(|err| match err {
        CompactError::Short(short) => incomplete(short),
        CompactError::NonCanonical { offset } => ScanError::NonCanonicalLength { section, offset },
    })?;
    // A length beyond the address space can never be satisfied
    usize::try_from(value).map_err(|_| ScanError::IncompleteDocument {
        offset: cursor.position(),
        expected: usize::MAX,
        actual: cursor.remaining(),
    })
}

fn read_map(cursor: &mut Cursor<'_>, doc: &Bytes, section: Section) -> Result<PsbtMap, ScanError> {
    let mut entries = Vec::new();
    let mut keys: HashSet<&[u8]> = HashSet::new();

    loop {
        let offset = cursor.position();
        let key_len = read_len(cursor, section)?;
        if key_len == 0 {
            break;
        }
        let key_start = cursor.position();
        let key = cursor.take(key_len).map_err(incomplete)?;

        let mut key_cursor = Cursor::new(key);
        let kt = key_cursor
            .read_compact_size()
            .map_err(|_| ScanError::MalformedKey {
                section,
                key_type: u64::from(key[0]),
                offset,
                reason: "invalid key type",
            })?;
        let data_start = key_start + key_cursor.position();
        let data_end = key_start + key_len;

        let value_len = read_len(cursor, section)?;
        let value_start = cursor.position();
        cursor.take(value_len).map_err(incomplete)?;

        if !keys.insert(key) {
            return Err(ScanError::DuplicateKey {
                section,
                key: hex::encode(key),
                offset,
            });
        }

        let has_data = data_end > data_start;
        match (key_rule(section, kt), has_data) {
            (KeyRule::TypeOnly, true) => {
                return Err(ScanError::MalformedKey {
                    section,
                    key_type: kt,
                    offset,
                    reason: "unexpected key data",
                })
            }
            (KeyRule::Keyed, false) => {
                return Err(ScanError::MalformedKey {
                    section,
                    key_type: kt,
                    offset,
                    reason: "missing key data",
                })
            }
            _ => {}
        }

        entries.push(KeyValue {
            key_type: kt,
            key_data: doc.slice(data_start..data_end),
            value: doc.slice(value_start..value_start + value_len),
            offset,
        });
    }

    Ok(PsbtMap { section, entries })
}

impl Psbt {
    /// Parse a document that starts with the PSBT magic
    pub fn parse(document: &[u8]) -> Result<Self, ScanError> {
        Self::parse_bytes(Bytes::copy_from_slice(document))
    }

    /// Parse without copying; entries borrow from `document`
    pub fn parse_bytes(document: Bytes) -> Result<Self, ScanError> {
        if !document.starts_with(PSBT_MAGIC) {
            return Err(ScanError::MagicNotFound);
        }
        let mut cursor = Cursor::new(&document);
        cursor.take(PSBT_MAGIC.len()).map_err(incomplete)?;

        let global = read_map(&mut cursor, &document, Section::Global)?;

        let version = match global.get(key_type::GLOBAL_VERSION) {
            Some(kv) => {
                let raw: [u8; 4] = kv.value[..].try_into().map_err(|_| {
                    ScanError::InvalidTransaction(format!(
                        "version field is {} bytes",
                        kv.value.len()
                    ))
                })?;
                u32::from_le_bytes(raw)
            }
            None => PSBT_VERSION_0,
        };
        if version != PSBT_VERSION_0 {
            return Err(ScanError::InvalidTransaction(format!(
                "unsupported PSBT version {}",
                version
            )));
        }

        let tx_entry = global.get(key_type::GLOBAL_UNSIGNED_TX).ok_or_else(|| {
            ScanError::InvalidTransaction("missing unsigned transaction".into())
        })?;
        let unsigned_tx = Transaction::parse_unsigned(&tx_entry.value)?;

        let mut inputs = Vec::with_capacity(unsigned_tx.inputs.len());
        for index in 0..unsigned_tx.inputs.len() {
            inputs.push(read_map(&mut cursor, &document, Section::Input(index))?);
        }
        let mut outputs = Vec::with_capacity(unsigned_tx.outputs.len());
        for index in 0..unsigned_tx.outputs.len() {
            outputs.push(read_map(&mut cursor, &document, Section::Output(index))?);
        }

        #[cfg(feature = "logging")]
        debug!(
            "Parsed PSBT: {} global entries, {} inputs, {} outputs, {} of {} bytes",
            global.len(),
            inputs.len(),
            outputs.len(),
            cursor.position(),
            document.len()
        );

        Ok(Self {
            global,
            inputs,
            outputs,
            unsigned_tx,
            version,
            len: cursor.position(),
        })
    }

    /// Raw unsigned transaction bytes as carried in the global map
    pub fn unsigned_tx_bytes(&self) -> Bytes {
        self.global
            .get(key_type::GLOBAL_UNSIGNED_TX)
            .map(|kv| kv.value.clone())
            .unwrap_or_default()
    }

    /// Txid of the unsigned transaction
    pub fn txid(&self) -> Txid {
        self.unsigned_tx.txid()
    }

    /// All maps in document order
    pub fn maps(&self) -> impl Iterator<Item = &PsbtMap> {
        core::iter::once(&self.global)
            .chain(self.inputs.iter())
            .chain(self.outputs.iter())
    }
}
