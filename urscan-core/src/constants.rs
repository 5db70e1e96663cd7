//! Protocol constants and sanity limits

/// URI scheme every fragment token starts with (compared case-insensitively)
pub const UR_SCHEME: &str = "ur";

/// UR type carried by animated PSBT transfers
pub const PSBT_UR_TYPE: &str = "crypto-psbt";

/// Magic bytes at the start of every PSBT: `psbt` followed by 0xff
pub const PSBT_MAGIC: &[u8; 5] = b"psbt\xff";

/// Upper bound on the number of blocks a message may be split into.
///
/// Real transfers use a few dozen parts at most; the ceiling only bounds
/// memory against hostile or corrupt tokens.
pub const MAX_FRAGMENT_COUNT: u32 = 4096;

/// Upper bound on any sequence number (mixed parts run past the block count)
pub const MAX_SEQUENCE_NUMBER: u32 = u32::MAX;

/// Maximum reconstructed message size (16 MB)
pub const MAX_MESSAGE_LENGTH: usize = 16 * 1024 * 1024;

/// Maximum size of a single fragment body (64 KB)
pub const MAX_FRAGMENT_LENGTH: usize = 64 * 1024;

/// Number of CBOR items in a multipart fragment body
pub const FRAGMENT_FIELD_COUNT: u64 = 5;

/// Size of the CRC-32 appended to every bytewords payload
pub const BYTEWORDS_CHECKSUM_SIZE: usize = 4;

/// Expected overhead of fountain transfers: on average this many parts per
/// block have to be seen before reassembly succeeds.
pub const PROGRESS_OVERHEAD: f64 = 1.75;

/// Progress is capped below 1.0 until the payload is actually complete
pub const PROGRESS_CEILING: f64 = 0.99;

/// Size of a SHA-256 digest and of a transaction id
pub const TXID_SIZE: usize = 32;

/// The only PSBT version whose global map carries the unsigned transaction
pub const PSBT_VERSION_0: u32 = 0;

/// PSBT key types (BIP-174 / BIP-371)
pub mod key_type {
    /// Global: unsigned transaction
    pub const GLOBAL_UNSIGNED_TX: u64 = 0x00;
    /// Global: extended public key
    pub const GLOBAL_XPUB: u64 = 0x01;
    /// Global: PSBT version number
    pub const GLOBAL_VERSION: u64 = 0xfb;
    /// Any map: proprietary use
    pub const PROPRIETARY: u64 = 0xfc;

    /// Input: non-witness UTXO
    pub const IN_NON_WITNESS_UTXO: u64 = 0x00;
    /// Input: witness UTXO
    pub const IN_WITNESS_UTXO: u64 = 0x01;
    /// Input: partial signature
    pub const IN_PARTIAL_SIG: u64 = 0x02;
    /// Input: sighash type
    pub const IN_SIGHASH_TYPE: u64 = 0x03;
    /// Input: redeem script
    pub const IN_REDEEM_SCRIPT: u64 = 0x04;
    /// Input: witness script
    pub const IN_WITNESS_SCRIPT: u64 = 0x05;
    /// Input: BIP32 derivation
    pub const IN_BIP32_DERIVATION: u64 = 0x06;
    /// Input: finalized scriptSig
    pub const IN_FINAL_SCRIPTSIG: u64 = 0x07;
    /// Input: finalized script witness
    pub const IN_FINAL_SCRIPTWITNESS: u64 = 0x08;
    /// Input: RIPEMD160 preimage
    pub const IN_RIPEMD160: u64 = 0x0a;
    /// Input: SHA256 preimage
    pub const IN_SHA256: u64 = 0x0b;
    /// Input: HASH160 preimage
    pub const IN_HASH160: u64 = 0x0c;
    /// Input: HASH256 preimage
    pub const IN_HASH256: u64 = 0x0d;
    /// Input: taproot key-path signature
    pub const IN_TAP_KEY_SIG: u64 = 0x13;
    /// Input: taproot script-path signature
    pub const IN_TAP_SCRIPT_SIG: u64 = 0x14;
    /// Input: taproot leaf script
    pub const IN_TAP_LEAF_SCRIPT: u64 = 0x15;
    /// Input: taproot BIP32 derivation
    pub const IN_TAP_BIP32_DERIVATION: u64 = 0x16;
    /// Input: taproot internal key
    pub const IN_TAP_INTERNAL_KEY: u64 = 0x17;
    /// Input: taproot merkle root
    pub const IN_TAP_MERKLE_ROOT: u64 = 0x18;

    /// Output: redeem script
    pub const OUT_REDEEM_SCRIPT: u64 = 0x00;
    /// Output: witness script
    pub const OUT_WITNESS_SCRIPT: u64 = 0x01;
    /// Output: BIP32 derivation
    pub const OUT_BIP32_DERIVATION: u64 = 0x02;
    /// Output: taproot internal key
    pub const OUT_TAP_INTERNAL_KEY: u64 = 0x05;
    /// Output: taproot tree
    pub const OUT_TAP_TREE: u64 = 0x06;
    /// Output: taproot BIP32 derivation
    pub const OUT_TAP_BIP32_DERIVATION: u64 = 0x07;
}
