//! # urscan core
//!
//! Reassembles animated-QR PSBT transfers and derives the transaction id.
//!
//! A wallet splits a PSBT into UR fountain-coded fragments (`ur:crypto-psbt/…`)
//! and shows them as an animated QR code. This crate takes the scanned
//! tokens in any order, with repeats and noise, solves for the original
//! message and parses the PSBT inside it.
//!
//! ## Modules
//!
//! - `constants`: Protocol constants and sanity limits
//! - `types`: Shared value types (`MessageInfo`, `Section`, `Txid`)
//! - `error`: `ScanError` and its `ErrorKind` classification
//! - `bytewords`: Bytewords text codec with CRC-32
//! - `cbor`: The CBOR subset UR payloads use
//! - `xoshiro`, `sampler`: Deterministic block selection for mixed fragments
//! - `fragment`: UR token decoding and encoding
//! - `fountain`: Block partitioning and the fountain encoder
//! - `reconstructor`: Fountain decoder
//! - `envelope`: CBOR byte string unwrapping
//! - `locator`: PSBT magic search
//! - `compact`: Compact-size cursor shared by the parsers
//! - `psbt`: BIP-174 map parser
//! - `tx`: Unsigned transaction parsing and txid
//! - `session`: The full pipeline from tokens to txid

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod bytewords;
pub mod cbor;
pub mod compact;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod fountain;
pub mod fragment;
pub mod locator;
pub mod psbt;
pub mod reconstructor;
pub mod sampler;
pub mod session;
pub mod tx;
pub mod types;
pub mod xoshiro;

// Re-export commonly used types
pub use error::{ErrorKind, ScanError};
pub use fountain::FountainEncoder;
pub use fragment::{decode, decode_part, Fragment, UrPart};
pub use psbt::Psbt;
pub use reconstructor::{FountainReconstructor, ReceiveOutcome, ReconstructorLimits, ReconstructorState};
pub use session::{extract_psbt, txid_from_payload, ScanResult, ScanSession, ScanStats};
pub use tx::Transaction;
pub use types::{MessageInfo, Section, Txid};

/// Result type alias for scan operations
pub type Result<T> = core::result::Result<T, ScanError>;
