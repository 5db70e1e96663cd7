//! Unsigned Bitcoin transaction carried in the PSBT global map, and its txid

use crate::compact::{compact_size_len, write_compact_size, CompactError, Cursor, ShortRead};
use crate::error::ScanError;
use crate::types::Txid;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use bytes::{BufMut, Bytes};
use sha2::{Digest, Sha256};

/// Smallest possible serialized input: outpoint, empty script, sequence
const MIN_INPUT_SIZE: usize = 32 + 4 + 1 + 4;

/// Smallest possible serialized output: value and empty script
const MIN_OUTPUT_SIZE: usize = 8 + 1;

/// Reference to an output of an earlier transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Txid of the funding transaction, in serialization order
    pub txid: [u8; 32],
    /// Output index within it
    pub vout: u32,
}

/// Transaction input; unsigned, so the scriptSig is always empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxIn {
    /// Output being spent
    pub previous_output: OutPoint,
    /// nSequence
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxOut {
    /// Amount in satoshis
    pub value: u64,
    /// Locking script
    pub script_pubkey: Bytes,
}

/// An unsigned transaction in legacy serialization
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transaction {
    /// nVersion
    pub version: i32,
    /// Inputs in serialization order
    pub inputs: Vec<TxIn>,
    /// Outputs in serialization order
    pub outputs: Vec<TxOut>,
    /// nLockTime
    pub lock_time: u32,
}

fn invalid(reason: String) -> ScanError {
    ScanError::InvalidTransaction(reason)
}

fn short(err: ShortRead) -> ScanError {
    invalid(format!(
        "truncated at offset {}: need {} bytes, {} left",
        err.offset, err.expected, err.actual
    ))
}

fn compact(err: CompactError) -> ScanError {
    match err {
        CompactError::Short(s) => short(s),
        CompactError::NonCanonical { offset } => {
            invalid(format!("non-canonical length at offset {}", offset))
        }
    }
}

fn read_count(cursor: &mut Cursor<'_>, what: &str, min_size: usize) -> Result<usize, ScanError> {
    let count = cursor.read_compact_size().map_err(compact)?;
    let fits = cursor.remaining() / min_size;
    match usize::try_from(count) {
        Ok(n) if n <= fits => Ok(n),
        _ => Err(invalid(format!(
            "{} {} cannot fit in {} remaining bytes",
            count,
            what,
            cursor.remaining()
        ))),
    }
}

impl Transaction {
    /// Parse the unsigned transaction of a PSBT.
    ///
    /// The buffer must hold exactly one transaction in legacy serialization
    /// with at least one input and every scriptSig empty.
    pub fn parse_unsigned(data: &[u8]) -> Result<Self, ScanError> {
        let mut cursor = Cursor::new(data);
        let version = cursor.read_u32_le().map_err(short)? as i32;

        let input_count = read_count(&mut cursor, "inputs", MIN_INPUT_SIZE)?;
        if input_count == 0 {
            return Err(invalid("no inputs (or witness serialization)".into()));
        }
        let mut inputs = Vec::with_capacity(input_count);
        for index in 0..input_count {
            let txid = cursor.read_hash().map_err(short)?;
            let vout = cursor.read_u32_le().map_err(short)?;
            let script_len = cursor.read_compact_size().map_err(compact)?;
            if script_len != 0 {
                return Err(invalid(format!("input {} has a non-empty scriptSig", index)));
            }
            let sequence = cursor.read_u32_le().map_err(short)?;
            inputs.push(TxIn {
                previous_output: OutPoint { txid, vout },
                sequence,
            });
        }

        let output_count = read_count(&mut cursor, "outputs", MIN_OUTPUT_SIZE)?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            let value = cursor.read_u64_le().map_err(short)?;
            let script_len = cursor.read_compact_size().map_err(compact)?;
            let script_len = usize::try_from(script_len)
                .map_err(|_| invalid(format!("script length {}", script_len)))?;
            let script = cursor.take(script_len).map_err(short)?;
            outputs.push(TxOut {
                value,
                script_pubkey: Bytes::copy_from_slice(script),
            });
        }

        let lock_time = cursor.read_u32_le().map_err(short)?;
        if !cursor.is_empty() {
            return Err(invalid(format!(
                "{} trailing bytes after lock time",
                cursor.remaining()
            )));
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Length of the legacy serialization
    pub fn serialized_len(&self) -> usize {
        let inputs = compact_size_len(self.inputs.len() as u64) + self.inputs.len() * MIN_INPUT_SIZE;
        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| 8 + compact_size_len(o.script_pubkey.len() as u64) + o.script_pubkey.len())
            .sum();
        4 + inputs + compact_size_len(self.outputs.len() as u64) + outputs + 4
    }

    /// Write the legacy serialization into `buf`
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32_le(self.version);
        write_compact_size(buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.put_slice(&input.previous_output.txid);
            buf.put_u32_le(input.previous_output.vout);
            write_compact_size(buf, 0);
            buf.put_u32_le(input.sequence);
        }
        write_compact_size(buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.put_u64_le(output.value);
            write_compact_size(buf, output.script_pubkey.len() as u64);
            buf.put_slice(&output.script_pubkey);
        }
        buf.put_u32_le(self.lock_time);
    }

    /// Legacy serialization as a fresh buffer
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        self.write_to(&mut buf);
        buf
    }

    /// Transaction id
    pub fn txid(&self) -> Txid {
        txid_of(&self.serialize())
    }

    /// Sum of all output values, `None` on overflow
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.value))
    }
}

/// Double SHA-256 of a serialized transaction
pub fn txid_of(serialized: &[u8]) -> Txid {
    let first = Sha256::digest(serialized);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    Txid::from_bytes(out)
}
