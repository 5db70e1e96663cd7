//! Fountain code primitives: block partitioning, block selection for mixed
//! fragments, and an encoder producing an endless fragment stream

use crate::bytewords::crc32;
use crate::constants::{MAX_FRAGMENT_COUNT, MAX_FRAGMENT_LENGTH, MAX_MESSAGE_LENGTH};
use crate::error::ScanError;
use crate::fragment::{encode_single, Fragment};
use crate::xoshiro::Xoshiro256;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use bytes::Bytes;

/// Block length for a message split into fragments of at most `max_fragment_len`
pub fn fragment_length(message_len: usize, max_fragment_len: usize) -> usize {
    let count = message_len / max_fragment_len + 1;
    message_len.div_ceil(count)
}

/// Split `message` into zero-padded blocks of `fragment_len`
pub fn partition(message: &[u8], fragment_len: usize) -> Vec<Bytes> {
    message
        .chunks(fragment_len)
        .map(|chunk| {
            let mut block = vec![0u8; fragment_len];
            block[..chunk.len()].copy_from_slice(chunk);
            Bytes::from(block)
        })
        .collect()
}

/// Indexes of the blocks combined into fragment `seq_num`.
///
/// Sequence numbers up to `seq_len` are pure and carry block `seq_num - 1`.
/// Above that the set is drawn from a generator seeded with the sequence
/// number and the message checksum, so encoder and decoder agree on it
/// without transmitting it.
#[allow(clippy::cast_possible_truncation)]
pub fn choose_fragments(seq_num: u32, seq_len: usize, checksum: u32) -> Vec<usize> {
    if seq_num as usize <= seq_len {
        return vec![seq_num as usize - 1];
    }

    let mut seed = [0u8; 8];
    seed[..4].copy_from_slice(&seq_num.to_be_bytes());
    seed[4..].copy_from_slice(&checksum.to_be_bytes());

    let mut rng = Xoshiro256::from_seed_bytes(&seed);
    let degree = rng.choose_degree(seq_len);
    let mut shuffled = rng.shuffled((0..seq_len).collect());
    shuffled.truncate(degree);
    shuffled
}

/// XOR `source` into `target` byte by byte
pub fn xor_into(target: &mut [u8], source: &[u8]) {
    for (t, s) in target.iter_mut().zip(source) {
        *t ^= s;
    }
}

/// Produces the fragment stream for one message
#[derive(Debug, Clone)]
pub struct FountainEncoder {
    ur_type: String,
    blocks: Vec<Bytes>,
    message: Bytes,
    checksum: u32,
    fragment_len: usize,
    next_seq: u32,
}

impl FountainEncoder {
    /// Split `message` into blocks of at most `max_fragment_len` bytes
    pub fn new(ur_type: &str, message: &[u8], max_fragment_len: usize) -> Result<Self, ScanError> {
        if message.is_empty() || message.len() > MAX_MESSAGE_LENGTH {
            return Err(ScanError::InvalidEncoderParams(format!(
                "message length {}",
                message.len()
            )));
        }
        if max_fragment_len == 0 || max_fragment_len > MAX_FRAGMENT_LENGTH {
            return Err(ScanError::InvalidEncoderParams(format!(
                "max fragment length {}",
                max_fragment_len
            )));
        }

        let fragment_len = fragment_length(message.len(), max_fragment_len);
        let blocks = partition(message, fragment_len);
        if blocks.len() > MAX_FRAGMENT_COUNT as usize {
            return Err(ScanError::InvalidEncoderParams(format!(
                "{} fragments exceed the limit of {}",
                blocks.len(),
                MAX_FRAGMENT_COUNT
            )));
        }

        Ok(Self {
            ur_type: ur_type.to_string(),
            blocks,
            message: Bytes::copy_from_slice(message),
            checksum: crc32(message),
            fragment_len,
            next_seq: 1,
        })
    }

    /// Number of pure blocks
    #[allow(clippy::cast_possible_truncation)]
    pub fn seq_len(&self) -> u32 {
        self.blocks.len() as u32
    }

    /// Length of every block
    pub fn fragment_len(&self) -> usize {
        self.fragment_len
    }

    /// Message checksum carried by every fragment
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Whether the whole message fits a single block
    pub fn is_single_part(&self) -> bool {
        self.blocks.len() == 1
    }

    /// The fragment with sequence number `seq_num` (1-based)
    pub fn fragment_at(&self, seq_num: u32) -> Fragment {
        let mut data = vec![0u8; self.fragment_len];
        for index in choose_fragments(seq_num, self.blocks.len(), self.checksum) {
            xor_into(&mut data, &self.blocks[index]);
        }
        Fragment {
            ur_type: self.ur_type.clone(),
            seq_num,
            seq_len: self.seq_len(),
            message_len: self.message.len(),
            checksum: self.checksum,
            data: Bytes::from(data),
        }
    }

    /// Next fragment of the stream: pure blocks first, then mixed ones
    pub fn next_fragment(&mut self) -> Fragment {
        let fragment = self.fragment_at(self.next_seq);
        self.next_seq = self.next_seq.wrapping_add(1).max(1);
        fragment
    }

    /// Next fragment rendered as a UR token.
    ///
    /// Single-block messages are rendered as single-part URs.
    pub fn next_part(&mut self) -> String {
        if self.is_single_part() {
            return encode_single(&self.ur_type, &self.message);
        }
        self.next_fragment().encode()
    }
}
