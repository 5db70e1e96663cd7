//! Fountain decoder: accumulates fragments of one transfer and solves for the
//! original message once enough independent fragments have arrived
//!
//! Pure fragments resolve their block directly. Mixed fragments have every
//! already-known block XORed out of them; whatever is left either resolves a
//! single block, proves redundant, or waits in a queue. Each newly resolved
//! block is pushed on a worklist and XORed out of the queued fragments, which
//! may resolve further blocks in turn. The worklist runs to a fixpoint inside
//! a single `receive` call.

use crate::bytewords::crc32;
use crate::constants::{
    MAX_FRAGMENT_COUNT, MAX_MESSAGE_LENGTH, PROGRESS_CEILING, PROGRESS_OVERHEAD,
};
use crate::error::ScanError;
use crate::fountain::xor_into;
use crate::fragment::Fragment;
use crate::types::MessageInfo;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use bytes::{Bytes, BytesMut};
use hashbrown::HashSet;

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Lifecycle of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructorState {
    /// No fragment accepted yet
    Empty,
    /// Fragments accepted, message not yet resolved
    Accumulating,
    /// Message resolved and verified
    Complete,
    /// Transfer hit a corruption error; only `reset` leaves this state
    Failed,
}

/// What a successful `receive` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Fragment contributed new information
    Accepted,
    /// Exact repeat of a fragment already seen
    Duplicate,
    /// Fragment carried nothing the decoder did not already know
    Redundant,
    /// Fragment completed the message
    Completed,
    /// Message was already complete; fragment ignored
    AlreadyComplete,
}

/// Resource ceilings applied before a fragment touches any state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructorLimits {
    /// Largest accepted block count
    pub max_fragment_count: u32,
    /// Largest accepted message length
    pub max_message_length: usize,
}

impl Default for ReconstructorLimits {
    fn default() -> Self {
        Self {
            max_fragment_count: MAX_FRAGMENT_COUNT,
            max_message_length: MAX_MESSAGE_LENGTH,
        }
    }
}

/// A mixed fragment that still covers two or more unknown blocks
#[derive(Debug, Clone)]
struct MixedPart {
    seq_num: u32,
    indexes: Vec<usize>,
    data: Vec<u8>,
}

/// Reassembles one fountain-coded message
#[derive(Debug, Clone)]
pub struct FountainReconstructor {
    limits: ReconstructorLimits,
    state: ReconstructorState,
    ur_type: Option<String>,
    info: Option<MessageInfo>,
    blocks: Vec<Option<Bytes>>,
    resolved: usize,
    mixed: Vec<MixedPart>,
    seen: HashSet<(u32, [u8; 32])>,
    fragments_seen: usize,
    result: Option<Bytes>,
    failure: Option<ScanError>,
}

impl Default for FountainReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl FountainReconstructor {
    /// Create an empty reconstructor with default limits
    pub fn new() -> Self {
        Self::with_limits(ReconstructorLimits::default())
    }

    /// Create an empty reconstructor with custom limits
    pub fn with_limits(limits: ReconstructorLimits) -> Self {
        Self {
            limits,
            state: ReconstructorState::Empty,
            ur_type: None,
            info: None,
            blocks: Vec::new(),
            resolved: 0,
            mixed: Vec::new(),
            seen: HashSet::new(),
            fragments_seen: 0,
            result: None,
            failure: None,
        }
    }

    /// Drop all state and start over
    pub fn reset(&mut self) {
        *self = Self::with_limits(self.limits);
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReconstructorState {
        self.state
    }

    /// Whether the message has been resolved and verified
    pub fn is_complete(&self) -> bool {
        self.state == ReconstructorState::Complete
    }

    /// The reassembled message, once complete
    pub fn result(&self) -> Option<&Bytes> {
        self.result.as_ref()
    }

    /// The error that ended the transfer, if any
    pub fn failure(&self) -> Option<&ScanError> {
        self.failure.as_ref()
    }

    /// Message attributes established by the first accepted fragment
    pub fn message_info(&self) -> Option<&MessageInfo> {
        self.info.as_ref()
    }

    /// UR type established by the first accepted fragment
    pub fn ur_type(&self) -> Option<&str> {
        self.ur_type.as_deref()
    }

    /// Number of pure blocks the message needs
    pub fn expected_fragment_count(&self) -> usize {
        self.info.map_or(0, |info| info.total as usize)
    }

    /// Number of blocks resolved so far
    pub fn resolved_block_count(&self) -> usize {
        self.resolved
    }

    /// Distinct fragments that contributed information
    pub fn fragments_seen(&self) -> usize {
        self.fragments_seen
    }

    /// Mixed fragments waiting for more blocks
    pub fn pending_mixed_count(&self) -> usize {
        self.mixed.len()
    }

    /// Estimated completion in `[0, 1]`.
    ///
    /// Fountain transfers need more fragments than blocks, so progress is
    /// measured against the expected number of fragments, not resolved blocks.
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        match (self.state, self.info) {
            (ReconstructorState::Complete, _) => 1.0,
            (_, None) => 0.0,
            (_, Some(info)) => {
                let expected = f64::from(info.total) * PROGRESS_OVERHEAD;
                (self.fragments_seen as f64 / expected).min(PROGRESS_CEILING)
            }
        }
    }

    /// Feed one fragment.
    ///
    /// Foreign fragments and limit violations are returned as errors without
    /// touching any state. A corruption error moves the transfer to
    /// [`ReconstructorState::Failed`]; every later call returns it again
    /// until [`reset`](Self::reset).
    pub fn receive(&mut self, fragment: &Fragment) -> Result<ReceiveOutcome, ScanError> {
        match self.state {
            ReconstructorState::Complete => return Ok(ReceiveOutcome::AlreadyComplete),
            ReconstructorState::Failed => {
                if let Some(err) = &self.failure {
                    return Err(err.clone());
                }
            }
            _ => {}
        }

        self.check_limits(fragment)?;
        self.check_membership(fragment)?;

        let key = (fragment.seq_num, *blake3::hash(&fragment.data).as_bytes());
        if self.seen.contains(&key) {
            #[cfg(feature = "logging")]
            trace!("Duplicate fragment {}", fragment.seq_num);
            return Ok(ReceiveOutcome::Duplicate);
        }

        if self.info.is_none() {
            let info = fragment.message_info();
            #[cfg(feature = "logging")]
            debug!(
                "Starting transfer: {} blocks of {} bytes, message {} bytes",
                info.total, info.fragment_len, info.message_len
            );
            self.blocks = vec![None; info.total as usize];
            self.info = Some(info);
            self.ur_type = Some(fragment.ur_type.clone());
            self.state = ReconstructorState::Accumulating;
        }
        self.seen.insert(key);

        let outcome = if fragment.is_pure() {
            self.receive_pure(fragment)?
        } else {
            self.receive_mixed(fragment)?
        };

        if outcome == ReceiveOutcome::Redundant {
            return Ok(outcome);
        }
        self.fragments_seen += 1;

        if self.resolved == self.blocks.len() {
            self.finish()?;
            return Ok(ReceiveOutcome::Completed);
        }
        Ok(outcome)
    }

    fn check_limits(&self, fragment: &Fragment) -> Result<(), ScanError> {
        if fragment.seq_num == 0
            || fragment.seq_len == 0
            || fragment.seq_len > self.limits.max_fragment_count
        {
            return Err(ScanError::InvalidSequence {
                seq: u64::from(fragment.seq_num),
                total: u64::from(fragment.seq_len),
            });
        }
        if fragment.data.is_empty() {
            return Err(ScanError::InvalidFragment("empty fragment data".into()));
        }
        if fragment.message_len > self.limits.max_message_length {
            return Err(ScanError::InvalidFragment(format!(
                "message length {} exceeds limit {}",
                fragment.message_len, self.limits.max_message_length
            )));
        }
        let capacity = (fragment.seq_len as usize).saturating_mul(fragment.data.len());
        if fragment.message_len > capacity {
            return Err(ScanError::InvalidFragment(format!(
                "{} blocks of {} bytes cannot hold {} bytes",
                fragment.seq_len,
                fragment.data.len(),
                fragment.message_len
            )));
        }
        Ok(())
    }

    fn check_membership(&self, fragment: &Fragment) -> Result<(), ScanError> {
        if let Some(expected) = &self.ur_type {
            if *expected != fragment.ur_type {
                return Err(ScanError::ForeignType {
                    expected: expected.clone(),
                    actual: fragment.ur_type.clone(),
                });
            }
        }

        if let Some(info) = &self.info {
            let theirs = fragment.message_info();
            let checks: [(&'static str, u64, u64); 4] = [
                ("sequence length", u64::from(info.total), u64::from(theirs.total)),
                ("message length", info.message_len as u64, theirs.message_len as u64),
                ("checksum", u64::from(info.checksum), u64::from(theirs.checksum)),
                ("fragment length", info.fragment_len as u64, theirs.fragment_len as u64),
            ];
            for (field, expected, actual) in checks {
                if expected != actual {
                    #[cfg(feature = "logging")]
                    warn!("Dropping foreign fragment {}: {} differs", fragment.seq_num, field);
                    return Err(ScanError::ForeignMessage {
                        field,
                        expected,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    fn receive_pure(&mut self, fragment: &Fragment) -> Result<ReceiveOutcome, ScanError> {
        let index = fragment.seq_num as usize - 1;
        match &self.blocks[index] {
            Some(known) if *known == fragment.data => Ok(ReceiveOutcome::Redundant),
            Some(_) => Err(self.fail(ScanError::InconsistentFragment(fragment.seq_num))),
            None => {
                self.resolve(index, fragment.data.clone())?;
                Ok(ReceiveOutcome::Accepted)
            }
        }
    }

    fn receive_mixed(&mut self, fragment: &Fragment) -> Result<ReceiveOutcome, ScanError> {
        let mut data = fragment.data.to_vec();
        let mut pending = Vec::new();
        for index in fragment.indexes() {
            match &self.blocks[index] {
                Some(block) => xor_into(&mut data, block),
                None => pending.push(index),
            }
        }
        pending.sort_unstable();

        match pending.len() {
            0 => {
                if data.iter().all(|&b| b == 0) {
                    Ok(ReceiveOutcome::Redundant)
                } else {
                    Err(self.fail(ScanError::InconsistentFragment(fragment.seq_num)))
                }
            }
            1 => {
                #[cfg(feature = "logging")]
                trace!(
                    "Mixed fragment {} reduces to block {}",
                    fragment.seq_num,
                    pending[0]
                );
                self.resolve(pending[0], Bytes::from(data))?;
                Ok(ReceiveOutcome::Accepted)
            }
            _ => {
                if let Some(queued) = self.mixed.iter().find(|m| m.indexes == pending) {
                    if queued.data == data {
                        return Ok(ReceiveOutcome::Redundant);
                    }
                    return Err(self.fail(ScanError::InconsistentFragment(fragment.seq_num)));
                }
                self.mixed.push(MixedPart {
                    seq_num: fragment.seq_num,
                    indexes: pending,
                    data,
                });
                Ok(ReceiveOutcome::Accepted)
            }
        }
    }

    /// Store a newly resolved block and propagate it through the queue
    fn resolve(&mut self, index: usize, block: Bytes) -> Result<(), ScanError> {
        self.blocks[index] = Some(block);
        self.resolved += 1;

        let mut worklist = vec![index];
        while let Some(done) = worklist.pop() {
            let Some(block) = self.blocks[done].clone() else {
                continue;
            };

            let mut i = 0;
            while i < self.mixed.len() {
                let part = &mut self.mixed[i];
                let Some(pos) = part.indexes.iter().position(|&x| x == done) else {
                    i += 1;
                    continue;
                };
                xor_into(&mut part.data, &block);
                part.indexes.remove(pos);
                if part.indexes.len() > 1 {
                    i += 1;
                    continue;
                }

                let part = self.mixed.swap_remove(i);
                let target = part.indexes[0];
                match &self.blocks[target] {
                    Some(known) if known[..] == part.data[..] => {}
                    Some(_) => return Err(self.fail(ScanError::InconsistentFragment(part.seq_num))),
                    None => {
                        #[cfg(feature = "logging")]
                        trace!(
                            "Block {} unlocks block {} via fragment {}",
                            done,
                            target,
                            part.seq_num
                        );
                        self.blocks[target] = Some(Bytes::from(part.data));
                        self.resolved += 1;
                        worklist.push(target);
                    }
                }
            }
        }
        Ok(())
    }

    /// Join all blocks, strip padding and verify the message checksum
    fn finish(&mut self) -> Result<(), ScanError> {
        let Some(info) = self.info else {
            return Ok(());
        };

        let mut message = BytesMut::with_capacity(info.padded_len());
        for block in self.blocks.iter().flatten() {
            message.extend_from_slice(block);
        }
        if let Some(pos) = message[info.message_len..].iter().position(|&b| b != 0) {
            return Err(self.fail(ScanError::NonZeroPadding(info.message_len + pos)));
        }
        message.truncate(info.message_len);

        let actual = crc32(&message);
        if actual != info.checksum {
            return Err(self.fail(ScanError::ChecksumMismatch {
                expected: info.checksum,
                actual,
            }));
        }

        #[cfg(feature = "logging")]
        debug!(
            "Transfer complete: {} bytes from {} fragments",
            info.message_len, self.fragments_seen
        );

        self.mixed.clear();
        self.result = Some(message.freeze());
        self.state = ReconstructorState::Complete;
        Ok(())
    }

    fn fail(&mut self, err: ScanError) -> ScanError {
        #[cfg(feature = "logging")]
        warn!("Transfer failed: {:?}", err);
        self.state = ReconstructorState::Failed;
        self.failure = Some(err.clone());
        err
    }
}
