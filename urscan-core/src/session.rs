//! End-to-end scan pipeline
//!
//! [`ScanSession`] takes raw tokens as a capture loop produces them and
//! drives them through every stage:
//!
//! ```text
//! token -> fragment -> reconstructor -> envelope -> locator -> PSBT -> txid
//! ```
//!
//! Per-token problems (unreadable tokens, parts of another transfer) are
//! counted and returned but leave the transfer intact. Anything after
//! reassembly fails the session until [`ScanSession::reset`].

use crate::envelope;
use crate::error::{ErrorKind, ScanError};
use crate::fragment::{decode_part, UrPart};
use crate::locator;
use crate::psbt::Psbt;
use crate::reconstructor::{FountainReconstructor, ReceiveOutcome, ReconstructorLimits};
use crate::types::Txid;
use alloc::string::String;
use bytes::Bytes;
use serde::Serialize;

#[cfg(feature = "logging")]
use tracing::{debug, info, warn};

/// Counters for one transfer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Tokens fed
    pub parts_seen: usize,

    /// Tokens that added information
    pub parts_accepted: usize,

    /// Tokens that failed to decode
    pub decode_failures: usize,

    /// Tokens belonging to another transfer
    pub foreign_parts: usize,

    /// Exact repeats
    pub duplicates: usize,

    /// Well-formed tokens that carried nothing new
    pub redundant: usize,
}

impl ScanStats {
    /// Share of tokens that added information, as a percentage
    #[allow(clippy::cast_precision_loss)]
    pub fn acceptance_rate(&self) -> f64 {
        if self.parts_seen == 0 {
            0.0
        } else {
            (self.parts_accepted as f64 / self.parts_seen as f64) * 100.0
        }
    }
}

/// Everything a completed scan produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// The reassembled message
    pub payload: Bytes,
    /// The PSBT found inside it
    pub psbt: Psbt,
    /// Txid of its unsigned transaction
    pub txid: Txid,
}

/// Unwrap, locate and parse the PSBT inside a reassembled payload
pub fn extract_psbt(payload: &[u8]) -> Result<Psbt, ScanError> {
    let body = envelope::unwrap(payload)?;
    let document = locator::document(body)?;
    Psbt::parse(document)
}

/// Txid of the PSBT inside a reassembled payload
pub fn txid_from_payload(payload: &[u8]) -> Result<Txid, ScanError> {
    extract_psbt(payload).map(|psbt| psbt.txid())
}

/// One scan: a reconstructor plus the stages after it
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    reconstructor: FountainReconstructor,
    single: Option<Bytes>,
    stats: ScanStats,
    result: Option<ScanResult>,
    failure: Option<ScanError>,
}

impl ScanSession {
    /// Start an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty session with custom reconstructor limits
    pub fn with_limits(limits: ReconstructorLimits) -> Self {
        Self {
            reconstructor: FountainReconstructor::with_limits(limits),
            ..Self::default()
        }
    }

    /// Abandon the current transfer
    pub fn reset(&mut self) {
        self.reconstructor.reset();
        self.single = None;
        self.stats = ScanStats::default();
        self.result = None;
        self.failure = None;
    }

    /// Decode one token and feed it.
    ///
    /// Recoverable errors (unreadable or foreign tokens) are counted and
    /// returned; the caller should log them and keep scanning.
    pub fn feed(&mut self, text: &str) -> Result<ReceiveOutcome, ScanError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let part = match decode_part(text) {
            Ok(part) => part,
            Err(err) => {
                #[cfg(feature = "logging")]
                warn!("Dropping unreadable token: {:?}", err);
                self.stats.parts_seen += 1;
                self.stats.decode_failures += 1;
                return Err(err);
            }
        };
        self.receive(part)
    }

    /// Feed an already decoded part
    pub fn receive(&mut self, part: UrPart) -> Result<ReceiveOutcome, ScanError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.stats.parts_seen += 1;
        if self.result.is_some() {
            self.stats.redundant += 1;
            return Ok(ReceiveOutcome::AlreadyComplete);
        }

        let outcome = match part {
            UrPart::Multi(fragment) => self.reconstructor.receive(&fragment),
            UrPart::Single { ur_type, message } => self.receive_single(ur_type, message),
        };

        match outcome {
            Ok(ReceiveOutcome::Completed) => {
                self.stats.parts_accepted += 1;
                self.finish()?;
                Ok(ReceiveOutcome::Completed)
            }
            Ok(outcome) => {
                match outcome {
                    ReceiveOutcome::Accepted => self.stats.parts_accepted += 1,
                    ReceiveOutcome::Duplicate => self.stats.duplicates += 1,
                    _ => self.stats.redundant += 1,
                }
                Ok(outcome)
            }
            Err(err) => {
                match err.kind() {
                    ErrorKind::Decode => self.stats.decode_failures += 1,
                    ErrorKind::ForeignMessage => self.stats.foreign_parts += 1,
                    _ => self.failure = Some(err.clone()),
                }
                Err(err)
            }
        }
    }

    /// A single-part token is the whole message; it only counts when no
    /// multipart transfer is under way
    fn receive_single(&mut self, ur_type: String, message: Bytes) -> Result<ReceiveOutcome, ScanError> {
        if self.result.is_some() || self.single.is_some() {
            return Ok(ReceiveOutcome::AlreadyComplete);
        }
        if let Some(info) = self.reconstructor.message_info() {
            if let Some(expected) = self.reconstructor.ur_type() {
                if expected != ur_type {
                    return Err(ScanError::ForeignType {
                        expected: expected.into(),
                        actual: ur_type,
                    });
                }
            }
            return Err(ScanError::ForeignMessage {
                field: "sequence length",
                expected: u64::from(info.total),
                actual: 1,
            });
        }
        self.single = Some(message);
        Ok(ReceiveOutcome::Completed)
    }

    /// Run the post-reassembly stages once
    fn finish(&mut self) -> Result<(), ScanError> {
        let Some(payload) = self.single.clone().or_else(|| self.reconstructor.result().cloned())
        else {
            return Ok(());
        };

        match extract_psbt(&payload) {
            Ok(psbt) => {
                let txid = psbt.txid();
                #[cfg(feature = "logging")]
                info!("Scan complete: txid {}", txid);
                self.result = Some(ScanResult { payload, psbt, txid });
                Ok(())
            }
            Err(err) => {
                #[cfg(feature = "logging")]
                debug!("Payload of {} bytes carries no usable PSBT: {:?}", payload.len(), err);
                self.result = None;
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Estimated completion in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.result.is_some() {
            1.0
        } else {
            self.reconstructor.progress()
        }
    }

    /// Whether a PSBT has been extracted
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// The scan result, once complete
    pub fn result(&self) -> Option<&ScanResult> {
        self.result.as_ref()
    }

    /// The error that ended the session, if any
    pub fn failure(&self) -> Option<&ScanError> {
        self.failure.as_ref()
    }

    /// Counters so far
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// The underlying reconstructor
    pub fn reconstructor(&self) -> &FountainReconstructor {
        &self.reconstructor
    }
}
