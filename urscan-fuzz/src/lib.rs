//! Fuzz entry points for urscan-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_fragment

use urscan_core::{cbor::Reader, fragment::Fragment, Psbt, ScanSession};

pub fn fuzz_fragment(data: &[u8]) {
    // Raw CBOR body and, when it happens to be text, a whole token
    let _ = Fragment::from_cbor("crypto-psbt", data);
    if let Ok(text) = core::str::from_utf8(data) {
        let _ = urscan_core::decode_part(text);
    }
    let mut reader = Reader::new(data);
    while reader.read_head().is_ok() {}
}

pub fn fuzz_document(data: &[u8]) {
    let _ = urscan_core::extract_psbt(data);
    let _ = Psbt::parse(data);
}

/// Lines of the input are fed as scanned tokens
pub fn fuzz_session(data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    let mut session = ScanSession::new();
    for line in text.lines() {
        let _ = session.feed(line);
    }
    let _ = session.progress();
}
