use anyhow::{bail, Result};
use colored::*;
use tracing::info;
use urscan_core::{
    envelope::{self, PayloadShape},
    locator, FountainReconstructor,
};

use super::read_parts;

const PREVIEW_LEN: usize = 64;

/// Reassemble the raw payload without interpreting it
pub fn reassemble(parts: &[String]) -> Result<Vec<u8>> {
    let mut rec = FountainReconstructor::new();
    for part in parts {
        let fragment = match urscan_core::decode_part(part) {
            Ok(urscan_core::UrPart::Multi(fragment)) => fragment,
            Ok(urscan_core::UrPart::Single { message, .. }) => return Ok(message.to_vec()),
            Err(err) => {
                info!("Skipping part: {}", err);
                continue;
            }
        };
        if let Err(err) = rec.receive(&fragment) {
            if !err.is_recoverable() {
                bail!("Reassembly failed: {}", err);
            }
        }
        if let Some(message) = rec.result() {
            return Ok(message.to_vec());
        }
    }
    bail!(
        "Transfer incomplete: {} of {} blocks resolved",
        rec.resolved_block_count(),
        rec.expected_fragment_count()
    )
}

/// One-line description of how a payload is packaged
pub fn describe(payload: &[u8]) -> String {
    let shape = match envelope::shape(payload) {
        PayloadShape::Wrapped { header_len, body_len } => format!(
            "CBOR byte string: {} byte header, {} byte body",
            header_len, body_len
        ),
        PayloadShape::Bare => "bare document (starts with PSBT magic)".to_string(),
        PayloadShape::Unrecognized => "unrecognized".to_string(),
    };
    match locator::locate(payload) {
        Ok(offset) => format!("{}; magic at offset {}", shape, offset),
        Err(_) => format!("{}; no PSBT magic", shape),
    }
}

pub fn execute(input: &str) -> Result<()> {
    let parts = read_parts(input)?;
    let payload = reassemble(&parts)?;

    println!("\n=== Payload ===");
    println!("Length:  {} bytes", payload.len());
    println!("Shape:   {}", describe(&payload));
    let preview = &payload[..payload.len().min(PREVIEW_LEN)];
    println!("Preview: {}", hex::encode(preview).cyan());

    match urscan_core::extract_psbt(&payload) {
        Ok(psbt) => println!("{} PSBT parses, txid {}", "✓".green(), psbt.txid()),
        Err(err) => println!("{} PSBT does not parse: {}", "✗".red(), err),
    }

    Ok(())
}
