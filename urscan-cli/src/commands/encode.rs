use anyhow::{Context, Result};
use std::fs;
use tracing::{info, warn};
use urscan_core::{cbor::write_bytes, constants::PSBT_MAGIC, FountainEncoder, Psbt};

/// Wrap `document` in a CBOR byte string and render `seq_len + extra` parts
pub fn encode_parts(
    document: &[u8],
    ur_type: &str,
    max_fragment_len: usize,
    extra: u32,
) -> Result<Vec<String>> {
    let mut payload = Vec::with_capacity(document.len() + 9);
    write_bytes(&mut payload, document);

    let mut encoder = FountainEncoder::new(ur_type, &payload, max_fragment_len)
        .with_context(|| format!("Cannot split {} bytes", payload.len()))?;
    if encoder.is_single_part() {
        return Ok(vec![encoder.next_part()]);
    }

    let count = encoder.seq_len().saturating_add(extra);
    Ok((0..count).map(|_| encoder.next_part()).collect())
}

pub fn execute(
    input: &str,
    output: &str,
    ur_type: &str,
    max_fragment_len: usize,
    extra: u32,
) -> Result<()> {
    info!("Encoding PSBT from: {}", input);

    let raw = fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;
    // Accept the hex form wallets export as well as raw bytes
    let document = if raw.starts_with(PSBT_MAGIC) {
        raw
    } else {
        let text = String::from_utf8_lossy(&raw);
        hex::decode(text.trim()).with_context(|| format!("{} is neither a PSBT nor hex", input))?
    };

    match Psbt::parse(&document) {
        Ok(psbt) => info!("PSBT txid: {}", psbt.txid()),
        Err(err) => warn!("Input does not parse as a PSBT: {}", err),
    }

    let parts = encode_parts(&document, ur_type, max_fragment_len, extra)?;
    let mut text = parts.join("\n");
    text.push('\n');
    fs::write(output, text).with_context(|| format!("Failed to write output file: {}", output))?;

    println!("Wrote {} parts to {}", parts.len(), output);
    Ok(())
}
