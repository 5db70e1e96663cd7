use anyhow::{bail, Context, Result};
use colored::*;
use serde::Serialize;
use std::fs;
use tracing::info;
use urscan_core::ScanStats;

use super::{read_parts, scan_parts};

#[derive(Serialize)]
struct DecodeReport {
    txid: String,
    payload_len: usize,
    psbt_len: usize,
    inputs: usize,
    outputs: usize,
    stats: ScanStats,
}

pub fn execute(input: &str, output: Option<&str>, show_progress: bool) -> Result<()> {
    info!("Decoding parts from: {}", input);

    let parts = read_parts(input)?;
    info!("Read {} parts", parts.len());

    let session = scan_parts(&parts, show_progress)?;
    let stats = session.stats().clone();

    let Some(result) = session.result() else {
        println!("{} Transfer incomplete", "✗".red());
        println!("Progress:          {:.0}%", session.progress() * 100.0);
        println!("Parts read:        {}", stats.parts_seen);
        println!("Unreadable:        {}", stats.decode_failures);
        println!("Foreign:           {}", stats.foreign_parts);
        bail!("Not enough parts to reassemble the transfer ({} read)", parts.len());
    };

    let report = DecodeReport {
        txid: result.txid.to_string(),
        payload_len: result.payload.len(),
        psbt_len: result.psbt.len,
        inputs: result.psbt.inputs.len(),
        outputs: result.psbt.outputs.len(),
        stats,
    };

    println!("\n=== Decode Results ===");
    println!("Parts read:        {}", report.stats.parts_seen);
    println!("Accepted:          {}", report.stats.parts_accepted);
    println!("Duplicates:        {}", report.stats.duplicates);
    println!("Acceptance rate:   {:.2}%", report.stats.acceptance_rate());
    println!("Payload:           {} bytes", report.payload_len);
    println!("Inputs / outputs:  {} / {}", report.inputs, report.outputs);
    println!("{} txid {}", "✓".green(), report.txid.bold());

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&report)
            .with_context(|| "Failed to serialize decode report")?;
        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;
        info!("Report written to: {}", output_path);
    }

    Ok(())
}
