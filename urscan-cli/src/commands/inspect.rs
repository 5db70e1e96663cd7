use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use tracing::info;
use urscan_core::{psbt::PsbtMap, Psbt, Section};

use super::{read_parts, scan_parts};

#[derive(Serialize)]
pub struct EntryView {
    pub offset: usize,
    pub key_type: u64,
    pub key_data: String,
    pub value_len: usize,
}

#[derive(Serialize)]
pub struct MapView {
    pub section: Section,
    pub entries: Vec<EntryView>,
}

#[derive(Serialize)]
pub struct InputView {
    pub txid: String,
    pub vout: u32,
    pub sequence: u32,
}

#[derive(Serialize)]
pub struct OutputView {
    pub value: u64,
    pub script_pubkey: String,
}

#[derive(Serialize)]
pub struct PsbtView {
    pub txid: String,
    pub version: u32,
    pub len: usize,
    pub tx_version: i32,
    pub lock_time: u32,
    pub inputs: Vec<InputView>,
    pub outputs: Vec<OutputView>,
    pub total_output_value: Option<u64>,
    pub maps: Vec<MapView>,
}

fn map_view(map: &PsbtMap) -> MapView {
    MapView {
        section: map.section,
        entries: map
            .entries
            .iter()
            .map(|kv| EntryView {
                offset: kv.offset,
                key_type: kv.key_type,
                key_data: hex::encode(&kv.key_data),
                value_len: kv.value.len(),
            })
            .collect(),
    }
}

/// JSON-friendly view of a parsed PSBT
pub fn view(psbt: &Psbt) -> PsbtView {
    let tx = &psbt.unsigned_tx;
    PsbtView {
        txid: psbt.txid().to_string(),
        version: psbt.version,
        len: psbt.len,
        tx_version: tx.version,
        lock_time: tx.lock_time,
        inputs: tx
            .inputs
            .iter()
            .map(|txin| {
                // Outpoint hashes are shown in display order, like txids
                let mut txid = txin.previous_output.txid;
                txid.reverse();
                InputView {
                    txid: hex::encode(txid),
                    vout: txin.previous_output.vout,
                    sequence: txin.sequence,
                }
            })
            .collect(),
        outputs: tx
            .outputs
            .iter()
            .map(|txout| OutputView {
                value: txout.value,
                script_pubkey: hex::encode(&txout.script_pubkey),
            })
            .collect(),
        total_output_value: tx.total_output_value(),
        maps: psbt.maps().map(map_view).collect(),
    }
}

pub fn execute(input: &str, output: Option<&str>) -> Result<()> {
    info!("Inspecting parts from: {}", input);

    let parts = read_parts(input)?;
    let session = scan_parts(&parts, false)?;
    let Some(result) = session.result() else {
        bail!(
            "Transfer incomplete after {} parts ({:.0}%)",
            parts.len(),
            session.progress() * 100.0
        );
    };

    let json = serde_json::to_string_pretty(&view(&result.psbt))
        .with_context(|| "Failed to serialize PSBT structure")?;

    match output {
        Some(output_path) => {
            fs::write(output_path, json)
                .with_context(|| format!("Failed to write output file: {}", output_path))?;
            info!("PSBT structure written to: {}", output_path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
