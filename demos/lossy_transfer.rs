//! Example demonstrating recovery from a lossy animated QR transfer

use bytes::Bytes;
use urscan_core::{
    cbor::write_bytes,
    compact::write_compact_size,
    constants::PSBT_MAGIC,
    tx::{OutPoint, TxIn, TxOut},
    FountainEncoder, ScanSession, Transaction,
};

fn pair(doc: &mut Vec<u8>, key: &[u8], value: &[u8]) {
    write_compact_size(doc, key.len() as u64);
    doc.extend_from_slice(key);
    write_compact_size(doc, value.len() as u64);
    doc.extend_from_slice(value);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("urscan Lossy Transfer Example\n");

    // Step 1: Build a small PSBT and wrap it the way wallets do
    println!("Step 1: Building PSBT...");
    let tx = Transaction {
        version: 2,
        inputs: (0..3)
            .map(|i| TxIn {
                previous_output: OutPoint {
                    txid: [0x11 * (i + 1); 32],
                    vout: u32::from(i),
                },
                sequence: 0xffff_fffd,
            })
            .collect(),
        outputs: vec![
            TxOut {
                value: 150_000,
                script_pubkey: Bytes::from_static(&[0x00, 0x14, 0xaa, 0xbb]),
            },
            TxOut {
                value: 49_000,
                script_pubkey: Bytes::from_static(&[0x00, 0x14, 0xcc, 0xdd]),
            },
        ],
        lock_time: 0,
    };

    let mut document = PSBT_MAGIC.to_vec();
    pair(&mut document, &[0x00], &tx.serialize());
    document.push(0);
    for _ in &tx.inputs {
        pair(&mut document, &[0x01], &[0x42; 43]);
        document.push(0);
    }
    for _ in &tx.outputs {
        document.push(0);
    }
    let mut payload = Vec::new();
    write_bytes(&mut payload, &document);
    println!("Payload: {} bytes\n", payload.len());

    // Step 2: Animate it
    let mut encoder = FountainEncoder::new("crypto-psbt", &payload, 60)?;
    println!("Step 2: Animating {} fragments", encoder.seq_len());

    // Step 3: Lose half of the frames, scan the rest twice
    println!("Step 3: Scanning with every other frame lost...\n");
    let mut session = ScanSession::new();
    let mut shown = 0u32;
    while !session.is_complete() && shown < 500 {
        let part = encoder.next_part();
        shown += 1;
        if shown % 2 == 0 {
            continue;
        }
        for _ in 0..2 {
            let outcome = session.feed(&part)?;
            println!("  frame {:3}: {:?}", shown, outcome);
        }
    }

    let stats = session.stats();
    println!("\nFrames shown: {}", shown);
    println!("Parts scanned: {}", stats.parts_seen);
    println!("Accepted: {}", stats.parts_accepted);
    println!("Duplicates: {}", stats.duplicates);
    println!("Redundant: {}", stats.redundant);

    match session.result() {
        Some(result) => {
            println!("\ntxid: {}", result.txid);
            println!("matches: {}", result.txid == tx.txid());
        }
        None => println!("\nTransfer did not complete"),
    }

    Ok(())
}
