//! Integration tests for the complete token → payload → PSBT → txid flow

use bytes::Bytes;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use urscan_core::{
    cbor::write_bytes,
    compact::write_compact_size,
    constants::PSBT_MAGIC,
    extract_psbt,
    tx::{OutPoint, TxIn, TxOut},
    ErrorKind, FountainEncoder, ReceiveOutcome, ScanError, ScanSession, Transaction,
};

const PART_1: &str = "UR:CRYPTO-PSBT/1-2/LPADAOCFADGSCYJPRSDMRLHDOLHKADGAJOJKIDJYZMADAEJSAOAEAEAEADRPCFTSSBLRRFNETOLKMNMSNSDSGTGDDNCYPTENMOFNOLFGZEIATIMDPEWPNDLTTTAEAEAEAEAEZMZMZMZMAOBEDIAEAEAEAEAEAECMAEBBDWLFLFBSNDONNNCFLUFDROCWINWMFMLTBZLFONCYPMUODWAEAEAEAEAECMAEBBQZCSNTEMJKMDZESRRPAYGDDSFYNNPRUENBTNBYOSAEAEAEAEAEADADCTGWAADPAEAEAEAEAECMAEBBINWEJTKNNTESSRDYOEBBBWFSTNCSFGDABNKPHLLYADAYJEAOFLDYFYKEJLCLEM";
const PART_2: &str = "UR:CRYPTO-PSBT/2-2/LPAOAOCFADGSCYJPRSDMRLHDOLAOCXETSAIYLPRYTKCXKGGTCNKIYKBZBWGRRTBZTSAORTWSETYLKNJTMDMDUELRNLISFMAOCXJLMHOXIHHGTLHNATVSPDJSLGYNWLVYMKVWIHUYWSEEDKMWDYVELPJLMUWSUOEOPYADCLAXOSWYKNBTWPAHKGJKAAPTPYLPRSQDHPRLCEJYRFFSVANYCXKSIYIEPMISURWDZCWPAEAECPAOAXGMMSPLOLWLMUDAJLKGURZOFRTYTSAODADTMUAMHDMSMWPAWLDYLYZMBAKGPEPRRYCSAEAEAEAEGHAEAELAAEAEAELAAEAEAELAADAEAEAEAEAEAEAEAECWMTFEFD";
const KNOWN_TXID: &str = "6b2905e0ed18886aa272f9095dc8c7621cc8712f6eaf7495995abeb4c5a101f7";

fn pair(doc: &mut Vec<u8>, key: &[u8], value: &[u8]) {
    write_compact_size(doc, key.len() as u64);
    doc.extend_from_slice(key);
    write_compact_size(doc, value.len() as u64);
    doc.extend_from_slice(value);
}

fn sample_tx(inputs: usize, outputs: usize) -> Transaction {
    Transaction {
        version: 2,
        inputs: (0..inputs)
            .map(|i| TxIn {
                previous_output: OutPoint {
                    txid: [i as u8 + 1; 32],
                    vout: i as u32,
                },
                sequence: 0xffff_fffd,
            })
            .collect(),
        outputs: (0..outputs)
            .map(|i| TxOut {
                value: 1_000 * (i as u64 + 1),
                script_pubkey: Bytes::from(vec![0x00, 0x14, i as u8, 0xaa]),
            })
            .collect(),
        lock_time: 840_000,
    }
}

/// PSBT with one witness UTXO per input and one derivation per output
fn sample_psbt(tx: &Transaction) -> Vec<u8> {
    let mut doc = PSBT_MAGIC.to_vec();
    pair(&mut doc, &[0x00], &tx.serialize());
    doc.push(0);
    for i in 0..tx.inputs.len() {
        pair(&mut doc, &[0x01], &[i as u8; 31]);
        doc.push(0);
    }
    for i in 0..tx.outputs.len() {
        let mut key = vec![0x02];
        key.extend_from_slice(&[i as u8; 33]);
        pair(&mut doc, &key, &[0u8; 20]);
        doc.push(0);
    }
    doc
}

fn wrap(document: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    write_bytes(&mut payload, document);
    payload
}

#[test]
fn test_known_vector_either_order() {
    for order in [[PART_1, PART_2], [PART_2, PART_1]] {
        let mut session = ScanSession::new();
        for part in order {
            session.feed(part).unwrap();
        }
        assert!(session.is_complete());
        assert_eq!(session.result().unwrap().txid.to_string(), KNOWN_TXID);
    }
}

#[test]
fn test_known_vector_lowercase_with_noise() {
    let mut session = ScanSession::new();
    let noise = ["", "hello", "ur:crypto-psbt/3-2/aeae", PART_1];
    for token in noise {
        let _ = session.feed(token);
    }
    assert!(!session.is_complete());
    session.feed(&PART_2.to_lowercase()).unwrap();
    assert_eq!(session.result().unwrap().txid.to_string(), KNOWN_TXID);
    assert_eq!(session.stats().decode_failures, 3);
}

#[test]
fn test_synthetic_psbt_round_trip() {
    let tx = sample_tx(3, 4);
    let document = sample_psbt(&tx);
    let payload = wrap(&document);

    let mut encoder = FountainEncoder::new("crypto-psbt", &payload, 40).unwrap();
    assert!(encoder.seq_len() > 2);

    let mut session = ScanSession::new();
    for _ in 0..encoder.seq_len() {
        session.feed(&encoder.next_part()).unwrap();
    }
    let result = session.result().unwrap();
    assert_eq!(result.payload.as_ref(), &payload[..]);
    assert_eq!(result.txid, tx.txid());
    assert_eq!(result.psbt.unsigned_tx, tx);
    assert_eq!(result.psbt.unsigned_tx.serialize(), tx.serialize());
    assert_eq!(result.psbt.inputs.len(), 3);
    assert_eq!(result.psbt.outputs.len(), 4);
}

#[test]
fn test_lossy_transfer_with_mixed_parts() {
    let tx = sample_tx(2, 2);
    let payload = wrap(&sample_psbt(&tx));
    let mut encoder = FountainEncoder::new("crypto-psbt", &payload, 30).unwrap();

    let mut session = ScanSession::new();
    let mut sent = 0;
    while !session.is_complete() {
        assert!(sent < 1000, "transfer did not converge");
        let part = encoder.next_part();
        sent += 1;
        // Drop every third part, feed the rest twice
        if sent % 3 == 0 {
            continue;
        }
        session.feed(&part).unwrap();
        let again = session.feed(&part).unwrap();
        assert!(matches!(
            again,
            ReceiveOutcome::Duplicate | ReceiveOutcome::AlreadyComplete
        ));
    }
    assert_eq!(session.result().unwrap().txid, tx.txid());
}

#[test]
fn test_random_loss_and_reordering() {
    let tx = sample_tx(4, 3);
    let payload = wrap(&sample_psbt(&tx));
    let encoder = FountainEncoder::new("crypto-psbt", &payload, 25).unwrap();
    let total = encoder.seq_len();

    for seed in 0..8u64 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        // A long broadcast, a third of it lost, the rest shuffled
        let mut parts: Vec<String> = (1..=total * 4)
            .filter(|_| rng.gen_range(0..3) != 0)
            .map(|seq| encoder.fragment_at(seq).encode())
            .collect();
        parts.shuffle(&mut rng);

        let mut session = ScanSession::new();
        for part in &parts {
            session.feed(part).unwrap();
            if session.is_complete() {
                break;
            }
        }
        assert_eq!(session.result().unwrap().txid, tx.txid(), "seed {}", seed);
    }
}

#[test]
fn test_missing_magic() {
    let payload = wrap(b"a perfectly valid byte string without any document");
    let mut encoder = FountainEncoder::new("crypto-psbt", &payload, 20).unwrap();

    let mut session = ScanSession::new();
    let mut last = Ok(ReceiveOutcome::Accepted);
    for _ in 0..encoder.seq_len() {
        last = session.feed(&encoder.next_part());
    }
    let err = last.unwrap_err();
    assert_eq!(err, ScanError::MagicNotFound);
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!session.is_complete());
}

#[test]
fn test_truncated_document() {
    let tx = sample_tx(1, 1);
    let mut document = sample_psbt(&tx);
    // Cut into the last value; the envelope length matches the cut document
    document.truncate(document.len() - 10);

    let err = extract_psbt(&wrap(&document)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompleteDocument);
    match err {
        ScanError::IncompleteDocument {
            expected, actual, ..
        } => {
            assert_eq!(expected, 20);
            assert_eq!(actual, 11);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_envelope_bounds_the_document() {
    let tx = sample_tx(1, 1);
    let document = sample_psbt(&tx);
    let mut payload = Vec::new();
    // Envelope declares fewer bytes than the document needs
    write_bytes(&mut payload, &document[..document.len() - 1]);
    payload.push(0);

    assert_eq!(
        extract_psbt(&payload).unwrap_err().kind(),
        ErrorKind::IncompleteDocument
    );
}

#[test]
fn test_corrupted_fragment_is_detected() {
    let payload = wrap(&sample_psbt(&sample_tx(1, 2)));
    let encoder = FountainEncoder::new("crypto-psbt", &payload, 50).unwrap();
    let total = encoder.seq_len();

    for victim in 1..=total {
        let mut session = ScanSession::new();
        let mut last = Ok(ReceiveOutcome::Accepted);
        for seq in 1..=total {
            let mut fragment = encoder.fragment_at(seq);
            if seq == victim {
                let mut data = fragment.data.to_vec();
                data[0] ^= 0x80;
                fragment.data = Bytes::from(data);
            }
            last = session.feed(&fragment.encode());
        }
        let err = last.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corruption, "victim {}", victim);
        assert!(session.result().is_none());
    }
}

#[test]
fn test_corrupted_padding_is_detected() {
    let payload = wrap(&sample_psbt(&sample_tx(1, 2)));
    let mut checked = 0;

    for max_len in 30..60 {
        let encoder = FountainEncoder::new("crypto-psbt", &payload, max_len).unwrap();
        let total = encoder.seq_len();
        if encoder.fragment_len() * total as usize == payload.len() {
            continue;
        }
        checked += 1;

        let mut session = ScanSession::new();
        let mut last = Ok(ReceiveOutcome::Accepted);
        for seq in 1..=total {
            let mut fragment = encoder.fragment_at(seq);
            if seq == total {
                let mut data = fragment.data.to_vec();
                let end = data.len() - 1;
                data[end] ^= 0x55;
                fragment.data = Bytes::from(data);
            }
            last = session.feed(&fragment.encode());
        }
        let err = last.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corruption, "max_len {}", max_len);
        assert!(session.result().is_none());
    }
    assert!(checked > 0);
}

#[test]
fn test_duplicate_key_in_document() {
    let tx = sample_tx(1, 1);
    let mut document = PSBT_MAGIC.to_vec();
    pair(&mut document, &[0x00], &tx.serialize());
    pair(&mut document, &[0x00], &tx.serialize());
    document.push(0);

    let err = extract_psbt(&wrap(&document)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    assert!(!err.is_recoverable());
}

#[test]
fn test_reset_starts_new_transfer() {
    let mut session = ScanSession::new();
    session.feed(PART_1).unwrap();

    let payload = wrap(&sample_psbt(&sample_tx(1, 1)));
    let mut encoder = FountainEncoder::new("crypto-psbt", &payload, 60).unwrap();
    assert!(session.feed(&encoder.next_part()).is_err());

    session.reset();
    assert_eq!(session.progress(), 0.0);
    let mut encoder2 = FountainEncoder::new("crypto-psbt", &payload, 60).unwrap();
    for _ in 0..encoder2.seq_len() {
        session.feed(&encoder2.next_part()).unwrap();
    }
    assert!(session.is_complete());
}
