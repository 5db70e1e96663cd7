use std::fs;
use tempfile::tempdir;

use urscan_cli::commands::{self, debug, decode, encode, inspect};

const PART_1: &str = "UR:CRYPTO-PSBT/1-2/LPADAOCFADGSCYJPRSDMRLHDOLHKADGAJOJKIDJYZMADAEJSAOAEAEAEADRPCFTSSBLRRFNETOLKMNMSNSDSGTGDDNCYPTENMOFNOLFGZEIATIMDPEWPNDLTTTAEAEAEAEAEZMZMZMZMAOBEDIAEAEAEAEAEAECMAEBBDWLFLFBSNDONNNCFLUFDROCWINWMFMLTBZLFONCYPMUODWAEAEAEAEAECMAEBBQZCSNTEMJKMDZESRRPAYGDDSFYNNPRUENBTNBYOSAEAEAEAEAEADADCTGWAADPAEAEAEAEAECMAEBBINWEJTKNNTESSRDYOEBBBWFSTNCSFGDABNKPHLLYADAYJEAOFLDYFYKEJLCLEM";
const PART_2: &str = "UR:CRYPTO-PSBT/2-2/LPAOAOCFADGSCYJPRSDMRLHDOLAOCXETSAIYLPRYTKCXKGGTCNKIYKBZBWGRRTBZTSAORTWSETYLKNJTMDMDUELRNLISFMAOCXJLMHOXIHHGTLHNATVSPDJSLGYNWLVYMKVWIHUYWSEEDKMWDYVELPJLMUWSUOEOPYADCLAXOSWYKNBTWPAHKGJKAAPTPYLPRSQDHPRLCEJYRFFSVANYCXKSIYIEPMISURWDZCWPAEAECPAOAXGMMSPLOLWLMUDAJLKGURZOFRTYTSAODADTMUAMHDMSMWPAWLDYLYZMBAKGPEPRRYCSAEAEAEAEGHAEAELAAEAEAELAAEAEAELAADAEAEAEAEAEAEAEAECWMTFEFD";
const KNOWN_TXID: &str = "6b2905e0ed18886aa272f9095dc8c7621cc8712f6eaf7495995abeb4c5a101f7";

/// Helper: write the known two-part transfer, second part first, with noise
fn write_known_parts(path: &std::path::Path) {
    let text = format!("{}\n\nnot a part\n  {}  \n", PART_2, PART_1);
    fs::write(path, text).unwrap();
}

#[test]
fn test_read_parts_skips_blank_lines() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("parts.txt");
    write_known_parts(&input_path);

    let parts = commands::read_parts(input_path.to_str().unwrap()).unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[2], PART_1);
}

#[test]
fn test_decode_writes_report() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("parts.txt");
    let output_path = td.path().join("report.json");
    write_known_parts(&input_path);

    decode::execute(
        input_path.to_str().unwrap(),
        Some(output_path.to_str().unwrap()),
        false,
    )
    .unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(report["txid"], KNOWN_TXID);
    assert_eq!(report["payload_len"], 332);
    assert_eq!(report["psbt_len"], 329);
    assert_eq!(report["inputs"], 1);
    assert_eq!(report["outputs"], 2);
    assert_eq!(report["stats"]["decode_failures"], 1);
}

#[test]
fn test_decode_incomplete_transfer_fails() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("half.txt");
    fs::write(&input_path, PART_1).unwrap();

    assert!(decode::execute(input_path.to_str().unwrap(), None, false).is_err());
}

#[test]
fn test_decode_missing_file() {
    let td = tempdir().unwrap();
    let missing = td.path().join("nope.txt");
    let err = decode::execute(missing.to_str().unwrap(), None, false).unwrap_err();
    assert!(err.to_string().contains("Failed to read input file"));
}

#[test]
fn test_inspect_structure() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("parts.txt");
    let output_path = td.path().join("psbt.json");
    write_known_parts(&input_path);

    inspect::execute(
        input_path.to_str().unwrap(),
        Some(output_path.to_str().unwrap()),
    )
    .unwrap();

    let view: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(view["txid"], KNOWN_TXID);
    assert_eq!(view["version"], 0);
    assert_eq!(view["len"], 329);

    let maps = view["maps"].as_array().unwrap();
    // global, one input, two outputs
    assert_eq!(maps.len(), 4);
    assert_eq!(maps[0]["entries"][0]["key_type"], 0);
    assert_eq!(maps[0]["entries"][0]["offset"], 5);
    assert_eq!(maps[0]["entries"][0]["value_len"], 113);
    assert_eq!(maps[1]["entries"].as_array().unwrap().len(), 2);
    assert!(maps[2]["entries"].as_array().unwrap().is_empty());
    assert_eq!(maps[3]["entries"][0]["key_type"], 2);
    assert_eq!(maps[3]["entries"][0]["key_data"].as_str().unwrap().len(), 66);
}

#[test]
fn test_encode_then_decode() {
    let td = tempdir().unwrap();
    let known_path = td.path().join("known.txt");
    write_known_parts(&known_path);

    // Recover the known document, re-encode it in smaller parts
    let payload = debug::reassemble(&commands::read_parts(known_path.to_str().unwrap()).unwrap())
        .unwrap();
    let psbt_path = td.path().join("tx.psbt");
    fs::write(&psbt_path, &payload[3..]).unwrap();

    let parts_path = td.path().join("parts.txt");
    encode::execute(
        psbt_path.to_str().unwrap(),
        parts_path.to_str().unwrap(),
        "crypto-psbt",
        40,
        5,
    )
    .unwrap();

    let parts = commands::read_parts(parts_path.to_str().unwrap()).unwrap();
    assert_eq!(parts.len(), 9 + 5);
    assert!(parts.iter().all(|p| p.starts_with("ur:crypto-psbt/")));

    let session = commands::scan_parts(&parts, false).unwrap();
    assert_eq!(session.result().unwrap().txid.to_string(), KNOWN_TXID);
}

#[test]
fn test_encode_accepts_hex() {
    let td = tempdir().unwrap();
    let known_path = td.path().join("known.txt");
    write_known_parts(&known_path);
    let payload = debug::reassemble(&commands::read_parts(known_path.to_str().unwrap()).unwrap())
        .unwrap();

    let hex_path = td.path().join("tx.hex");
    fs::write(&hex_path, format!("{}\n", hex::encode(&payload[3..]))).unwrap();
    let parts_path = td.path().join("parts.txt");
    encode::execute(
        hex_path.to_str().unwrap(),
        parts_path.to_str().unwrap(),
        "crypto-psbt",
        1000,
        0,
    )
    .unwrap();

    // Fits in one part
    let parts = commands::read_parts(parts_path.to_str().unwrap()).unwrap();
    assert_eq!(parts.len(), 1);
    let session = commands::scan_parts(&parts, false).unwrap();
    assert_eq!(session.result().unwrap().txid.to_string(), KNOWN_TXID);
}

#[test]
fn test_debug_describes_payload() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("parts.txt");
    write_known_parts(&input_path);

    let parts = commands::read_parts(input_path.to_str().unwrap()).unwrap();
    let payload = debug::reassemble(&parts).unwrap();
    assert_eq!(payload.len(), 332);
    assert_eq!(
        debug::describe(&payload),
        "CBOR byte string: 3 byte header, 329 byte body; magic at offset 3"
    );
    assert!(debug::describe(b"garbage").ends_with("no PSBT magic"));

    debug::execute(input_path.to_str().unwrap()).unwrap();
}
