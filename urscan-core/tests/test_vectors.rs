//! Pinned protocol vectors
//!
//! Block selection, the generator behind it and the bytewords alphabet are
//! shared with every other UR implementation. These vectors catch any drift.

use urscan_core::{
    bytewords::{self, Style},
    fountain::{choose_fragments, fragment_length, partition},
    fragment, Psbt, UrPart,
    xoshiro::Xoshiro256,
};

const PART_1: &str = "UR:CRYPTO-PSBT/1-2/LPADAOCFADGSCYJPRSDMRLHDOLHKADGAJOJKIDJYZMADAEJSAOAEAEAEADRPCFTSSBLRRFNETOLKMNMSNSDSGTGDDNCYPTENMOFNOLFGZEIATIMDPEWPNDLTTTAEAEAEAEAEZMZMZMZMAOBEDIAEAEAEAEAEAECMAEBBDWLFLFBSNDONNNCFLUFDROCWINWMFMLTBZLFONCYPMUODWAEAEAEAEAECMAEBBQZCSNTEMJKMDZESRRPAYGDDSFYNNPRUENBTNBYOSAEAEAEAEAEADADCTGWAADPAEAEAEAEAECMAEBBINWEJTKNNTESSRDYOEBBBWFSTNCSFGDABNKPHLLYADAYJEAOFLDYFYKEJLCLEM";
const PART_2: &str = "UR:CRYPTO-PSBT/2-2/LPAOAOCFADGSCYJPRSDMRLHDOLAOCXETSAIYLPRYTKCXKGGTCNKIYKBZBWGRRTBZTSAORTWSETYLKNJTMDMDUELRNLISFMAOCXJLMHOXIHHGTLHNATVSPDJSLGYNWLVYMKVWIHUYWSEEDKMWDYVELPJLMUWSUOEOPYADCLAXOSWYKNBTWPAHKGJKAAPTPYLPRSQDHPRLCEJYRFFSVANYCXKSIYIEPMISURWDZCWPAEAECPAOAXGMMSPLOLWLMUDAJLKGURZOFRTYTSAODADTMUAMHDMSMWPAWLDYLYZMBAKGPEPRRYCSAEAEAEAEGHAEAELAAEAEAELAAEAEAELAADAEAEAEAEAEAEAEAECWMTFEFD";

fn make_message(seed: &str, size: usize) -> Vec<u8> {
    Xoshiro256::from_seed_bytes(seed.as_bytes()).next_data(size)
}

fn crc32(data: &[u8]) -> u32 {
    bytewords::crc32(data)
}

#[test]
fn test_xoshiro_reference_outputs() {
    let mut rng = Xoshiro256::from_seed_bytes(b"Wolf");
    let got: Vec<u64> = (0..10).map(|_| rng.next_u64() % 100).collect();
    assert_eq!(got, [42, 81, 85, 8, 82, 84, 76, 73, 70, 88]);
}

#[test]
fn test_message_checksum() {
    let message = make_message("Wolf", 1024);
    assert_eq!(crc32(&message), 0x2f19_f3bb);
}

#[test]
fn test_partition_reference_blocks() {
    let message = make_message("Wolf", 1024);
    let len = fragment_length(message.len(), 100);
    let blocks = partition(&message, len);
    assert_eq!(blocks.len(), 11);
    assert_eq!(
        hex::encode(&blocks[0]),
        "916ec65cf77cadf55cd7f9cda1a1030026ddd42e905b77adc36e4f2d3ccba44f7f04f2de44f42d84c374a0e149136f25b01852545961d55f7f7a8cde6d0e2ec43f3b2dcb644a2209e8c9e34af5c4747984a5e873c9cf5f965e25ee29039f"
    );
    assert_eq!(
        hex::encode(&blocks[10]),
        "170010067e2e75ebe2d2904aeb1f89d5dc98cd4a6f2faaa8be6d03354c990fd895a97feb54668473e9d942bb99e196d897e8f1b01625cf48a7b78d249bb4985c065aa8cd1402ed2ba1b6f908f63dcd84b66425df00000000000000000000"
    );
}

#[test]
fn test_mixed_fragment_selection() {
    let message = make_message("Wolf", 1024);
    let checksum = crc32(&message);
    let cases: [(u32, &[usize]); 6] = [
        (13, &[2, 5, 6, 8, 9, 10]),
        (15, &[1, 5]),
        (17, &[0, 2, 4, 5, 8, 10]),
        (24, &[3, 5]),
        (26, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
        (29, &[5, 6]),
    ];
    for (seq, want) in cases {
        let mut got = choose_fragments(seq, 11, checksum);
        got.sort_unstable();
        assert_eq!(got, want, "sequence {}", seq);
    }
}

#[test]
fn test_bytewords_reference() {
    let data = [0u8, 1, 2, 128, 255];
    assert_eq!(
        bytewords::encode(&data, Style::Standard),
        "able acid also lava zoom jade need echo taxi"
    );
    assert_eq!(
        bytewords::encode(&data, Style::Uri),
        "able-acid-also-lava-zoom-jade-need-echo-taxi"
    );
    assert_eq!(bytewords::encode(&data, Style::Minimal), "aeadaolazmjendeoti");
    assert_eq!(
        bytewords::decode("AEADAOLAZMJENDEOTI", Style::Minimal).unwrap(),
        data
    );
}

#[test]
fn test_known_tokens() {
    let first = fragment::decode(PART_1).unwrap();
    let second = fragment::decode(PART_2).unwrap();

    for (fragment, seq) in [(&first, 1), (&second, 2)] {
        assert_eq!(fragment.ur_type, "crypto-psbt");
        assert_eq!(fragment.seq_num, seq);
        assert_eq!(fragment.seq_len, 2);
        assert_eq!(fragment.message_len, 332);
        assert_eq!(fragment.checksum, 1_925_131_959);
        assert_eq!(fragment.data.len(), 166);
    }

    // Canonical encoding reproduces the scanned token
    assert_eq!(first.encode(), PART_1.to_lowercase());
    assert_eq!(second.encode(), PART_2.to_lowercase());

    // The PSBT starts right after the 3-byte envelope header
    let mut payload = first.data.to_vec();
    payload.extend_from_slice(&second.data);
    let psbt = Psbt::parse(&payload[3..]).unwrap();
    assert_eq!(
        psbt.txid().to_string(),
        "6b2905e0ed18886aa272f9095dc8c7621cc8712f6eaf7495995abeb4c5a101f7"
    );
    assert_eq!(crc32(&payload), first.checksum);
}

#[test]
fn test_single_part_token() {
    let token = fragment::encode_single("bytes", b"urscan");
    match fragment::decode_part(&token).unwrap() {
        UrPart::Single { ur_type, message } => {
            assert_eq!(ur_type, "bytes");
            assert_eq!(message.as_ref(), b"urscan");
        }
        UrPart::Multi(other) => panic!("unexpected fragment {:?}", other),
    }
    assert!(fragment::decode(&token).is_err());
}
