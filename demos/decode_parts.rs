//! Decode a two-part animated QR transfer and print its txid

use urscan_core::ScanSession;

const PARTS: [&str; 2] = [
    "UR:CRYPTO-PSBT/1-2/LPADAOCFADGSCYJPRSDMRLHDOLHKADGAJOJKIDJYZMADAEJSAOAEAEAEADRPCFTSSBLRRFNETOLKMNMSNSDSGTGDDNCYPTENMOFNOLFGZEIATIMDPEWPNDLTTTAEAEAEAEAEZMZMZMZMAOBEDIAEAEAEAEAEAECMAEBBDWLFLFBSNDONNNCFLUFDROCWINWMFMLTBZLFONCYPMUODWAEAEAEAEAECMAEBBQZCSNTEMJKMDZESRRPAYGDDSFYNNPRUENBTNBYOSAEAEAEAEAEADADCTGWAADPAEAEAEAEAECMAEBBINWEJTKNNTESSRDYOEBBBWFSTNCSFGDABNKPHLLYADAYJEAOFLDYFYKEJLCLEM",
    "UR:CRYPTO-PSBT/2-2/LPAOAOCFADGSCYJPRSDMRLHDOLAOCXETSAIYLPRYTKCXKGGTCNKIYKBZBWGRRTBZTSAORTWSETYLKNJTMDMDUELRNLISFMAOCXJLMHOXIHHGTLHNATVSPDJSLGYNWLVYMKVWIHUYWSEEDKMWDYVELPJLMUWSUOEOPYADCLAXOSWYKNBTWPAHKGJKAAPTPYLPRSQDHPRLCEJYRFFSVANYCXKSIYIEPMISURWDZCWPAEAECPAOAXGMMSPLOLWLMUDAJLKGURZOFRTYTSAODADTMUAMHDMSMWPAWLDYLYZMBAKGPEPRRYCSAEAEAEAEGHAEAELAAEAEAELAAEAEAELAADAEAEAEAEAEAEAEAECWMTFEFD",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("urscan Two-Part Decode Example\n");

    let mut session = ScanSession::new();

    // Scanners rarely see parts in order
    for part in PARTS.iter().rev() {
        let outcome = session.feed(part)?;
        println!(
            "Scanned {}... -> {:?} ({:.0}%)",
            &part[..22],
            outcome,
            session.progress() * 100.0
        );
    }

    let result = session.result().ok_or("transfer incomplete")?;
    let tx = &result.psbt.unsigned_tx;

    println!("\nPayload: {} bytes", result.payload.len());
    println!("PSBT: {} bytes", result.psbt.len);
    println!("Inputs: {}  Outputs: {}", tx.inputs.len(), tx.outputs.len());
    for (i, output) in tx.outputs.iter().enumerate() {
        println!("  output {}: {} sat", i, output.value);
    }
    println!("\ntxid: {}", result.txid);

    Ok(())
}
