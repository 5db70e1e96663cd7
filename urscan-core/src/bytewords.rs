//! Bytewords: the byte-to-word alphabet UR tokens are written in
//!
//! Every byte maps to one of 256 four-letter words. Inside UR strings the
//! minimal style is used: only the first and last letter of each word. A
//! CRC-32 of the payload is appended before encoding and checked on decode.

use crate::constants::BYTEWORDS_CHECKSUM_SIZE;
use crate::error::ScanError;
use alloc::string::String;
use alloc::vec::Vec;
use crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// The 256 words, four letters each, in byte order
const WORDS: &[u8] = concat!(
    "ableacidalsoapexaquaarchatomauntawayaxisbackbaldbarnbeltbetabias",
    "bluebodybragbrewbulbbuzzcalmcashcatschefcityclawcodecolacookcost",
    "cruxcurlcuspcyandarkdatadaysdelidicedietdoordowndrawdropdrumdull",
    "dutyeacheasyechoedgeepicevenexamexiteyesfactfairfernfigsfilmfish",
    "fizzflapflewfluxfoxyfreefrogfuelfundgalagamegeargemsgiftgirlglow",
    "goodgraygrimgurugushgyrohalfhanghardhawkheathelphighhillholyhope",
    "hornhutsicedideaidleinchinkyintoirisironitemjadejazzjoinjoltjowl",
    "judojugsjumpjunkjurykeepkenokeptkeyskickkilnkingkitekiwiknoblamb",
    "lavalazyleaflegsliarlimplionlistlogoloudloveluaulucklungmainmany",
    "mathmazememomenumeowmildmintmissmonknailnavyneednewsnextnoonnote",
    "numbobeyoboeomitonyxopenovalowlspaidpartpeckplaypluspoempoolpose",
    "puffpumapurrquadquizraceramprealredorichroadrockroofrubyruinruns",
    "rustsafesagascarsetssilkskewslotsoapsolosongstubsurfswantacotask",
    "taxitenttiedtimetinytoiltombtoystriptunatwinuglyundouniturgeuser",
    "vastveryvetovialvibeviewvisavoidvowswallwandwarmwaspwavewaxywebs",
    "whatwhenwhizwolfworkyankyawnyellyogayurtzapszerozestzinczonezoom",
)
.as_bytes();

/// First+last letter of every word is unique; index them for decoding
const MINIMAL_INDEX: [i16; 26 * 26] = build_minimal_index();

const fn build_minimal_index() -> [i16; 26 * 26] {
    let mut table = [-1i16; 26 * 26];
    let mut i = 0;
    while i < 256 {
        let first = (WORDS[i * 4] - b'a') as usize;
        let last = (WORDS[i * 4 + 3] - b'a') as usize;
        table[first * 26 + last] = i as i16;
        i += 1;
    }
    table
}

/// Textual layout of an encoded payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Full words separated by spaces
    Standard,
    /// Full words separated by dashes
    Uri,
    /// First and last letter of each word, no separator
    Minimal,
}

/// CRC-32 (ISO-HDLC) as used for bytewords payloads and message checksums
pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// The word for a byte
pub fn word(byte: u8) -> &'static str {
    let start = byte as usize * 4;
    // WORDS is pure ASCII so every 4-byte window is valid UTF-8
    core::str::from_utf8(&WORDS[start..start + 4]).unwrap_or("")
}

fn lookup(first: u8, last: u8) -> Option<u8> {
    let first = first.to_ascii_lowercase();
    let last = last.to_ascii_lowercase();
    if !first.is_ascii_lowercase() || !last.is_ascii_lowercase() {
        return None;
    }
    let idx = MINIMAL_INDEX[(first - b'a') as usize * 26 + (last - b'a') as usize];
    if idx < 0 {
        None
    } else {
        Some(idx as u8)
    }
}

/// Encode `data` with a trailing CRC-32
pub fn encode(data: &[u8], style: Style) -> String {
    let mut body = Vec::with_capacity(data.len() + BYTEWORDS_CHECKSUM_SIZE);
    body.extend_from_slice(data);
    body.extend_from_slice(&crc32(data).to_be_bytes());

    let mut out = String::with_capacity(body.len() * 5);
    for (i, &byte) in body.iter().enumerate() {
        let w = word(byte);
        match style {
            Style::Minimal => {
                out.push_str(&w[0..1]);
                out.push_str(&w[3..4]);
            }
            Style::Standard | Style::Uri => {
                if i > 0 {
                    out.push(if style == Style::Standard { ' ' } else { '-' });
                }
                out.push_str(w);
            }
        }
    }
    out
}

/// Decode bytewords text, verify and strip its CRC-32
pub fn decode(text: &str, style: Style) -> Result<Vec<u8>, ScanError> {
    let bytes = match style {
        Style::Minimal => decode_minimal(text)?,
        Style::Standard => decode_words(text, ' ')?,
        Style::Uri => decode_words(text, '-')?,
    };

    if bytes.len() <= BYTEWORDS_CHECKSUM_SIZE {
        return Err(ScanError::FragmentTooShort {
            expected: BYTEWORDS_CHECKSUM_SIZE + 1,
            actual: bytes.len(),
        });
    }

    let split = bytes.len() - BYTEWORDS_CHECKSUM_SIZE;
    let (body, trailer) = bytes.split_at(split);
    let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = crc32(body);
    if expected != actual {
        return Err(ScanError::BytewordsChecksum { expected, actual });
    }

    Ok(body.to_vec())
}

fn decode_minimal(text: &str) -> Result<Vec<u8>, ScanError> {
    let raw = text.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(ScanError::InvalidByteword(raw.len() - 1));
    }
    raw.chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| lookup(pair[0], pair[1]).ok_or(ScanError::InvalidByteword(i * 2)))
        .collect()
}

fn decode_words(text: &str, separator: char) -> Result<Vec<u8>, ScanError> {
    let mut out = Vec::with_capacity(text.len() / 5 + 1);
    let mut position = 0;
    for w in text.split(separator) {
        let raw = w.as_bytes();
        let byte = if raw.len() == 4 {
            lookup(raw[0], raw[3]).filter(|&b| word(b).eq_ignore_ascii_case(w))
        } else {
            None
        };
        out.push(byte.ok_or(ScanError::InvalidByteword(position))?);
        position += w.len() + 1;
    }
    Ok(out)
}
