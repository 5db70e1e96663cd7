//! Finds the start of the embedded PSBT inside an unwrapped payload

use crate::constants::PSBT_MAGIC;
use crate::error::ScanError;

#[cfg(feature = "logging")]
use tracing::debug;

/// Offset of the first PSBT magic in `data`
pub fn locate(data: &[u8]) -> Result<usize, ScanError> {
    let offset = find_magic(data).ok_or(ScanError::MagicNotFound)?;

    #[cfg(feature = "logging")]
    debug!("PSBT magic at offset {} of {}", offset, data.len());

    Ok(offset)
}

/// The document starting at the first PSBT magic
pub fn document(data: &[u8]) -> Result<&[u8], ScanError> {
    locate(data).map(|offset| &data[offset..])
}

fn find_magic(data: &[u8]) -> Option<usize> {
    if data.len() < PSBT_MAGIC.len() {
        return None;
    }
    memchr::memmem::find(data, PSBT_MAGIC)
}
