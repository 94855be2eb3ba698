//! Minimal ABI decoding of revert payloads.

use crate::consts::REVERT_REASON_SELECTOR;
use crate::types::U256;

const WORD: usize = 32;

fn read_usize(data: &[u8], at: usize) -> Option<usize> {
    let word = data.get(at..at.checked_add(WORD)?)?;
    let value = U256::from_big_endian(word);

    (value <= U256::from(usize::MAX)).then(|| value.as_usize())
}

/// Decode the message of an `Error(string)` revert payload.
///
/// Returns `None` if the payload has another shape or the string is not UTF-8.
pub fn unpack_revert_reason(output: &[u8]) -> Option<String> {
    let data = output.strip_prefix(&REVERT_REASON_SELECTOR[..])?;

    let offset = read_usize(data, 0)?;
    let len = read_usize(data, offset)?;
    let start = offset.checked_add(WORD)?;
    let bytes = data.get(start..start.checked_add(len)?)?;

    String::from_utf8(bytes.to_vec()).ok()
}
