//! Hex digit codec for command arguments and replies
//!
//! Arguments on the wire are pairs of ASCII hex digits, high nibble first.
//! Both cases are accepted on input; output uses upper case.

use crate::error::HexError;

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Value of one ASCII hex digit
pub const fn hex_to_nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}

/// Upper case ASCII hex digit for the low 4 bits of `value`
pub const fn nibble_to_hex(value: u8) -> u8 {
    DIGITS[(value & 0x0F) as usize]
}

/// Decode one digit pair
pub fn decode_byte(high: u8, low: u8) -> Result<u8, HexError> {
    let high = hex_to_nibble(high).ok_or(HexError::InvalidDigit(high))?;
    let low = hex_to_nibble(low).ok_or(HexError::InvalidDigit(low))?;
    Ok((high << 4) | low)
}

/// Decode digit pairs from `src` into the front of `dst`
///
/// Returns the number of bytes written. Nothing is written unless the whole
/// input is valid.
pub fn decode_into(src: &[u8], dst: &mut [u8]) -> Result<usize, HexError> {
    if src.len() % 2 != 0 {
        return Err(HexError::OddLength);
    }
    let count = src.len() / 2;
    if count > dst.len() {
        return Err(HexError::OutputTooSmall);
    }
    if let Some(&bad) = src.iter().find(|&&digit| hex_to_nibble(digit).is_none()) {
        return Err(HexError::InvalidDigit(bad));
    }
    for (pair, byte) in src.chunks_exact(2).zip(dst.iter_mut()) {
        *byte = decode_byte(pair[0], pair[1])?;
    }
    Ok(count)
}

/// Two digits for `value`, high nibble first
pub const fn encode_byte(value: u8) -> [u8; 2] {
    [nibble_to_hex(value >> 4), nibble_to_hex(value)]
}
