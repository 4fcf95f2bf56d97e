//! Byte remapping for GPT-2 style byte-level BPE.
//!
//! Every raw byte (0-255) is mapped to a distinct, printable Unicode character so
//! that merge rules can be written as plain text and no byte ever collides with
//! the structural characters (space, newline) of the merges format.
//!
//! # Mapping Strategy
//!
//! - Bytes 33-126 (`!` to `~`): map to themselves
//! - Bytes 161-172 (`¡` to `¬`): map to themselves
//! - Bytes 174-255 (`®` to `ÿ`): map to themselves
//! - Other bytes (0-32, 127-160, 173): map to U+0100 onwards, in byte order
//!
//! ```ignore
//! // Space (0x20 = 32) maps to 'Ġ' (U+0120)
//! assert_eq!(byte_level_encode(b" hello"), "Ġhello");
//! ```

use std::sync::LazyLock;

/// Byte to Unicode character mapping (256 entries).
static BYTE_TO_CHAR: LazyLock<[char; 256]> = LazyLock::new(|| {
    let mut mapping = ['\0'; 256];

    let mut next_char = 256u32;
    for b in 0u8..=255 {
        mapping[b as usize] = if is_direct_byte(b) {
            b as char
        } else {
            let ch = char::from_u32(next_char).expect("U+0100..U+0143 are scalar values");
            next_char += 1;
            ch
        };
    }

    mapping
});

/// Bytes whose printable Latin-1 character is used unchanged.
#[inline]
fn is_direct_byte(b: u8) -> bool {
    matches!(b, 33..=126 | 161..=172 | 174..=255)
}

/// Encode a byte slice into its byte-level representation.
///
/// The result has exactly one character per input byte.
#[inline]
pub fn byte_level_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| BYTE_TO_CHAR[b as usize]).collect()
}

/// Get the byte-level character for a specific byte value.
#[inline]
pub fn get_byte_level_char(byte: u8) -> char {
    BYTE_TO_CHAR[byte as usize]
}

/// The 256 byte-level characters in ascending code point order.
///
/// This is the order in which the base alphabet receives its ids.
pub fn sorted_alphabet() -> [char; 256] {
    let mut alphabet = *BYTE_TO_CHAR;
    alphabet.sort_unstable();
    alphabet
}
