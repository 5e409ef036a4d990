/*!
Wire-level constants: major types, additional-info bands, reserved simple
values and the tag numbers the protocol assigns to domain types.
*/

pub const MAJOR_UNSIGNED: u8 = 0;
pub const MAJOR_NEGATIVE: u8 = 1;
pub const MAJOR_BYTES: u8 = 2;
pub const MAJOR_TEXT: u8 = 3;
pub const MAJOR_ARRAY: u8 = 4;
pub const MAJOR_MAP: u8 = 5;
pub const MAJOR_TAG: u8 = 6;
pub const MAJOR_SIMPLE: u8 = 7;

/// Largest argument that fits in the initial byte.
pub const INFO_INLINE_MAX: u8 = 23;
pub const INFO_ONE_BYTE: u8 = 24;
pub const INFO_TWO_BYTES: u8 = 25;
pub const INFO_FOUR_BYTES: u8 = 26;
pub const INFO_EIGHT_BYTES: u8 = 27;
pub const INFO_INDEFINITE: u8 = 31;

pub const SIMPLE_FALSE: u8 = 20;
pub const SIMPLE_TRUE: u8 = 21;
pub const SIMPLE_NULL: u8 = 22;
pub const SIMPLE_UNDEFINED: u8 = 23;

/// The "break" stop code: major type 7, additional info 31.
pub const BREAK: u8 = 0xFF;

/// RFC 8949 standard date/time string.
pub const TAG_DATETIME: u64 = 0;

/// Wraps `null` to carry the server's NONE, the absent value.
pub const TAG_NONE: u64 = 6;

/// Largest integer magnitude an IEEE-754 double represents exactly.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Builds the initial byte of a data item.
#[inline]
pub const fn initial_byte(major: u8, info: u8) -> u8 {
    (major << 5) | info
}

/// Splits an initial byte into (major type, additional info).
#[inline]
pub const fn split_initial_byte(byte: u8) -> (u8, u8) {
    (byte >> 5, byte & 0x1F)
}

/// Number of trailing argument bytes announced by `info`.
///
/// Returns `None` for the reserved values 28..=30, which are never well-formed.
#[inline]
pub const fn argument_width(info: u8) -> Option<usize> {
    match info {
        0..=INFO_INLINE_MAX | INFO_INDEFINITE => Some(0),
        INFO_ONE_BYTE => Some(1),
        INFO_TWO_BYTES => Some(2),
        INFO_FOUR_BYTES => Some(4),
        INFO_EIGHT_BYTES => Some(8),
        _ => None,
    }
}

/// Total encoded size of a header carrying `arg`.
#[inline]
pub const fn header_len(arg: u64) -> usize {
    if arg <= INFO_INLINE_MAX as u64 {
        1
    } else if arg <= u8::MAX as u64 {
        2
    } else if arg <= u16::MAX as u64 {
        3
    } else if arg <= u32::MAX as u64 {
        5
    } else {
        9
    }
}
