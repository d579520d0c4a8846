use std::str::from_utf8;

use crate::defs::CPIO_FIELD_LEN;

/// Parse an 8 character hex field. Anything unparsable reads as zero.
pub(crate) fn read_hex(field: &[u8]) -> u64 {
    from_utf8(field)
        .ok()
        .and_then(|s| u64::from_str_radix(s, 16).ok())
        .unwrap_or(0)
}

/// Write `value` as 8 upper-case, zero-padded hex digits into `field`.
///
/// Callers must have checked that `value` fits in 32 bits.
pub(crate) fn write_hex(field: &mut [u8], value: u64) {
    let digits = format!("{:08X}", value);
    field[..CPIO_FIELD_LEN].copy_from_slice(&digits.as_bytes()[..CPIO_FIELD_LEN]);
}

/// Number of zero bytes needed to bring `len` up to a 4-byte boundary
pub(crate) fn pad4(len: u64) -> u64 {
    (4 - len % 4) % 4
}
