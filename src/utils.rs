/// Return the bit value for `value` at bit position `bit`
pub fn bv(value: u16, bit: u8) -> u16 {
    (value >> bit) & 1
}

/// Return the value from `value` between bit positions `major_bit` and
/// `minor_bit`
pub fn bvs(value: u16, major_bit: u8, minor_bit: u8) -> u16 {
    let field = (value as u32 >> minor_bit) & ((1u32 << (major_bit - minor_bit + 1)) - 1);
    field as u16
}

/// Sign bit of a byte or a word operand
pub fn sign_bit(byte_mode: bool) -> u16 {
    if byte_mode {
        0o200
    } else {
        0o100000
    }
}

/// Mask of the significant bits of a byte or a word operand
pub fn value_mask(byte_mode: bool) -> u16 {
    if byte_mode {
        0o377
    } else {
        0o177777
    }
}

/// Extend the sign of the low byte of `value` into the high byte
pub fn sign_extend_byte(value: u16) -> u16 {
    value as u8 as i8 as i16 as u16
}
