use bytemuck::cast_slice;

pub fn as_word_slice(input: &[u8]) -> &[u32] {
    cast_slice(input)
}

pub fn as_byte_slice(input: &[u32]) -> &[u8] {
    cast_slice(input)
}

////////////////////////////////////////////////////////////////////////////////

/// Sign-extend the low `bits` of `val`.
pub fn sign_ext(val: u32, bits: u32) -> u32 {
    let shift = 32 - bits;
    (((val << shift) as i32) >> shift) as u32
}
