
// bit arithmetic shared by the encoders, the validator and the entity


/// computes floor(log(x)/log(2)), with `floor_log_2(0)` defined as `None`
#[inline]
pub fn floor_log_2(number: u32) -> Option<u32> {
    if number == 0 { None }
    else { Some(31 - number.leading_zeros()) }
}


/// whether the number is a power of two (zero is not)
#[inline]
pub fn is_a_pow_of_2(number: u32) -> bool {
    number != 0 && (number & (number - 1)) == 0
}


/// number of bytes needed to hold a bit-stream,
/// rounded up to whole 32-bit words
#[inline]
pub fn bits_to_4byte(bits: u32) -> u32 {
    (((bits + 7) / 8) + 3) & !0x3
}


/// capacity of a byte buffer in bits, rounded down to whole 32-bit words
/// (the bit-stream is accessed in 32-bit words, a trailing partial word is unusable)
#[inline]
pub fn usable_bit_capacity(bytes: u32) -> u32 {
    (bytes & !0x3) * 8
}
