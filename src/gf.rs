//! GF(2^128) doubling, the step that turns a single encrypted tweak into the
//! per-block sequence of masks [XEX](crate::xex) uses.
//!
//! The field is GF(2^128) under the reducing polynomial $x^{128} + x^7 + x^2
//! + x + 1$. [`double`] multiplies its argument by $x$ in that field —
//! equivalent to a left shift by one bit, with a conditional reduction when
//! the bit shifted off the top would otherwise have been lost.

/// Double (multiply by $x$) a 128-bit value in GF(2^128), in place.
///
/// `block` is a little-endian 128-bit integer: `block[0]` is the least
/// significant byte. The doubling shifts the whole integer left by one bit —
/// byte `i`'s high bit carries into byte `i + 1`'s low bit — and if the bit
/// shifted off the very top (bit 7 of `block[15]`) was set, `block[0]` is
/// XORed with the reduction byte `0x87` (the low byte of $x^7 + x^2 + x + 1$).
///
/// The conditional reduction is implemented as a mask-and-XOR on the carry
/// bit rather than a branch, so the only data this function's control flow
/// depends on is the loop bound, not the block's contents.
pub fn double(block: &mut [u8; 16]) {
    let mut carry = 0u8;
    for byte in block.iter_mut() {
        let next_carry = *byte >> 7;
        *byte = (*byte << 1) | carry;
        carry = next_carry;
    }
    let mask = 0u8.wrapping_sub(carry);
    block[0] ^= mask & 0x87;
}

/// Apply [`double`] `n` times in place. `n == 0` leaves `block` unchanged.
pub fn double_n(block: &mut [u8; 16], n: u64) {
    for _ in 0..n {
        double(block);
    }
}
