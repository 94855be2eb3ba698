//! Word arithmetic with EVM semantics.
//!
//! Everything wraps modulo 2^256 and divisions by zero yield zero. Signed operations read
//! words as two's complement.

use crate::types::{U256, U512};

fn sign_bit() -> U256 {
    U256([0, 0, 0, 1 << 63])
}

pub(crate) fn is_negative(x: U256) -> bool {
    x.bit(255)
}

fn negate(x: U256) -> U256 {
    (!x).overflowing_add(U256::one()).0
}

fn abs(x: U256) -> U256 {
    if is_negative(x) {
        negate(x)
    } else {
        x
    }
}

fn low_u256(x: U512) -> U256 {
    let mut bytes = [0u8; 64];
    x.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}

pub(crate) fn add(a: U256, b: U256) -> U256 {
    a.overflowing_add(b).0
}

pub(crate) fn mul(a: U256, b: U256) -> U256 {
    a.overflowing_mul(b).0
}

pub(crate) fn sub(a: U256, b: U256) -> U256 {
    a.overflowing_sub(b).0
}

pub(crate) fn div(a: U256, b: U256) -> U256 {
    a.checked_div(b).unwrap_or_default()
}

pub(crate) fn rem(a: U256, b: U256) -> U256 {
    a.checked_rem(b).unwrap_or_default()
}

/// Signed division truncating towards zero. `MIN / -1` wraps to `MIN`.
pub(crate) fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }

    let quotient = abs(a).checked_div(abs(b)).unwrap_or_default();

    if is_negative(a) != is_negative(b) {
        negate(quotient)
    } else {
        quotient
    }
}

/// Signed remainder taking the sign of the dividend.
pub(crate) fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }

    let remainder = abs(a).checked_rem(abs(b)).unwrap_or_default();

    if is_negative(a) {
        negate(remainder)
    } else {
        remainder
    }
}

pub(crate) fn addmod(a: U256, b: U256, m: U256) -> U256 {
    if m.is_zero() {
        return U256::zero();
    }

    let sum = U512::from(a).overflowing_add(U512::from(b)).0;

    low_u256(sum.checked_rem(U512::from(m)).unwrap_or_default())
}

pub(crate) fn mulmod(a: U256, b: U256, m: U256) -> U256 {
    if m.is_zero() {
        return U256::zero();
    }

    low_u256(a.full_mul(b).checked_rem(U512::from(m)).unwrap_or_default())
}

pub(crate) fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

/// Extend the sign of the integer held in the low `back + 1` bytes of `x`.
#[allow(clippy::arithmetic_side_effects)] // Safety: `back` is below 31
pub(crate) fn signextend(back: U256, x: U256) -> U256 {
    if back >= U256::from(31) {
        return x;
    }

    let bit = back.as_usize() * 8 + 7;
    let mask = (U256::one() << bit) - 1;

    if x.bit(bit) {
        x | !mask
    } else {
        x & mask
    }
}

pub(crate) fn slt(a: U256, b: U256) -> bool {
    (a ^ sign_bit()) < (b ^ sign_bit())
}

pub(crate) fn sgt(a: U256, b: U256) -> bool {
    (a ^ sign_bit()) > (b ^ sign_bit())
}

/// Byte `i` of `x` counting from the most significant one.
pub(crate) fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::zero();
    }

    U256::from(x.byte(31_usize.saturating_sub(i.as_usize())))
}

#[allow(clippy::arithmetic_side_effects)] // Safety: shift is below 256
pub(crate) fn shl(shift: U256, x: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }

    x << shift.as_usize()
}

#[allow(clippy::arithmetic_side_effects)] // Safety: shift is below 256
pub(crate) fn shr(shift: U256, x: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }

    x >> shift.as_usize()
}

/// Arithmetic shift right, filling with the sign bit.
#[allow(clippy::arithmetic_side_effects)] // Safety: shift is below 256
pub(crate) fn sar(shift: U256, x: U256) -> U256 {
    let negative = is_negative(x);

    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }

    let shift = shift.as_usize();

    if negative {
        !(!x >> shift)
    } else {
        x >> shift
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    use quickcheck_macros::quickcheck;
    use test_case::test_case;

    fn word(limbs: (u64, u64, u64, u64)) -> U256 {
        U256([limbs.0, limbs.1, limbs.2, limbs.3])
    }

    fn minus(x: u64) -> U256 {
        negate(U256::from(x))
    }

    #[test_case(U256::from(7), U256::from(2) => U256::from(3); "positive")]
    #[test_case(minus(7), U256::from(2) => minus(3); "negative dividend")]
    #[test_case(U256::from(7), minus(2) => minus(3); "negative divisor")]
    #[test_case(minus(7), minus(2) => U256::from(3); "both negative")]
    #[test_case(sign_bit(), U256::MAX => sign_bit(); "min over minus one")]
    #[test_case(U256::from(7), U256::zero() => U256::zero(); "by zero")]
    fn signed_division(a: U256, b: U256) -> U256 {
        sdiv(a, b)
    }

    #[test_case(U256::from(7), U256::from(3) => U256::from(1); "positive")]
    #[test_case(minus(7), U256::from(3) => minus(1); "negative dividend")]
    #[test_case(U256::from(7), minus(3) => U256::from(1); "negative divisor")]
    #[test_case(minus(7), U256::zero() => U256::zero(); "by zero")]
    fn signed_modulo(a: U256, b: U256) -> U256 {
        smod(a, b)
    }

    #[test]
    fn modular_arithmetic_in_512_bits() {
        assert_eq!(addmod(U256::MAX, U256::MAX, U256::from(10)), U256::from(0));
        assert_eq!(addmod(U256::MAX, U256::one(), U256::MAX), U256::one());
        assert_eq!(mulmod(U256::MAX, U256::MAX, U256::from(12)), U256::from(9));
        assert_eq!(mulmod(U256::MAX, U256::from(2), U256::MAX), U256::zero());
    }

    #[test_case(U256::zero(), U256::from(0xff) => U256::MAX; "negative byte")]
    #[test_case(U256::zero(), U256::from(0x7f) => U256::from(0x7f); "positive byte")]
    #[test_case(U256::one(), U256::from(0xff_80_00u64) => minus(0x80_00); "negative pair")]
    #[test_case(U256::from(31), U256::from(0xff) => U256::from(0xff); "full width")]
    #[test_case(U256::MAX, U256::from(0xff) => U256::from(0xff); "huge index")]
    fn sign_extension(back: U256, x: U256) -> U256 {
        signextend(back, x)
    }

    #[test_case(U256::zero(), sign_bit() => U256::from(0x80); "most significant")]
    #[test_case(U256::from(31), U256::from(0xab) => U256::from(0xab); "least significant")]
    #[test_case(U256::from(32), U256::MAX => U256::zero(); "out of range")]
    fn bytes(i: U256, x: U256) -> U256 {
        byte(i, x)
    }

    #[test]
    fn shifts() {
        assert_eq!(shl(U256::zero(), U256::one()), U256::one());
        assert_eq!(shl(U256::from(255), U256::one()), sign_bit());
        assert_eq!(shr(U256::from(255), sign_bit()), U256::one());
        assert_eq!(sar(U256::from(4), minus(16)), minus(1));
        assert_eq!(sar(U256::from(300), minus(16)), U256::MAX);
        assert_eq!(sar(U256::from(300), U256::from(16)), U256::zero());
    }

    #[test]
    fn signed_comparison() {
        assert!(slt(minus(1), U256::zero()));
        assert!(sgt(U256::zero(), minus(1)));
        assert!(slt(sign_bit(), U256::MAX));
        assert!(!slt(U256::one(), U256::one()));
    }

    #[test]
    fn exponentiation_wraps() {
        assert_eq!(exp(U256::from(2), U256::from(10)), U256::from(1024));
        assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
        assert_eq!(exp(U256::zero(), U256::zero()), U256::one());
    }

    #[quickcheck]
    fn division_by_zero_is_zero(a: (u64, u64, u64, u64), m: (u64, u64, u64, u64)) -> bool {
        let (a, m) = (word(a), word(m));

        [div(a, U256::zero()), rem(a, U256::zero()), sdiv(a, U256::zero()), smod(a, U256::zero())]
            .iter()
            .chain([addmod(a, m, U256::zero()), mulmod(a, m, U256::zero())].iter())
            .all(U256::is_zero)
    }

    #[quickcheck]
    fn wide_shifts_saturate(x: (u64, u64, u64, u64), extra: u16) -> bool {
        let (x, shift) = (word(x), U256::from(256u64 + extra as u64));
        let filled = if is_negative(x) { U256::MAX } else { U256::zero() };

        shl(shift, x).is_zero() && shr(shift, x).is_zero() && sar(shift, x) == filled
    }

    #[quickcheck]
    fn sar_matches_shr_on_non_negative(x: (u64, u64, u64, u64), shift: u8) -> bool {
        let x = word(x) >> 1;
        let shift = U256::from(shift);

        sar(shift, x) == shr(shift, x)
    }

    #[quickcheck]
    fn signed_ordering_is_antisymmetric(a: (u64, u64, u64, u64), b: (u64, u64, u64, u64)) -> bool {
        let (a, b) = (word(a), word(b));

        slt(a, b) == sgt(b, a) && !(slt(a, b) && slt(b, a))
    }

    #[quickcheck]
    fn wrapping_add_sub(a: (u64, u64, u64, u64), b: (u64, u64, u64, u64)) -> bool {
        let (a, b) = (word(a), word(b));

        sub(add(a, b), b) == a && add(mul(a, U256::one()), U256::zero()) == a
    }
}
