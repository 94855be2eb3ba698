//! EIP-196 and EIP-197 arithmetic on the alt_bn128 curve.
//!
//! Coordinates are 32-byte big-endian words and must be below the field modulus. The point
//! at infinity is encoded as all zeroes. A G2 point is `(x_im, x_re, y_im, y_re)`.

use super::precompiles::cut;
use super::Context;

use crate::error::{ErrorCode, Exception};
use crate::gas::{self, GAS_BN256_ADD, GAS_BN256_PAIRING, GAS_BN256_SCALAR_MUL};
use crate::types::Word256;

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ec::CurveGroup;
use ark_ff::{BigInteger, One, PrimeField, Zero};

use std::ops::Mul;

const WORD: u64 = 32;
const G1_LEN: u64 = 64;
const G2_LEN: u64 = 128;
const PAIR_LEN: usize = 192;

fn invalid(reason: &str) -> Exception {
    Exception::with_context(ErrorCode::NativeFunction, reason)
}

fn field_element(bytes: &[u8]) -> Result<Fq, Exception> {
    let element = Fq::from_be_bytes_mod_order(bytes);

    if element.into_bigint().to_bytes_be() != bytes {
        return Err(invalid("coordinate is not below the field modulus"));
    }

    Ok(element)
}

fn g1(bytes: &[u8]) -> Result<G1Affine, Exception> {
    let ([x, y], _) = cut(bytes, [WORD, WORD])?;
    let (x, y) = (field_element(x)?, field_element(y)?);

    if x.is_zero() && y.is_zero() {
        return Ok(G1Affine::identity());
    }

    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(invalid("G1 point is not on the curve"));
    }

    Ok(point)
}

fn g2(bytes: &[u8]) -> Result<G2Affine, Exception> {
    let ([x_im, x_re, y_im, y_re], _) = cut(bytes, [WORD; 4])?;
    let x = Fq2::new(field_element(x_re)?, field_element(x_im)?);
    let y = Fq2::new(field_element(y_re)?, field_element(y_im)?);

    if x.is_zero() && y.is_zero() {
        return Ok(G2Affine::identity());
    }

    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(invalid("G2 point is not in the subgroup"));
    }

    Ok(point)
}

fn encode(point: G1Affine) -> Vec<u8> {
    let mut output = point.x.into_bigint().to_bytes_be();
    output.extend(point.y.into_bigint().to_bytes_be());

    output
}

pub(super) fn add(mut ctx: Context<'_, '_>) -> Result<Vec<u8>, Exception> {
    gas::use_gas(ctx.gas, GAS_BN256_ADD)?;

    let ([p, q], _) = cut(ctx.input(), [G1_LEN, G1_LEN])?;
    let (p, q) = (g1(p)?, g1(q)?);

    #[allow(clippy::arithmetic_side_effects)] // Group law, no integer overflow
    let sum = (p + q).into_affine();

    Ok(encode(sum))
}

pub(super) fn scalar_mul(mut ctx: Context<'_, '_>) -> Result<Vec<u8>, Exception> {
    gas::use_gas(ctx.gas, GAS_BN256_SCALAR_MUL)?;

    let ([point, scalar], _) = cut(ctx.input(), [G1_LEN, WORD])?;
    let point = g1(point)?;
    let scalar = Fr::from_be_bytes_mod_order(scalar);

    Ok(encode(point.mul(scalar).into_affine()))
}

/// A one word when the product of the pairings of every `(G1, G2)` pair is one, zero
/// otherwise. Empty input holds.
pub(super) fn pairing(mut ctx: Context<'_, '_>) -> Result<Vec<u8>, Exception> {
    gas::use_gas(ctx.gas, GAS_BN256_PAIRING)?;

    let pairs = ctx.input().chunks_exact(PAIR_LEN);
    if !pairs.remainder().is_empty() {
        return Err(invalid("pairing input is not a multiple of 192 bytes"));
    }

    let (mut g1s, mut g2s) = (Vec::new(), Vec::new());
    for pair in pairs {
        let ([a, b], _) = cut(pair, [G1_LEN, G2_LEN])?;
        g1s.push(g1(a)?);
        g2s.push(g2(b)?);
    }

    let holds = Bn254::multi_pairing(g1s, g2s).0.is_one();

    Ok(Word256::left_pad(&[u8::from(holds)]).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::call::{CallFrame, CallParams};
    use crate::context::{State, TestBlockchain};
    use crate::event::NoopEventSink;
    use crate::native::NativeFn;
    use crate::storage::MemoryStorage;
    use crate::types::Address;

    use ark_ec::AffineRepr;

    fn run(f: NativeFn, input: Vec<u8>) -> Result<Vec<u8>, Exception> {
        let mut backend = MemoryStorage::new();
        let chain = TestBlockchain::default();
        let mut sink = NoopEventSink;
        let mut st = State::new(CallFrame::new(&mut backend), &chain, &mut sink);
        let params = CallParams::new(Address::zeroed(), Address::left_pad(&[6]), input, 0);

        f(Context {
            state: &mut st,
            params: &params,
            gas: &mut 10,
        })
    }

    fn word(value: u8) -> Vec<u8> {
        Word256::left_pad(&[value]).to_vec()
    }

    fn generator() -> Vec<u8> {
        [word(1), word(2)].concat()
    }

    fn encode_g2(point: G2Affine) -> Vec<u8> {
        [point.x.c1, point.x.c0, point.y.c1, point.y.c0]
            .iter()
            .flat_map(|c| c.into_bigint().to_bytes_be())
            .collect()
    }

    #[test]
    fn doubling_the_generator() {
        let doubled = hex::decode(
            "030644e72e131a029b85045b68181585d97816a916871ca8d3c208c16d87cfd3\
             15ed738c0e0a7c92e7845f96b2ae9c0a68a6a449e3538fc7ff3ebf7a5a18a2c4",
        )
        .expect("hex");

        let sum = run(add, [generator(), generator()].concat()).expect("on curve");
        assert_eq!(sum, doubled);

        let product = run(scalar_mul, [generator(), word(2)].concat()).expect("on curve");
        assert_eq!(product, doubled);
    }

    #[test]
    fn infinity_is_the_identity() {
        let sum = run(add, [generator(), vec![0; 64]].concat()).expect("on curve");
        assert_eq!(sum, generator());

        let product = run(scalar_mul, [generator(), word(0)].concat()).expect("on curve");
        assert_eq!(product, vec![0; 64]);
    }

    #[test]
    fn invalid_points_are_rejected() {
        let off_curve = [word(1), word(3)].concat();
        let err = run(add, [generator(), off_curve].concat()).expect_err("off curve");
        assert_eq!(err.code(), ErrorCode::NativeFunction);

        // the field modulus itself is not a canonical coordinate
        let modulus = hex::decode(
            "30644e72e131a029b85045b68181585d97816a916871ca8d3c208c16d87cfd47",
        )
        .expect("hex");
        let err = run(scalar_mul, [modulus, word(2), word(1)].concat()).expect_err("modulus");
        assert_eq!(err.code(), ErrorCode::NativeFunction);
    }

    #[test]
    fn short_input_is_rejected() {
        let err = run(add, generator()).expect_err("one point");
        assert_eq!(err.code(), ErrorCode::NativeFunction);

        let err = run(scalar_mul, generator()).expect_err("no scalar");
        assert_eq!(err.code(), ErrorCode::NativeFunction);

        let err = run(pairing, vec![0; PAIR_LEN - 1]).expect_err("partial pair");
        assert_eq!(err.code(), ErrorCode::NativeFunction);
    }

    #[test]
    fn pairing_check() {
        assert_eq!(run(pairing, vec![]).expect("empty"), word(1));

        let g1 = G1Affine::generator();
        let g2 = encode_g2(G2Affine::generator());
        let negated = encode(-g1);

        // e(G1, G2) * e(-G1, G2) == 1
        let balanced = [generator(), g2.clone(), negated, g2.clone()].concat();
        assert_eq!(run(pairing, balanced).expect("valid points"), word(1));

        let single = [generator(), g2].concat();
        assert_eq!(run(pairing, single).expect("valid points"), word(0));
    }

    #[test]
    fn pairing_rejects_points_off_the_twist() {
        let mut g2 = encode_g2(G2Affine::generator());
        g2[127] ^= 1;

        let err = run(pairing, [generator(), g2].concat()).expect_err("off the twist");
        assert_eq!(err.code(), ErrorCode::NativeFunction);
    }
}
