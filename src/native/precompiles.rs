use super::{bn256, Context, Function, NativeFn, Natives};

use crate::error::{ErrorCode, Exception};
use crate::gas::{self, words_in, GAS_PRECOMPILE_BASE, GAS_PRECOMPILE_WORD};
use crate::permission::PermFlag;
use crate::types::{Address, Word256};

use num_bigint::BigUint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// The standard precompiled contracts at addresses 2 to 8.
pub fn precompiles() -> Natives {
    let mut natives = Natives::new();

    [
        ("sha256", "Compute the sha256 hash of input", 2, sha256 as NativeFn),
        ("ripemd160", "Compute the ripemd160 hash of input", 3, ripemd160),
        ("identity", "Return an output identical to the input", 4, identity),
        (
            "exp_mod",
            "Compute the operation base**exp % mod where the values are big ints",
            5,
            exp_mod,
        ),
        ("bn256_add", "Return the add of two points on a bn256 curve", 6, bn256::add),
        (
            "bn256_scalar_mul",
            "Return the scalar multiplication of a big int and a point on a bn256 curve",
            7,
            bn256::scalar_mul,
        ),
        (
            "bn256_pairing",
            "Check the pairing of a set of points on a bn256 curve",
            8,
            bn256::pairing,
        ),
    ]
    .into_iter()
    .for_each(|(name, comment, byte, f)| {
        natives.insert(Function::new(name, comment, at(byte), PermFlag::empty(), f))
    });

    natives
}

fn at(byte: u8) -> Address {
    Address::left_pad(&[byte])
}

fn charge_per_word(ctx: &mut Context<'_, '_>) -> Result<(), Exception> {
    let words = words_in(ctx.params.input.len() as u64);
    let cost = GAS_PRECOMPILE_BASE.saturating_add(words.saturating_mul(GAS_PRECOMPILE_WORD));

    gas::use_gas(ctx.gas, cost)
}

fn sha256(mut ctx: Context<'_, '_>) -> Result<Vec<u8>, Exception> {
    charge_per_word(&mut ctx)?;

    Ok(Sha256::digest(ctx.input()).to_vec())
}

fn ripemd160(mut ctx: Context<'_, '_>) -> Result<Vec<u8>, Exception> {
    charge_per_word(&mut ctx)?;

    let digest = Ripemd160::digest(ctx.input());
    Ok(Word256::left_pad(&digest).to_vec())
}

fn identity(mut ctx: Context<'_, '_>) -> Result<Vec<u8>, Exception> {
    charge_per_word(&mut ctx)?;

    Ok(ctx.input().to_vec())
}

/// Split the head of `input` into segments of `lengths`, returning the segments and the tail.
pub(super) fn cut<'i, const N: usize>(
    mut input: &'i [u8],
    lengths: [u64; N],
) -> Result<([&'i [u8]; N], &'i [u8]), Exception> {
    let mut segments: [&'i [u8]; N] = [&[]; N];

    for (segment, length) in segments.iter_mut().zip(lengths) {
        let length = usize::try_from(length)
            .ok()
            .filter(|l| *l <= input.len())
            .ok_or_else(|| {
                Exception::with_context(ErrorCode::NativeFunction, "input is not long enough")
            })?;

        let (head, tail) = input.split_at(length);
        *segment = head;
        input = tail;
    }

    Ok((segments, input))
}

fn length_of(segment: &[u8]) -> u64 {
    let word = Word256::left_pad(segment);
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[24..]);

    if word[..24].iter().any(|b| *b != 0) {
        u64::MAX
    } else {
        u64::from_be_bytes(low)
    }
}

/// EIP-198 modular exponentiation with a flat per-word price.
fn exp_mod(mut ctx: Context<'_, '_>) -> Result<Vec<u8>, Exception> {
    let input = ctx.params.input.as_slice();
    let ([base_len, exp_len, mod_len], input) = cut(input, [32, 32, 32])?;
    let (base_len, exp_len, mod_len) =
        (length_of(base_len), length_of(exp_len), length_of(mod_len));

    let words = words_in(base_len)
        .saturating_mul(words_in(exp_len))
        .saturating_mul(words_in(mod_len));
    let cost = GAS_PRECOMPILE_BASE.saturating_add(words.saturating_mul(GAS_PRECOMPILE_WORD));
    gas::use_gas(ctx.gas, cost)?;

    let ([base, exp, modulus], _) = cut(input, [base_len, exp_len, mod_len])?;

    let mut output = vec![0u8; modulus.len()];
    let modulus = BigUint::from_bytes_be(modulus);

    if modulus == BigUint::from(0u8) {
        return Ok(output);
    }

    let result = BigUint::from_bytes_be(base)
        .modpow(&BigUint::from_bytes_be(exp), &modulus)
        .to_bytes_be();

    let start = output.len().saturating_sub(result.len());
    output[start..].copy_from_slice(&result);

    Ok(output)
}
