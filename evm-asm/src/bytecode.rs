use crate::Opcode;

/// Values that can be spliced into a bytecode program.
///
/// Integers are spliced as a single byte and must fit in `0..=255`; use [`push_u64`] or
/// [`push_bytes`] for wider immediates.
pub trait Splice {
    /// Append the byte representation of `self` to `code`.
    fn splice_into(&self, code: &mut Vec<u8>);
}

impl Splice for Opcode {
    fn splice_into(&self, code: &mut Vec<u8>) {
        code.push(*self as u8);
    }
}

impl Splice for u8 {
    fn splice_into(&self, code: &mut Vec<u8>) {
        code.push(*self);
    }
}

impl Splice for i32 {
    fn splice_into(&self, code: &mut Vec<u8>) {
        code.push(*self as u8);
    }
}

impl<T: Splice> Splice for [T] {
    fn splice_into(&self, code: &mut Vec<u8>) {
        self.iter().for_each(|t| t.splice_into(code));
    }
}

impl<T: Splice, const N: usize> Splice for [T; N] {
    fn splice_into(&self, code: &mut Vec<u8>) {
        self.as_slice().splice_into(code);
    }
}

impl<T: Splice> Splice for Vec<T> {
    fn splice_into(&self, code: &mut Vec<u8>) {
        self.as_slice().splice_into(code);
    }
}

impl<T: Splice + ?Sized> Splice for &T {
    fn splice_into(&self, code: &mut Vec<u8>) {
        (**self).splice_into(code);
    }
}

/// Assemble a bytecode program from a list of [`Splice`] values.
///
/// ```rust
/// use evm_asm::{bytecode, push_u64, Opcode::*};
///
/// let code = bytecode![push_u64(0x1234), PUSH1, 0, MSTORE];
/// assert_eq!(code, vec![0x61, 0x12, 0x34, 0x60, 0x00, 0x52]);
/// ```
#[macro_export]
macro_rules! bytecode {
    ($($item:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut code: ::std::vec::Vec<u8> = ::std::vec::Vec::new();
        $(
            $crate::Splice::splice_into(&$item, &mut code);
        )*
        code
    }};
}

/// `PUSHn` of `data` with leading zero bytes stripped. Zero pushes a single zero byte.
///
/// Data longer than 32 bytes keeps its last 32 bytes.
pub fn push_bytes(data: &[u8]) -> Vec<u8> {
    let data = &data[data.len().saturating_sub(32)..];
    let trimmed = match data.iter().position(|b| *b != 0) {
        Some(start) => &data[start..],
        None => &[0u8][..],
    };

    let mut code = Vec::with_capacity(trimmed.len() + 1);

    if let Some(op) = Opcode::push(trimmed.len()) {
        code.push(op as u8);
    }
    code.extend_from_slice(trimmed);

    code
}

/// `PUSHn` of a 64-bit value with the minimal width.
pub fn push_u64(value: u64) -> Vec<u8> {
    push_bytes(&value.to_be_bytes())
}
