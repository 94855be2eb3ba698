use crate::error::{ErrorCode, Exception};
use crate::gas::{self, GAS_STACK_OP};
use crate::types::U256;

/// Bounded data stack. Pushes and pops are charged to the gas counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    slice: Vec<U256>,
    max_depth: usize,
}

impl Stack {
    /// Empty stack holding at most `max_depth` words.
    pub fn new(initial_capacity: usize, max_depth: usize) -> Self {
        Self {
            slice: Vec::with_capacity(initial_capacity.min(max_depth)),
            max_depth,
        }
    }

    /// Number of words on the stack.
    pub fn len(&self) -> usize {
        self.slice.len()
    }

    /// `true` if the stack holds nothing.
    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    /// Words from bottom to top.
    pub fn as_slice(&self) -> &[U256] {
        self.slice.as_slice()
    }

    /// Top word, if any.
    pub fn peek(&self) -> Option<&U256> {
        self.slice.last()
    }

    /// Push `word`. A full stack is left unchanged.
    pub fn push(&mut self, gas: &mut u64, word: U256) -> Result<(), Exception> {
        gas::use_gas(gas, GAS_STACK_OP)?;

        if self.slice.len() >= self.max_depth {
            return Err(Exception::with_context(
                ErrorCode::DataStackOverflow,
                format_args!("maximum depth of {} reached", self.max_depth),
            ));
        }

        self.slice.push(word);

        Ok(())
    }

    /// Pop the top word.
    pub fn pop(&mut self, gas: &mut u64) -> Result<U256, Exception> {
        gas::use_gas(gas, GAS_STACK_OP)?;

        self.slice.pop().ok_or_else(|| ErrorCode::DataStackUnderflow.into())
    }

    /// Push a copy of the `n`th word from the top, counting from one.
    pub fn dup(&mut self, gas: &mut u64, n: usize) -> Result<(), Exception> {
        let word = n
            .checked_sub(1)
            .and_then(|i| self.slice.iter().rev().nth(i))
            .copied()
            .ok_or_else(|| self.underflow(n))?;

        self.push(gas, word)
    }

    /// Exchange the top word with the `n`th word below it.
    pub fn swap(&mut self, n: usize) -> Result<(), Exception> {
        let len = self.slice.len();

        let top = len.checked_sub(1);
        let below = top.and_then(|top| top.checked_sub(n));

        match (top, below) {
            (Some(top), Some(below)) if n > 0 => self.slice.swap(top, below),
            _ => return Err(self.underflow(n.saturating_add(1))),
        }

        Ok(())
    }

    fn underflow(&self, required: usize) -> Exception {
        Exception::with_context(
            ErrorCode::DataStackUnderflow,
            format_args!("{} words required, {} available", required, self.slice.len()),
        )
    }
}
