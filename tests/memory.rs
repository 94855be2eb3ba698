use evm_engine::prelude::*;

use evm_engine::consts::DEFAULT_MEMORY_MAX_CAPACITY;
use Opcode::*;

fn word(outcome: &TestOutcome) -> U256 {
    U256::from_big_endian(outcome.output().expect("execution succeeds"))
}

#[test]
fn store_and_load_words() {
    let code = bytecode![
        push_u64(0xcafe), PUSH1, 0x40, MSTORE, PUSH1, 0x40, MLOAD, PUSH1, 0, MSTORE, PUSH1, 32,
        PUSH1, 0, RETURN
    ];

    assert_eq!(word(&TestBuilder::new(2322).run(&code)), U256::from(0xcafe));
}

#[test]
fn store_single_byte() {
    let code = bytecode![PUSH2, 0x12, 0x34, PUSH1, 31, MSTORE8, PUSH1, 32, PUSH1, 0, RETURN];

    assert_eq!(word(&TestBuilder::new(2322).run(&code)), U256::from(0x34));
}

#[test]
fn msize_grows_with_access() {
    let code = bytecode![
        MSIZE, PUSH1, 0, MSTORE, PUSH1, 33, MLOAD, POP, MSIZE, PUSH1, 0, MSTORE, PUSH1, 32,
        PUSH1, 0, RETURN
    ];

    let mut test_context = TestBuilder::new(2322);
    test_context.options(Options::default().with_memory_initial_capacity(0));

    // the load touches bytes 33..65
    assert_eq!(word(&test_context.run(&code)), U256::from(65));
}

#[test]
fn msize_starts_at_the_initial_capacity() {
    let code = bytecode![MSIZE, PUSH1, 0, MSTORE, PUSH1, 32, PUSH1, 0, RETURN];
    assert_eq!(word(&TestBuilder::new(2322).run(&code)), U256::from(1024));

    // the load touches bytes 1024..1056
    let code = bytecode![
        PUSH2, 0x04, 0x00, MLOAD, POP, MSIZE, PUSH1, 0, MSTORE, PUSH1, 32, PUSH1, 0, RETURN
    ];
    assert_eq!(word(&TestBuilder::new(2322).run(&code)), U256::from(1056));
}

#[test]
fn unwritten_memory_reads_as_zero() {
    let code = bytecode![PUSH2, 0x10, 0x00, MLOAD, PUSH1, 0, MSTORE, PUSH1, 32, PUSH1, 0, RETURN];

    assert_eq!(word(&TestBuilder::new(2322).run(&code)), U256::zero());
}

#[test]
fn growth_is_bounded() {
    let mut test_context = TestBuilder::new(2322);
    test_context.options(Options::default().with_memory_max_capacity(64));

    let code = bytecode![PUSH1, 1, PUSH1, 32, MSTORE, STOP];
    test_context.run(&code).output().expect("fits in 64 bytes");

    let code = bytecode![PUSH1, 1, PUSH1, 33, MSTORE, STOP];
    let outcome = test_context.run(&code);
    assert_eq!(
        outcome.error().expect("65 bytes").code(),
        ErrorCode::MemoryOutOfBounds
    );

    let code = bytecode![push_u64(DEFAULT_MEMORY_MAX_CAPACITY), MLOAD];
    let outcome = TestBuilder::new(2322).run(&code);
    assert_eq!(
        outcome.error().expect("past the default maximum").code(),
        ErrorCode::MemoryOutOfBounds
    );
}

#[test]
fn memory_is_not_metered() {
    let near = bytecode![PUSH1, 1, PUSH1, 0, MSTORE, STOP];
    let far = bytecode![PUSH1, 1, push_u64(0x1000), MSTORE, STOP];

    let near = TestBuilder::new(2322).run(&near);
    let far = TestBuilder::new(2322).run(&far);

    near.output().expect("near write");
    far.output().expect("far write");
    assert_eq!(near.gas_used, far.gas_used);
}

#[test]
fn zero_length_return_from_huge_offset() {
    let code = bytecode![PUSH1, 0, push_bytes(&[0xff; 32]), RETURN];

    assert_eq!(TestBuilder::new(2322).run(&code).output().expect("empty"), &[] as &[u8]);
}
