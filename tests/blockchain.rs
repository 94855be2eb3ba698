use evm_engine::prelude::*;

use evm_engine::crypto;
use sha2::{Digest, Sha256};
use tai64::Tai64;
use Opcode::*;

fn return_top() -> Vec<u8> {
    bytecode![PUSH1, 0, MSTORE, PUSH1, 32, PUSH1, 0, RETURN]
}

fn word(outcome: &TestOutcome) -> U256 {
    U256::from_big_endian(outcome.output().expect("execution succeeds"))
}

#[test]
fn block_environment() {
    let mut test_context = TestBuilder::new(2322);
    test_context
        .blockchain(TestBlockchain::new(77, Tai64::from_unix(1_234_567)).with_chain_id("evm-test"));

    assert_eq!(word(&test_context.run(&bytecode![NUMBER, return_top()])), U256::from(77));
    assert_eq!(
        word(&test_context.run(&bytecode![TIMESTAMP, return_top()])),
        U256::from(1_234_567)
    );
    assert_eq!(
        word(&test_context.run(&bytecode![CHAINID, return_top()])),
        U256::from_big_endian(b"evm-test")
    );
}

#[test]
fn gas_and_gaslimit_report_remaining_gas() {
    let mut test_context = TestBuilder::new(2322);
    test_context.gas_limit(1_000);

    // nothing has been charged before the first instruction
    assert_eq!(word(&test_context.run(&bytecode![GAS, return_top()])), U256::from(1_000));
    assert_eq!(word(&test_context.run(&bytecode![GASLIMIT, return_top()])), U256::from(1_000));
}

#[test]
fn block_hashes() {
    let hash = Word256::new([0x11; 32]);
    let mut test_context = TestBuilder::new(2322);
    test_context.blockchain(TestBlockchain::new(500, Tai64::UNIX_EPOCH).with_block_hash(400, hash));

    let outcome = test_context.run(&bytecode![push_u64(400), BLOCKHASH, return_top()]);
    assert_eq!(outcome.output().expect("visible"), hash.as_ref());

    let outcome = test_context.run(&bytecode![push_u64(243), BLOCKHASH]);
    assert_eq!(
        outcome.error().expect("too old").code(),
        ErrorCode::BlockNumberOutOfRange
    );

    let outcome = test_context.run(&bytecode![push_u64(501), BLOCKHASH]);
    assert_eq!(
        outcome.error().expect("future").code(),
        ErrorCode::InvalidBlockNumber
    );
}

#[test]
fn balances() {
    let mut test_context = TestBuilder::new(2322);
    let rich = test_context.setup_account(1_000);

    let outcome = test_context.run(&bytecode![push_bytes(rich.as_ref()), BALANCE, return_top()]);
    assert_eq!(word(&outcome), U256::from(1_000));

    let outcome = test_context.run(&bytecode![CALLER, BALANCE, return_top()]);
    assert_eq!(word(&outcome), U256::from(1_000_000));
}

#[test]
fn external_code() {
    let mut test_context = TestBuilder::new(2322);
    let code = bytecode![PUSH1, 1, PUSH1, 2, ADD, STOP];
    let contract = test_context.setup_contract(code.clone(), 0);

    let outcome = test_context.run(&bytecode![
        push_bytes(contract.as_ref()),
        EXTCODESIZE,
        return_top(),
    ]);
    assert_eq!(word(&outcome), U256::from(code.len()));

    let outcome = test_context.run(&bytecode![
        push_bytes(contract.as_ref()),
        EXTCODEHASH,
        return_top(),
    ]);
    assert_eq!(outcome.output().expect("hashes"), crypto::keccak256(&code).as_ref());

    let copy = bytecode![
        push_u64(code.len() as u64), PUSH1, 0, PUSH1, 0, push_bytes(contract.as_ref()), EXTCODECOPY,
        push_u64(code.len() as u64), PUSH1, 0, RETURN
    ];
    assert_eq!(test_context.run(&copy).output().expect("copies"), code.as_slice());

    let past_end = bytecode![
        PUSH1, 1, PUSH1, 7, PUSH1, 0, push_bytes(contract.as_ref()), EXTCODECOPY,
    ];
    assert_eq!(
        test_context.run(&past_end).error().expect("offset past the code").code(),
        ErrorCode::CodeOutOfBounds
    );
}

#[test]
fn native_code_cannot_be_copied() {
    let mut test_context = TestBuilder::new(2322);
    let sha256 = Address::left_pad(&[2]);

    let outcome = test_context.run(&bytecode![
        PUSH1, 1, PUSH1, 0, PUSH1, 0, push_bytes(sha256.as_ref()), EXTCODECOPY,
    ]);
    assert_eq!(
        outcome.error().expect("native").code(),
        ErrorCode::NativeContractCodeCopy
    );

    let outcome = test_context.run(&bytecode![
        push_bytes(sha256.as_ref()),
        EXTCODESIZE,
        return_top(),
    ]);
    assert_eq!(word(&outcome), U256::zero());
}

#[test]
fn precompiles_are_callable() {
    let mut test_context = TestBuilder::new(2322);

    // sha256 of the three bytes "abc" stored at 29..32
    let code = bytecode![
        push_bytes(b"abc"), PUSH1, 0, MSTORE, PUSH1, 32, PUSH1, 32, PUSH1, 3, PUSH1, 29, PUSH1, 2,
        push_u64(10_000), STATICCALL, POP, PUSH1, 32, PUSH1, 32, RETURN
    ];
    let outcome = test_context.run(&code);

    assert_eq!(outcome.output().expect("hashes"), Sha256::digest(b"abc").as_slice());

    let natives = outcome
        .events
        .calls()
        .filter(|call| call.callee == Address::left_pad(&[2]))
        .count();
    assert_eq!(natives, 1);
}

#[test]
fn storage_survives_between_calls() {
    let mut test_context = TestBuilder::new(2322);
    let counter = test_context.setup_contract(
        bytecode![PUSH1, 0, SLOAD, PUSH1, 1, ADD, DUP1, PUSH1, 0, SSTORE, return_top()],
        0,
    );

    for expected in 1..=3u64 {
        let outcome = test_context.call(&counter, vec![], 0);
        assert_eq!(word(&outcome), U256::from(expected));
    }

    assert_eq!(
        test_context.storage_at(&counter, &Word256::zeroed()),
        Word256::left_pad(&[3]).to_vec()
    );
}
