use evm_engine::prelude::*;

use evm_engine::permission::DEFAULT_PERM_FLAGS;
use Opcode::*;

const CALL_GAS: u64 = 50_000;

fn return_top() -> Vec<u8> {
    bytecode![PUSH1, 0, MSTORE, PUSH1, 32, PUSH1, 0, RETURN]
}

/// Call `target` with no input, leaving the success flag on the stack and up to 32 bytes of
/// output at memory zero.
fn call(op: Opcode, target: &Address, value: u64) -> Vec<u8> {
    let value = match op {
        CALL | CALLCODE => push_u64(value),
        _ => vec![],
    };

    bytecode![
        PUSH1, 32, PUSH1, 0, PUSH1, 0, PUSH1, 0, value, push_bytes(target.as_ref()),
        push_u64(CALL_GAS), op
    ]
}

fn word(output: &[u8]) -> U256 {
    U256::from_big_endian(output)
}

fn flag_and_output(output: &[u8]) -> (U256, U256) {
    (word(&output[..32]), word(&output[32..]))
}

/// Return the flag in the first word and the call output in the second.
fn return_flag_and_output() -> Vec<u8> {
    bytecode![PUSH1, 32, MSTORE, PUSH1, 64, PUSH1, 0, RETURN]
}

#[test]
fn call_returns_output_of_callee() {
    let mut test_context = TestBuilder::new(2322);
    let callee = test_context.setup_contract(bytecode![PUSH1, 42, return_top()], 0);

    // the flag lands at 32 and the returned word stays at 0
    let caller = bytecode![call(CALL, &callee, 0), PUSH1, 32, MSTORE, PUSH1, 64, PUSH1, 0, RETURN];
    let outcome = test_context.run(&caller);
    let output = outcome.output().expect("call succeeds");

    assert_eq!(word(&output[..32]), U256::from(42));
    assert_eq!(word(&output[32..]), U256::one());

    let calls = outcome.events.calls().collect::<Vec<_>>();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].callee, callee);
    assert_eq!(calls[0].stack_depth, 1);
    assert_eq!(calls[1].stack_depth, 0);
}

#[test]
fn return_data_is_kept_after_call() {
    let mut test_context = TestBuilder::new(2322);
    let callee = test_context.setup_contract(bytecode![PUSH1, 7, return_top()], 0);

    let caller = bytecode![
        call(CALL, &callee, 0), POP, RETURNDATASIZE, PUSH1, 0, PUSH1, 32, RETURNDATACOPY,
        RETURNDATASIZE, PUSH1, 0, MSTORE, PUSH1, 64, PUSH1, 0, RETURN
    ];
    let outcome = test_context.run(&caller);
    let (size, data) = flag_and_output(outcome.output().expect("call succeeds"));

    assert_eq!(size, U256::from(32));
    assert_eq!(data, U256::from(7));
}

#[test]
fn failed_call_pushes_zero_and_discards_state() {
    let mut test_context = TestBuilder::new(2322);
    let key = Word256::left_pad(&[1]);
    let callee = test_context.setup_contract(
        bytecode![
            PUSH1, 9, PUSH1, 1, SSTORE, PUSH1, 0xee, PUSH1, 0, MSTORE8, PUSH1, 1, PUSH1, 0, REVERT,
        ],
        0,
    );

    let caller = bytecode![call(CALL, &callee, 0), return_flag_and_output()];
    let outcome = test_context.run(&caller);
    let (output, flag) = flag_and_output(outcome.output().expect("caller survives"));

    assert_eq!(flag, U256::zero());
    // the revert output is copied into the caller's memory
    assert_eq!(output, U256::from(0xee) << 248);
    assert_eq!(test_context.storage_at(&callee, &key), vec![0; 32]);
}

#[test]
fn nested_failures_are_reported_deepest_first() {
    let mut test_context = TestBuilder::new(2322);
    let inner = test_context.setup_contract(bytecode![INVALID], 0);
    let middle = test_context.setup_contract(
        bytecode![call(CALL, &inner, 0), PUSH1, 0, PUSH1, 0, REVERT],
        0,
    );

    let caller = bytecode![call(CALL, &middle, 0), INVALID];
    let outcome = test_context.run(&caller);
    let err = outcome.error().expect("caller aborts");

    assert_eq!(err.code(), ErrorCode::ExecutionAborted);

    let nested = err.nested_errors();
    assert_eq!(nested.len(), 2);
    assert_eq!(nested[0].callee, inner);
    assert_eq!(nested[0].stack_depth, 2);
    assert_eq!(nested[0].error.code(), ErrorCode::ExecutionAborted);
    assert_eq!(nested[1].callee, middle);
    assert_eq!(nested[1].stack_depth, 1);
    assert!(nested[1].error.is_revert());
}

#[test]
fn static_call_forbids_writes() {
    let mut test_context = TestBuilder::new(2322);
    let writer = test_context.setup_contract(bytecode![PUSH1, 1, PUSH1, 1, SSTORE, STOP], 0);
    let reader = test_context.setup_contract(bytecode![PUSH1, 1, SLOAD, return_top()], 0);
    let logger = test_context.setup_contract(bytecode![PUSH1, 0, PUSH1, 0, LOG0, STOP], 0);

    for (target, expected) in [(writer, 0), (reader, 1), (logger, 0)] {
        let caller = bytecode![call(STATICCALL, &target, 0), return_top()];
        let outcome = test_context.run(&caller);

        assert_eq!(
            word(outcome.output().expect("caller survives")),
            U256::from(expected)
        );
    }

    assert_eq!(
        test_context.storage_at(&writer, &Word256::left_pad(&[1])),
        vec![0; 32]
    );
}

#[test]
fn delegate_call_runs_in_caller_context() {
    let mut test_context = TestBuilder::new(2322);
    let library = test_context.setup_contract(
        bytecode![CALLER, PUSH1, 5, SSTORE, ADDRESS, PUSH1, 6, SSTORE, STOP],
        0,
    );
    let proxy = test_context.setup_contract(
        bytecode![call(DELEGATECALL, &library, 0), return_top()],
        0,
    );

    let outcome = test_context.call(&proxy, vec![], 0);
    assert_eq!(word(outcome.output().expect("proxy runs")), U256::one());

    let caller = test_context.caller();
    assert_eq!(
        test_context.storage_at(&proxy, &Word256::left_pad(&[5])),
        Word256::left_pad(caller.as_ref()).to_vec()
    );
    assert_eq!(
        test_context.storage_at(&proxy, &Word256::left_pad(&[6])),
        Word256::left_pad(proxy.as_ref()).to_vec()
    );
    assert_eq!(
        test_context.storage_at(&library, &Word256::left_pad(&[5])),
        vec![0; 32]
    );
}

#[test]
fn value_transfers() {
    let mut test_context = TestBuilder::new(2322);
    let payer = test_context.setup_account(0);
    let receiver = test_context.setup_account(0);
    let missing = test_context.random_address();
    let code = bytecode![
        call(CALL, &receiver, 30),
        call(CALL, &missing, 0),
        ADD,
        return_top()
    ];

    let payer_contract = Account {
        balance: 100,
        ..Account::with_evm_code(payer, code)
    };
    test_context
        .storage_mut()
        .update_account(payer_contract)
        .expect("writable");

    let outcome = test_context.call(&payer, vec![], 0);
    assert_eq!(word(outcome.output().expect("payer runs")), U256::from(2));

    assert_eq!(test_context.account(&payer).expect("exists").balance, 70);
    assert_eq!(test_context.account(&receiver).expect("exists").balance, 30);
    assert!(test_context.account(&missing).is_none());
}

#[test]
fn valued_call_creates_account_with_permission() {
    let mut test_context = TestBuilder::new(2322);
    let payer = test_context.random_address();
    let fresh = test_context.random_address();

    test_context
        .storage_mut()
        .update_account(Account {
            balance: 10,
            ..Account::with_evm_code(payer, bytecode![call(CALL, &fresh, 4), return_top()])
        })
        .expect("writable");

    let outcome = test_context.call(&payer, vec![], 0);
    assert_eq!(word(outcome.output().expect("payer runs")), U256::one());
    assert_eq!(test_context.account(&fresh).expect("created").balance, 4);

    let denied = test_context.random_address();
    test_context
        .storage_mut()
        .update_account(Account {
            balance: 10,
            ..Account::with_evm_code(
                denied,
                bytecode![call(CALL, &fixed_address(7), 4), return_top()],
            )
        })
        .expect("writable");

    let mut base = BasePermissions::with_all_set(DEFAULT_PERM_FLAGS);
    base.set(PermFlag::CREATE_ACCOUNT, false);
    test_context
        .set_permissions(&denied, AccountPermissions::new(base))
        .expect("account exists");

    let outcome = test_context.call(&denied, vec![], 0);
    assert_eq!(word(outcome.output().expect("caller survives")), U256::zero());
    assert!(test_context.account(&fixed_address(7)).is_none());
}

fn fixed_address(byte: u8) -> Address {
    Address::new([byte; 20])
}

#[test]
fn call_depth_is_bounded() {
    let mut test_context = TestBuilder::new(2322);
    let leaf = test_context.setup_contract(bytecode![PUSH1, 1, return_top()], 0);
    let middle = test_context.setup_contract(bytecode![call(CALL, &leaf, 0), return_top()], 0);
    let caller = bytecode![call(CALL, &middle, 0), POP, PUSH1, 32, PUSH1, 0, RETURN];

    let outcome = test_context.run(&caller);
    assert_eq!(word(outcome.output().expect("runs")), U256::one());

    test_context.options(Options::default().with_call_stack_max_depth(1));
    let outcome = test_context.run(&caller);
    assert_eq!(word(outcome.output().expect("runs")), U256::zero());
}

#[test]
fn sub_call_gas_is_refunded() {
    let mut test_context = TestBuilder::new(2322);
    let callee = test_context.setup_contract(bytecode![STOP], 0);

    let outcome = test_context.run(&bytecode![call(CALL, &callee, 0), STOP]);

    outcome.output().expect("runs");
    // seven pushes and pops, one account lookup and the flag
    assert_eq!(outcome.gas_used, 7 + 7 + 1 + 1);
}

/// Overwrite the first word of memory with `0xff` bytes.
fn dirty_first_word() -> Vec<u8> {
    bytecode![push_bytes(&[0xff; 32]), PUSH1, 0, MSTORE]
}

#[test]
fn short_output_is_zero_padded_to_the_requested_size() {
    let mut test_context = TestBuilder::new(2322);
    let returns = test_context.setup_contract(
        bytecode![PUSH1, 1, PUSH1, 0, MSTORE8, PUSH1, 1, PUSH1, 0, RETURN],
        0,
    );
    let reverts = test_context.setup_contract(
        bytecode![PUSH1, 1, PUSH1, 0, MSTORE8, PUSH1, 1, PUSH1, 0, REVERT],
        0,
    );

    for (target, expected_flag) in [(returns, 1), (reverts, 0)] {
        let caller = bytecode![
            dirty_first_word(),
            call(CALL, &target, 0),
            return_flag_and_output()
        ];
        let outcome = test_context.run(&caller);
        let (output, flag) = flag_and_output(outcome.output().expect("caller survives"));

        assert_eq!(flag, U256::from(expected_flag));
        assert_eq!(output, U256::one() << 248);
    }
}

#[test]
fn long_output_is_truncated_to_the_requested_size() {
    let mut test_context = TestBuilder::new(2322);
    let callee = test_context.setup_contract(
        bytecode![PUSH1, 0xaa, PUSH1, 63, MSTORE8, PUSH1, 64, PUSH1, 0, RETURN],
        0,
    );

    // the second output word would carry 0xaa if it were copied
    let caller = bytecode![
        PUSH1, 0x77, PUSH1, 32, MSTORE, call(CALL, &callee, 0), POP, PUSH1, 64, PUSH1, 0,
        RETURN
    ];
    let outcome = test_context.run(&caller);
    let (first, second) = flag_and_output(outcome.output().expect("caller survives"));

    assert_eq!(first, U256::zero());
    assert_eq!(second, U256::from(0x77));
}

#[test]
fn value_sent_to_a_native_fails_the_sub_call() {
    let mut test_context = TestBuilder::new(2322);
    let payer = Address::left_pad(&[1]);
    let identity = Address::left_pad(&[4]);

    test_context
        .storage_mut()
        .update_account(Account {
            balance: 100,
            ..Account::with_evm_code(payer, bytecode![call(CALL, &identity, 1), return_top()])
        })
        .expect("writable");

    let outcome = test_context.call(&payer, vec![], 0);
    assert_eq!(word(outcome.output().expect("payer survives")), U256::zero());

    assert_eq!(test_context.account(&payer).expect("exists").balance, 100);
    assert!(test_context.account(&identity).is_none());

    // a zero-value call still reaches the native
    let caller = bytecode![call(CALL, &identity, 0), return_top()];
    assert_eq!(word(test_context.run(&caller).output().expect("runs")), U256::one());
}

#[test]
fn self_destruct_to_a_native_fails() {
    let mut test_context = TestBuilder::new(2322);
    let identity = Address::left_pad(&[4]);
    let contract = test_context.setup_contract(
        bytecode![push_bytes(identity.as_ref()), SELFDESTRUCT],
        10,
    );

    let outcome = test_context.call(&contract, vec![], 0);

    assert_eq!(
        outcome.error().expect("native receiver").code(),
        ErrorCode::ReservedAddress
    );
    assert_eq!(test_context.account(&contract).expect("kept").balance, 10);
    assert!(test_context.account(&identity).is_none());
}

#[test]
fn static_call_forbids_self_destruct() {
    let mut test_context = TestBuilder::new(2322);
    let receiver = test_context.setup_account(0);
    let target = test_context.setup_contract(
        bytecode![push_bytes(receiver.as_ref()), SELFDESTRUCT],
        10,
    );

    let caller = bytecode![call(STATICCALL, &target, 0), return_top()];
    let outcome = test_context.run(&caller);

    assert_eq!(word(outcome.output().expect("caller survives")), U256::zero());
    assert_eq!(test_context.account(&target).expect("kept").balance, 10);
    assert_eq!(test_context.account(&receiver).expect("exists").balance, 0);
}

#[test]
fn gas_use_is_deterministic() {
    fn run_once(gas_limit: u64) -> TestOutcome {
        let mut test_context = TestBuilder::new(2322);
        let callee = test_context.setup_contract(
            bytecode![PUSH1, 3, PUSH1, 1, SSTORE, PUSH1, 32, PUSH1, 0, SHA3, return_top()],
            0,
        );
        test_context.gas_limit(gas_limit);

        let caller = bytecode![
            call(CALL, &callee, 0),
            call(CALL, &Address::left_pad(&[2]), 0),
            ADD,
            return_flag_and_output()
        ];

        test_context.run(&caller)
    }

    for gas_limit in [1_000_000, 20] {
        let first = run_once(gas_limit);

        for _ in 0..3 {
            let again = run_once(gas_limit);

            assert_eq!(again.gas_used, first.gas_used);
            assert_eq!(again.result, first.result);
        }
    }

    assert!(run_once(1_000_000).output().is_ok());
    assert_eq!(
        run_once(20).error().expect("two calls need more").code(),
        ErrorCode::InsufficientGas
    );
}
