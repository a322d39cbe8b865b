//! Unit tests for the reference executor.

use std::{cell::Cell, rc::Rc};

use super::{errors::RuntimeError, interpreter::Interpreter};
use crate::{compiler::ir::Module, driver::Session};

fn module(source: &str) -> Module {
    let mut session = Session::new();
    let int64 = session.types().int64();
    session.declare_library_function("twice", vec![int64.clone()], int64);

    session.compile(source, "test.lang").unwrap().module
}

#[test]
fn test_print_and_input() {
    let module = module("void echo() { print(input() + 1); print(input()); }");
    let mut interpreter = Interpreter::new(&module).with_input([41, 7]);

    assert_eq!(interpreter.run_function("echo", &[]), Ok(None));
    assert_eq!(interpreter.output(), &[42, 7]);
}

#[test]
fn test_input_exhausted() {
    let module = module("int64 read() { return input(); }");
    let mut interpreter = Interpreter::new(&module);

    assert_eq!(
        interpreter.run_function("read", &[]),
        Err(RuntimeError::InputExhausted)
    );
}

#[test]
fn test_loop_and_branch() {
    let module = module(
        "int64 sum_to(int64 n) {
             int64 i, total;
             while (i < n) {
                 i = i + 1;
                 if (i > 2) { total = total + i; }
             }
             return total;
         }",
    );
    let mut interpreter = Interpreter::new(&module);

    assert_eq!(interpreter.run_function("sum_to", &[5]), Ok(Some(12)));
}

#[test]
fn test_recursion() {
    let module = module(
        "int64 fact(int64 n) {
             if (n < 2) { return 1; }
             return n * fact(n - 1);
         }",
    );
    let mut interpreter = Interpreter::new(&module);

    assert_eq!(interpreter.run_function("fact", &[10]), Ok(Some(3628800)));
}

#[test]
fn test_host_function() {
    let module = module("int64 f(int64 x) { return twice(x) + twice(1); }");
    let calls = Rc::new(Cell::new(0));
    let counted = calls.clone();

    let mut interpreter = Interpreter::new(&module);
    interpreter.register_host_function("twice", move |arguments| {
        counted.set(counted.get() + 1);
        arguments[0] * 2
    });

    assert_eq!(interpreter.run_function("f", &[20]), Ok(Some(42)));
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_unregistered_library_function() {
    let module = module("int64 f() { return twice(1); }");
    let mut interpreter = Interpreter::new(&module);

    assert_eq!(
        interpreter.run_function("f", &[]),
        Err(RuntimeError::UnknownFunction {
            function: String::from("twice")
        })
    );
}

#[test]
fn test_unknown_function_and_argument_count() {
    let module = module("int64 id(int64 x) { return x; }");
    let mut interpreter = Interpreter::new(&module);

    assert!(matches!(
        interpreter.run_function("missing", &[]),
        Err(RuntimeError::UnknownFunction { .. })
    ));
    assert_eq!(
        interpreter.run_function("id", &[]),
        Err(RuntimeError::ArgumentCount {
            function: String::from("id"),
            expected: 1,
            received: 0
        })
    );
}

#[test]
fn test_unbound_reference_is_null() {
    let module = module("int64 f() { int64& r; return r; }");
    let mut interpreter = Interpreter::new(&module);

    assert_eq!(
        interpreter.run_function("f", &[]),
        Err(RuntimeError::NullDereference)
    );
}

#[test]
fn test_falling_off_non_void_function() {
    let module = module("int64 f(int64 x) { if (x > 0) { return 1; } }");
    let mut interpreter = Interpreter::new(&module);

    assert_eq!(interpreter.run_function("f", &[1]), Ok(Some(1)));
    assert_eq!(
        interpreter.run_function("f", &[0]),
        Err(RuntimeError::Unreachable {
            function: String::from("f")
        })
    );
}

#[test]
fn test_step_limit() {
    let module = module("void spin() { while (0 < 1) { } }");
    let mut interpreter = Interpreter::new(&module).with_step_limit(1_000);

    assert_eq!(
        interpreter.run_function("spin", &[]),
        Err(RuntimeError::StepLimitExceeded { limit: 1_000 })
    );
}

#[test]
fn test_call_depth_limit() {
    let module = module("int64 down(int64 n) { return down(n + 1); }");
    let mut interpreter = Interpreter::new(&module).with_call_depth_limit(16);

    assert_eq!(
        interpreter.run_function("down", &[0]),
        Err(RuntimeError::CallDepthExceeded { limit: 16 })
    );
}

#[test]
fn test_frames_release_their_storage() {
    let module = module("int64 f() { int64[4] a; a[3] = 5; return a[3]; }");
    let mut interpreter = Interpreter::new(&module);
    let before = interpreter.memory().size();

    assert_eq!(interpreter.run_function("f", &[]), Ok(Some(5)));
    assert_eq!(interpreter.memory().size(), before);
}

#[test]
fn test_huge_local_is_out_of_memory() {
    let module = module("int64 f() { int64[2305843009213693952] a; return 1; }");
    let mut interpreter = Interpreter::new(&module);

    assert!(matches!(
        interpreter.run_function("f", &[]),
        Err(RuntimeError::OutOfMemory { .. })
    ));
}

#[test]
fn test_memory_limit() {
    let module = module("int64 f() { int64[64] a; a[0] = 1; return a[0]; }");

    let mut roomy = Interpreter::new(&module).with_memory_limit(1024);
    assert_eq!(roomy.run_function("f", &[]), Ok(Some(1)));

    let mut cramped = Interpreter::new(&module).with_memory_limit(256);
    assert_eq!(
        cramped.run_function("f", &[]),
        Err(RuntimeError::OutOfMemory {
            requested: 512,
            limit: 256
        })
    );
    assert!(matches!(
        cramped.allocate_array(&[0; 64]),
        Err(RuntimeError::OutOfMemory { .. })
    ));
}
