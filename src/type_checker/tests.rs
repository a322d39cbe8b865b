//! Unit tests for the type-assignment pass.

use std::sync::Arc;

use super::{
    stdlib::builtin_library,
    type_checker::{type_check, FunctionScope},
};
use crate::{
    ast::{
        ast::{TypedInstruction, TypedProgram, TypedValue},
        expressions::ValueKind,
        statements::InstructionKind,
    },
    errors::errors::{Error, ErrorKind},
    lexer::lexer::tokenize,
    parser::parser::parse,
    types::{type_table::TypeTable, types::ValueCategory},
    Position,
};

fn check(source: &str) -> (TypeTable, Result<TypedProgram, Error>) {
    let types = TypeTable::new();
    let tokens = tokenize(source.to_string(), Some("test.lang".to_string())).unwrap();
    let program = parse(tokens, Arc::new("test.lang".to_string()), &types).unwrap();
    let library = builtin_library(&types);
    let result = type_check(program, &types, &library);
    (types, result)
}

fn error_name(source: &str) -> String {
    let (_, result) = check(source);
    result.unwrap_err().get_error_name().to_string()
}

fn returned_value(instruction: &TypedInstruction) -> &TypedValue {
    match &instruction.kind {
        InstructionKind::Return { value: Some(value) } => value,
        other => panic!("expected a return with a value, found {:?}", other),
    }
}

fn assigned_source(instruction: &TypedInstruction) -> &TypedValue {
    match &instruction.kind {
        InstructionKind::Assign { src, .. } => src,
        other => panic!("expected an assignment, found {:?}", other),
    }
}

#[test]
fn test_scope_rejects_redeclaration() {
    let types = TypeTable::new();
    let mut scope = FunctionScope::new();

    scope.declare_variable("x", types.int64(), &Position::null()).unwrap();
    let error = scope
        .declare_variable("x", types.int64(), &Position::null())
        .unwrap_err();

    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");
    assert_eq!(scope.get_variable("x"), Some(&types.int64()));
}

#[test]
fn test_literals_and_operators_are_prvalues() {
    let (types, result) = check("int64 add(int64 a, int64 b) { return a + b; }");
    let program = result.unwrap();
    let function = &program.functions[0];

    let value = returned_value(&function.body.instructions[0]);
    assert_eq!(value.ty, types.literal_type());
    assert_eq!(function.body.instructions[0].ty, types.literal_type());

    let ValueKind::BinaryOp { lhs, .. } = &value.kind else {
        panic!("expected a binary operation");
    };
    assert_eq!(lhs.ty, types.int64());
}

#[test]
fn test_binary_op_dereferences_reference_lhs() {
    let (types, result) = check("int64 f(int64& r, int64 x) { return r + x; }");
    let program = result.unwrap();

    let value = returned_value(&program.functions[0].body.instructions[0]);
    assert_eq!(value.ty, types.literal_type());
}

#[test]
fn test_call_records_declared_arg_types() {
    let (types, result) = check(
        "int64 f(int64& a, int64 b) { return b; }
         int64 g() { int64 x; x = 1; return f(x, 2); }",
    );
    let program = result.unwrap();

    let call = returned_value(&program.functions[1].body.instructions[2]);
    let ValueKind::Call {
        callee,
        declared_arg_types,
        arguments,
    } = &call.kind
    else {
        panic!("expected a call");
    };

    let int_ref = types.as_reference(&types.int64()).unwrap();
    assert_eq!(declared_arg_types, &vec![int_ref, types.int64()]);
    assert_eq!(arguments[1].ty, types.literal_type());
    assert_eq!(call.ty, types.literal_type());

    let ValueKind::FunctionRef {
        declared_return_type,
        ..
    } = &callee.kind
    else {
        panic!("expected a function reference");
    };
    assert_eq!(declared_return_type, &Some(types.int64()));
}

#[test]
fn test_call_to_reference_returning_function_is_prvalue() {
    let (types, result) = check(
        "int64& pick(int64& r) { return r; }
         int64 g() { int64 x; return pick(x) + 1; }",
    );
    let program = result.unwrap();

    let sum = returned_value(&program.functions[1].body.instructions[1]);
    let ValueKind::BinaryOp { lhs, .. } = &sum.kind else {
        panic!("expected a binary operation");
    };
    assert!(lhs.ty.is_reference());
    assert_eq!(lhs.ty.value_category(), ValueCategory::PRValue);
    assert_eq!(sum.ty, types.literal_type());
}

#[test]
fn test_index_yields_element_reference() {
    let (types, result) = check("int64 f(int64[5] arr) { return arr[2]; }");
    let program = result.unwrap();

    let value = returned_value(&program.functions[0].body.instructions[0]);
    assert_eq!(value.ty, types.as_reference(&types.int64()).unwrap());
}

#[test]
fn test_index_through_reference_to_array() {
    let (types, result) = check("int64 f(int64[5]& arr) { return arr[0]; }");
    let program = result.unwrap();

    let value = returned_value(&program.functions[0].body.instructions[0]);
    assert_eq!(value.ty, types.as_reference(&types.int64()).unwrap());
}

#[test]
fn test_array_alloc_type_and_folded_length() {
    let (types, result) = check("void f() { int64[6] a; a = [7; 2 * 3]; }");
    let program = result.unwrap();

    let src = assigned_source(&program.functions[0].body.instructions[1]);
    let array = types.array_of(&types.int64(), 6).unwrap();
    assert_eq!(src.ty, types.as_prvalue(&array));

    let ValueKind::ArrayAlloc { length, .. } = &src.kind else {
        panic!("expected an array allocation");
    };
    assert!(matches!(length.kind, ValueKind::IntegerLiteral { value: 6 }));
}

#[test]
fn test_member_access() {
    let (types, result) = check(
        "struct Pair { int64 x; int64 y; }
         int64 f(Pair p) { return p.y; }",
    );
    let program = result.unwrap();

    let value = returned_value(&program.functions[0].body.instructions[0]);
    assert_eq!(value.ty, types.as_reference(&types.int64()).unwrap());
}

#[test]
fn test_declared_variables_are_lvalues() {
    let (types, result) = check("int64 f() { int64 x; x = 3; return x; }");
    let program = result.unwrap();

    let value = returned_value(&program.functions[0].body.instructions[2]);
    assert_eq!(value.ty, types.as_lvalue(&types.int64()));
}

#[test]
fn test_instruction_types() {
    let (types, result) = check("void f() { print(1); while (1 < 2) { } return; }");
    let program = result.unwrap();
    let instructions = &program.functions[0].body.instructions;

    assert_eq!(instructions[0].ty, types.as_prvalue(&types.void()));
    assert_eq!(instructions[1].ty, types.void());
    assert_eq!(instructions[2].ty, types.void());
}

#[test]
fn test_calls_may_precede_definitions() {
    let (_, result) = check(
        "int64 first() { return second(); }
         int64 second() { return 2; }",
    );

    assert!(result.is_ok());
}

#[test]
fn test_type_errors() {
    let cases = [
        ("int64 f() { return g(); }", "UnknownFunction"),
        ("int64 f() { Foo x; return 1; }", "UnknownType"),
        ("int64 f() { return y; }", "VariableNotDeclared"),
        ("int64 f() { int64 x; int64 x; return 1; }", "VariableAlreadyDeclared"),
        ("void f() { void v; }", "VoidVariable"),
        ("int64 f(int64 a) { return a[0]; }", "NotAnArray"),
        ("int64 f(int64[2] a) { return a[0][1]; }", "RankMismatch"),
        ("int64 f(int64 n) { int64[2] a; a = [0; n]; return 1; }", "NonConstantArrayLength"),
        ("int64 f() { int64[2] a; a = [0; 0 - 2]; return 1; }", "NegativeArrayLength"),
        ("void f() { print(1, 2); }", "UnexpectedArguments"),
        ("void f() { print(); }", "MissingArguments"),
        ("void g(int64& r) { } void f() { g(1); }", "ArgumentTypeMatchError"),
        ("void g(int64[2] a) { } void f() { g(1); }", "ArgumentTypeMatchError"),
        ("int64 f() { return; }", "TypeMatchError"),
        ("void f() { return 1; }", "TypeMatchError"),
        ("int64 f(int64[2] a) { int64 x; x = a; return x; }", "IncompatibleAssignment"),
        ("void f(int64[2] a) { a = 1; }", "IncompatibleAssignment"),
        ("void f(int64[2] a, int64[3] b) { a = b; }", "TypeMatchError"),
        ("void f() { input() = 1; }", "NotAssignable"),
        ("void f(int64[2] a) { int64 x; x = a + 1; }", "InvalidOperand"),
        ("void f(int64 x) { while (x) { } }", "InvalidCondition"),
        ("void f(int64 x) { if (x + 1) { } }", "InvalidCondition"),
        ("int64 f(int64 x) { return x.y; }", "NotAStruct"),
        ("struct P { int64 x; } int64 f(P p) { return p.z; }", "UnknownMember"),
        ("int64 f() { return 1; } int64 f() { return 2; }", "FunctionAlreadyDeclared"),
        ("struct P { int64 x; } struct P { int64 y; }", "StructAlreadyDeclared"),
        ("struct P { int64 x; int64 x; }", "DuplicateMember"),
        ("struct P { Q q; }", "UnknownType"),
        ("struct A { B b; } struct B { A[2] a; }", "RecursiveStruct"),
    ];

    for (source, expected) in cases {
        assert_eq!(error_name(source), expected, "source: {}", source);
    }
}

#[test]
fn test_reference_members_do_not_recurse() {
    let (_, result) = check("struct Node { int64 value; Node& next; }");

    assert!(result.is_ok());
}

#[test]
fn test_type_errors_carry_position_and_kind() {
    let (_, result) = check("int64 f() {\n  return missing;\n}");
    let error = result.unwrap_err();

    assert_eq!(error.get_kind(), ErrorKind::Type);
    assert_eq!(error.get_position().0, 21);
    assert_eq!(error.get_position().1.as_str(), "test.lang");
}
