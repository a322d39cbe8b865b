//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Function definitions and parameters
//! - Declarations, assignments and call statements
//! - Expressions (flat left-associative chains, calls, indexing, members)
//! - Control flow statements
//! - Struct definitions and type annotations

use std::sync::Arc;

use super::parser::parse;
use crate::{
    ast::{
        ast::{UntypedInstruction, UntypedProgram},
        expressions::{BinaryOperator, ValueKind},
        statements::InstructionKind,
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
    types::{type_table::TypeTable, types::ValueCategory},
};

fn parse_source(source: &str) -> (TypeTable, Result<UntypedProgram, Error>) {
    let types = TypeTable::new();
    let tokens = tokenize(source.to_string(), Some("test.lang".to_string())).unwrap();
    let result = parse(tokens, Arc::new("test.lang".to_string()), &types);
    (types, result)
}

fn body_of(source: &str) -> Vec<UntypedInstruction> {
    let (_, result) = parse_source(source);
    let mut program = result.unwrap();
    program.functions.remove(0).body.instructions
}

#[test]
fn test_parse_function_declaration() {
    let (types, result) = parse_source("int64 add(int64 a, int64 b) { return a + b; }");
    let program = result.unwrap();

    assert_eq!(program.functions.len(), 1);
    let function = &program.functions[0];
    assert_eq!(function.name, "add");
    assert_eq!(function.return_type, types.int64());
    assert_eq!(function.params.len(), 2);
    assert_eq!(function.params[0].variable_name(), Some("a"));
    assert_eq!(function.params[1].ty, Some(types.int64()));
    assert_eq!(function.body.instructions.len(), 1);
}

#[test]
fn test_parse_reference_and_array_parameters() {
    let (types, result) = parse_source("void f(int64& r, int64[5] arr, int64[3]& view) { }");
    let program = result.unwrap();
    let params = &program.functions[0].params;

    let int_ref = types.as_reference(&types.int64()).unwrap();
    let array = types.array_of(&types.int64(), 5).unwrap();
    let array_ref = types
        .as_reference(&types.array_of(&types.int64(), 3).unwrap())
        .unwrap();

    assert_eq!(params[0].ty, Some(int_ref));
    assert_eq!(params[1].ty, Some(array));
    assert_eq!(params[2].ty, Some(array_ref));
    assert_eq!(program.functions[0].return_type, types.void());
}

#[test]
fn test_parse_declaration_list() {
    let (types, result) = parse_source("void f() { int64 a, b; int64[2] arr; }");
    let program = result.unwrap();
    let instructions = &program.functions[0].body.instructions;

    let InstructionKind::Decl { variables } = &instructions[0].kind else {
        panic!("expected a declaration, found {:?}", instructions[0].kind);
    };
    assert_eq!(variables.len(), 2);
    assert_eq!(variables[1].variable_name(), Some("b"));
    let ty = variables[0].ty.clone().unwrap();
    assert_eq!(ty.value_category(), ValueCategory::LValue);
    assert_eq!(ty, types.as_lvalue(&types.int64()));

    let InstructionKind::Decl { variables } = &instructions[1].kind else {
        panic!("expected a declaration");
    };
    assert_eq!(variables[0].ty.as_ref().map(|ty| ty.name().to_string()), Some("int64[2]".to_string()));
}

#[test]
fn test_parse_binary_chain_is_left_associative() {
    let body = body_of("int64 f(int64 a, int64 b, int64 c) { return a + b * c; }");

    let InstructionKind::Return { value: Some(value) } = &body[0].kind else {
        panic!("expected a return with a value");
    };

    let ValueKind::BinaryOp { operator, lhs, rhs } = &value.kind else {
        panic!("expected a binary operation");
    };
    assert_eq!(*operator, BinaryOperator::Mul);
    assert_eq!(rhs.variable_name(), Some("c"));

    let ValueKind::BinaryOp { operator, .. } = &lhs.kind else {
        panic!("expected a nested binary operation");
    };
    assert_eq!(*operator, BinaryOperator::Add);
}

#[test]
fn test_parse_literal_has_type() {
    let (types, result) = parse_source("int64 f() { return 42; }");
    let program = result.unwrap();

    let InstructionKind::Return { value: Some(value) } = &program.functions[0].body.instructions[0].kind
    else {
        panic!("expected a return with a value");
    };
    assert!(matches!(value.kind, ValueKind::IntegerLiteral { value: 42 }));
    assert_eq!(value.ty, Some(types.literal_type()));
}

#[test]
fn test_parse_call_statement() {
    let body = body_of("void f() { print(1 + 2); }");

    let InstructionKind::ExprStmt { call } = &body[0].kind else {
        panic!("expected a call statement");
    };
    let ValueKind::Call { callee, arguments, declared_arg_types } = &call.kind else {
        panic!("expected a call");
    };
    assert!(matches!(&callee.kind, ValueKind::FunctionRef { name, .. } if name == "print"));
    assert_eq!(arguments.len(), 1);
    assert!(declared_arg_types.is_empty());
}

#[test]
fn test_parse_assignments() {
    let body = body_of("void f() { int64[3] arr; arr[1] = 7; x = input(); p.x = 1; }");

    let InstructionKind::Assign { dst, .. } = &body[1].kind else {
        panic!("expected an assignment");
    };
    let ValueKind::Index { base, indices } = &dst.kind else {
        panic!("expected an index destination");
    };
    assert_eq!(base.variable_name(), Some("arr"));
    assert_eq!(indices.len(), 1);

    let InstructionKind::Assign { src, .. } = &body[2].kind else {
        panic!("expected an assignment");
    };
    assert!(src.is_call());

    let InstructionKind::Assign { dst, .. } = &body[3].kind else {
        panic!("expected an assignment");
    };
    assert!(matches!(&dst.kind, ValueKind::Member { member, .. } if member == "x"));
}

#[test]
fn test_parse_chained_indices_collect() {
    let body = body_of("void f() { x = arr[1][2]; }");

    let InstructionKind::Assign { src, .. } = &body[0].kind else {
        panic!("expected an assignment");
    };
    let ValueKind::Index { indices, .. } = &src.kind else {
        panic!("expected an index");
    };
    assert_eq!(indices.len(), 2);
}

#[test]
fn test_parse_array_allocation() {
    let body = body_of("void f() { int64[3] a; a = [counter(); 3]; }");

    let InstructionKind::Assign { src, .. } = &body[1].kind else {
        panic!("expected an assignment");
    };
    let ValueKind::ArrayAlloc { length, init_value } = &src.kind else {
        panic!("expected an array allocation");
    };
    assert!(matches!(length.kind, ValueKind::IntegerLiteral { value: 3 }));
    assert!(init_value.is_call());
}

#[test]
fn test_parse_control_flow() {
    let body = body_of(
        "void f() { int64 i; while (i < 10) { if (i == 5) { break; } i = i + 1; continue; } { } }",
    );

    let InstructionKind::While { condition, body: loop_body } = &body[1].kind else {
        panic!("expected a while loop");
    };
    assert!(condition.is_comparison());

    let InstructionKind::Block(block) = &loop_body.kind else {
        panic!("expected a block body");
    };
    assert_eq!(block.instructions.len(), 3);
    assert!(matches!(block.instructions[0].kind, InstructionKind::If { .. }));
    assert!(matches!(block.instructions[2].kind, InstructionKind::Continue));

    assert!(matches!(body[2].kind, InstructionKind::Block(_)));
}

#[test]
fn test_parse_struct_declaration() {
    let (types, result) = parse_source("struct Pair { int64 x; int64 y; }; Pair make() { Pair p; return p; }");
    let program = result.unwrap();

    assert_eq!(program.structs.len(), 1);
    let pair = &program.structs[0];
    assert_eq!(pair.name, "Pair");
    assert_eq!(pair.member_names, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(pair.member_name_to_index.get("y"), Some(&1));
    assert_eq!(pair.member_types[0], types.int64());

    assert!(program.functions[0].return_type.is_struct());
}

#[test]
fn test_parse_missing_semicolon() {
    let (_, result) = parse_source("int64 f() { return 1 }");
    let error = result.unwrap_err();

    assert_eq!(error.get_error_name(), "UnexpectedToken");
    assert_eq!(error.get_position().0, 21);
}

#[test]
fn test_parse_bare_expression_statement_is_rejected() {
    let (_, result) = parse_source("void f() { 1 + 2; }");

    assert_eq!(result.unwrap_err().get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_reference_to_reference_is_rejected() {
    let (_, result) = parse_source("void f(int64&& r) { }");

    assert_eq!(result.unwrap_err().get_error_name(), "ReferenceToReference");
}

#[test]
fn test_parse_unterminated_block() {
    let (_, result) = parse_source("void f() { return;");

    assert!(result.is_err());
}
