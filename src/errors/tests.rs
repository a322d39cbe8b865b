//! Unit tests for error handling.
//!
//! This module contains tests for error types, kinds and error reporting.

use std::sync::Arc;

use crate::errors::errors::{Error, ErrorImpl, ErrorKind, ErrorTip};
use crate::Position;

fn position(offset: u32) -> Position {
    Position(offset, Arc::new("test.lang".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        position(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_kind(), ErrorKind::Syntax);
}

#[test]
fn test_error_position() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        position(42),
    );

    assert_eq!(error.get_position().0, 42);
}

#[test]
fn test_with_position_only_fills_null_positions() {
    let error = Error::unpositioned(ErrorImpl::NonConstantArrayLength).with_position(&position(7));
    assert_eq!(error.get_position().0, 7);

    let error = Error::new(ErrorImpl::NonConstantArrayLength, position(3)).with_position(&position(7));
    assert_eq!(error.get_position().0, 3);
}

#[test]
fn test_type_errors_are_grouped() {
    let errors = vec![
        ErrorImpl::UnknownType {
            type_: "Pair".to_string(),
        },
        ErrorImpl::NonConstantArrayLength,
        ErrorImpl::NotAnArray {
            type_: "int64".to_string(),
        },
        ErrorImpl::RankMismatch { rank: 2 },
        ErrorImpl::IncompatibleAssignment {
            value: "int64".to_string(),
            target: "int64[5]".to_string(),
        },
    ];

    for error_impl in errors {
        let error = Error::new(error_impl, position(0));
        assert_eq!(error.get_kind(), ErrorKind::Type, "{}", error.get_error_name());
    }
}

#[test]
fn test_internal_error() {
    let error = Error::internal("bad assignment", position(0));

    assert_eq!(error.get_error_name(), "InternalError");
    assert_eq!(error.get_kind(), ErrorKind::Internal);
    assert_eq!(error.get_tip().to_string(), "bad assignment");
}

#[test]
fn test_not_implemented_error() {
    let error = Error::new(
        ErrorImpl::NotImplementedError {
            feature: "break".to_string(),
        },
        position(0),
    );

    assert_eq!(error.get_error_name(), "NotImplementedError");
    assert_eq!(error.get_kind(), ErrorKind::NotImplemented);
}

#[test]
fn test_variable_not_declared_error() {
    let error = Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "foo".to_string(),
        },
        position(0),
    );

    assert_eq!(error.get_error_name(), "VariableNotDeclared");
}

#[test]
fn test_function_already_declared_error() {
    let error = Error::new(
        ErrorImpl::FunctionAlreadyDeclared {
            function: "main".to_string(),
        },
        position(0),
    );

    assert_eq!(error.get_error_name(), "FunctionAlreadyDeclared");
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        position(0),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        position(0),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_argument_count_errors() {
    let error = Error::new(
        ErrorImpl::UnexpectedArguments {
            expected: 2,
            received: 3,
        },
        position(0),
    );
    assert_eq!(error.get_error_name(), "UnexpectedArguments");

    let error = Error::new(
        ErrorImpl::MissingArguments {
            expected: 3,
            received: 1,
        },
        position(0),
    );
    assert_eq!(error.get_error_name(), "MissingArguments");
}

#[test]
fn test_error_display_includes_location() {
    let error = Error::new(
        ErrorImpl::UnknownFunction {
            function: "foo".to_string(),
        },
        position(12),
    );

    assert_eq!(error.to_string(), "function \"foo\" not declared at test.lang:12");
}
