use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

/// Broad grouping of errors by the stage that raises them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lexing and parsing failures.
    Syntax,
    /// Raised by the type-assignment pass; the whole program is rejected.
    Type,
    /// A lowering invariant the type-assignment pass should have upheld.
    Internal,
    /// A construct that is recognised but cannot be lowered yet.
    NotImplemented,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    /// Creates an error that is not tied to any source location yet.
    pub fn unpositioned(error_impl: ErrorImpl) -> Self {
        Error::new(error_impl, Position::null())
    }

    pub fn internal(message: impl Into<String>, position: Position) -> Self {
        Error::new(
            ErrorImpl::InternalError {
                message: message.into(),
            },
            position,
        )
    }

    /// Attaches `position` if the error does not carry one already.
    pub fn with_position(mut self, position: &Position) -> Self {
        if self.position.is_null() {
            self.position = position.clone();
        }
        self
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_error_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_kind(&self) -> ErrorKind {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::NumberParseError { .. } => ErrorKind::Syntax,
            ErrorImpl::InternalError { .. } => ErrorKind::Internal,
            ErrorImpl::NotImplementedError { .. } => ErrorKind::NotImplemented,
            _ => ErrorKind::Type,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::StructAlreadyDeclared { .. } => "StructAlreadyDeclared",
            ErrorImpl::DuplicateMember { .. } => "DuplicateMember",
            ErrorImpl::RecursiveStruct { .. } => "RecursiveStruct",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::UnknownFunction { .. } => "UnknownFunction",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::VoidVariable { .. } => "VoidVariable",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::NotAnArray { .. } => "NotAnArray",
            ErrorImpl::NotAStruct { .. } => "NotAStruct",
            ErrorImpl::UnknownMember { .. } => "UnknownMember",
            ErrorImpl::RankMismatch { .. } => "RankMismatch",
            ErrorImpl::NonConstantArrayLength => "NonConstantArrayLength",
            ErrorImpl::NegativeArrayLength { .. } => "NegativeArrayLength",
            ErrorImpl::IncompatibleAssignment { .. } => "IncompatibleAssignment",
            ErrorImpl::NotAssignable => "NotAssignable",
            ErrorImpl::InvalidOperand { .. } => "InvalidOperand",
            ErrorImpl::InvalidCondition => "InvalidCondition",
            ErrorImpl::ReferenceToReference { .. } => "ReferenceToReference",
            ErrorImpl::InternalError { .. } => "InternalError",
            ErrorImpl::NotImplementedError { .. } => "NotImplementedError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::StructAlreadyDeclared { name } => {
                ErrorTip::Suggestion(format!("Struct `{}` already declared", name))
            }
            ErrorImpl::DuplicateMember { structure, member } => ErrorTip::Suggestion(format!(
                "Member `{}` appears more than once in struct `{}`",
                member, structure
            )),
            ErrorImpl::RecursiveStruct { name } => ErrorTip::Suggestion(format!(
                "Struct `{}` contains itself by value, use a reference instead",
                name
            )),
            ErrorImpl::FunctionAlreadyDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already declared", function))
            }
            ErrorImpl::UnknownFunction { function } => {
                ErrorTip::Suggestion(format!("Function `{}` is not declared", function))
            }
            ErrorImpl::VariableAlreadyDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` already declared", variable))
            }
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::VoidVariable { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` cannot have type `void`", variable))
            }
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::MissingArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::ArgumentTypeMatchError { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Expected argument type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::NotAnArray { type_ } => {
                ErrorTip::Suggestion(format!("Only arrays can be indexed, found `{}`", type_))
            }
            ErrorImpl::NotAStruct { type_ } => ErrorTip::Suggestion(format!(
                "Only structs have members, found `{}`",
                type_
            )),
            ErrorImpl::UnknownMember { structure, member } => ErrorTip::Suggestion(format!(
                "Struct `{}` has no member `{}`",
                structure, member
            )),
            ErrorImpl::RankMismatch { rank } => ErrorTip::Suggestion(format!(
                "Arrays take exactly one index, found {}",
                rank
            )),
            ErrorImpl::NonConstantArrayLength => ErrorTip::Suggestion(String::from(
                "Array length must be a compile-time integer constant",
            )),
            ErrorImpl::NegativeArrayLength { length } => {
                ErrorTip::Suggestion(format!("Array length {} is negative", length))
            }
            ErrorImpl::IncompatibleAssignment { value, target } => ErrorTip::Suggestion(format!(
                "Cannot assign `{}` to `{}`",
                value, target
            )),
            ErrorImpl::NotAssignable => ErrorTip::Suggestion(String::from(
                "Only variables, indexed elements and struct members can be assigned to",
            )),
            ErrorImpl::InvalidOperand { type_ } => ErrorTip::Suggestion(format!(
                "Expected an integer operand, found `{}`",
                type_
            )),
            ErrorImpl::InvalidCondition => ErrorTip::Suggestion(String::from(
                "Conditions must be comparisons such as `a < b`",
            )),
            ErrorImpl::ReferenceToReference { type_ } => ErrorTip::Suggestion(format!(
                "Cannot form a reference to reference type `{}`",
                type_
            )),
            ErrorImpl::InternalError { message } => ErrorTip::Suggestion(message.clone()),
            ErrorImpl::NotImplementedError { feature } => ErrorTip::Suggestion(format!(
                "`{}` is recognised, but has not yet been implemented",
                feature
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.internal_error, self.position.1, self.position.0
        )
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("struct {name:?} already declared")]
    StructAlreadyDeclared { name: String },
    #[error("member {member:?} declared twice in struct {structure:?}")]
    DuplicateMember { structure: String, member: String },
    #[error("struct {name:?} contains itself by value")]
    RecursiveStruct { name: String },
    #[error("function {function:?} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("function {function:?} not declared")]
    UnknownFunction { function: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("variable {variable:?} declared with type void")]
    VoidVariable { variable: String },
    #[error("unexpected arguments: expected {expected:?}, received {received:?}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("missing arguments: expected {expected:?}, received {received:?}")]
    MissingArguments { expected: usize, received: usize },
    #[error("argument types do not match: expected {expected:?}, received {received:?}")]
    ArgumentTypeMatchError { expected: String, received: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("indexing non-array type {type_}")]
    NotAnArray { type_: String },
    #[error("member access on non-struct type {type_}")]
    NotAStruct { type_: String },
    #[error("struct {structure:?} has no member {member:?}")]
    UnknownMember { structure: String, member: String },
    #[error("expected exactly one index, found {rank}")]
    RankMismatch { rank: usize },
    #[error("array length is not a compile-time constant")]
    NonConstantArrayLength,
    #[error("array length {length} is negative")]
    NegativeArrayLength { length: i64 },
    #[error("cannot assign {value} to {target}")]
    IncompatibleAssignment { value: String, target: String },
    #[error("assignment target is not assignable")]
    NotAssignable,
    #[error("expected an integer operand, found {type_}")]
    InvalidOperand { type_: String },
    #[error("condition is not a comparison")]
    InvalidCondition,
    #[error("reference to reference type {type_}")]
    ReferenceToReference { type_: String },
    #[error("internal error: {message}")]
    InternalError { message: String },
    #[error("not implemented: {feature}")]
    NotImplementedError { feature: String },
}
