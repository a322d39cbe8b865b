//! Value (expression) nodes.

use std::fmt::Display;

use crate::{lexer::tokens::TokenKind, types::types::TypeRef, Span};

use super::ast::Annotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    And,
    Shl,
    Shr,
    Less,
    Greater,
    LessEquals,
    GreaterEquals,
    Equals,
}

impl BinaryOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Dash => BinaryOperator::Sub,
            TokenKind::Star => BinaryOperator::Mul,
            TokenKind::Ampersand => BinaryOperator::And,
            TokenKind::ShiftLeft => BinaryOperator::Shl,
            TokenKind::ShiftRight => BinaryOperator::Shr,
            TokenKind::Less => BinaryOperator::Less,
            TokenKind::Greater => BinaryOperator::Greater,
            TokenKind::LessEquals => BinaryOperator::LessEquals,
            TokenKind::GreaterEquals => BinaryOperator::GreaterEquals,
            TokenKind::Equals => BinaryOperator::Equals,
            _ => return None,
        })
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Less
                | BinaryOperator::Greater
                | BinaryOperator::LessEquals
                | BinaryOperator::GreaterEquals
                | BinaryOperator::Equals
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::And => "&",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEquals => "<=",
            BinaryOperator::GreaterEquals => ">=",
            BinaryOperator::Equals => "==",
        }
    }

    /// Applies the operator to two 64-bit words.
    ///
    /// Arithmetic wraps, `>>` is a logical shift and the shift amount is
    /// taken modulo 64. Comparisons yield `1` or `0`.
    pub fn evaluate(&self, lhs: i64, rhs: i64) -> i64 {
        let shift = (rhs as u64 & 63) as u32;

        match self {
            BinaryOperator::Add => lhs.wrapping_add(rhs),
            BinaryOperator::Sub => lhs.wrapping_sub(rhs),
            BinaryOperator::Mul => lhs.wrapping_mul(rhs),
            BinaryOperator::And => lhs & rhs,
            BinaryOperator::Shl => lhs.wrapping_shl(shift),
            BinaryOperator::Shr => ((lhs as u64) >> shift) as i64,
            BinaryOperator::Less => (lhs < rhs) as i64,
            BinaryOperator::Greater => (lhs > rhs) as i64,
            BinaryOperator::LessEquals => (lhs <= rhs) as i64,
            BinaryOperator::GreaterEquals => (lhs >= rhs) as i64,
            BinaryOperator::Equals => (lhs == rhs) as i64,
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone)]
pub enum ValueKind<T: Annotation> {
    Variable {
        name: String,
    },
    IntegerLiteral {
        value: i64,
    },
    FunctionRef {
        name: String,
        /// Filled in by type assignment.
        declared_return_type: Option<TypeRef>,
    },
    BinaryOp {
        operator: BinaryOperator,
        lhs: Box<Value<T>>,
        rhs: Box<Value<T>>,
    },
    Call {
        callee: Box<Value<T>>,
        arguments: Vec<Value<T>>,
        /// The callee's parameter types, verbatim. Empty until typed.
        declared_arg_types: Vec<TypeRef>,
    },
    /// `base[i]`; chained brackets collect into `indices`.
    Index {
        base: Box<Value<T>>,
        indices: Vec<Value<T>>,
    },
    /// `base.member`
    Member {
        base: Box<Value<T>>,
        member: String,
    },
    /// `[init_value; length]`
    ArrayAlloc {
        length: Box<Value<T>>,
        init_value: Box<Value<T>>,
    },
}

/// An expression node with its type annotation.
#[derive(Debug, Clone)]
pub struct Value<T: Annotation> {
    pub kind: ValueKind<T>,
    pub ty: T,
    pub span: Span,
}

impl<T: Annotation> Value<T> {
    pub fn new(kind: ValueKind<T>, ty: T, span: Span) -> Self {
        Value { kind, ty, span }
    }

    pub fn variable_name(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Variable { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ValueKind::Call { .. })
    }

    pub fn is_comparison(&self) -> bool {
        matches!(&self.kind, ValueKind::BinaryOp { operator, .. } if operator.is_comparison())
    }
}
