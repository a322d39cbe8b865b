//! Instruction (statement) nodes.

use crate::Span;

use super::{ast::Annotation, expressions::Value};

#[derive(Debug, Clone)]
pub enum InstructionKind<T: Annotation> {
    Return {
        value: Option<Value<T>>,
    },
    Assign {
        dst: Value<T>,
        src: Value<T>,
    },
    /// A call evaluated for its side effects.
    ExprStmt {
        call: Value<T>,
    },
    While {
        condition: Value<T>,
        body: Box<Instruction<T>>,
    },
    If {
        condition: Value<T>,
        then_body: Box<Instruction<T>>,
    },
    Break,
    Continue,
    /// `Type a, b;` where every variable carries the declared type.
    Decl {
        variables: Vec<Value<T>>,
    },
    Block(Block<T>),
}

#[derive(Debug, Clone)]
pub struct Instruction<T: Annotation> {
    pub kind: InstructionKind<T>,
    pub ty: T,
    pub span: Span,
}

impl<T: Annotation> Instruction<T> {
    pub fn new(kind: InstructionKind<T>, ty: T, span: Span) -> Self {
        Instruction { kind, ty, span }
    }
}

/// An ordered list of instructions. Order is significant.
#[derive(Debug, Clone)]
pub struct Block<T: Annotation> {
    pub instructions: Vec<Instruction<T>>,
    pub span: Span,
}
