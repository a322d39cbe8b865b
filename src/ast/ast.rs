use std::{collections::HashMap, fmt::Debug};

use crate::{types::types::TypeRef, Span};

use super::{
    expressions::{Value, ValueKind},
    statements::{Block, Instruction, InstructionKind},
};

/// The type annotation carried by every node.
///
/// The parser produces trees annotated with `Option<TypeRef>` (only literals
/// and declarations are set); type assignment produces trees annotated with
/// `TypeRef`.
pub trait Annotation: Clone + Debug {
    fn describe(&self) -> String;
}

impl Annotation for Option<TypeRef> {
    fn describe(&self) -> String {
        match self {
            Some(ty) => ty.display_name(),
            None => String::from("<untyped>"),
        }
    }
}

impl Annotation for TypeRef {
    fn describe(&self) -> String {
        self.display_name()
    }
}

#[derive(Debug, Clone)]
pub struct Function<T: Annotation> {
    pub name: String,
    /// Always `Variable` values, typed with the declared parameter type.
    pub params: Vec<Value<T>>,
    pub body: Block<T>,
    pub return_type: TypeRef,
    pub span: Span,
}

impl<T: Annotation> Function<T> {
    pub fn param_types(&self) -> Vec<T> {
        self.params.iter().map(|param| param.ty.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub member_types: Vec<TypeRef>,
    pub member_names: Vec<String>,
    pub member_name_to_index: HashMap<String, usize>,
    pub span: Span,
}

impl StructDecl {
    pub fn members(&self) -> impl Iterator<Item = (&String, &TypeRef)> {
        self.member_names.iter().zip(self.member_types.iter())
    }
}

#[derive(Debug, Clone)]
pub struct Program<T: Annotation> {
    pub functions: Vec<Function<T>>,
    pub structs: Vec<StructDecl>,
}

impl<T: Annotation> Program<T> {
    pub fn function(&self, name: &str) -> Option<&Function<T>> {
        self.functions.iter().find(|function| function.name == name)
    }
}

pub type UntypedValue = Value<Option<TypeRef>>;
pub type UntypedValueKind = ValueKind<Option<TypeRef>>;
pub type UntypedInstruction = Instruction<Option<TypeRef>>;
pub type UntypedInstructionKind = InstructionKind<Option<TypeRef>>;
pub type UntypedBlock = Block<Option<TypeRef>>;
pub type UntypedFunction = Function<Option<TypeRef>>;
pub type UntypedProgram = Program<Option<TypeRef>>;

pub type TypedValue = Value<TypeRef>;
pub type TypedValueKind = ValueKind<TypeRef>;
pub type TypedInstruction = Instruction<TypeRef>;
pub type TypedInstructionKind = InstructionKind<TypeRef>;
pub type TypedBlock = Block<TypeRef>;
pub type TypedFunction = Function<TypeRef>;
pub type TypedProgram = Program<TypeRef>;
