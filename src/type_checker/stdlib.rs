//! Library functions callable from every program.
//!
//! Library functions have a signature but no body in the program; the
//! backend (or the interpreter) supplies their implementation.

use crate::types::{type_table::TypeTable, types::TypeRef};

#[derive(Debug, Clone)]
pub struct LibraryFunction {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
}

impl LibraryFunction {
    pub fn new(name: &str, params: Vec<TypeRef>, return_type: TypeRef) -> Self {
        LibraryFunction {
            name: name.to_string(),
            params,
            return_type,
        }
    }
}

/// `void print(int64 value)` and `int64 input()`.
pub fn builtin_library(types: &TypeTable) -> Vec<LibraryFunction> {
    vec![
        LibraryFunction::new("print", vec![types.int64()], types.void()),
        LibraryFunction::new("input", vec![], types.int64()),
    ]
}
