//! Abstract Syntax Tree definitions.
//!
//! The tree is a closed set of enums consumed by pattern matching:
//!
//! - `expressions` - `Value` nodes (variables, literals, operators, calls,
//!   indexing, member access, array allocation)
//! - `statements` - `Instruction` nodes and blocks
//! - `ast` - functions, struct declarations and programs, plus the
//!   `Annotation` trait that distinguishes untyped from typed trees
//! - `dump` - a textual rendering of either kind of tree

pub mod ast;
pub mod dump;
pub mod expressions;
pub mod statements;
