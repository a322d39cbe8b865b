//! Type assignment and semantic analysis.
//!
//! This module rewrites the untyped program produced by the parser into a
//! new, fully typed program while:
//!
//! - Registering struct layouts and rejecting recursive or unknown structs
//! - Resolving variables through a per-function `FunctionScope`
//! - Resolving calls against program and library signatures, and recording
//!   the callee's declared parameter types on every call
//! - Inferring value categories (indexing yields references, calls and
//!   operators yield prvalues)
//! - Rejecting assignments between incompatible storage classes
//!
//! Typing is all or nothing: the first error aborts the whole program.

pub mod stdlib;
pub mod type_checker;

#[cfg(test)]
mod tests;
