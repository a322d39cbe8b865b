//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into an untyped program. It uses a Pratt parser for expressions and
//! handles:
//!
//! - Top-level struct declarations and function definitions
//! - Statement parsing (declarations, assignments, calls, control flow)
//! - Expression parsing (binary ops, calls, indexing, member access,
//!   array allocation, literals)
//! - Type parsing for type annotations
//!
//! All binary operators share one binding power, so an expression such as
//! `a + b * c` is parsed as `(a + b) * c`.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
