//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures with source position information
//! - Specific error variants for lexing, parsing, type assignment and lowering
//! - The [`errors::ErrorKind`] grouping (syntax, type, internal, not implemented)
//! - Helpful error messages and suggestions

pub mod errors;

#[cfg(test)]
mod tests;
