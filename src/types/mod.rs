//! Type model and type interning.
//!
//! Every type is identified by the tuple
//! `(name, rank, element count, type category, value category)` and interned
//! in a [`type_table::TypeTable`], so identity comparison is a pointer
//! comparison. This module provides:
//!
//! - `TypeCategory`, `ValueCategory` and `StorageClass`
//! - `TypeRef`, the shared handle every AST node carries
//! - Object sizes (scalars and references are one word, aggregates are packed)
//! - Derived types (`as_reference`, `as_prvalue`, `as_lvalue`, `as_xvalue`)

pub mod type_table;
pub mod types;

#[cfg(test)]
mod tests;
