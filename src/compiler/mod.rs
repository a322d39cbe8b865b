//! Lowering of typed programs to the IR.
//!
//! This module turns the typed AST into an explicit, target-independent IR:
//!
//! - Variables become function-entry storage slots
//! - Aggregates move by explicit copies and are passed by address
//! - References are addresses, bound and read through explicitly
//! - Aggregate returns go through a hidden destination parameter

pub mod builder;
pub mod compiler;
pub mod expr;
pub mod ir;
pub mod stmt;
