//! Reference executor for lowered modules.
//!
//! Runs the IR directly over a flat, word-addressed byte memory so lowered
//! programs can be checked end to end without a native backend.

pub mod errors;
pub mod interpreter;
pub mod memory;

#[cfg(test)]
mod tests;
