//! Compilation pipeline orchestration.
//!
//! A [`Session`] owns the type table and the library functions visible to
//! programs, and runs source text through tokenizing, parsing, type
//! assignment and lowering.
//!
//! Each compilation works in a fork of the session's table, so struct
//! declarations stay private to the source that made them and a failed
//! compilation leaves nothing behind.

use std::sync::Arc;

use crate::{
    ast::ast::{TypedProgram, UntypedProgram},
    compiler::{compiler::compile, ir::Module},
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::{
        stdlib::{builtin_library, LibraryFunction},
        type_checker::type_check,
    },
    types::{type_table::TypeTable, types::TypeRef},
};

/// The result of compiling one source file.
#[derive(Debug)]
pub struct Compilation {
    pub program: TypedProgram,
    pub module: Module,
    /// The table the program was typed against.
    pub types: TypeTable,
}

#[derive(Debug, Clone)]
pub struct Session {
    types: TypeTable,
    library: Vec<LibraryFunction>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    /// Creates a session with a fresh type table and the builtin library.
    pub fn new() -> Self {
        let types = TypeTable::new();
        let library = builtin_library(&types);

        Session { types, library }
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn library(&self) -> &[LibraryFunction] {
        &self.library
    }

    /// Makes a host-provided function callable from programs.
    pub fn declare_library_function(&mut self, name: &str, params: Vec<TypeRef>, return_type: TypeRef) {
        self.library
            .push(LibraryFunction::new(name, params, return_type));
    }

    /// Parses `source` against a fresh fork of the session's types.
    pub fn parse(&self, source: &str, file_name: &str) -> Result<UntypedProgram, Error> {
        parse_with(source, file_name, &self.types.fork())
    }

    /// Runs the whole pipeline over `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - The program text
    /// * `file_name` - Name used in error positions and as the module name
    ///
    /// # Returns
    ///
    /// The typed program together with its lowered module, or the first
    /// error of whichever stage failed.
    pub fn compile(&self, source: &str, file_name: &str) -> Result<Compilation, Error> {
        let types = self.types.fork();

        let program = parse_with(source, file_name, &types)?;
        let program = type_check(program, &types, &self.library)?;
        let module = compile(&program, &types, &self.library, file_name)?;

        Ok(Compilation {
            program,
            module,
            types,
        })
    }
}

fn parse_with(source: &str, file_name: &str, types: &TypeTable) -> Result<UntypedProgram, Error> {
    let tokens = tokenize(source.to_string(), Some(file_name.to_string()))?;
    tracing::trace!(file = file_name, tokens = tokens.len(), "tokenized");

    parse(tokens, Arc::new(file_name.to_string()), types)
}
