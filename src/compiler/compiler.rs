//! Main compiler module.
//!
//! This module contains the [`Compiler`], which turns a typed program into an
//! IR [`Module`], and [`FunctionLowering`], the per-function state shared by
//! the expression and statement generators.

use std::collections::{BTreeMap, HashMap};

use crate::{
    ast::ast::{TypedFunction, TypedProgram, TypedValue},
    errors::errors::Error,
    type_checker::stdlib::LibraryFunction,
    types::{
        type_table::TypeTable,
        types::{StorageClass, TypeRef, WORD_SIZE},
    },
};

use super::{
    builder::FunctionBuilder,
    ir::{FunctionIr, FunctionSignature, Module, Op, Operand, ParamClass, ReturnClass, ValueId},
    stmt::gen_block,
};

/// Classifies how a value of type `ty` crosses a call boundary.
pub fn param_class(ty: &TypeRef) -> ParamClass {
    match ty.storage_class() {
        StorageClass::Reference => ParamClass::Reference,
        StorageClass::Aggregate => ParamClass::Aggregate {
            size: ty.object_size(),
        },
        StorageClass::Primitive => ParamClass::Scalar,
    }
}

pub fn return_class(ty: &TypeRef) -> ReturnClass {
    if ty.is_void() {
        return ReturnClass::Void;
    }

    match ty.storage_class() {
        StorageClass::Reference => ReturnClass::Reference,
        StorageClass::Aggregate => ReturnClass::Aggregate {
            size: ty.object_size(),
        },
        StorageClass::Primitive => ReturnClass::Scalar,
    }
}

/// Builds the ABI-level signature of a function.
///
/// # Arguments
///
/// * `name` - The function name
/// * `params` - The declared parameter types
/// * `return_type` - The declared return type
/// * `is_library` - Whether the body lives outside the module
///
/// # Returns
///
/// The signature. Aggregate returns get a hidden destination parameter.
pub fn signature_of(
    name: &str,
    params: &[TypeRef],
    return_type: &TypeRef,
    is_library: bool,
) -> FunctionSignature {
    let returns = return_class(return_type);

    FunctionSignature {
        name: name.to_string(),
        params: params.iter().map(param_class).collect(),
        returns,
        hidden_return: matches!(returns, ReturnClass::Aggregate { .. }),
        is_library,
    }
}

/// Zero for integers, null for references; aggregates start uninitialised.
fn initial_value(ty: &TypeRef) -> Option<Operand> {
    match ty.storage_class() {
        StorageClass::Primitive => Some(Operand::Const(0)),
        StorageClass::Reference => Some(Operand::Null),
        StorageClass::Aggregate => None,
    }
}

/// Per-function lowering state.
pub struct FunctionLowering<'a> {
    pub types: &'a TypeTable,
    pub symbols: &'a BTreeMap<String, FunctionSignature>,
    pub builder: FunctionBuilder,
    /// Storage slot of every variable, allocated on first use.
    variables: HashMap<String, ValueId>,
    /// Where an aggregate result is written, for functions returning one.
    pub hidden_return: Option<ValueId>,
    pub return_type: TypeRef,
}

impl<'a> FunctionLowering<'a> {
    pub fn new(
        types: &'a TypeTable,
        symbols: &'a BTreeMap<String, FunctionSignature>,
        signature: FunctionSignature,
        return_type: TypeRef,
    ) -> Self {
        let builder = FunctionBuilder::new(signature);
        let hidden_return = if builder.signature().hidden_return {
            builder.parameters().last().copied()
        } else {
            None
        };

        FunctionLowering {
            types,
            symbols,
            builder,
            variables: HashMap::new(),
            hidden_return,
            return_type,
        }
    }

    /// Returns the slot of `name`, allocating it on first use.
    ///
    /// Aggregate variables own `object_size` bytes. Integer and reference
    /// variables own one word, initialised to zero and null respectively
    /// when the function is entered.
    pub fn variable_slot(&mut self, name: &str, ty: &TypeRef) -> ValueId {
        if let Some(slot) = self.variables.get(name) {
            return *slot;
        }

        let size = match ty.storage_class() {
            StorageClass::Aggregate => ty.object_size(),
            StorageClass::Reference | StorageClass::Primitive => WORD_SIZE,
        };
        let slot = self.builder.alloca(size, name);
        if let Some(value) = initial_value(ty) {
            self.builder.initialise(slot, value);
        }

        tracing::trace!(variable = name, slot = %slot, "allocated variable storage");
        self.variables.insert(name.to_string(), slot);
        slot
    }

    /// Lowers the declaration of `name` at the current insertion point.
    ///
    /// Integers and references are reset every time control reaches the
    /// declaration, so a variable declared in a loop body starts each
    /// iteration at zero or null.
    pub fn declare_variable(&mut self, name: &str, ty: &TypeRef) {
        let slot = self.variable_slot(name, ty);
        if let Some(value) = initial_value(ty) {
            self.store(Operand::Value(slot), value);
        }
    }

    /// Copies every argument into storage owned by the function.
    ///
    /// Aggregates arrive as the caller's address and are copied, which gives
    /// them value semantics. References and integers are spilled into their
    /// one-word slots.
    fn bind_parameters(&mut self, function: &TypedFunction) -> Result<(), Error> {
        let incoming = self.builder.parameters().to_vec();

        for (param, value) in function.params.iter().zip(incoming) {
            let Some(name) = param.variable_name() else {
                return Err(Error::internal(
                    "parameter is not a variable",
                    param.span.start.clone(),
                ));
            };

            let slot = self.variable_slot(name, &param.ty);
            if param.ty.is_aggregate() {
                self.builder.push(Op::Copy {
                    destination: Operand::Value(slot),
                    source: Operand::Value(value),
                    size: param.ty.object_size(),
                });
            } else {
                self.builder.push(Op::Store {
                    address: Operand::Value(slot),
                    value: Operand::Value(value),
                });
            }
        }

        Ok(())
    }

    /// Allocates a temporary of `size` bytes.
    pub fn temporary(&mut self, size: u64, name: &str) -> Operand {
        Operand::Value(self.builder.alloca(size, name))
    }

    /// Loads one word from `address`.
    pub fn load(&mut self, address: Operand) -> Operand {
        Operand::Value(self.builder.emit(|dst| Op::Load { dst, address }))
    }

    pub fn store(&mut self, address: Operand, value: Operand) {
        self.builder.push(Op::Store { address, value });
    }

    pub fn copy(&mut self, destination: Operand, source: Operand, size: u64) {
        self.builder.push(Op::Copy {
            destination,
            source,
            size,
        });
    }

    pub fn internal_error(&self, value: &TypedValue, message: &str) -> Error {
        Error::internal(message, value.span.start.clone())
    }
}

/// Lowers whole programs.
pub struct Compiler {
    types: TypeTable,
    symbols: BTreeMap<String, FunctionSignature>,
}

impl Compiler {
    /// Creates a compiler that knows about `library`.
    ///
    /// # Arguments
    ///
    /// * `types` - The table the program was typed with
    /// * `library` - Functions callable but not defined by the program
    pub fn new(types: &TypeTable, library: &[LibraryFunction]) -> Self {
        let symbols = library
            .iter()
            .map(|function| {
                (
                    function.name.clone(),
                    signature_of(&function.name, &function.params, &function.return_type, true),
                )
            })
            .collect();

        Compiler {
            types: types.clone(),
            symbols,
        }
    }

    pub fn symbols(&self) -> &BTreeMap<String, FunctionSignature> {
        &self.symbols
    }

    /// Lowers a typed program into a module named `name`.
    ///
    /// All signatures are registered before any body is lowered, so calls
    /// may precede the definition of their callee.
    pub fn compile_program(mut self, program: &TypedProgram, name: &str) -> Result<Module, Error> {
        for function in &program.functions {
            let signature = signature_of(
                &function.name,
                &function.param_types(),
                &function.return_type,
                false,
            );
            self.symbols.insert(function.name.clone(), signature);
        }

        let functions = program
            .functions
            .iter()
            .map(|function| self.compile_function(function))
            .collect::<Result<Vec<_>, Error>>()?;

        tracing::debug!(module = name, functions = functions.len(), "lowered module");

        Ok(Module {
            name: name.to_string(),
            symbols: self.symbols,
            functions,
        })
    }

    fn compile_function(&self, function: &TypedFunction) -> Result<FunctionIr, Error> {
        let Some(signature) = self.symbols.get(&function.name).cloned() else {
            return Err(Error::internal(
                format!("no signature registered for `{}`", function.name),
                function.span.start.clone(),
            ));
        };

        let mut lowering = FunctionLowering::new(
            &self.types,
            &self.symbols,
            signature,
            function.return_type.clone(),
        );

        lowering.bind_parameters(function)?;
        gen_block(&mut lowering, &function.body)?;

        let ir = lowering.builder.finish(function.return_type.is_void());
        tracing::debug!(
            function = %function.name,
            blocks = ir.blocks.len(),
            values = ir.value_count,
            "lowered function"
        );
        Ok(ir)
    }
}

/// Lowers `program` into a module.
///
/// # Arguments
///
/// * `program` - The typed program
/// * `types` - The table the program was typed with
/// * `library` - Library functions the program may call
/// * `name` - The module name
///
/// # Returns
///
/// The module, or an internal / not-implemented error.
pub fn compile(
    program: &TypedProgram,
    types: &TypeTable,
    library: &[LibraryFunction],
    name: &str,
) -> Result<Module, Error> {
    Compiler::new(types, library).compile_program(program, name)
}
