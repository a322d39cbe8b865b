use std::collections::{HashMap, HashSet};

use crate::{
    ast::{
        ast::{
            Program, StructDecl, TypedBlock, TypedFunction, TypedInstruction, TypedProgram,
            TypedValue, UntypedBlock, UntypedFunction, UntypedInstruction, UntypedProgram,
            UntypedValue,
        },
        expressions::ValueKind,
        statements::InstructionKind,
    },
    errors::errors::{Error, ErrorImpl},
    types::{
        type_table::TypeTable,
        types::{StorageClass, TypeRef},
    },
    Position,
};

use super::stdlib::LibraryFunction;

/// Variables visible inside one function, by name.
///
/// A new scope is created for every function, so nothing leaks between
/// functions or between compilations.
#[derive(Debug, Default)]
pub struct FunctionScope {
    variables: HashMap<String, TypeRef>,
}

impl FunctionScope {
    pub fn new() -> Self {
        FunctionScope::default()
    }

    pub fn declare_variable(
        &mut self,
        variable_name: &str,
        variable_type: TypeRef,
        current_position: &Position,
    ) -> Result<(), Error> {
        if self.variables.contains_key(variable_name) {
            Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: variable_name.to_string(),
                },
                current_position.clone(),
            ))
        } else {
            tracing::trace!(variable = variable_name, ty = %variable_type.display_name(), "declared variable");
            self.variables.insert(variable_name.to_string(), variable_type);
            Ok(())
        }
    }

    pub fn get_variable(&self, variable_name: &str) -> Option<&TypeRef> {
        self.variables.get(variable_name)
    }
}

/// A callable function as seen from a call site.
#[derive(Debug, Clone)]
pub struct Signature {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub is_library: bool,
}

#[derive(Debug)]
pub struct TypeChecker {
    types: TypeTable,
    signatures: HashMap<String, Signature>,
}

fn at(position: &Position) -> impl Fn(Error) -> Error + '_ {
    move |error| error.with_position(position)
}

/// Values whose storage can be referred to: variables, indexed elements,
/// struct members and anything already of reference type.
fn is_addressable(value: &TypedValue) -> bool {
    value.ty.is_reference()
        || matches!(
            value.kind,
            ValueKind::Variable { .. } | ValueKind::Index { .. } | ValueKind::Member { .. }
        )
}

/// The type of the storage an assignment to `dst` writes.
///
/// Variables are their own storage. Indexed elements and struct members
/// are typed as references to their storage, so the element or member
/// type is recovered here.
pub fn destination_type(dst: &TypedValue) -> Option<TypeRef> {
    match &dst.kind {
        ValueKind::Variable { .. } => Some(dst.ty.clone()),
        ValueKind::Index { .. } => dst.ty.referenced_type().cloned(),
        ValueKind::Member { base, member } => base
            .ty
            .object()
            .struct_body()
            .and_then(|body| body.member(member).map(|(_, ty)| ty.clone())),
        _ => None,
    }
}

/// Folds an array length made of integer literals and operators.
fn fold_constant(value: &UntypedValue) -> Option<i64> {
    match &value.kind {
        ValueKind::IntegerLiteral { value } => Some(*value),
        ValueKind::BinaryOp { operator, lhs, rhs } => {
            Some(operator.evaluate(fold_constant(lhs)?, fold_constant(rhs)?))
        }
        _ => None,
    }
}

impl TypeChecker {
    pub fn new(types: &TypeTable) -> Self {
        TypeChecker {
            types: types.clone(),
            signatures: HashMap::new(),
        }
    }

    pub fn get_signature(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    fn declare_function(&mut self, signature: Signature, position: &Position) -> Result<(), Error> {
        if self.signatures.contains_key(&signature.name) {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: signature.name,
                },
                position.clone(),
            ));
        }

        self.signatures.insert(signature.name.clone(), signature);
        Ok(())
    }

    /// Fails with `UnknownType` if `ty` names a struct that was never declared.
    fn check_defined(&self, ty: &TypeRef) -> Result<(), Error> {
        if let Some(inner) = ty.referenced_type().or(ty.element_type()) {
            return self.check_defined(inner);
        }

        if ty.is_struct() && ty.struct_body().is_none() {
            return Err(Error::unpositioned(ErrorImpl::UnknownType {
                type_: ty.name().to_string(),
            }));
        }

        Ok(())
    }

    fn check_variable_type(&self, name: &str, ty: &TypeRef) -> Result<(), Error> {
        if ty.is_void() {
            return Err(Error::unpositioned(ErrorImpl::VoidVariable {
                variable: name.to_string(),
            }));
        }

        self.check_defined(ty)
    }

    fn register_structs(&self, structs: &[StructDecl]) -> Result<(), Error> {
        for decl in structs {
            let members = decl
                .members()
                .map(|(name, ty)| (name.clone(), ty.clone()))
                .collect();

            self.types
                .define_struct(&decl.name, members)
                .map_err(at(&decl.span.start))?;
        }

        for decl in structs {
            for (_, ty) in decl.members() {
                self.check_defined(ty).map_err(at(&decl.span.start))?;
            }
        }

        let mut finished = HashSet::new();
        for decl in structs {
            let mut visiting = HashSet::new();
            self.check_not_recursive(&decl.name, &mut visiting, &mut finished)
                .map_err(at(&decl.span.start))?;
        }

        Ok(())
    }

    /// Rejects structs that contain themselves by value, directly or through
    /// arrays and other structs.
    fn check_not_recursive(
        &self,
        name: &str,
        visiting: &mut HashSet<String>,
        finished: &mut HashSet<String>,
    ) -> Result<(), Error> {
        if finished.contains(name) {
            return Ok(());
        }

        if !visiting.insert(name.to_string()) {
            return Err(Error::unpositioned(ErrorImpl::RecursiveStruct {
                name: name.to_string(),
            }));
        }

        let structure = self.types.find_by_name(name);
        if let Some(body) = structure.struct_body() {
            for member in &body.members {
                let mut contained = member.clone();
                while let Some(element) = contained.element_type().filter(|_| contained.is_array()) {
                    contained = element.clone();
                }

                if contained.is_struct() {
                    self.check_not_recursive(contained.name(), visiting, finished)?;
                }
            }
        }

        visiting.remove(name);
        finished.insert(name.to_string());
        Ok(())
    }

    /// Types a whole program.
    ///
    /// # Arguments
    ///
    /// * `program` - The untyped program produced by the parser
    /// * `library` - Functions callable without a definition in `program`
    ///
    /// # Returns
    ///
    /// A new, fully typed program, or the first error found. No partially
    /// typed program is ever returned.
    pub fn check_program(
        &mut self,
        program: UntypedProgram,
        library: &[LibraryFunction],
    ) -> Result<TypedProgram, Error> {
        self.register_structs(&program.structs)?;

        for function in library {
            self.declare_function(
                Signature {
                    name: function.name.clone(),
                    params: function.params.clone(),
                    return_type: function.return_type.clone(),
                    is_library: true,
                },
                &Position::null(),
            )?;
        }

        for function in &program.functions {
            let mut params = Vec::with_capacity(function.params.len());
            for param in &function.params {
                let name = param.variable_name().unwrap_or_default();
                let ty = param.ty.clone().ok_or_else(|| {
                    Error::internal(format!("parameter `{}` has no type", name), param.span.start.clone())
                })?;
                self.check_variable_type(name, &ty).map_err(at(&param.span.start))?;
                params.push(ty);
            }

            self.check_defined(&function.return_type)
                .map_err(at(&function.span.start))?;

            self.declare_function(
                Signature {
                    name: function.name.clone(),
                    params,
                    return_type: function.return_type.clone(),
                    is_library: false,
                },
                &function.span.start,
            )?;
        }

        let functions = program
            .functions
            .into_iter()
            .map(|function| self.check_function(function))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Program {
            functions,
            structs: program.structs,
        })
    }

    fn check_function(&self, function: UntypedFunction) -> Result<TypedFunction, Error> {
        let mut scope = FunctionScope::new();

        let mut params = Vec::with_capacity(function.params.len());
        for param in function.params {
            let ValueKind::Variable { name } = param.kind else {
                return Err(Error::internal("parameter is not a variable", param.span.start));
            };
            let ty = param.ty.ok_or_else(|| {
                Error::internal(format!("parameter `{}` has no type", name), param.span.start.clone())
            })?;

            scope.declare_variable(&name, ty.clone(), &param.span.start)?;
            params.push(TypedValue::new(ValueKind::Variable { name }, ty, param.span));
        }

        let body = self.check_block(function.body, &mut scope, &function.return_type)?;

        tracing::debug!(function = %function.name, "typed function");

        Ok(TypedFunction {
            name: function.name,
            params,
            body,
            return_type: function.return_type,
            span: function.span,
        })
    }

    fn check_block(
        &self,
        block: UntypedBlock,
        scope: &mut FunctionScope,
        return_type: &TypeRef,
    ) -> Result<TypedBlock, Error> {
        let instructions = block
            .instructions
            .into_iter()
            .map(|instruction| self.check_instruction(instruction, scope, return_type))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TypedBlock {
            instructions,
            span: block.span,
        })
    }

    fn check_instruction(
        &self,
        instruction: UntypedInstruction,
        scope: &mut FunctionScope,
        return_type: &TypeRef,
    ) -> Result<TypedInstruction, Error> {
        let position = instruction.span.start.clone();
        let void = self.types.void();

        let (kind, ty) = match instruction.kind {
            InstructionKind::Return { value: None } => {
                if !return_type.is_void() {
                    return Err(Error::new(
                        ErrorImpl::TypeMatchError {
                            expected: return_type.display_name(),
                            received: void.display_name(),
                        },
                        position,
                    ));
                }

                (InstructionKind::Return { value: None }, void)
            }
            InstructionKind::Return { value: Some(value) } => {
                let value = self.check_value(value, scope)?;

                let matches = !return_type.is_void()
                    && value.ty.same_object(return_type)
                    && (!return_type.is_reference() || is_addressable(&value));

                if !matches {
                    return Err(Error::new(
                        ErrorImpl::TypeMatchError {
                            expected: return_type.display_name(),
                            received: value.ty.display_name(),
                        },
                        value.span.start,
                    ));
                }

                let ty = value.ty.clone();
                (InstructionKind::Return { value: Some(value) }, ty)
            }
            InstructionKind::Assign { dst, src } => {
                let dst = self.check_value(dst, scope)?;
                let src = self.check_value(src, scope)?;
                self.check_assignment(&dst, &src)?;

                (InstructionKind::Assign { dst, src }, void)
            }
            InstructionKind::ExprStmt { call } => {
                let call = self.check_value(call, scope)?;
                let ty = call.ty.clone();

                (InstructionKind::ExprStmt { call }, ty)
            }
            InstructionKind::While { condition, body } => {
                let condition = self.check_condition(condition, scope)?;
                let body = self.check_instruction(*body, scope, return_type)?;

                (
                    InstructionKind::While {
                        condition,
                        body: Box::new(body),
                    },
                    void,
                )
            }
            InstructionKind::If {
                condition,
                then_body,
            } => {
                let condition = self.check_condition(condition, scope)?;
                let then_body = self.check_instruction(*then_body, scope, return_type)?;

                (
                    InstructionKind::If {
                        condition,
                        then_body: Box::new(then_body),
                    },
                    void,
                )
            }
            InstructionKind::Break => (InstructionKind::Break, void),
            InstructionKind::Continue => (InstructionKind::Continue, void),
            InstructionKind::Decl { variables } => {
                let mut typed = Vec::with_capacity(variables.len());

                for variable in variables {
                    let ValueKind::Variable { name } = variable.kind else {
                        return Err(Error::internal("declaration of a non-variable", variable.span.start));
                    };
                    let ty = variable.ty.ok_or_else(|| {
                        Error::internal(
                            format!("declaration of `{}` has no type", name),
                            variable.span.start.clone(),
                        )
                    })?;

                    self.check_variable_type(&name, &ty)
                        .map_err(at(&variable.span.start))?;
                    scope.declare_variable(&name, ty.clone(), &variable.span.start)?;
                    typed.push(TypedValue::new(ValueKind::Variable { name }, ty, variable.span));
                }

                (InstructionKind::Decl { variables: typed }, void)
            }
            InstructionKind::Block(block) => {
                let block = self.check_block(block, scope, return_type)?;
                (InstructionKind::Block(block), void)
            }
        };

        Ok(TypedInstruction::new(kind, ty, instruction.span))
    }

    fn check_condition(&self, condition: UntypedValue, scope: &FunctionScope) -> Result<TypedValue, Error> {
        let condition = self.check_value(condition, scope)?;

        if !condition.is_comparison() {
            return Err(Error::new(ErrorImpl::InvalidCondition, condition.span.start));
        }

        Ok(condition)
    }

    fn check_assignment(&self, dst: &TypedValue, src: &TypedValue) -> Result<(), Error> {
        let Some(target) = destination_type(dst) else {
            return Err(Error::new(ErrorImpl::NotAssignable, dst.span.start.clone()));
        };

        let allowed = matches!(
            (src.ty.storage_class(), target.storage_class()),
            (StorageClass::Primitive, StorageClass::Primitive)
                | (StorageClass::Reference, StorageClass::Primitive)
                | (StorageClass::Reference, StorageClass::Aggregate)
                | (StorageClass::Aggregate, StorageClass::Aggregate)
                | (StorageClass::Aggregate, StorageClass::Reference)
                | (StorageClass::Reference, StorageClass::Reference)
                | (StorageClass::Primitive, StorageClass::Reference)
        );

        if !allowed {
            return Err(Error::new(
                ErrorImpl::IncompatibleAssignment {
                    value: src.ty.display_name(),
                    target: target.display_name(),
                },
                src.span.start.clone(),
            ));
        }

        if src.ty.is_void() || !src.ty.same_object(&target) {
            return Err(Error::new(
                ErrorImpl::TypeMatchError {
                    expected: target.display_name(),
                    received: src.ty.display_name(),
                },
                src.span.start.clone(),
            ));
        }

        Ok(())
    }

    fn integer_operand(&self, value: &TypedValue) -> Result<(), Error> {
        if value.ty.object().is_integer() {
            Ok(())
        } else {
            Err(Error::new(
                ErrorImpl::InvalidOperand {
                    type_: value.ty.display_name(),
                },
                value.span.start.clone(),
            ))
        }
    }

    fn check_argument(&self, argument: &TypedValue, param: &TypeRef) -> Result<(), Error> {
        let matches = argument.ty.same_object(param)
            && !argument.ty.is_void()
            && (!param.is_reference() || is_addressable(argument));

        if matches {
            Ok(())
        } else {
            Err(Error::new(
                ErrorImpl::ArgumentTypeMatchError {
                    expected: param.display_name(),
                    received: argument.ty.display_name(),
                },
                argument.span.start.clone(),
            ))
        }
    }

    /// Types one value node.
    pub fn check_value(&self, value: UntypedValue, scope: &FunctionScope) -> Result<TypedValue, Error> {
        let position = value.span.start.clone();

        let (kind, ty) = match value.kind {
            ValueKind::IntegerLiteral { value } => {
                (ValueKind::IntegerLiteral { value }, self.types.literal_type())
            }
            ValueKind::Variable { name } => {
                let ty = match (scope.get_variable(&name), value.ty) {
                    (Some(ty), _) => ty.clone(),
                    (None, Some(ty)) => ty,
                    (None, None) => {
                        return Err(Error::new(
                            ErrorImpl::VariableNotDeclared { variable: name },
                            position,
                        ))
                    }
                };

                tracing::trace!(variable = %name, ty = %ty.display_name(), "resolved variable");
                (ValueKind::Variable { name }, ty)
            }
            ValueKind::FunctionRef { name, .. } => {
                let Some(signature) = self.signatures.get(&name) else {
                    return Err(Error::new(ErrorImpl::UnknownFunction { function: name }, position));
                };

                let ty = self.types.as_prvalue(&signature.return_type);
                (
                    ValueKind::FunctionRef {
                        name,
                        declared_return_type: Some(signature.return_type.clone()),
                    },
                    ty,
                )
            }
            ValueKind::BinaryOp { operator, lhs, rhs } => {
                let lhs = self.check_value(*lhs, scope)?;
                let rhs = self.check_value(*rhs, scope)?;
                self.integer_operand(&lhs)?;
                self.integer_operand(&rhs)?;

                // Only the left operand decides whether the result is read
                // through a reference.
                let ty = match lhs.ty.referenced_type() {
                    Some(referenced) => self.types.as_prvalue(referenced),
                    None => self.types.as_prvalue(&lhs.ty),
                };

                (
                    ValueKind::BinaryOp {
                        operator,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    ty,
                )
            }
            ValueKind::Call {
                callee, arguments, ..
            } => {
                let callee = self.check_value(*callee, scope)?;
                let ValueKind::FunctionRef { name, .. } = &callee.kind else {
                    return Err(Error::internal("callee is not a function name", position));
                };
                let Some(signature) = self.signatures.get(name) else {
                    return Err(Error::new(
                        ErrorImpl::UnknownFunction {
                            function: name.clone(),
                        },
                        position,
                    ));
                };

                let (expected, received) = (signature.params.len(), arguments.len());
                if received > expected {
                    return Err(Error::new(
                        ErrorImpl::UnexpectedArguments { expected, received },
                        position,
                    ));
                }
                if received < expected {
                    return Err(Error::new(
                        ErrorImpl::MissingArguments { expected, received },
                        position,
                    ));
                }

                let arguments = arguments
                    .into_iter()
                    .map(|argument| self.check_value(argument, scope))
                    .collect::<Result<Vec<_>, _>>()?;

                for (argument, param) in arguments.iter().zip(&signature.params) {
                    self.check_argument(argument, param)?;
                }

                let ty = self.types.as_prvalue(&signature.return_type);
                (
                    ValueKind::Call {
                        callee: Box::new(callee),
                        arguments,
                        declared_arg_types: signature.params.clone(),
                    },
                    ty,
                )
            }
            ValueKind::Index { base, indices } => {
                let base = self.check_value(*base, scope)?;
                let Some(element) = base.ty.element_type().cloned() else {
                    return Err(Error::new(
                        ErrorImpl::NotAnArray {
                            type_: base.ty.display_name(),
                        },
                        base.span.start,
                    ));
                };

                if indices.len() != 1 {
                    return Err(Error::new(
                        ErrorImpl::RankMismatch {
                            rank: indices.len(),
                        },
                        position,
                    ));
                }

                let indices = indices
                    .into_iter()
                    .map(|index| self.check_value(index, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                for index in &indices {
                    self.integer_operand(index)?;
                }

                let ty = self.types.as_reference(&element).map_err(at(&position))?;
                (
                    ValueKind::Index {
                        base: Box::new(base),
                        indices,
                    },
                    ty,
                )
            }
            ValueKind::Member { base, member } => {
                let base = self.check_value(*base, scope)?;
                let object = base.ty.object();

                if !object.is_struct() {
                    return Err(Error::new(
                        ErrorImpl::NotAStruct {
                            type_: base.ty.display_name(),
                        },
                        base.span.start,
                    ));
                }

                let member_type = object
                    .struct_body()
                    .and_then(|body| body.member(&member).map(|(_, ty)| ty.clone()));
                let Some(member_type) = member_type else {
                    return Err(Error::new(
                        ErrorImpl::UnknownMember {
                            structure: object.name().to_string(),
                            member,
                        },
                        position,
                    ));
                };

                // A reference member is read as the reference it holds.
                let ty = if member_type.is_reference() {
                    self.types.as_lvalue(&member_type)
                } else {
                    self.types.as_reference(&member_type).map_err(at(&position))?
                };

                (
                    ValueKind::Member {
                        base: Box::new(base),
                        member,
                    },
                    ty,
                )
            }
            ValueKind::ArrayAlloc { length, init_value } => {
                let Some(count) = fold_constant(&length) else {
                    return Err(Error::new(ErrorImpl::NonConstantArrayLength, length.span.start));
                };
                if count < 0 {
                    return Err(Error::new(
                        ErrorImpl::NegativeArrayLength { length: count },
                        length.span.start,
                    ));
                }

                let init_value = self.check_value(*init_value, scope)?;
                if init_value.ty.is_void() {
                    return Err(Error::new(
                        ErrorImpl::InvalidOperand {
                            type_: init_value.ty.display_name(),
                        },
                        init_value.span.start,
                    ));
                }

                let element = self.types.as_declared(&init_value.ty.object());
                let array = self
                    .types
                    .array_of(&element, count as u64)
                    .map_err(at(&position))?;

                let length = TypedValue::new(
                    ValueKind::IntegerLiteral { value: count },
                    self.types.literal_type(),
                    length.span,
                );

                (
                    ValueKind::ArrayAlloc {
                        length: Box::new(length),
                        init_value: Box::new(init_value),
                    },
                    self.types.as_prvalue(&array),
                )
            }
        };

        Ok(TypedValue::new(kind, ty, value.span))
    }
}

/// Runs the type-assignment pass over `program`.
///
/// # Arguments
///
/// * `program` - The untyped program
/// * `types` - The table the program's types were interned in
/// * `library` - Library functions callable from the program
///
/// # Returns
///
/// The typed program or the first type error.
pub fn type_check(
    program: UntypedProgram,
    types: &TypeTable,
    library: &[LibraryFunction],
) -> Result<TypedProgram, Error> {
    TypeChecker::new(types).check_program(program, library)
}
