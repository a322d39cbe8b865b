use crate::{
    ast::{ast::TypedValue, expressions::ValueKind},
    errors::errors::Error,
    types::types::TypeRef,
};

use super::{
    compiler::FunctionLowering,
    ir::{Op, Operand, ParamClass, ReturnClass},
};

/// Evaluates a value.
///
/// The operand produced depends on the value's type:
///
/// * integers give the integer itself, read from storage for variables
/// * references give the address of the referent
/// * aggregates give the address of the object
///
/// Calls to `void` functions give [`Operand::Null`].
pub fn gen_value(lowering: &mut FunctionLowering, value: &TypedValue) -> Result<Operand, Error> {
    match &value.kind {
        ValueKind::IntegerLiteral { value } => Ok(Operand::Const(*value)),
        ValueKind::Variable { name } => {
            let slot = Operand::Value(lowering.variable_slot(name, &value.ty));
            if value.ty.is_aggregate() {
                Ok(slot)
            } else {
                Ok(lowering.load(slot))
            }
        }
        ValueKind::FunctionRef { .. } => {
            Err(lowering.internal_error(value, "function reference used as a value"))
        }
        ValueKind::BinaryOp { operator, lhs, rhs } => {
            let lhs = load_scalar(lowering, lhs)?;
            let rhs = load_scalar(lowering, rhs)?;
            let operator = *operator;

            Ok(Operand::Value(lowering.builder.emit(|dst| Op::Binary {
                dst,
                operator,
                lhs,
                rhs,
            })))
        }
        ValueKind::Call { .. } => gen_call(lowering, value, None),
        ValueKind::Index { base, indices } => {
            let [index] = indices.as_slice() else {
                return Err(lowering.internal_error(value, "indexing expects exactly one index"));
            };
            let Some(element) = base.ty.element_type().cloned() else {
                return Err(lowering.internal_error(value, "indexed value is not an array"));
            };

            let base = gen_value(lowering, base)?;
            let index = load_scalar(lowering, index)?;
            let stride = element.object_size();

            Ok(Operand::Value(lowering.builder.emit(|dst| Op::ElementAddress {
                dst,
                base,
                index,
                stride,
            })))
        }
        ValueKind::Member { base, member } => {
            let (address, member_type) = member_address(lowering, base, member)?;

            // A reference member stores the address of its referent.
            if member_type.is_reference() {
                Ok(lowering.load(address))
            } else {
                Ok(address)
            }
        }
        ValueKind::ArrayAlloc { length, init_value } => {
            gen_array_alloc(lowering, value, length, init_value)
        }
    }
}

/// Evaluates an integer-valued operand, reading through a reference.
pub fn load_scalar(lowering: &mut FunctionLowering, value: &TypedValue) -> Result<Operand, Error> {
    let operand = gen_value(lowering, value)?;

    if value.ty.is_reference() {
        Ok(lowering.load(operand))
    } else {
        Ok(operand)
    }
}

/// The address of the object `value` denotes, for binding a reference.
pub fn referent_address(lowering: &mut FunctionLowering, value: &TypedValue) -> Result<Operand, Error> {
    if value.ty.is_reference() || value.ty.is_aggregate() {
        return gen_value(lowering, value);
    }

    match &value.kind {
        ValueKind::Variable { name } => Ok(Operand::Value(lowering.variable_slot(name, &value.ty))),
        _ => Err(lowering.internal_error(value, "value has no storage to refer to")),
    }
}

/// The address of the storage of `base.member`, and the member's type.
///
/// For a reference member this is the address of the word holding the
/// referent's address.
pub fn member_address(
    lowering: &mut FunctionLowering,
    base: &TypedValue,
    member: &str,
) -> Result<(Operand, TypeRef), Error> {
    let object = base.ty.object();
    let Some((offset, member_type)) = object.struct_body().and_then(|body| {
        body.member(member)
            .map(|(index, ty)| (body.member_offset(index), ty.clone()))
    }) else {
        return Err(lowering.internal_error(base, "member access on a value without that member"));
    };

    let base = gen_value(lowering, base)?;
    let address = lowering.builder.emit(|dst| Op::FieldAddress { dst, base, offset });

    Ok((Operand::Value(address), member_type))
}

/// Lowers a call.
///
/// Reference parameters receive the address of the argument, aggregate
/// parameters the address of a value the callee copies, and scalars their
/// value. A callee returning an aggregate writes it to `destination`, or to
/// a fresh temporary when none is given.
pub fn gen_call(
    lowering: &mut FunctionLowering,
    value: &TypedValue,
    destination: Option<Operand>,
) -> Result<Operand, Error> {
    let ValueKind::Call {
        callee,
        arguments,
        declared_arg_types,
    } = &value.kind
    else {
        return Err(lowering.internal_error(value, "expected a call"));
    };
    let ValueKind::FunctionRef { name, .. } = &callee.kind else {
        return Err(lowering.internal_error(value, "callee is not a function reference"));
    };
    let Some(signature) = lowering.symbols.get(name).cloned() else {
        return Err(lowering.internal_error(value, "call to a function without a signature"));
    };
    if arguments.len() != declared_arg_types.len() || arguments.len() != signature.params.len() {
        return Err(lowering.internal_error(value, "argument count does not match the signature"));
    }

    let mut operands = Vec::with_capacity(signature.arity());
    for (argument, class) in arguments.iter().zip(&signature.params) {
        let operand = match class {
            ParamClass::Reference => referent_address(lowering, argument)?,
            ParamClass::Aggregate { .. } => gen_value(lowering, argument)?,
            ParamClass::Scalar => load_scalar(lowering, argument)?,
        };
        operands.push(operand);
    }

    if let ReturnClass::Aggregate { size } = signature.returns {
        let destination = match destination {
            Some(destination) => destination,
            None => lowering.temporary(size, &format!("{}.result", name)),
        };
        operands.push(destination);
    }

    let dst = if matches!(signature.returns, ReturnClass::Void) {
        None
    } else {
        Some(lowering.builder.fresh_value())
    };

    lowering.builder.push(Op::Call {
        dst,
        callee: name.clone(),
        arguments: operands,
    });

    Ok(dst.map(Operand::Value).unwrap_or(Operand::Null))
}

/// Lowers `[init; length]` into a temporary array.
///
/// The initialiser is evaluated once per element.
fn gen_array_alloc(
    lowering: &mut FunctionLowering,
    value: &TypedValue,
    length: &TypedValue,
    init_value: &TypedValue,
) -> Result<Operand, Error> {
    let ValueKind::IntegerLiteral { value: count } = length.kind else {
        return Err(lowering.internal_error(value, "array length was not folded to a constant"));
    };
    let Some(element) = value.ty.element_type().cloned() else {
        return Err(lowering.internal_error(value, "array allocation is not of array type"));
    };

    let stride = element.object_size();
    let array = lowering.temporary(value.ty.object_size(), "array");

    for slot in 0..count {
        let address = Operand::Value(lowering.builder.emit(|dst| Op::ElementAddress {
            dst,
            base: array,
            index: Operand::Const(slot),
            stride,
        }));

        if element.is_aggregate() {
            let source = gen_value(lowering, init_value)?;
            lowering.copy(address, source, stride);
        } else {
            let init = load_scalar(lowering, init_value)?;
            lowering.store(address, init);
        }
    }

    Ok(array)
}
