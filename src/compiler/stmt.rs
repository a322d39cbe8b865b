use crate::{
    ast::{
        ast::{TypedBlock, TypedInstruction, TypedValue},
        expressions::ValueKind,
        statements::InstructionKind,
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::type_checker::destination_type,
    types::types::StorageClass,
};

use super::{
    compiler::FunctionLowering,
    expr::{gen_call, gen_value, load_scalar, member_address, referent_address},
    ir::{Operand, Terminator},
};

pub fn gen_block(lowering: &mut FunctionLowering, block: &TypedBlock) -> Result<(), Error> {
    for instruction in &block.instructions {
        gen_instruction(lowering, instruction)?;
    }

    Ok(())
}

pub fn gen_instruction(lowering: &mut FunctionLowering, instruction: &TypedInstruction) -> Result<(), Error> {
    match &instruction.kind {
        InstructionKind::Return { value } => gen_return(lowering, value.as_ref()),
        InstructionKind::Assign { dst, src } => gen_assign(lowering, dst, src),
        InstructionKind::ExprStmt { call } => {
            gen_value(lowering, call)?;
            Ok(())
        }
        InstructionKind::While { condition, body } => {
            let cond_block = lowering.builder.create_block("while.cond");
            let body_block = lowering.builder.create_block("while.body");
            let end_block = lowering.builder.create_block("while.end");

            lowering.builder.terminate(Terminator::Jump(cond_block));

            lowering.builder.set_current_block(cond_block);
            let condition = load_scalar(lowering, condition)?;
            lowering.builder.terminate(Terminator::Branch {
                condition,
                then_block: body_block,
                else_block: end_block,
            });

            lowering.builder.set_current_block(body_block);
            gen_instruction(lowering, body)?;
            lowering.builder.jump_if_open(cond_block);

            lowering.builder.set_current_block(end_block);
            Ok(())
        }
        InstructionKind::If {
            condition,
            then_body,
        } => {
            let condition = load_scalar(lowering, condition)?;

            let then_block = lowering.builder.create_block("if.then");
            let end_block = lowering.builder.create_block("if.end");
            lowering.builder.terminate(Terminator::Branch {
                condition,
                then_block,
                else_block: end_block,
            });

            lowering.builder.set_current_block(then_block);
            gen_instruction(lowering, then_body)?;
            lowering.builder.jump_if_open(end_block);

            lowering.builder.set_current_block(end_block);
            Ok(())
        }
        InstructionKind::Break => Err(not_implemented("break", instruction)),
        InstructionKind::Continue => Err(not_implemented("continue", instruction)),
        InstructionKind::Decl { variables } => {
            for variable in variables {
                if let Some(name) = variable.variable_name() {
                    lowering.declare_variable(name, &variable.ty);
                }
            }
            Ok(())
        }
        InstructionKind::Block(block) => gen_block(lowering, block),
    }
}

fn not_implemented(feature: &str, instruction: &TypedInstruction) -> Error {
    Error::new(
        ErrorImpl::NotImplementedError {
            feature: feature.to_string(),
        },
        instruction.span.start.clone(),
    )
}

fn gen_return(lowering: &mut FunctionLowering, value: Option<&TypedValue>) -> Result<(), Error> {
    let Some(value) = value else {
        lowering.builder.terminate(Terminator::Return(None));
        return Ok(());
    };

    let returned = match lowering.return_type.storage_class() {
        StorageClass::Aggregate => {
            let Some(hidden) = lowering.hidden_return.map(Operand::Value) else {
                return Err(lowering.internal_error(value, "aggregate return without a destination"));
            };

            // A returned call writes straight into the caller's destination.
            if value.is_call() {
                gen_call(lowering, value, Some(hidden))?;
            } else {
                let source = gen_value(lowering, value)?;
                let size = lowering.return_type.object_size();
                lowering.copy(hidden, source, size);
            }
            hidden
        }
        StorageClass::Reference => referent_address(lowering, value)?,
        StorageClass::Primitive => load_scalar(lowering, value)?,
    };

    lowering.builder.terminate(Terminator::Return(Some(returned)));
    Ok(())
}

/// The address an assignment to `dst` writes to.
fn destination_address(lowering: &mut FunctionLowering, dst: &TypedValue) -> Result<Operand, Error> {
    match &dst.kind {
        ValueKind::Variable { name } => Ok(Operand::Value(lowering.variable_slot(name, &dst.ty))),
        ValueKind::Index { .. } => gen_value(lowering, dst),
        ValueKind::Member { base, member } => Ok(member_address(lowering, base, member)?.0),
        _ => Err(lowering.internal_error(dst, "assignment to a value without storage")),
    }
}

/// Lowers `dst = src` by the storage classes of the source value and of the
/// destination's storage.
///
/// | source    | destination | effect                                   |
/// |-----------|-------------|------------------------------------------|
/// | integer   | integer     | store the value                          |
/// | reference | integer     | store the referenced value               |
/// | reference | aggregate   | copy the referenced object               |
/// | aggregate | aggregate   | copy the object                          |
/// | aggregate | reference   | rebind the reference to the object       |
/// | reference | reference   | rebind the reference to the referent     |
/// | integer   | reference   | store the value through the reference    |
fn gen_assign(lowering: &mut FunctionLowering, dst: &TypedValue, src: &TypedValue) -> Result<(), Error> {
    let Some(target) = destination_type(dst) else {
        return Err(lowering.internal_error(dst, "assignment destination has no storage type"));
    };

    match (src.ty.storage_class(), target.storage_class()) {
        (StorageClass::Primitive, StorageClass::Primitive)
        | (StorageClass::Reference, StorageClass::Primitive) => {
            let value = load_scalar(lowering, src)?;
            let address = destination_address(lowering, dst)?;
            lowering.store(address, value);
        }
        (StorageClass::Reference, StorageClass::Aggregate) => {
            let size = src.ty.object().object_size();
            let source = gen_value(lowering, src)?;
            let address = destination_address(lowering, dst)?;
            lowering.copy(address, source, size);
        }
        (StorageClass::Aggregate, StorageClass::Aggregate) => {
            let size = src.ty.object_size();
            let source = gen_value(lowering, src)?;
            let address = destination_address(lowering, dst)?;
            lowering.copy(address, source, size);
        }
        (StorageClass::Aggregate, StorageClass::Reference)
        | (StorageClass::Reference, StorageClass::Reference) => {
            let referent = gen_value(lowering, src)?;
            let address = destination_address(lowering, dst)?;
            lowering.store(address, referent);
        }
        (StorageClass::Primitive, StorageClass::Reference) => {
            let value = load_scalar(lowering, src)?;
            let address = destination_address(lowering, dst)?;
            let referent = lowering.load(address);
            lowering.store(referent, value);
        }
        (source, destination) => {
            return Err(lowering.internal_error(
                src,
                &format!(
                    "no lowering for assigning {:?} storage to {:?} storage",
                    source, destination
                ),
            ));
        }
    }

    Ok(())
}
