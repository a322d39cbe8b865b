//! The lowered, target-independent IR.
//!
//! Every function is a list of basic blocks over virtual values. Storage is
//! explicit: variables live in `Alloca` slots, aggregates are moved with
//! `Copy`, and the call ABI (reference parameters, hidden return
//! destinations) is visible in the operands of every `Call`.

use std::{collections::BTreeMap, fmt::Display};

use crate::ast::expressions::BinaryOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Value(ValueId),
    Const(i64),
    /// The null pointer.
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Reserves `size` bytes of function-entry scoped storage.
    Alloca {
        dst: ValueId,
        size: u64,
        name: String,
    },
    /// Reads one word.
    Load { dst: ValueId, address: Operand },
    /// Writes one word.
    Store { address: Operand, value: Operand },
    /// Copies `size` bytes.
    Copy {
        destination: Operand,
        source: Operand,
        size: u64,
    },
    /// `base + index * stride`
    ElementAddress {
        dst: ValueId,
        base: Operand,
        index: Operand,
        stride: u64,
    },
    /// `base + offset`
    FieldAddress {
        dst: ValueId,
        base: Operand,
        offset: u64,
    },
    Binary {
        dst: ValueId,
        operator: BinaryOperator,
        lhs: Operand,
        rhs: Operand,
    },
    Call {
        dst: Option<ValueId>,
        callee: String,
        arguments: Vec<Operand>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Jump(BlockId),
    /// Non-zero conditions take `then_block`.
    Branch {
        condition: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return(Option<Operand>),
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub ops: Vec<Op>,
    pub terminator: Option<Terminator>,
}

/// How a parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamClass {
    /// A word passed by value.
    Scalar,
    /// The address of the caller's object.
    Reference,
    /// The address of the caller's object; the callee copies it on entry.
    Aggregate { size: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnClass {
    Void,
    Scalar,
    Reference,
    /// Written through the hidden destination argument, whose address is
    /// also returned.
    Aggregate { size: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<ParamClass>,
    pub returns: ReturnClass,
    /// The caller appends the address of a destination after the user
    /// arguments.
    pub hidden_return: bool,
    /// Declared but implemented outside the module.
    pub is_library: bool,
}

impl FunctionSignature {
    /// Number of arguments a call passes, including the hidden destination.
    pub fn arity(&self) -> usize {
        self.params.len() + usize::from(self.hidden_return)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionIr {
    pub signature: FunctionSignature,
    /// One value per argument, the hidden destination last.
    pub parameters: Vec<ValueId>,
    pub blocks: Vec<BasicBlock>,
    pub value_count: u32,
}

impl FunctionIr {
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.0 as usize)
    }

    pub fn ops(&self) -> impl Iterator<Item = &Op> {
        self.blocks.iter().flat_map(|block| block.ops.iter())
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub symbols: BTreeMap<String, FunctionSignature>,
    pub functions: Vec<FunctionIr>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&FunctionIr> {
        self.functions
            .iter()
            .find(|function| function.signature.name == name)
    }
}

impl Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Value(value) => write!(f, "{}", value),
            Operand::Const(constant) => write!(f, "{}", constant),
            Operand::Null => write!(f, "null"),
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Alloca { dst, size, name } => write!(f, "{} = alloca {} ; {}", dst, size, name),
            Op::Load { dst, address } => write!(f, "{} = load {}", dst, address),
            Op::Store { address, value } => write!(f, "store {}, {}", address, value),
            Op::Copy {
                destination,
                source,
                size,
            } => write!(f, "copy {}, {}, {}", destination, source, size),
            Op::ElementAddress {
                dst,
                base,
                index,
                stride,
            } => write!(f, "{} = element {}, {} x {}", dst, base, index, stride),
            Op::FieldAddress { dst, base, offset } => {
                write!(f, "{} = field {}, +{}", dst, base, offset)
            }
            Op::Binary {
                dst,
                operator,
                lhs,
                rhs,
            } => write!(f, "{} = {} {} {}", dst, lhs, operator, rhs),
            Op::Call {
                dst,
                callee,
                arguments,
            } => {
                if let Some(dst) = dst {
                    write!(f, "{} = ", dst)?;
                }
                let arguments = arguments
                    .iter()
                    .map(|argument| argument.to_string())
                    .collect::<Vec<_>>();
                write!(f, "call @{}({})", callee, arguments.join(", "))
            }
        }
    }
}

impl Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminator::Jump(target) => write!(f, "jump {}", target),
            Terminator::Branch {
                condition,
                then_block,
                else_block,
            } => write!(f, "branch {}, {}, {}", condition, then_block, else_block),
            Terminator::Return(Some(value)) => write!(f, "return {}", value),
            Terminator::Return(None) => write!(f, "return"),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl Display for FunctionSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self
            .params
            .iter()
            .map(|param| match param {
                ParamClass::Scalar => String::from("scalar"),
                ParamClass::Reference => String::from("ref"),
                ParamClass::Aggregate { size } => format!("aggregate({})", size),
            })
            .collect::<Vec<_>>();
        let returns = match self.returns {
            ReturnClass::Void => String::from("void"),
            ReturnClass::Scalar => String::from("scalar"),
            ReturnClass::Reference => String::from("ref"),
            ReturnClass::Aggregate { size } => format!("aggregate({})", size),
        };

        write!(f, "@{}({}) -> {}", self.name, params.join(", "), returns)?;
        if self.hidden_return {
            write!(f, " [hidden return]")?;
        }
        if self.is_library {
            write!(f, " [library]")?;
        }
        Ok(())
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for signature in self.symbols.values() {
            writeln!(f, "declare {}", signature)?;
        }

        for function in &self.functions {
            let parameters = function
                .parameters
                .iter()
                .map(|parameter| parameter.to_string())
                .collect::<Vec<_>>();
            writeln!(f)?;
            writeln!(f, "define @{}({}) {{", function.signature.name, parameters.join(", "))?;

            for block in &function.blocks {
                writeln!(f, "{}: ; {}", block.id, block.label)?;
                for op in &block.ops {
                    writeln!(f, "    {}", op)?;
                }
                if let Some(terminator) = &block.terminator {
                    writeln!(f, "    {}", terminator)?;
                }
            }

            writeln!(f, "}}")?;
        }

        Ok(())
    }
}
