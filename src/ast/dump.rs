//! Textual dump of a program tree.
//!
//! ```text
//! define int64 (NONE) add int64 (NONE) a int64 (NONE) b
//!  |scope
//!  | |return
//!  | | |ADD type: int64 (PR Value)
//!  | | | |int64 (NONE) a
//!  | | | |int64 (NONE) b
//! ```

use std::fmt::Write;

use super::{
    ast::{Annotation, Function, Program},
    expressions::{BinaryOperator, Value, ValueKind},
    statements::{Instruction, InstructionKind},
};

fn operator_name(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::Add => "ADD",
        BinaryOperator::Sub => "SUB",
        BinaryOperator::Mul => "MUL",
        BinaryOperator::And => "AND",
        BinaryOperator::Shl => "SHL",
        BinaryOperator::Shr => "SHR",
        BinaryOperator::Less => "LT",
        BinaryOperator::Greater => "GT",
        BinaryOperator::LessEquals => "LE",
        BinaryOperator::GreaterEquals => "GE",
        BinaryOperator::Equals => "EQ",
    }
}

struct Dumper {
    output: String,
    depth: usize,
}

impl Dumper {
    fn line(&mut self, text: &str) {
        self.output.push_str(&" |".repeat(self.depth));
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn function<T: Annotation>(&mut self, function: &Function<T>) {
        let mut header = format!(
            "define {} {}",
            function.return_type.display_name(),
            function.name
        );
        for param in &function.params {
            let _ = write!(header, " {}", describe_value(param));
        }
        self.line(&header);

        self.nested(|dumper| {
            dumper.line("scope");
            dumper.nested(|dumper| {
                for instruction in &function.body.instructions {
                    dumper.instruction(instruction);
                }
            });
        });
    }

    fn value<T: Annotation>(&mut self, value: &Value<T>) {
        self.line(&describe_value(value));

        self.nested(|dumper| match &value.kind {
            ValueKind::Variable { .. }
            | ValueKind::IntegerLiteral { .. }
            | ValueKind::FunctionRef { .. } => {}
            ValueKind::BinaryOp { lhs, rhs, .. } => {
                dumper.value(lhs);
                dumper.value(rhs);
            }
            ValueKind::Call {
                callee, arguments, ..
            } => {
                dumper.value(callee);
                for argument in arguments {
                    dumper.value(argument);
                }
            }
            ValueKind::Index { base, indices } => {
                dumper.value(base);
                for index in indices {
                    dumper.value(index);
                }
            }
            ValueKind::Member { base, .. } => dumper.value(base),
            ValueKind::ArrayAlloc { length, init_value } => {
                dumper.value(length);
                dumper.value(init_value);
            }
        });
    }

    fn instruction<T: Annotation>(&mut self, instruction: &Instruction<T>) {
        match &instruction.kind {
            InstructionKind::Return { value } => {
                self.line("return");
                if let Some(value) = value {
                    self.nested(|dumper| dumper.value(value));
                }
            }
            InstructionKind::Assign { dst, src } => {
                self.line("assign");
                self.nested(|dumper| {
                    dumper.value(dst);
                    dumper.value(src);
                });
            }
            InstructionKind::ExprStmt { call } => {
                self.line("call");
                self.nested(|dumper| dumper.value(call));
            }
            InstructionKind::While { condition, body } => {
                self.line("while stmt");
                self.nested(|dumper| {
                    dumper.value(condition);
                    dumper.instruction(body);
                });
            }
            InstructionKind::If {
                condition,
                then_body,
            } => {
                self.line("if stmt");
                self.nested(|dumper| {
                    dumper.value(condition);
                    dumper.instruction(then_body);
                });
            }
            InstructionKind::Break => self.line("BREAK"),
            InstructionKind::Continue => self.line("CONTINUE"),
            InstructionKind::Decl { variables } => {
                self.line("decl");
                self.nested(|dumper| {
                    for variable in variables {
                        dumper.value(variable);
                    }
                });
            }
            InstructionKind::Block(block) => {
                self.line("scope");
                self.nested(|dumper| {
                    for instruction in &block.instructions {
                        dumper.instruction(instruction);
                    }
                });
            }
        }
    }
}

fn describe_value<T: Annotation>(value: &Value<T>) -> String {
    let ty = value.ty.describe();

    match &value.kind {
        ValueKind::Variable { name } => format!("{} {}", ty, name),
        ValueKind::IntegerLiteral { value } => format!("{} {}", value, ty),
        ValueKind::FunctionRef {
            name,
            declared_return_type,
        } => match declared_return_type {
            Some(return_type) => format!("{} {}", return_type.display_name(), name),
            None => format!("{} {}", ty, name),
        },
        ValueKind::BinaryOp { operator, .. } => {
            format!("{} type: {}", operator_name(*operator), ty)
        }
        ValueKind::Call { .. } => String::from("func call"),
        ValueKind::Index { .. } => format!("array access type: {}", ty),
        ValueKind::Member { member, .. } => format!("member {} type: {}", member, ty),
        ValueKind::ArrayAlloc { .. } => format!("array allocate type: {}", ty),
    }
}

/// Renders every function of `program`, one node per line.
pub fn dump_program<T: Annotation>(program: &Program<T>) -> String {
    let mut dumper = Dumper {
        output: String::new(),
        depth: 0,
    };

    for function in &program.functions {
        dumper.function(function);
    }

    dumper.output
}
