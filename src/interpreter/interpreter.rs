use std::collections::{HashMap, VecDeque};

use crate::compiler::ir::{BlockId, FunctionIr, Module, Op, Operand, ReturnClass, Terminator, ValueId};

use super::{
    errors::RuntimeError,
    memory::{Memory, DEFAULT_MEMORY_LIMIT, NULL},
};

/// A library function implemented by the embedding program.
pub type HostFunction = Box<dyn FnMut(&[i64]) -> i64>;

pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;
pub const DEFAULT_CALL_DEPTH_LIMIT: usize = 256;

/// Executes the functions of one module.
///
/// `print` appends to [`Interpreter::output`] and `input` reads from the
/// queue given to [`Interpreter::with_input`]. Other library functions must
/// be registered with [`Interpreter::register_host_function`].
pub struct Interpreter<'m> {
    module: &'m Module,
    memory: Memory,
    output: Vec<i64>,
    input: VecDeque<i64>,
    host_functions: HashMap<String, HostFunction>,
    step_limit: u64,
    steps: u64,
    call_depth_limit: usize,
}

struct Frame<'f> {
    function: &'f FunctionIr,
    values: Vec<Option<i64>>,
}

impl Frame<'_> {
    fn get(&self, operand: &Operand) -> Result<i64, RuntimeError> {
        match operand {
            Operand::Value(value) => self
                .values
                .get(value.0 as usize)
                .copied()
                .flatten()
                .ok_or_else(|| RuntimeError::UndefinedValue {
                    function: self.function.signature.name.clone(),
                    value: value.0,
                }),
            Operand::Const(constant) => Ok(*constant),
            Operand::Null => Ok(NULL),
        }
    }

    fn set(&mut self, value: ValueId, result: i64) {
        if let Some(slot) = self.values.get_mut(value.0 as usize) {
            *slot = Some(result);
        }
    }
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        Interpreter {
            module,
            memory: Memory::with_limit(DEFAULT_MEMORY_LIMIT),
            output: vec![],
            input: VecDeque::new(),
            host_functions: HashMap::new(),
            step_limit: DEFAULT_STEP_LIMIT,
            steps: 0,
            call_depth_limit: DEFAULT_CALL_DEPTH_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_call_depth_limit(mut self, call_depth_limit: usize) -> Self {
        self.call_depth_limit = call_depth_limit;
        self
    }

    /// Caps the bytes a run may hold at once. Set it before allocating
    /// anything: it starts over with empty memory.
    pub fn with_memory_limit(mut self, limit: usize) -> Self {
        self.memory = Memory::with_limit(limit);
        self
    }

    pub fn with_input(mut self, input: impl IntoIterator<Item = i64>) -> Self {
        self.input.extend(input);
        self
    }

    pub fn register_host_function(
        &mut self,
        name: &str,
        function: impl FnMut(&[i64]) -> i64 + 'static,
    ) {
        self.host_functions
            .insert(name.to_string(), Box::new(function));
    }

    /// Values passed to `print`, in order.
    pub fn output(&self) -> &[i64] {
        &self.output
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Places `values` in fresh memory and returns the address of the first.
    pub fn allocate_array(&mut self, values: &[i64]) -> Result<i64, RuntimeError> {
        let size = (values.len() as u64).saturating_mul(8);
        let address = self.memory.allocate(size)?;
        for (index, value) in values.iter().enumerate() {
            self.memory.write_word(address + index as i64 * 8, *value)?;
        }
        Ok(address)
    }

    pub fn read_words(&self, address: i64, count: usize) -> Result<Vec<i64>, RuntimeError> {
        (0..count)
            .map(|index| self.memory.read_word(address + index as i64 * 8))
            .collect()
    }

    pub fn read_word(&self, address: i64) -> Result<i64, RuntimeError> {
        self.memory.read_word(address)
    }

    pub fn write_word(&mut self, address: i64, value: i64) -> Result<(), RuntimeError> {
        self.memory.write_word(address, value)
    }

    /// Calls `name` with the user-visible arguments.
    ///
    /// # Arguments
    ///
    /// * `name` - The function to run
    /// * `arguments` - Integers for scalar parameters, addresses otherwise
    ///
    /// # Returns
    ///
    /// The returned word, if any. For a function returning an aggregate the
    /// destination is allocated here and its address is returned.
    pub fn run_function(&mut self, name: &str, arguments: &[i64]) -> Result<Option<i64>, RuntimeError> {
        let Some(signature) = self.module.symbols.get(name) else {
            return Err(RuntimeError::UnknownFunction {
                function: name.to_string(),
            });
        };

        let mut arguments = arguments.to_vec();
        if let ReturnClass::Aggregate { size } = signature.returns {
            arguments.push(self.memory.allocate(size)?);
        }

        self.steps = 0;
        tracing::debug!(function = name, arguments = ?arguments, "running function");
        self.call(name, &arguments, 0)
    }

    fn step(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps > self.step_limit {
            Err(RuntimeError::StepLimitExceeded {
                limit: self.step_limit,
            })
        } else {
            Ok(())
        }
    }

    fn call(&mut self, name: &str, arguments: &[i64], depth: usize) -> Result<Option<i64>, RuntimeError> {
        if depth >= self.call_depth_limit {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.call_depth_limit,
            });
        }

        let module = self.module;
        let Some(signature) = module.symbols.get(name) else {
            return Err(RuntimeError::UnknownFunction {
                function: name.to_string(),
            });
        };
        if arguments.len() != signature.arity() {
            return Err(RuntimeError::ArgumentCount {
                function: name.to_string(),
                expected: signature.arity(),
                received: arguments.len(),
            });
        }

        if let Some(host) = self.host_functions.get_mut(name) {
            let result = host(arguments);
            return Ok((signature.returns != ReturnClass::Void).then_some(result));
        }

        if signature.is_library {
            return self.call_builtin(name, arguments);
        }

        let Some(function) = module.function(name) else {
            return Err(RuntimeError::UnknownFunction {
                function: name.to_string(),
            });
        };

        let mark = self.memory.mark();
        let result = self.execute(function, arguments, depth);
        self.memory.release(mark);
        result
    }

    fn call_builtin(&mut self, name: &str, arguments: &[i64]) -> Result<Option<i64>, RuntimeError> {
        match (name, arguments) {
            ("print", [value]) => {
                self.output.push(*value);
                Ok(None)
            }
            ("input", []) => self
                .input
                .pop_front()
                .map(Some)
                .ok_or(RuntimeError::InputExhausted),
            _ => Err(RuntimeError::UnknownFunction {
                function: name.to_string(),
            }),
        }
    }

    fn execute(
        &mut self,
        function: &'m FunctionIr,
        arguments: &[i64],
        depth: usize,
    ) -> Result<Option<i64>, RuntimeError> {
        let mut frame = Frame {
            function,
            values: vec![None; function.value_count as usize],
        };
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            frame.set(*parameter, *argument);
        }

        let mut current = BlockId(0);
        loop {
            let unreachable = || RuntimeError::Unreachable {
                function: function.signature.name.clone(),
            };
            let block = function.block(current).ok_or_else(unreachable)?;

            for op in &block.ops {
                self.step()?;
                tracing::trace!(function = %function.signature.name, op = %op, "execute");
                self.execute_op(op, &mut frame, depth)?;
            }

            self.step()?;
            match block.terminator.as_ref().ok_or_else(unreachable)? {
                Terminator::Jump(target) => current = *target,
                Terminator::Branch {
                    condition,
                    then_block,
                    else_block,
                } => {
                    current = if frame.get(condition)? != 0 {
                        *then_block
                    } else {
                        *else_block
                    };
                }
                Terminator::Return(value) => {
                    return value.as_ref().map(|value| frame.get(value)).transpose();
                }
                Terminator::Unreachable => return Err(unreachable()),
            }
        }
    }

    fn execute_op(&mut self, op: &Op, frame: &mut Frame, depth: usize) -> Result<(), RuntimeError> {
        match op {
            Op::Alloca { dst, size, .. } => {
                let address = self.memory.allocate(*size)?;
                frame.set(*dst, address);
            }
            Op::Load { dst, address } => {
                let value = self.memory.read_word(frame.get(address)?)?;
                frame.set(*dst, value);
            }
            Op::Store { address, value } => {
                self.memory.write_word(frame.get(address)?, frame.get(value)?)?;
            }
            Op::Copy {
                destination,
                source,
                size,
            } => {
                self.memory
                    .copy(frame.get(destination)?, frame.get(source)?, *size)?;
            }
            Op::ElementAddress {
                dst,
                base,
                index,
                stride,
            } => {
                let address = frame
                    .get(base)?
                    .wrapping_add(frame.get(index)?.wrapping_mul(*stride as i64));
                frame.set(*dst, address);
            }
            Op::FieldAddress { dst, base, offset } => {
                let address = frame.get(base)?.wrapping_add(*offset as i64);
                frame.set(*dst, address);
            }
            Op::Binary {
                dst,
                operator,
                lhs,
                rhs,
            } => {
                let result = operator.evaluate(frame.get(lhs)?, frame.get(rhs)?);
                frame.set(*dst, result);
            }
            Op::Call {
                dst,
                callee,
                arguments,
            } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| frame.get(argument))
                    .collect::<Result<Vec<_>, _>>()?;
                let result = self.call(callee, &arguments, depth + 1)?;
                if let (Some(dst), Some(result)) = (dst, result) {
                    frame.set(*dst, result);
                }
            }
        }

        Ok(())
    }
}
