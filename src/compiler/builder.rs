use super::ir::{BasicBlock, BlockId, FunctionIr, FunctionSignature, Op, Operand, Terminator, ValueId};

/// Incrementally builds the blocks of one function.
///
/// Storage requested through [`FunctionBuilder::alloca`] and its
/// initialisation are collected in a prologue that runs once at function
/// entry, wherever in the body the request was made.
pub struct FunctionBuilder {
    signature: FunctionSignature,
    parameters: Vec<ValueId>,
    prologue: Vec<Op>,
    blocks: Vec<BasicBlock>,
    current: BlockId,
    next_value: u32,
}

impl FunctionBuilder {
    pub fn new(signature: FunctionSignature) -> Self {
        let mut builder = FunctionBuilder {
            signature,
            parameters: vec![],
            prologue: vec![],
            blocks: vec![],
            current: BlockId(0),
            next_value: 0,
        };

        builder.parameters = (0..builder.signature.arity())
            .map(|_| builder.fresh_value())
            .collect();
        builder.current = builder.create_block("entry");
        builder
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    pub fn parameters(&self) -> &[ValueId] {
        &self.parameters
    }

    pub fn fresh_value(&mut self) -> ValueId {
        let value = ValueId(self.next_value);
        self.next_value += 1;
        value
    }

    pub fn create_block(&mut self, label: &str) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock {
            id,
            label: label.to_string(),
            ops: vec![],
            terminator: None,
        });
        id
    }

    pub fn set_current_block(&mut self, block: BlockId) {
        self.current = block;
    }

    pub fn current_block(&self) -> BlockId {
        self.current
    }

    pub fn is_terminated(&self) -> bool {
        self.blocks
            .get(self.current.0 as usize)
            .is_some_and(|block| block.terminator.is_some())
    }

    // Code after a terminator is unreachable but still lowered, into a
    // fresh block nothing jumps to.
    fn open_block(&mut self) -> &mut BasicBlock {
        if self.is_terminated() {
            let dead = self.create_block("dead");
            self.current = dead;
        }

        let index = self.current.0 as usize;
        &mut self.blocks[index]
    }

    pub fn push(&mut self, op: Op) {
        self.open_block().ops.push(op);
    }

    pub fn terminate(&mut self, terminator: Terminator) {
        self.open_block().terminator = Some(terminator);
    }

    /// Jumps to `target` unless the current block already ended.
    pub fn jump_if_open(&mut self, target: BlockId) {
        if !self.is_terminated() {
            self.terminate(Terminator::Jump(target));
        }
    }

    /// Reserves entry-scoped storage.
    pub fn alloca(&mut self, size: u64, name: &str) -> ValueId {
        let dst = self.fresh_value();
        self.prologue.push(Op::Alloca {
            dst,
            size,
            name: name.to_string(),
        });
        dst
    }

    /// Stores `value` into `address` once, at function entry.
    pub fn initialise(&mut self, address: ValueId, value: Operand) {
        self.prologue.push(Op::Store {
            address: Operand::Value(address),
            value,
        });
    }

    /// Pushes an op producing a fresh value and returns that value.
    pub fn emit(&mut self, make: impl FnOnce(ValueId) -> Op) -> ValueId {
        let dst = self.fresh_value();
        self.push(make(dst));
        dst
    }

    /// Closes open blocks and produces the function.
    ///
    /// Blocks that fall off the end return nothing in `void` functions and
    /// are unreachable otherwise.
    pub fn finish(mut self, returns_void: bool) -> FunctionIr {
        for block in &mut self.blocks {
            if block.terminator.is_none() {
                block.terminator = Some(if returns_void {
                    Terminator::Return(None)
                } else {
                    Terminator::Unreachable
                });
            }
        }

        if let Some(entry) = self.blocks.first_mut() {
            let body = std::mem::take(&mut entry.ops);
            entry.ops = self.prologue;
            entry.ops.extend(body);
        }

        FunctionIr {
            signature: self.signature,
            parameters: self.parameters,
            blocks: self.blocks,
            value_count: self.next_value,
        }
    }
}
