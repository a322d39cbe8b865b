use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("null dereference")]
    NullDereference,
    #[error("access of {size} bytes at address {address} is out of bounds")]
    OutOfBounds { address: i64, size: u64 },
    #[error("unknown function `{function}`")]
    UnknownFunction { function: String },
    #[error("`{function}` takes {expected} arguments but {received} were supplied")]
    ArgumentCount {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("value %{value} used before it was defined in `{function}`")]
    UndefinedValue { function: String, value: u32 },
    #[error("reached unreachable code in `{function}`")]
    Unreachable { function: String },
    #[error("`input` called with no input left")]
    InputExhausted,
    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },
    #[error("allocating {requested} bytes exceeds the memory limit of {limit} bytes")]
    OutOfMemory { requested: u64, limit: usize },
    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded { limit: usize },
}
