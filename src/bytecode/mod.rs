//! Bytecode compiler, chunk format, stack VM, native registry, and
//! hot-patch protocol (§4.4–§4.8).

pub mod chunk;
pub mod compiler;
pub mod hotpatch;
pub mod natives;
pub mod registry;
pub mod vm;

pub use chunk::Chunk;
pub use compiler::BytecodeCompiler;
pub use registry::Registry;
pub use vm::{Vm, VmOutcome};
