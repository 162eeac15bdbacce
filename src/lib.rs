//! # Rae Compiler Crate
//!
//! Core implementation of the `rae` toolchain: lexer, parser, module graph
//! loader, value model, bytecode compiler, stack VM, native registry, and
//! hot-patch protocol. Exposes the [`compiler::Driver`] orchestrating
//! struct and the individual phase functions for callers that want a
//! single stage without the full pipeline.

/// Defines the Abstract Syntax Tree (AST) node structures and related types.
pub mod ast;
/// Bump allocator used for arena-scoped compiler storage.
pub mod arena;
/// Experimental C back-end (`build --emit-c`); an interface-level stub.
pub mod codegen;
/// The core compiler logic: lexer, parser, module graph, manifest, and the
/// `Driver` orchestrating all CLI subcommands.
pub mod compiler;
/// Utilities for debugging and introspection of compiler stages.
pub mod debug;
/// The bytecode compiler, chunk format, stack VM, native registry, and
/// hot-patch protocol.
pub mod bytecode;
/// Pretty-printer used by the `format` command.
pub mod pretty;
/// Runtime value model shared by the bytecode compiler and the VM.
pub mod value;

pub use compiler::Driver;
pub use compiler::parse;
pub use compiler::tokenize;
