//! Abstract Syntax Tree for the source language.
//!
//! - [`nodes`]: module/program/statement/expression node definitions.
//! - [`types`]: type-reference nodes (`AstTypeRef`) with ownership modifiers.

pub mod nodes;
pub mod types;

pub use nodes::{Module, Program};
pub use types::AstTypeRef;
