//! Error types for every phase of the pipeline.
//!
//! One `thiserror` enum, matching the teacher's `CompileError` in spirit:
//! a flat set of variants with constructor helpers, `#[from]` for I/O, and
//! `Display` messages the CLI prints verbatim to stderr. The variant
//! families mirror §7 of the specification: I/O, lexical/syntactic,
//! semantic (compile), runtime (VM), and hot-patch.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type threaded through lexing, parsing, module
/// resolution, compilation, and execution.
#[derive(Error, Debug)]
pub enum RaeError {
    /// Wrapper for standard I/O errors (file reads, directory walks).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No `.rae` source files were found under the given path.
    #[error("{path}: no .rae source files found")]
    NoSourceFiles { path: PathBuf },

    /// An import normalized outside of the project root.
    #[error("{path}: import escapes the project root")]
    OutsideRoot { path: PathBuf },

    /// The module graph detected an import cycle; `chain` is the
    /// printable `A -> B -> A` path.
    #[error("cyclic import detected: {chain}")]
    CyclicImport { chain: String },

    /// A lexical or syntactic error, located at `file:line:col`.
    #[error("{file}:{line}:{col}: {message}")]
    Syntax {
        file: String,
        line: usize,
        col: usize,
        message: String,
    },

    /// A compile-time (semantic) error: unknown identifier, arity
    /// mismatch, unsupported construct, duplicate function, oversized
    /// chunk, local-table overflow.
    #[error("{file}:{line}:{col}: {message}")]
    Compile {
        file: String,
        line: usize,
        col: usize,
        message: String,
    },

    /// A runtime error raised by the VM: stack under/overflow, division
    /// by zero, invalid function address, type mismatch, bad native call.
    #[error("runtime error: {message}")]
    Runtime { message: String },

    /// A hot-patch could not be installed for the named function; other
    /// functions in the patch still install (§4.7).
    #[error("hot-patch failed for '{function}': {message}")]
    HotPatch { function: String, message: String },

    /// Raised by `test` when one or more `.rae` files failed.
    #[error("{failed} of {total} file(s) failed")]
    TestFailed { failed: usize, total: usize },
}

impl RaeError {
    pub fn no_source_files(path: impl Into<PathBuf>) -> Self {
        Self::NoSourceFiles { path: path.into() }
    }

    pub fn outside_root(path: impl Into<PathBuf>) -> Self {
        Self::OutsideRoot { path: path.into() }
    }

    pub fn cyclic_import(chain: &[String]) -> Self {
        Self::CyclicImport {
            chain: chain.join(" -> "),
        }
    }

    pub fn lexer(file: impl Into<String>, line: usize, col: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            line,
            col,
            message: message.into(),
        }
    }

    pub fn parser(file: impl Into<String>, line: usize, col: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            line,
            col,
            message: message.into(),
        }
    }

    pub fn compile(file: impl Into<String>, line: usize, col: usize, message: impl Into<String>) -> Self {
        Self::Compile {
            file: file.into(),
            line,
            col,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    pub fn hot_patch(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HotPatch {
            function: function.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_formats_as_file_line_col_message() {
        let err = RaeError::lexer("a.rae", 3, 7, "unterminated string");
        assert_eq!(err.to_string(), "a.rae:3:7: unterminated string");
    }

    #[test]
    fn cyclic_import_joins_chain_with_arrows() {
        let err = RaeError::cyclic_import(&["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "cyclic import detected: a -> b -> a");
    }
}
