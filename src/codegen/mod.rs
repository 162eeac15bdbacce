//! Experimental C back-end.
//!
//! `build --emit-c` is an interface-level stub: it is wired into the CLI so
//! the flag exists and fails predictably, but it is explicitly a non-goal
//! to elaborate into a real C emitter. The teacher's full NASM back-end
//! (`common`/`expression_generator`/`statement_generator`/`print_generator`/
//! `protection`) targeted a different output entirely and has no
//! counterpart here; see `DESIGN.md` for the trim rationale.

use crate::ast::nodes::Program;
use crate::compiler::error::RaeError;

/// Always fails — the C back-end accepts no input yet. Kept as a function
/// (rather than rejecting the flag at the CLI layer) so the stub's error
/// message carries the same `RaeError::Compile` shape every other
/// diagnostic does.
pub fn emit_c(_program: &Program, file: &str) -> Result<String, RaeError> {
    Err(RaeError::compile(
        file,
        0,
        0,
        "--emit-c is not implemented: the C back-end is an interface-level stub",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_c_reports_a_compile_error() {
        let program = Program { declarations: vec![] };
        let err = emit_c(&program, "t.rae").unwrap_err();
        assert!(matches!(err, RaeError::Compile { .. }));
    }
}
