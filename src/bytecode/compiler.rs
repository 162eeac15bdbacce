//! AST → chunk lowering (§4.4).
//!
//! The VM back-end only lowers a deliberately small subset of the AST:
//! literals, identifiers, binary/unary arithmetic and comparison, calls
//! (native and user), `log`/`logS`, `def`, a single-value `ret`, and `if`.
//! Every other construct the parser happily accepts — `loop`, `match`,
//! `assign`, `destructure`, multi-valued/labeled `ret`, member access,
//! indexing, object/list/collection literals, interpolated strings — is a
//! real gap in this back-end, not an oversight: §4.4 documents it as a
//! known limitation of the VM lowering, not of the language. Reported with
//! the same `RaeError::compile` diagnostic family as an arity mismatch so
//! the CLI prints one consistent `file:line:col: message` shape (§7).

use std::collections::HashMap;

use crate::ast::nodes::{
    BinaryOp, Declaration, Expr, ExprKind, FunctionDecl, Program, Stmt, StmtKind, UnaryOp,
};
use crate::bytecode::chunk::{Chunk, FunctionEntry, OpCode};
use crate::compiler::error::RaeError;
use crate::value::Value;

const ENTRY_FUNCTION: &str = "main";

struct LocalScope {
    names: HashMap<String, u16>,
    next_slot: u16,
}

impl LocalScope {
    fn new() -> Self {
        Self {
            names: HashMap::new(),
            next_slot: 0,
        }
    }

    /// Errors on the slot *after* `u16::MAX`, since a local's slot index is
    /// carried by GET_LOCAL/SET_LOCAL's 2-byte operand.
    fn declare(&mut self, name: &str) -> Result<u16, String> {
        let slot = self.next_slot;
        self.next_slot = self
            .next_slot
            .checked_add(1)
            .ok_or_else(|| format!("local variable table overflow: cannot declare '{name}'"))?;
        self.names.insert(name.to_string(), slot);
        Ok(slot)
    }

    fn resolve(&self, name: &str) -> Option<u16> {
        self.names.get(name).copied()
    }
}

pub struct BytecodeCompiler {
    chunk: Chunk,
    file: String,
}

impl BytecodeCompiler {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            chunk: Chunk::new(),
            file: file.into(),
        }
    }

    /// Lowers a merged AST (§4.3) into a runnable [`Chunk`] (§4.4).
    pub fn compile(program: &Program, file: impl Into<String>) -> Result<Chunk, RaeError> {
        let mut compiler = Self::new(file);
        compiler.compile_program(program)?;
        Ok(compiler.chunk)
    }

    fn err(&self, span: crate::ast::nodes::Span, message: impl Into<String>) -> RaeError {
        RaeError::compile(self.file.clone(), span.line, span.col, message)
    }

    fn compile_program(&mut self, program: &Program) -> Result<(), RaeError> {
        let functions: Vec<&FunctionDecl> = program
            .declarations
            .iter()
            .filter_map(|d| match d {
                Declaration::Function(f) => Some(f),
                _ => None,
            })
            .collect();

        for f in &functions {
            if self.chunk.find_function(&f.name).is_some() {
                return Err(self.err(f.span, format!("duplicate function '{}'", f.name)));
            }
            self.chunk.functions.push(FunctionEntry {
                name: f.name.clone(),
                offset: None,
                param_count: f.param_count(),
                is_extern: f.is_extern,
                patch_sites: Vec::new(),
            });
        }

        if self.chunk.find_function(ENTRY_FUNCTION).is_none() {
            return Err(RaeError::compile(
                self.file.clone(),
                0,
                0,
                format!("no '{ENTRY_FUNCTION}' function declared"),
            ));
        }

        // Synthetic entry sequence: CALL main 0; RETURN 0 (§4.4 step 2).
        self.emit_call_by_name(ENTRY_FUNCTION, 0, crate::ast::nodes::Span::default())?;
        self.chunk.emit_op(OpCode::Return, 0);
        self.chunk.emit_u8(0, 0);

        for f in &functions {
            let idx = self.chunk.find_function(&f.name).unwrap();
            self.chunk.functions[idx].offset = Some(self.chunk.current_offset());
            if let Some(body) = &f.body {
                let mut scope = LocalScope::new();
                for p in &f.params {
                    scope.declare(&p.name).map_err(|msg| self.err(f.span, msg))?;
                }
                self.compile_block(body, &mut scope)?;
                // Implicit fall-off-the-end return.
                self.chunk.emit_op(OpCode::Return, f.span.line);
                self.chunk.emit_u8(0, f.span.line);
            } else if !f.is_extern {
                return Err(self.err(f.span, format!("function '{}' has no body", f.name)));
            }
        }

        self.resolve_patch_sites()?;

        if self.chunk.code.len() > Chunk::MAX_CODE_SIZE {
            return Err(RaeError::compile(
                self.file.clone(),
                0,
                0,
                format!(
                    "compiled code size {} exceeds the 64 KiB limit",
                    self.chunk.code.len()
                ),
            ));
        }
        Ok(())
    }

    fn resolve_patch_sites(&mut self) -> Result<(), RaeError> {
        for i in 0..self.chunk.functions.len() {
            let (name, offset, sites) = {
                let f = &self.chunk.functions[i];
                (f.name.clone(), f.offset, f.patch_sites.clone())
            };
            if sites.is_empty() {
                continue;
            }
            let offset = offset.ok_or_else(|| {
                RaeError::compile(self.file.clone(), 0, 0, format!("unresolved function '{name}'"))
            })?;
            for site in sites {
                self.chunk.patch_u16(site, offset as u16);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, body: &[Stmt], scope: &mut LocalScope) -> Result<(), RaeError> {
        for stmt in body {
            self.compile_stmt(stmt, scope)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt, scope: &mut LocalScope) -> Result<(), RaeError> {
        match &stmt.kind {
            StmtKind::Def { name, value, .. } => {
                self.compile_expr(value, scope)?;
                let slot = scope.declare(name).map_err(|msg| self.err(stmt.span, msg))?;
                self.chunk.emit_op(OpCode::SetLocal, stmt.span.line);
                self.chunk.emit_u16(slot, stmt.span.line);
                Ok(())
            }
            StmtKind::Expr(expr) => {
                self.compile_expr(expr, scope)?;
                // Calls used as statements still push a result; discard it.
                self.chunk.emit_op(OpCode::Pop, stmt.span.line);
                Ok(())
            }
            StmtKind::Ret { values } => {
                if values.is_empty() {
                    self.chunk.emit_op(OpCode::Return, stmt.span.line);
                    self.chunk.emit_u8(0, stmt.span.line);
                    Ok(())
                } else if values.len() == 1 && values[0].label.is_none() {
                    self.compile_expr(&values[0].value, scope)?;
                    self.chunk.emit_op(OpCode::Return, stmt.span.line);
                    self.chunk.emit_u8(1, stmt.span.line);
                    Ok(())
                } else {
                    Err(self.err(
                        stmt.span,
                        "multiple or labeled return values are not supported in VM yet",
                    ))
                }
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                self.compile_expr(cond, scope)?;
                self.chunk.emit_op(OpCode::JumpIfFalse, stmt.span.line);
                let else_patch = self.chunk.emit_u16_placeholder(stmt.span.line);
                self.compile_block(then_branch, scope)?;
                self.chunk.emit_op(OpCode::Jump, stmt.span.line);
                let end_patch = self.chunk.emit_u16_placeholder(stmt.span.line);
                let else_target = self.chunk.current_offset();
                self.chunk.patch_u16(else_patch, else_target as u16);
                if let Some(else_branch) = else_branch {
                    self.compile_block(else_branch, scope)?;
                }
                let end_target = self.chunk.current_offset();
                self.chunk.patch_u16(end_patch, end_target as u16);
                Ok(())
            }
            StmtKind::Loop { .. } => Err(self.err(stmt.span, "loop is not supported in VM yet")),
            StmtKind::Match { .. } => Err(self.err(stmt.span, "match statement is not supported in VM yet")),
            StmtKind::Assign { .. } => Err(self.err(stmt.span, "assign is not supported in VM yet")),
            StmtKind::Destructure { .. } => {
                Err(self.err(stmt.span, "destructuring is not supported in VM yet"))
            }
        }
    }

    fn compile_expr(&mut self, expr: &Expr, scope: &LocalScope) -> Result<(), RaeError> {
        match &expr.kind {
            ExprKind::Integer(i) => self.emit_constant(Value::Int(*i), expr.span),
            ExprKind::Float(x) => self.emit_constant(Value::Float(*x), expr.span),
            ExprKind::Bool(b) => self.emit_constant(Value::Bool(*b), expr.span),
            ExprKind::Char(c) => self.emit_constant(Value::Char(*c), expr.span),
            ExprKind::Str(s) => self.emit_constant(Value::Str(s.clone()), expr.span),
            ExprKind::None => self.emit_constant(Value::None, expr.span),
            ExprKind::Ident(name) => {
                let slot = scope
                    .resolve(name)
                    .ok_or_else(|| self.err(expr.span, format!("undefined identifier '{name}'")))?;
                self.chunk.emit_op(OpCode::GetLocal, expr.span.line);
                self.chunk.emit_u16(slot, expr.span.line);
                Ok(())
            }
            ExprKind::Unary { op, operand } => {
                self.compile_expr(operand, scope)?;
                let opcode = match op {
                    UnaryOp::Neg => OpCode::Neg,
                    UnaryOp::Not => OpCode::Not,
                    UnaryOp::Spawn => {
                        return Err(self.err(expr.span, "spawn is not supported in VM yet"))
                    }
                };
                self.chunk.emit_op(opcode, expr.span.line);
                Ok(())
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.compile_expr(lhs, scope)?;
                self.compile_expr(rhs, scope)?;
                let opcode = match op {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Sub => OpCode::Sub,
                    BinaryOp::Mul => OpCode::Mul,
                    BinaryOp::Div => OpCode::Div,
                    BinaryOp::Mod => OpCode::Mod,
                    BinaryOp::Lt => OpCode::Lt,
                    BinaryOp::Le => OpCode::Le,
                    BinaryOp::Gt => OpCode::Gt,
                    BinaryOp::Ge => OpCode::Ge,
                    BinaryOp::Is => OpCode::Eq,
                    BinaryOp::And | BinaryOp::Or => {
                        return Err(self.err(expr.span, "short-circuit and/or is not supported in VM yet"))
                    }
                };
                self.chunk.emit_op(opcode, expr.span.line);
                Ok(())
            }
            ExprKind::Call { callee, args } => self.compile_call(callee, args, expr.span, scope),
            _ => Err(self.err(expr.span, "expression form is not supported in VM yet")),
        }
    }

    fn emit_constant(&mut self, value: Value, span: crate::ast::nodes::Span) -> Result<(), RaeError> {
        let idx = self.chunk.add_constant(value).map_err(|msg| self.err(span, msg))?;
        self.chunk.emit_op(OpCode::Constant, span.line);
        self.chunk.emit_u16(idx, span.line);
        Ok(())
    }

    fn compile_call(
        &mut self,
        callee: &Expr,
        args: &[crate::ast::nodes::Arg],
        span: crate::ast::nodes::Span,
        scope: &LocalScope,
    ) -> Result<(), RaeError> {
        let name = match &callee.kind {
            ExprKind::Ident(name) => name.clone(),
            _ => return Err(self.err(span, "call target must be a direct identifier")),
        };

        if name == "log" || name == "logS" {
            if args.len() != 1 {
                return Err(self.err(span, format!("'{name}' requires exactly one argument")));
            }
            self.compile_expr(&args[0].value, scope)?;
            let opcode = if name == "log" { OpCode::Log } else { OpCode::LogS };
            self.chunk.emit_op(opcode, span.line);
            return Ok(());
        }

        let idx = self
            .chunk
            .find_function(&name)
            .ok_or_else(|| self.err(span, format!("call to undefined function '{name}'")))?;
        let expected_argc = self.chunk.functions[idx].param_count;
        if expected_argc != args.len() {
            return Err(self.err(
                span,
                format!(
                    "'{name}' expects {expected_argc} argument(s) but call has {}",
                    args.len()
                ),
            ));
        }

        for arg in args {
            self.compile_expr(&arg.value, scope)?;
        }

        if self.chunk.functions[idx].is_extern {
            let name_const = self.chunk.add_constant(Value::Str(name)).map_err(|msg| self.err(span, msg))?;
            self.chunk.emit_op(OpCode::NativeCall, span.line);
            self.chunk.emit_u16(name_const, span.line);
            self.chunk.emit_u8(args.len() as u8, span.line);
        } else {
            self.emit_call_by_name(&name, args.len() as u8, span)?;
        }
        Ok(())
    }

    fn emit_call_by_name(
        &mut self,
        name: &str,
        argc: u8,
        span: crate::ast::nodes::Span,
    ) -> Result<(), RaeError> {
        let idx = self
            .chunk
            .find_function(name)
            .ok_or_else(|| self.err(span, format!("call to undefined function '{name}'")))?;
        self.chunk.emit_op(OpCode::Call, span.line);
        let site = self.chunk.emit_u16_placeholder(span.line);
        self.chunk.functions[idx].patch_sites.push(site);
        self.chunk.emit_u8(argc, span.line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;
    use crate::compiler::parser::parse;

    fn compile_src(src: &str) -> Result<Chunk, RaeError> {
        let (tokens, _) = tokenize("t.rae", src).unwrap();
        let module = parse("t.rae", tokens)?;
        let program = Program { declarations: module.declarations };
        BytecodeCompiler::compile(&program, "t.rae")
    }

    #[test]
    fn compiles_main_with_log_call() {
        let chunk = compile_src("func main() { def x: int = 1 + 2 log(x) }").unwrap();
        assert!(chunk.find_function("main").is_some());
        assert!(!chunk.code.is_empty());
    }

    #[test]
    fn rejects_arity_mismatch() {
        let err = compile_src(
            "func add(a: int, b: int): ret int { ret a + b }\nfunc main() { log(add(1)) }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("expects 2 argument(s) but call has 1"));
    }

    #[test]
    fn loop_statement_reports_unsupported_diagnostic() {
        let err = compile_src("func main() { loop i: int in 0..3 { log(i) } }").unwrap_err();
        assert!(err.to_string().contains("not supported in VM yet"));
    }

    #[test]
    fn local_scope_declare_rejects_the_slot_past_u16_max() {
        let mut scope = LocalScope::new();
        scope.next_slot = u16::MAX;
        assert_eq!(scope.declare("last").unwrap(), u16::MAX);
        assert!(scope.declare("overflow").is_err());
    }

    #[test]
    fn oversized_code_is_rejected_before_hot_patch_can_misread_an_offset() {
        // Each `def x: int = 1` lowers to a 3-byte CONSTANT plus a 3-byte
        // SET_LOCAL; enough repetitions push the chunk past the 64 KiB cap.
        let body = "def x: int = 1 ".repeat(11_000);
        let err = compile_src(&format!("func main() {{ {body} }}")).unwrap_err();
        assert!(err.to_string().contains("exceeds the 64 KiB limit"));
    }
}
