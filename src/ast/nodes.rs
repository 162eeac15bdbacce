//! AST node definitions.
//!
//! One [`Module`] per source file; the module graph loader (§4.3)
//! concatenates each module's `declarations` in load order to build the
//! merged AST the bytecode compiler walks. Every statement and expression
//! carries a [`Span`] so diagnostics (arity mismatches, undefined
//! identifiers, unsupported constructs) can be reported with file/line/col
//! per §7.

use super::types::AstTypeRef;

/// A location in a single source file. Modules are compiled independently
/// of one another so a `Span` alone (without a file id) is sufficient
/// inside one module's tree; the module graph attaches the file path when
/// it formats a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// One parsed source file: its import/export clauses plus declarations.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Module {
    pub imports: Vec<ImportClause>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportClause {
    pub path: String,
    pub is_export: bool,
    pub span: Span,
}

/// The merged AST: every loaded module's declarations concatenated in
/// dependency order (§4.3). Nothing downstream of the module graph cares
/// which file a declaration came from — name resolution is global.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum Declaration {
    Type(TypeDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub generics: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: AstTypeRef,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum Visibility {
    #[default]
    Default,
    Pub,
    Priv,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<EnumVariant>,
    pub span: Span,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EnumVariant {
    pub name: String,
    /// Tuple-style payload types, empty for a unit variant.
    pub payload: Vec<AstTypeRef>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub is_extern: bool,
    pub generics: Vec<String>,
    pub params: Vec<Param>,
    pub returns: Vec<ReturnItem>,
    pub properties: Vec<FunctionProperty>,
    /// `None` iff `is_extern`; the parser rejects a missing body on a
    /// non-extern function (§3 invariants).
    pub body: Option<Block>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_spawn(&self) -> bool {
        self.properties.contains(&FunctionProperty::Spawn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum FunctionProperty {
    Pub,
    Priv,
    Spawn,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Param {
    pub name: String,
    pub ty: AstTypeRef,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReturnItem {
    pub label: Option<String>,
    pub ty: AstTypeRef,
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum StmtKind {
    /// `def name: Type = value` or `def name = value` (type inferred).
    Def {
        name: String,
        ty: Option<AstTypeRef>,
        value: Expr,
        is_bind: bool,
    },
    /// `def a: A, def b: B = someCall(...)` — destructuring a multi-valued
    /// named return. Requires >= 2 bindings and a call-like RHS (§3).
    Destructure {
        bindings: Vec<DestructureBinding>,
        call: Expr,
    },
    Assign {
        target: Expr,
        value: Expr,
        is_bind: bool,
    },
    Expr(Expr),
    /// `ret a, label: b` — an ordered list of optionally-labeled values.
    /// The VM back-end only accepts zero or one unlabeled value (§4.4);
    /// the AST itself places no such restriction.
    Ret { values: Vec<RetValue> },
    If {
        cond: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    Loop {
        /// Binding introduced by a `for`-style range loop (`loop i in a..b`).
        variable: Option<String>,
        range: Option<(Expr, Expr)>,
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Box<Stmt>>,
        is_range: bool,
        body: Block,
    },
    Match {
        subject: Expr,
        cases: Vec<MatchCase>,
    },
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DestructureBinding {
    pub local_name: String,
    pub return_label: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RetValue {
    pub label: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MatchCase {
    /// `None` marks the `default` case; at most one per match (§3). A
    /// present pattern is an ordinary expression compared against the
    /// subject with the `is` operator — this language has no separate
    /// pattern grammar.
    pub pattern: Option<Expr>,
    pub body: Block,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// True for the subset the compiler accepts as a call target: a bare
    /// identifier (§3 invariant — "the subject of each call expression is a
    /// direct identifier").
    pub fn is_direct_identifier(&self) -> bool {
        matches!(self.kind, ExprKind::Ident(_))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum ExprKind {
    Ident(String),
    Integer(i64),
    Float(f64),
    /// A plain string literal; escapes already resolved by the lexer/parser.
    Str(String),
    /// A string literal containing one or more `{expr}` interpolations.
    InterpolatedStr(Vec<StringSegment>),
    Char(char),
    Bool(bool),
    None,
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Arg>,
    },
    Member {
        object: Box<Expr>,
        name: String,
    },
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Arg>,
    },
    /// Same status as `List`/`Collection`: no surface expression syntax
    /// builds one.
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// `(field: expr, ...)`. `ty` is never populated by the parser — this
    /// grammar has no typed-construction prefix — but the slot is kept
    /// because object literals are documented as optionally typed.
    Object {
        ty: Option<AstTypeRef>,
        fields: Vec<(String, Expr)>,
    },
    /// Reachable only by hand-built AST (e.g. the pretty-printer's
    /// round-trip tests): no surface expression syntax produces a `List`
    /// today. `[`/`]` are not dead tokens overall — `parse_type_ref` uses
    /// them for generic type arguments (`Foo[Bar]`) — there is simply no
    /// list-literal expression grammar built on top of them. See
    /// `DESIGN.md`.
    List(Vec<Expr>),
    /// Same status as `List`.
    Collection(Vec<CollectionElement>),
    Match {
        subject: Box<Expr>,
        arms: Vec<MatchArm>,
    },
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum StringSegment {
    Literal(String),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionElement {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MatchArm {
    /// `None` marks the `default` arm; at most one per match (§3).
    pub pattern: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

/// `==`/`!=` lex as operators (§4.1) but bind to no production here: this
/// grammar uses `is` for equality, the one comparison the original
/// actually wires up. Dead tokens are left alone rather than invented
/// into a second equality operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Is,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum UnaryOp {
    Neg,
    Not,
    Spawn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_target_must_be_direct_identifier() {
        let ident = Expr::new(ExprKind::Ident("f".into()), Span::new(1, 1));
        assert!(ident.is_direct_identifier());

        let member = Expr::new(
            ExprKind::Member {
                object: Box::new(ident.clone()),
                name: "g".into(),
            },
            Span::new(1, 1),
        );
        assert!(!member.is_direct_identifier());
    }

    #[test]
    fn function_param_count_matches_params_len() {
        let f = FunctionDecl {
            name: "f".into(),
            is_extern: false,
            generics: vec![],
            params: vec![
                Param {
                    name: "a".into(),
                    ty: AstTypeRef::simple("int"),
                },
                Param {
                    name: "b".into(),
                    ty: AstTypeRef::simple("int"),
                },
            ],
            returns: vec![],
            properties: vec![],
            body: Some(vec![]),
            span: Span::default(),
        };
        assert_eq!(f.param_count(), 2);
    }
}
