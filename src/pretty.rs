//! Pretty-printer: renders a [`Module`]/[`Program`] back to source text
//! (§6 `format` command, §8 round-trip property).
//!
//! An external collaborator per §1 — specified only at its interface
//! (`pretty_print(&Program) -> String`), not expanded into its own
//! elaborate subsystem. The teacher has nothing resembling this (it never
//! prints its AST back out); structure follows the same declarations the
//! parser builds, one render function per node kind, indentation tracked
//! by a simple depth counter the way `statement_parser.rs`'s block parsing
//! tracks brace nesting.

use crate::ast::nodes::{
    BinaryOp, Declaration, Expr, ExprKind, FunctionDecl, FunctionProperty, Module, Param, Program,
    ReturnItem, Stmt, StmtKind, StringSegment, TypeDecl, UnaryOp, Visibility,
};
use crate::ast::types::AstTypeRef;

const INDENT: &str = "    ";

pub fn pretty_print(program: &Program) -> String {
    let mut out = String::new();
    for (i, decl) in program.declarations.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        print_declaration(&mut out, decl, 0);
    }
    out
}

pub fn pretty_print_module(module: &Module) -> String {
    let mut out = String::new();
    for clause in &module.imports {
        let kw = if clause.is_export { "export" } else { "import" };
        out.push_str(&format!("{kw} \"{}\"\n", clause.path));
    }
    if !module.imports.is_empty() {
        out.push('\n');
    }
    out.push_str(&pretty_print(&Program { declarations: module.declarations.clone() }));
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn print_type_ref(ty: &AstTypeRef) -> String {
    let mut parts = Vec::new();
    if ty.modifiers.is_view {
        parts.push("view".to_string());
    }
    if ty.modifiers.is_mod {
        parts.push("mod".to_string());
    }
    if ty.modifiers.is_opt {
        parts.push("opt".to_string());
    }
    if ty.modifiers.is_id {
        parts.push("id".to_string());
    }
    if ty.modifiers.is_key {
        parts.push("key".to_string());
    }
    parts.push(ty.path.join("."));
    let mut rendered = parts.join(" ");
    if !ty.generic_args.is_empty() {
        let args: Vec<String> = ty.generic_args.iter().map(print_type_ref).collect();
        rendered.push('[');
        rendered.push_str(&args.join(", "));
        rendered.push(']');
    }
    rendered
}

fn print_declaration(out: &mut String, decl: &Declaration, depth: usize) {
    match decl {
        Declaration::Type(t) => print_type_decl(out, t, depth),
        Declaration::Enum(e) => print_enum_decl(out, e, depth),
        Declaration::Function(f) => print_func_decl(out, f, depth),
    }
}

fn print_type_decl(out: &mut String, t: &TypeDecl, depth: usize) {
    indent(out, depth);
    out.push_str("type ");
    out.push_str(&t.name);
    if !t.generics.is_empty() {
        out.push('[');
        out.push_str(&t.generics.join(", "));
        out.push(']');
    }
    out.push_str(" {\n");
    for field in &t.fields {
        indent(out, depth + 1);
        if field.visibility != Visibility::Default {
            let kw = if field.visibility == Visibility::Pub { "pub " } else { "priv " };
            out.push_str(kw);
        }
        out.push_str(&format!("{}: {}\n", field.name, print_type_ref(&field.ty)));
    }
    indent(out, depth);
    out.push_str("}\n");
}

fn print_enum_decl(out: &mut String, e: &crate::ast::nodes::EnumDecl, depth: usize) {
    indent(out, depth);
    out.push_str(&format!("enum {} {{\n", e.name));
    for variant in &e.variants {
        indent(out, depth + 1);
        out.push_str(&variant.name);
        if !variant.payload.is_empty() {
            let payload: Vec<String> = variant.payload.iter().map(print_type_ref).collect();
            out.push('(');
            out.push_str(&payload.join(", "));
            out.push(')');
        }
        out.push_str(",\n");
    }
    indent(out, depth);
    out.push_str("}\n");
}

fn print_params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| format!("{}: {}", p.name, print_type_ref(&p.ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_returns(returns: &[ReturnItem]) -> String {
    returns
        .iter()
        .map(|r| match &r.label {
            Some(label) => format!("{label}: {}", print_type_ref(&r.ty)),
            None => print_type_ref(&r.ty),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_func_decl(out: &mut String, f: &FunctionDecl, depth: usize) {
    indent(out, depth);
    if f.is_extern {
        out.push_str("extern ");
    }
    out.push_str("func ");
    out.push_str(&f.name);
    if !f.generics.is_empty() {
        out.push('[');
        out.push_str(&f.generics.join(", "));
        out.push(']');
    }
    out.push('(');
    out.push_str(&print_params(&f.params));
    out.push(')');

    if !f.properties.is_empty() || !f.returns.is_empty() {
        out.push(':');
        for prop in &f.properties {
            let kw = match prop {
                FunctionProperty::Pub => "pub",
                FunctionProperty::Priv => "priv",
                FunctionProperty::Spawn => "spawn",
            };
            out.push(' ');
            out.push_str(kw);
        }
        if !f.returns.is_empty() {
            out.push_str(" ret ");
            out.push_str(&print_returns(&f.returns));
        }
    }

    match &f.body {
        Some(body) => {
            out.push_str(" {\n");
            for stmt in body {
                print_stmt(out, stmt, depth + 1);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        None => out.push('\n'),
    }
}

fn print_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    indent(out, depth);
    match &stmt.kind {
        StmtKind::Def { name, ty, value, is_bind } => {
            out.push_str("def ");
            out.push_str(name);
            if let Some(ty) = ty {
                out.push_str(&format!(": {}", print_type_ref(ty)));
            }
            out.push_str(if *is_bind { " => " } else { " = " });
            out.push_str(&print_expr(value));
            out.push('\n');
        }
        StmtKind::Destructure { bindings, call } => {
            let parts: Vec<String> = bindings
                .iter()
                .map(|b| match &b.return_label {
                    Some(label) => format!("def {}: {label}", b.local_name),
                    None => format!("def {}", b.local_name),
                })
                .collect();
            out.push_str(&parts.join(", "));
            out.push_str(" = ");
            out.push_str(&print_expr(call));
            out.push('\n');
        }
        StmtKind::Assign { target, value, is_bind } => {
            out.push_str(&print_expr(target));
            out.push_str(if *is_bind { " => " } else { " = " });
            out.push_str(&print_expr(value));
            out.push('\n');
        }
        StmtKind::Expr(expr) => {
            out.push_str(&print_expr(expr));
            out.push('\n');
        }
        StmtKind::Ret { values } => {
            out.push_str("ret");
            if !values.is_empty() {
                out.push(' ');
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| match &v.label {
                        Some(label) => format!("{label}: {}", print_expr(&v.value)),
                        None => print_expr(&v.value),
                    })
                    .collect();
                out.push_str(&parts.join(", "));
            }
            out.push('\n');
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            out.push_str("if ");
            out.push_str(&print_expr(cond));
            out.push_str(" {\n");
            for s in then_branch {
                print_stmt(out, s, depth + 1);
            }
            indent(out, depth);
            out.push('}');
            if let Some(else_branch) = else_branch {
                out.push_str(" else {\n");
                for s in else_branch {
                    print_stmt(out, s, depth + 1);
                }
                indent(out, depth);
                out.push('}');
            }
            out.push('\n');
        }
        StmtKind::Loop { variable, range, cond, body, is_range, .. } => {
            out.push_str("loop ");
            if *is_range {
                let var = variable.as_deref().unwrap_or("_");
                let (start, end) = range.as_ref().expect("range loop always carries a range");
                out.push_str(&format!("{var} in {}..{}", print_expr(start), print_expr(end)));
            } else if let Some(cond) = cond {
                out.push_str(&print_expr(cond));
            }
            out.push_str(" {\n");
            for s in body {
                print_stmt(out, s, depth + 1);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        StmtKind::Match { subject, cases } => {
            out.push_str("match ");
            out.push_str(&print_expr(subject));
            out.push_str(" {\n");
            for case in cases {
                indent(out, depth + 1);
                match &case.pattern {
                    Some(p) => out.push_str(&format!("case {} ", print_expr(p))),
                    None => out.push_str("default "),
                }
                out.push_str("{\n");
                for s in &case.body {
                    print_stmt(out, s, depth + 2);
                }
                indent(out, depth + 1);
                out.push_str("}\n");
            }
            indent(out, depth);
            out.push_str("}\n");
        }
    }
}

fn print_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Ident(name) => name.clone(),
        ExprKind::Integer(i) => i.to_string(),
        ExprKind::Float(x) => x.to_string(),
        ExprKind::Str(s) => format!("\"{s}\""),
        ExprKind::InterpolatedStr(segments) => {
            let mut rendered = String::from("\"");
            for seg in segments {
                match seg {
                    StringSegment::Literal(s) => rendered.push_str(s),
                    StringSegment::Expr(e) => rendered.push_str(&format!("{{{}}}", print_expr(e))),
                }
            }
            rendered.push('"');
            rendered
        }
        ExprKind::Char(c) => format!("'{c}'"),
        ExprKind::Bool(b) => b.to_string(),
        ExprKind::None => "none".to_string(),
        ExprKind::Binary { op, lhs, rhs } => {
            format!("{} {} {}", print_expr(lhs), print_binary_op(*op), print_expr(rhs))
        }
        ExprKind::Unary { op, operand } => match op {
            UnaryOp::Neg => format!("-{}", print_expr(operand)),
            UnaryOp::Not => format!("not {}", print_expr(operand)),
            UnaryOp::Spawn => format!("spawn {}", print_expr(operand)),
        },
        ExprKind::Call { callee, args } => {
            format!("{}({})", print_expr(callee), print_args(args))
        }
        ExprKind::Member { object, name } => format!("{}.{name}", print_expr(object)),
        ExprKind::MethodCall { object, method, args } => {
            format!("{}.{method}({})", print_expr(object), print_args(args))
        }
        ExprKind::Index { target, index } => format!("{}[{}]", print_expr(target), print_expr(index)),
        ExprKind::Object { fields, .. } => {
            let parts: Vec<String> = fields.iter().map(|(n, v)| format!("{n}: {}", print_expr(v))).collect();
            format!("({})", parts.join(", "))
        }
        ExprKind::List(items) => {
            let parts: Vec<String> = items.iter().map(print_expr).collect();
            format!("[{}]", parts.join(", "))
        }
        ExprKind::Collection(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|e| match &e.key {
                    Some(k) => format!("{}: {}", print_expr(k), print_expr(&e.value)),
                    None => print_expr(&e.value),
                })
                .collect();
            format!("[{}]", parts.join(", "))
        }
        ExprKind::Match { subject, arms } => {
            let parts: Vec<String> = arms
                .iter()
                .map(|arm| match &arm.pattern {
                    Some(p) => format!("case {} => {}", print_expr(p), print_expr(&arm.value)),
                    None => format!("default => {}", print_expr(&arm.value)),
                })
                .collect();
            format!("match {} {{ {} }}", print_expr(subject), parts.join(" | "))
        }
    }
}

fn print_args(args: &[crate::ast::nodes::Arg]) -> String {
    args.iter()
        .map(|a| match &a.name {
            Some(name) => format!("{name}: {}", print_expr(&a.value)),
            None => print_expr(&a.value),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_binary_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Is => "is",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;
    use crate::compiler::parser::parse;

    fn roundtrip(src: &str) -> Program {
        let (tokens, _) = tokenize("t.rae", src).unwrap();
        let module = parse("t.rae", tokens).unwrap();
        let program = Program { declarations: module.declarations };
        let printed = pretty_print(&program);
        let (tokens2, _) = tokenize("t.rae", &printed).unwrap();
        let module2 = parse("t.rae", tokens2).unwrap();
        Program { declarations: module2.declarations }
    }

    #[test]
    fn simple_function_round_trips_through_pretty_print() {
        let program = roundtrip("func main(): ret int { ret 1 + 2 }");
        assert_eq!(program.declarations.len(), 1);
    }

    #[test]
    fn type_declaration_round_trips() {
        let program = roundtrip("type Point { x: int y: int }");
        assert_eq!(program.declarations.len(), 1);
    }

    #[test]
    fn enum_declaration_round_trips() {
        let program = roundtrip("enum Shape { Circle(int), Square }");
        assert_eq!(program.declarations.len(), 1);
    }
}
