//! Statement parsing (§3, §4.2): `def`/destructuring locals, `assign`,
//! `ret`, `if`/`else`, `loop`, `match`, and plain expression statements.

use super::common::Parser;
use super::expression_parser::ExpressionParser;
use crate::ast::nodes::{
    Block, DestructureBinding, Expr, ExprKind, MatchCase, RetValue, Stmt, StmtKind,
};
use crate::compiler::error::RaeError;
use crate::compiler::lexer::{Keyword, TokenKind};

/// A static utility struct dedicated to parsing statements, mirroring
/// [`ExpressionParser`]'s shape.
pub struct StatementParser;

impl StatementParser {
    /// `{ stmt* }`, used for function bodies and every block-bearing
    /// statement (`if`, `loop`, match case/default bodies).
    pub fn parse_block(parser: &mut Parser) -> Result<Block, RaeError> {
        parser.expect_kind(&TokenKind::LBrace, "'{' to start block")?;
        let mut stmts = Vec::new();
        while !parser.check(&TokenKind::RBrace) && !parser.is_at_end() {
            stmts.push(Self::parse_statement(parser)?);
        }
        parser.expect_kind(&TokenKind::RBrace, "'}' to close block")?;
        Ok(stmts)
    }

    pub fn parse_statement(parser: &mut Parser) -> Result<Stmt, RaeError> {
        let span = parser.span();
        if parser.match_keyword(Keyword::Def) {
            return if Self::looks_like_destructure(parser) {
                Self::parse_destructure_statement(parser, span)
            } else {
                Self::parse_def_statement(parser, span)
            };
        }
        if parser.match_keyword(Keyword::Ret) {
            return Self::parse_ret_statement(parser, span);
        }
        if parser.match_keyword(Keyword::If) {
            return Self::parse_if_statement(parser, span);
        }
        if parser.match_keyword(Keyword::Loop) {
            return Self::parse_loop_statement(parser, span);
        }
        if parser.match_keyword(Keyword::Match) {
            return Self::parse_match_statement(parser, span);
        }
        Self::parse_expr_or_assign_statement(parser, span)
    }

    fn parse_def_statement(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<Stmt, RaeError> {
        let name = parser.expect_identifier("identifier after 'def'")?;
        parser.expect_kind(&TokenKind::Colon, "':' after local name")?;
        let ty = Some(parser.parse_type_ref()?);
        let is_bind = Self::expect_assign_or_bind(parser)?;
        let value = ExpressionParser::parse_expression(parser)?;
        Ok(Stmt::new(
            StmtKind::Def { name, ty, value, is_bind },
            span,
        ))
    }

    /// `=` binds by copy/move (`is_bind = false`), `=>` binds by reference
    /// (`is_bind = true`) — the same distinction `def` and `assign` share.
    fn expect_assign_or_bind(parser: &mut Parser) -> Result<bool, RaeError> {
        if parser.match_kind(&TokenKind::Eq) {
            Ok(false)
        } else if parser.match_kind(&TokenKind::FatArrow) {
            Ok(true)
        } else {
            Err(parser.error_here("expected '=' or '=>'"))
        }
    }

    fn parse_ret_statement(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<Stmt, RaeError> {
        if parser.check(&TokenKind::RBrace) || parser.check_keyword(Keyword::Case) || parser.is_at_end() {
            return Ok(Stmt::new(StmtKind::Ret { values: Vec::new() }, span));
        }
        let mut values = Vec::new();
        loop {
            let label = if matches!(parser.peek().kind, TokenKind::Identifier(_))
                && matches!(parser.peek_at(1).kind, TokenKind::Colon)
            {
                let label = parser.expect_identifier("return label")?;
                parser.expect_kind(&TokenKind::Colon, "':' after return label")?;
                Some(label)
            } else {
                None
            };
            let value = ExpressionParser::parse_expression(parser)?;
            values.push(RetValue { label, value });
            if !parser.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Stmt::new(StmtKind::Ret { values }, span))
    }

    /// One token of unbounded lookahead over `def ident : ident (, def ...)*`
    /// followed by `,` + `def`, distinguishing a destructuring binding list
    /// from a plain `def name: Type = value`. Bails to `false` the moment
    /// the shape stops matching, the same way the grounded parser's own
    /// `looks_like_destructure` does.
    fn looks_like_destructure(parser: &Parser) -> bool {
        let mut i = 0usize;
        if !matches!(parser.peek_at(i).kind, TokenKind::Identifier(_)) {
            return false;
        }
        i += 1;
        if !matches!(parser.peek_at(i).kind, TokenKind::Colon) {
            return false;
        }
        i += 1;
        if !matches!(parser.peek_at(i).kind, TokenKind::Identifier(_)) {
            return false;
        }
        i += 1;
        loop {
            match parser.peek_at(i).kind {
                TokenKind::Comma => {
                    return matches!(parser.peek_at(i + 1).kind, TokenKind::Keyword(Keyword::Def));
                }
                TokenKind::Eq | TokenKind::FatArrow | TokenKind::Eof | TokenKind::RBrace => return false,
                _ => i += 1,
            }
        }
    }

    fn parse_destructure_statement(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<Stmt, RaeError> {
        let mut bindings = Vec::new();
        loop {
            let local_name = parser.expect_identifier("local name in destructuring binding")?;
            parser.expect_kind(&TokenKind::Colon, "':' after local name")?;
            let return_label = parser.expect_identifier("return label in destructuring binding")?;
            bindings.push(DestructureBinding {
                local_name,
                return_label: Some(return_label),
            });
            if parser.match_kind(&TokenKind::Comma) {
                parser.expect_keyword(Keyword::Def, "'def' before next destructuring binding")?;
                continue;
            }
            break;
        }
        if bindings.len() < 2 {
            return Err(parser.error_at(span, "destructuring assignments require at least two bindings"));
        }
        parser.expect_kind(&TokenKind::Eq, "'=' in destructuring assignment")?;
        let call = ExpressionParser::parse_expression(parser)?;
        if !Self::expr_is_call_like(&call) {
            return Err(parser.error_at(
                span,
                "destructuring assignments require a call expression on the right-hand side",
            ));
        }
        Ok(Stmt::new(StmtKind::Destructure { bindings, call }, span))
    }

    fn expr_is_call_like(expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Call { .. } => true,
            ExprKind::Unary { op, operand } if *op == crate::ast::nodes::UnaryOp::Spawn => {
                Self::expr_is_call_like(operand)
            }
            _ => false,
        }
    }

    fn parse_if_statement(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<Stmt, RaeError> {
        let cond = ExpressionParser::parse_expression(parser)?;
        let then_branch = Self::parse_block(parser)?;
        let else_branch = if parser.match_keyword(Keyword::Else) {
            Some(Self::parse_block(parser)?)
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If { cond, then_branch, else_branch },
            span,
        ))
    }

    /// Two surface forms share the `loop` keyword (§4.2): a range-for
    /// `loop i: int in a..b { body }`, and a conditional loop
    /// `loop cond { body }` that replaces the grounded reference's `while`.
    /// One token of lookahead (identifier immediately followed by `:`)
    /// distinguishes them, the same way `def`/destructure disambiguation
    /// works above.
    fn parse_loop_statement(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<Stmt, RaeError> {
        let looks_like_range = matches!(parser.peek().kind, TokenKind::Identifier(_))
            && matches!(parser.peek_at(1).kind, TokenKind::Colon);
        if looks_like_range {
            let variable = parser.expect_identifier("loop variable name")?;
            parser.expect_kind(&TokenKind::Colon, "':' after loop variable name")?;
            let _ty = parser.parse_type_ref()?;
            parser.expect_keyword(Keyword::In, "'in' after loop variable type")?;
            let start = ExpressionParser::parse_expression(parser)?;
            parser.expect_kind(&TokenKind::DotDot, "'..' in range loop")?;
            let end = ExpressionParser::parse_expression(parser)?;
            let body = Self::parse_block(parser)?;
            return Ok(Stmt::new(
                StmtKind::Loop {
                    variable: Some(variable),
                    range: Some((start, end)),
                    init: None,
                    cond: None,
                    step: None,
                    is_range: true,
                    body,
                },
                span,
            ));
        }

        let cond = ExpressionParser::parse_expression(parser)?;
        let body = Self::parse_block(parser)?;
        Ok(Stmt::new(
            StmtKind::Loop {
                variable: None,
                range: None,
                init: None,
                cond: Some(cond),
                step: None,
                is_range: false,
                body,
            },
            span,
        ))
    }

    fn parse_match_statement(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<Stmt, RaeError> {
        let subject = ExpressionParser::parse_expression(parser)?;
        parser.expect_kind(&TokenKind::LBrace, "'{' after match subject")?;
        let mut cases = Vec::new();
        let mut saw_default = false;
        while !parser.check(&TokenKind::RBrace) && !parser.is_at_end() {
            let pattern = if parser.match_keyword(Keyword::Case) {
                Some(ExpressionParser::parse_expression(parser)?)
            } else if parser.match_keyword(Keyword::Default) {
                if saw_default {
                    return Err(parser.error_here("match already has a default arm"));
                }
                saw_default = true;
                None
            } else {
                return Err(parser.error_here("expected 'case' or 'default' inside match"));
            };
            let body = Self::parse_block(parser)?;
            cases.push(MatchCase { pattern, body });
        }
        if cases.is_empty() {
            return Err(parser.error_here("match must have at least one case"));
        }
        parser.expect_kind(&TokenKind::RBrace, "'}' after match cases")?;
        Ok(Stmt::new(StmtKind::Match { subject, cases }, span))
    }

    /// Neither statement grammar has a dedicated `assign` production: an
    /// expression statement whose expression is assignable (a direct
    /// identifier or a member access) followed by `=`/`=>` is an
    /// assignment; anything else is a plain expression statement.
    fn parse_expr_or_assign_statement(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<Stmt, RaeError> {
        let expr = ExpressionParser::parse_expression(parser)?;
        let assignable = matches!(expr.kind, ExprKind::Ident(_) | ExprKind::Member { .. });
        if assignable && (parser.check(&TokenKind::Eq) || parser.check(&TokenKind::FatArrow)) {
            let is_bind = Self::expect_assign_or_bind(parser)?;
            let value = ExpressionParser::parse_expression(parser)?;
            return Ok(Stmt::new(
                StmtKind::Assign { target: expr, value, is_bind },
                span,
            ));
        }
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;

    fn parse_one(src: &str) -> Stmt {
        let (tokens, _) = tokenize("t.rae", src).unwrap();
        let mut p = Parser::new("t.rae", tokens);
        StatementParser::parse_statement(&mut p).unwrap()
    }

    #[test]
    fn parses_def_with_copy_bind() {
        let stmt = parse_one("def x: int = 1");
        match stmt.kind {
            StmtKind::Def { name, is_bind, .. } => {
                assert_eq!(name, "x");
                assert!(!is_bind);
            }
            _ => panic!("expected def"),
        }
    }

    #[test]
    fn parses_def_with_move_bind() {
        let stmt = parse_one("def x: int => y");
        match stmt.kind {
            StmtKind::Def { is_bind, .. } => assert!(is_bind),
            _ => panic!("expected def"),
        }
    }

    #[test]
    fn parses_destructure_with_two_bindings() {
        let stmt = parse_one("def a: First, def b: Second = f()");
        match stmt.kind {
            StmtKind::Destructure { bindings, .. } => assert_eq!(bindings.len(), 2),
            _ => panic!("expected destructure"),
        }
    }

    #[test]
    fn destructure_rejects_non_call_rhs() {
        let (tokens, _) = tokenize("t.rae", "def a: First, def b: Second = 1").unwrap();
        let mut p = Parser::new("t.rae", tokens);
        assert!(StatementParser::parse_statement(&mut p).is_err());
    }

    #[test]
    fn parses_ret_with_labeled_values() {
        let stmt = parse_one("ret result: 1, 2");
        match stmt.kind {
            StmtKind::Ret { values } => {
                assert_eq!(values.len(), 2);
                assert_eq!(values[0].label.as_deref(), Some("result"));
                assert!(values[1].label.is_none());
            }
            _ => panic!("expected ret"),
        }
    }

    #[test]
    fn parses_if_else() {
        let stmt = parse_one("if true { ret 1 } else { ret 2 }");
        match stmt.kind {
            StmtKind::If { else_branch, .. } => assert!(else_branch.is_some()),
            _ => panic!("expected if"),
        }
    }

    #[test]
    fn parses_range_loop() {
        let stmt = parse_one("loop i: int in 0..3 { ret i }");
        match stmt.kind {
            StmtKind::Loop { is_range, variable, range, .. } => {
                assert!(is_range);
                assert_eq!(variable.as_deref(), Some("i"));
                assert!(range.is_some());
            }
            _ => panic!("expected loop"),
        }
    }

    #[test]
    fn parses_conditional_loop() {
        let stmt = parse_one("loop running { ret 1 }");
        match stmt.kind {
            StmtKind::Loop { is_range, cond, .. } => {
                assert!(!is_range);
                assert!(cond.is_some());
            }
            _ => panic!("expected loop"),
        }
    }

    #[test]
    fn parses_match_statement_with_default() {
        let stmt = parse_one("match x { case 1 { ret 1 } default { ret 0 } }");
        match stmt.kind {
            StmtKind::Match { cases, .. } => assert_eq!(cases.len(), 2),
            _ => panic!("expected match"),
        }
    }

    #[test]
    fn match_statement_rejects_two_defaults() {
        let (tokens, _) = tokenize("t.rae", "match x { default { ret 0 } default { ret 1 } }").unwrap();
        let mut p = Parser::new("t.rae", tokens);
        assert!(StatementParser::parse_statement(&mut p).is_err());
    }

    #[test]
    fn assign_statement_distinguished_from_expr_statement() {
        let stmt = parse_one("x = 1");
        assert!(matches!(stmt.kind, StmtKind::Assign { .. }));

        let stmt = parse_one("f()");
        assert!(matches!(stmt.kind, StmtKind::Expr(_)));
    }

    #[test]
    fn member_assign_is_recognized() {
        let stmt = parse_one("obj.field = 1");
        assert!(matches!(stmt.kind, StmtKind::Assign { .. }));
    }
}
