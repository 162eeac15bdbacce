//! Expression parsing: Pratt-style precedence climbing (§4.2).
//!
//! Precedence, lowest to highest: `or`, `and`, `is`, comparisons
//! (`< <= > >=`), `+ -`, `* / %`, unary (`- not spawn`), postfix
//! (call, member, method call). `==`/`!=` and `[`/`]` lex (§4.1) but bind
//! to no production: this grammar has one equality operator (`is`) and no
//! indexing or collection-literal syntax, matching the distilled
//! reference's own parser.

use super::common::Parser;
use crate::ast::nodes::{Arg, BinaryOp, Expr, ExprKind, MatchArm, Span, StringSegment, UnaryOp};
use crate::compiler::error::RaeError;
use crate::compiler::lexer::{Keyword, TokenKind};

/// A static utility struct, mirroring the teacher's dedicated parser
/// helper types rather than free functions.
pub struct ExpressionParser;

impl ExpressionParser {
    pub fn parse_expression(parser: &mut Parser) -> Result<Expr, RaeError> {
        Self::parse_binary(parser, 0)
    }

    fn binary_info(kind: &TokenKind) -> Option<(u8, BinaryOp)> {
        match kind {
            TokenKind::Plus => Some((4, BinaryOp::Add)),
            TokenKind::Minus => Some((4, BinaryOp::Sub)),
            TokenKind::Star => Some((5, BinaryOp::Mul)),
            TokenKind::Slash => Some((5, BinaryOp::Div)),
            TokenKind::Percent => Some((5, BinaryOp::Mod)),
            TokenKind::Lt => Some((3, BinaryOp::Lt)),
            TokenKind::Gt => Some((3, BinaryOp::Gt)),
            TokenKind::Le => Some((3, BinaryOp::Le)),
            TokenKind::Ge => Some((3, BinaryOp::Ge)),
            TokenKind::Keyword(Keyword::Is) => Some((2, BinaryOp::Is)),
            TokenKind::Keyword(Keyword::And) => Some((1, BinaryOp::And)),
            TokenKind::Keyword(Keyword::Or) => Some((0, BinaryOp::Or)),
            _ => None,
        }
    }

    /// Precedence-climbing loop: at each step we only recurse into a
    /// tighter-binding right-hand side, which gives left-associativity for
    /// same-precedence chains like `a + b + c` for free.
    fn parse_binary(parser: &mut Parser, min_prec: u8) -> Result<Expr, RaeError> {
        let mut left = Self::parse_unary(parser)?;
        loop {
            let Some((prec, op)) = Self::binary_info(&parser.peek().kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            let span = parser.span();
            parser.advance();
            let right = Self::parse_binary(parser, prec + 1)?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(parser: &mut Parser) -> Result<Expr, RaeError> {
        let span = parser.span();
        let op = match parser.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
            TokenKind::Keyword(Keyword::Spawn) => Some(UnaryOp::Spawn),
            _ => None,
        };
        if let Some(op) = op {
            parser.advance();
            let operand = Self::parse_unary(parser)?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        Self::parse_postfix(parser)
    }

    fn parse_postfix(parser: &mut Parser) -> Result<Expr, RaeError> {
        let mut expr = Self::parse_primary(parser)?;
        loop {
            if parser.match_kind(&TokenKind::LParen) {
                let span = expr.span;
                expr = Self::finish_call(parser, expr, span)?;
                continue;
            }
            if parser.match_kind(&TokenKind::Dot) {
                let span = parser.span();
                let name = parser.expect_identifier("member name after '.'")?;
                if parser.match_kind(&TokenKind::LParen) {
                    let args = Self::parse_call_args(parser, None)?;
                    expr = Expr::new(
                        ExprKind::MethodCall {
                            object: Box::new(expr),
                            method: name,
                            args,
                        },
                        span,
                    );
                } else {
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            name,
                        },
                        span,
                    );
                }
                continue;
            }
            break;
        }
        Ok(expr)
    }

    /// `log`/`logS` accept one unnamed positional argument (§4.2); every
    /// other call requires `name: value` arguments.
    fn callee_allows_shorthand(callee: &Expr) -> bool {
        matches!(&callee.kind, ExprKind::Ident(name) if name == "log" || name == "logS")
    }

    fn finish_call(parser: &mut Parser, callee: Expr, span: Span) -> Result<Expr, RaeError> {
        let shorthand_allowed = Self::callee_allows_shorthand(&callee);
        let args = Self::parse_call_args(parser, shorthand_allowed.then_some("value"))?;
        Ok(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// Assumes the opening `(` has already been consumed. `shorthand_name`,
    /// when present, lets exactly one leading unnamed argument through
    /// (synthetically labeled) before falling back to requiring `name:`.
    fn parse_call_args(parser: &mut Parser, shorthand_name: Option<&str>) -> Result<Vec<Arg>, RaeError> {
        if parser.match_kind(&TokenKind::RParen) {
            return Ok(Vec::new());
        }
        let mut args = Vec::new();
        let mut used_shorthand = false;
        loop {
            let is_named = matches!(parser.peek().kind, TokenKind::Identifier(_))
                && matches!(parser.peek_at(1).kind, TokenKind::Colon);
            if is_named {
                let name = parser.expect_identifier("argument name")?;
                parser.expect_kind(&TokenKind::Colon, "':' after argument name")?;
                let value = Self::parse_expression(parser)?;
                args.push(Arg { name: Some(name), value });
            } else if let Some(shorthand) = shorthand_name.filter(|_| !used_shorthand) {
                used_shorthand = true;
                let value = Self::parse_expression(parser)?;
                args.push(Arg {
                    name: Some(shorthand.to_string()),
                    value,
                });
            } else {
                return Err(parser.error_here("expected argument name"));
            }
            if !parser.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        parser.expect_kind(&TokenKind::RParen, "')' after arguments")?;
        Ok(args)
    }

    /// `(field: expr, ...)` object literal vs `(expr)` grouping,
    /// disambiguated by one token of lookahead for `ident :` (§4.2).
    /// Assumes the opening `(` has already been consumed.
    fn parse_group_or_object(parser: &mut Parser, open_span: Span) -> Result<Expr, RaeError> {
        if parser.check(&TokenKind::RParen) {
            return Err(parser.error_here("unexpected ')'"));
        }
        let looks_like_object = matches!(parser.peek().kind, TokenKind::Identifier(_))
            && matches!(parser.peek_at(1).kind, TokenKind::Colon);
        if looks_like_object {
            return Self::parse_object_literal(parser, open_span);
        }
        let inner = Self::parse_expression(parser)?;
        parser.expect_kind(&TokenKind::RParen, "')' after expression")?;
        Ok(inner)
    }

    fn parse_object_literal(parser: &mut Parser, span: Span) -> Result<Expr, RaeError> {
        let mut fields = Vec::new();
        loop {
            let name = parser.expect_identifier("field name in object literal")?;
            parser.expect_kind(&TokenKind::Colon, "':' after field name")?;
            let value = Self::parse_expression(parser)?;
            fields.push((name, value));
            if !parser.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        parser.expect_kind(&TokenKind::RParen, "')' after object literal")?;
        Ok(Expr::new(ExprKind::Object { ty: None, fields }, span))
    }

    /// `match <expr> { (case <expr> | default) => <expr> ... }`. At most
    /// one `default` arm, enforced the same way the statement form does.
    fn parse_match_expression(parser: &mut Parser, span: Span) -> Result<Expr, RaeError> {
        let subject = Self::parse_expression(parser)?;
        parser.expect_kind(&TokenKind::LBrace, "'{' after match subject")?;
        let mut arms = Vec::new();
        let mut saw_default = false;
        while !parser.check(&TokenKind::RBrace) && !parser.is_at_end() {
            let pattern = if parser.match_keyword(Keyword::Default) {
                if saw_default {
                    return Err(parser.error_here("match already has a default arm"));
                }
                saw_default = true;
                None
            } else if parser.match_keyword(Keyword::Case) {
                Some(Self::parse_expression(parser)?)
            } else {
                return Err(parser.error_here("expected 'case' or 'default' in match expression"));
            };
            parser.expect_kind(&TokenKind::FatArrow, "'=>' after match pattern")?;
            let value = Self::parse_expression(parser)?;
            arms.push(MatchArm { pattern, value });
        }
        parser.expect_kind(&TokenKind::RBrace, "'}' after match expression")?;
        Ok(Expr::new(
            ExprKind::Match {
                subject: Box::new(subject),
                arms,
            },
            span,
        ))
    }

    fn parse_primary(parser: &mut Parser) -> Result<Expr, RaeError> {
        let span = parser.span();
        let kind = parser.peek().kind.clone();
        match kind {
            TokenKind::Identifier(name) => {
                parser.advance();
                Ok(Expr::new(ExprKind::Ident(name.to_string()), span))
            }
            TokenKind::Integer(v) => {
                parser.advance();
                Ok(Expr::new(ExprKind::Integer(v), span))
            }
            TokenKind::Float(v) => {
                parser.advance();
                Ok(Expr::new(ExprKind::Float(v), span))
            }
            TokenKind::Str(s) => {
                parser.advance();
                Ok(Expr::new(ExprKind::Str(s), span))
            }
            TokenKind::Char(c) => {
                parser.advance();
                Ok(Expr::new(ExprKind::Char(c), span))
            }
            TokenKind::StringStart(_) => Self::parse_interpolated_string(parser, span),
            TokenKind::Keyword(Keyword::True) => {
                parser.advance();
                Ok(Expr::new(ExprKind::Bool(true), span))
            }
            TokenKind::Keyword(Keyword::False) => {
                parser.advance();
                Ok(Expr::new(ExprKind::Bool(false), span))
            }
            TokenKind::Keyword(Keyword::None) => {
                parser.advance();
                Ok(Expr::new(ExprKind::None, span))
            }
            TokenKind::LParen => {
                parser.advance();
                Self::parse_group_or_object(parser, span)
            }
            TokenKind::Keyword(Keyword::Match) => {
                parser.advance();
                Self::parse_match_expression(parser, span)
            }
            other => Err(parser.error_at(span, format!("expected expression, found {other:?}"))),
        }
    }

    /// A string literal opened by `StringStart` alternates literal
    /// segments with embedded-expression tokens until `StringEnd`.
    fn parse_interpolated_string(parser: &mut Parser, span: Span) -> Result<Expr, RaeError> {
        let mut segments = Vec::new();
        let TokenKind::StringStart(first) = parser.advance().kind.clone() else {
            unreachable!("caller checked StringStart");
        };
        if !first.is_empty() {
            segments.push(StringSegment::Literal(first));
        }
        loop {
            let inner = Self::parse_expression(parser)?;
            segments.push(StringSegment::Expr(Box::new(inner)));
            match parser.peek().kind.clone() {
                TokenKind::StringMid(text) => {
                    parser.advance();
                    if !text.is_empty() {
                        segments.push(StringSegment::Literal(text));
                    }
                }
                TokenKind::StringEnd(text) => {
                    parser.advance();
                    if !text.is_empty() {
                        segments.push(StringSegment::Literal(text));
                    }
                    break;
                }
                _ => return Err(parser.error_here("malformed interpolated string")),
            }
        }
        Ok(Expr::new(ExprKind::InterpolatedStr(segments), span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;

    fn parse(src: &str) -> Expr {
        let (tokens, _) = tokenize("t.rae", src).unwrap();
        let mut p = Parser::new("t.rae", tokens);
        ExpressionParser::parse_expression(&mut p).unwrap()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse("1 + 2 * 3");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
            }
            _ => panic!("expected top-level add"),
        }
    }

    #[test]
    fn addition_is_left_associative() {
        let expr = parse("1 + 2 + 3");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Add, lhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
            }
            _ => panic!("expected top-level add"),
        }
    }

    #[test]
    fn object_literal_disambiguated_from_grouping() {
        let expr = parse("(x: 1, y: 2)");
        assert!(matches!(expr.kind, ExprKind::Object { .. }));

        let expr = parse("(1 + 2)");
        assert!(matches!(expr.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn dotted_call_becomes_method_call_not_member_of_call() {
        let expr = parse("obj.method(x: 1)");
        assert!(matches!(expr.kind, ExprKind::MethodCall { .. }));
    }

    #[test]
    fn log_call_accepts_unnamed_shorthand_argument() {
        let expr = parse(r#"log("hi")"#);
        match expr.kind {
            ExprKind::Call { args, .. } => {
                assert_eq!(args.len(), 1);
                assert_eq!(args[0].name.as_deref(), Some("value"));
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn ordinary_call_requires_named_arguments() {
        let (tokens, _) = tokenize("t.rae", "f(1)").unwrap();
        let mut p = Parser::new("t.rae", tokens);
        assert!(ExpressionParser::parse_expression(&mut p).is_err());
    }

    #[test]
    fn interpolated_string_alternates_literal_and_expr_segments() {
        let expr = parse(r#""a={x}b""#);
        match expr.kind {
            ExprKind::InterpolatedStr(segments) => {
                assert_eq!(segments.len(), 3);
                assert!(matches!(segments[0], StringSegment::Literal(_)));
                assert!(matches!(segments[1], StringSegment::Expr(_)));
                assert!(matches!(segments[2], StringSegment::Literal(_)));
            }
            _ => panic!("expected interpolated string"),
        }
    }

    #[test]
    fn is_operator_binds_looser_than_comparisons() {
        let expr = parse("a < b is true");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Is, lhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinaryOp::Lt, .. }));
            }
            _ => panic!("expected top-level is"),
        }
    }
}
