//! Shared parser state: token cursor, lookahead, and the small set of
//! primitives every other parsing module is built from.
//!
//! The teacher's `parser.rs` declares `pub mod common;` but the module
//! itself was never checked in; this file fills that gap the way the
//! declaration implies it should look, matching the cursor-over-a-token-
//! vector shape `statement_parser.rs`/`expression_parser.rs` already
//! assume (`peek`, `advance`, `check`, `is_at_end`).

use crate::ast::nodes::Span;
use crate::ast::types::{AstTypeRef, TypeModifiers};
use crate::compiler::error::RaeError;
use crate::compiler::lexer::{Keyword, Token, TokenKind};

/// Recursive-descent cursor over one file's token stream.
pub struct Parser<'a> {
    file: String,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(file: impl Into<String>, tokens: Vec<Token<'a>>) -> Self {
        Self {
            file: file.into(),
            tokens,
            pos: 0,
        }
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub fn peek(&self) -> &Token<'a> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_at(&self, offset: usize) -> &Token<'a> {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn span(&self) -> Span {
        let t = self.peek();
        Span::new(t.line, t.col)
    }

    pub fn advance(&mut self) -> &Token<'a> {
        let at_end = self.is_at_end();
        let idx = self.pos;
        if !at_end {
            self.pos += 1;
        }
        &self.tokens[idx.min(self.tokens.len() - 1)]
    }

    pub fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek().kind, TokenKind::Keyword(k) if k == kw)
    }

    pub fn match_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_kind(&mut self, kind: &TokenKind, what: &str) -> Result<&Token<'a>, RaeError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let span = self.span();
            Err(self.error_at(span, format!("expected {what}, found {:?}", self.peek().kind)))
        }
    }

    pub fn expect_keyword(&mut self, kw: Keyword, what: &str) -> Result<(), RaeError> {
        if self.match_keyword(kw) {
            Ok(())
        } else {
            let span = self.span();
            Err(self.error_at(span, format!("expected {what}")))
        }
    }

    /// Consumes an identifier token and returns its text as an owned
    /// `String` — the arena backing the token is dropped at the end of
    /// compilation, so anything surviving into the AST must be copied out
    /// at this boundary.
    pub fn expect_identifier(&mut self, what: &str) -> Result<String, RaeError> {
        match self.peek().kind {
            TokenKind::Identifier(text) => {
                let owned = text.to_string();
                self.advance();
                Ok(owned)
            }
            _ => {
                let span = self.span();
                Err(self.error_at(span, format!("expected {what}, found {:?}", self.peek().kind)))
            }
        }
    }

    /// `view|mod|opt|id|key`* (in any combination/order) followed by a
    /// dotted identifier path and an optional `[T, U, ...]` generic
    /// argument list. At least one modifier keyword or a base identifier
    /// must be present.
    pub fn parse_type_ref(&mut self) -> Result<AstTypeRef, RaeError> {
        let mut modifiers = TypeModifiers::default();
        loop {
            let matched = match self.peek().kind {
                TokenKind::Keyword(Keyword::View) => {
                    modifiers.is_view = true;
                    true
                }
                TokenKind::Keyword(Keyword::Mod) => {
                    modifiers.is_mod = true;
                    true
                }
                TokenKind::Keyword(Keyword::Opt) => {
                    modifiers.is_opt = true;
                    true
                }
                TokenKind::Keyword(Keyword::Id) => {
                    modifiers.is_id = true;
                    true
                }
                TokenKind::Keyword(Keyword::Key) => {
                    modifiers.is_key = true;
                    true
                }
                _ => false,
            };
            if matched {
                self.advance();
            } else {
                break;
            }
        }

        let mut path = vec![self.expect_identifier("type name")?];
        while self.match_kind(&TokenKind::Dot) {
            path.push(self.expect_identifier("type path segment")?);
        }

        let mut generic_args = Vec::new();
        if self.match_kind(&TokenKind::LBracket) {
            loop {
                generic_args.push(self.parse_type_ref()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect_kind(&TokenKind::RBracket, "']' after generic type arguments")?;
        }

        Ok(AstTypeRef {
            modifiers,
            path,
            generic_args,
        })
    }

    pub fn error_at(&self, span: Span, message: impl Into<String>) -> RaeError {
        RaeError::parser(self.file.clone(), span.line, span.col, message)
    }

    pub fn error_here(&self, message: impl Into<String>) -> RaeError {
        self.error_at(self.span(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;

    #[test]
    fn advances_through_tokens_and_detects_eof() {
        let (tokens, _) = tokenize("t.rae", "func main").unwrap();
        let mut p = Parser::new("t.rae", tokens);
        assert!(p.check_keyword(Keyword::Func));
        p.advance();
        assert!(matches!(p.peek().kind, TokenKind::Identifier("main")));
        p.advance();
        assert!(p.is_at_end());
    }

    #[test]
    fn expect_identifier_copies_lexeme_into_owned_string() {
        let (tokens, _) = tokenize("t.rae", "widget").unwrap();
        let mut p = Parser::new("t.rae", tokens);
        let name = p.expect_identifier("a name").unwrap();
        assert_eq!(name, "widget");
    }

    #[test]
    fn parses_modifiers_and_generic_type_arguments() {
        let (tokens, _) = tokenize("t.rae", "view opt Foo[Bar, mod Baz]").unwrap();
        let mut p = Parser::new("t.rae", tokens);
        let ty = p.parse_type_ref().unwrap();
        assert!(ty.modifiers.is_view && ty.modifiers.is_opt);
        assert_eq!(ty.path, vec!["Foo".to_string()]);
        assert_eq!(ty.generic_args.len(), 2);
        assert_eq!(ty.generic_args[0].path, vec!["Bar".to_string()]);
        assert!(ty.generic_args[1].modifiers.is_mod);
    }
}
