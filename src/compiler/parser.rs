//! Syntactic analysis: converts a token stream into a [`Module`] (§3, §4.2).
//!
//! Sub-modules hold the actual recursive-descent logic; this file is the
//! thin orchestration layer that walks imports, then declarations, the
//! same split the grounded reference parser uses between its
//! `parse_module`/`parse_declaration` top level and its statement/
//! expression helpers.

pub mod common;
pub mod expression_parser;
pub mod statement_parser;

use common::Parser;
use statement_parser::StatementParser;

use crate::ast::nodes::{
    Declaration, EnumDecl, EnumVariant, FieldDecl, FunctionDecl, FunctionProperty, ImportClause,
    Module, Param, ReturnItem, TypeDecl, Visibility,
};
use crate::compiler::error::RaeError;
use crate::compiler::lexer::{tokenize, Keyword, Token, TokenKind};

/// Tokenizes and parses one source file into a [`Module`].
pub fn parse_file(file: &str, source: &str) -> Result<Module, RaeError> {
    let (tokens, _comments) = tokenize(file, source)?;
    parse(file, tokens)
}

pub fn parse(file: &str, tokens: Vec<Token>) -> Result<Module, RaeError> {
    let mut parser = Parser::new(file, tokens);
    let imports = parse_imports(&mut parser)?;
    let mut declarations = Vec::new();
    while !parser.is_at_end() {
        declarations.push(parse_declaration(&mut parser)?);
    }
    Ok(Module { imports, declarations })
}

fn parse_imports(parser: &mut Parser) -> Result<Vec<ImportClause>, RaeError> {
    let mut imports = Vec::new();
    loop {
        let span = parser.span();
        let is_export = if parser.match_keyword(Keyword::Import) {
            false
        } else if parser.match_keyword(Keyword::Export) {
            true
        } else {
            break;
        };
        let path = parse_string_literal(parser, "module path")?;
        imports.push(ImportClause { path, is_export, span });
    }
    Ok(imports)
}

fn parse_string_literal(parser: &mut Parser, what: &str) -> Result<String, RaeError> {
    match parser.peek().kind.clone() {
        TokenKind::Str(s) => {
            parser.advance();
            Ok(s)
        }
        _ => Err(parser.error_here(format!("expected string literal for {what}"))),
    }
}

fn parse_declaration(parser: &mut Parser) -> Result<Declaration, RaeError> {
    let span = parser.span();
    let saw_extern = parser.match_keyword(Keyword::Extern);
    if parser.match_keyword(Keyword::Type) {
        if saw_extern {
            return Err(parser.error_at(span, "'extern' is only valid before 'func'"));
        }
        return Ok(Declaration::Type(parse_type_declaration(parser, span)?));
    }
    if parser.match_keyword(Keyword::Enum) {
        if saw_extern {
            return Err(parser.error_at(span, "'extern' is only valid before 'func'"));
        }
        return Ok(Declaration::Enum(parse_enum_declaration(parser, span)?));
    }
    if parser.match_keyword(Keyword::Func) {
        return Ok(Declaration::Function(parse_func_declaration(parser, span, saw_extern)?));
    }
    if saw_extern {
        return Err(parser.error_at(span, "'extern' must be followed by 'func'"));
    }
    Err(parser.error_at(span, "expected 'type', 'enum', or 'func'"))
}

/// `[G1, G2, ...]`, used by both type and function declarations.
fn parse_generic_params(parser: &mut Parser) -> Result<Vec<String>, RaeError> {
    if !parser.match_kind(&TokenKind::LBracket) {
        return Ok(Vec::new());
    }
    let mut generics = Vec::new();
    loop {
        generics.push(parser.expect_identifier("generic parameter name")?);
        if !parser.match_kind(&TokenKind::Comma) {
            break;
        }
    }
    parser.expect_kind(&TokenKind::RBracket, "']' after generic parameters")?;
    Ok(generics)
}

/// `pub`/`priv` repeated; used both for a type's header properties and a
/// function's properties (which additionally allow `spawn`).
fn parse_visibility_properties(parser: &mut Parser) -> Visibility {
    let mut visibility = Visibility::Default;
    loop {
        if parser.match_keyword(Keyword::Pub) {
            visibility = Visibility::Pub;
        } else if parser.match_keyword(Keyword::Priv) {
            visibility = Visibility::Priv;
        } else {
            break;
        }
    }
    visibility
}

/// `type Name[G1, G2]? (: pub|priv...)? { field: TypeRef ... }`. The
/// grounded reference has no per-field visibility syntax — only a
/// type-level `pub`/`priv` property list — so that single visibility is
/// applied uniformly to every field (§ DESIGN.md).
fn parse_type_declaration(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<TypeDecl, RaeError> {
    let name = parser.expect_identifier("type name")?;
    let generics = parse_generic_params(parser)?;
    let visibility = if parser.match_kind(&TokenKind::Colon) {
        parse_visibility_properties(parser)
    } else {
        Visibility::Default
    };
    parser.expect_kind(&TokenKind::LBrace, "'{' to start type body")?;
    let mut fields = Vec::new();
    while !parser.check(&TokenKind::RBrace) && !parser.is_at_end() {
        let field_name = parser.expect_identifier("field name")?;
        parser.expect_kind(&TokenKind::Colon, "':' after field name")?;
        let ty = parser.parse_type_ref()?;
        fields.push(FieldDecl { name: field_name, ty, visibility });
    }
    parser.expect_kind(&TokenKind::RBrace, "'}' after type body")?;
    Ok(TypeDecl { name, generics, fields, span })
}

/// `enum Name { Variant, Variant(Type1, Type2), ... }`. Not present in the
/// grounded reference parser at all (its `ast.h` has no enum-declaration
/// node) but required verbatim by this language's declaration grammar, so
/// the body grammar here is modeled on `parse_type_fields`'s comma-free
/// brace-delimited style with an added optional tuple payload.
fn parse_enum_declaration(parser: &mut Parser, span: crate::ast::nodes::Span) -> Result<EnumDecl, RaeError> {
    let name = parser.expect_identifier("enum name")?;
    parser.expect_kind(&TokenKind::LBrace, "'{' to start enum body")?;
    let mut variants = Vec::new();
    while !parser.check(&TokenKind::RBrace) && !parser.is_at_end() {
        let variant_name = parser.expect_identifier("enum variant name")?;
        let mut payload = Vec::new();
        if parser.match_kind(&TokenKind::LParen) {
            if !parser.check(&TokenKind::RParen) {
                loop {
                    payload.push(parser.parse_type_ref()?);
                    if !parser.match_kind(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            parser.expect_kind(&TokenKind::RParen, "')' after enum variant payload")?;
        }
        variants.push(EnumVariant { name: variant_name, payload });
        if !parser.match_kind(&TokenKind::Comma) {
            break;
        }
    }
    parser.expect_kind(&TokenKind::RBrace, "'}' after enum body")?;
    if variants.is_empty() {
        return Err(parser.error_at(span, "enum must declare at least one variant"));
    }
    Ok(EnumDecl { name, variants, span })
}

fn parse_param_list(parser: &mut Parser) -> Result<Vec<Param>, RaeError> {
    parser.expect_kind(&TokenKind::LParen, "'(' after function name")?;
    if parser.match_kind(&TokenKind::RParen) {
        return Ok(Vec::new());
    }
    let mut params = Vec::new();
    loop {
        let name = parser.expect_identifier("parameter name")?;
        parser.expect_kind(&TokenKind::Colon, "':' after parameter name")?;
        let ty = parser.parse_type_ref()?;
        params.push(Param { name, ty });
        if parser.match_kind(&TokenKind::RParen) {
            break;
        }
        parser.expect_kind(&TokenKind::Comma, "',' between parameters")?;
    }
    Ok(params)
}

fn parse_return_clause(parser: &mut Parser) -> Result<Vec<ReturnItem>, RaeError> {
    let mut items = Vec::new();
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
        let ty = parser.parse_type_ref()?;
        items.push(ReturnItem { label, ty });
        if !parser.match_kind(&TokenKind::Comma) {
            break;
        }
    }
    Ok(items)
}

/// `(extern)? func name[G]? (params): (pub|priv|spawn)* (ret TypeRef...)? { body }`
/// An `extern` function has no body and no ownership-incompatible return
/// types are checked downstream, not here (§ arity-only semantic pass).
fn parse_func_declaration(
    parser: &mut Parser,
    span: crate::ast::nodes::Span,
    is_extern: bool,
) -> Result<FunctionDecl, RaeError> {
    let name = parser.expect_identifier("function name")?;
    let generics = parse_generic_params(parser)?;
    let params = parse_param_list(parser)?;

    let mut properties = Vec::new();
    let mut returns = Vec::new();
    if parser.match_kind(&TokenKind::Colon) {
        loop {
            let prop = if parser.match_keyword(Keyword::Pub) {
                FunctionProperty::Pub
            } else if parser.match_keyword(Keyword::Priv) {
                FunctionProperty::Priv
            } else if parser.match_keyword(Keyword::Spawn) {
                FunctionProperty::Spawn
            } else {
                break;
            };
            properties.push(prop);
        }
        if parser.match_keyword(Keyword::Ret) {
            returns = parse_return_clause(parser)?;
        }
    }

    if is_extern {
        if parser.check(&TokenKind::LBrace) {
            return Err(parser.error_here("extern functions cannot have a body"));
        }
        return Ok(FunctionDecl {
            name,
            is_extern,
            generics,
            params,
            returns,
            properties,
            body: None,
            span,
        });
    }

    let body = Some(StatementParser::parse_block(parser)?);
    Ok(FunctionDecl {
        name,
        is_extern,
        generics,
        params,
        returns,
        properties,
        body,
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::nodes::StmtKind;

    #[test]
    fn parses_imports_then_declarations() {
        let module = parse_file(
            "t.rae",
            r#"
            import "std/io"
            export "./widgets"

            func main(): ret int {
                ret 0
            }
            "#,
        )
        .unwrap();
        assert_eq!(module.imports.len(), 2);
        assert!(!module.imports[0].is_export);
        assert_eq!(module.imports[0].path, "std/io");
        assert!(module.imports[1].is_export);
        assert_eq!(module.declarations.len(), 1);
    }

    #[test]
    fn parses_type_declaration_with_generics_and_visibility() {
        let module = parse_file(
            "t.rae",
            r#"
            type Box[T]: pub {
                value: T
            }
            "#,
        )
        .unwrap();
        match &module.declarations[0] {
            Declaration::Type(decl) => {
                assert_eq!(decl.name, "Box");
                assert_eq!(decl.generics, vec!["T".to_string()]);
                assert_eq!(decl.fields.len(), 1);
                assert_eq!(decl.fields[0].visibility, Visibility::Pub);
            }
            _ => panic!("expected type declaration"),
        }
    }

    #[test]
    fn parses_enum_with_tuple_payload() {
        let module = parse_file(
            "t.rae",
            r#"
            enum Shape {
                Circle(int),
                Rect(int, int),
                Empty
            }
            "#,
        )
        .unwrap();
        match &module.declarations[0] {
            Declaration::Enum(decl) => {
                assert_eq!(decl.variants.len(), 3);
                assert_eq!(decl.variants[0].payload.len(), 1);
                assert_eq!(decl.variants[1].payload.len(), 2);
                assert!(decl.variants[2].payload.is_empty());
            }
            _ => panic!("expected enum declaration"),
        }
    }

    #[test]
    fn extern_func_has_no_body() {
        let module = parse_file("t.rae", "extern func native_sqrt(x: float): ret float").unwrap();
        match &module.declarations[0] {
            Declaration::Function(decl) => {
                assert!(decl.is_extern);
                assert!(decl.body.is_none());
                assert_eq!(decl.returns.len(), 1);
            }
            _ => panic!("expected function declaration"),
        }
    }

    #[test]
    fn extern_func_with_body_is_rejected() {
        let err = parse_file("t.rae", "extern func f() { ret 0 }").unwrap_err();
        assert!(err.to_string().contains("cannot have a body"));
    }

    #[test]
    fn function_body_parses_ordinary_statements() {
        let module = parse_file("t.rae", "func f() { def x: int = 1 ret x }").unwrap();
        match &module.declarations[0] {
            Declaration::Function(decl) => {
                let body = decl.body.as_ref().unwrap();
                assert_eq!(body.len(), 2);
                assert!(matches!(body[0].kind, StmtKind::Def { .. }));
                assert!(matches!(body[1].kind, StmtKind::Ret { .. }));
            }
            _ => panic!("expected function declaration"),
        }
    }
}
