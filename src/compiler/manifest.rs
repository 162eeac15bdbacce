//! Package-manifest (`*.raepack`) parser (§6 file formats).
//!
//! A small hand-rolled scanner in the same style as the hand-scanned parts
//! of `lexer.rs` (interpolated strings, block comments): this grammar is
//! its own tiny DSL, not JSON, so `logos` buys nothing here and `serde`
//! only comes in at the end, decorating the parsed result for any caller
//! that wants to dump it. No teacher precedent — `fkkarakurt-nebc` has no
//! package-manifest concept at all — so this follows §6's grammar
//! description directly: `pack <Name> { format "raepack" version <int>
//! defaultTarget <ident> targets { target <id>: { label: "…", entry:
//! "<path>", sources: { source { path: "…", emit: live|compiled|hybrid } } } } }`.

use crate::compiler::error::RaeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum EmitMode {
    Live,
    Compiled,
    Hybrid,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SourceEntry {
    pub path: String,
    pub emit: EmitMode,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TargetEntry {
    pub id: String,
    pub label: String,
    pub entry: String,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: u64,
    pub default_target: String,
    pub targets: Vec<TargetEntry>,
}

impl PackageManifest {
    /// The `TargetEntry` named by `defaultTarget`, if `targets` actually
    /// contains it (the grammar does not itself enforce that it must).
    pub fn default_target_entry(&self) -> Option<&TargetEntry> {
        self.targets.iter().find(|t| t.id == self.default_target)
    }
}

/// Tiny cursor over the manifest text; no line/column tracking since
/// manifest diagnostics are reported against the whole file, not a span.
struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    file: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(file: &'a str, text: &str) -> Self {
        Self { chars: text.chars().collect(), pos: 0, file }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some(',') => {
                    self.advance();
                }
                Some('/') if self.chars.get(self.pos + 1) == Some(&'/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn err(&self, message: impl Into<String>) -> RaeError {
        RaeError::compile(self.file, 0, self.pos, message)
    }

    fn expect_char(&mut self, expected: char) -> Result<(), RaeError> {
        self.skip_ws_and_comments();
        match self.advance() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.err(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.err(format!("expected '{expected}', found end of input"))),
        }
    }

    fn ident(&mut self) -> Result<String, RaeError> {
        self.skip_ws_and_comments();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        if self.pos == start {
            return Err(self.err("expected an identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn integer(&mut self) -> Result<u64, RaeError> {
        self.skip_ws_and_comments();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == start {
            return Err(self.err("expected an integer"));
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| self.err("integer literal out of range"))
    }

    fn string_literal(&mut self) -> Result<String, RaeError> {
        self.skip_ws_and_comments();
        self.expect_char('"')?;
        let mut out = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some(c) => out.push(c),
                None => return Err(self.err("unterminated string literal")),
            }
        }
        Ok(out)
    }

    /// Peeks whether the next non-whitespace character starts `needle`
    /// without consuming anything.
    fn peek_is(&mut self, needle: char) -> bool {
        self.skip_ws_and_comments();
        self.peek() == Some(needle)
    }
}

/// Parses a `*.raepack` manifest file's text into a [`PackageManifest`].
pub fn parse_manifest(file: &str, text: &str) -> Result<PackageManifest, RaeError> {
    let mut cursor = Cursor::new(file, text);

    let pack_kw = cursor.ident()?;
    if pack_kw != "pack" {
        return Err(cursor.err("manifest must start with 'pack <Name>'"));
    }
    let name = cursor.ident()?;
    cursor.expect_char('{')?;

    let mut format: Option<String> = None;
    let mut version: Option<u64> = None;
    let mut default_target: Option<String> = None;
    let mut targets = Vec::new();

    loop {
        cursor.skip_ws_and_comments();
        if cursor.peek_is('}') {
            cursor.advance();
            break;
        }
        let key = cursor.ident()?;
        match key.as_str() {
            "format" => {
                cursor.expect_char(':').ok();
                format = Some(cursor.string_literal()?);
            }
            "version" => {
                cursor.expect_char(':').ok();
                version = Some(cursor.integer()?);
            }
            "defaultTarget" => {
                cursor.expect_char(':').ok();
                default_target = Some(cursor.ident()?);
            }
            "targets" => {
                cursor.expect_char('{')?;
                targets = parse_targets(&mut cursor)?;
            }
            other => return Err(cursor.err(format!("unknown manifest key '{other}'"))),
        }
    }

    let format = format.ok_or_else(|| cursor.err("manifest missing required field 'format'"))?;
    if format != "raepack" {
        return Err(cursor.err(format!("unrecognized manifest format '{format}'")));
    }
    let version = version.ok_or_else(|| cursor.err("manifest missing required field 'version'"))?;
    if version == 0 {
        return Err(cursor.err("'version' must be a positive integer"));
    }
    let default_target =
        default_target.ok_or_else(|| cursor.err("manifest missing required field 'defaultTarget'"))?;
    if targets.is_empty() {
        return Err(cursor.err("manifest must declare at least one target"));
    }

    Ok(PackageManifest { name, version, default_target, targets })
}

fn parse_targets(cursor: &mut Cursor) -> Result<Vec<TargetEntry>, RaeError> {
    let mut targets = Vec::new();
    loop {
        cursor.skip_ws_and_comments();
        if cursor.peek_is('}') {
            cursor.advance();
            break;
        }
        let kw = cursor.ident()?;
        if kw != "target" {
            return Err(cursor.err(format!("expected 'target', found '{kw}'")));
        }
        let id = cursor.ident()?;
        cursor.expect_char(':')?;
        cursor.expect_char('{')?;
        targets.push(parse_target_body(cursor, id)?);
    }
    Ok(targets)
}

fn parse_target_body(cursor: &mut Cursor, id: String) -> Result<TargetEntry, RaeError> {
    let mut label: Option<String> = None;
    let mut entry: Option<String> = None;
    let mut sources = Vec::new();

    loop {
        cursor.skip_ws_and_comments();
        if cursor.peek_is('}') {
            cursor.advance();
            break;
        }
        let key = cursor.ident()?;
        match key.as_str() {
            "label" => {
                cursor.expect_char(':')?;
                label = Some(cursor.string_literal()?);
            }
            "entry" => {
                cursor.expect_char(':')?;
                entry = Some(cursor.string_literal()?);
            }
            "sources" => {
                cursor.expect_char(':')?;
                cursor.expect_char('{')?;
                sources = parse_sources(cursor)?;
            }
            other => return Err(cursor.err(format!("unknown target key '{other}'"))),
        }
    }

    let label = label.ok_or_else(|| cursor.err(format!("target '{id}' missing 'label'")))?;
    let entry = entry.ok_or_else(|| cursor.err(format!("target '{id}' missing 'entry'")))?;
    if sources.is_empty() {
        return Err(cursor.err(format!("target '{id}' must declare at least one source")));
    }
    if !sources.iter().any(|s| s.path == entry) {
        return Err(cursor.err(format!("target '{id}' entry '{entry}' is not among its sources")));
    }

    Ok(TargetEntry { id, label, entry, sources })
}

fn parse_sources(cursor: &mut Cursor) -> Result<Vec<SourceEntry>, RaeError> {
    let mut sources = Vec::new();
    loop {
        cursor.skip_ws_and_comments();
        if cursor.peek_is('}') {
            cursor.advance();
            break;
        }
        let kw = cursor.ident()?;
        if kw != "source" {
            return Err(cursor.err(format!("expected 'source', found '{kw}'")));
        }
        cursor.expect_char('{')?;
        sources.push(parse_source_body(cursor)?);
    }
    Ok(sources)
}

fn parse_source_body(cursor: &mut Cursor) -> Result<SourceEntry, RaeError> {
    let mut path: Option<String> = None;
    let mut emit: Option<EmitMode> = None;

    loop {
        cursor.skip_ws_and_comments();
        if cursor.peek_is('}') {
            cursor.advance();
            break;
        }
        let key = cursor.ident()?;
        match key.as_str() {
            "path" => {
                cursor.expect_char(':')?;
                path = Some(cursor.string_literal()?);
            }
            "emit" => {
                cursor.expect_char(':')?;
                let word = cursor.ident()?;
                emit = Some(match word.as_str() {
                    "live" => EmitMode::Live,
                    "compiled" => EmitMode::Compiled,
                    "hybrid" => EmitMode::Hybrid,
                    other => return Err(cursor.err(format!("unknown emit mode '{other}'"))),
                });
            }
            other => return Err(cursor.err(format!("unknown source key '{other}'"))),
        }
    }

    let path = path.ok_or_else(|| cursor.err("source missing 'path'"))?;
    let emit = emit.ok_or_else(|| cursor.err("source missing 'emit'"))?;
    Ok(SourceEntry { path, emit })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        pack Widgets {
            format: "raepack"
            version: 1
            defaultTarget: native
            targets {
                target native: {
                    label: "Native",
                    entry: "main.rae",
                    sources: {
                        source { path: "main.rae", emit: live }
                        source { path: "util.rae", emit: compiled }
                    }
                }
            }
        }
    "#;

    #[test]
    fn parses_a_well_formed_manifest() {
        let manifest = parse_manifest("widgets.raepack", SAMPLE).unwrap();
        assert_eq!(manifest.name, "Widgets");
        assert_eq!(manifest.version, 1);
        assert_eq!(manifest.default_target, "native");
        assert_eq!(manifest.targets.len(), 1);
        assert_eq!(manifest.targets[0].sources.len(), 2);
    }

    #[test]
    fn rejects_entry_not_listed_among_sources() {
        let bad = SAMPLE.replace(r#"entry: "main.rae""#, r#"entry: "missing.rae""#);
        let err = parse_manifest("widgets.raepack", &bad).unwrap_err();
        assert!(matches!(err, RaeError::Compile { .. }));
    }

    #[test]
    fn rejects_zero_version() {
        let bad = SAMPLE.replace("version: 1", "version: 0");
        let err = parse_manifest("widgets.raepack", &bad).unwrap_err();
        assert!(matches!(err, RaeError::Compile { .. }));
    }

    #[test]
    fn default_target_entry_looks_up_by_id() {
        let manifest = parse_manifest("widgets.raepack", SAMPLE).unwrap();
        assert_eq!(manifest.default_target_entry().unwrap().id, "native");
    }
}
