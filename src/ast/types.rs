//! Type reference nodes.
//!
//! A type annotation in source (`view opt Foo[Bar]`) is never resolved to a
//! semantic `Type` by this crate — the system performs no deep semantic
//! analysis beyond arity checks (§1). [`AstTypeRef`] simply records the
//! modifier keywords and path the parser observed, in source order, so the
//! pretty-printer can reproduce them and the compiler can read arity-level
//! facts (is this an `opt`? how many generic args?) off of it.

/// Ownership / nullability modifiers that may prefix a type reference.
///
/// Stored as flags rather than a single enum because the grammar allows
/// combinations (`opt view Foo`, `mod id Thing`); presence is what matters,
/// not the order the keywords appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct TypeModifiers {
    pub is_opt: bool,
    pub is_view: bool,
    pub is_mod: bool,
    pub is_id: bool,
    pub is_key: bool,
}

/// A reference to a named type, with its modifiers and generic arguments.
///
/// `path` is a dotted sequence of identifiers (`pkg.Widget`); for the vast
/// majority of source programs it is a single segment.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AstTypeRef {
    pub modifiers: TypeModifiers,
    pub path: Vec<String>,
    pub generic_args: Vec<AstTypeRef>,
}

impl AstTypeRef {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            modifiers: TypeModifiers::default(),
            path: vec![name.into()],
            generic_args: Vec::new(),
        }
    }

    /// The final path segment, e.g. `Widget` out of `pkg.Widget`.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// `extern` function signatures may not carry ownership modifiers; a
    /// missing native value is representable as `none` instead.
    pub fn is_extern_compatible(&self) -> bool {
        !(self.modifiers.is_view || self.modifiers.is_mod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_type_has_single_path_segment() {
        let t = AstTypeRef::simple("int");
        assert_eq!(t.name(), "int");
        assert!(t.generic_args.is_empty());
    }

    #[test]
    fn extern_compatibility_rejects_view_and_mod() {
        let mut t = AstTypeRef::simple("Widget");
        assert!(t.is_extern_compatible());
        t.modifiers.is_view = true;
        assert!(!t.is_extern_compatible());
    }
}
