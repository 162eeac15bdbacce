//! Bump allocator for per-compile lifetime storage.
//!
//! One [`Arena`] is created per module-graph load. It owns a copy of every
//! file's source text, so lexemes handed to the parser can stay as
//! non-owning `&str` slices without pinning the caller's `String`. The
//! arena is dropped at the end of compilation; anything that must outlive
//! it — function-table names, constant-pool strings — is copied into an
//! owned `String` at that boundary (see `bytecode::compiler`).
//!
//! Grounded on `navicore-cem3`'s `runtime/src/arena.rs`, which uses the
//! same `bumpalo::Bump` for value-lifetime storage; this port is
//! single-threaded and per-compile rather than thread-local, since there
//! is exactly one compile in flight at a time (§5 of the specification).

use bumpalo::Bump;

/// Bump-allocated storage scoped to a single lex → parse → compile pass.
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Copies `source` into the arena and returns a slice with the arena's lifetime.
    ///
    /// Every loaded module's bytes are copied in once by the module graph
    /// loader; every token's lexeme is a sub-slice of that copy.
    pub fn alloc_source<'a>(&'a self, source: &str) -> &'a str {
        self.bump.alloc_str(source)
    }

    /// Interns an arbitrary string (e.g. a synthesized lexeme) into the arena.
    pub fn alloc_str<'a>(&'a self, s: &str) -> &'a str {
        self.bump.alloc_str(s)
    }

    /// Total bytes currently held by the arena. Exposed for the `--verbose`
    /// compiler diagnostics, mirroring the teacher's `PerfTimer` style of
    /// opt-in introspection.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_source_round_trips_bytes() {
        let arena = Arena::new();
        let s = arena.alloc_source("func main() {}");
        assert_eq!(s, "func main() {}");
    }

    #[test]
    fn repeated_interning_grows_allocated_bytes() {
        let arena = Arena::new();
        let before = arena.allocated_bytes();
        arena.alloc_str("identifier");
        assert!(arena.allocated_bytes() >= before);
    }
}
