//! hql-util - Core Utilities and Foundation Types
//!
//! This crate provides the fundamental types shared by every stage of the
//! HQL compiler: source positions and the source map, string interning,
//! diagnostics, and a handful of typed-index collections. None of these
//! depend on any other compiler crate, so every later stage (lexer, parser,
//! macro expander, semantic analyzer, IR, codegen, bundler) can depend on
//! `hql-util` without creating cycles.
//!
//! # Layout
//!
//! - [`span`] — [`FileId`], [`Span`], [`SourceMap`]/`SourceFile`.
//! - [`symbol`] — [`Symbol`], the interned-string handle used for every
//!   identifier, keyword, and operator name in the pipeline.
//! - [`diagnostic`] — [`Diagnostic`], [`DiagnosticBuilder`], [`Level`],
//!   [`DiagnosticCode`], and [`Handler`], the accumulator every stage
//!   reports through.
//! - [`index_vec`] — [`IndexVec`]/[`Idx`]/[`define_idx!`], used to give
//!   scope IDs, definition IDs, and AST node IDs distinct types instead of
//!   raw `u32`s.

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use error::{DiagnosticError, IndexVecError, SourceMapError, SymbolError};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceMap, Span};
pub use symbol::Symbol;

// Re-exported so downstream crates get a consistent fast hasher without
// taking their own `rustc-hash` dependency.
pub use rustc_hash::{FxHashMap, FxHashSet};

define_idx!(NodeId);
define_idx!(ScopeId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_indices_roundtrip_through_usize() {
        let id = NodeId::from_usize(42);
        assert_eq!(id.index(), 42);
        let scope = ScopeId::from_usize(0);
        assert_eq!(scope.index(), 0);
    }
}
