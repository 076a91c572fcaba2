//! hql-sem — symbol resolution and semantic analysis (spec.md section 4.4).
//!
//! Consumes the macro-expanded AST and produces a populated [`SymbolTable`]
//! plus diagnostics. HQL forwards type annotations without checking them —
//! there is no unifier here, only the colon-split in [`types`] and the
//! scope/kind bookkeeping lowering needs to turn `(fn ...)`, `(class ...)`,
//! `(loop ...)`/`(recur ...)`, and friends into IR.

pub mod analysis;
pub mod kernel;
pub mod scope;
pub mod suggest;
pub mod types;

pub use analysis::{analyze, Analyzer};
pub use kernel::{is_kernel_primitive, is_operator, is_runtime_helper, KERNEL_PRIMITIVES, OPERATOR_TABLE, RUNTIME_HELPERS};
pub use scope::{ScopeId, ScopeKind, SymbolEntry, SymbolKind, SymbolTable};
pub use types::split_type_annotation;
