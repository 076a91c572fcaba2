//! hql-gen — IR→target codegen (spec.md section 4.7): walks a prepared,
//! sanitized IR tree into JavaScript or TypeScript text plus an optional
//! source map. Does no analysis of its own; every upstream decision
//! (identifier spelling, which runtime helpers are referenced, operator
//! slot assignment) was already made by `hql-lir`.

pub mod emit;
pub mod error;
pub mod options;
pub mod sourcemap;

pub use emit::{generate, Emission};
pub use error::{CodeGenError, Result};
pub use options::{EmitOptions, SourceMapMode, TargetSyntax};
