//! Error types for the codegen stage (spec.md section 7, "Codegen errors").
//!
//! Spec.md is explicit that these are "never expected but detectable":
//! the prior stages (`hql-lir`'s sanitization and collision tracking) are
//! supposed to rule every one of these out before a [`crate::Emitter`] ever
//! runs. They exist so a bug upstream surfaces as a typed error instead of
//! a panic or, worse, silently wrong JS text.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeGenError {
    /// Two distinct HQL identifiers sanitized to the same JS identifier.
    /// `hql-lir::CollisionTracker` should have already caught this; surfaced
    /// again here as a hard stop before emission rather than silently
    /// shadowing one binding with the other.
    #[error("identifier collision: `{original}` and `{other}` both sanitize to `{sanitized}`")]
    IdentifierCollision { sanitized: String, original: String, other: String },

    /// A runtime helper was referenced but has no known source text — only
    /// reachable if `hql-lir::collect_referenced_helpers` disagrees with
    /// `hql-runtime::helper_source` about which names are valid helpers.
    #[error("unknown runtime helper `{0}` referenced in program")]
    UnknownHelper(String),

    /// Source-map construction failed (e.g. a span referenced a file id
    /// the source map table never registered).
    #[error("source map error: {0}")]
    SourceMap(String),
}

pub type Result<T> = std::result::Result<T, CodeGenError>;
