//! The fixed runtime helper set (spec.md section 4.5/Glossary): the
//! sixteen JS functions codegen prepends, verbatim and at most once each,
//! to any emitted module that references them.
//!
//! This crate defines no linkable runtime, no allocator, and no GC — the
//! emitted JS runs under whatever engine loads it, per spec.md section 1's
//! "does not define a runtime VM" non-goal. What it owns is the *content*
//! of the sixteen helpers, so `hql-sem` (call-shape checks, "did you
//! mean?" candidates) and `hql-gen` (emission) share one source of truth
//! instead of each hand-maintaining the helper arities and bodies.

mod helpers;

pub use helpers::{helper_source, helper_spec, HelperSpec, HELPER_SPECS};
