//! hql-lir — the codegen-prep pass (spec.md section 4.7): identifier
//! sanitization, runtime-helper-usage collection, and first-class-operator
//! slot assignment, all performed once so `hql-gen` stays a pure text
//! emitter with no analysis responsibilities of its own.

pub mod helpers;
pub mod operators;
pub mod rename;
pub mod sanitize;

pub use helpers::collect_referenced_helpers;
pub use operators::{collect_operator_table, OperatorTable};
pub use rename::{sanitize_program, RenameResult};
pub use sanitize::{sanitize_identifier, CollisionTracker};

use hql_ir::Ir;
use hql_util::FxHashSet;

/// An optimized IR program with every identifier sanitized in place, plus
/// the two pieces of call-site analysis `hql-gen` needs but should not
/// have to compute itself.
pub struct PreparedProgram {
    pub ir: Ir,
    pub referenced_helpers: FxHashSet<&'static str>,
    pub operators: OperatorTable,
    /// Sanitization collisions found while renaming — always empty for
    /// well-formed input; surfaced so `hql-drv` can turn a non-empty list
    /// into `E_CODEGEN_IDENT_COLLISION` diagnostics.
    pub collisions: Vec<(String, String)>,
}

pub fn prepare(mut ir: Ir) -> PreparedProgram {
    let referenced_helpers = collect_referenced_helpers(&ir);
    let operators = collect_operator_table(&ir);
    let RenameResult { collisions } = sanitize_program(&mut ir);
    PreparedProgram { ir, referenced_helpers, operators, collisions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_ir::{lower_and_optimize, OptimizeOptions};
    use hql_util::{FileId, Handler};

    #[test]
    fn prepares_a_small_program_with_no_collisions() {
        let handler = Handler::new();
        let forms = hql_par::parse("(defn add [a b] (+ a b))", FileId::DUMMY, &handler);
        let expanded = hql_macro::expand(forms, &handler);
        let ir = lower_and_optimize(&expanded, OptimizeOptions::default());
        let prepared = prepare(ir);
        assert!(prepared.collisions.is_empty());
    }
}
