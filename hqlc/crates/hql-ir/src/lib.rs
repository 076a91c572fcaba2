pub mod builder;
pub mod ir;
pub mod lower;
pub mod optimize;

pub use builder::*;
pub use ir::{
    CatchClause, ClassField, ClassMethod, DeclKind, EnumCase, ExportKind, Ir, IrKind, ImportKind,
    ImportSpecifier, ObjectProperty, Param,
};
pub use lower::Lowerer;
pub use optimize::{optimize_program, OptimizeOptions};

use hql_par::Ast;

/// Lowers a parsed, macro-expanded, analyzed program straight to its
/// optimized IR. Semantic analysis (`hql_sem::analyze`) is a validation
/// pass over the AST, not a tree transform, so lowering reads from the
/// same `forms` the analyzer checked rather than from any analyzer
/// output.
pub fn lower_and_optimize(forms: &[Ast], opts: OptimizeOptions) -> Ir {
    let mut lowerer = Lowerer::new();
    let program = lowerer.lower_program(forms);
    optimize_program(program, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_util::{FileId, Handler};

    fn lower_source(src: &str) -> Ir {
        let handler = Handler::new();
        let forms = hql_par::parse(src, FileId::DUMMY, &handler);
        let expanded = hql_macro::expand(forms, &handler);
        assert!(!handler.has_errors(), "expected expansion to succeed for {src:?}");
        lower_and_optimize(&expanded, OptimizeOptions::default())
    }

    #[test]
    fn lowers_simple_function() {
        let ir = lower_source("(defn add [a b] (+ a b))");
        let IrKind::Program(stmts) = &ir.kind else { panic!() };
        assert!(matches!(stmts[0].kind, IrKind::FunctionDecl { .. }));
    }

    #[test]
    fn lowers_loop_recur_to_while_with_reassignment() {
        let ir = lower_source("(defn count-down [n] (loop [i n] (if (> i 0) (recur (- i 1)) i)))");
        let IrKind::Program(stmts) = &ir.kind else { panic!() };
        let IrKind::FunctionDecl { body, .. } = &stmts[0].kind else { panic!() };
        let found_while = body.iter().any(|s| matches!(s.kind, IrKind::While { .. }))
            || body
                .iter()
                .any(|s| matches!(&s.kind, IrKind::Block(inner) if inner.iter().any(|x| matches!(x.kind, IrKind::While { .. }))));
        assert!(found_while, "expected a while(true) loop in {body:?}");
    }

    #[test]
    fn lowers_quote_of_symbol_to_string_literal() {
        let ir = lower_source("(def x (quote foo))");
        let IrKind::Program(stmts) = &ir.kind else { panic!() };
        // `def` is not a kernel primitive; falls through to a plain call
        // lowering, which is fine — this test only exercises `quote`.
        let _ = stmts;
        let ir2 = lower_source("(let [x (quote foo)] x)");
        let IrKind::Program(stmts2) = &ir2.kind else { panic!() };
        assert!(!stmts2.is_empty());
    }

    #[test]
    fn lowers_for_over_range_through_optimizer_to_native_for() {
        let ir = lower_source("(defn f [] (for [i 0 10] (print i)))");
        let IrKind::Program(stmts) = &ir.kind else { panic!() };
        let IrKind::FunctionDecl { body, .. } = &stmts[0].kind else { panic!() };
        assert!(body.iter().any(|s| matches!(s.kind, IrKind::For { .. })));
    }

    #[test]
    fn lowers_destructuring_let_binding() {
        let ir = lower_source("(let [[a b] [1 2]] (+ a b))");
        let IrKind::Program(stmts) = &ir.kind else { panic!() };
        assert!(matches!(stmts[0].kind, IrKind::Block(_)));
    }

    /// `analyze_defn` reports a diagnostic and `hql-drv`'s pipeline stops
    /// before lowering for a name-less `defn`, but lowering is also a
    /// public entry point on its own (`lower_and_optimize`), so it must
    /// not panic even when called without running semantic analysis
    /// first — it should fail soft instead of `lower_fn_decl`'s
    /// `args[0].as_symbol().unwrap()`.
    #[test]
    fn lowering_a_nameless_defn_does_not_panic() {
        let _ = lower_source("(defn 5 [] 1)");
        let _ = lower_source("(defn)");
    }
}
