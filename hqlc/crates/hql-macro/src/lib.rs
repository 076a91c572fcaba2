//! hql-macro — the macro expander (spec.md section 4.3).
//!
//! Takes the parsed AST and a [`MacroEnv`] (the embedded standard macros
//! plus any user `(macro ...)`/`(defmacro ...)` definitions) and produces an
//! AST with every macro call replaced by its expansion, recursively, to a
//! fixed point or the expansion depth cap.

mod def;
mod env;
mod expander;
mod gensym;
mod hygiene;
mod pattern_bind;
mod stdlib;
mod template;

pub use def::{Bindings, Bound, MacroDef};
pub use env::MacroEnv;
pub use expander::expand_program;
pub use gensym::gensym;
pub use pattern_bind::{bind_pattern_elements, pattern_bound_names, ArityMismatch};

use hql_par::Ast;
use hql_util::Handler;

/// Expands `forms` against a fresh environment seeded with the embedded
/// standard macros. This is the convenience entry point `hql-drv` calls
/// between parsing and semantic analysis; callers that need to inspect or
/// extend the environment afterwards (an LSP session, for instance) should
/// build a [`MacroEnv`] directly and call [`expand_program`].
pub fn expand(forms: Vec<Ast>, handler: &Handler) -> Vec<Ast> {
    let mut env = MacroEnv::with_stdlib(handler);
    expand_program(forms, &mut env, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_par::parse;
    use hql_util::FileId;

    #[test]
    fn end_to_end_expands_nested_macro_calls() {
        let handler = Handler::new();
        let forms = parse(
            "(defmacro my-when [cond & body] `(if ,cond (do ,@body) nil)) \
             (my-when (> x 0) (print x) (print 1))",
            FileId::DUMMY,
            &handler,
        );
        let expanded = expand(forms, &handler);
        assert!(!handler.has_errors());
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].head_symbol().unwrap().as_str(), "if");
    }
}
