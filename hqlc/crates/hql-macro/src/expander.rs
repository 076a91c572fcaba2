//! Top-down macro expansion (spec.md section 4.3).
//!
//! Walks the AST depth-first. At each list form whose head is a bound macro
//! name, binds the pattern against the call's arguments, instantiates the
//! body, and re-walks the result in place — so a macro that expands to
//! another macro call keeps expanding until a fixed point (spec.md section
//! 7, "Macro fixed point"). A per-node counter enforces the depth cap so a
//! macro that is never productive cannot loop forever.
//!
//! Unknown macro names are *not* reported here: a bare symbol with no
//! binding and no primitive meaning is a semantic-analysis concern
//! (spec.md section 4.3, "Failure modes").

use hql_par::Ast;
use hql_util::diagnostic::{E_MACRO_ARITY, E_MACRO_DEPTH};
use hql_util::Handler;

use crate::env::MacroEnv;
use crate::hygiene::HygieneCtx;
use crate::pattern_bind::{bind_pattern_elements, pattern_bound_names};
use crate::template::instantiate;

const MAX_EXPANSION_DEPTH: u32 = 64;

/// Expands every macro call in `forms` against `env`, returning the fully
/// expanded program. `(macro ...)`/`(defmacro ...)` top-level forms are
/// consumed (registered into `env`, not present in the output) as they are
/// encountered, so later siblings can call macros defined earlier in the
/// same file.
pub fn expand_program(forms: Vec<Ast>, env: &mut MacroEnv, handler: &Handler) -> Vec<Ast> {
    let mut out = Vec::with_capacity(forms.len());
    for form in forms {
        if env.define_if_macro_form(&form).is_some() {
            continue;
        }
        out.push(expand_form(form, env, handler));
    }
    out
}

fn expand_form(form: Ast, env: &MacroEnv, handler: &Handler) -> Ast {
    expand_with_depth(form, env, handler, 0)
}

fn expand_with_depth(form: Ast, env: &MacroEnv, handler: &Handler, depth: u32) -> Ast {
    if depth >= MAX_EXPANSION_DEPTH {
        handler
            .build_error(form.pos(), "macro expansion exceeded the maximum depth (64)")
            .code(E_MACRO_DEPTH)
            .with_help("check for a macro that expands to a call of itself with unchanged arguments")
            .emit(handler);
        return form;
    }

    if let Ast::List { elements, pos } = &form {
        if let Some(head) = elements.first().and_then(Ast::as_symbol) {
            if let Some(def) = env.get(head) {
                let args = &elements[1..];
                let bindings = match bind_pattern_elements(def.param_elements(), args) {
                    Ok(b) => b,
                    Err(mismatch) => {
                        handler
                            .build_error(
                                *pos,
                                format!(
                                    "macro `{}` expects at least {} argument(s), got {}",
                                    head.as_str(),
                                    mismatch.expected_min,
                                    mismatch.got
                                ),
                            )
                            .code(E_MACRO_ARITY)
                            .emit(handler);
                        return form.clone();
                    }
                };

                let bound_names: hql_util::FxHashSet<_> =
                    pattern_bound_names(def.param_elements()).into_iter().collect();
                let hygiene = HygieneCtx::new(&def.body, &bound_names);

                let expanded = match def.body.len() {
                    0 => Ast::Literal {
                        value: hql_par::Literal::Nil,
                        pos: *pos,
                    },
                    1 => instantiate(&def.body[0], &bindings, &hygiene),
                    _ => {
                        let mut do_body = vec![Ast::symbol("do", *pos)];
                        do_body.extend(def.body.iter().map(|f| instantiate(f, &bindings, &hygiene)));
                        Ast::List { elements: do_body, pos: *pos }
                    }
                };

                return expand_with_depth(expanded, env, handler, depth + 1);
            }
        }

        let new_elements = elements
            .iter()
            .cloned()
            .map(|el| expand_with_depth(el, env, handler, 0))
            .collect();
        return Ast::List { elements: new_elements, pos: *pos };
    }

    match form {
        Ast::Vector { elements, pos } => Ast::Vector {
            elements: elements.into_iter().map(|el| expand_with_depth(el, env, handler, 0)).collect(),
            pos,
        },
        Ast::Set { elements, pos } => Ast::Set {
            elements: elements.into_iter().map(|el| expand_with_depth(el, env, handler, 0)).collect(),
            pos,
        },
        Ast::Map { entries, pos } => Ast::Map {
            entries: entries
                .into_iter()
                .map(|(k, v)| {
                    (
                        expand_with_depth(k, env, handler, 0),
                        expand_with_depth(v, env, handler, 0),
                    )
                })
                .collect(),
            pos,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_par::parse;
    use hql_util::FileId;

    fn expand_source(src: &str) -> (Vec<Ast>, Handler) {
        let handler = Handler::new();
        let mut env = MacroEnv::with_stdlib(&handler);
        let forms = parse(src, FileId::DUMMY, &handler);
        let expanded = expand_program(forms, &mut env, &handler);
        (expanded, handler)
    }

    #[test]
    fn expands_stdlib_when_macro() {
        let (expanded, handler) = expand_source("(when (> x 0) (print x))");
        assert!(!handler.has_errors());
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].head_symbol().unwrap().as_str(), "if");
    }

    #[test]
    fn user_defmacro_is_visible_to_later_forms() {
        let (expanded, handler) = expand_source(
            "(defmacro twice [x] `(do ,x ,x)) (twice (print 1))",
        );
        assert!(!handler.has_errors());
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].head_symbol().unwrap().as_str(), "do");
    }

    #[test]
    fn arity_mismatch_reports_e_macro_arity() {
        let (_, handler) = expand_source("(defmacro one [x] x) (one)");
        assert!(handler.has_errors());
        let diags = handler.diagnostics();
        assert_eq!(diags.last().unwrap().code, Some(E_MACRO_ARITY));
    }

    #[test]
    fn unknown_macro_like_call_is_left_untouched() {
        let (expanded, handler) = expand_source("(some-undefined-fn 1 2)");
        assert!(!handler.has_errors());
        assert_eq!(expanded[0].head_symbol().unwrap().as_str(), "some-undefined-fn");
    }

    #[test]
    fn self_recursive_macro_hits_depth_cap() {
        let (_, handler) = expand_source("(defmacro loopy [x] `(loopy ,x)) (loopy 1)");
        assert!(handler.has_errors());
        let diags = handler.diagnostics();
        assert!(diags.iter().any(|d| d.code == Some(E_MACRO_DEPTH)));
    }
}
