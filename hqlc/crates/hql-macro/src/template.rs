//! Template instantiation (spec.md section 4.3, step 3).
//!
//! Two substitution modes share one recursive walk:
//!
//! - **Direct** mode (the default, used for a macro body that is not
//!   wrapped in a backtick template): every symbol matching a bound
//!   parameter name is replaced by its bound form; every symbol introduced
//!   by the body as a fresh local binding (`let`, anonymous `fn` params,
//!   ...) is replaced by its hygiene alias; everything else is copied.
//! - **Quasi(depth)** mode (entered on `(quasiquote X)`): standard Lisp
//!   quasiquote — bare symbols are literal data, copied untouched; only
//!   `(unquote E)` (processed in Direct mode) and `(unquote-splice E)`
//!   interpolate. Nested `quasiquote` increments `depth`; a matching
//!   `unquote`/`unquote-splice` at `depth == 1` fires, at `depth > 1` it is
//!   copied with `depth - 1` (unresolved until the enclosing quasiquote
//!   peels off).
//!
//! `(quote X)` is never touched in either mode: it yields `X` verbatim, per
//! spec.md's expansion protocol.

use hql_par::Ast;

use crate::def::{Bindings, Bound};
use crate::hygiene::HygieneCtx;

#[derive(Clone, Copy)]
enum Mode {
    Direct,
    Quasi(u32),
}

fn bump(mode: Mode) -> Mode {
    match mode {
        Mode::Direct => Mode::Quasi(1),
        Mode::Quasi(d) => Mode::Quasi(d + 1),
    }
}

struct InstCtx<'a> {
    bindings: &'a Bindings,
    hygiene: &'a HygieneCtx,
}

/// Instantiates a single macro-body form against `bindings`, applying
/// hygiene renames from `hygiene`.
pub fn instantiate(node: &Ast, bindings: &Bindings, hygiene: &HygieneCtx) -> Ast {
    let ctx = InstCtx { bindings, hygiene };
    instantiate_mode(node, Mode::Direct, &ctx)
}

fn instantiate_mode(node: &Ast, mode: Mode, ctx: &InstCtx) -> Ast {
    match node {
        Ast::Literal { .. } => node.clone(),
        Ast::Symbol { name, pos } => match mode {
            Mode::Direct => {
                if let Some(bound) = ctx.bindings.get(name) {
                    bound_to_ast(bound, *pos)
                } else if let Some(renamed) = ctx.hygiene.rename(*name) {
                    Ast::Symbol { name: renamed, pos: *pos }
                } else {
                    node.clone()
                }
            }
            Mode::Quasi(_) => node.clone(),
        },
        Ast::List { elements, pos } => {
            if elements.is_empty() {
                return node.clone();
            }
            if let Some(head) = elements[0].as_symbol() {
                match head.as_str() {
                    "quote" if elements.len() == 2 => {
                        return Ast::List {
                            elements: vec![elements[0].clone(), elements[1].clone()],
                            pos: *pos,
                        };
                    }
                    "quasiquote" if elements.len() == 2 => {
                        let inner = instantiate_mode(&elements[1], bump(mode), ctx);
                        return Ast::List {
                            elements: vec![elements[0].clone(), inner],
                            pos: *pos,
                        };
                    }
                    "unquote" if elements.len() == 2 => {
                        return instantiate_unquote(&elements[0], &elements[1], mode, ctx, *pos);
                    }
                    "unquote-splice" if elements.len() == 2 => {
                        // Only meaningful as a sequence element; reaching
                        // this arm means it stood alone as a whole form, so
                        // fall back to unquote-like evaluation.
                        return instantiate_unquote(&elements[0], &elements[1], mode, ctx, *pos);
                    }
                    _ => {}
                }
            }
            Ast::List {
                elements: instantiate_seq(elements, mode, ctx),
                pos: *pos,
            }
        }
        Ast::Vector { elements, pos } => Ast::Vector {
            elements: instantiate_seq(elements, mode, ctx),
            pos: *pos,
        },
        Ast::Set { elements, pos } => Ast::Set {
            elements: instantiate_seq(elements, mode, ctx),
            pos: *pos,
        },
        Ast::Map { entries, pos } => Ast::Map {
            entries: entries
                .iter()
                .map(|(k, v)| (instantiate_mode(k, mode, ctx), instantiate_mode(v, mode, ctx)))
                .collect(),
            pos: *pos,
        },
    }
}

fn instantiate_unquote(
    head: &Ast,
    inner: &Ast,
    mode: Mode,
    ctx: &InstCtx,
    pos: hql_util::Span,
) -> Ast {
    match mode {
        Mode::Quasi(1) | Mode::Direct => instantiate_mode(inner, Mode::Direct, ctx),
        Mode::Quasi(d) => {
            let instantiated = instantiate_mode(inner, Mode::Quasi(d - 1), ctx);
            Ast::List {
                elements: vec![head.clone(), instantiated],
                pos,
            }
        }
    }
}

fn bound_to_ast(bound: &Bound, pos: hql_util::Span) -> Ast {
    match bound {
        Bound::Single(ast) => ast.clone(),
        Bound::Rest(items) => Ast::Vector {
            elements: items.clone(),
            pos,
        },
    }
}

/// Instantiates a sequence of elements, expanding any `(unquote-splice E)`
/// member into zero or more spliced elements rather than one.
fn instantiate_seq(elements: &[Ast], mode: Mode, ctx: &InstCtx) -> Vec<Ast> {
    let mut out = Vec::with_capacity(elements.len());
    for el in elements {
        if let Some(inner) = splice_target(el) {
            out.extend(splice_value(inner, ctx));
            continue;
        }
        out.push(instantiate_mode(el, mode, ctx));
    }
    out
}

fn splice_target(node: &Ast) -> Option<&Ast> {
    match node {
        Ast::List { elements, .. } if elements.len() == 2 => match elements[0].as_symbol() {
            Some(s) if s.as_str() == "unquote-splice" => Some(&elements[1]),
            _ => None,
        },
        _ => None,
    }
}

fn splice_value(e: &Ast, ctx: &InstCtx) -> Vec<Ast> {
    if let Some(name) = e.as_symbol() {
        match ctx.bindings.get(&name) {
            Some(Bound::Rest(items)) => return items.clone(),
            Some(Bound::Single(Ast::Vector { elements, .. } | Ast::List { elements, .. })) => {
                return elements.clone();
            }
            Some(Bound::Single(other)) => return vec![other.clone()],
            None => {}
        }
    }
    match instantiate_mode(e, Mode::Direct, ctx) {
        Ast::Vector { elements, .. } | Ast::List { elements, .. } => elements,
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_bind::bind_pattern_elements;
    use hql_par::parse;
    use hql_util::{FileId, FxHashSet, Handler, Symbol};

    fn parse_one(src: &str) -> Ast {
        let handler = Handler::new();
        parse(src, FileId::DUMMY, &handler).into_iter().next().unwrap()
    }

    fn empty_hygiene() -> HygieneCtx {
        HygieneCtx::new(&[], &FxHashSet::default())
    }

    #[test]
    fn quasiquote_unquote_substitutes_bound_param() {
        let pattern = match parse_one("[cond]") {
            Ast::Vector { elements, .. } => elements,
            _ => unreachable!(),
        };
        let args = vec![parse_one("(> x 0)")];
        let bindings = bind_pattern_elements(&pattern, &args).unwrap();
        let hygiene = empty_hygiene();

        let template = parse_one("`(if ,cond true false)");
        let result = instantiate(&template, &bindings, &hygiene);
        // (quasiquote (if (> x 0) true false))
        match result {
            Ast::List { elements, .. } => {
                assert_eq!(elements[0].as_symbol().unwrap().as_str(), "quasiquote");
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn unquote_splice_flattens_rest_binding() {
        let pattern = match parse_one("[& body]") {
            Ast::Vector { elements, .. } => elements,
            _ => unreachable!(),
        };
        let args = vec![parse_one("1"), parse_one("2"), parse_one("3")];
        let bindings = bind_pattern_elements(&pattern, &args).unwrap();
        let hygiene = empty_hygiene();

        let template = parse_one("`(do ,@body)");
        let result = instantiate(&template, &bindings, &hygiene);
        let inner = match &result {
            Ast::List { elements, .. } => match &elements[1] {
                Ast::List { elements, .. } => elements,
                _ => panic!("expected inner list"),
            },
            _ => panic!("expected list"),
        };
        // `do` + three spliced literals
        assert_eq!(inner.len(), 4);
    }

    #[test]
    fn quote_is_copied_untouched() {
        let bindings = Bindings::default();
        let hygiene = empty_hygiene();
        let template = parse_one("(quote (a b c))");
        let result = instantiate(&template, &bindings, &hygiene);
        assert_eq!(result, template);
    }

    #[test]
    fn direct_mode_renames_introduced_let_binding() {
        let mut bindings = Bindings::default();
        bindings.insert(Symbol::intern("x"), Bound::Single(parse_one("42")));
        let body = vec![parse_one("(let tmp x) (+ tmp 1)")];
        let bound_names: FxHashSet<Symbol> = [Symbol::intern("x")].into_iter().collect();
        let hygiene = HygieneCtx::new(&body, &bound_names);

        let result = instantiate(&body[0], &bindings, &hygiene);
        match result {
            Ast::List { elements, .. } => {
                let name = elements[1].as_symbol().unwrap();
                assert_ne!(name.as_str(), "tmp");
                assert!(name.as_str().starts_with("tmp__g"));
            }
            _ => panic!("expected list"),
        }
    }
}
