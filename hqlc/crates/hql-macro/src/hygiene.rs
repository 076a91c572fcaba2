//! Hygienic capture (spec.md section 4.3, step 4).
//!
//! Finds identifiers a macro's *body template* introduces as new local
//! bindings — `let`/`var` names, `loop`/`for`/`doseq` binding-vector names,
//! anonymous `fn` parameters, and `catch` exception variables — that are not
//! themselves provided by the call site through the macro's parameter
//! pattern. Each such name gets one fresh [`crate::gensym::gensym`] alias per
//! expansion, so a macro's internal temporaries can never collide with an
//! identifier the caller happens to use.
//!
//! `(quote X)` is never scanned: its contents are opaque literal data, never
//! instantiated as code, so nothing in it can capture anything.

use hql_par::Ast;
use hql_util::{FxHashMap, FxHashSet, Symbol};

use crate::gensym::gensym;
use crate::pattern_bind::pattern_bound_names;

const LOCAL_BINDING_FORMS: &[&str] = &["let", "var", "loop", "for", "doseq", "fn", "catch"];

/// Per-expansion rename table. Built once per macro call via
/// [`HygieneCtx::new`], then consulted during template instantiation.
#[derive(Debug, Default)]
pub struct HygieneCtx {
    renames: FxHashMap<Symbol, Symbol>,
}

impl HygieneCtx {
    pub fn new(body: &[Ast], bound_names: &FxHashSet<Symbol>) -> Self {
        let mut introduced = FxHashSet::default();
        for form in body {
            scan(form, bound_names, &mut introduced);
        }
        let renames = introduced
            .into_iter()
            .map(|name| (name, gensym(name)))
            .collect();
        Self { renames }
    }

    pub fn rename(&self, name: Symbol) -> Option<Symbol> {
        self.renames.get(&name).copied()
    }
}

fn scan(node: &Ast, bound: &FxHashSet<Symbol>, introduced: &mut FxHashSet<Symbol>) {
    match node {
        Ast::List { elements, .. } => {
            if let Some(head) = elements.first().and_then(Ast::as_symbol) {
                if head.as_str() == "quote" {
                    return;
                }
                if LOCAL_BINDING_FORMS.contains(&head.as_str()) {
                    collect_introduced(head.as_str(), elements, bound, introduced);
                }
            }
            for el in elements {
                scan(el, bound, introduced);
            }
        }
        Ast::Vector { elements, .. } | Ast::Set { elements, .. } => {
            for el in elements {
                scan(el, bound, introduced);
            }
        }
        Ast::Map { entries, .. } => {
            for (k, v) in entries {
                scan(k, bound, introduced);
                scan(v, bound, introduced);
            }
        }
        Ast::Literal { .. } | Ast::Symbol { .. } => {}
    }
}

fn maybe_introduce(name: Symbol, bound: &FxHashSet<Symbol>, introduced: &mut FxHashSet<Symbol>) {
    if name.as_str() != "_" && !bound.contains(&name) {
        introduced.insert(name);
    }
}

fn collect_introduced(
    head: &str,
    elements: &[Ast],
    bound: &FxHashSet<Symbol>,
    introduced: &mut FxHashSet<Symbol>,
) {
    match head {
        "let" | "var" => {
            // `(let x e)` or `(let (x e y e2 ...) body...)`.
            if let Some(second) = elements.get(1) {
                match second {
                    Ast::Symbol { name, .. } => maybe_introduce(*name, bound, introduced),
                    Ast::List { elements: binds, .. } | Ast::Vector { elements: binds, .. } => {
                        for pair in binds.chunks(2) {
                            if let Some(name) = pair.first().and_then(Ast::as_symbol) {
                                maybe_introduce(name, bound, introduced);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        "loop" => {
            if let Some(Ast::Vector { elements: binds, .. }) = elements.get(1) {
                for pair in binds.chunks(2) {
                    if let Some(name) = pair.first().and_then(Ast::as_symbol) {
                        maybe_introduce(name, bound, introduced);
                    }
                }
            }
        }
        "for" | "doseq" => {
            if let Some(Ast::Vector { elements: binds, .. }) = elements.get(1) {
                if let Some(name) = binds.first().and_then(Ast::as_symbol) {
                    maybe_introduce(name, bound, introduced);
                }
            }
        }
        "fn" => {
            // `(fn name? [params] body...)`.
            for el in &elements[1..] {
                match el {
                    Ast::Symbol { name, .. } => maybe_introduce(*name, bound, introduced),
                    Ast::Vector { elements: params, .. } => {
                        for name in pattern_bound_names(params) {
                            maybe_introduce(name, bound, introduced);
                        }
                        break;
                    }
                    _ => break,
                }
            }
        }
        "catch" => {
            if let Some(name) = elements.get(1).and_then(Ast::as_symbol) {
                maybe_introduce(name, bound, introduced);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_par::parse;
    use hql_util::{FileId, Handler};

    fn parse_forms(src: &str) -> Vec<Ast> {
        let handler = Handler::new();
        parse(src, FileId::DUMMY, &handler)
    }

    #[test]
    fn let_binding_not_in_pattern_is_introduced() {
        let body = parse_forms("(let tmp (compute)) (+ tmp x)");
        let bound: FxHashSet<Symbol> = [Symbol::intern("x")].into_iter().collect();
        let ctx = HygieneCtx::new(&body, &bound);
        assert!(ctx.rename(Symbol::intern("tmp")).is_some());
        assert!(ctx.rename(Symbol::intern("x")).is_none());
    }

    #[test]
    fn quoted_forms_are_not_scanned() {
        let body = parse_forms("(quote (let tmp 1))");
        let bound = FxHashSet::default();
        let ctx = HygieneCtx::new(&body, &bound);
        assert!(ctx.rename(Symbol::intern("tmp")).is_none());
    }
}
