//! Binds a macro's parameter pattern against the unevaluated argument forms
//! of a call site (spec.md section 4.3, step 2).
//!
//! This mirrors [`hql_par::could_be_pattern`]'s grammar exactly: plain
//! identifiers, `_` (ignored), `(= default)` attached to the preceding
//! element, `& rest`, and nested vector patterns. The classifier has already
//! validated shape; binding only needs to walk it and fail on arity.

use hql_par::Ast;
use hql_util::{FxHashMap, Symbol};

use crate::def::{Bindings, Bound};

#[derive(Debug, Clone)]
pub struct ArityMismatch {
    pub expected_min: usize,
    pub expected_max: Option<usize>,
    pub got: usize,
}

fn is_rest_marker(node: &Ast) -> bool {
    matches!(node.as_symbol(), Some(s) if s.as_str() == "&")
}

fn as_default_form(node: &Ast) -> Option<&Ast> {
    match node {
        Ast::List { elements, .. } if elements.len() == 2 => {
            match elements[0].as_symbol() {
                Some(s) if s.as_str() == "=" => Some(&elements[1]),
                _ => None,
            }
        }
        _ => None,
    }
}

fn element_seq(node: &Ast) -> Option<&[Ast]> {
    match node {
        Ast::Vector { elements, .. } | Ast::List { elements, .. } => Some(elements),
        _ => None,
    }
}

/// Binds `elements` (a pattern's member forms) against `args`.
pub fn bind_pattern_elements(elements: &[Ast], args: &[Ast]) -> Result<Bindings, ArityMismatch> {
    let mut bindings: Bindings = FxHashMap::default();
    let mut arg_idx = 0usize;
    let mut i = 0usize;
    let mut min_required = 0usize;

    while i < elements.len() {
        let el = &elements[i];

        if is_rest_marker(el) {
            let rest_name = elements
                .get(i + 1)
                .and_then(Ast::as_symbol)
                .unwrap_or_else(|| Symbol::intern("_"));
            if rest_name.as_str() != "_" {
                let rest_args = args.get(arg_idx..).map(|s| s.to_vec()).unwrap_or_default();
                bindings.insert(rest_name, Bound::Rest(rest_args));
            }
            arg_idx = args.len();
            i += 2;
            continue;
        }

        let (default, consumed) = match elements.get(i + 1).and_then(as_default_form) {
            Some(d) => (Some(d), 2),
            None => (None, 1),
        };
        if default.is_none() {
            min_required += 1;
        }

        let value = if arg_idx < args.len() {
            let v = args[arg_idx].clone();
            arg_idx += 1;
            v
        } else if let Some(d) = default {
            d.clone()
        } else {
            return Err(ArityMismatch {
                expected_min: min_required,
                expected_max: None,
                got: args.len(),
            });
        };

        match el {
            Ast::Symbol { name, .. } => {
                if name.as_str() != "_" {
                    bindings.insert(*name, Bound::Single(value));
                }
            }
            Ast::Vector { .. } => {
                let nested_elements = match &el {
                    Ast::Vector { elements, .. } => elements,
                    _ => unreachable!(),
                };
                let nested_args = element_seq(&value).map(|s| s.to_vec()).unwrap_or_default();
                let nested = bind_pattern_elements(nested_elements, &nested_args)?;
                bindings.extend(nested);
            }
            _ => {}
        }

        i += consumed;
    }

    if arg_idx < args.len() {
        return Err(ArityMismatch {
            expected_min: min_required,
            expected_max: Some(min_required),
            got: args.len(),
        });
    }

    Ok(bindings)
}

/// Collects every identifier a pattern would bind, ignoring defaults/rest
/// payload shape. Used by the hygiene pass to know which template symbols
/// are call-site-provided (and therefore must never be gensym-renamed).
pub fn pattern_bound_names(elements: &[Ast]) -> Vec<Symbol> {
    let mut names = Vec::new();
    collect_names(elements, &mut names);
    names
}

fn collect_names(elements: &[Ast], out: &mut Vec<Symbol>) {
    for el in elements {
        if is_rest_marker(el) || as_default_form(el).is_some() {
            continue;
        }
        match el {
            Ast::Symbol { name, .. } => out.push(*name),
            Ast::Vector { elements, .. } => collect_names(elements, out),
            _ => {}
        }
    }
    // The rest binding itself (the identifier following `&`).
    for (i, el) in elements.iter().enumerate() {
        if is_rest_marker(el) {
            if let Some(name) = elements.get(i + 1).and_then(Ast::as_symbol) {
                out.push(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_par::parse;
    use hql_util::{FileId, Handler};

    fn parse_one(src: &str) -> Ast {
        let handler = Handler::new();
        let forms = parse(src, FileId::DUMMY, &handler);
        forms.into_iter().next().unwrap()
    }

    fn pattern_elements(src: &str) -> Vec<Ast> {
        match parse_one(src) {
            Ast::Vector { elements, .. } => elements,
            _ => panic!("expected vector pattern"),
        }
    }

    #[test]
    fn binds_plain_positional_params() {
        let pattern = pattern_elements("[cond body]");
        let args = vec![Ast::number(1.0, Default::default()), Ast::number(2.0, Default::default())];
        let bindings = bind_pattern_elements(&pattern, &args).unwrap();
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn rest_and_default_and_nested_matches_scenario_6() {
        let pattern = pattern_elements("[[x (= 10) y & rest]]");
        // outer single argument: a vector literal `[1]`
        let outer_arg = parse_one("[1]");
        let args = vec![outer_arg];
        let bindings = bind_pattern_elements(&pattern, &args).unwrap();
        let x = bindings.get(&Symbol::intern("x")).unwrap();
        match x {
            Bound::Single(Ast::Literal { .. }) => {}
            other => panic!("unexpected x binding: {other:?}"),
        }
        let y = bindings.get(&Symbol::intern("y")).unwrap();
        match y {
            Bound::Single(Ast::Literal { value, .. }) => {
                assert_eq!(*value, hql_par::Literal::Number(10.0));
            }
            other => panic!("unexpected y binding: {other:?}"),
        }
        let rest = bindings.get(&Symbol::intern("rest")).unwrap();
        match rest {
            Bound::Rest(items) => assert!(items.is_empty()),
            other => panic!("unexpected rest binding: {other:?}"),
        }
    }

    #[test]
    fn arity_mismatch_without_default_or_rest() {
        let pattern = pattern_elements("[a b]");
        let args = vec![Ast::number(1.0, Default::default())];
        assert!(bind_pattern_elements(&pattern, &args).is_err());
    }
}
