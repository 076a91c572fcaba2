//! Destructuring-pattern classification (spec.md section 4.2).
//!
//! A `[...]` form is ambiguous: it could be a literal array, or it could be
//! a destructuring pattern bound by `fn`/`let`/a macro parameter list.
//! `could_be_pattern` disambiguates by structural inspection alone — no
//! semantic context is available at parse time.

use crate::ast::Ast;

/// Returns true iff `node` is a `Vector` that could be bound as a
/// destructuring pattern: every element is itself pattern-valid, with `&`
/// allowed only as the second-to-last element, followed by exactly one
/// identifier (possibly `_`, the ignored-rest binding).
///
/// Literals and function-call-shaped lists disqualify a vector from being a
/// pattern; an empty vector is vacuously a valid (empty) pattern.
pub fn could_be_pattern(node: &Ast) -> bool {
    match node {
        Ast::Vector { elements, .. } => is_pattern_element_seq(elements),
        _ => false,
    }
}

fn is_pattern_element_seq(elements: &[Ast]) -> bool {
    if elements.is_empty() {
        return true;
    }

    for (i, el) in elements.iter().enumerate() {
        if is_rest_marker(el) {
            // `&` must be the second-to-last element, followed by exactly
            // one identifier binding (possibly `_`).
            if i != elements.len() - 2 {
                return false;
            }
            let rest_binding = &elements[i + 1];
            return matches!(rest_binding, Ast::Symbol { .. });
        }
        if !is_pattern_element(el) {
            return false;
        }
    }
    true
}

fn is_rest_marker(node: &Ast) -> bool {
    matches!(node.as_symbol(), Some(s) if s.as_str() == "&")
}

/// A single pattern element: a plain identifier, `_`, a `(= default)` form
/// attached to an identifier or nested pattern, or a nested vector pattern.
fn is_pattern_element(node: &Ast) -> bool {
    match node {
        Ast::Symbol { .. } => true,
        Ast::Vector { .. } => could_be_pattern(node),
        Ast::List { elements, .. } => is_default_form(elements),
        _ => false,
    }
}

/// `(= default)`-shaped sub-pattern: exactly two elements, head is the `=`
/// symbol, and the rest is any expression (the default value is not itself
/// constrained to be pattern-shaped).
fn is_default_form(elements: &[Ast]) -> bool {
    if elements.len() != 2 {
        return false;
    }
    matches!(elements[0].as_symbol(), Some(s) if s.as_str() == "=")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use hql_lex::Lexer;
    use hql_util::{FileId, Handler};

    fn parse_one(src: &str) -> Ast {
        let handler = Handler::new();
        let tokens = Lexer::new(src, FileId::DUMMY, &handler).tokenize();
        let mut parser = Parser::new(tokens, FileId::DUMMY, &handler);
        let forms = parser.parse_program();
        forms.into_iter().next().unwrap()
    }

    #[test]
    fn empty_vector_is_pattern() {
        assert!(could_be_pattern(&parse_one("[]")));
    }

    #[test]
    fn plain_identifiers_are_pattern() {
        assert!(could_be_pattern(&parse_one("[x y z]")));
    }

    #[test]
    fn rest_and_default_and_nested() {
        assert!(could_be_pattern(&parse_one("[[x (= 10) y] & rest]")));
    }

    #[test]
    fn literal_disqualifies() {
        assert!(!could_be_pattern(&parse_one("[1 2 3]")));
    }

    #[test]
    fn call_shaped_element_disqualifies() {
        assert!(!could_be_pattern(&parse_one("[(foo bar)]")));
    }

    #[test]
    fn rest_marker_must_be_second_to_last() {
        assert!(!could_be_pattern(&parse_one("[x & rest y]")));
    }
}
