//! hql-par — builds the S-expression AST from an `hql-lex` token stream
//! (spec.md section 4.2).
//!
//! Recognizes `(...)` lists, `[...]` vectors, `{...}` maps, `#{...}` sets,
//! the quote-family reader macros, backtick template literals, and `#_`
//! form-discarding. [`pattern::could_be_pattern`] classifies a `Vector`
//! node as array literal vs. destructuring pattern — a decision the parser
//! itself does not need to make, since both parse to the same node shape.

mod ast;
mod parser;
mod pattern;

pub use ast::{Ast, Forms, Literal};
pub use parser::Parser;
pub use pattern::could_be_pattern;

/// Parses `source` (attributed to `file_id`) into top-level forms,
/// reporting lex and parse errors through `handler`.
pub fn parse(source: &str, file_id: hql_util::FileId, handler: &hql_util::Handler) -> Forms {
    let tokens = hql_lex::Lexer::new(source, file_id, handler).tokenize();
    Parser::new(tokens, file_id, handler).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_util::{FileId, Handler};

    #[test]
    fn parses_a_small_program() {
        let handler = Handler::new();
        let forms = parse("(defn add [a b] (+ a b))", FileId::DUMMY, &handler);
        assert!(!handler.has_errors());
        assert_eq!(forms.len(), 1);
    }
}
