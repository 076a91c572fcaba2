//! hql-lex — Lexical analysis for HQL source text.
//!
//! Transforms a UTF-8 source buffer into a finite token stream per spec.md
//! section 4.1: an ordered sequence of [`Token`]s terminated by an implicit
//! `Eof`, plus diagnostics accumulated through a shared [`hql_util::Handler`].
//!
//! Whitespace is insignificant except as a delimiter. Line comments begin
//! with `;` (or `;;`, by convention only) and extend to end of line.
//! Numbers, keywords (`:name`), identifiers (including operator-shaped
//! identifiers such as `+` or `<=`), strings with standard escapes, and
//! backtick template literals are all recognized here; see [`Lexer`] for the
//! full classification rules.

mod cursor;
mod lexer;
mod token;
mod unicode;

pub use cursor::{Cursor, CursorSnapshot};
pub use lexer::Lexer;
pub use token::{TemplateSegment, Token, TokenKind};
pub use unicode::*;

/// Convenience entry point: lex `source` (attributed to `file_id`) into a
/// token stream, filtering out comment tokens. Diagnostics are reported
/// through `handler`.
pub fn lex(source: &str, file_id: hql_util::FileId, handler: &hql_util::Handler) -> Vec<Token> {
    Lexer::new(source, file_id, handler)
        .tokenize()
        .into_iter()
        .filter(|t| !t.is_comment())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_util::{FileId, Handler};

    #[test]
    fn lex_filters_comments() {
        let handler = Handler::new();
        let tokens = lex("; hi\n(foo)", FileId::DUMMY, &handler);
        assert!(tokens.iter().all(|t| !t.is_comment()));
        assert_eq!(tokens.len(), 4); // ( foo ) Eof
    }
}
