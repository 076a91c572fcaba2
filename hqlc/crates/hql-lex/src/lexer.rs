//! Main lexer implementation for HQL.
//!
//! HQL source is tokenized with a direct-coded, single-pass scanner: each
//! token family (numbers, strings, identifiers/keywords, templates, the
//! quote-reader-macro family) gets its own dispatch arm off the first
//! character, mirroring the teacher's one-function-per-token-family shape.

use hql_util::{FileId, Handler, Span, Symbol};

use crate::cursor::Cursor;
use crate::token::{TemplateSegment, Token, TokenKind};
use crate::unicode::{parse_hex_byte, parse_hex_codepoint};

/// Characters allowed inside an HQL identifier besides alphanumerics.
/// Per spec.md 4.1: operators are identifiers by form, so this set also
/// covers every operator character.
const IDENT_EXTRA: &[char] = &[
    '-', '_', '?', '!', '*', '/', '%', '+', '<', '>', '=', '&', '|', '^', '~',
];

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || IDENT_EXTRA.contains(&c)
}

fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\'' | '`' | ',' | ';'
    ) || c.is_whitespace()
}

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    file_id: FileId,
    handler: &'a Handler,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file_id: FileId, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            file_id,
            handler,
        }
    }

    /// Tokenizes the entire source, returning every token including comments
    /// and a trailing `Eof`. Comment tokens are retained here (tooling, such
    /// as an LSP, wants them); `hql-par` filters them when building the AST.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn span(&self, start: usize, start_line: u32, start_col: u32) -> Span {
        Span::with_file(start, self.cursor.position(), self.file_id, start_line, start_col)
    }

    fn error(&self, message: impl Into<String>, span: Span) {
        self.handler.error(message, span);
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_insignificant_whitespace();

        let start = self.cursor.position();
        let start_line = self.cursor.line();
        let start_col = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::new(TokenKind::Eof, self.span(start, start_line, start_col));
        }

        let c = self.cursor.current_char();
        let kind = match c {
            '(' => {
                self.cursor.advance();
                TokenKind::LeftParen
            }
            ')' => {
                self.cursor.advance();
                TokenKind::RightParen
            }
            '[' => {
                self.cursor.advance();
                TokenKind::LeftBracket
            }
            ']' => {
                self.cursor.advance();
                TokenKind::RightBracket
            }
            '{' => {
                self.cursor.advance();
                TokenKind::LeftBrace
            }
            '}' => {
                self.cursor.advance();
                TokenKind::RightBrace
            }
            ';' => return self.lex_comment(start, start_line, start_col),
            '\'' => {
                self.cursor.advance();
                TokenKind::Quote
            }
            // Backtick is overloaded, as in the source language: immediately
            // followed by a list opener it is the quasiquote reader macro
            // (macros quasiquote lists almost exclusively); otherwise it
            // opens a JS-style template literal run up to the next backtick.
            '`' if self.cursor.peek_char(1) == '(' => {
                self.cursor.advance();
                TokenKind::Quasiquote
            }
            '`' => return self.lex_template(start, start_line, start_col),
            ',' => {
                self.cursor.advance();
                if self.cursor.match_char('@') {
                    TokenKind::UnquoteSplice
                } else {
                    TokenKind::Unquote
                }
            }
            '#' => return self.lex_hash(start, start_line, start_col),
            '"' => return self.lex_string(start, start_line, start_col),
            ':' => return self.lex_keyword(start, start_line, start_col),
            c if c.is_ascii_digit() => return self.lex_number(start, start_line, start_col),
            '+' | '-' if self.cursor.peek_char(1).is_ascii_digit() => {
                return self.lex_number(start, start_line, start_col)
            }
            c if is_ident_char(c) => return self.lex_identifier(start, start_line, start_col),
            c => {
                self.error(
                    format!("unexpected character '{}'", c),
                    self.span(start, start_line, start_col),
                );
                self.cursor.advance();
                TokenKind::Comment(Symbol::intern(""))
            }
        };

        Token::new(kind, self.span(start, start_line, start_col))
    }

    /// Skips whitespace only; comments are returned as tokens by
    /// `next_token` rather than silently discarded here.
    fn skip_insignificant_whitespace(&mut self) {
        self.cursor.skip_whitespace();
    }

    fn lex_comment(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        // `;` and `;;` both extend to end of line; the doubling is purely
        // convention, not a distinct token kind (spec.md 4.1).
        while self.cursor.current_char() == ';' {
            self.cursor.advance();
        }
        let text_start = self.cursor.position();
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(text_start).to_string();
        Token::new(
            TokenKind::Comment(Symbol::intern(&text)),
            self.span(start, start_line, start_col),
        )
    }

    fn lex_hash(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        self.cursor.advance(); // '#'
        let kind = match self.cursor.current_char() {
            '{' => {
                self.cursor.advance();
                TokenKind::HashBrace
            }
            '_' => {
                self.cursor.advance();
                TokenKind::Discard
            }
            c => {
                self.error(
                    format!("invalid dispatch macro '#{}'", c),
                    self.span(start, start_line, start_col),
                );
                TokenKind::Discard
            }
        };
        Token::new(kind, self.span(start, start_line, start_col))
    }

    fn lex_keyword(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        self.cursor.advance(); // ':'
        let text_start = self.cursor.position();
        while !self.cursor.is_at_end() && is_ident_char(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let name = self.cursor.slice_from(text_start).to_string();
        Token::new(
            TokenKind::Keyword(Symbol::intern(&name)),
            self.span(start, start_line, start_col),
        )
    }

    fn lex_identifier(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        while !self.cursor.is_at_end() && is_ident_char(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let kind = match text {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "nil" | "null" => TokenKind::Nil,
            _ => TokenKind::Symbol(Symbol::intern(text)),
        };
        Token::new(kind, self.span(start, start_line, start_col))
    }

    /// Numbers admit an optional leading sign, a decimal point, and an
    /// exponent. A leading `-` on the whole run negates the parsed value.
    fn lex_number(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        if matches!(self.cursor.current_char(), '+' | '-') {
            self.cursor.advance();
        }
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        if matches!(self.cursor.current_char(), 'e' | 'E') {
            let mark = self.cursor.snapshot();
            self.cursor.advance();
            if matches!(self.cursor.current_char(), '+' | '-') {
                self.cursor.advance();
            }
            if self.cursor.current_char().is_ascii_digit() {
                while self.cursor.current_char().is_ascii_digit() {
                    self.cursor.advance();
                }
            } else {
                self.cursor.restore(mark);
            }
        }
        // Swallow any trailing identifier-like run so a malformed number like
        // `1abc` becomes one diagnosed token rather than `1` then `abc`.
        let text = self.cursor.slice_from(start);
        let span = self.span(start, start_line, start_col);
        match text.parse::<f64>() {
            Ok(value) => Token::new(TokenKind::Number(value), span),
            Err(_) => {
                self.error(format!("invalid number literal '{}'", text), span);
                Token::new(TokenKind::Number(0.0), span)
            }
        }
    }

    fn lex_string(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        self.cursor.advance(); // opening quote
        let mut value = String::new();
        loop {
            if self.cursor.is_at_end() {
                self.error(
                    "unterminated string literal",
                    self.span(start, start_line, start_col),
                );
                break;
            }
            match self.cursor.current_char() {
                '"' => {
                    self.cursor.advance();
                    break;
                }
                '\\' => {
                    self.cursor.advance();
                    match self.lex_escape(start, start_line, start_col) {
                        Some(c) => value.push(c),
                        None => {}
                    }
                }
                c => {
                    value.push(c);
                    self.cursor.advance();
                }
            }
        }
        Token::new(
            TokenKind::String(Symbol::intern(&value)),
            self.span(start, start_line, start_col),
        )
    }

    fn lex_escape(&mut self, start: usize, start_line: u32, start_col: u32) -> Option<char> {
        let c = self.cursor.current_char();
        let result = match c {
            'n' => {
                self.cursor.advance();
                Some('\n')
            }
            't' => {
                self.cursor.advance();
                Some('\t')
            }
            'r' => {
                self.cursor.advance();
                Some('\r')
            }
            '\\' => {
                self.cursor.advance();
                Some('\\')
            }
            '"' => {
                self.cursor.advance();
                Some('"')
            }
            '`' => {
                self.cursor.advance();
                Some('`')
            }
            'x' => {
                self.cursor.advance();
                let hex: String = (0..2).map(|i| self.cursor.peek_char(i)).collect();
                self.cursor.advance_n(2);
                parse_hex_byte(&hex).map(|b| b as char)
            }
            'u' => {
                self.cursor.advance();
                let hex: String = (0..4).map(|i| self.cursor.peek_char(i)).collect();
                self.cursor.advance_n(4);
                parse_hex_codepoint(&hex).and_then(char::from_u32)
            }
            other => {
                self.cursor.advance();
                Some(other)
            }
        };
        if result.is_none() {
            self.error(
                "invalid escape sequence",
                self.span(start, start_line, start_col),
            );
        }
        result
    }

    /// Backtick template literals: `` `text ${expr} more` `` lexes to a
    /// single `BacktickTemplate` token carrying alternating literal/expr
    /// segments. Each `${...}` body is recursively tokenized.
    fn lex_template(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        self.cursor.advance(); // opening backtick
        let mut segments = Vec::new();
        let mut literal = String::new();
        loop {
            if self.cursor.is_at_end() {
                self.error(
                    "unterminated template literal",
                    self.span(start, start_line, start_col),
                );
                break;
            }
            match self.cursor.current_char() {
                '`' => {
                    self.cursor.advance();
                    break;
                }
                '\\' => {
                    self.cursor.advance();
                    if let Some(c) = self.lex_escape(start, start_line, start_col) {
                        literal.push(c);
                    }
                }
                '$' if self.cursor.peek_char(1) == '{' => {
                    if !literal.is_empty() {
                        segments.push(TemplateSegment::Literal(std::mem::take(&mut literal)));
                    }
                    self.cursor.advance(); // '$'
                    self.cursor.advance(); // '{'
                    let mut depth = 1usize;
                    let expr_start = self.cursor.position();
                    while depth > 0 && !self.cursor.is_at_end() {
                        match self.cursor.current_char() {
                            '{' => depth += 1,
                            '}' => depth -= 1,
                            _ => {}
                        }
                        if depth > 0 {
                            self.cursor.advance();
                        }
                    }
                    let expr_src = self.cursor.slice_from(expr_start).to_string();
                    self.cursor.advance(); // closing '}'
                    let mut sub = Lexer::new(&expr_src, self.file_id, self.handler);
                    segments.push(TemplateSegment::Expr(sub.tokenize()));
                }
                c => {
                    literal.push(c);
                    self.cursor.advance();
                }
            }
        }
        if !literal.is_empty() || segments.is_empty() {
            segments.push(TemplateSegment::Literal(literal));
        }
        Token::new(
            TokenKind::BacktickTemplate(segments),
            self.span(start, start_line, start_col),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        let handler = Handler::new();
        let lexer = Lexer::new(src, FileId::DUMMY, &handler);
        lexer
            .tokenize()
            .into_iter()
            .filter(|t| !t.is_comment())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_list_of_symbols() {
        let kinds = lex("(+ 1 2)");
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftParen,
                TokenKind::Symbol(Symbol::intern("+")),
                TokenKind::Number(1.0),
                TokenKind::Number(2.0),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn negative_number_vs_operator() {
        let kinds = lex("(- -5 x)");
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftParen,
                TokenKind::Symbol(Symbol::intern("-")),
                TokenKind::Number(-5.0),
                TokenKind::Symbol(Symbol::intern("x")),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_keyword_and_quote_family() {
        let kinds = lex("':foo `(,@x)");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Quote,
                TokenKind::Keyword(Symbol::intern("foo")),
                TokenKind::Quasiquote,
                TokenKind::LeftParen,
                TokenKind::UnquoteSplice,
                TokenKind::Symbol(Symbol::intern("x")),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_with_escapes() {
        let kinds = lex(r#""a\nb\x41""#);
        match &kinds[0] {
            TokenKind::String(s) => assert_eq!(s.as_str(), "a\nbA"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn lexes_set_and_discard_dispatch() {
        let kinds = lex("#{1 2} #_ 3 4");
        assert_eq!(kinds[0], TokenKind::HashBrace);
        assert!(kinds.iter().any(|k| *k == TokenKind::Discard));
    }

    #[test]
    fn lexes_template_with_interpolation() {
        let kinds = lex("`a${1}b`");
        match &kinds[0] {
            TokenKind::BacktickTemplate(segments) => {
                assert_eq!(segments.len(), 3);
                assert_eq!(segments[0], TemplateSegment::Literal("a".to_string()));
                assert!(matches!(segments[1], TemplateSegment::Expr(_)));
                assert_eq!(segments[2], TemplateSegment::Literal("b".to_string()));
            }
            other => panic!("expected template, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_reports_error() {
        let handler = Handler::new();
        let lexer = Lexer::new("\"abc", FileId::DUMMY, &handler);
        let _ = lexer.tokenize();
        assert!(handler.has_errors());
    }

    #[test]
    fn line_comments_both_single_and_double_semicolon() {
        let kinds = lex("1 ; one\n;; two\n2");
        assert_eq!(kinds, vec![TokenKind::Number(1.0), TokenKind::Number(2.0), TokenKind::Eof]);
    }
}
