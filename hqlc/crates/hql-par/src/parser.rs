//! Recursive-descent parser building the S-expression AST (spec.md 4.2).
//!
//! The parser is a pure function of `(token stream, file_id) -> (forms,
//! errors)`: it does not perform I/O and does not consult the macro
//! environment or symbol table — those belong to later stages.

use hql_lex::{TemplateSegment, Token, TokenKind};
use hql_util::{FileId, Handler, Span};

use crate::ast::{Ast, Literal};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    file_id: FileId,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, file_id: FileId, handler: &'a Handler) -> Self {
        // Comments carry no syntactic weight once past the lexer.
        let tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.is_comment()).collect();
        Self {
            tokens,
            pos: 0,
            file_id,
            handler,
        }
    }

    /// Parses every top-level form until `Eof`.
    pub fn parse_program(&mut self) -> Vec<Ast> {
        let mut forms = Vec::new();
        while !self.at_eof() {
            match self.parse_form() {
                Some(form) => forms.push(form),
                None => {
                    if !self.at_eof() {
                        self.advance();
                    }
                }
            }
        }
        forms
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, message: impl Into<String>, span: Span) {
        self.handler.error(message, span);
    }

    /// Parses one form, or `None` if the current token cannot start a form
    /// (an unexpected closing delimiter or a dropped `#_` form).
    fn parse_form(&mut self) -> Option<Ast> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::LeftParen => Some(self.parse_seq(TokenKind::RightParen, "list", |elements, pos| {
                Ast::List { elements, pos }
            })),
            TokenKind::LeftBracket => {
                Some(self.parse_seq(TokenKind::RightBracket, "vector", |elements, pos| {
                    Ast::Vector { elements, pos }
                }))
            }
            TokenKind::LeftBrace => Some(self.parse_map(tok.span)),
            TokenKind::HashBrace => Some(self.parse_set(tok.span)),
            TokenKind::Quote => Some(self.parse_quote_family("quote", tok.span)),
            TokenKind::Quasiquote => Some(self.parse_quote_family("quasiquote", tok.span)),
            TokenKind::Unquote => Some(self.parse_quote_family("unquote", tok.span)),
            TokenKind::UnquoteSplice => Some(self.parse_quote_family("unquote-splice", tok.span)),
            TokenKind::Discard => {
                self.advance();
                // Drop exactly one following form, then yield whatever
                // comes after it (if anything) to the caller.
                self.parse_form();
                self.parse_form()
            }
            TokenKind::Number(n) => {
                self.advance();
                Some(Ast::Literal {
                    value: Literal::Number(n),
                    pos: tok.span,
                })
            }
            TokenKind::String(s) => {
                self.advance();
                Some(Ast::Literal {
                    value: Literal::String(s),
                    pos: tok.span,
                })
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Some(Ast::Literal {
                    value: Literal::Boolean(b),
                    pos: tok.span,
                })
            }
            TokenKind::Nil => {
                self.advance();
                Some(Ast::Literal {
                    value: Literal::Nil,
                    pos: tok.span,
                })
            }
            TokenKind::Symbol(name) => {
                self.advance();
                Some(Ast::Symbol { name, pos: tok.span })
            }
            TokenKind::Keyword(name) => {
                self.advance();
                // Keywords are self-evaluating symbols of the form `:name`;
                // represented as a symbol whose name retains the colon so
                // later stages can tell keywords and plain symbols apart.
                let text = format!(":{}", name.as_str());
                Some(Ast::Symbol {
                    name: hql_util::Symbol::intern(&text),
                    pos: tok.span,
                })
            }
            TokenKind::BacktickTemplate(segments) => {
                self.advance();
                Some(self.build_template_literal(segments, tok.span))
            }
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                self.error("unexpected closing delimiter", tok.span);
                self.advance();
                None
            }
            TokenKind::Eof => None,
            TokenKind::Comment(_) => {
                self.advance();
                self.parse_form()
            }
        }
    }

    fn parse_seq(
        &mut self,
        close: TokenKind,
        what: &str,
        build: impl FnOnce(Vec<Ast>, Span) -> Ast,
    ) -> Ast {
        let start = self.current().span;
        self.advance(); // opener
        let mut elements = Vec::new();
        loop {
            if self.at_eof() {
                self.error(format!("unterminated {what}: missing closing delimiter"), start);
                break;
            }
            if std::mem::discriminant(&self.current().kind) == std::mem::discriminant(&close) {
                self.advance();
                break;
            }
            if let Some(el) = self.parse_form() {
                elements.push(el);
            }
        }
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        build(elements, Span::with_file(start.start, end.end, self.file_id, start.line, start.column))
    }

    fn parse_map(&mut self, start: Span) -> Ast {
        self.advance(); // '{'
        let mut flat = Vec::new();
        loop {
            if self.at_eof() {
                self.error("unterminated map: missing closing delimiter", start);
                break;
            }
            if matches!(self.current().kind, TokenKind::RightBrace) {
                self.advance();
                break;
            }
            if let Some(el) = self.parse_form() {
                flat.push(el);
            }
        }
        if flat.len() % 2 != 0 {
            self.error("malformed map literal: odd number of entries", start);
            flat.pop();
        }
        let mut entries = Vec::with_capacity(flat.len() / 2);
        let mut it = flat.into_iter();
        while let (Some(k), Some(v)) = (it.next(), it.next()) {
            entries.push((k, v));
        }
        Ast::Map { entries, pos: start }
    }

    fn parse_set(&mut self, start: Span) -> Ast {
        self.advance(); // '#{'
        let mut elements = Vec::new();
        loop {
            if self.at_eof() {
                self.error("unterminated set: missing closing delimiter", start);
                break;
            }
            if matches!(self.current().kind, TokenKind::RightBrace) {
                self.advance();
                break;
            }
            if let Some(el) = self.parse_form() {
                elements.push(el);
            }
        }
        Ast::Set { elements, pos: start }
    }

    fn parse_quote_family(&mut self, head: &str, start: Span) -> Ast {
        self.advance(); // the reader-macro token itself
        match self.parse_form() {
            Some(inner) => Ast::tagged_list(head, vec![inner], start),
            None => {
                self.error(format!("expected a form after '{head}' reader macro"), start);
                Ast::tagged_list(head, vec![Ast::Literal { value: Literal::Nil, pos: start }], start)
            }
        }
    }

    /// `` `text ${expr} more` `` lexes to one `BacktickTemplate` token whose
    /// `Expr` segments are themselves token streams; each is parsed here as
    /// a nested form. The resulting node is `(template-literal seg...)`
    /// where each segment is either a string literal or a parsed sub-form.
    fn build_template_literal(&self, segments: Vec<TemplateSegment>, pos: Span) -> Ast {
        let mut elements = vec![Ast::symbol("template-literal", pos)];
        for seg in segments {
            match seg {
                TemplateSegment::Literal(text) => elements.push(Ast::string(&text, pos)),
                TemplateSegment::Expr(tokens) => {
                    let mut sub = Parser::new(tokens, self.file_id, self.handler);
                    let forms = sub.parse_program();
                    match forms.into_iter().next() {
                        Some(form) => elements.push(form),
                        None => elements.push(Ast::Literal {
                            value: Literal::Nil,
                            pos,
                        }),
                    }
                }
            }
        }
        Ast::List { elements, pos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_lex::Lexer;

    fn parse(src: &str) -> Vec<Ast> {
        let handler = Handler::new();
        let tokens = Lexer::new(src, FileId::DUMMY, &handler).tokenize();
        let mut parser = Parser::new(tokens, FileId::DUMMY, &handler);
        parser.parse_program()
    }

    #[test]
    fn parses_arithmetic_list() {
        let forms = parse("(+ (* 2 3) (- 10 5))");
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].head_symbol().unwrap().as_str(), "+");
    }

    #[test]
    fn parses_vector_and_map_and_set() {
        let forms = parse("[1 2 3] {:a 1 :b 2} #{1 2 3}");
        assert_eq!(forms.len(), 3);
        assert!(matches!(forms[0], Ast::Vector { .. }));
        match &forms[1] {
            Ast::Map { entries, .. } => assert_eq!(entries.len(), 2),
            other => panic!("expected map, got {:?}", other),
        }
        assert!(matches!(forms[2], Ast::Set { .. }));
    }

    #[test]
    fn odd_map_is_diagnosed() {
        let handler = Handler::new();
        let tokens = Lexer::new("{:a 1 :b}", FileId::DUMMY, &handler).tokenize();
        let mut parser = Parser::new(tokens, FileId::DUMMY, &handler);
        parser.parse_program();
        assert!(handler.has_errors());
    }

    #[test]
    fn quote_family_wraps_next_form() {
        let forms = parse("'x `(a ,b ,@c)");
        assert_eq!(forms[0].head_symbol().unwrap().as_str(), "quote");
        assert_eq!(forms[1].head_symbol().unwrap().as_str(), "quasiquote");
    }

    #[test]
    fn discard_drops_next_form() {
        let forms = parse("(+ 1 #_ 2 3)");
        let elements = forms[0].as_list().unwrap();
        // head `+`, 1, 3 -- the discarded 2 never appears.
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn template_literal_expands_to_tagged_list() {
        let forms = parse("`a${1}b`");
        let elements = forms[0].as_list().unwrap();
        assert_eq!(elements[0].as_symbol().unwrap().as_str(), "template-literal");
        assert_eq!(elements.len(), 4); // head, "a", 1, "b"
    }

    #[test]
    fn unterminated_list_reports_and_recovers() {
        let handler = Handler::new();
        let tokens = Lexer::new("(foo (bar)", FileId::DUMMY, &handler).tokenize();
        let mut parser = Parser::new(tokens, FileId::DUMMY, &handler);
        parser.parse_program();
        assert!(handler.has_errors());
    }
}
