//! High-level lexer interface.

use crate::error::ParseError;
use crate::token::{Token, TokenKind};
use logos::Logos;

/// A lexer for signature text.
///
/// Wraps the logos-generated lexer and always yields a trailing `Eof` token.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, TokenKind>,
    peeked: Option<Result<Token, ParseError>>,
    done: bool,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given text.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            peeked: None,
            done: false,
        }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Option<&Result<Token, ParseError>> {
        if self.peeked.is_none() {
            self.peeked = self.next_inner();
        }
        self.peeked.as_ref()
    }

    pub fn source(&self) -> &'source str {
        self.inner.source()
    }

    fn next_inner(&mut self) -> Option<Result<Token, ParseError>> {
        match self.inner.next() {
            Some(Ok(kind)) => Some(Ok(Token::new(kind, self.inner.span()))),
            Some(Err(())) => Some(Err(ParseError::InvalidCharacter {
                span: self.inner.span(),
            })),
            None if !self.done => {
                self.done = true;
                let pos = self.inner.span().end;
                Some(Ok(Token::new(TokenKind::Eof, pos..pos)))
            }
            None => None,
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(peeked) = self.peeked.take() {
            return Some(peeked);
        }
        self.next_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;

    #[test]
    fn test_descriptor_tokens() {
        let tokens: Vec<_> = Lexer::new("pkg::func(String[1]):T[0..*]")
            .filter_map(|r| r.ok())
            .map(|t| t.kind)
            .collect();

        assert_eq!(tokens[0], TokenKind::Ident(SmolStr::from("pkg")));
        assert_eq!(tokens[1], TokenKind::ColonColon);
        assert_eq!(tokens[3], TokenKind::LParen);
        assert_eq!(tokens[6], TokenKind::Int(1));
        assert_eq!(tokens[9], TokenKind::Colon);
        assert_eq!(tokens[12], TokenKind::Int(0));
        assert_eq!(tokens[13], TokenKind::DotDot);
        assert_eq!(tokens[14], TokenKind::Star);
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_arrow_is_not_minus() {
        let tokens: Vec<_> = Lexer::new("{-> -T}")
            .filter_map(|r| r.ok())
            .map(|t| t.kind)
            .collect();

        assert_eq!(tokens[1], TokenKind::Arrow);
        assert_eq!(tokens[2], TokenKind::Minus);
    }

    #[test]
    fn test_invalid_character() {
        let mut lexer = Lexer::new("a#b");
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(
            lexer.next(),
            Some(Err(ParseError::InvalidCharacter { .. }))
        ));
    }

    #[test]
    fn test_dollar_identifiers() {
        let tokens: Vec<_> = Lexer::new("p$__$valid")
            .filter_map(|r| r.ok())
            .map(|t| t.kind)
            .collect();
        assert_eq!(tokens[0], TokenKind::Ident(SmolStr::from("p$__$valid")));
    }
}
