//! Token definitions for type and descriptor signatures.

use logos::Logos;
use smol_str::SmolStr;

/// A token with its kind and span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: std::ops::Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, span: std::ops::Range<usize>) -> Self {
        Self { kind, span }
    }
}

/// Token kinds for type expressions, multiplicities and function descriptors.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| SmolStr::new(lex.slice()))]
    Ident(SmolStr),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u32>().ok())]
    Int(u32),

    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token("..")]
    DotDot,
    #[token("->")]
    Arrow,
    #[token("*")]
    Star,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    /// Contravariance marker on a type parameter (`-T`).
    #[token("-")]
    Minus,
    #[token("@")]
    At,
    #[token("%")]
    Percent,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Int(value) => write!(f, "integer {value}"),
            TokenKind::ColonColon => f.write_str("'::'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::DotDot => f.write_str("'..'"),
            TokenKind::Arrow => f.write_str("'->'"),
            TokenKind::Star => f.write_str("'*'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Pipe => f.write_str("'|'"),
            TokenKind::Lt => f.write_str("'<'"),
            TokenKind::Gt => f.write_str("'>'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::At => f.write_str("'@'"),
            TokenKind::Percent => f.write_str("'%'"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}
