//! Tokenizer for the prefix syntax of game descriptions.

use logos::Logos;

use crate::error::{Error, Result};

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"([ \t\r\n\f]+|;[^\n]*)")] // whitespace and `;` line comments
pub enum Token {
    #[token("(")]
    Open,

    #[token(")")]
    Close,

    #[token("<=")]
    Arrow,

    #[regex(r"\?[^ \t\r\n\f();]+")]
    Var,

    // Identifiers and numerals share one class; `<=` wins on equal length.
    #[regex(r"[^ \t\r\n\f();?]+")]
    Ident,
}

/// A token with its source slice and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'s> {
    pub token: Token,
    pub text: &'s str,
    pub offset: usize,
}

/// Split `source` into lexemes, failing on the first unrecognised input.
pub fn tokenize(source: &str) -> Result<Vec<Lexeme<'_>>> {
    let mut lex = Token::lexer(source);
    let mut out = Vec::new();
    while let Some(token) = lex.next() {
        let span = lex.span();
        match token {
            Ok(token) => out.push(Lexeme {
                token,
                text: lex.slice(),
                offset: span.start,
            }),
            Err(()) => {
                return Err(Error::parse("unrecognised input", source, span.start));
            }
        }
    }
    Ok(out)
}
