//! Character-level tokenizer producing the flat token stream consumed by the parser.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, satisfy},
    combinator::{opt, recognize, value},
    sequence::pair,
};

/// Message carried by the single `Error` token produced for unbalanced input
pub const MISMATCHED_PARENS: &str = "Mismatched Parentheses";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    Symbol,
    /// Integer literal
    Number,
    /// Literal containing a decimal point
    RealNum,
    Error,
}

/// A token together with its source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub text: String,
}

impl Lexeme {
    pub fn new(token: Token, text: impl Into<String>) -> Self {
        Lexeme {
            token,
            text: text.into(),
        }
    }
}

fn lex_paren(input: &str) -> IResult<&str, Token> {
    alt((value(Token::LParen, char('(')), value(Token::RParen, char(')')))).parse(input)
}

/// Digits and dots, optionally preceded by a minus sign directly followed by a digit
fn lex_number(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(char('-')),
        pair(digit1, take_while(|c: char| c.is_ascii_digit() || c == '.')),
    ))
    .parse(input)
}

/// A letter followed by letters, digits, `-` and `?`
fn lex_word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '?'),
    ))
    .parse(input)
}

/// `..` or any other single non-space character
fn lex_special(input: &str) -> IResult<&str, &str> {
    alt((
        tag(".."),
        recognize(satisfy(|c: char| !c.is_whitespace() && c != '(' && c != ')')),
    ))
    .parse(input)
}

fn lex_one(input: &str) -> IResult<&str, Lexeme> {
    if let Ok((rest, token)) = lex_paren(input) {
        let text = if token == Token::LParen { "(" } else { ")" };
        return Ok((rest, Lexeme::new(token, text)));
    }
    if let Ok((rest, text)) = lex_number(input) {
        let token = if text.contains('.') {
            Token::RealNum
        } else {
            Token::Number
        };
        return Ok((rest, Lexeme::new(token, text)));
    }
    let (rest, text) = alt((lex_word, lex_special)).parse(input)?;
    Ok((rest, Lexeme::new(Token::Symbol, text)))
}

fn mismatched() -> Vec<Lexeme> {
    log::warn!("{MISMATCHED_PARENS}");
    vec![Lexeme::new(Token::Error, MISMATCHED_PARENS)]
}

/// Split `input` into lexemes.
///
/// Unbalanced parentheses abort lexing: the whole result is replaced by a single
/// `Error` lexeme.
pub fn tokenize(input: &str) -> Vec<Lexeme> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let (next, lexeme) = match lex_one(rest) {
            Ok(parsed) => parsed,
            Err(_) => {
                let near: String = rest.chars().take(10).collect();
                return vec![Lexeme::new(
                    Token::Error,
                    format!("Unrecognized input near '{near}'"),
                )];
            }
        };
        match lexeme.token {
            Token::LParen => depth += 1,
            Token::RParen => {
                if depth == 0 {
                    return mismatched();
                }
                depth -= 1;
            }
            _ => {}
        }
        tokens.push(lexeme);
        rest = next.trim_start();
    }

    if depth != 0 {
        return mismatched();
    }
    tokens
}
