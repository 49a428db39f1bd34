//! Token stream to expression parser.
//!
//! Parenthesised forms become nested [`Object::List`]s, `true`/`false` become booleans
//! and `'expr` is shorthand for `(' expr)`. A `'` directly after `(` is the quote
//! form's own name and is kept as a symbol.

use crate::lexer::{Lexeme, Token, tokenize};
use crate::list::List;
use crate::object::Object;
use crate::{Error, MAX_PARSE_DEPTH};

/// Name of the quote shorthand symbol
pub const QUOTE_SYMBOL: &str = "'";

/// Parser options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseConfig {
    /// Wrap a bare top-level atom into `(' atom)` before it reaches the evaluator
    pub quote_bare_atoms: bool,
}

struct TokenStream<'a> {
    tokens: &'a [Lexeme],
    pos: usize,
}

impl<'a> TokenStream<'a> {
    fn peek(&self) -> Option<&'a Lexeme> {
        self.tokens.get(self.pos)
    }

    fn next_lexeme(&mut self) -> Option<&'a Lexeme> {
        let lexeme = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(lexeme)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn expression(&mut self, depth: usize) -> Result<Object, Error> {
        if depth >= MAX_PARSE_DEPTH {
            return Err(Error::SyntaxError(format!(
                "expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"
            )));
        }
        let Some(lexeme) = self.next_lexeme() else {
            return Err(Error::SyntaxError("unexpected end of input".into()));
        };

        match lexeme.token {
            Token::LParen => self.list(depth),
            Token::RParen => Err(Error::SyntaxError("unexpected ')'".into())),
            Token::Symbol if lexeme.text == QUOTE_SYMBOL => {
                let quoted = self.expression(depth + 1)?;
                Ok(quote(quoted))
            }
            Token::Symbol => Ok(Object::symbol(&lexeme.text)),
            Token::Number => lexeme.text.parse::<i64>().map(Object::Int).map_err(|_| {
                Error::SyntaxError(format!("invalid integer literal '{}'", lexeme.text))
            }),
            Token::RealNum => lexeme.text.parse::<f64>().map(Object::Real).map_err(|_| {
                Error::SyntaxError(format!("invalid real literal '{}'", lexeme.text))
            }),
            Token::Error => Err(Error::SyntaxError(lexeme.text.clone())),
        }
    }

    /// Elements up to the matching `)`; the `(` is already consumed
    fn list(&mut self, depth: usize) -> Result<Object, Error> {
        let mut items = List::new();
        loop {
            match self.peek() {
                None => return Err(Error::SyntaxError("unexpected end of input".into())),
                Some(lexeme) if lexeme.token == Token::RParen => {
                    self.pos += 1;
                    return Ok(Object::List(items));
                }
                Some(lexeme)
                    if items.is_empty()
                        && lexeme.token == Token::Symbol
                        && lexeme.text == QUOTE_SYMBOL =>
                {
                    self.pos += 1;
                    items.append(Object::symbol(QUOTE_SYMBOL));
                }
                Some(_) => items.append(self.expression(depth + 1)?),
            }
        }
    }
}

fn quote(expr: Object) -> Object {
    Object::List([Object::symbol(QUOTE_SYMBOL), expr].into_iter().collect())
}

fn check_lexer_error(tokens: &[Lexeme]) -> Result<(), Error> {
    match tokens.iter().find(|lexeme| lexeme.token == Token::Error) {
        Some(lexeme) => Err(Error::SyntaxError(lexeme.text.clone())),
        None => Ok(()),
    }
}

/// Parse exactly one expression from a token stream
pub fn parse_tokens(tokens: &[Lexeme], config: ParseConfig) -> Result<Object, Error> {
    check_lexer_error(tokens)?;
    let mut stream = TokenStream { tokens, pos: 0 };
    let expr = stream.expression(0)?;

    if let Some(extra) = stream.peek() {
        return Err(Error::SyntaxError(format!(
            "unexpected input after expression: '{}'",
            extra.text
        )));
    }

    if config.quote_bare_atoms && !matches!(expr, Object::List(_)) {
        return Ok(quote(expr));
    }
    Ok(expr)
}

/// Parse a single expression from text
pub fn parse(input: &str) -> Result<Object, Error> {
    parse_with_config(input, ParseConfig::default())
}

/// Parse a single expression from text with explicit options
pub fn parse_with_config(input: &str, config: ParseConfig) -> Result<Object, Error> {
    parse_tokens(&tokenize(input), config)
}

/// Parse every top-level expression in `input`, in order
pub fn parse_program(input: &str) -> Result<Vec<Object>, Error> {
    let tokens = tokenize(input);
    check_lexer_error(&tokens)?;
    let mut stream = TokenStream {
        tokens: &tokens,
        pos: 0,
    };
    let mut program = Vec::new();
    while !stream.at_end() {
        program.push(stream.expression(0)?);
    }
    Ok(program)
}
