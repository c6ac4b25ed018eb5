//! FILENAME: core/measure-parser/src/lexer.rs
//! PURPOSE: Scans a raw measure formula and produces a stream of Tokens.
//! CONTEXT: This is the first stage of the parsing pipeline. It handles
//! whitespace skipping, number parsing and the three ways of writing a
//! measure name.
//!
//! SUPPORTED OPERATORS:
//! - Single char: + - * / ^ ( ) =
//! - Names: bare, "double quoted", 'single quoted', [bracketed]
//!   (a doubled quote inside a quoted name is a literal quote)

use crate::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Asterisk,
            Some('/') => Token::Slash,
            Some('^') => Token::Caret,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,
            Some('=') => Token::Equals,

            // Quoted names
            Some(quote @ ('"' | '\'')) => self.read_quoted_identifier(quote),

            // Bracketed names
            Some('[') => self.read_bracket_identifier(),

            // Numbers (start with digit or dot)
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.read_number(ch),

            // Bare names (start with letter)
            Some(ch) if is_letter(ch) => self.read_identifier(ch),

            None => Token::EOF,

            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    /// Reads a quoted name. A doubled quote character is an escaped quote.
    fn read_quoted_identifier(&mut self, quote: char) -> Token {
        let mut result = String::new();
        while let Some(ch) = self.input.next() {
            if ch == quote {
                if self.input.peek() == Some(&quote) {
                    result.push(quote);
                    self.input.next();
                } else {
                    return Token::QuotedIdentifier(result);
                }
            } else {
                result.push(ch);
            }
        }
        Token::Unterminated(quote)
    }

    fn read_bracket_identifier(&mut self) -> Token {
        let mut result = String::new();
        for ch in self.input.by_ref() {
            if ch == ']' {
                return Token::BracketIdentifier(result);
            }
            result.push(ch);
        }
        Token::Unterminated('[')
    }

    fn read_number(&mut self, first_char: char) -> Token {
        let mut number_str = String::from(first_char);
        let mut has_dot = first_char == '.';

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                number_str.push(ch);
                self.input.next();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                number_str.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        match number_str.parse::<f64>() {
            Ok(n) => Token::Number(n),
            // e.g. a lone "."
            Err(_) => Token::Illegal(first_char),
        }
    }

    fn read_identifier(&mut self, first_char: char) -> Token {
        let mut ident = String::from(first_char);

        while let Some(&ch) = self.input.peek() {
            // '.' supports dotted names like "q1.sales".
            if is_letter(ch) || ch.is_ascii_digit() || ch == '.' {
                ident.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        // Measure names are case-sensitive, so no normalization here.
        Token::Identifier(ident)
    }
}

/// Returns true if `ch` can start a bare name.
fn is_letter(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}
