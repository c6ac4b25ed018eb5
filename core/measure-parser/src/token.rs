//! FILENAME: core/measure-parser/src/token.rs
//! PURPOSE: Token definitions for the measure formula lexer.
//! CONTEXT: Tokens are the atomic units produced by the lexer and consumed by the parser.

/// Tokens recognized by the formula lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // Literals
    Number(f64),
    /// Bare measure or field name: sales, margin_pct
    Identifier(String),
    /// Quoted name with spaces: "Sum of sales" or 'Sum of sales'
    QuotedIdentifier(String),
    /// Bracketed name: [Sum of sales]
    BracketIdentifier(String),

    // Operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Caret,
    /// Only accepted as the optional leading formula marker.
    Equals,

    // Delimiters
    LParen,
    RParen,

    // Special
    EOF,
    /// A quoted or bracketed name that never closed.
    Unterminated(char),
    Illegal(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::QuotedIdentifier(s) => write!(f, "\"{}\"", s),
            Token::BracketIdentifier(s) => write!(f, "[{}]", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Equals => write!(f, "="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::EOF => write!(f, "EOF"),
            Token::Unterminated(c) => write!(f, "UNTERMINATED({})", c),
            Token::Illegal(c) => write!(f, "ILLEGAL({})", c),
        }
    }
}
