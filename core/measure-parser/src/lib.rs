//! FILENAME: core/measure-parser/src/lib.rs
//! PURPOSE: Library root for the calculated-measure formula parser.
//! CONTEXT: Calculated measures combine aggregates that were already computed
//! for a pivot cell. This crate turns their formula text into a small
//! expression tree; evaluation lives in the pivot engine.
//!
//! PIPELINE: Formula String --> Lexer --> Tokens --> Parser --> AST
//!
//! SUPPORTED FEATURES:
//! - Arithmetic: +, -, *, /, ^ (power)
//! - Unary sign: -sales, +sales
//! - Measure references: sales, "Sum of sales", 'Sum of sales', [Sum of sales]
//! - Parentheses for grouping
//! - Optional leading '=' (spreadsheet habit)
//!
//! Anything else (function calls, strings, comparisons) is rejected.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;


pub use ast::{BinaryOperator, Expression, UnaryOperator};
pub use lexer::Lexer;
pub use parser::{parse, ParseError, ParseResult, Parser};
pub use token::Token;
