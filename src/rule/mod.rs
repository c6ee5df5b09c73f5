//! Rule parsing and evaluation module
//!
//! This module handles parsing rule strings like
//! "age > 30 AND department = 'Sales'" into a left-associative tree and
//! evaluating that tree against an attribute record.

mod ast;
pub mod cache;
pub mod coerce;
mod evaluator;
pub mod lexer;
pub mod parser;
pub mod transport;


pub use ast::*;
pub use cache::*;
pub use evaluator::*;
pub use parser::*;
pub use transport::NodeRepr;
