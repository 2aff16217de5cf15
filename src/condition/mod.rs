//! Condition parsing and evaluation module
//!
//! This module loads the `conditions` property of form fields (flat lists
//! like `[["age", "greater_than", "18"]]` or `and`/`or` trees) and evaluates
//! them against the current FormData.

mod ast;
pub mod cache;
pub mod coerce;
pub mod date;
mod evaluator;
pub mod operators;
pub mod parser;


pub use ast::*;
pub use cache::{check_conditions, get_or_parse};
pub use evaluator::*;
pub use parser::{parse_conditions, parse_conditions_str};
