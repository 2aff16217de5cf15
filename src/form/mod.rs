//! Form data and field-state resolution
//!
//! This module holds the FormData snapshot the evaluator reads and applies
//! every field's conditions across a whole FormSchema.

mod data;
mod resolver;


pub use data::*;
pub use resolver::*;
