mod expr;
mod parser;
mod tree;

pub use parser::*;
pub use tree::*;
