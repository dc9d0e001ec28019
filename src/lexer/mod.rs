mod lexer;
mod token;
mod tokenizer;
mod xml;

pub use lexer::*;
pub use token::*;
pub use tokenizer::*;
pub use xml::*;
