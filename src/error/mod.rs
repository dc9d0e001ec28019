mod lexer;
mod parser;

pub use lexer::*;
pub use parser::*;

/// Everything that can abort the compilation of a single class.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("lexical error at {0}")]
    Lex(#[from] LexError),
    #[error("syntax error at {0}")]
    Syntax(#[from] SyntaxError),
    #[error("semantic error at {0}")]
    Semantic(#[from] SemanticError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
