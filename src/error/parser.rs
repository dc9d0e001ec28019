use crate::lexer::TokenType;

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("line {line}: {kind}")]
pub struct SyntaxError {
    pub line: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(line: usize, kind: SyntaxErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SyntaxErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("expected {expected}, found {found}")]
    WrongTokenKind { expected: TokenType, found: String },
    #[error("expected {expected}, found '{found}'")]
    Expected { expected: String, found: String },
    #[error("unexpected token '{0}' after the end of the class")]
    TrailingTokens(String),
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("line {line}: {kind}")]
pub struct SemanticError {
    pub line: usize,
    pub kind: SemanticErrorKind,
}

impl SemanticError {
    pub fn new(line: usize, kind: SemanticErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SemanticErrorKind {
    #[error("'{name}' has primitive type {ty} and cannot be the target of a call")]
    PrimitiveCallTarget { name: String, ty: String },
    #[error("undeclared variable '{0}'")]
    UndefinedVariable(String),
}
