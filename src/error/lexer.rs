/// A fragment of the input that matches no token category.
#[derive(thiserror::Error, Debug, PartialEq)]
#[error("line {line}: {kind}")]
pub struct LexError {
    pub line: usize,
    pub kind: LexErrorKind,
}

impl LexError {
    pub fn new(line: usize, kind: LexErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, PartialEq)]
pub enum LexErrorKind {
    UnexpectedCharacter(char),
    UnterminatedString,
    UnterminatedBlockComment,
}

impl std::fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use LexErrorKind::*;
        match self {
            UnexpectedCharacter(c) => write!(f, "unexpected character '{c}'"),
            UnterminatedString => write!(f, "unterminated string constant"),
            UnterminatedBlockComment => write!(f, "unterminated block comment"),
        }
    }
}
