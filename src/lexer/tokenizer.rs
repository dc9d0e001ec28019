use crate::error::{LexError, SyntaxError, SyntaxErrorKind};

use super::{BinaryOp, Keyword, Lexer, Token, TokenKind, TokenType};

/// Cursor over the fully materialized token list of one source file.
///
/// `advance` makes the next token current, `push_back` undoes exactly one
/// `advance`. The accessors read the current token and fail when it is of a
/// different kind.
#[derive(Debug)]
pub struct Tokenizer {
    tokens: Vec<Token>,
    /// Number of tokens consumed so far; the current token is `index - 1`.
    index: usize,
}

impl Tokenizer {
    pub fn new(source: &str) -> Result<Self, LexError> {
        Ok(Self::from_tokens(Lexer::tokenize(source)?))
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn has_more_tokens(&self) -> bool {
        self.index < self.tokens.len()
    }

    pub fn advance(&mut self) -> Result<&Token, SyntaxError> {
        if !self.has_more_tokens() {
            return Err(SyntaxError::new(
                self.last_line(),
                SyntaxErrorKind::UnexpectedEof,
            ));
        }
        self.index += 1;
        Ok(&self.tokens[self.index - 1])
    }

    pub fn push_back(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn current(&self) -> Option<&Token> {
        self.index.checked_sub(1).map(|i| &self.tokens[i])
    }

    /// Line of the current token, or of the last token once input ran out.
    pub fn line(&self) -> usize {
        self.current().map_or_else(|| self.last_line(), |t| t.line)
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map_or(1, |t| t.line)
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.current().map(|t| t.kind.token_type())
    }

    fn wrong_kind(&self, expected: TokenType) -> SyntaxError {
        let found = match self.current() {
            Some(t) => format!("{} '{}'", t.kind.token_type(), t.lexeme),
            None => "nothing".to_string(),
        };
        SyntaxError::new(
            self.line(),
            SyntaxErrorKind::WrongTokenKind { expected, found },
        )
    }

    pub fn keyword(&self) -> Result<Keyword, SyntaxError> {
        match self.current().map(|t| &t.kind) {
            Some(TokenKind::Keyword(k)) => Ok(*k),
            _ => Err(self.wrong_kind(TokenType::Keyword)),
        }
    }

    pub fn symbol(&self) -> Result<char, SyntaxError> {
        match self.current().map(|t| &t.kind) {
            Some(TokenKind::Symbol(c)) => Ok(*c),
            _ => Err(self.wrong_kind(TokenType::Symbol)),
        }
    }

    pub fn identifier(&self) -> Result<&str, SyntaxError> {
        match self.current().map(|t| &t.kind) {
            Some(TokenKind::Identifier(name)) => Ok(name),
            _ => Err(self.wrong_kind(TokenType::Identifier)),
        }
    }

    pub fn int_val(&self) -> Result<u32, SyntaxError> {
        match self.current().map(|t| &t.kind) {
            Some(TokenKind::IntegerConstant(value)) => Ok(*value),
            _ => Err(self.wrong_kind(TokenType::IntegerConstant)),
        }
    }

    pub fn string_val(&self) -> Result<&str, SyntaxError> {
        match self.current().map(|t| &t.kind) {
            Some(TokenKind::StringConstant(s)) => Ok(s),
            _ => Err(self.wrong_kind(TokenType::StringConstant)),
        }
    }

    /// The binary operator under the cursor, if any.
    pub fn op(&self) -> Option<BinaryOp> {
        match self.current().map(|t| &t.kind) {
            Some(TokenKind::Symbol(c)) => BinaryOp::from_symbol(*c),
            _ => None,
        }
    }

    pub fn is_op(&self) -> bool {
        self.op().is_some()
    }

    pub fn is_symbol(&self, c: char) -> bool {
        self.symbol().is_ok_and(|s| s == c)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.keyword().is_ok_and(|k| k == keyword)
    }
}
