use crate::error::{LexError, LexErrorKind};

use super::{token::SYMBOLS, Keyword, Token, TokenKind};

#[derive(Debug)]
pub struct Lexer {
    tokens: Vec<Token>,
    index: usize,
    line: usize,
}

impl Lexer {
    fn new() -> Self {
        Self {
            tokens: vec![],
            index: 0,
            line: 1,
        }
    }

    fn new_token(&mut self, kind: TokenKind, s: String) {
        self.index += s.chars().count();
        self.tokens.push(Token {
            kind,
            lexeme: s,
            line: self.line,
        });
    }

    fn parse_number(&mut self, chars: &[char]) {
        let s: String = chars.iter().take_while(|c| c.is_ascii_digit()).collect();
        // out-of-range literals are not diagnosed, the value just wraps
        let value = s.bytes().fold(0u32, |acc, b| {
            acc.wrapping_mul(10).wrapping_add(u32::from(b - b'0'))
        });
        self.new_token(TokenKind::IntegerConstant(value), s);
    }

    fn parse_string(&mut self, chars: &[char]) -> Result<(), LexError> {
        let contents: String = chars[1..]
            .iter()
            .take_while(|&&c| c != '"' && c != '\n')
            .collect();
        let closing = chars.get(contents.chars().count() + 1);
        if closing != Some(&'"') {
            return Err(LexError::new(self.line, LexErrorKind::UnterminatedString));
        }

        let lexeme = format!("\"{}\"", contents);
        self.new_token(TokenKind::StringConstant(contents), lexeme);
        Ok(())
    }

    fn parse_identifier(&mut self, chars: &[char]) {
        let s: String = chars
            .iter()
            .take_while(|&&c| c.is_ascii_alphanumeric() || c == '_')
            .collect();

        if let Some(keyword) = Keyword::lookup(&s) {
            self.new_token(TokenKind::Keyword(keyword), s);
        } else {
            self.new_token(TokenKind::Identifier(s.clone()), s);
        }
    }

    fn skip_line_comment(&mut self, chars: &[char]) {
        while self.index < chars.len() && chars[self.index] != '\n' {
            self.index += 1;
        }
    }

    fn skip_block_comment(&mut self, chars: &[char]) -> Result<(), LexError> {
        let start_line = self.line;
        self.index += 2;
        while self.index < chars.len() {
            if chars[self.index] == '*' && chars.get(self.index + 1) == Some(&'/') {
                self.index += 2;
                return Ok(());
            }
            if chars[self.index] == '\n' {
                self.line += 1;
            }
            self.index += 1;
        }
        Err(LexError::new(
            start_line,
            LexErrorKind::UnterminatedBlockComment,
        ))
    }

    fn _tokenize(&mut self, s: &str) -> Result<(), LexError> {
        let chars: Vec<_> = s.chars().collect();

        while self.index < chars.len() {
            let c = chars[self.index];
            let next = chars.get(self.index + 1).copied();

            if c == '\n' {
                self.line += 1;
                self.index += 1;
            } else if c.is_whitespace() {
                self.index += 1;
            } else if c == '/' && next == Some('/') {
                self.skip_line_comment(&chars);
            } else if c == '/' && next == Some('*') {
                self.skip_block_comment(&chars)?;
            } else if c.is_ascii_digit() {
                self.parse_number(&chars[self.index..]);
            } else if c == '"' {
                self.parse_string(&chars[self.index..])?;
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.parse_identifier(&chars[self.index..]);
            } else if SYMBOLS.contains(&c) {
                self.new_token(TokenKind::Symbol(c), c.to_string());
            } else {
                return Err(LexError::new(
                    self.line,
                    LexErrorKind::UnexpectedCharacter(c),
                ));
            }
        }

        Ok(())
    }

    /// Splits `s` into tokens, dropping whitespace and comments. The whole
    /// input is scanned up front; any lexical error discards the partial list.
    pub fn tokenize(s: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new();
        lexer._tokenize(s)?;

        Ok(lexer.tokens)
    }
}
