use std::io::{self, Write};

use log::debug;

use crate::error::{CompileError, SyntaxError, SyntaxErrorKind};
use crate::lexer::{element, Keyword, TokenType, Tokenizer};

use super::parser::Result;

/// Writes the parse tree of one class as XML: a `<class>` element with one
/// nested element per grammar rule and the tokens as terminal elements, one
/// element per line.
///
/// The grammar and lookahead are the same as [`super::Parser`]'s, but only the
/// syntax is checked; names are not resolved.
pub struct TreeWriter<W: Write> {
    tokenizer: Tokenizer,
    out: W,
}

impl<W: Write> TreeWriter<W> {
    pub fn new(tokenizer: Tokenizer, out: W) -> Self {
        Self { tokenizer, out }
    }

    /// Flushes and hands back the sink.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn open(&mut self, tag: &str) -> Result<()> {
        writeln!(self.out, "<{}>", tag)?;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> Result<()> {
        writeln!(self.out, "</{}>", tag)?;
        Ok(())
    }

    /// Writes the current token.
    fn terminal(&mut self) -> Result<()> {
        if let Some(token) = self.tokenizer.current() {
            writeln!(self.out, "{}", element(token))?;
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<TokenType> {
        Ok(self.tokenizer.advance()?.kind.token_type())
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = self
            .tokenizer
            .current()
            .map_or_else(String::new, |t| t.lexeme.clone());
        SyntaxError::new(
            self.tokenizer.line(),
            SyntaxErrorKind::Expected {
                expected: expected.to_string(),
                found,
            },
        )
        .into()
    }

    fn peek_keyword(&mut self) -> Result<Option<Keyword>> {
        self.advance()?;
        let keyword = self.tokenizer.keyword().ok();
        self.tokenizer.push_back();
        Ok(keyword)
    }

    fn peek_symbol(&mut self, c: char) -> Result<bool> {
        self.advance()?;
        let matched = self.tokenizer.is_symbol(c);
        self.tokenizer.push_back();
        Ok(matched)
    }

    fn consume_symbol(&mut self, c: char) -> Result<bool> {
        self.advance()?;
        if self.tokenizer.is_symbol(c) {
            self.terminal()?;
            return Ok(true);
        }
        self.tokenizer.push_back();
        Ok(false)
    }

    fn symbol(&mut self, c: char) -> Result<()> {
        self.advance()?;
        if !self.tokenizer.is_symbol(c) {
            return Err(self.unexpected(&format!("'{}'", c)));
        }
        self.terminal()
    }

    fn keyword(&mut self, keyword: Keyword) -> Result<()> {
        self.advance()?;
        if !self.tokenizer.is_keyword(keyword) {
            return Err(self.unexpected(&format!("'{}'", keyword.as_str())));
        }
        self.terminal()
    }

    fn identifier(&mut self, what: &str) -> Result<()> {
        if self.advance()? != TokenType::Identifier {
            return Err(self.unexpected(what));
        }
        self.terminal()
    }

    /// class = "class" className "{" classVarDec* subroutineDec* "}"
    pub fn compile_class(&mut self) -> Result<()> {
        self.open("class")?;
        self.keyword(Keyword::Class)?;
        self.identifier("a class name")?;
        if let Ok(name) = self.tokenizer.identifier() {
            debug!("writing the parse tree of class {}", name);
        }
        self.symbol('{')?;

        while matches!(self.peek_keyword()?, Some(Keyword::Static | Keyword::Field)) {
            self.compile_class_var_dec()?;
        }
        while matches!(
            self.peek_keyword()?,
            Some(Keyword::Constructor | Keyword::Function | Keyword::Method)
        ) {
            self.compile_subroutine_dec()?;
        }

        self.symbol('}')?;
        self.close("class")?;
        if self.tokenizer.has_more_tokens() {
            let token = self.tokenizer.advance()?;
            let (line, lexeme) = (token.line, token.lexeme.clone());
            return Err(SyntaxError::new(line, SyntaxErrorKind::TrailingTokens(lexeme)).into());
        }
        Ok(())
    }

    /// classVarDec = ("static" | "field") type varName ("," varName)* ";"
    fn compile_class_var_dec(&mut self) -> Result<()> {
        self.open("classVarDec")?;
        self.advance()?;
        self.terminal()?;
        self.compile_type()?;
        self.compile_var_names()?;
        self.close("classVarDec")
    }

    /// varName ("," varName)* ";"
    fn compile_var_names(&mut self) -> Result<()> {
        loop {
            self.identifier("a variable name")?;
            self.advance()?;
            match self.tokenizer.symbol() {
                Ok(',') => self.terminal()?,
                Ok(';') => return self.terminal(),
                _ => return Err(self.unexpected("',' or ';'")),
            }
        }
    }

    /// type = "int" | "char" | "boolean" | className
    fn compile_type(&mut self) -> Result<()> {
        let valid = match self.advance()? {
            TokenType::Keyword => matches!(
                self.tokenizer.keyword()?,
                Keyword::Int | Keyword::Char | Keyword::Boolean
            ),
            TokenType::Identifier => true,
            _ => false,
        };
        if !valid {
            return Err(self.unexpected("a type"));
        }
        self.terminal()
    }

    /// subroutineDec = ("constructor" | "function" | "method") ("void" | type)
    ///                 subroutineName "(" parameterList ")" subroutineBody
    fn compile_subroutine_dec(&mut self) -> Result<()> {
        self.open("subroutineDec")?;
        self.advance()?;
        self.terminal()?;

        if self.peek_keyword()? == Some(Keyword::Void) {
            self.keyword(Keyword::Void)?;
        } else {
            self.compile_type()?;
        }
        self.identifier("a subroutine name")?;

        self.symbol('(')?;
        self.compile_parameter_list()?;
        self.symbol(')')?;
        self.compile_subroutine_body()?;
        self.close("subroutineDec")
    }

    /// parameterList = (type varName ("," type varName)*)?
    fn compile_parameter_list(&mut self) -> Result<()> {
        self.open("parameterList")?;
        if !self.peek_symbol(')')? {
            loop {
                self.compile_type()?;
                self.identifier("a parameter name")?;
                if !self.consume_symbol(',')? {
                    break;
                }
            }
        }
        self.close("parameterList")
    }

    /// subroutineBody = "{" varDec* statements "}"
    fn compile_subroutine_body(&mut self) -> Result<()> {
        self.open("subroutineBody")?;
        self.symbol('{')?;
        while self.peek_keyword()? == Some(Keyword::Var) {
            self.open("varDec")?;
            self.keyword(Keyword::Var)?;
            self.compile_type()?;
            self.compile_var_names()?;
            self.close("varDec")?;
        }
        self.compile_statements()?;
        self.symbol('}')?;
        self.close("subroutineBody")
    }

    /// statements = statement*
    fn compile_statements(&mut self) -> Result<()> {
        self.open("statements")?;
        loop {
            match self.peek_keyword()? {
                Some(Keyword::Let) => self.compile_let()?,
                Some(Keyword::If) => self.compile_if()?,
                Some(Keyword::While) => self.compile_while()?,
                Some(Keyword::Do) => self.compile_do()?,
                Some(Keyword::Return) => self.compile_return()?,
                _ => break,
            }
        }
        self.close("statements")
    }

    /// "{" statements "}"
    fn compile_block(&mut self) -> Result<()> {
        self.symbol('{')?;
        self.compile_statements()?;
        self.symbol('}')
    }

    /// let = "let" varName ("[" expression "]")? "=" expression ";"
    fn compile_let(&mut self) -> Result<()> {
        self.open("letStatement")?;
        self.keyword(Keyword::Let)?;
        self.identifier("a variable name")?;
        if self.consume_symbol('[')? {
            self.compile_expression()?;
            self.symbol(']')?;
        }
        self.symbol('=')?;
        self.compile_expression()?;
        self.symbol(';')?;
        self.close("letStatement")
    }

    /// if = "if" "(" expression ")" "{" statements "}" ("else" "{" statements "}")?
    fn compile_if(&mut self) -> Result<()> {
        self.open("ifStatement")?;
        self.keyword(Keyword::If)?;
        self.symbol('(')?;
        self.compile_expression()?;
        self.symbol(')')?;
        self.compile_block()?;
        if self.peek_keyword()? == Some(Keyword::Else) {
            self.keyword(Keyword::Else)?;
            self.compile_block()?;
        }
        self.close("ifStatement")
    }

    /// while = "while" "(" expression ")" "{" statements "}"
    fn compile_while(&mut self) -> Result<()> {
        self.open("whileStatement")?;
        self.keyword(Keyword::While)?;
        self.symbol('(')?;
        self.compile_expression()?;
        self.symbol(')')?;
        self.compile_block()?;
        self.close("whileStatement")
    }

    /// do = "do" subroutineCall ";"
    fn compile_do(&mut self) -> Result<()> {
        self.open("doStatement")?;
        self.keyword(Keyword::Do)?;
        self.identifier("a subroutine, class or variable name")?;
        self.compile_call_rest()?;
        self.symbol(';')?;
        self.close("doStatement")
    }

    /// return = "return" expression? ";"
    fn compile_return(&mut self) -> Result<()> {
        self.open("returnStatement")?;
        self.keyword(Keyword::Return)?;
        if !self.peek_symbol(';')? {
            self.compile_expression()?;
        }
        self.symbol(';')?;
        self.close("returnStatement")
    }

    /// expression = term (op term)*
    fn compile_expression(&mut self) -> Result<()> {
        self.open("expression")?;
        self.compile_term()?;
        loop {
            self.advance()?;
            if !self.tokenizer.is_op() {
                self.tokenizer.push_back();
                break;
            }
            self.terminal()?;
            self.compile_term()?;
        }
        self.close("expression")
    }

    /// term = integerConstant | stringConstant | keywordConstant
    ///      | varName | varName "[" expression "]" | subroutineCall
    ///      | "(" expression ")" | ("-" | "~") term
    fn compile_term(&mut self) -> Result<()> {
        self.open("term")?;
        match self.advance()? {
            TokenType::IntegerConstant | TokenType::StringConstant => self.terminal()?,
            TokenType::Keyword => match self.tokenizer.keyword()? {
                Keyword::True | Keyword::False | Keyword::Null | Keyword::This => {
                    self.terminal()?
                }
                _ => return Err(self.unexpected("a term")),
            },
            TokenType::Symbol => match self.tokenizer.symbol()? {
                '(' => {
                    self.terminal()?;
                    self.compile_expression()?;
                    self.symbol(')')?;
                }
                '-' | '~' => {
                    self.terminal()?;
                    self.compile_term()?;
                }
                _ => return Err(self.unexpected("a term")),
            },
            TokenType::Identifier => {
                self.terminal()?;
                self.advance()?;
                match self.tokenizer.symbol() {
                    Ok('[') => {
                        self.terminal()?;
                        self.compile_expression()?;
                        self.symbol(']')?;
                    }
                    Ok('(' | '.') => {
                        self.tokenizer.push_back();
                        self.compile_call_rest()?;
                    }
                    _ => self.tokenizer.push_back(),
                }
            }
        }
        self.close("term")
    }

    /// The part of a subroutineCall after its leading name.
    fn compile_call_rest(&mut self) -> Result<()> {
        self.advance()?;
        match self.tokenizer.symbol() {
            Ok('(') => self.terminal()?,
            Ok('.') => {
                self.terminal()?;
                self.identifier("a subroutine name")?;
                self.symbol('(')?;
            }
            _ => return Err(self.unexpected("'(' or '.'")),
        }
        self.compile_expression_list()?;
        self.symbol(')')
    }

    /// expressionList = (expression ("," expression)*)?
    fn compile_expression_list(&mut self) -> Result<()> {
        self.open("expressionList")?;
        if !self.peek_symbol(')')? {
            self.compile_expression()?;
            while self.consume_symbol(',')? {
                self.compile_expression()?;
            }
        }
        self.close("expressionList")
    }
}
