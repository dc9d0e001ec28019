use std::io::Write;

use log::{debug, trace};

use crate::analyzer::{Kind, SymbolTable};
use crate::codegen::{Command, Segment, VmWriter};
use crate::error::{CompileError, SemanticError, SemanticErrorKind, SyntaxError, SyntaxErrorKind};
use crate::lexer::{Keyword, TokenType, Tokenizer};

pub(super) type Result<T> = std::result::Result<T, CompileError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Single-pass translator from one class to VM code.
///
/// Every grammar rule is a `compile_*` method that consumes its tokens and
/// writes the matching instructions right away; nothing is buffered and no
/// tree is built. Lookahead is one token: a rule advances, and if the token
/// does not belong to it, pushes it back and returns.
pub struct Parser<W: Write> {
    pub(super) tokenizer: Tokenizer,
    pub(super) symbols: SymbolTable,
    pub(super) writer: VmWriter<W>,
    pub(super) class_name: String,
    subroutine_name: String,
    label_index: usize,
}

impl<W: Write> Parser<W> {
    pub fn new(tokenizer: Tokenizer, writer: VmWriter<W>) -> Self {
        Self {
            tokenizer,
            symbols: SymbolTable::new(),
            writer,
            class_name: String::new(),
            subroutine_name: String::new(),
            label_index: 0,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn into_writer(self) -> VmWriter<W> {
        self.writer
    }

    /// Makes the next token current. Its payload is read back through the
    /// tokenizer accessors.
    pub(super) fn advance(&mut self) -> Result<TokenType> {
        Ok(self.tokenizer.advance()?.kind.token_type())
    }

    pub(super) fn unexpected(&self, expected: &str) -> CompileError {
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

    pub(super) fn semantic(&self, kind: SemanticErrorKind) -> CompileError {
        SemanticError::new(self.tokenizer.line(), kind).into()
    }

    /// Advances and reports whether the token is `c`, pushing it back if not.
    pub(super) fn consume_symbol(&mut self, c: char) -> Result<bool> {
        self.advance()?;
        if self.tokenizer.is_symbol(c) {
            return Ok(true);
        }
        self.tokenizer.push_back();
        Ok(false)
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Result<bool> {
        self.advance()?;
        if self.tokenizer.is_keyword(keyword) {
            return Ok(true);
        }
        self.tokenizer.push_back();
        Ok(false)
    }

    /// Reports whether the next token is `c` without consuming it.
    pub(super) fn peek_symbol(&mut self, c: char) -> Result<bool> {
        self.advance()?;
        let matched = self.tokenizer.is_symbol(c);
        self.tokenizer.push_back();
        Ok(matched)
    }

    pub(super) fn expect_symbol(&mut self, c: char) -> Result<()> {
        self.advance()?;
        if !self.tokenizer.is_symbol(c) {
            return Err(self.unexpected(&format!("'{}'", c)));
        }
        Ok(())
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        self.advance()?;
        if !self.tokenizer.is_keyword(keyword) {
            return Err(self.unexpected(&format!("'{}'", keyword.as_str())));
        }
        Ok(())
    }

    pub(super) fn expect_identifier(&mut self, what: &str) -> Result<String> {
        self.advance()?;
        match self.tokenizer.identifier() {
            Ok(name) => Ok(name.to_string()),
            Err(_) => Err(self.unexpected(what)),
        }
    }

    fn new_label(&mut self) -> String {
        let s = format!("L{:0>3}", self.label_index);
        self.label_index += 1;
        s
    }

    /// Segment and index of a declared variable.
    pub(super) fn resolve_variable(&self, name: &str) -> Result<(Segment, usize)> {
        match (self.symbols.kind_of(name), self.symbols.index_of(name)) {
            (Some(kind), Some(index)) => Ok((kind.segment(), index)),
            _ => Err(self.semantic(SemanticErrorKind::UndefinedVariable(name.to_string()))),
        }
    }

    /// class = "class" className "{" classVarDec* subroutineDec* "}"
    pub fn compile_class(&mut self) -> Result<()> {
        trace!("{} tokens", self.tokenizer.tokens().len());
        self.expect_keyword(Keyword::Class)?;
        self.class_name = self.expect_identifier("a class name")?;
        debug!("compiling class {}", self.class_name);
        self.expect_symbol('{')?;

        self.compile_class_var_decs()?;
        self.compile_subroutines()?;

        self.expect_symbol('}')?;
        if self.tokenizer.has_more_tokens() {
            let token = self.tokenizer.advance()?;
            let (line, lexeme) = (token.line, token.lexeme.clone());
            return Err(SyntaxError::new(line, SyntaxErrorKind::TrailingTokens(lexeme)).into());
        }
        Ok(())
    }

    /// classVarDec = ("static" | "field") type varName ("," varName)* ";"
    fn compile_class_var_decs(&mut self) -> Result<()> {
        loop {
            self.advance()?;
            let kind = match self.tokenizer.keyword() {
                Ok(Keyword::Static) => Kind::Static,
                Ok(Keyword::Field) => Kind::Field,
                Ok(Keyword::Constructor | Keyword::Function | Keyword::Method) => {
                    self.tokenizer.push_back();
                    return Ok(());
                }
                _ if self.tokenizer.is_symbol('}') => {
                    self.tokenizer.push_back();
                    return Ok(());
                }
                _ => return Err(self.unexpected("'static', 'field' or a subroutine declaration")),
            };
            let ty = self.compile_type()?;
            self.compile_var_names(&ty, kind)?;
        }
    }

    /// varName ("," varName)* ";"
    fn compile_var_names(&mut self, ty: &str, kind: Kind) -> Result<()> {
        loop {
            let name = self.expect_identifier("a variable name")?;
            self.symbols.define(&name, ty, kind);
            self.advance()?;
            match self.tokenizer.symbol() {
                Ok(',') => continue,
                Ok(';') => return Ok(()),
                _ => return Err(self.unexpected("',' or ';'")),
            }
        }
    }

    /// type = "int" | "char" | "boolean" | className
    fn compile_type(&mut self) -> Result<String> {
        match self.advance()? {
            TokenType::Keyword => match self.tokenizer.keyword()? {
                k @ (Keyword::Int | Keyword::Char | Keyword::Boolean) => Ok(k.as_str().to_string()),
                _ => Err(self.unexpected("a type")),
            },
            TokenType::Identifier => Ok(self.tokenizer.identifier()?.to_string()),
            _ => Err(self.unexpected("a type")),
        }
    }

    /// subroutineDec = ("constructor" | "function" | "method") ("void" | type)
    ///                 subroutineName "(" parameterList ")" subroutineBody
    fn compile_subroutines(&mut self) -> Result<()> {
        loop {
            self.advance()?;
            let kind = match self.tokenizer.keyword() {
                Ok(Keyword::Constructor) => SubroutineKind::Constructor,
                Ok(Keyword::Function) => SubroutineKind::Function,
                Ok(Keyword::Method) => SubroutineKind::Method,
                _ if self.tokenizer.is_symbol('}') => {
                    self.tokenizer.push_back();
                    return Ok(());
                }
                _ => return Err(self.unexpected("'constructor', 'function' or 'method'")),
            };

            self.symbols.start_subroutine();
            if kind == SubroutineKind::Method {
                let class_name = self.class_name.clone();
                self.symbols.define("this", &class_name, Kind::Arg);
            }

            if !self.consume_keyword(Keyword::Void)? {
                self.compile_type()?;
            }
            self.subroutine_name = self.expect_identifier("a subroutine name")?;
            debug!(
                "compiling {:?} {}.{}",
                kind, self.class_name, self.subroutine_name
            );

            self.expect_symbol('(')?;
            self.compile_parameter_list()?;
            self.expect_symbol(')')?;
            self.compile_subroutine_body(kind)?;
        }
    }

    /// parameterList = (type varName ("," type varName)*)?
    fn compile_parameter_list(&mut self) -> Result<()> {
        if self.peek_symbol(')')? {
            return Ok(());
        }
        loop {
            let ty = self.compile_type()?;
            let name = self.expect_identifier("a parameter name")?;
            self.symbols.define(&name, &ty, Kind::Arg);
            if !self.consume_symbol(',')? {
                return Ok(());
            }
        }
    }

    /// subroutineBody = "{" varDec* statements "}"
    fn compile_subroutine_body(&mut self, kind: SubroutineKind) -> Result<()> {
        self.expect_symbol('{')?;
        self.compile_var_decs()?;
        self.write_prologue(kind)?;
        self.compile_statements()?;
        self.expect_symbol('}')
    }

    /// varDec = "var" type varName ("," varName)* ";"
    fn compile_var_decs(&mut self) -> Result<()> {
        while self.consume_keyword(Keyword::Var)? {
            let ty = self.compile_type()?;
            self.compile_var_names(&ty, Kind::Var)?;
        }
        Ok(())
    }

    fn write_prologue(&mut self, kind: SubroutineKind) -> Result<()> {
        let name = format!("{}.{}", self.class_name, self.subroutine_name);
        self.writer
            .write_function(&name, self.symbols.count_of(Kind::Var))?;

        match kind {
            SubroutineKind::Method => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Constructor => {
                self.writer
                    .write_push(Segment::Constant, self.symbols.count_of(Kind::Field))?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => (),
        }
        Ok(())
    }

    /// statements = statement*
    /// statement = let | if | while | do | return
    fn compile_statements(&mut self) -> Result<()> {
        loop {
            self.advance()?;
            match self.tokenizer.keyword() {
                Ok(Keyword::Let) => self.compile_let()?,
                Ok(Keyword::If) => self.compile_if()?,
                Ok(Keyword::While) => self.compile_while()?,
                Ok(Keyword::Do) => self.compile_do()?,
                Ok(Keyword::Return) => self.compile_return()?,
                _ if self.tokenizer.is_symbol('}') => {
                    self.tokenizer.push_back();
                    return Ok(());
                }
                _ => return Err(self.unexpected("a statement or '}'")),
            }
        }
    }

    /// let = "let" varName ("[" expression "]")? "=" expression ";"
    fn compile_let(&mut self) -> Result<()> {
        let name = self.expect_identifier("a variable name")?;
        let (segment, index) = self.resolve_variable(&name)?;

        self.advance()?;
        match self.tokenizer.symbol() {
            Ok('[') => {
                // the element address stays on the stack while the right-hand
                // side is evaluated, so array reads in it cannot clobber it
                self.writer.write_push(segment, index)?;
                self.compile_expression()?;
                self.expect_symbol(']')?;
                self.writer.write_arithmetic(Command::Add)?;

                self.expect_symbol('=')?;
                self.compile_expression()?;
                self.expect_symbol(';')?;

                self.writer.write_pop(Segment::Temp, 0)?;
                self.writer.write_pop(Segment::Pointer, 1)?;
                self.writer.write_push(Segment::Temp, 0)?;
                self.writer.write_pop(Segment::That, 0)?;
            }
            Ok('=') => {
                self.compile_expression()?;
                self.expect_symbol(';')?;
                self.writer.write_pop(segment, index)?;
            }
            _ => return Err(self.unexpected("'[' or '='")),
        }
        Ok(())
    }

    /// if = "if" "(" expression ")" "{" statements "}" ("else" "{" statements "}")?
    fn compile_if(&mut self) -> Result<()> {
        let else_label = self.new_label();
        let end_label = self.new_label();

        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&else_label)?;

        self.compile_block()?;
        self.writer.write_goto(&end_label)?;
        self.writer.write_label(&else_label)?;

        if self.consume_keyword(Keyword::Else)? {
            self.compile_block()?;
        }
        self.writer.write_label(&end_label)?;
        Ok(())
    }

    /// while = "while" "(" expression ")" "{" statements "}"
    fn compile_while(&mut self) -> Result<()> {
        let top_label = self.new_label();
        let end_label = self.new_label();

        self.writer.write_label(&top_label)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&end_label)?;

        self.compile_block()?;
        self.writer.write_goto(&top_label)?;
        self.writer.write_label(&end_label)?;
        Ok(())
    }

    /// "{" statements "}"
    fn compile_block(&mut self) -> Result<()> {
        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')
    }

    /// do = "do" subroutineCall ";"
    fn compile_do(&mut self) -> Result<()> {
        let name = self.expect_identifier("a subroutine, class or variable name")?;
        self.compile_subroutine_call(&name)?;
        self.expect_symbol(';')?;
        // every call leaves a value behind
        self.writer.write_pop(Segment::Temp, 0)?;
        Ok(())
    }

    /// return = "return" expression? ";"
    fn compile_return(&mut self) -> Result<()> {
        if !self.consume_symbol(';')? {
            self.compile_expression()?;
            self.expect_symbol(';')?;
        } else {
            self.writer.write_push(Segment::Constant, 0)?;
        }
        self.writer.write_return()?;
        Ok(())
    }
}
